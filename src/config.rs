use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

const CONFIG_PATH_REL_HOME: &str = ".config/ppdiff/config.toml";
/// The download ratelimiter refills at most once per millisecond
const MAX_DOWNLOADS_PER_SECOND: u32 = 1000;

/// Bot configuration
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Config {
    pub general: General,
    pub osu: Osu,
    #[serde(default)]
    pub cache: Cache,
    #[serde(default)]
    pub pipeline: Pipeline,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct General {
    #[serde(default)]
    pub discord_token: String,
    #[serde(default)]
    pub bot_owners: Vec<String>,
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct Osu {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// How many top plays to request.  The API caps this at 100.
    #[serde(default = "default_top_plays_limit")]
    pub top_plays_limit: u8,
}

#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub struct Cache {
    #[serde(default = "default_cache_directory")]
    pub directory: PathBuf,
    /// Maximum number of `.osu` files to keep.  Unbounded when absent.
    #[serde(default)]
    pub max_files: Option<usize>,
    #[serde(default = "default_downloads_per_second")]
    pub downloads_per_second: u32,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct Pipeline {
    /// Number of plays loaded and rescored at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_command_prefix() -> String {
    "!".to_owned()
}

fn default_base_url() -> String {
    "https://osu.ppy.sh".to_owned()
}

fn default_top_plays_limit() -> u8 {
    100
}

fn default_cache_directory() -> PathBuf {
    PathBuf::from("cache")
}

fn default_downloads_per_second() -> u32 {
    2
}

fn default_concurrency() -> usize {
    1
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            directory: default_cache_directory(),
            max_files: None,
            downloads_per_second: default_downloads_per_second(),
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

impl Config {
    fn config_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|p| p.join(CONFIG_PATH_REL_HOME))
            .ok_or(anyhow!("Could not find home directory"))
    }

    pub async fn load() -> Result<Self> {
        let path = Self::config_path()?;

        let mut file = tokio::fs::File::open(&path).await.map_err(|e| {
            anyhow!(
                "Could not open configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).await.map_err(|e| {
            anyhow!(
                "Could not read configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let mut config = Self::parse(&contents).map_err(|e| {
            anyhow!(
                "Could not parse configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub async fn reload(&mut self) -> Result<()> {
        let new = Self::load().await?;
        *self = new;
        Ok(())
    }

    fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(Into::into)
    }

    /// Secrets are commonly handed to the bot through the environment instead of the file.
    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("DISCORD_TOKEN") {
            self.general.discord_token = token;
        }
        if let Ok(key) = std::env::var("OSU_API_KEY") {
            self.osu.api_key = key;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.general.discord_token.is_empty() {
            return Err(anyhow!("No discord token configured"));
        }
        if self.osu.api_key.is_empty() {
            return Err(anyhow!("No osu! API key configured"));
        }
        if !(1..=100).contains(&self.osu.top_plays_limit) {
            return Err(anyhow!(
                "`osu.top_plays_limit` must be between 1 and 100, got {}",
                self.osu.top_plays_limit
            ));
        }
        if !(1..=MAX_DOWNLOADS_PER_SECOND).contains(&self.cache.downloads_per_second) {
            return Err(anyhow!(
                "`cache.downloads_per_second` must be between 1 and {}, got {}",
                MAX_DOWNLOADS_PER_SECOND,
                self.cache.downloads_per_second
            ));
        }
        if self.cache.max_files == Some(0) {
            return Err(anyhow!("`cache.max_files` must be at least 1 when set"));
        }
        if self.pipeline.concurrency == 0 {
            return Err(anyhow!("`pipeline.concurrency` must be at least 1"));
        }
        Ok(())
    }
}
