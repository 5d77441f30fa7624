//! osu! collaborators: the web API, the beatmap file cache and pp calculation

pub mod api;
pub mod cache;
pub mod mods;
pub mod rescore;
#[cfg(test)]
pub(crate) mod test_server;

use crate::config::Config;
use anyhow::{anyhow, Result};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Clients built from the configuration.  Rebuilt whenever the configuration is reloaded.
pub struct Osu {
    pub api: api::OsuApi,
    pub beatmaps: cache::BeatmapCache,
}

impl Osu {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| anyhow!("Could not build http client: {}", e))?;

        Ok(Self {
            api: api::OsuApi::new(client.clone(), &cfg.osu),
            beatmaps: cache::BeatmapCache::new(client, &cfg.osu.base_url, &cfg.cache),
        })
    }
}
