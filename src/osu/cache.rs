//! File-backed cache of `.osu` beatmap files
//!
//! Files are stored as `<directory>/<beatmap id>.osu` and downloaded from the osu! website on a
//! miss.  Downloads are ratelimited independently of any Discord activity.  Unless `max_files`
//! is configured, the cache grows without bound.

use crate::{
    config, log_error, log_internal,
    osu::rescore::DecodedBeatmap,
    pipeline::BeatmapSource,
    ranking::BeatmapRef,
};
use anyhow::{anyhow, Result};
use leaky_bucket_lite::LeakyBucket;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, SystemTime},
};

/// Distinguishes temporary files of concurrent downloads
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct BeatmapCache {
    client: reqwest::Client,
    base_url: String,
    directory: PathBuf,
    max_files: Option<usize>,
    ratelimiter: LeakyBucket,
}

impl BeatmapCache {
    pub fn new(client: reqwest::Client, base_url: &str, cfg: &config::Cache) -> Self {
        let per_second = cfg.downloads_per_second.max(1);
        let ratelimiter = LeakyBucket::builder()
            .max(per_second)
            .tokens(per_second)
            .refill_interval(refill_interval(per_second))
            .refill_amount(1)
            .build();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            directory: cfg.directory.clone(),
            max_files: cfg.max_files,
            ratelimiter,
        }
    }

    fn path_for(&self, beatmap_id: u32) -> PathBuf {
        self.directory.join(format!("{}.osu", beatmap_id))
    }

    /// Raw content of the beatmap's `.osu` file, downloading it first if necessary
    pub async fn bytes(&self, beatmap_id: u32) -> Result<Vec<u8>> {
        let path = self.path_for(beatmap_id);

        match tokio::fs::read(&path).await {
            Ok(bytes) if !bytes.is_empty() => return Ok(bytes),
            // Left behind by an interrupted write of an older version; refetch
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(anyhow!(
                    "Could not read cached beatmap `{}`: {}",
                    path.to_string_lossy(),
                    e
                ))
            }
        }

        let bytes = self.download(beatmap_id).await?;
        self.store(&path, &bytes).await?;

        if let Err(err) = self.enforce_retention(&path).await {
            log_error!("Could not evict cached beatmaps: {}", err);
        }

        Ok(bytes)
    }

    async fn download(&self, beatmap_id: u32) -> Result<Vec<u8>> {
        let url = format!("{}/osu/{}", self.base_url, beatmap_id);

        self.ratelimiter.acquire_one().await;

        log_internal!("Downloading {}.osu... ", beatmap_id);
        let bytes = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| anyhow!("Could not download beatmap {}: {}", beatmap_id, e.without_url()))?
            .bytes()
            .await
            .map_err(|e| anyhow!("Could not download beatmap {}: {}", beatmap_id, e.without_url()))?;

        // The endpoint answers unknown ids with an empty body
        if bytes.is_empty() {
            return Err(anyhow!("Beatmap {} is not available for download", beatmap_id));
        }
        log_internal!("Downloading {}.osu... done", beatmap_id);

        Ok(bytes.to_vec())
    }

    async fn store(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.directory).await.map_err(|e| {
            anyhow!(
                "Could not create directory `{}`: {}",
                self.directory.to_string_lossy(),
                e
            )
        })?;

        let nonce = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp_path = path.with_extension(format!("osu.{}.new", nonce));

        tokio::fs::write(&tmp_path, bytes).await.map_err(|e| {
            anyhow!(
                "Could not write beatmap to temporary file `{}`: {}",
                tmp_path.to_string_lossy(),
                e
            )
        })?;

        // Atomically rename so concurrent readers never see a partial file.
        tokio::fs::rename(&tmp_path, path).await.map_err(|e| {
            anyhow!(
                "Could not rename temporary file `{}` to `{}`: {}",
                tmp_path.to_string_lossy(),
                path.to_string_lossy(),
                e
            )
        })?;

        Ok(())
    }

    /// Delete the least recently written files beyond `max_files`.  `keep` is never deleted and
    /// counts towards the limit.
    async fn enforce_retention(&self, keep: &Path) -> Result<()> {
        let Some(max_files) = self.max_files else {
            return Ok(());
        };

        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.directory).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("osu") || path == keep {
                continue;
            }
            let modified = entry
                .metadata()
                .await?
                .modified()
                .unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((modified, path));
        }

        let allowed = max_files.saturating_sub(1);
        if files.len() <= allowed {
            return Ok(());
        }

        files.sort();
        let excess = files.len() - allowed;
        for (_, path) in files.into_iter().take(excess) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => log_internal!("Evicted {}", path.to_string_lossy()),
                // Another command got there first
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }
}

/// Spacing between two refills of a single download token, never zero
fn refill_interval(per_second: u32) -> Duration {
    (Duration::from_secs(1) / per_second.max(1)).max(Duration::from_millis(1))
}

#[serenity::async_trait]
impl BeatmapSource for BeatmapCache {
    type Beatmap = DecodedBeatmap;

    async fn load(&self, beatmap_id: u32) -> Result<(BeatmapRef, DecodedBeatmap)> {
        let bytes = self.bytes(beatmap_id).await?;
        let decoded = DecodedBeatmap::from_bytes(beatmap_id, &bytes)?;
        Ok((decoded.beatmap.clone(), decoded))
    }
}
