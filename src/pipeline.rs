//! Fetch a player's top plays, recompute their pp and rank the result.

use crate::{
    osu::{
        api::{TopPlay, UserProfile},
        rescore::Rescorer,
    },
    ranking::{self, BeatmapRef, PlayRecord, PlayStore, RankingError, RankingReport},
};
use anyhow::Result;
use futures::{StreamExt, TryStreamExt};

/// Where profiles and top plays come from
#[serenity::async_trait]
pub trait PlaySource: Send + Sync {
    async fn user(&self, name: &str) -> Result<UserProfile>;
    async fn top_plays(&self, name: &str, limit: u8) -> Result<Vec<TopPlay>>;
}

/// Where decoded beatmaps come from
#[serenity::async_trait]
pub trait BeatmapSource: Send + Sync {
    type Beatmap: Send + Sync;

    async fn load(&self, beatmap_id: u32) -> Result<(BeatmapRef, Self::Beatmap)>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// Fetching, decoding or rescoring failed
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
    #[error(transparent)]
    Ranking(#[from] RankingError),
}

pub struct Profile {
    pub user: UserProfile,
    pub report: RankingReport,
}

pub struct ProfilePipeline<'a, P, B, R> {
    pub plays: &'a P,
    pub beatmaps: &'a B,
    pub rescorer: &'a R,
    /// Number of top plays to request
    pub limit: u8,
    /// Number of plays loaded and rescored at once
    pub concurrency: usize,
}

impl<P, B, R> ProfilePipeline<'_, P, B, R>
where
    P: PlaySource,
    B: BeatmapSource,
    R: Rescorer<Beatmap = B::Beatmap>,
{
    pub async fn user(&self, name: &str) -> Result<UserProfile, ProfileError> {
        Ok(self.plays.user(name).await?)
    }

    pub async fn top_plays(&self, name: &str) -> Result<Vec<TopPlay>, ProfileError> {
        Ok(self.plays.top_plays(name, self.limit).await?)
    }

    /// Rescore every play.  Any failure aborts the whole batch, nothing is skipped.
    ///
    /// The store keeps the order of `plays` regardless of concurrency.
    pub async fn rescore(&self, plays: &[TopPlay]) -> Result<PlayStore, ProfileError> {
        // Futures are created up front so the stream holds no borrowing closure
        let play_futs: Vec<_> = plays.iter().map(|play| self.rescore_play(play)).collect();

        let records: Vec<PlayRecord> = futures::stream::iter(play_futs)
            .buffered(self.concurrency.max(1))
            .try_collect()
            .await?;

        Ok(records.into_iter().collect())
    }

    async fn rescore_play(&self, play: &TopPlay) -> Result<PlayRecord> {
        let (beatmap, decoded) = self.beatmaps.load(play.beatmap_id).await?;
        let mods = play.mods();
        let local_rating = self
            .rescorer
            .compute_rating(&play.statistics(), mods, &decoded)
            .map_err(|e| e.context(format!("Could not rescore play on beatmap {}", play.beatmap_id)))?;

        Ok(PlayRecord {
            beatmap,
            mods: mods.label(),
            live_rating: play.pp,
            local_rating,
        })
    }

    pub fn rank(&self, user: &UserProfile, store: &PlayStore) -> Result<RankingReport, ProfileError> {
        Ok(ranking::rank(store.all(), user.total_pp())?)
    }

    /// All stages in one go
    pub async fn run(&self, name: &str) -> Result<Profile, ProfileError> {
        let user = self.user(name).await?;
        let plays = self.top_plays(name).await?;
        let store = self.rescore(&plays).await?;
        let report = self.rank(&user, &store)?;

        Ok(Profile { user, report })
    }
}
