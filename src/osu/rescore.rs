use crate::{osu::mods::LegacyMods, ranking::BeatmapRef};
use anyhow::{anyhow, Result};
use rosu_map::section::metadata::Metadata;

/// Hit counts of a single play
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoreStatistics {
    pub max_combo: u32,
    pub n300: u32,
    pub n100: u32,
    pub n50: u32,
    pub misses: u32,
    pub n_geki: u32,
    pub n_katu: u32,
}

/// Recomputes the pp of a play locally.
///
/// Implementations must be deterministic: the same input always yields the same rating.
pub trait Rescorer: Send + Sync {
    type Beatmap: Send + Sync;

    fn compute_rating(
        &self,
        stats: &ScoreStatistics,
        mods: LegacyMods,
        beatmap: &Self::Beatmap,
    ) -> Result<f64>;
}

/// A `.osu` file parsed for performance calculation
pub struct DecodedBeatmap {
    pub beatmap: BeatmapRef,
    map: rosu_pp::Beatmap,
}

impl DecodedBeatmap {
    pub fn from_bytes(id: u32, bytes: &[u8]) -> Result<Self> {
        let metadata: Metadata = rosu_map::from_bytes(bytes)
            .map_err(|e| anyhow!("Could not decode metadata of beatmap {}: {}", id, e))?;
        let map = rosu_pp::Beatmap::from_bytes(bytes)
            .map_err(|e| anyhow!("Could not decode beatmap {}: {}", id, e))?;

        Ok(Self {
            beatmap: BeatmapRef {
                id,
                label: label(id, &metadata),
            },
            map,
        })
    }
}

fn label(id: u32, metadata: &Metadata) -> String {
    format!(
        "{} - {} - {} ({}) [{}]",
        id, metadata.artist, metadata.title, metadata.creator, metadata.version
    )
}

/// osu!standard pp through rosu-pp, scored as a stable (non-lazer) play
pub struct RosuRescorer;

impl Rescorer for RosuRescorer {
    type Beatmap = DecodedBeatmap;

    fn compute_rating(
        &self,
        stats: &ScoreStatistics,
        mods: LegacyMods,
        beatmap: &DecodedBeatmap,
    ) -> Result<f64> {
        let attrs = rosu_pp::Performance::new(&beatmap.map)
            .mods(mods.bits())
            .lazer(false)
            .combo(stats.max_combo)
            .n_geki(stats.n_geki)
            .n_katu(stats.n_katu)
            .n300(stats.n300)
            .n100(stats.n100)
            .n50(stats.n50)
            .misses(stats.misses)
            .calculate();

        Ok(attrs.pp())
    }
}
