//! Ranking of a player's top plays by live and locally recomputed pp.
//!
//! Everything in here is pure and synchronous.  A [`PlayStore`] is filled once per command
//! invocation and handed to [`rank`], which produces an immutable [`RankingReport`].

use std::cmp::Ordering;

/// Weight multiplier applied per rank when summing a player's plays.
pub const WEIGHT_DECAY: f64 = 0.95;

/// The chart a play was set on
#[derive(Clone, Debug, PartialEq)]
pub struct BeatmapRef {
    pub id: u32,
    /// e.g. `"129891 - xi - FREEDOM DiVE (Nakagawa-Kanon) [FOUR DIMENSIONS]"`
    pub label: String,
}

/// One of a player's top plays with both of its ratings
#[derive(Clone, Debug, PartialEq)]
pub struct PlayRecord {
    pub beatmap: BeatmapRef,
    /// Acronyms joined with `", "`, or `"None"`
    pub mods: String,
    /// pp as reported by the osu! servers
    pub live_rating: f64,
    /// pp as recomputed locally
    pub local_rating: f64,
}

/// Plays in the order they were fetched
#[derive(Default)]
pub struct PlayStore {
    records: Vec<PlayRecord>,
}

impl PlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: PlayRecord) {
        self.records.push(record);
    }

    pub fn all(&self) -> &[PlayRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<PlayRecord> for PlayStore {
    fn from_iter<I: IntoIterator<Item = PlayRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RatingField {
    Live,
    Local,
}

impl std::fmt::Display for RatingField {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            RatingField::Live => f.write_str("live"),
            RatingField::Local => f.write_str("local"),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RankingError {
    #[error("invalid {field} pp {value} on beatmap {beatmap_id}")]
    InvalidRating {
        beatmap_id: u32,
        field: RatingField,
        value: f64,
    },
}

/// A play together with its position in both orderings
#[derive(Clone, Debug, PartialEq)]
pub struct RankedPlay {
    pub record: PlayRecord,
    /// 0-indexed position when ordered by local pp
    pub local_position: usize,
    /// 0-indexed position when ordered by live pp
    pub live_position: usize,
}

impl RankedPlay {
    /// Positive when local rescoring moved the play down, negative when it moved up.
    pub fn rank_delta(&self) -> i64 {
        self.live_position as i64 - self.local_position as i64
    }

    pub fn rating_delta(&self) -> f64 {
        self.record.local_rating - self.record.live_rating
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RankingReport {
    /// Plays ordered by local pp, best first
    plays: Vec<RankedPlay>,
    /// Indices into `plays`, ordered by live pp, best first
    live_order: Vec<usize>,
    pub total_live_rating: f64,
    pub weighted_local_total: f64,
    /// Weighted sum of the fetched plays' live pp, i.e. the live total without bonus
    pub weighted_live_total: f64,
    pub bonus_rating: f64,
    pub adjusted_local_total: f64,
    pub total_delta: f64,
}

impl RankingReport {
    pub fn local_order(&self) -> &[RankedPlay] {
        &self.plays
    }

    pub fn live_order(&self) -> impl Iterator<Item = &RankedPlay> + '_ {
        self.live_order.iter().map(|&idx| &self.plays[idx])
    }

    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }
}

/// `Σ 0.95^i * rating_i` over an already sorted sequence
pub fn weighted_sum(ratings: impl IntoIterator<Item = f64>) -> f64 {
    let mut factor = 1.0;

    ratings.into_iter().fold(0.0, |sum, rating| {
        let weighted = sum + factor * rating;
        factor *= WEIGHT_DECAY;
        weighted
    })
}

fn check_rating(beatmap_id: u32, field: RatingField, value: f64) -> Result<(), RankingError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(RankingError::InvalidRating {
            beatmap_id,
            field,
            value,
        })
    }
}

/// Indices of `records` sorted by `key` descending.  Sorting is stable so ties keep fetch order.
fn order_by(records: &[PlayRecord], key: impl Fn(&PlayRecord) -> f64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by(|&a, &b| {
        key(&records[b])
            .partial_cmp(&key(&records[a]))
            .unwrap_or(Ordering::Equal)
    });
    order
}

/// Rank `records` by local and live pp and compare the weighted totals.
///
/// `total_live_rating` is the profile's pp as reported by the servers, which also covers plays
/// outside of `records`.
pub fn rank(records: &[PlayRecord], total_live_rating: f64) -> Result<RankingReport, RankingError> {
    for record in records {
        check_rating(record.beatmap.id, RatingField::Local, record.local_rating)?;
        check_rating(record.beatmap.id, RatingField::Live, record.live_rating)?;
    }

    let local_order = order_by(records, |record| record.local_rating);
    let live_order = order_by(records, |record| record.live_rating);

    let mut live_positions = vec![0; records.len()];
    for (position, &idx) in live_order.iter().enumerate() {
        live_positions[idx] = position;
    }

    // Input index -> index into `plays`
    let mut local_positions = vec![0; records.len()];
    for (position, &idx) in local_order.iter().enumerate() {
        local_positions[idx] = position;
    }

    let plays: Vec<RankedPlay> = local_order
        .iter()
        .enumerate()
        .map(|(local_position, &idx)| RankedPlay {
            record: records[idx].clone(),
            local_position,
            live_position: live_positions[idx],
        })
        .collect();

    let weighted_local_total = weighted_sum(plays.iter().map(|play| play.record.local_rating));
    let weighted_live_total =
        weighted_sum(live_order.iter().map(|&idx| records[idx].live_rating));

    // Approximation: whatever part of the profile total the fetched plays don't explain is
    // attributed to plays outside the top and playcount.  Known to be inaccurate and may be
    // negative.
    let bonus_rating = total_live_rating - weighted_live_total;
    let adjusted_local_total = weighted_local_total + bonus_rating;
    let total_delta = adjusted_local_total - total_live_rating;

    Ok(RankingReport {
        live_order: live_order.iter().map(|&idx| local_positions[idx]).collect(),
        plays,
        total_live_rating,
        weighted_local_total,
        weighted_live_total,
        bonus_rating,
        adjusted_local_total,
        total_delta,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    pub(crate) fn record(id: u32, local: f64, live: f64) -> PlayRecord {
        PlayRecord {
            beatmap: BeatmapRef {
                id,
                label: format!("{id} - Artist - Title (Mapper) [Insane]"),
            },
            mods: "None".to_owned(),
            live_rating: live,
            local_rating: local,
        }
    }

    fn ids<'a>(plays: impl Iterator<Item = &'a RankedPlay>) -> Vec<u32> {
        plays.map(|play| play.record.beatmap.id).collect()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPSILON,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn store_preserves_fetch_order() {
        let mut store = PlayStore::new();
        store.add(record(3, 10.0, 10.0));
        store.add(record(1, 30.0, 30.0));
        store.add(record(2, 20.0, 20.0));

        let ids: Vec<u32> = store.all().iter().map(|r| r.beatmap.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(store.len(), 3);

        // Ranking is a view, the store itself stays untouched
        rank(store.all(), 0.0).unwrap();
        let ids: Vec<u32> = store.all().iter().map(|r| r.beatmap.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn empty_input() {
        let report = rank(&[], 1234.5).unwrap();

        assert!(report.is_empty());
        assert_eq!(report.weighted_local_total, 0.0);
        assert_eq!(report.weighted_live_total, 0.0);
        assert_eq!(report.bonus_rating, 1234.5);
        assert_eq!(report.adjusted_local_total, 1234.5);
        assert_eq!(report.total_delta, 0.0);
    }

    #[test]
    fn single_unchanged_play() {
        let report = rank(&[record(1, 250.0, 250.0)], 250.0).unwrap();

        assert_eq!(report.weighted_local_total, 250.0);
        assert_eq!(report.bonus_rating, 0.0);
        assert_eq!(report.adjusted_local_total, 250.0);
        assert_eq!(report.total_delta, 0.0);
        assert_eq!(report.local_order()[0].rank_delta(), 0);
    }

    #[test]
    fn rank_delta_sign() {
        let a = record(1, 300.0, 100.0);
        let b = record(2, 100.0, 300.0);
        let report = rank(&[a, b], 400.0).unwrap();

        assert_eq!(ids(report.local_order().iter()), vec![1, 2]);
        assert_eq!(ids(report.live_order()), vec![2, 1]);

        let deltas: Vec<i64> = report.local_order().iter().map(RankedPlay::rank_delta).collect();
        assert_eq!(deltas, vec![1, -1]);
    }

    #[test]
    fn three_play_scenario() {
        let records = [
            record(1, 200.0, 180.0),
            record(2, 150.0, 160.0),
            record(3, 100.0, 90.0),
        ];
        let report = rank(&records, 400.0).unwrap();

        assert_close(report.weighted_local_total, 432.75);
        assert_close(report.weighted_live_total, 412.225);
        assert_close(report.bonus_rating, -12.225);
        assert_close(report.adjusted_local_total, 420.525);
        assert_close(report.total_delta, 20.525);
        assert_eq!(ids(report.live_order()), vec![1, 2, 3]);
    }

    #[test]
    fn orderings_are_sorted_permutations() {
        let records = [
            record(1, 120.0, 300.0),
            record(2, 410.0, 200.0),
            record(3, 90.0, 250.0),
            record(4, 300.0, 100.0),
        ];
        let report = rank(&records, 1000.0).unwrap();

        assert_eq!(ids(report.local_order().iter()), vec![2, 4, 1, 3]);
        assert_eq!(ids(report.live_order()), vec![1, 3, 2, 4]);

        for play in report.local_order() {
            let live_idx = report
                .live_order()
                .position(|other| other.record == play.record)
                .unwrap();
            assert_eq!(play.live_position, live_idx);
        }
    }

    #[test]
    fn ties_keep_fetch_order() {
        let records = [
            record(1, 100.0, 50.0),
            record(2, 200.0, 50.0),
            record(3, 100.0, 50.0),
            record(4, 200.0, 50.0),
        ];
        let report = rank(&records, 200.0).unwrap();

        assert_eq!(ids(report.local_order().iter()), vec![2, 4, 1, 3]);
        assert_eq!(ids(report.live_order()), vec![1, 2, 3, 4]);
    }

    #[test]
    fn weights_decay_geometrically() {
        let total = weighted_sum([100.0, 100.0, 100.0, 100.0]);
        assert_close(total, 100.0 + 95.0 + 90.25 + 85.7375);

        let contributions: Vec<f64> = (1..=4)
            .map(|n| weighted_sum(std::iter::repeat(1.0).take(n)))
            .collect::<Vec<_>>()
            .windows(2)
            .map(|w| w[1] - w[0])
            .collect();
        assert!(contributions.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn invalid_ratings_are_rejected() {
        let nan = rank(&[record(1, 100.0, 100.0), record(7, f64::NAN, 100.0)], 200.0);
        assert!(matches!(
            nan,
            Err(RankingError::InvalidRating {
                beatmap_id: 7,
                field: RatingField::Local,
                ..
            })
        ));

        let negative = rank(&[record(8, -1.0, 100.0)], 100.0);
        assert_eq!(
            negative,
            Err(RankingError::InvalidRating {
                beatmap_id: 8,
                field: RatingField::Local,
                value: -1.0,
            })
        );

        let infinite = rank(&[record(9, 100.0, f64::INFINITY)], 100.0);
        assert!(matches!(
            infinite,
            Err(RankingError::InvalidRating {
                field: RatingField::Live,
                ..
            })
        ));
    }

    #[test]
    fn ranking_is_idempotent() {
        let records = [
            record(1, 321.0, 300.0),
            record(2, 280.5, 310.0),
            record(3, 280.5, 150.0),
        ];

        assert_eq!(rank(&records, 900.0), rank(&records, 900.0));
    }
}
