use super::super::domain::RatingBand;

/// Map an overall average onto the cycle's rating bands.
///
/// Bands are scanned in descending `min_score` order and the first band whose
/// threshold the score meets wins, so overlapping bands resolve to the higher
/// one. A score below every threshold falls back to the lowest band; an empty
/// band list yields the neutral unrated sentinel.
pub fn classify(score: f64, bands: &[RatingBand]) -> RatingBand {
    let mut ordered: Vec<&RatingBand> = bands.iter().collect();
    ordered.sort_by(|a, b| b.min_score.total_cmp(&a.min_score));

    let matched = ordered.iter().find(|band| score >= band.min_score);
    match matched.or_else(|| ordered.last()) {
        Some(band) => (*band).clone(),
        None => RatingBand::unrated(),
    }
}
