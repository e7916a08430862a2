use crate::types::{CompositeScore, NarBand, TrgBand};

/// Combines the NAR and TRG bands into the NAR-TRG score.
///
/// A high NAR band dominates regardless of response. Below that, the TRG band
/// separates tier 1 from tier 2.
#[inline]
pub fn combine(nar_band: NarBand, trg_band: TrgBand) -> CompositeScore {
    match (nar_band, trg_band) {
        (NarBand::High, _) => CompositeScore::Three,
        (NarBand::Low | NarBand::Medium, TrgBand::Low) => CompositeScore::One,
        (NarBand::Low | NarBand::Medium, TrgBand::High) => CompositeScore::Two,
    }
}
