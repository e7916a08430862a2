use crate::types::TrgBand;

/// Highest grade still counted as a good response.
const TRG_LOW_MAX: i32 = 2;

/// Bands a tumour regression grade: 1 and 2 are `TRGlow`, everything else is
/// `TRGhigh`. The scale's upper bound is not checked here.
#[inline]
pub fn classify_trg(grade: i32) -> TrgBand {
    if (1..=TRG_LOW_MAX).contains(&grade) {
        TrgBand::Low
    } else {
        TrgBand::High
    }
}
