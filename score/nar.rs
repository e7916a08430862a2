//! Neoadjuvant Rectal (NAR) score and its three-way banding.
//!
//! Valentini's formula: `NAR = [5·pN − 3·(cT − ypT) + 12]² / 9.61`.

use crate::types::{NarBand, StagingInput};

/// Denominator of the NAR formula.
pub const NAR_DENOMINATOR: f64 = 9.61;

/// Scores strictly below this are `NARlow`.
pub const NAR_LOW_UPPER: f64 = 8.0;

/// Scores strictly above this are `NARhigh`.
pub const NAR_HIGH_LOWER: f64 = 16.0;

/// Computes the NAR score. Total over every integer triple; the bracket is
/// evaluated in 64-bit arithmetic so extreme inputs cannot overflow.
#[inline]
pub fn nar_score(ct: i32, ypt: i32, pn: i32) -> f64 {
    let bracket = 5 * i64::from(pn) - 3 * (i64::from(ct) - i64::from(ypt)) + 12;
    let bracket = bracket as f64;
    (bracket * bracket) / NAR_DENOMINATOR
}

#[inline]
pub fn nar_score_for(staging: &StagingInput) -> f64 {
    nar_score(staging.ct, staging.ypt, staging.pn)
}

/// Bands a NAR score. The closed interval [8, 16] is `Medium`.
#[inline]
pub fn classify_nar(score: f64) -> NarBand {
    if score < NAR_LOW_UPPER {
        NarBand::Low
    } else if score > NAR_HIGH_LOWER {
        NarBand::High
    } else {
        NarBand::Medium
    }
}
