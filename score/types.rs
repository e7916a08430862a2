// ========================================================================================
//                             High-Level Data Contracts
// ========================================================================================

// This file is ONLY for types that are SHARED BETWEEN FILES, not types that only are used in one file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// CA19-9 values strictly above this level (U/ml) count as elevated.
pub const CA19_9_THRESHOLD: f64 = 35.0;

/// Clinical and pathological staging for a single patient.
///
/// The documented ranges are cT 1-4, ypT 0-4 and pN 0-2. Nothing here enforces
/// them; see [`crate::validate`] for the optional boundary check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingInput {
    pub ct: i32,
    pub ypt: i32,
    pub pn: i32,
}

impl StagingInput {
    pub fn new(ct: i32, ypt: i32, pn: i32) -> Self {
        Self { ct, ypt, pn }
    }
}

impl fmt::Display for StagingInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cT{} ypT{} pN{}", self.ct, self.ypt, self.pn)
    }
}

/// Ordered risk band derived from the NAR score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NarBand {
    #[serde(rename = "NARlow")]
    Low,
    #[serde(rename = "NARmedium")]
    Medium,
    #[serde(rename = "NARhigh")]
    High,
}

impl NarBand {
    pub const ALL: [NarBand; 3] = [NarBand::Low, NarBand::Medium, NarBand::High];

    pub fn label(self) -> &'static str {
        match self {
            NarBand::Low => "NARlow",
            NarBand::Medium => "NARmedium",
            NarBand::High => "NARhigh",
        }
    }
}

impl fmt::Display for NarBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Treatment-response band derived from the tumour regression grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TrgBand {
    #[serde(rename = "TRGlow")]
    Low,
    #[serde(rename = "TRGhigh")]
    High,
}

impl TrgBand {
    pub const ALL: [TrgBand; 2] = [TrgBand::Low, TrgBand::High];

    pub fn label(self) -> &'static str {
        match self {
            TrgBand::Low => "TRGlow",
            TrgBand::High => "TRGhigh",
        }
    }
}

impl fmt::Display for TrgBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Grading system the clinician reports TRG on.
///
/// Both scales share the `{1,2} -> Low` rule; they differ only in their top grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrgScale {
    /// Mandard TRG 1-5.
    Mandard,
    /// Modified Mandard TRG 1-4.
    ModifiedMandard,
}

impl TrgScale {
    pub fn max_grade(self) -> i32 {
        match self {
            TrgScale::Mandard => 5,
            TrgScale::ModifiedMandard => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrgScale::Mandard => "Mandard TRG (1-5)",
            TrgScale::ModifiedMandard => "Modified Mandard TRG (1-4)",
        }
    }
}

/// Ordinal NAR-TRG risk tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum CompositeScore {
    One,
    Two,
    Three,
}

impl CompositeScore {
    pub const ALL: [CompositeScore; 3] = [
        CompositeScore::One,
        CompositeScore::Two,
        CompositeScore::Three,
    ];

    pub fn value(self) -> u8 {
        match self {
            CompositeScore::One => 1,
            CompositeScore::Two => 2,
            CompositeScore::Three => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("NAR-TRG score must be 1, 2 or 3 (got {0})")]
pub struct InvalidCompositeScore(pub u8);

impl TryFrom<u8> for CompositeScore {
    type Error = InvalidCompositeScore;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(CompositeScore::One),
            2 => Ok(CompositeScore::Two),
            3 => Ok(CompositeScore::Three),
            other => Err(InvalidCompositeScore(other)),
        }
    }
}

impl From<CompositeScore> for u8 {
    fn from(score: CompositeScore) -> Self {
        score.value()
    }
}

impl fmt::Display for CompositeScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Tumour differentiation grade as recorded on the pathology report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Differentiation {
    Well,
    Moderate,
    Poor,
}

impl Differentiation {
    pub fn label(self) -> &'static str {
        match self {
            Differentiation::Well => "Well",
            Differentiation::Moderate => "Moderate",
            Differentiation::Poor => "Poor",
        }
    }
}

impl fmt::Display for Differentiation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown differentiation '{0}' (expected one of: well, moderate, poor)")]
pub struct DifferentiationParseError(pub String);

impl FromStr for Differentiation {
    type Err = DifferentiationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "well" => Ok(Differentiation::Well),
            "moderate" => Ok(Differentiation::Moderate),
            "poor" => Ok(Differentiation::Poor),
            _ => Err(DifferentiationParseError(s.to_string())),
        }
    }
}

/// The two binary covariates entering the Cox linear predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Covariates {
    pub differentiation_is_poor: bool,
    pub ca19_over_35: bool,
}

impl Covariates {
    pub fn new(differentiation_is_poor: bool, ca19_over_35: bool) -> Self {
        Self {
            differentiation_is_poor,
            ca19_over_35,
        }
    }

    /// Derives both indicators from the raw clinical values.
    pub fn from_clinical(differentiation: Differentiation, ca19_9: f64) -> Self {
        Self {
            differentiation_is_poor: differentiation == Differentiation::Poor,
            ca19_over_35: ca19_9 > CA19_9_THRESHOLD,
        }
    }
}
