//! Optional boundary checks for caller-supplied inputs.
//!
//! The scoring stages are total and never look at these ranges. A
//! [`InputPolicy`] decides whether an out-of-range input is reported alongside
//! the result (`Permissive`, the historical behaviour) or rejects the request
//! outright (`Strict`).

use crate::types::{StagingInput, TrgScale};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use thiserror::Error;

pub const CT_RANGE: RangeInclusive<i32> = 1..=4;
pub const YPT_RANGE: RangeInclusive<i32> = 0..=4;
pub const PN_RANGE: RangeInclusive<i32> = 0..=2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputField {
    Ct,
    Ypt,
    Pn,
    Trg,
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InputField::Ct => "cT",
            InputField::Ypt => "ypT",
            InputField::Pn => "pN",
            InputField::Trg => "TRG",
        })
    }
}

/// An input the calculator can still evaluate but which has no clinical meaning.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum DomainWarning {
    #[error("{field} = {value} is outside the documented range {min}-{max}")]
    OutOfRange {
        field: InputField,
        value: i32,
        min: i32,
        max: i32,
    },
    #[error("CA19-9 = {value} U/ml is not a non-negative number")]
    InvalidCa19 { value: f64 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("input rejected under strict validation: {}", join_warnings(.warnings))]
    OutOfRange { warnings: Vec<DomainWarning> },
}

fn join_warnings(warnings: &[DomainWarning]) -> String {
    warnings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputPolicy {
    #[default]
    Permissive,
    Strict,
}

impl InputPolicy {
    /// Applies the policy to a batch of findings. Permissive mode logs each one
    /// and hands them back; strict mode turns any finding into an error.
    pub fn apply(self, warnings: Vec<DomainWarning>) -> Result<Vec<DomainWarning>, DomainError> {
        if warnings.is_empty() {
            return Ok(warnings);
        }
        match self {
            InputPolicy::Permissive => {
                for warning in &warnings {
                    warn!("{warning}; computing anyway");
                }
                Ok(warnings)
            }
            InputPolicy::Strict => Err(DomainError::OutOfRange { warnings }),
        }
    }
}

fn check_range(
    field: InputField,
    value: i32,
    range: &RangeInclusive<i32>,
) -> Option<DomainWarning> {
    if range.contains(&value) {
        None
    } else {
        Some(DomainWarning::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

pub fn check_staging(staging: &StagingInput) -> Vec<DomainWarning> {
    [
        check_range(InputField::Ct, staging.ct, &CT_RANGE),
        check_range(InputField::Ypt, staging.ypt, &YPT_RANGE),
        check_range(InputField::Pn, staging.pn, &PN_RANGE),
    ]
    .into_iter()
    .flatten()
    .collect()
}

pub fn check_trg(grade: i32, scale: TrgScale) -> Option<DomainWarning> {
    check_range(InputField::Trg, grade, &(1..=scale.max_grade()))
}

pub fn check_ca19_9(value: f64) -> Option<DomainWarning> {
    if value.is_finite() && value >= 0.0 {
        None
    } else {
        Some(DomainWarning::InvalidCa19 { value })
    }
}
