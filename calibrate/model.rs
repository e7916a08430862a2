use super::survival::{
    ContinuousPredictor, LinearPredictorStrategy, LookupTablePredictor, survival_probability,
};
use crate::types::{CompositeScore, TrgScale};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

// --- Public Data Structures ---
// These structs define the public, human-readable format of the model constants
// when serialized to a TOML file.

/// Nominal top of the nomogram point scale. Points are floored at zero but not capped here.
pub const NOMOGRAM_MAX_POINTS: f64 = 220.0;

/// How the NAR-TRG score enters the linear predictor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CompositeTerm {
    /// One log hazard ratio per NAR-TRG tier.
    LookupTable {
        score_1: f64,
        score_2: f64,
        score_3: f64,
    },
    /// A single log hazard ratio multiplied by the raw tier (1, 2 or 3).
    Continuous { beta_nar: f64 },
}

impl CompositeTerm {
    /// Builds the linear-predictor strategy this term describes.
    pub fn strategy(&self) -> Box<dyn LinearPredictorStrategy> {
        match *self {
            CompositeTerm::LookupTable {
                score_1,
                score_2,
                score_3,
            } => Box::new(LookupTablePredictor::new([score_1, score_2, score_3])),
            CompositeTerm::Continuous { beta_nar } => Box::new(ContinuousPredictor::new(beta_nar)),
        }
    }

    fn named_values(&self) -> Vec<(&'static str, f64)> {
        match *self {
            CompositeTerm::LookupTable {
                score_1,
                score_2,
                score_3,
            } => vec![
                ("composite_term.score_1", score_1),
                ("composite_term.score_2", score_2),
                ("composite_term.score_3", score_3),
            ],
            CompositeTerm::Continuous { beta_nar } => vec![("composite_term.beta_nar", beta_nar)],
        }
    }

    /// Largest contribution any tier can make.
    fn max_contribution(&self) -> f64 {
        let strategy = self.strategy();
        CompositeScore::ALL
            .iter()
            .map(|&score| strategy.composite_contribution(score))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// True when a worse tier can never lower the linear predictor.
    fn is_monotone(&self) -> bool {
        let strategy = self.strategy();
        CompositeScore::ALL.windows(2).all(|pair| {
            strategy.composite_contribution(pair[0]) <= strategy.composite_contribution(pair[1])
        })
    }
}

/// Baseline survival probabilities at the two reporting horizons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineSurvival {
    pub three_year: f64,
    /// 5-year baseline survival. Only meaningful as a fitted estimate when
    /// `five_year_fitted` is true.
    pub five_year: f64,
    /// False when `five_year` is a stand-in rather than a value fitted with the
    /// rest of the model. Reports flag 5-year survival from such a baseline.
    #[serde(default = "fitted_by_default")]
    pub five_year_fitted: bool,
}

fn fitted_by_default() -> bool {
    true
}

/// The complete, read-only parameter set of one nomogram variant.
///
/// Field order matters for TOML output: scalar keys must precede the nested
/// tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConstants {
    pub name: String,
    /// Scale the TRG input is reported on for this variant.
    pub trg_scale: TrgScale,
    /// Log hazard ratio for poor differentiation versus well/moderate.
    pub beta_differentiation: f64,
    /// Log hazard ratio for CA19-9 above 35 U/ml.
    pub beta_ca19: f64,
    /// Linear predictor of the reference patient.
    pub lp_base: f64,
    /// Linear predictor of the worst-case patient, mapped to the top of the point scale.
    pub lp_max_scenario: f64,
    pub composite_term: CompositeTerm,
    pub baseline_survival: BaselineSurvival,
}

/// Built-in constant sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelVariant {
    /// Demo lookup weights on the Mandard 1-5 scale.
    LookupTable,
    /// Fitted single-coefficient model on the Modified Mandard 1-4 scale.
    Continuous,
}

impl ModelVariant {
    pub fn constants(self) -> ModelConstants {
        match self {
            ModelVariant::LookupTable => ModelConstants::lookup_table_demo(),
            ModelVariant::Continuous => ModelConstants::continuous_fitted(),
        }
    }
}

/// Custom error type for loading, saving and validating model constants.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read or write model constants file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML model constants: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Failed to serialize model constants to TOML format: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
    #[error(
        "lp_max_scenario ({lp_max_scenario}) and lp_base ({lp_base}) give no finite, non-zero span; the point scale is undefined."
    )]
    DegenerateScale { lp_base: f64, lp_max_scenario: f64 },
    #[error("Model constant '{name}' must be finite (got {value}).")]
    NonFiniteConstant { name: &'static str, value: f64 },
    #[error("Baseline survival '{name}' must lie strictly between 0 and 1 (got {value}).")]
    BaselineSurvivalOutOfRange { name: &'static str, value: f64 },
}

impl ModelConstants {
    /// Demo lookup weights {0.0, 0.5, 1.0} per NAR-TRG tier with demo covariate
    /// effects, on the Mandard 1-5 scale.
    pub fn lookup_table_demo() -> Self {
        Self {
            name: "lookup-table-demo".to_string(),
            trg_scale: TrgScale::Mandard,
            beta_differentiation: 0.4,
            beta_ca19: 0.56,
            lp_base: -0.51,
            lp_max_scenario: 1.41,
            composite_term: CompositeTerm::LookupTable {
                score_1: 0.0,
                score_2: 0.5,
                score_3: 1.0,
            },
            baseline_survival: BaselineSurvival {
                three_year: 0.94,
                five_year: 0.90,
                five_year_fitted: true,
            },
        }
    }

    /// Fitted single-coefficient model: the NAR-TRG tier enters the linear
    /// predictor as a continuous term, on the Modified Mandard 1-4 scale.
    ///
    /// Only the 3-year baseline survival was published with this fit. The 5-year
    /// baseline reuses the demo value 0.90 and is marked as not fitted, so 5-year
    /// estimates from this preset are indicative only.
    pub fn continuous_fitted() -> Self {
        Self {
            name: "continuous-fitted".to_string(),
            trg_scale: TrgScale::ModifiedMandard,
            beta_differentiation: 0.3897,
            beta_ca19: 0.5679,
            lp_base: -0.5138644,
            lp_max_scenario: 1.410968,
            composite_term: CompositeTerm::Continuous { beta_nar: 0.4836 },
            baseline_survival: BaselineSurvival {
                three_year: 0.938052,
                five_year: 0.90,
                five_year_fitted: false,
            },
        }
    }

    /// Checks every invariant the survival model relies on.
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut named = vec![
            ("beta_differentiation", self.beta_differentiation),
            ("beta_ca19", self.beta_ca19),
            ("lp_base", self.lp_base),
            ("lp_max_scenario", self.lp_max_scenario),
            ("baseline_survival.three_year", self.baseline_survival.three_year),
            ("baseline_survival.five_year", self.baseline_survival.five_year),
        ];
        named.extend(self.composite_term.named_values());
        for (name, value) in named {
            if !value.is_finite() {
                return Err(ModelError::NonFiniteConstant { name, value });
            }
        }

        for (name, value) in [
            ("three_year", self.baseline_survival.three_year),
            ("five_year", self.baseline_survival.five_year),
        ] {
            if value <= 0.0 || value >= 1.0 {
                return Err(ModelError::BaselineSurvivalOutOfRange { name, value });
            }
        }

        let scale = self.raw_point_scale();
        if !scale.is_finite() || scale == 0.0 {
            return Err(ModelError::DegenerateScale {
                lp_base: self.lp_base,
                lp_max_scenario: self.lp_max_scenario,
            });
        }
        if self.lp_max_scenario < self.lp_base {
            warn!(
                "'{}': lp_max_scenario ({}) is below lp_base ({}); points will be inverted",
                self.name, self.lp_max_scenario, self.lp_base
            );
        }

        if self.beta_differentiation < 0.0
            || self.beta_ca19 < 0.0
            || !self.composite_term.is_monotone()
        {
            warn!(
                "'{}': negative or non-monotone coefficients; higher NAR-TRG tiers are no longer guaranteed to score worse",
                self.name
            );
        }

        let worst_relative = self.worst_case_linear_predictor() - self.lp_base;
        if [
            self.baseline_survival.three_year,
            self.baseline_survival.five_year,
        ]
        .into_iter()
        .any(|baseline| survival_probability(baseline, worst_relative) == 0.0)
        {
            warn!(
                "'{}': worst-case relative linear predictor {:.3} drives survival to 0; coefficients are too large for the survival formula",
                self.name, worst_relative
            );
        }

        Ok(())
    }

    fn raw_point_scale(&self) -> f64 {
        NOMOGRAM_MAX_POINTS / (self.lp_max_scenario - self.lp_base)
    }

    /// Linear predictor of the highest-risk patient these coefficients allow.
    fn worst_case_linear_predictor(&self) -> f64 {
        self.composite_term.max_contribution()
            + self.beta_differentiation.max(0.0)
            + self.beta_ca19.max(0.0)
    }

    /// Points per unit of relative linear predictor. Always finite and non-zero.
    pub fn point_scale(&self) -> Result<f64, ModelError> {
        self.validate()?;
        Ok(self.raw_point_scale())
    }

    pub fn to_toml_string(&self) -> Result<String, ModelError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ModelError> {
        let constants: Self = toml::from_str(source)?;
        constants.validate()?;
        Ok(constants)
    }

    /// Saves the constants to a file in a human-readable TOML format.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let toml_string = self.to_toml_string()?;
        let mut file = BufWriter::new(fs::File::create(path)?);
        file.write_all(toml_string.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Loads and validates constants from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let toml_string = fs::read_to_string(path)?;
        let constants = Self::from_toml_str(&toml_string)?;
        info!(
            "Loaded model constants '{}' from {}",
            constants.name,
            path.display()
        );
        Ok(constants)
    }
}
