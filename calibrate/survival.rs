//! Cox proportional-hazards scoring for the NAR-TRG nomogram.
//!
//! The linear predictor is
//!
//! ```text
//! LP = f(NAR-TRG) + beta_diff·[poor differentiation] + beta_ca19·[CA19-9 > 35]
//! ```
//!
//! where `f` is supplied by a [`LinearPredictorStrategy`]. Everything after the
//! linear predictor is shared: the relative predictor `LP − LP_base` is mapped
//! onto the point scale and used to raise the baseline survival probabilities.

use super::model::{BaselineSurvival, ModelConstants, ModelError};
use crate::types::{CompositeScore, Covariates};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Computes the NAR-TRG share of the linear predictor.
pub trait LinearPredictorStrategy: fmt::Debug + Send + Sync {
    fn composite_contribution(&self, score: CompositeScore) -> f64;

    /// Short name for logs and reports.
    fn describe(&self) -> &'static str;
}

/// Discrete weight per tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookupTablePredictor {
    weights: [f64; 3],
}

impl LookupTablePredictor {
    pub fn new(weights: [f64; 3]) -> Self {
        Self { weights }
    }
}

impl LinearPredictorStrategy for LookupTablePredictor {
    fn composite_contribution(&self, score: CompositeScore) -> f64 {
        self.weights[usize::from(score.value()) - 1]
    }

    fn describe(&self) -> &'static str {
        "lookup table"
    }
}

/// Single coefficient times the raw tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContinuousPredictor {
    beta_nar: f64,
}

impl ContinuousPredictor {
    pub fn new(beta_nar: f64) -> Self {
        Self { beta_nar }
    }
}

impl LinearPredictorStrategy for ContinuousPredictor {
    fn composite_contribution(&self, score: CompositeScore) -> f64 {
        self.beta_nar * f64::from(score.value())
    }

    fn describe(&self) -> &'static str {
        "continuous coefficient"
    }
}

/// Output of one nomogram evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub linear_predictor: f64,
    pub relative_linear_predictor: f64,
    /// Nomogram points, floored at zero. May exceed the nominal 220.
    pub points: f64,
    pub survival_3yr: f64,
    pub survival_5yr: f64,
}

/// `S(t) = S0(t) ^ exp(lp_rel)`.
///
/// Lies in (0, 1] for a baseline in (0, 1) as long as `S0 ^ exp(lp_rel)` stays
/// representable. Once `exp(lp_rel) * ln(S0)` drops below about -745 (an
/// `lp_rel` near 9 for `S0 = 0.9`) the result underflows to exactly 0.0.
/// [`ModelConstants::validate`] warns about coefficients that can get there.
#[inline]
pub fn survival_probability(baseline: f64, relative_linear_predictor: f64) -> f64 {
    baseline.powf(relative_linear_predictor.exp())
}

/// A validated, ready-to-evaluate nomogram.
///
/// Construction validates the constants and fixes the point scale once; after
/// that the model is immutable and can be shared across threads by reference.
#[derive(Debug)]
pub struct SurvivalModel {
    name: String,
    strategy: Box<dyn LinearPredictorStrategy>,
    beta_differentiation: f64,
    beta_ca19: f64,
    lp_base: f64,
    point_scale: f64,
    baseline: BaselineSurvival,
}

impl SurvivalModel {
    pub fn from_constants(constants: &ModelConstants) -> Result<Self, ModelError> {
        let point_scale = constants.point_scale()?;
        let strategy = constants.composite_term.strategy();
        debug!(
            "Survival model '{}' uses a {} linear predictor; {:.4} points per unit of relative LP",
            constants.name,
            strategy.describe(),
            point_scale
        );
        Ok(Self {
            name: constants.name.clone(),
            strategy,
            beta_differentiation: constants.beta_differentiation,
            beta_ca19: constants.beta_ca19,
            lp_base: constants.lp_base,
            point_scale,
            baseline: constants.baseline_survival,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strategy(&self) -> &dyn LinearPredictorStrategy {
        self.strategy.as_ref()
    }

    pub fn point_scale(&self) -> f64 {
        self.point_scale
    }

    pub fn baseline(&self) -> BaselineSurvival {
        self.baseline
    }

    pub fn linear_predictor(&self, score: CompositeScore, covariates: Covariates) -> f64 {
        let mut lp = self.strategy.composite_contribution(score);
        if covariates.differentiation_is_poor {
            lp += self.beta_differentiation;
        }
        if covariates.ca19_over_35 {
            lp += self.beta_ca19;
        }
        lp
    }

    pub fn predict(&self, score: CompositeScore, covariates: Covariates) -> PredictionResult {
        let linear_predictor = self.linear_predictor(score, covariates);
        let relative_linear_predictor = linear_predictor - self.lp_base;
        let points = (relative_linear_predictor * self.point_scale).max(0.0);

        PredictionResult {
            linear_predictor,
            relative_linear_predictor,
            points,
            survival_3yr: survival_probability(self.baseline.three_year, relative_linear_predictor),
            survival_5yr: survival_probability(self.baseline.five_year, relative_linear_predictor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibrate::model::CompositeTerm;
    use approx::assert_abs_diff_eq;

    fn all_covariates() -> [Covariates; 4] {
        [
            Covariates::new(false, false),
            Covariates::new(true, false),
            Covariates::new(false, true),
            Covariates::new(true, true),
        ]
    }

    #[test]
    fn continuous_worst_case_matches_hand_calculation() {
        let model = SurvivalModel::from_constants(&ModelConstants::continuous_fitted()).unwrap();
        let result = model.predict(CompositeScore::Three, Covariates::new(true, true));

        assert_abs_diff_eq!(result.linear_predictor, 2.4084, epsilon = 1e-12);
        assert_abs_diff_eq!(result.relative_linear_predictor, 2.9222644, epsilon = 1e-9);
        assert_abs_diff_eq!(result.points, 334.0, epsilon = 0.01);
        assert!(result.points > 220.0, "points are not capped at 220");
        assert_abs_diff_eq!(
            result.survival_3yr,
            0.938052_f64.powf(2.9222644_f64.exp()),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(result.survival_3yr, 0.3047, epsilon = 1e-4);
    }

    #[test]
    fn lookup_reference_patient_matches_hand_calculation() {
        let model = SurvivalModel::from_constants(&ModelConstants::lookup_table_demo()).unwrap();
        let result = model.predict(CompositeScore::One, Covariates::default());

        assert_abs_diff_eq!(result.linear_predictor, 0.0);
        assert_abs_diff_eq!(result.relative_linear_predictor, 0.51, epsilon = 1e-12);
        assert_abs_diff_eq!(result.points, 0.51 * 220.0 / 1.92, epsilon = 1e-9);
        assert_abs_diff_eq!(result.survival_3yr, 0.9021, epsilon = 1e-4);
        assert_abs_diff_eq!(result.survival_5yr, 0.8391, epsilon = 1e-4);
    }

    #[test]
    fn lookup_worst_case_adds_both_covariates() {
        let model = SurvivalModel::from_constants(&ModelConstants::lookup_table_demo()).unwrap();
        let lp = model.linear_predictor(CompositeScore::Three, Covariates::new(true, true));
        assert_abs_diff_eq!(lp, 1.0 + 0.4 + 0.56, epsilon = 1e-12);
    }

    #[test]
    fn higher_tier_never_improves_outlook_in_either_variant() {
        for constants in [
            ModelConstants::lookup_table_demo(),
            ModelConstants::continuous_fitted(),
        ] {
            let model = SurvivalModel::from_constants(&constants).unwrap();
            for covariates in all_covariates() {
                for pair in CompositeScore::ALL.windows(2) {
                    let lower = model.predict(pair[0], covariates);
                    let higher = model.predict(pair[1], covariates);
                    assert!(higher.linear_predictor >= lower.linear_predictor);
                    assert!(higher.points >= lower.points);
                    assert!(higher.survival_3yr <= lower.survival_3yr);
                    assert!(higher.survival_5yr <= lower.survival_5yr);
                }
            }
        }
    }

    #[test]
    fn points_are_floored_at_zero_when_lp_falls_below_base() {
        let mut constants = ModelConstants::lookup_table_demo();
        constants.lp_base = 0.8;
        constants.lp_max_scenario = 2.5;
        let model = SurvivalModel::from_constants(&constants).unwrap();

        let result = model.predict(CompositeScore::One, Covariates::default());
        assert!(result.relative_linear_predictor < 0.0);
        assert_eq!(result.points, 0.0);
        // Survival is still reported for a below-baseline patient.
        assert!(result.survival_3yr > constants.baseline_survival.three_year);
        assert!(result.survival_3yr <= 1.0);
    }

    #[test]
    fn survival_stays_within_unit_interval() {
        for constants in [
            ModelConstants::lookup_table_demo(),
            ModelConstants::continuous_fitted(),
        ] {
            let model = SurvivalModel::from_constants(&constants).unwrap();
            for score in CompositeScore::ALL {
                for covariates in all_covariates() {
                    let result = model.predict(score, covariates);
                    for s in [result.survival_3yr, result.survival_5yr] {
                        assert!(s > 0.0 && s <= 1.0, "{s} outside (0, 1]");
                    }
                    assert!(result.survival_5yr <= result.survival_3yr);
                }
            }
        }
    }

    #[test]
    fn strategy_is_selected_by_the_composite_term() {
        let lookup = SurvivalModel::from_constants(&ModelConstants::lookup_table_demo()).unwrap();
        assert_eq!(lookup.strategy().describe(), "lookup table");

        let mut constants = ModelConstants::lookup_table_demo();
        constants.composite_term = CompositeTerm::Continuous { beta_nar: 0.5 };
        let continuous = SurvivalModel::from_constants(&constants).unwrap();
        assert_eq!(continuous.strategy().describe(), "continuous coefficient");
        assert_abs_diff_eq!(
            continuous.linear_predictor(CompositeScore::Two, Covariates::default()),
            1.0
        );
    }

    #[test]
    fn degenerate_constants_fail_to_build() {
        let mut constants = ModelConstants::continuous_fitted();
        constants.lp_max_scenario = constants.lp_base;
        assert!(matches!(
            SurvivalModel::from_constants(&constants),
            Err(ModelError::DegenerateScale { .. })
        ));
    }

    #[test]
    fn unusable_point_scale_fails_to_build() {
        let mut constants = ModelConstants::continuous_fitted();
        constants.lp_base = 0.0;
        constants.lp_max_scenario = 1e-320;
        assert!(matches!(
            SurvivalModel::from_constants(&constants),
            Err(ModelError::DegenerateScale { .. })
        ));
    }

    #[test]
    fn built_model_keeps_the_precomputed_scale_and_baseline() {
        let constants = ModelConstants::continuous_fitted();
        let model = SurvivalModel::from_constants(&constants).unwrap();
        assert_eq!(model.name(), "continuous-fitted");
        assert_abs_diff_eq!(
            model.point_scale(),
            constants.point_scale().unwrap(),
            epsilon = 1e-12
        );
        assert!(model.point_scale().is_finite());
        assert!(!model.baseline().five_year_fitted);
    }

    #[test]
    fn model_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SurvivalModel>();
    }
}
