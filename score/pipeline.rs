// ========================================================================================
//
//                           THE NOMOGRAM PIPELINE
//
// ========================================================================================
//
// Five stateless stages run strictly left to right:
//
//   staging -> NAR score -> NAR band ┐
//                                    ├-> NAR-TRG score -> survival model
//   TRG grade --------> TRG band ----┘
//
// `Calculator` owns the validated survival model and the input policy. It exposes
// the two entry points the presentation layer needs plus a convenience that
// runs the whole chain from raw clinical values.

use crate::calibrate::model::{ModelConstants, ModelError};
use crate::calibrate::survival::{PredictionResult, SurvivalModel};
use crate::composite::combine;
use crate::nar::{classify_nar, nar_score_for};
use crate::trg::classify_trg;
use crate::types::{
    CompositeScore, Covariates, Differentiation, NarBand, StagingInput, TrgBand, TrgScale,
};
use crate::validate::{self, DomainError, DomainWarning, InputPolicy};
use serde::{Deserialize, Serialize};

/// Output of the scoring half of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarTrgAssessment {
    pub staging: StagingInput,
    pub trg_grade: i32,
    pub nar_score: f64,
    pub nar_band: NarBand,
    pub trg_band: TrgBand,
    pub composite_score: CompositeScore,
    /// Out-of-range inputs that were evaluated anyway under the permissive policy.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<DomainWarning>,
}

/// Output of the full pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub nar_trg: NarTrgAssessment,
    pub differentiation: Differentiation,
    pub ca19_9: f64,
    pub covariates: Covariates,
    pub prediction: PredictionResult,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<DomainWarning>,
}

#[derive(Debug)]
pub struct Calculator {
    model: SurvivalModel,
    trg_scale: TrgScale,
    policy: InputPolicy,
}

impl Calculator {
    /// Validates the constants and fixes the point scale. Fails only on a
    /// configuration error.
    pub fn new(constants: &ModelConstants, policy: InputPolicy) -> Result<Self, ModelError> {
        Ok(Self {
            model: SurvivalModel::from_constants(constants)?,
            trg_scale: constants.trg_scale,
            policy,
        })
    }

    pub fn model(&self) -> &SurvivalModel {
        &self.model
    }

    pub fn trg_scale(&self) -> TrgScale {
        self.trg_scale
    }

    /// Scores staging and TRG into the NAR-TRG tier.
    pub fn compute_nar_trg(
        &self,
        staging: StagingInput,
        trg_grade: i32,
    ) -> Result<NarTrgAssessment, DomainError> {
        let mut findings = validate::check_staging(&staging);
        findings.extend(validate::check_trg(trg_grade, self.trg_scale));
        let warnings = self.policy.apply(findings)?;
        Ok(score_stages(staging, trg_grade, warnings))
    }

    /// Evaluates the survival model for an already-known NAR-TRG tier.
    pub fn compute_prediction(
        &self,
        composite_score: CompositeScore,
        covariates: Covariates,
    ) -> PredictionResult {
        self.model.predict(composite_score, covariates)
    }

    /// Runs the whole chain, deriving the covariates from the raw clinical values.
    pub fn assess(
        &self,
        staging: StagingInput,
        trg_grade: i32,
        differentiation: Differentiation,
        ca19_9: f64,
    ) -> Result<Assessment, DomainError> {
        // Collect every finding first so strict mode reports them together.
        let mut findings = validate::check_staging(&staging);
        findings.extend(validate::check_trg(trg_grade, self.trg_scale));
        let staging_findings = findings.len();
        findings.extend(validate::check_ca19_9(ca19_9));
        let mut warnings = self.policy.apply(findings)?;

        let covariate_warnings = warnings.split_off(staging_findings);
        let nar_trg = score_stages(staging, trg_grade, warnings);
        let covariates = Covariates::from_clinical(differentiation, ca19_9);
        let prediction = self.compute_prediction(nar_trg.composite_score, covariates);

        Ok(Assessment {
            nar_trg,
            differentiation,
            ca19_9,
            covariates,
            prediction,
            warnings: covariate_warnings,
        })
    }
}

fn score_stages(
    staging: StagingInput,
    trg_grade: i32,
    warnings: Vec<DomainWarning>,
) -> NarTrgAssessment {
    let nar_score = nar_score_for(&staging);
    let nar_band = classify_nar(nar_score);
    let trg_band = classify_trg(trg_grade);

    NarTrgAssessment {
        staging,
        trg_grade,
        nar_score,
        nar_band,
        trg_band,
        composite_score: combine(nar_band, trg_band),
        warnings,
    }
}
