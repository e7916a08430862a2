#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]
pub mod composite;
pub mod nar;
pub mod pipeline;
pub mod trg;
pub mod types;
pub mod validate;

// Survival model and its constants live beside the scoring stages.
#[path = "../calibrate/mod.rs"]
pub mod calibrate;

pub use calibrate::model::{ModelConstants, ModelError};
pub use calibrate::survival::{PredictionResult, SurvivalModel};
pub use pipeline::{Assessment, Calculator, NarTrgAssessment};
pub use types::{
    CompositeScore, Covariates, Differentiation, NarBand, StagingInput, TrgBand, TrgScale,
};
pub use validate::{DomainError, DomainWarning, InputPolicy};
