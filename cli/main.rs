#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process;

use nartrg::calibrate::model::{ModelConstants, ModelError, ModelVariant};
use nartrg::calibrate::survival::PredictionResult;
use nartrg::pipeline::{Assessment, Calculator, NarTrgAssessment};
use nartrg::types::{CompositeScore, Covariates, Differentiation, StagingInput};
use nartrg::validate::{DomainWarning, InputPolicy};

#[derive(Clone, Copy, ValueEnum)]
pub enum VariantCli {
    /// Lookup-table weights per NAR-TRG tier, Mandard TRG 1-5
    Lookup,
    /// Single NAR-TRG coefficient, Modified Mandard TRG 1-4
    Continuous,
}

impl From<VariantCli> for ModelVariant {
    fn from(variant: VariantCli) -> Self {
        match variant {
            VariantCli::Lookup => ModelVariant::LookupTable,
            VariantCli::Continuous => ModelVariant::Continuous,
        }
    }
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Built-in model constants to use
    #[arg(
        long,
        value_enum,
        env = "NARTRG_VARIANT",
        default_value_t = VariantCli::Continuous,
        global = true
    )]
    pub variant: VariantCli,

    /// Path to a model constants file (.toml); overrides --variant
    #[arg(long, global = true)]
    pub model: Option<PathBuf>,

    /// Reject inputs outside their documented ranges instead of warning
    #[arg(long, global = true)]
    pub strict: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Args)]
pub struct StagingArgs {
    /// Clinical T stage (1-4)
    #[arg(long, allow_negative_numbers = true)]
    pub ct: i32,

    /// Post-treatment pathological T stage (0-4)
    #[arg(long, allow_negative_numbers = true)]
    pub ypt: i32,

    /// Pathological N stage (0-2)
    #[arg(long, allow_negative_numbers = true)]
    pub pn: i32,

    /// Tumour regression grade (1-5 Mandard, 1-4 Modified Mandard)
    #[arg(long, allow_negative_numbers = true)]
    pub trg: i32,
}

impl StagingArgs {
    fn staging(&self) -> StagingInput {
        StagingInput::new(self.ct, self.ypt, self.pn)
    }
}

#[derive(Args)]
pub struct PredictArgs {
    #[command(flatten)]
    pub staging: StagingArgs,

    /// Tumour differentiation: well, moderate or poor
    #[arg(long)]
    pub differentiation: Differentiation,

    /// Serum CA19-9 in U/ml
    #[arg(long = "ca19-9", allow_negative_numbers = true)]
    pub ca19_9: f64,
}

#[derive(Args)]
pub struct SurvivalArgs {
    /// NAR-TRG score (1-3)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=3))]
    pub composite: u8,

    /// Poorly differentiated tumour
    #[arg(long)]
    pub poor: bool,

    /// CA19-9 above 35 U/ml
    #[arg(long)]
    pub ca19_over_35: bool,
}

#[derive(Args)]
pub struct ConstantsArgs {
    /// Write the constants to this file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute the NAR score, NAR/TRG bands and NAR-TRG score
    #[command(about = "Compute NAR score and NAR-TRG grouping")]
    Nar(StagingArgs),

    /// Run the full nomogram from staging, TRG, differentiation and CA19-9
    #[command(about = "Compute nomogram points and 3-/5-year survival")]
    Predict(PredictArgs),

    /// Evaluate the survival model for a known NAR-TRG score
    #[command(about = "Compute points and survival from a NAR-TRG score")]
    Survival(SurvivalArgs),

    /// Print or export the active model constants as TOML
    #[command(about = "Show model constants (TOML)")]
    Constants(ConstantsArgs),

    /// Display version information
    #[command(about = "Display version information")]
    Version,
}

#[derive(Parser)]
#[command(
    name = "nartrg",
    version,
    about = "NAR score and NAR-TRG nomogram calculator for rectal cancer after neoadjuvant therapy."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Serialize)]
struct SurvivalReport {
    model: String,
    composite_score: CompositeScore,
    covariates: Covariates,
    prediction: PredictionResult,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let Cli { global, command } = cli;

    let result = match command {
        Some(Commands::Nar(args)) => run_nar(&global, &args),
        Some(Commands::Predict(args)) => run_predict(&global, &args),
        Some(Commands::Survival(args)) => run_survival(&global, &args),
        Some(Commands::Constants(args)) => run_constants(&global, &args),
        Some(Commands::Version) => {
            println!("nartrg {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        None => {
            Cli::command().print_help().expect("print help");
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn load_constants(global: &GlobalArgs) -> Result<ModelConstants, ModelError> {
    match &global.model {
        Some(path) => ModelConstants::load(path),
        None => Ok(ModelVariant::from(global.variant).constants()),
    }
}

fn build_calculator(global: &GlobalArgs) -> Result<Calculator, ModelError> {
    let constants = load_constants(global)?;
    let policy = if global.strict {
        InputPolicy::Strict
    } else {
        InputPolicy::Permissive
    };
    Calculator::new(&constants, policy)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_model_header(calculator: &Calculator) {
    println!(
        "Model: {} ({})",
        calculator.model().name(),
        calculator.trg_scale().label()
    );
}

fn print_nar_trg(result: &NarTrgAssessment) {
    println!(
        "NAR score = {:.2}, classified as {}",
        result.nar_score, result.nar_band
    );
    println!("TRG = {}, => {}", result.trg_grade, result.trg_band);
    println!("NAR-TRG score = {}", result.composite_score);
}

fn print_prediction(calculator: &Calculator, prediction: &PredictionResult) {
    println!(
        "Nomogram total points = {:.2} (max ~220)",
        prediction.points
    );
    println!("3-year survival = {:.1}%", prediction.survival_3yr * 100.0);
    let note = if calculator.model().baseline().five_year_fitted {
        ""
    } else {
        " (baseline not fitted)"
    };
    println!(
        "5-year survival = {:.1}%{note}",
        prediction.survival_5yr * 100.0
    );
}

fn print_warnings<'a>(warnings: impl IntoIterator<Item = &'a DomainWarning>) {
    for warning in warnings {
        println!("Warning: {warning}");
    }
}

fn run_nar(global: &GlobalArgs, args: &StagingArgs) -> Result<(), Box<dyn std::error::Error>> {
    let calculator = build_calculator(global)?;
    let result = calculator.compute_nar_trg(args.staging(), args.trg)?;

    if global.json {
        return print_json(&result);
    }
    print_model_header(&calculator);
    print_nar_trg(&result);
    print_warnings(&result.warnings);
    Ok(())
}

fn run_predict(global: &GlobalArgs, args: &PredictArgs) -> Result<(), Box<dyn std::error::Error>> {
    let calculator = build_calculator(global)?;
    let assessment: Assessment = calculator.assess(
        args.staging.staging(),
        args.staging.trg,
        args.differentiation,
        args.ca19_9,
    )?;

    if global.json {
        return print_json(&assessment);
    }
    print_model_header(&calculator);
    print_nar_trg(&assessment.nar_trg);
    println!(
        "Tumor differentiation = {}, CA19-9 = {:.1} U/ml (>35: {})",
        assessment.differentiation,
        assessment.ca19_9,
        if assessment.covariates.ca19_over_35 {
            "yes"
        } else {
            "no"
        }
    );
    print_prediction(&calculator, &assessment.prediction);
    print_warnings(
        assessment
            .nar_trg
            .warnings
            .iter()
            .chain(assessment.warnings.iter()),
    );
    Ok(())
}

fn run_survival(
    global: &GlobalArgs,
    args: &SurvivalArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let calculator = build_calculator(global)?;
    let composite_score = CompositeScore::try_from(args.composite)?;
    let covariates = Covariates::new(args.poor, args.ca19_over_35);
    let prediction = calculator.compute_prediction(composite_score, covariates);

    if global.json {
        return print_json(&SurvivalReport {
            model: calculator.model().name().to_string(),
            composite_score,
            covariates,
            prediction,
        });
    }
    print_model_header(&calculator);
    println!("NAR-TRG score = {composite_score}");
    print_prediction(&calculator, &prediction);
    Ok(())
}

fn run_constants(
    global: &GlobalArgs,
    args: &ConstantsArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let constants = load_constants(global)?;
    constants.validate()?;

    match &args.out {
        Some(path) => save_constants(&constants, path)?,
        None => print!("{}", constants.to_toml_string()?),
    }
    Ok(())
}

fn save_constants(constants: &ModelConstants, path: &Path) -> Result<(), ModelError> {
    constants.save(path)?;
    println!("Model constants saved to: {}", path.display());
    Ok(())
}
