use std::fs;
use std::process::{Command, Output};

use tempfile::tempdir;

fn nartrg(args: &[&str]) -> Output {
    let exe = env!("CARGO_BIN_EXE_nartrg");
    Command::new(exe)
        .env_remove("NARTRG_VARIANT")
        .args(args)
        .output()
        .expect("run nartrg cli")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn nar_subcommand_prints_bands_and_tier() {
    let output = nartrg(&["nar", "--ct", "1", "--ypt", "0", "--pn", "2", "--trg", "4"]);
    assert!(output.status.success(), "CLI exited with {:?}", output.status);

    let text = stdout(&output);
    assert!(text.contains("NAR score = 37.57, classified as NARhigh"), "{text}");
    assert!(text.contains("TRG = 4, => TRGhigh"), "{text}");
    assert!(text.contains("NAR-TRG score = 3"), "{text}");
}

#[test]
fn predict_subcommand_reports_points_and_survival() {
    let output = nartrg(&[
        "predict",
        "--ct",
        "1",
        "--ypt",
        "0",
        "--pn",
        "2",
        "--trg",
        "4",
        "--differentiation",
        "poor",
        "--ca19-9",
        "80",
    ]);
    assert!(output.status.success(), "CLI exited with {:?}", output.status);

    let text = stdout(&output);
    assert!(text.contains("Model: continuous-fitted"), "{text}");
    assert!(text.contains("Nomogram total points = 334.00 (max ~220)"), "{text}");
    assert!(text.contains("3-year survival = 30.5%"), "{text}");
}

#[test]
fn unfitted_five_year_baseline_is_flagged_in_the_report() {
    let continuous = nartrg(&[
        "--variant",
        "continuous",
        "survival",
        "--composite",
        "3",
        "--poor",
        "--ca19-over-35",
    ]);
    assert!(continuous.status.success());
    let text = stdout(&continuous);
    assert!(
        text.contains("5-year survival = 14.1% (baseline not fitted)"),
        "{text}"
    );
    assert!(!text.contains("3-year survival = 30.5% (baseline not fitted)"), "{text}");

    let lookup = nartrg(&["--variant", "lookup", "survival", "--composite", "3"]);
    assert!(lookup.status.success());
    assert!(!stdout(&lookup).contains("baseline not fitted"));
}

#[test]
fn lookup_variant_is_selected_by_environment() {
    let exe = env!("CARGO_BIN_EXE_nartrg");
    let output = Command::new(exe)
        .env("NARTRG_VARIANT", "lookup")
        .args(["survival", "--composite", "1"])
        .output()
        .expect("run nartrg cli");
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("Model: lookup-table-demo (Mandard TRG (1-5))"), "{text}");
    assert!(text.contains("Nomogram total points = 58.44"), "{text}");
    assert!(text.contains("3-year survival = 90.2%"), "{text}");
    assert!(text.contains("5-year survival = 83.9%"), "{text}");
}

#[test]
fn json_output_is_machine_readable() {
    let output = nartrg(&[
        "--json",
        "survival",
        "--composite",
        "3",
        "--poor",
        "--ca19-over-35",
    ]);
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(value["composite_score"], 3);
    let points = value["prediction"]["points"].as_f64().expect("points");
    assert!((points - 334.0).abs() < 0.05, "{points}");
}

#[test]
fn strict_mode_rejects_out_of_range_input() {
    let permissive = nartrg(&["nar", "--ct", "9", "--ypt", "0", "--pn", "0", "--trg", "2"]);
    assert!(permissive.status.success());
    assert!(stdout(&permissive).contains("Warning: cT = 9"));

    let strict = nartrg(&[
        "--strict", "nar", "--ct", "9", "--ypt", "0", "--pn", "0", "--trg", "2",
    ]);
    assert!(!strict.status.success());
    let stderr = String::from_utf8_lossy(&strict.stderr);
    assert!(stderr.contains("Error: input rejected"), "{stderr}");
}

#[test]
fn constants_export_can_be_loaded_back_as_a_model() {
    let tmp = tempdir().expect("temporary directory");
    let path = tmp.path().join("lookup.toml");
    let path_str = path.to_str().expect("path str");

    let export = nartrg(&["--variant", "lookup", "constants", "--out", path_str]);
    assert!(export.status.success());
    assert!(fs::read_to_string(&path).unwrap().contains("kind = \"LookupTable\""));

    let output = nartrg(&["--model", path_str, "survival", "--composite", "1"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Model: lookup-table-demo"));
}

#[test]
fn degenerate_model_file_fails_at_startup() {
    let tmp = tempdir().expect("temporary directory");
    let path = tmp.path().join("broken.toml");
    let toml = "name = \"broken\"\n\
trg_scale = \"Mandard\"\n\
beta_differentiation = 0.4\n\
beta_ca19 = 0.56\n\
lp_base = 1.0\n\
lp_max_scenario = 1.0\n\
\n\
[composite_term]\n\
kind = \"Continuous\"\n\
beta_nar = 0.5\n\
\n\
[baseline_survival]\n\
three_year = 0.94\n\
five_year = 0.9\n";
    fs::write(&path, toml).expect("write model");

    let output = nartrg(&[
        "--model",
        path.to_str().expect("path str"),
        "survival",
        "--composite",
        "2",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("point scale is undefined"), "{stderr}");
}

#[test]
fn composite_outside_one_to_three_is_a_usage_error() {
    let output = nartrg(&["survival", "--composite", "4"]);
    assert!(!output.status.success());
}
