mod form;
mod render;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use nafld_core::{
    DisplayResponse, NamedValues, PredictError, PredictionResult, PredictorConfig, RequestHandler,
};
use serde_json::{json, Value as JsonValue};

use crate::form::{FormSession, FormStep};
use crate::render::{coerce_text, field_lines, parse_assignment};

const EXIT_OK: i32 = 0;
const EXIT_REJECTED: i32 = 1;
const EXIT_STARTUP: i32 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "nafld",
    version,
    about = "Estimate NAFLD probability from lifestyle and demographic answers",
    long_about = "nafld scores lifestyle and demographic answers with a trained NAFLD risk model\n\
        and reports the probability together with a risk band.\n\n\
        Educational use only; not medical advice.\n\n\
        EXAMPLES:\n\
        \n  nafld fields                                   List the model's input fields\n\
        \n  nafld predict --defaults --set 'BMI=31.5'      Score the defaults with one change\n\
        \n  nafld predict --input answers.json --json      Score a JSON file, print JSON\n\
        \n  nafld form                                     Answer each field interactively"
)]
struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML configuration file (model, schema and audit settings)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the schema fields in model order with their domains
    Fields,

    /// Score one set of answers
    Predict(PredictArgs),

    /// Answer each field at an interactive prompt, then score
    Form,
}

#[derive(Debug, Args, Clone)]
struct PredictArgs {
    /// JSON answers: an object keyed by feature name, or an array in schema
    /// order ("-" reads stdin)
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Set one answer; may be repeated
    #[arg(long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,

    /// Start from every field's default value
    #[arg(long)]
    defaults: bool,

    /// Print the response as JSON
    #[arg(long)]
    json: bool,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn read_json_input(path: &Path) -> Result<JsonValue, String> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("failed to read stdin: {e}"))?;
        buf
    } else {
        fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?
    };
    serde_json::from_str(&text).map_err(|e| format!("invalid JSON input: {e}"))
}

enum Submission {
    Named(NamedValues),
    Positional(Vec<JsonValue>),
}

fn build_submission(handler: &RequestHandler, args: &PredictArgs) -> Result<Submission, String> {
    let context = handler.context();
    let mut named = if args.defaults {
        context.assembler().defaults()
    } else {
        NamedValues::new()
    };

    if let Some(path) = &args.input {
        match read_json_input(path)? {
            JsonValue::Object(map) => named.extend(map),
            JsonValue::Array(values) => {
                if args.defaults || !args.set.is_empty() {
                    return Err("array input cannot be combined with --defaults or --set".into());
                }
                return Ok(Submission::Positional(values));
            }
            other => return Err(format!("expected a JSON object or array, got {other}")),
        }
    }

    for assignment in &args.set {
        let (name, raw) = parse_assignment(assignment)?;
        if !context.schema().contains(&name) {
            return Err(format!("unknown field '{name}'"));
        }
        let value = coerce_text(context.catalog().spec_for(&name), &raw);
        named.insert(name, value);
    }
    Ok(Submission::Named(named))
}

fn print_response(result: &Result<PredictionResult, PredictError>, as_json: bool) {
    let response = DisplayResponse::from(result);
    if as_json {
        let body = match result {
            Ok(r) => json!({
                "message": response.message,
                "probability": response.probability,
                "result": r,
            }),
            Err(e) => json!({
                "message": response.message,
                "probability": JsonValue::Null,
                "error_kind": format!("{:?}", e.kind()),
            }),
        };
        println!("{body}");
    } else if result.is_ok() {
        println!("{}", response.message);
    } else {
        eprintln!("{}", response.message);
    }
}

fn exit_code(result: &Result<PredictionResult, PredictError>) -> i32 {
    if result.is_ok() {
        EXIT_OK
    } else {
        EXIT_REJECTED
    }
}

fn run_predict(handler: &RequestHandler, args: &PredictArgs) -> i32 {
    let submission = match build_submission(handler, args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return EXIT_STARTUP;
        }
    };
    let result = match submission {
        Submission::Named(named) => handler.predict(&named),
        Submission::Positional(values) => handler.predict_positional(&values),
    };
    print_response(&result, args.json);
    exit_code(&result)
}

fn run_fields(handler: &RequestHandler) -> i32 {
    for line in field_lines(handler.context()) {
        println!("{line}");
    }
    EXIT_OK
}

fn run_form(handler: &RequestHandler) -> i32 {
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    let mut rl = match DefaultEditor::new() {
        Ok(e) => e,
        Err(e) => {
            eprintln!("error: failed to initialize prompt: {e}");
            return EXIT_STARTUP;
        }
    };

    println!("NAFLD Lifestyle Risk Predictor");
    println!("Educational use only; not medical advice. Press Enter to keep a default.");
    let mut session = FormSession::new(handler.context());
    loop {
        match rl.readline(&session.prompt()) {
            Ok(line) => match session.handle_line(&line) {
                FormStep::Next => {}
                FormStep::Retry(msg) => eprintln!("  {msg}"),
                FormStep::Complete(named) => {
                    let result = handler.predict(&named);
                    print_response(&result, false);
                    return exit_code(&result);
                }
            },
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return EXIT_OK,
            Err(e) => {
                eprintln!("error: prompt failed: {e}");
                return EXIT_STARTUP;
            }
        }
    }
}

fn run_cli() -> i32 {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = match PredictorConfig::resolve(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("error: {e}");
            return EXIT_STARTUP;
        }
    };
    let handler = match RequestHandler::from_config(&cfg) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("error: {e}");
            return EXIT_STARTUP;
        }
    };

    let code = match &cli.command {
        Command::Fields => run_fields(&handler),
        Command::Predict(args) => run_predict(&handler, args),
        Command::Form => run_form(&handler),
    };
    handler.shutdown();
    code
}

fn main() {
    std::process::exit(run_cli());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use nafld_core::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn predict_flags_parse() {
        let cli = Cli::try_parse_from([
            "nafld",
            "-vv",
            "predict",
            "--defaults",
            "--set",
            "BMI=31.5",
            "--set",
            "Gender=Female",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Predict(args) => {
                assert!(args.defaults && args.json);
                assert_eq!(args.set, vec!["BMI=31.5", "Gender=Female"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn submissions_combine_defaults_file_and_overrides() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("feature_order.json"),
            r#"["Gender", "Age in years"]"#,
        )
        .unwrap();
        std::fs::write(
            tmp.path().join("pipeline.json"),
            r#"{"name": "t", "intercept": 0.0, "columns": [
                {"kind": "one_hot", "name": "Gender", "levels": {"Male": 0.0, "Female": 0.0}},
                {"kind": "scaled", "name": "Age in years", "mean": 40.0, "scale": 10.0, "coef": 0.0}
            ]}"#,
        )
        .unwrap();
        std::fs::write(tmp.path().join("answers.json"), r#"{"Gender": "Female"}"#).unwrap();
        let mut cfg = PredictorConfig::default();
        cfg.features_path = tmp.path().join("feature_order.json");
        cfg.model_path = tmp.path().join("pipeline.json");
        let handler = RequestHandler::from_config(&cfg).unwrap();

        let args = PredictArgs {
            input: Some(tmp.path().join("answers.json")),
            set: vec!["Age in years=61".into()],
            defaults: true,
            json: false,
        };
        let named = match build_submission(&handler, &args).unwrap() {
            Submission::Named(named) => named,
            Submission::Positional(_) => panic!("expected named submission"),
        };
        assert_eq!(named.get("Gender"), Some(&json!("Female")));
        assert_eq!(named.get("Age in years"), Some(&json!(61.0)));
        let result = handler.predict(&named).unwrap();
        assert_eq!(result.risk_percentage, 50.0);

        let args = PredictArgs {
            input: None,
            set: vec!["Waist=3".into()],
            defaults: false,
            json: false,
        };
        assert!(build_submission(&handler, &args).is_err());

        let missing = handler.predict(&NamedValues::new()).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::MissingField);
        assert_eq!(exit_code(&Err(missing)), EXIT_REJECTED);
    }
}
