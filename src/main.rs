//! heartfuzz - fuzzy heart-disease risk assessment
//!
//! Command-line interface over the inference engine.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use heartfuzz::FuzzyError;
use heartfuzz::config::{HeartfuzzConfig, LogLevel, OutputFormat};
use heartfuzz::fuzzy::{Evaluation, InferenceEngine};
use heartfuzz::heart::{self, Assessment, PatientInputs, NO_MATCH_MESSAGE};

#[derive(Parser)]
#[command(name = "heartfuzz")]
#[command(version)]
#[command(about = "Fuzzy (Mamdani) heart-disease risk assessment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (defaults to the standard search paths)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Assess one patient
    Eval(EvalArgs),
    /// List the rule base
    Rules,
    /// List variables and their terms
    Variables,
    /// Print the effective configuration or write a default config file
    Config {
        /// Write the default configuration to PATH
        #[arg(long, value_name = "PATH")]
        init: Option<PathBuf>,

        /// Overwrite an existing file with --init
        #[arg(long, requires = "init")]
        force: bool,
    },
}

#[derive(Args)]
struct EvalArgs {
    /// Age in years
    #[arg(long)]
    age: Option<f64>,

    /// Resting blood pressure (mmHg)
    #[arg(long)]
    trestbps: Option<f64>,

    /// Serum cholesterol (mg/dl)
    #[arg(long)]
    chol: Option<f64>,

    /// Maximum heart rate achieved (bpm)
    #[arg(long)]
    thalach: Option<f64>,

    /// ST depression induced by exercise
    #[arg(long)]
    oldpeak: Option<f64>,

    /// Input for a custom model, may be repeated
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    set: Vec<(String, f64)>,

    /// Show every rule's firing strength and the input memberships
    #[arg(long)]
    explain: bool,

    /// Output format (defaults to the configured one)
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,
}

impl EvalArgs {
    fn has_clinical_inputs(&self) -> bool {
        [self.age, self.trestbps, self.chol, self.thalach, self.oldpeak]
            .iter()
            .any(Option::is_some)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn parse_assignment(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid number for '{}': {}", name.trim(), e))?;
    Ok((name.trim().to_string(), value))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = HeartfuzzConfig::load_with(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if cli.verbose {
        config.general.log_level = LogLevel::Verbose;
    } else if cli.quiet {
        config.general.log_level = LogLevel::Quiet;
    }
    init_logging(config.general.log_level);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Eval(args) => run_eval(&mut out, &config, &build_engine(&config)?, args)?,
        Command::Rules => print_rules(&mut out, &build_engine(&config)?)?,
        Command::Variables => print_variables(&mut out, &build_engine(&config)?)?,
        Command::Config { init, force } => run_config(&mut out, &config, init, force)?,
    }

    out.flush().context("Failed to write to stdout")?;
    Ok(())
}

fn build_engine(config: &HeartfuzzConfig) -> Result<InferenceEngine> {
    let engine = config.build_engine().context("Failed to build inference engine")?;
    debug!(rules = engine.rules().len(), "engine ready");
    Ok(engine)
}

fn run_config(out: &mut impl Write, config: &HeartfuzzConfig, init: Option<PathBuf>, force: bool) -> Result<()> {
    match init {
        Some(path) => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            fs::write(&path, HeartfuzzConfig::default_config_content())
                .with_context(|| format!("Failed to write config file: {}", path.display()))?;
            writeln!(out, "Wrote {}", path.display())?;
        }
        None => {
            let toml = config.to_toml().context("Failed to render configuration")?;
            write!(out, "{}", toml)?;
        }
    }
    Ok(())
}

fn init_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.filter_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run_eval(out: &mut impl Write, config: &HeartfuzzConfig, engine: &InferenceEngine, args: EvalArgs) -> Result<()> {
    let format = args.format.map(OutputFormat::from).unwrap_or(config.general.format);

    if config.model.is_some() {
        if args.has_clinical_inputs() {
            bail!("--age, --trestbps, --chol, --thalach and --oldpeak only apply to the heart model; use --set NAME=VALUE with a [model] config");
        }
        let inputs: HashMap<String, f64> = args.set.into_iter().collect();
        let evaluation = engine
            .evaluate(&inputs)
            .map_err(|err| evaluation_failed(out, format, err))?;
        return match format {
            OutputFormat::Json => write_json(out, &evaluation),
            OutputFormat::Text => write_evaluation(out, &evaluation, args.explain),
        };
    }

    if !args.set.is_empty() {
        bail!("--set needs a [model] section in the configuration; the heart model takes --age, --trestbps, --chol, --thalach and --oldpeak");
    }

    let mut patient = PatientInputs::at_means(&config.dataset.stats());
    for (slot, value) in [
        (&mut patient.age, args.age),
        (&mut patient.trestbps, args.trestbps),
        (&mut patient.chol, args.chol),
        (&mut patient.thalach, args.thalach),
        (&mut patient.oldpeak, args.oldpeak),
    ] {
        if let Some(value) = value {
            *slot = value;
        }
    }

    let assessment = heart::assess(engine, &patient).map_err(|err| evaluation_failed(out, format, err))?;
    match format {
        OutputFormat::Json => write_json(out, &assessment),
        OutputFormat::Text => write_assessment(out, &patient, &assessment, args.explain),
    }
}

/// Under JSON output the structured error also goes to stdout
fn evaluation_failed(out: &mut impl Write, format: OutputFormat, err: FuzzyError) -> anyhow::Error {
    if format == OutputFormat::Json {
        if let Err(io_err) = writeln!(out, "{}", err.to_json_pretty()) {
            return anyhow::Error::new(io_err).context("Failed to write error report");
        }
    }
    anyhow::Error::new(err).context("Evaluation failed")
}

fn write_json(out: &mut impl Write, value: &impl serde::Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    writeln!(out, "{}", json)?;
    Ok(())
}

fn write_assessment(
    out: &mut impl Write,
    patient: &PatientInputs,
    assessment: &Assessment,
    explain: bool,
) -> Result<()> {
    writeln!(
        out,
        "age={} trestbps={} chol={} thalach={} oldpeak={}",
        patient.age, patient.trestbps, patient.chol, patient.thalach, patient.oldpeak
    )?;
    match (assessment.risk.value(), assessment.category) {
        (Some(score), Some(category)) => {
            writeln!(out, "Risk: {:.2} ({})", score, category)?;
        }
        _ => writeln!(out, "Risk: -")?,
    }
    writeln!(out, "{}", assessment.message())?;

    if explain {
        writeln!(out)?;
        write_explanation(out, &assessment.evaluation)?;
    }
    Ok(())
}

fn write_evaluation(out: &mut impl Write, evaluation: &Evaluation, explain: bool) -> Result<()> {
    for (name, value) in &evaluation.outputs {
        match value.value() {
            Some(crisp) => writeln!(out, "{}: {:.2}", name, crisp)?,
            None => writeln!(out, "{}: - ({})", name, NO_MATCH_MESSAGE)?,
        }
    }
    if explain {
        writeln!(out)?;
        write_explanation(out, evaluation)?;
    }
    Ok(())
}

fn write_explanation(out: &mut impl Write, evaluation: &Evaluation) -> Result<()> {
    writeln!(out, "Memberships:")?;
    for (variable, degrees) in &evaluation.fuzzified {
        let terms: Vec<String> = degrees
            .iter()
            .map(|(label, mu)| format!("{}={}", label, mu))
            .collect();
        writeln!(out, "  {:<10} {}", variable, terms.join(" "))?;
    }

    writeln!(out, "Rules:")?;
    for firing in &evaluation.firings {
        let name = firing
            .name
            .clone()
            .unwrap_or_else(|| format!("#{}", firing.index + 1));
        writeln!(out, "  {:<4} {}  {}", name, firing.strength, firing.rule)?;
    }
    Ok(())
}

fn print_rules(out: &mut impl Write, engine: &InferenceEngine) -> Result<()> {
    for (i, rule) in engine.rules().iter().enumerate() {
        let name = rule.name.clone().unwrap_or_else(|| format!("#{}", i + 1));
        writeln!(out, "{:<4} {}", name, rule)?;
    }
    Ok(())
}

fn print_variables(out: &mut impl Write, engine: &InferenceEngine) -> Result<()> {
    let sections = [
        ("Inputs", engine.inputs().collect::<Vec<_>>()),
        ("Outputs", engine.outputs().collect::<Vec<_>>()),
    ];
    for (title, variables) in sections {
        writeln!(out, "{}:", title)?;
        for var in variables {
            let universe = var.universe();
            writeln!(
                out,
                "  {} [{}, {}] step {}",
                var.name(),
                universe.min(),
                universe.max(),
                universe.step()
            )?;
            for (label, mf) in var.terms() {
                writeln!(out, "    {:<12} {}", label, mf)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("temp=21.5").unwrap(), ("temp".to_string(), 21.5));
        assert_eq!(parse_assignment(" temp = 3 ").unwrap(), ("temp".to_string(), 3.0));
        assert!(parse_assignment("temp").is_err());
        assert!(parse_assignment("temp=warm").is_err());
    }

    #[test]
    fn test_eval_defaults_to_means() {
        let config = HeartfuzzConfig::new();
        let engine = config.build_engine().unwrap();
        let args = EvalArgs {
            age: None,
            trestbps: None,
            chol: None,
            thalach: None,
            oldpeak: None,
            set: Vec::new(),
            explain: true,
            format: Some(FormatArg::Text),
        };

        let mut buf = Vec::new();
        run_eval(&mut buf, &config, &engine, args).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Risk: 50.00 (sedang)"));
        assert!(text.contains("Risiko Sedang"));
        assert!(text.contains("R2"));
    }

    fn eval_args() -> EvalArgs {
        EvalArgs {
            age: None,
            trestbps: None,
            chol: None,
            thalach: None,
            oldpeak: None,
            set: Vec::new(),
            explain: false,
            format: Some(FormatArg::Json),
        }
    }

    fn fan_config() -> HeartfuzzConfig {
        HeartfuzzConfig::load_from_str(
            r#"
            [model]
            rules = ["IF temp IS hot THEN fan IS fast"]

            [[model.inputs]]
            name = "temp"
            min = 0.0
            max = 40.0
            terms = [{ label = "hot", shape = { triangular = [20.0, 40.0, 40.0] } }]

            [[model.outputs]]
            name = "fan"
            min = 0.0
            max = 100.0
            terms = [{ label = "fast", shape = { triangular = [50.0, 100.0, 100.0] } }]
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_eval_rejects_inputs_for_other_model() {
        let config = fan_config();
        let engine = config.build_engine().unwrap();
        let args = EvalArgs {
            age: Some(60.0),
            set: vec![("temp".to_string(), 30.0)],
            ..eval_args()
        };
        let err = run_eval(&mut Vec::new(), &config, &engine, args).unwrap_err();
        assert!(err.to_string().contains("--set NAME=VALUE"));

        let config = HeartfuzzConfig::new();
        let engine = config.build_engine().unwrap();
        let args = EvalArgs {
            set: vec![("temp".to_string(), 30.0)],
            ..eval_args()
        };
        let err = run_eval(&mut Vec::new(), &config, &engine, args).unwrap_err();
        assert!(err.to_string().contains("[model]"));
    }

    #[test]
    fn test_eval_custom_model() {
        let config = fan_config();
        let engine = config.build_engine().unwrap();
        let args = EvalArgs {
            set: vec![("temp".to_string(), 40.0)],
            format: Some(FormatArg::Text),
            ..eval_args()
        };
        let mut buf = Vec::new();
        run_eval(&mut buf, &config, &engine, args).unwrap();
        assert!(String::from_utf8(buf).unwrap().starts_with("fan: "));
    }

    #[test]
    fn test_eval_error_as_json() {
        let config = fan_config();
        let engine = config.build_engine().unwrap();

        let mut buf = Vec::new();
        let err = run_eval(&mut buf, &config, &engine, eval_args()).unwrap_err();
        assert_eq!(err.to_string(), "Evaluation failed");
        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(json["code"], "MISSING_INPUT");
        assert!(json["message"].as_str().unwrap().contains("temp"));

        let args = EvalArgs {
            format: Some(FormatArg::Text),
            ..eval_args()
        };
        let mut buf = Vec::new();
        assert!(run_eval(&mut buf, &config, &engine, args).is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_eval_reports_no_match() {
        let config = HeartfuzzConfig::new();
        let engine = config.build_engine().unwrap();
        let stats = config.dataset.stats();
        let args = EvalArgs {
            age: Some(stats.age.max),
            trestbps: Some(stats.trestbps.min),
            chol: Some(stats.chol.min),
            thalach: Some(stats.thalach.min),
            oldpeak: Some(stats.oldpeak.min),
            set: Vec::new(),
            explain: false,
            format: Some(FormatArg::Json),
        };

        let mut buf = Vec::new();
        run_eval(&mut buf, &config, &engine, args).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(json["risk"]["status"], "no_rule_fired");
        assert!(json.get("category").is_none());
    }
}
