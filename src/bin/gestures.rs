//! Gestures CLI - Command-line interface for Gesture Flux
//!
//! Commands:
//! - replay: Replay recorded input events into frame snapshots (batch mode)
//! - run: Replay input events streamed on stdin (streaming mode)
//! - validate: Check input events for schema and frame-order problems
//! - schema: Print input/output schema information
//! - doctor: Check a classifier configuration before a replay

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use gesture_flux::encoder::FRAME_SCHEMA_VERSION;
use gesture_flux::schema::{EventKind, InputEventAdapter};
use gesture_flux::types::FrameRecord;
use gesture_flux::{
    ClassifierConfig, GestureError, GestureProcessor, LogObserver, UnknownChannelPolicy,
    GESTURE_FLUX_VERSION, SCHEMA_VERSION,
};

/// Gestures - Tap / Press / Hold classification for recorded input events
#[derive(Parser)]
#[command(name = "gestures")]
#[command(author = "Synheart AI Inc")]
#[command(version = GESTURE_FLUX_VERSION)]
#[command(about = "Replay input events into tap/press/hold frame snapshots", long_about = None)]
struct Cli {
    /// Log classifier transitions (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay input events into frame snapshots (batch mode)
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Classifier configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Replay input events streamed on stdin (streaming mode)
    Run {
        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Classifier configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Buffer output instead of flushing after each closed frame
        #[arg(long)]
        no_flush: bool,
    },

    /// Check input events for schema and frame-order problems
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a classifier configuration before a replay
    Doctor {
        /// Configuration file to check (defaults are checked when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one event per line)
    Ndjson,
    /// JSON array of events
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one frame record per line)
    Ndjson,
    /// JSON array of frame records
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (gesture.input_event.v1)
    Input,
    /// Output schema (gesture.frame.v1)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

fn run(cli: Cli) -> Result<(), GesturesCliError> {
    match cli.command {
        Commands::Replay {
            input,
            output,
            input_format,
            output_format,
            config,
        } => cmd_replay(&input, &output, input_format, output_format, config.as_deref()),

        Commands::Run {
            output_format,
            config,
            no_flush,
        } => cmd_run(output_format, config.as_deref(), !no_flush),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn read_input(input: &Path) -> Result<String, GesturesCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_config(path: Option<&Path>) -> Result<ClassifierConfig, GesturesCliError> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path)?;
            Ok(ClassifierConfig::from_json(&json)?)
        }
        None => Ok(ClassifierConfig::default()),
    }
}

fn build_processor(config: &ClassifierConfig) -> GestureProcessor {
    let mut processor = GestureProcessor::with_config(config);
    if log::log_enabled!(log::Level::Debug) {
        processor.observe(LogObserver::default());
    }
    processor
}

fn cmd_replay(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    config: Option<&Path>,
) -> Result<(), GesturesCliError> {
    let config = load_config(config)?;
    let input_data = read_input(input)?;

    let events = match input_format {
        InputFormat::Ndjson => InputEventAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => InputEventAdapter::parse_array(&input_data)?,
    };

    if events.is_empty() {
        return Err(GesturesCliError::NoEvents);
    }

    let mut processor = build_processor(&config);
    let mut records = processor.process_events(&events)?;
    records.extend(processor.finish());
    log::info!("replayed {} events into {} frames", events.len(), records.len());

    let output_data = format_output(&records, &output_format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_run(
    output_format: OutputFormat,
    config: Option<&Path>,
    flush: bool,
) -> Result<(), GesturesCliError> {
    let config = load_config(config)?;
    let mut processor = build_processor(&config);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        let records = processor.process_line(&line)?;
        if records.is_empty() {
            continue;
        }

        write!(stdout, "{}", format_output(&records, &output_format)?)?;
        if flush {
            stdout.flush()?;
        }
    }

    if let Some(last) = processor.finish() {
        write!(stdout, "{}", format_output(&[last], &output_format)?)?;
    }
    stdout.flush()?;

    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), GesturesCliError> {
    let input_data = read_input(input)?;

    let events = match input_format {
        InputFormat::Ndjson => InputEventAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => InputEventAdapter::parse_array(&input_data)?,
    };

    let schema_errors: Vec<EventProblem> = InputEventAdapter::validate_events(&events)
        .into_iter()
        .map(|r| EventProblem {
            index: r.index,
            frame: events[r.index].frame,
            problem: r.error.to_string(),
        })
        .collect();
    let order_errors: Vec<EventProblem> = InputEventAdapter::frame_order_issues(&events)
        .into_iter()
        .map(|issue| EventProblem {
            index: issue.index,
            frame: issue.frame,
            problem: format!("{} (after frame {})", issue.kind.as_str(), issue.previous),
        })
        .collect();

    let report = InputReport {
        events: events.len(),
        first_frame: events.first().map(|e| e.frame),
        last_frame: events.last().map(|e| e.frame),
        ticks: events.iter().filter(|e| e.kind == EventKind::Tick).count(),
        channels: InputEventAdapter::channels(&events)
            .into_iter()
            .map(|c| c.to_string())
            .collect(),
        schema_errors,
        order_errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_input_report(&report);
    }

    let problems = report.schema_errors.len() + report.order_errors.len();
    if problems > 0 {
        Err(GesturesCliError::ValidationFailed(problems))
    } else {
        Ok(())
    }
}

fn print_input_report(report: &InputReport) {
    match (report.first_frame, report.last_frame) {
        (Some(first), Some(last)) => println!(
            "{} events, frames {}..={}, {} explicit ticks",
            report.events, first, last, report.ticks
        ),
        _ => println!("no events"),
    }
    if report.channels.is_empty() {
        println!("channels: none");
    } else {
        println!("channels: {}", report.channels.join(", "));
    }

    for (label, problems) in [
        ("schema", &report.schema_errors),
        ("frame order", &report.order_errors),
    ] {
        if problems.is_empty() {
            continue;
        }
        println!("{} problems:", label);
        for p in problems {
            println!("  #{} (frame {}): {}", p.index, p.frame, p.problem);
        }
    }
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), GesturesCliError> {
    let mut findings = Vec::new();

    let config = match config {
        Some(path) => match load_config(Some(path)) {
            Ok(config) => config,
            Err(e) => {
                findings.push(Finding::error("config", CliError::from(e).message));
                return report_findings(findings, json);
            }
        },
        None => ClassifierConfig::default(),
    };

    let channels: Vec<&str> = config.channels.iter().map(|c| c.as_str()).collect();
    findings.push(if channels.is_empty() {
        Finding::ok("channels", "none pre-registered".to_string())
    } else {
        Finding::ok("channels", channels.join(", "))
    });

    findings.push(match config.unknown_channels {
        UnknownChannelPolicy::AutoRegister => Finding::ok(
            "unknown_channels",
            "auto_register: channels are tracked from their first event".to_string(),
        ),
        UnknownChannelPolicy::Reject if channels.is_empty() => Finding::error(
            "unknown_channels",
            "reject with no channels configured: every event would be refused".to_string(),
        ),
        UnknownChannelPolicy::Reject => Finding::ok(
            "unknown_channels",
            "reject: events for other channels stop the replay".to_string(),
        ),
    });

    findings.push(match (config.emit_idle_frames, config.max_idle_gap) {
        (false, _) => Finding::ok("idle_frames", "off".to_string()),
        (true, 0) => Finding::warning(
            "idle_frames",
            "on with max_idle_gap 0: any skipped frame stops the replay".to_string(),
        ),
        (true, limit) => Finding::ok("idle_frames", format!("on, at most {} per gap", limit)),
    });

    findings.push(if atty::is(atty::Stream::Stdin) {
        Finding::warning(
            "stdin",
            "terminal attached; 'gestures run' expects piped records".to_string(),
        )
    } else {
        Finding::ok("stdin", "piped".to_string())
    });

    report_findings(findings, json)
}

fn report_findings(findings: Vec<Finding>, json: bool) -> Result<(), GesturesCliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(&findings)?);
    } else {
        println!("gestures {}", GESTURE_FLUX_VERSION);
        for f in &findings {
            println!("{:>7}  {:<16} {}", f.status.label(), f.check, f.detail);
        }
    }

    if findings.iter().any(|f| f.status == Status::Error) {
        Err(GesturesCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), GesturesCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("One record per host interaction event:");
                println!();
                println!("- frame: tick index the event belongs to (non-decreasing)");
                println!("- channel: logical input name (required except for ticks)");
                println!("- kind:");
                println!("  - engage: tap interaction performed (Tap on, Press off)");
                println!("  - disengage: tap interaction canceled (Tap off, Press on, Hold on)");
                println!("  - hold_release: hold interaction performed (Hold off)");
                println!("  - tick: close the frame now");
                println!("- event_id, timestamp: optional, informational");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: {}", FRAME_SCHEMA_VERSION);
                println!();
                println!("One record per closed frame:");
                println!();
                println!("- schema_version");
                println!("- producer: {{ name, version, instance_id }}");
                println!("- frame: tick index");
                println!("- computed_at_utc");
                println!("- channels: {{ <channel>: {{ tap, press, hold }} }}");
                println!();
                println!("States are observed after the frame's events and before its tick.");
            }
        }
    }

    Ok(())
}

// Helper functions

fn format_output(records: &[FrameRecord], format: &OutputFormat) -> Result<String, GesturesCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut output = String::new();
            for record in records {
                output.push_str(&serde_json::to_string(record)?);
                output.push('\n');
            }
            Ok(output)
        }
        OutputFormat::Json => Ok(serde_json::to_string(records)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(records)? + "\n"),
    }
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://synheart.ai/schemas/gesture.input_event.v1.json",
        "title": SCHEMA_VERSION,
        "description": "Gesture Flux input event schema",
        "type": "object",
        "required": ["schema_version", "frame", "kind"],
        "properties": {
            "schema_version": { "type": "string", "const": SCHEMA_VERSION },
            "event_id": { "type": "string" },
            "frame": { "type": "integer", "minimum": 0 },
            "timestamp": { "type": "string", "format": "date-time" },
            "channel": { "type": "string", "minLength": 1 },
            "kind": {
                "type": "string",
                "enum": ["engage", "disengage", "hold_release", "tick"]
            }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://synheart.ai/schemas/gesture.frame.v1.json",
        "title": FRAME_SCHEMA_VERSION,
        "description": "Gesture Flux frame snapshot schema",
        "type": "object",
        "required": ["schema_version", "producer", "frame", "computed_at_utc", "channels"],
        "properties": {
            "schema_version": { "type": "string" },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "frame": { "type": "integer" },
            "computed_at_utc": { "type": "string" },
            "channels": {
                "type": "object",
                "additionalProperties": {
                    "type": "object",
                    "required": ["tap", "press", "hold"],
                    "properties": {
                        "tap": { "type": "boolean" },
                        "press": { "type": "boolean" },
                        "hold": { "type": "boolean" }
                    }
                }
            }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug, thiserror::Error)]
enum GesturesCliError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Gesture(#[from] GestureError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("No events found in input")]
    NoEvents,

    #[error("{0} events have schema or frame-order problems")]
    ValidationFailed(usize),

    #[error("Configuration check failed")]
    DoctorFailed,
}

impl GesturesCliError {
    fn code(&self) -> &'static str {
        match self {
            GesturesCliError::Io(_) => "IO_ERROR",
            GesturesCliError::Gesture(GestureError::UnknownChannel(_)) => "UNKNOWN_CHANNEL",
            GesturesCliError::Gesture(GestureError::OutOfOrderFrame { .. }) => {
                "OUT_OF_ORDER_FRAME"
            }
            GesturesCliError::Gesture(GestureError::IdleGapTooLarge { .. }) => "IDLE_GAP_TOO_LARGE",
            GesturesCliError::Gesture(GestureError::ConfigError(_)) => "CONFIG_ERROR",
            GesturesCliError::Gesture(_) => "PARSE_ERROR",
            GesturesCliError::Json(_) => "JSON_ERROR",
            GesturesCliError::NoEvents => "NO_EVENTS",
            GesturesCliError::ValidationFailed(_) => "VALIDATION_FAILED",
            GesturesCliError::DoctorFailed => "DOCTOR_FAILED",
        }
    }

    fn hint(&self) -> Option<&'static str> {
        let hint = match self {
            GesturesCliError::Io(_) => "Check file paths and permissions",
            GesturesCliError::Gesture(GestureError::UnknownChannel(_)) => {
                "Add the channel to the configuration or use unknown_channels: auto_register"
            }
            GesturesCliError::Gesture(GestureError::OutOfOrderFrame { .. }) => {
                "Run 'gestures validate' to list records out of frame order"
            }
            GesturesCliError::Gesture(GestureError::IdleGapTooLarge { .. }) => {
                "Raise max_idle_gap or turn emit_idle_frames off"
            }
            GesturesCliError::Gesture(GestureError::ConfigError(_)) => {
                "Run 'gestures doctor --config <file>' for details"
            }
            GesturesCliError::Gesture(_) | GesturesCliError::Json(_) => {
                "Run 'gestures schema input' for the expected record layout"
            }
            GesturesCliError::NoEvents => "Ensure input file is not empty",
            GesturesCliError::ValidationFailed(_) | GesturesCliError::DoctorFailed => {
                return None
            }
        };
        Some(hint)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: &'static str,
    message: String,
    hint: Option<&'static str>,
}

impl From<GesturesCliError> for CliError {
    fn from(e: GesturesCliError) -> Self {
        CliError {
            code: e.code(),
            message: e.to_string(),
            hint: e.hint(),
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct InputReport {
    events: usize,
    first_frame: Option<u64>,
    last_frame: Option<u64>,
    ticks: usize,
    channels: Vec<String>,
    schema_errors: Vec<EventProblem>,
    order_errors: Vec<EventProblem>,
}

#[derive(serde::Serialize)]
struct EventProblem {
    index: usize,
    frame: u64,
    problem: String,
}

#[derive(serde::Serialize)]
struct Finding {
    check: &'static str,
    status: Status,
    detail: String,
}

impl Finding {
    fn ok(check: &'static str, detail: String) -> Self {
        Self { check, status: Status::Ok, detail }
    }

    fn warning(check: &'static str, detail: String) -> Self {
        Self { check, status: Status::Warning, detail }
    }

    fn error(check: &'static str, detail: String) -> Self {
        Self { check, status: Status::Error, detail }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
enum Status {
    Ok,
    Warning,
    Error,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Warning => "warning",
            Status::Error => "error",
        }
    }
}
