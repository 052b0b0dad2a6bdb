// LeadGen Maps CLI - AI-assisted lead generation from the terminal

mod exit_codes;
mod tui;
mod util;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};

use leadgen_cli::Controller;
use leadgen_config::{ai, AIDiagnostics, ResolvedAIConfig, Settings};
use leadgen_core::{Coordinates, Lead, RawLead, RequestError, Source, CURRENT_LOCATION_LABEL};
use leadgen_gemini::{AiError, AiErrorKind, GeminiGateway, LeadGateway};
use leadgen_io::ExportError;

use exit_codes::{
    ai_exit_code, export_exit_code, EXIT_AI_KEYCHAIN_ERR, EXIT_AI_MISSING_KEY, EXIT_ERROR, EXIT_SUCCESS,
    EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "leadgen")]
#[command(about = "Find sales leads with Gemini and Google Maps grounding")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Override the API endpoint from settings
    #[arg(long, env = "LEADGEN_ENDPOINT", global = true, hide_env_values = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest a targeting strategy for a business problem
    #[command(after_help = "\
Examples:
  leadgen strategy 'We sell eco-friendly cleaning supplies to offices'
  leadgen strategy 'Booking software for yoga studios' --json")]
    Strategy {
        /// What you sell and to whom
        problem: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate leads for a business type and location
    #[command(after_help = "\
Examples:
  leadgen generate --business-type 'Boutique Hotels' --location 'Kyoto, Japan'
  leadgen generate -b 'Dental Clinics' -l 'Austin, TX' -n 25 -r 'offers online booking' --export
  leadgen generate -b Cafes --here --format csv > cafes.csv")]
    Generate {
        /// Kind of business to look for
        #[arg(long, short = 'b')]
        business_type: String,

        /// City, region or address
        #[arg(long, short = 'l', required_unless_present_any = ["here", "lat"])]
        location: Option<String>,

        /// Number of leads, 1-50 (out-of-range values are clamped)
        #[arg(long, short = 'n', default_value_t = leadgen_core::DEFAULT_LEAD_COUNT)]
        count: u32,

        /// Extra requirement the leads should meet
        #[arg(long, short = 'r')]
        requirements: Option<String>,

        /// Latitude to bias the search towards
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude to bias the search towards
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Use the home position from settings as the current location
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        here: bool,

        /// Write leads to a file (leads.csv when no path is given; .json writes JSON)
        #[arg(long, num_args = 0..=1, default_missing_value = leadgen_io::CSV_FILE_NAME)]
        export: Option<PathBuf>,

        /// Output format for stdout
        #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Check whether a business's website shows it meets a requirement
    Verify {
        /// Business name
        #[arg(long)]
        name: String,

        /// Website (a bare host gets https://)
        #[arg(long)]
        website: String,

        /// Requirement to check
        #[arg(long)]
        requirement: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive terminal app
    App,

    /// AI configuration and credentials
    Ai {
        #[command(subcommand)]
        command: AiCommands,
    },
}

#[derive(Subcommand)]
enum AiCommands {
    /// Show the effective AI configuration
    Doctor {
        /// Output as JSON for machine parsing
        #[arg(long)]
        json: bool,
    },
    /// Store the Gemini API key in the system keychain
    SetKey {
        /// Key to store; read from stdin when omitted
        key: Option<String>,
    },
    /// Remove the stored API key from the keychain
    ClearKey,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("LEADGEN_COMMIT"), ")",
        "\nbuild:   ", env!("LEADGEN_PROFILE"),
        "\ntarget:  ", env!("LEADGEN_TARGET"),
        "\nmodel:   ", "gemini-2.5-flash (default)",
    )
}

fn init_logging(verbose: u8, interactive: bool) {
    let default = match (verbose, interactive) {
        (0, true) => "off",
        (0, false) => "warn",
        (1, _) => "info",
        _ => "debug",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, matches!(cli.command, Commands::App));
    let endpoint = cli.endpoint;

    let result = match cli.command {
        Commands::Strategy { problem, json } => cmd_strategy(endpoint, &problem, json),
        Commands::Generate {
            business_type,
            location,
            count,
            requirements,
            lat,
            lon,
            here,
            export,
            format,
        } => {
            let position = match (lat, lon) {
                (Some(lat), Some(lon)) => Position::Explicit(lat, lon),
                _ if here => Position::Home,
                _ => Position::None,
            };
            cmd_generate(
                endpoint,
                GenerateArgs {
                    business_type,
                    location: location.unwrap_or_default(),
                    count,
                    requirements,
                    position,
                    export,
                    format,
                },
            )
        }
        Commands::Verify {
            name,
            website,
            requirement,
            json,
        } => cmd_verify(endpoint, &name, &website, &requirement, json),
        Commands::App => cmd_app(endpoint),
        Commands::Ai { command } => match command {
            AiCommands::Doctor { json } => cmd_ai_doctor(endpoint, json),
            AiCommands::SetKey { key } => cmd_ai_set_key(key),
            AiCommands::ClearKey => cmd_ai_clear_key(),
        },
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Gateway failure with the matching exit code.
    pub fn ai(err: &AiError) -> Self {
        let hint = match &err.kind {
            AiErrorKind::MissingKey => Some("run `leadgen ai set-key` or set LEADGEN_GEMINI_KEY".to_string()),
            AiErrorKind::Network(_) => Some("check your network connection and the endpoint in settings".to_string()),
            AiErrorKind::Api { status: 400 | 401 | 403, .. } => {
                Some("check the API key with `leadgen ai doctor`".to_string())
            }
            AiErrorKind::Api { status: 429, .. } => Some("quota exhausted; retry later".to_string()),
            _ => None,
        };
        Self { code: ai_exit_code(err), message: err.to_string(), hint }
    }

    pub fn export(err: &ExportError) -> Self {
        Self { code: export_exit_code(err), message: err.to_string(), hint: None }
    }

    pub fn request(err: RequestError) -> Self {
        Self::usage(err.to_string())
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn write_out(text: &str) -> Result<(), CliError> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", text).map_err(|e| CliError::general(format!("failed to write output: {}", e)))
}

// ============================================================================
// Gateway
// ============================================================================

/// Resolve the AI configuration. A missing key is fatal before any call.
fn resolve_ai(settings: &Settings, endpoint: Option<String>) -> ResolvedAIConfig {
    let config = ResolvedAIConfig::from_settings(&settings.ai);
    match endpoint {
        Some(e) if !e.trim().is_empty() => config.with_endpoint(e.trim()),
        _ => config,
    }
}

fn build_gateway(settings: &Settings, endpoint: Option<String>) -> Result<GeminiGateway, CliError> {
    let config = resolve_ai(settings, endpoint);
    if !config.status.is_ready() {
        return Err(CliError {
            code: EXIT_AI_MISSING_KEY,
            message: config
                .blocking_reason
                .clone()
                .unwrap_or_else(|| "AI is not configured".to_string()),
            hint: Some("run `leadgen ai doctor` to inspect the configuration".to_string()),
        });
    }
    log::debug!("using model {} at {}", config.model, config.endpoint);
    GeminiGateway::new(&config).map_err(|kind| CliError::general(format!("failed to create AI client: {}", kind)))
}

// ============================================================================
// strategy
// ============================================================================

fn cmd_strategy(endpoint: Option<String>, problem: &str, json: bool) -> Result<(), CliError> {
    if problem.trim().is_empty() {
        return Err(CliError::usage("problem description is empty")
            .with_hint("describe what you sell and to whom"));
    }
    let settings = Settings::load();
    let gateway = build_gateway(&settings, endpoint)?;
    let mut controller = Controller::new(&settings.form);

    let (ticket, problem) = controller.begin_strategy(problem).map_err(CliError::usage)?;
    let result = gateway.request_strategy(&problem);
    if let Err(e) = &result {
        return Err(CliError::ai(e));
    }
    controller.finish_strategy(ticket, result);
    let Some(strategy) = controller.strategy_state().value() else {
        return Err(CliError::general("strategy request did not complete"));
    };

    if json {
        let text = serde_json::to_string_pretty(strategy).map_err(|e| CliError::general(e.to_string()))?;
        return write_out(&text);
    }

    let mut text = format!("Business type:  {}\nLocations:\n", strategy.business_type);
    for loc in &strategy.locations {
        text.push_str(&format!("  - {}\n", loc));
    }
    if !strategy.requirements.is_empty() {
        text.push_str(&format!("Requirements:   {}\n", strategy.requirements));
    }
    let prefill = strategy.to_prefill();
    text.push_str(&format!(
        "\nNext:\n  leadgen generate -b {:?} -l {:?}{}",
        prefill.business_type,
        prefill.location,
        if prefill.requirements.is_empty() {
            String::new()
        } else {
            format!(" -r {:?}", prefill.requirements)
        }
    ));
    write_out(&text)
}

// ============================================================================
// generate
// ============================================================================

enum Position {
    None,
    Explicit(f64, f64),
    Home,
}

struct GenerateArgs {
    business_type: String,
    location: String,
    count: u32,
    requirements: Option<String>,
    position: Position,
    export: Option<PathBuf>,
    format: OutputFormat,
}

fn cmd_generate(endpoint: Option<String>, args: GenerateArgs) -> Result<(), CliError> {
    let settings = Settings::load();
    let mut controller = Controller::new(&settings.form);

    {
        let form = controller.form_mut();
        form.business_type = args.business_type;
        form.set_location(args.location);
        form.set_count(args.count);
        form.requirements = args.requirements.unwrap_or_default();
    }
    if args.count != controller.form().count {
        log::warn!("count {} out of range, using {}", args.count, controller.form().count);
    }

    match args.position {
        Position::None => {}
        Position::Explicit(lat, lon) => {
            let coordinates = Coordinates::new(lat, lon).map_err(|e| CliError::usage(e.to_string()))?;
            if controller.form().location.trim().is_empty() {
                controller.use_current_location(Ok(coordinates));
            } else {
                controller.form_mut().coordinates = Some(coordinates);
            }
        }
        Position::Home => {
            let manual = controller.form().location.clone();
            let position = settings
                .form
                .home()
                .ok_or_else(|| "Location is not configured".to_string())
                .and_then(|(lat, lon)| Coordinates::new(lat, lon).map_err(|e| e.to_string()));
            controller.use_current_location(position);
            if let Some(notice) = controller.notice() {
                eprintln!("warning: {}", notice);
                controller.form_mut().set_location(manual);
            }
        }
    }

    let gateway = build_gateway(&settings, endpoint)?;
    let outcome = controller.run_leads(&gateway).map(|r| r.map(<[Lead]>::len));
    let leads = match outcome {
        Err(e) => {
            let err = CliError::request(e);
            return Err(if controller.form().location.is_empty() {
                err.with_hint("pass --location, or set form.home_latitude/home_longitude for --here")
            } else {
                err
            });
        }
        Ok(Err(e)) => return Err(CliError::ai(&e)),
        Ok(Ok(n)) => n,
    };
    log::info!("{} leads for {:?}", leads, controller.form().business_type);

    match args.format {
        OutputFormat::Table => write_out(&render_leads(&controller))?,
        OutputFormat::Json => {
            let body = serde_json::json!({
                "leads": controller.leads(),
                "sources": controller.sources(),
            });
            let text = serde_json::to_string_pretty(&body).map_err(|e| CliError::general(e.to_string()))?;
            write_out(&text)?;
        }
        OutputFormat::Csv => match leadgen_io::to_csv(controller.leads()) {
            Ok(text) => write_out(&text)?,
            Err(ExportError::NothingToExport) => eprintln!("{}", controller.results_header()),
            Err(e) => return Err(CliError::export(&e)),
        },
    }

    if let Some(path) = args.export {
        export_leads(&mut controller, &path)?;
    }
    Ok(())
}

fn export_leads(controller: &mut Controller, path: &Path) -> Result<(), CliError> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        leadgen_io::json::export(controller.leads(), path).map_err(|e| CliError::export(&e))?;
        eprintln!("Exported {} leads to {}", controller.leads().len(), path.display());
        return Ok(());
    }
    controller.export_csv(path).map_err(|e| CliError::export(&e))?;
    if let Some(notice) = controller.notice() {
        eprintln!("{}", notice);
    }
    Ok(())
}

fn render_leads(controller: &Controller) -> String {
    let mut out = controller.results_header();
    let form = controller.form();
    let place = if form.location == CURRENT_LOCATION_LABEL {
        form.coordinates.map(|c| c.to_string()).unwrap_or_default()
    } else {
        form.location.clone()
    };
    out.push_str(&format!(" ({} in {})\n\n", form.business_type, place));

    if !controller.leads().is_empty() {
        let rows: Vec<Vec<String>> = controller.leads().iter().map(lead_row).collect();
        out.push_str(&util::render_table(
            &["#", "Name", "Category", "Rating", "Phone", "Website", "Status"],
            &rows,
            32,
        ));
        out.push('\n');
    }

    let sources = controller.sources();
    if !sources.is_empty() {
        out.push_str("\nSources:\n");
        out.push_str(&render_sources(sources));
    }
    out.trim_end().to_string()
}

fn lead_row(lead: &Lead) -> Vec<String> {
    let dash = || "-".to_string();
    vec![
        lead.id.to_string(),
        lead.name.clone(),
        lead.category.clone().unwrap_or_else(dash),
        lead.rating_label().unwrap_or_else(dash),
        lead.phone.clone().unwrap_or_else(dash),
        lead.website_url().unwrap_or_else(dash),
        lead.status.to_string(),
    ]
}

fn render_sources(sources: &[Source]) -> String {
    sources
        .iter()
        .map(|s| {
            if s.title == s.uri {
                format!("  - {}\n", s.uri)
            } else {
                format!("  - {} <{}>\n", s.title, s.uri)
            }
        })
        .collect()
}

// ============================================================================
// verify
// ============================================================================

fn cmd_verify(
    endpoint: Option<String>,
    name: &str,
    website: &str,
    requirement: &str,
    json: bool,
) -> Result<(), CliError> {
    if requirement.trim().is_empty() || website.trim().is_empty() {
        return Err(CliError::usage("verification needs both a requirement and a website"));
    }
    let lead = Lead::from_raw(
        0,
        RawLead {
            name: name.trim().to_string(),
            website: Some(website.trim().to_string()),
            ..Default::default()
        },
    );
    let website_url = lead
        .website_url()
        .ok_or_else(|| CliError::usage("website is empty"))?;

    let settings = Settings::load();
    let gateway = build_gateway(&settings, endpoint)?;
    let result = gateway
        .verify_requirement(&lead.name, &website_url, requirement.trim())
        .map_err(|e| CliError::ai(&e))?;

    if json {
        let text = serde_json::to_string_pretty(&result).map_err(|e| CliError::general(e.to_string()))?;
        return write_out(&text);
    }

    let mark = if result.meets_requirement { "✓" } else { "✗" };
    let mut text = format!("{} {}: {}\n", mark, result.verdict(), name);
    text.push_str(&format!("  requirement: {}\n  website:     {}\n", requirement.trim(), website_url));
    for line in util::wrap_words(&result.justification, 76) {
        text.push_str(&format!("  {}\n", line));
    }
    if let Some(url) = &result.application_url {
        text.push_str(&format!("  Contact / apply: {}\n", url));
    }
    write_out(text.trim_end())
}

// ============================================================================
// app
// ============================================================================

fn cmd_app(endpoint: Option<String>) -> Result<(), CliError> {
    let settings = Settings::load();
    let gateway = build_gateway(&settings, endpoint)?;
    tui::run(Arc::new(gateway), &settings.form).map_err(CliError::general)
}

// ============================================================================
// ai
// ============================================================================

fn cmd_ai_doctor(endpoint: Option<String>, json: bool) -> Result<(), CliError> {
    let settings = Settings::load();
    let config = resolve_ai(&settings, endpoint);
    let diag = AIDiagnostics::from_resolved(&config);

    if json {
        let text = serde_json::to_string_pretty(&diag.to_json()).map_err(|e| CliError::general(e.to_string()))?;
        write_out(&text)?;
    } else {
        write_out(diag.to_string().trim_end())?;
    }

    if config.status.is_ready() {
        Ok(())
    } else {
        // details already printed
        let mut err = CliError {
            code: EXIT_AI_MISSING_KEY,
            message: String::new(),
            hint: None,
        };
        if !json {
            err = err.with_hint(config.blocking_reason.unwrap_or_default());
        }
        Err(err)
    }
}

fn cmd_ai_set_key(key: Option<String>) -> Result<(), CliError> {
    let key = match key {
        Some(k) => k,
        None => {
            let mut line = String::new();
            io::stdin()
                .lock()
                .read_line(&mut line)
                .map_err(|e| CliError::general(format!("failed to read key from stdin: {}", e)))?;
            line
        }
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::usage("API key is empty"));
    }
    ai::set_api_key(key).map_err(|e| CliError {
        code: EXIT_AI_KEYCHAIN_ERR,
        message: e,
        hint: Some("set LEADGEN_GEMINI_KEY instead".to_string()),
    })?;
    eprintln!("API key stored in keychain");
    Ok(())
}

fn cmd_ai_clear_key() -> Result<(), CliError> {
    ai::delete_api_key().map_err(|e| CliError {
        code: EXIT_AI_KEYCHAIN_ERR,
        message: e,
        hint: None,
    })?;
    eprintln!("API key removed from keychain");
    Ok(())
}
