use audit_ai::analysis::{
    annotate_violations, AnalysisGateway, GeminiClient, OfflineAnalyst, SharedAnalyst,
    STATIC_PLACEHOLDER,
};
use audit_ai::audit::report::DEFAULT_REPORT_FILENAME;
use audit_ai::audit::{
    loader, scan_records, AuditReport, LogRecord, ScanOutcome, ScanSummary, UserViolationEntry,
    Violation,
};
use audit_ai::config::{AccessConfig, AppConfig};
use audit_ai::error::AppError;
use audit_ai::session::AuditSession;
use audit_ai::telemetry;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
    access: AccessConfig,
    analyst: SharedAnalyst,
    session: Arc<Mutex<AuditSession>>,
}

#[derive(Parser, Debug)]
#[command(
    name = "audit-ai",
    about = "Run rule-based compliance audits over activity logs with AI-assisted findings",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Scan a log file and print the executive dashboard
    Scan(ScanArgs),
    /// Ask the auditor a question, optionally scanning a log file for context
    Ask(AskArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Log file to audit (.json array, .csv, or .xlsx)
    #[arg(long)]
    input: PathBuf,
    /// Where to write the report document
    #[arg(long, default_value = DEFAULT_REPORT_FILENAME)]
    report: PathBuf,
    /// Scan date stamped on the report (defaults to today)
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,
    /// Send findings to the analysis backend instead of stubbing them out
    #[arg(long)]
    analyze: bool,
}

#[derive(Args, Debug)]
struct AskArgs {
    /// Question for the auditor
    #[arg(long)]
    question: String,
    /// Optional log file scanned first to build the audit context
    #[arg(long)]
    input: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct ScanRequest {
    access_key: String,
    /// Inline JSON array of log objects.
    #[serde(default)]
    logs: Option<serde_json::Value>,
    /// Inline CSV text, as exported from a spreadsheet.
    #[serde(default)]
    csv: Option<String>,
    #[serde(default)]
    include_findings: bool,
    /// Run the analysis backend over the findings; off by default so a scan
    /// never reaches out to the LLM unless the caller asks for it.
    #[serde(default)]
    analyze: bool,
}

#[derive(Debug, Serialize)]
struct ScanResponse {
    scan_date: NaiveDate,
    compliance_score: usize,
    total_events: usize,
    total_violations: usize,
    top_users: Vec<UserViolationEntry>,
    violations: Vec<Violation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    findings: Option<Vec<FindingView>>,
}

#[derive(Debug, Serialize)]
struct FindingView {
    title: String,
    analysis: String,
}

#[derive(Debug, Deserialize)]
struct AskRequest {
    access_key: String,
    question: String,
}

#[derive(Debug, Serialize)]
struct AskResponse {
    answer: String,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Scan(args) => run_scan(args).await,
        Command::Ask(args) => run_ask(args).await,
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn build_analyst(config: &AppConfig) -> Result<SharedAnalyst, AppError> {
    if config.analysis.api_key.is_some() {
        let client = GeminiClient::from_config(&config.analysis)?;
        info!(model = %config.analysis.model, "using generative analysis backend");
        Ok(Arc::new(client))
    } else {
        info!("no analysis API key configured, using offline analyst");
        Ok(Arc::new(OfflineAnalyst::new()))
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let analyst = build_analyst(&config)?;
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
        access: config.access.clone(),
        analyst,
        session: Arc::new(Mutex::new(AuditSession::new())),
    };

    let app = app_router().layer(prometheus_layer).with_state(state);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "compliance auditor ready");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_scan(args: ScanArgs) -> Result<(), AppError> {
    let ScanArgs {
        input,
        report,
        today,
        analyze,
    } = args;

    let config = AppConfig::load()?;
    let analyst = build_analyst(&config)?;
    let scan_date = today.unwrap_or_else(|| Local::now().date_naive());

    let records = loader::load_path(&input)?;
    let outcome = scan_records(&records);
    let analyses = if analyze {
        annotate_violations(analyst.as_ref(), &outcome.violations).await
    } else {
        placeholder_analyses(outcome.violations.len())
    };
    let audit_report = AuditReport::from_scan(&outcome, analyses, scan_date);

    render_dashboard(&outcome, &audit_report);

    audit_report.write_to(&report)?;
    println!("\nReport written to {}", report.display());

    Ok(())
}

async fn run_ask(args: AskArgs) -> Result<(), AppError> {
    let AskArgs { question, input } = args;

    let config = AppConfig::load()?;
    let analyst = build_analyst(&config)?;
    let mut session = AuditSession::new();

    if let Some(path) = input {
        let records = loader::load_path(&path)?;
        session.record_scan(&scan_records(&records));
    }

    let answer = session.ask(analyst.as_ref(), &question).await;
    println!("{answer}");

    Ok(())
}

fn app_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/audit/scan", post(scan_endpoint))
        .route("/api/v1/audit/ask", post(ask_endpoint))
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

async fn scan_endpoint(
    State(state): State<AppState>,
    Json(payload): Json<ScanRequest>,
) -> Result<Json<ScanResponse>, AppError> {
    if !state.access.verify(&payload.access_key) {
        return Err(AppError::AccessDenied);
    }

    let records = records_from_request(payload.logs, payload.csv)?;
    let outcome = scan_records(&records);

    state.session.lock().await.record_scan(&outcome);

    let response = scan_response_from(
        outcome,
        state.analyst.as_ref(),
        payload.include_findings,
        payload.analyze,
        Local::now().date_naive(),
    )
    .await;

    Ok(Json(response))
}

async fn ask_endpoint(
    State(state): State<AppState>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    if !state.access.verify(&payload.access_key) {
        return Err(AppError::AccessDenied);
    }

    let mut session = state.session.lock().await;
    let answer = session.ask(state.analyst.as_ref(), &payload.question).await;

    Ok(Json(AskResponse { answer }))
}

fn records_from_request(
    logs: Option<serde_json::Value>,
    csv: Option<String>,
) -> Result<Vec<LogRecord>, AppError> {
    let records = match (logs, csv) {
        (Some(value), _) => loader::records_from_json_array(value)?,
        (None, Some(csv)) => loader::parse_csv(Cursor::new(csv.into_bytes()))?,
        (None, None) => return Err(loader::LoaderError::MissingPayload.into()),
    };
    Ok(records)
}

fn placeholder_analyses(count: usize) -> Vec<String> {
    vec![STATIC_PLACEHOLDER.to_string(); count]
}

async fn scan_response_from(
    outcome: ScanOutcome,
    analyst: &dyn AnalysisGateway,
    include_findings: bool,
    analyze: bool,
    scan_date: NaiveDate,
) -> ScanResponse {
    let summary = ScanSummary::from_outcome(&outcome);

    let findings = if include_findings {
        let analyses = if analyze {
            annotate_violations(analyst, &outcome.violations).await
        } else {
            placeholder_analyses(outcome.violations.len())
        };
        Some(
            outcome
                .violations
                .iter()
                .zip(analyses)
                .map(|(violation, analysis)| FindingView {
                    title: violation.message.clone(),
                    analysis,
                })
                .collect(),
        )
    } else {
        None
    };

    ScanResponse {
        scan_date,
        compliance_score: summary.compliance_score,
        total_events: summary.total_events,
        total_violations: summary.total_violations,
        top_users: summary.top_users,
        violations: outcome.violations,
        findings,
    }
}

fn render_dashboard(outcome: &ScanOutcome, report: &AuditReport) {
    let summary = ScanSummary::from_outcome(outcome);

    println!("Executive Dashboard");
    println!(
        "Compliance Score: {}% (-{}%)",
        summary.compliance_score,
        summary.total_violations * 10
    );
    println!("Total Events Scanned: {}", summary.total_events);
    println!("Critical Violations: {}", summary.total_violations);

    if summary.top_users.is_empty() {
        println!("\nTop Risky Users: none");
    } else {
        println!("\nTop Risky Users");
        for entry in &summary.top_users {
            println!("- {}: {} violation(s)", entry.user, entry.violations);
        }
    }

    if report.sections.is_empty() {
        println!("\nDetailed Findings: none");
    } else {
        println!("\nDetailed Findings");
        for section in &report.sections {
            println!("- {}", section.title);
            for line in section.analysis.lines() {
                println!("    {line}");
            }
        }
    }
}
