use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use leadflow::config::AppConfig;
use leadflow::error::AppError;
use leadflow::telemetry;
use leadflow::workflows::distribution::{
    distribution_router, DistributionRuleSet, DistributionService, EligibilityThresholds,
    InMemoryMemberDirectory,
};
use leadflow::workflows::leads::{
    lead_router, InMemoryLeadRepository, LeadIntakeService, StandardIntakeConfig, UploadReport,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "leadflow",
    about = "Run the lead intake, classification, and distribution service from the command line",
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
    /// Import a lead spreadsheet offline and print the batch report
    Import(ImportArgs),
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
struct ImportArgs {
    /// Spreadsheet to ingest (.csv, .xlsx, or .xls)
    file: PathBuf,
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
        Command::Import(args) => run_import(args),
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let lead_service = Arc::new(LeadIntakeService::new(
        Arc::new(InMemoryLeadRepository::new()),
        Arc::new(StandardIntakeConfig),
    ));
    let distribution_service = Arc::new(DistributionService::new(
        Arc::new(InMemoryMemberDirectory::demo_at(Local::now().date_naive())),
        EligibilityThresholds::standard(),
        DistributionRuleSet::standard(),
    ));

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(lead_router(lead_service, config.upload.max_upload_bytes))
        .merge(distribution_router(distribution_service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "lead intake service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let file_name = args
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.csv".to_string());
    let bytes = std::fs::read(&args.file)?;

    let service = LeadIntakeService::new(
        Arc::new(InMemoryLeadRepository::new()),
        Arc::new(StandardIntakeConfig),
    );
    let report = service.upload(&file_name, &bytes)?;
    render_upload_report(&file_name, &report);

    Ok(())
}

fn render_upload_report(file_name: &str, report: &UploadReport) {
    println!("Lead import report for {file_name}");
    println!("Batch: {}", report.batch_id);
    println!(
        "Rows: {} total, {} imported, {} duplicates, {} errors",
        report.total_count, report.success_count, report.duplicate_count, report.error_count
    );

    if !report.grade_summary.is_empty() {
        println!("\nGrade summary");
        for (grade, count) in &report.grade_summary {
            println!("- {grade}: {count}");
        }
    }

    if !report.duplicates.is_empty() {
        println!("\nDuplicates");
        for duplicate in &report.duplicates {
            println!("- row {}: {}", duplicate.row, duplicate.phone);
        }
    }

    if !report.errors.is_empty() {
        println!("\nRow errors");
        for issue in &report.errors {
            println!("- row {}: {}", issue.row, issue.message);
        }
    }

    if !report.warnings.is_empty() {
        println!("\nWarnings");
        for issue in &report.warnings {
            println!("- row {}: {}", issue.row, issue.message);
        }
    }

    if !report.unmapped_columns.is_empty() {
        println!(
            "\nUnmapped columns: {}",
            report.unmapped_columns.join(", ")
        );
    }
    if !report.missing_columns.is_empty() {
        println!(
            "Configured columns missing from file: {}",
            report.missing_columns.join(", ")
        );
    }
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
