use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

use condo_analytics::analytics::resale::{compute_resale_events, summarize_resales, ResaleEvent, ResaleSummary};
use condo_analytics::analytics::snapshot::ProjectSnapshot;
use condo_analytics::analytics::ssd::{SsdSchedule, SsdStatus};
use condo_analytics::analytics::types::Transaction;
use condo_analytics::analytics::valuation::{valuate, InsufficientData, Valuation};
use condo_analytics::config::AnalyticsConfig;
use condo_analytics::ingestion::parse_sales_csv;
use condo_analytics::registry::{AddressRecord, AddressRegistry, JsonAddressRegistry};

#[derive(Clone)]
struct AppState {
    /// Swapped wholesale on reload so in-flight requests keep a
    /// consistent view
    snapshot: Arc<RwLock<Arc<ProjectSnapshot>>>,
    config: Arc<AnalyticsConfig>,
    schedule: Arc<SsdSchedule>,
    registry: Arc<JsonAddressRegistry>,
    project_name: String,
    data_csv: PathBuf,
}

#[derive(Serialize)]
struct ApiResponse {
    message: String,
    status: String,
}

#[tokio::main]
async fn main() {
    println!("🏠 Starting condo analytics API server...");

    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = ServerConfig::from_env();

    println!("📦 Loading transaction data from {:?}...", config.data_csv);
    let outcome = parse_sales_csv(&config.data_csv).expect("Failed to parse sales CSV");
    if outcome.transactions.is_empty() {
        eprintln!("✗ No valid transactions in {:?}", config.data_csv);
        std::process::exit(1);
    }
    println!(
        "✅ Loaded {} transactions ({} rejected)",
        outcome.transactions.len(),
        outcome.rejected
    );

    let analytics = AnalyticsConfig::load(config.policy_path.as_deref())
        .expect("Failed to load analytics policy");
    let schedule = analytics
        .schedule()
        .expect("Configured SSD tier table is invalid");

    let registry = match JsonAddressRegistry::load(&config.registry_path) {
        Ok(reg) => reg,
        Err(e) => {
            println!("⚠️  Address registry unavailable ({e:#}), continuing without it");
            JsonAddressRegistry::default()
        }
    };

    let snapshot = ProjectSnapshot::build(outcome.transactions);
    let state = AppState {
        snapshot: Arc::new(RwLock::new(Arc::new(snapshot))),
        config: Arc::new(analytics),
        schedule: Arc::new(schedule),
        registry: Arc::new(registry),
        project_name: config.project_name,
        data_csv: config.data_csv,
    };

    let app = Router::new()
        .route("/", get(health_check))
        .route("/api/health", get(health_check))
        .route("/api/transactions", get(get_transactions))
        .route("/api/valuation/:block/:stack/:floor", get(get_valuation))
        .route("/api/ssd-scan", get(get_ssd_scan))
        .route("/api/resale-summary", get(get_resale_summary))
        .route("/api/reload", post(post_reload))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.api_port));
    println!("🚀 Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// Presentation-layer errors. "Cannot value this unit" is a structured
/// 422, never a 500 - callers must be able to tell it apart from
/// malformed requests and server faults.
enum ApiError {
    BadRequest(String),
    CannotValue(InsufficientData),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "bad_request", "message": msg })),
            )
                .into_response(),
            ApiError::CannotValue(detail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "error": "cannot_value",
                    "message": detail.to_string(),
                    "detail": detail,
                })),
            )
                .into_response(),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal", "message": msg })),
            )
                .into_response(),
        }
    }
}

async fn health_check() -> Json<ApiResponse> {
    Json(ApiResponse {
        message: "Condo analytics API is running!".to_string(),
        status: "ok".to_string(),
    })
}

async fn get_transactions(State(state): State<AppState>) -> Json<Vec<Transaction>> {
    let snapshot = state.snapshot.read().await.clone();
    Json(snapshot.transactions().to_vec())
}

#[derive(Serialize)]
struct ValuationResponse {
    #[serde(flatten)]
    valuation: Valuation,
    address: Option<AddressRecord>,
}

async fn get_valuation(
    State(state): State<AppState>,
    Path((block, stack, floor)): Path<(String, String, u32)>,
) -> Result<Json<ValuationResponse>, ApiError> {
    if floor < 1 {
        return Err(ApiError::BadRequest("floor must be 1 or higher".to_string()));
    }

    let snapshot = state.snapshot.read().await.clone();
    let as_of = Utc::now().date_naive();

    let valuation = valuate(
        &snapshot,
        &state.config,
        &state.schedule,
        &block,
        &stack,
        floor,
        as_of,
    )
    .map_err(ApiError::CannotValue)?;

    let address = state.registry.lookup(&state.project_name, &block).cloned();

    Ok(Json(ValuationResponse { valuation, address }))
}

#[derive(Serialize)]
struct SsdScanEntry {
    unit_label: String,
    block: String,
    stack: String,
    floor: u32,
    last_sale_date: chrono::NaiveDate,
    last_sale_price: f64,
    #[serde(flatten)]
    status: SsdStatus,
}

/// Portfolio-wide SSD scan over every unit's latest transaction,
/// most actionable first
async fn get_ssd_scan(State(state): State<AppState>) -> Json<Vec<SsdScanEntry>> {
    let snapshot = state.snapshot.read().await.clone();
    let as_of = Utc::now().date_naive();

    let mut entries: Vec<SsdScanEntry> = snapshot
        .latest_per_unit()
        .into_iter()
        .map(|(unit, tx)| SsdScanEntry {
            unit_label: unit.label(),
            block: unit.block.clone(),
            stack: unit.stack.clone(),
            floor: unit.floor,
            last_sale_date: tx.sale_date,
            last_sale_price: tx.price,
            status: state.schedule.status(tx.sale_date, as_of),
        })
        .collect();

    entries.sort_by(|a, b| {
        a.status
            .urgency
            .rank()
            .cmp(&b.status.urgency.rank())
            .then_with(|| {
                a.status
                    .months_to_next_tier
                    .unwrap_or(u32::MAX)
                    .cmp(&b.status.months_to_next_tier.unwrap_or(u32::MAX))
            })
            .then_with(|| a.unit_label.cmp(&b.unit_label))
    });

    Json(entries)
}

#[derive(Serialize)]
struct ResaleResponse {
    summary: ResaleSummary,
    events: Vec<ResaleEvent>,
}

async fn get_resale_summary(State(state): State<AppState>) -> Json<ResaleResponse> {
    let snapshot = state.snapshot.read().await.clone();
    let events = compute_resale_events(&snapshot);
    let summary = summarize_resales(&events);
    Json(ResaleResponse { summary, events })
}

#[derive(Serialize)]
struct ReloadResponse {
    transactions: usize,
    rejected: usize,
}

/// Re-parse the CSV and swap the snapshot atomically; readers that
/// already hold the old Arc keep their consistent view
async fn post_reload(State(state): State<AppState>) -> Result<Json<ReloadResponse>, ApiError> {
    let outcome = parse_sales_csv(&state.data_csv)
        .map_err(|e| ApiError::Internal(format!("reload failed: {e:#}")))?;

    if outcome.transactions.is_empty() {
        return Err(ApiError::Internal(
            "reload produced no valid transactions, keeping previous snapshot".to_string(),
        ));
    }

    let transactions = outcome.transactions.len();
    let fresh = Arc::new(ProjectSnapshot::build(outcome.transactions));
    *state.snapshot.write().await = fresh;

    Ok(Json(ReloadResponse {
        transactions,
        rejected: outcome.rejected,
    }))
}

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
struct ServerConfig {
    data_csv: PathBuf,
    registry_path: PathBuf,
    policy_path: Option<PathBuf>,
    project_name: String,
    api_port: u16,
}

impl ServerConfig {
    fn from_env() -> Self {
        ServerConfig {
            data_csv: std::env::var("DATA_CSV")
                .unwrap_or_else(|_| "data/transactions.csv".to_string())
                .into(),

            registry_path: std::env::var("REGISTRY_PATH")
                .unwrap_or_else(|_| "data/address_registry.json".to_string())
                .into(),

            policy_path: std::env::var("POLICY_PATH").ok().map(PathBuf::from),

            project_name: std::env::var("PROJECT_NAME")
                .unwrap_or_else(|_| "Emerald Court".to_string()),

            api_port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3001),
        }
    }
}
