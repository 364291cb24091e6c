// In crates/web-server/src/lib.rs

use analytics::{AssetSummary, BenchmarkRequest, DashboardSession, FilterOptions, PerformanceView};
use api_client::{AssetQuery, BenchmarkFeed, TradeRecordSource, UploadSummary};
use app_config::types::ServerSettings;
use axum::{
    Router,
    extract::{
        DefaultBodyLimit, Multipart, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Json},
    routing::{get, post, put},
};
use core_types::TradeRecord;
use events::{WsMessage, WsRecordsRefreshed, WsUploadCompleted};
use futures::{sink::SinkExt, stream::StreamExt}; // for websocket send/receive
use risk::{ReferencePosition, StressSettings};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::{Mutex as AsyncMutex, RwLock, broadcast};
use tokio::task::JoinHandle;
use types::{RefreshResponse, SelectionUpdate, StressParams, StressResponse};

pub mod error;
pub mod types;

// Re-export our custom error type for convenience.
pub use error::{Error, Result};

/// WebSocket message replay cache type
pub type WsCache = Arc<Mutex<VecDeque<WsMessage>>>;

/// The maximum number of messages to keep in the replay cache.
pub const WS_CACHE_SIZE: usize = 200;

/// Largest spreadsheet accepted by the upload proxy.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Appends `msg` to the replay cache, evicting the oldest entry when full.
pub fn push_cached(cache: &WsCache, msg: WsMessage) {
    let mut cache = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if cache.len() >= WS_CACHE_SIZE {
        cache.pop_front();
    }
    cache.push_back(msg);
}

/// The shared application state that is available to all API handlers.
#[derive(Clone)]
pub struct AppState {
    /// The dashboard's record snapshot, selection and derived series.
    pub session: Arc<RwLock<DashboardSession>>,
    pub records: Arc<dyn TradeRecordSource>,
    pub benchmark: Arc<dyn BenchmarkFeed>,
    pub ws_tx: broadcast::Sender<WsMessage>, // For broadcasting live messages
    pub ws_cache: WsCache,                   // For replaying recent messages
    /// Held across fetch and install so overlapping refreshes land in call order.
    refresh_lock: Arc<AsyncMutex<()>>,
}

impl AppState {
    /// Builds the state around an empty snapshot; call [`refresh_snapshot`] to load records.
    pub fn new(
        records: Arc<dyn TradeRecordSource>,
        benchmark: Arc<dyn BenchmarkFeed>,
        stress_settings: StressSettings,
        ws_tx: broadcast::Sender<WsMessage>,
        ws_cache: WsCache,
    ) -> Self {
        let session = DashboardSession::new(Vec::<TradeRecord>::new().into(), stress_settings);
        Self {
            session: Arc::new(RwLock::new(session)),
            records,
            benchmark,
            ws_tx,
            ws_cache,
            refresh_lock: Arc::new(AsyncMutex::new(())),
        }
    }

    /// Sends `msg` to live clients and keeps it for replay.
    pub fn publish(&self, msg: WsMessage) {
        push_cached(&self.ws_cache, msg.clone());
        // No subscribers is not an error.
        let _ = self.ws_tx.send(msg);
    }
}

/// Creates the main application router with all routes and middleware.
pub fn create_router(app_state: AppState) -> Router {
    // The dashboard is served from a different origin during development.
    let cors = tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let api_router = Router::new()
        .route("/assets", get(get_assets_handler))
        .route("/assets/refresh", post(refresh_handler))
        .route(
            "/assets/upload",
            post(upload_handler).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/summary", get(get_summary_handler))
        .route("/filters", get(get_filters_handler))
        .route("/selection/bank", put(select_bank_handler))
        .route("/selection/portfolio", put(select_portfolio_handler))
        .route("/selection/asset", put(select_asset_handler))
        .route("/performance", get(get_performance_handler))
        .route("/stress", get(get_stress_handler));

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_check_handler))
        .nest("/api", api_router)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Reloads every record from the source into the session.
///
/// The selection is kept, so an open chart is redrawn from the new data and
/// its benchmark fetched again.
pub async fn refresh_snapshot(state: &AppState) -> Result<RefreshResponse> {
    let _refresh = state.refresh_lock.lock().await;
    let records = state.records.fetch_records(&AssetQuery::default()).await?;
    let record_count = records.len();

    let (generation, view, request) = {
        let mut session = state.session.write().await;
        let generation = session.replace_records(records.into());
        (generation, session.performance_view(), session.benchmark_request())
    };
    tracing::info!(generation, record_count, "Record snapshot refreshed.");

    state.publish(WsMessage::RecordsRefreshed(WsRecordsRefreshed { generation, record_count }));
    state.publish(WsMessage::PerformanceUpdated(view));
    schedule_benchmark(state, request);

    Ok(RefreshResponse { generation, record_count })
}

/// Fetches the benchmark for `request` in the background.
///
/// The result is applied only if the session is still at the request's
/// generation; otherwise it is dropped and nothing is broadcast.
pub fn schedule_benchmark(state: &AppState, request: Option<BenchmarkRequest>) -> Option<JoinHandle<()>> {
    let request = request?;
    let state = state.clone();

    Some(tokio::spawn(async move {
        tracing::debug!(
            generation = request.generation,
            ticker = %request.ticker,
            feed = state.benchmark.name(),
            "Requesting benchmark series."
        );
        let result = state.benchmark.monthly_prices(&request.ticker).await;

        let view = {
            let mut session = state.session.write().await;
            if !session.apply_benchmark(request.generation, result) {
                return;
            }
            session.performance_view()
        };
        state.publish(WsMessage::PerformanceUpdated(view));
    }))
}

/// Applies a selection change, then kicks off the benchmark fetch for it.
async fn update_selection<F>(state: &AppState, mutate: F) -> Json<FilterOptions>
where
    F: FnOnce(&mut DashboardSession) -> u64,
{
    let (options, view, request) = {
        let mut session = state.session.write().await;
        let generation = mutate(&mut session);
        tracing::debug!(generation, selection = ?session.selection(), "Selection changed.");
        (session.filter_options(), session.performance_view(), session.benchmark_request())
    };
    state.publish(WsMessage::PerformanceUpdated(view));
    schedule_benchmark(state, request);
    Json(options)
}

async fn health_check_handler() -> &'static str {
    "OK"
}

/// Handler for `GET /api/assets`. Passes the filters through to the asset API.
async fn get_assets_handler(
    State(state): State<AppState>,
    Query(query): Query<AssetQuery>,
) -> Result<Json<Vec<TradeRecord>>> {
    let records = state.records.fetch_records(&query.normalized()).await?;
    Ok(Json(records))
}

/// Handler for `POST /api/assets/refresh`
async fn refresh_handler(State(state): State<AppState>) -> Result<Json<RefreshResponse>> {
    Ok(Json(refresh_snapshot(&state).await?))
}

/// Handler for `POST /api/assets/upload`
///
/// Expects the spreadsheet in the multipart field `file`. After the asset API
/// accepts it the snapshot is reloaded, so the new rows show up immediately.
async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadSummary>> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field.bytes().await.map_err(|e| Error::BadRequest(e.to_string()))?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) = upload.ok_or_else(|| Error::BadRequest("No file provided".to_string()))?;
    if bytes.is_empty() {
        return Err(Error::BadRequest("No file provided".to_string()));
    }

    let summary = state.records.upload(&file_name, bytes.to_vec()).await?;
    state.publish(WsMessage::UploadCompleted(WsUploadCompleted {
        file_name,
        successful: summary.successful,
        failed: summary.failed,
    }));

    // The upload itself succeeded; a failed reload only delays the new rows.
    if let Err(e) = refresh_snapshot(&state).await {
        tracing::warn!(error = %e, "Snapshot refresh after upload failed.");
    }
    Ok(Json(summary))
}

/// Handler for `GET /api/summary`
async fn get_summary_handler(State(state): State<AppState>) -> Json<AssetSummary> {
    Json(state.session.read().await.summary())
}

/// Handler for `GET /api/filters`
async fn get_filters_handler(State(state): State<AppState>) -> Json<FilterOptions> {
    Json(state.session.read().await.filter_options())
}

/// Handler for `PUT /api/selection/bank`
async fn select_bank_handler(
    State(state): State<AppState>,
    Json(update): Json<SelectionUpdate>,
) -> Json<FilterOptions> {
    update_selection(&state, |session| session.select_bank(&update.value)).await
}

/// Handler for `PUT /api/selection/portfolio`
async fn select_portfolio_handler(
    State(state): State<AppState>,
    Json(update): Json<SelectionUpdate>,
) -> Json<FilterOptions> {
    update_selection(&state, |session| session.select_portfolio(&update.value)).await
}

/// Handler for `PUT /api/selection/asset`
async fn select_asset_handler(
    State(state): State<AppState>,
    Json(update): Json<SelectionUpdate>,
) -> Json<FilterOptions> {
    update_selection(&state, |session| session.select_asset_name(&update.value)).await
}

/// Handler for `GET /api/performance`
async fn get_performance_handler(State(state): State<AppState>) -> Json<PerformanceView> {
    Json(state.session.read().await.performance_view())
}

/// Handler for `GET /api/stress`
async fn get_stress_handler(
    State(state): State<AppState>,
    Query(params): Query<StressParams>,
) -> Result<Json<StressResponse>> {
    let session = state.session.read().await;
    let custom = params.custom.unwrap_or(session.stress_settings().default_custom);
    let scenarios = session.stress(Some(custom))?;

    Ok(Json(StressResponse {
        generation: session.generation(),
        custom,
        reference: session.reference_record().map(ReferencePosition::from),
        scenarios,
    }))
}

/// The handler for `GET /ws`.
/// Upgrades the connection to a WebSocket and handles the real-time communication.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Serializes `msg` and sends it; `false` once the client is gone.
async fn send_message(socket: &mut WebSocket, msg: &WsMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json_msg) => socket.send(Message::Text(json_msg.into())).await.is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize WebSocket message.");
            true
        }
    }
}

/// The actual WebSocket handling logic after the connection is upgraded.
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    tracing::info!("New WebSocket client connected.");

    // --- 1. The "Replay" ---
    let replay_msgs: Vec<_> = {
        let cache = state.ws_cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.iter().cloned().collect()
    };
    for msg in replay_msgs {
        if !send_message(&mut socket, &msg).await {
            tracing::info!("WebSocket client disconnected during replay.");
            return;
        }
    }

    // --- 2. "Going Live" ---
    let mut rx = state.ws_tx.subscribe();

    loop {
        tokio::select! {
            Ok(msg) = rx.recv() => {
                if !send_message(&mut socket, &msg).await {
                    tracing::info!("WebSocket client disconnected.");
                    break;
                }
            }
            Some(Ok(msg)) = socket.next() => {
                if let Message::Close(_) = msg {
                    tracing::info!("WebSocket client sent close frame.");
                    break;
                }
            }
            else => {
                break;
            }
        }
    }
    tracing::info!("WebSocket client connection closed.");
}

/// The main entry point for running the web server.
///
/// Serves until the process is terminated.
pub async fn run(settings: ServerSettings, app_state: AppState) -> Result<()> {
    let app = create_router(app_state);

    let address = format!("{}:{}", settings.host, settings.port);
    tracing::info!("Web server listening on {}", address);

    let listener = TcpListener::bind(&address).await.map_err(Error::ServerBindError)?;

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(Error::ServerError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use core_types::{BenchmarkEntry, BenchmarkTable, Ticker};
    use serde_json::{Value, json};
    use std::time::Duration;
    use tower::ServiceExt;

    struct StubSource {
        records: Vec<TradeRecord>,
        uploads: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TradeRecordSource for StubSource {
        async fn fetch_records(&self, query: &AssetQuery) -> api_client::Result<Vec<TradeRecord>> {
            Ok(self
                .records
                .iter()
                .filter(|r| query.bank.as_deref().is_none_or(|bank| r.bank == bank))
                .cloned()
                .collect())
        }

        async fn upload(&self, file_name: &str, _bytes: Vec<u8>) -> api_client::Result<UploadSummary> {
            if !file_name.ends_with(".xlsx") {
                return Err(api_client::Error::ApiError {
                    status: 400,
                    message: "Unsupported file format.".to_string(),
                });
            }
            self.uploads.lock().unwrap().push(file_name.to_string());
            Ok(UploadSummary {
                message: "Upload complete".to_string(),
                total: 2,
                successful: 2,
                failed: 0,
                errors: Vec::new(),
            })
        }
    }

    struct StubFeed {
        table: Option<BenchmarkTable>,
    }

    #[async_trait]
    impl BenchmarkFeed for StubFeed {
        fn name(&self) -> &'static str {
            "Stub"
        }

        async fn monthly_prices(&self, _ticker: &Ticker) -> api_client::Result<BenchmarkTable> {
            self.table
                .clone()
                .ok_or_else(|| api_client::Error::FeedError("rate limited".to_string()))
        }
    }

    fn record(id: &str, bank: &str, portfolio: &str, name: &str, ticker: &str, date: &str, qty: f64, amount: f64) -> TradeRecord {
        serde_json::from_value(json!({
            "TRADE_ID": id,
            "BANK": bank,
            "PORTFOLIO": portfolio,
            "TRADE_DATE": date,
            "ASSET_CLASS": "Equity",
            "ASSET_TICKER": ticker,
            "ASSET_NAME": name,
            "DIRECTION": "BUY",
            "QUANTITY": qty,
            "PRICE_USD": amount / qty,
            "TRADE_AMOUNT_USD": amount,
            "CURRENCY": "USD",
            "PRICE_LOCAL": amount / qty,
            "TRADE_AMOUNT_LOCAL": amount,
        }))
        .unwrap()
    }

    fn test_state(table: Option<BenchmarkTable>) -> (AppState, Arc<StubSource>) {
        let source = Arc::new(StubSource {
            records: vec![
                record("1", "Alpine", "Growth", "Apple", "AAPL", "2024-01-10", 10.0, 1000.0),
                record("2", "Alpine", "Growth", "Apple", "AAPL", "2024-02-12", 5.0, 600.0),
                record("3", "Harbor", "Income", "Nestle", "NESN", "2024-01-05", 20.0, 1000.0),
            ],
            uploads: Mutex::new(Vec::new()),
        });
        let (ws_tx, _) = broadcast::channel(64);
        let state = AppState::new(
            source.clone(),
            Arc::new(StubFeed { table }),
            StressSettings::default(),
            ws_tx,
            Arc::new(Mutex::new(VecDeque::new())),
        );
        (state, source)
    }

    fn monthly_table() -> BenchmarkTable {
        [("2024-01-31", "200.00"), ("2024-02-29", "220.00")]
            .into_iter()
            .map(|(date, close)| (date.to_string(), BenchmarkEntry::new(close)))
            .collect()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn select(level: &str, value: &str) -> Request<Body> {
        Request::put(format!("/api/selection/{level}"))
            .header("content-type", "application/json")
            .body(Body::from(json!({ "value": value }).to_string()))
            .unwrap()
    }

    async fn select_apple(app: &Router) -> Value {
        send(app, select("bank", "Alpine")).await;
        send(app, select("portfolio", "Growth")).await;
        let (status, options) = send(app, select("asset", "Apple")).await;
        assert_eq!(status, StatusCode::OK);
        options
    }

    #[tokio::test]
    async fn test_health_check() {
        let (state, _) = test_state(None);
        let response = create_router(state).oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn test_refresh_loads_snapshot_and_summary() {
        let (state, _) = test_state(None);
        let app = create_router(state.clone());

        let (status, body) = send(&app, Request::post("/api/assets/refresh").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recordCount"], 3);

        let (_, summary) = send(&app, get("/api/summary")).await;
        assert_eq!(summary["totalUsd"].as_f64(), Some(2600.0));
        assert_eq!(summary["banks"].as_array().unwrap().len(), 2);

        let cache = state.ws_cache.lock().unwrap();
        assert!(matches!(cache.front(), Some(WsMessage::RecordsRefreshed(r)) if r.record_count == 3));
    }

    #[tokio::test]
    async fn test_assets_are_proxied_with_filters() {
        let (state, _) = test_state(None);
        let app = create_router(state);
        let (status, body) = send(&app, get("/api/assets?bank=Harbor")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["ASSET_TICKER"], "NESN");
    }

    #[tokio::test]
    async fn test_selection_cascade_and_benchmark_overlay() {
        let (state, _) = test_state(Some(monthly_table()));
        refresh_snapshot(&state).await.unwrap();
        let app = create_router(state);

        let options = select_apple(&app).await;
        assert_eq!(options["ticker"], "AAPL");
        assert_eq!(options["portfolios"], json!(["Growth"]));

        let mut view = Value::Null;
        for _ in 0..50 {
            view = send(&app, get("/api/performance")).await.1;
            if !view["benchmark"].as_array().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let portfolio = view["portfolio"].as_array().unwrap();
        assert_eq!(portfolio.len(), 2);
        assert_eq!(portfolio[1]["value"].as_f64(), Some(1600.0));

        let benchmark = view["benchmark"].as_array().unwrap();
        assert_eq!(benchmark.len(), 2);
        assert_eq!(benchmark[0]["value"].as_f64(), Some(1000.0));
        assert_eq!(benchmark[1]["value"].as_f64(), Some(1100.0));

        // Changing the bank clears the lower levels and the chart.
        let (_, options) = send(&app, select("bank", "Harbor")).await;
        assert_eq!(options["ticker"], Value::Null);
        let (_, view) = send(&app, get("/api/performance")).await;
        assert!(view["portfolio"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stale_benchmark_is_discarded() {
        let (state, _) = test_state(Some(monthly_table()));
        refresh_snapshot(&state).await.unwrap();

        let stale = {
            let mut session = state.session.write().await;
            session.select_bank("Alpine");
            session.select_portfolio("Growth");
            session.select_asset_name("Apple");
            let request = session.benchmark_request();
            session.select_portfolio("");
            request
        };
        assert!(stale.is_some());

        schedule_benchmark(&state, stale).unwrap().await.unwrap();
        assert!(state.session.read().await.benchmark().is_empty());
    }

    #[tokio::test]
    async fn test_failed_benchmark_leaves_portfolio_only() {
        let (state, _) = test_state(None);
        refresh_snapshot(&state).await.unwrap();
        let request = {
            let mut session = state.session.write().await;
            session.select_bank("Alpine");
            session.select_portfolio("Growth");
            session.select_asset_name("Apple");
            session.benchmark_request()
        };

        schedule_benchmark(&state, request).unwrap().await.unwrap();
        let session = state.session.read().await;
        assert_eq!(session.performance().len(), 2);
        assert!(session.benchmark().is_empty());
    }

    #[tokio::test]
    async fn test_stress_table_with_custom_shock() {
        let (state, _) = test_state(None);
        refresh_snapshot(&state).await.unwrap();
        let app = create_router(state);

        let (_, body) = send(&app, get("/api/stress")).await;
        assert_eq!(body["reference"], Value::Null);
        assert!(body["scenarios"].as_array().unwrap().is_empty());

        select_apple(&app).await;
        let (status, body) = send(&app, get("/api/stress?custom=-50")).await;
        assert_eq!(status, StatusCode::OK);
        let scenarios = body["scenarios"].as_array().unwrap();
        assert_eq!(scenarios.len(), 5);
        assert_eq!(scenarios[0]["shock"], -50);
        assert_eq!(scenarios[0]["formatted"]["newPrice"], "60.00");
        assert_eq!(scenarios[0]["formatted"]["absoluteLoss"], "300.00");

        let (status, body) = send(&app, get("/api/stress?custom=10")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("10"));
    }

    fn multipart(file_name: &str) -> Request<Body> {
        let body = format!(
            "--XBOUNDARY\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             rows\r\n\
             --XBOUNDARY--\r\n"
        );
        Request::post("/api/assets/upload")
            .header("content-type", "multipart/form-data; boundary=XBOUNDARY")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_is_forwarded_and_snapshot_refreshed() {
        let (state, source) = test_state(None);
        let app = create_router(state.clone());

        let (status, body) = send(&app, multipart("trades.xlsx")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["successful"], 2);
        assert_eq!(source.uploads.lock().unwrap().as_slice(), ["trades.xlsx"]);
        assert_eq!(state.session.read().await.records().len(), 3);
    }

    #[tokio::test]
    async fn test_upload_errors_carry_a_message() {
        let (state, _) = test_state(None);
        let app = create_router(state);

        let (status, body) = send(&app, multipart("notes.txt")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["message"], "Unsupported file format.");

        let wrong_field = Request::post("/api/assets/upload")
            .header("content-type", "multipart/form-data; boundary=XBOUNDARY")
            .body(Body::from(
                "--XBOUNDARY\r\nContent-Disposition: form-data; name=\"notes\"\r\n\r\nhello\r\n--XBOUNDARY--\r\n",
            ))
            .unwrap();
        let (status, body) = send(&app, wrong_field).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No file provided");
    }

    /// Serves an older snapshot slowly on the first call and the full one afterwards.
    struct SequencedSource {
        calls: std::sync::atomic::AtomicUsize,
        records: Vec<TradeRecord>,
    }

    #[async_trait]
    impl TradeRecordSource for SequencedSource {
        async fn fetch_records(&self, _query: &AssetQuery) -> api_client::Result<Vec<TradeRecord>> {
            let call = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if call == 0 {
                tokio::time::sleep(Duration::from_millis(50)).await;
                return Ok(self.records[..1].to_vec());
            }
            Ok(self.records.clone())
        }

        async fn upload(&self, _file_name: &str, _bytes: Vec<u8>) -> api_client::Result<UploadSummary> {
            Ok(UploadSummary::default())
        }
    }

    #[tokio::test]
    async fn test_overlapping_refreshes_keep_the_latest_snapshot() {
        let source = Arc::new(SequencedSource {
            calls: std::sync::atomic::AtomicUsize::new(0),
            records: vec![
                record("1", "Alpine", "Growth", "Apple", "AAPL", "2024-01-10", 10.0, 1000.0),
                record("2", "Alpine", "Growth", "Apple", "AAPL", "2024-02-12", 5.0, 600.0),
                record("3", "Harbor", "Income", "Nestle", "NESN", "2024-01-05", 20.0, 1000.0),
            ],
        });
        let (ws_tx, _) = broadcast::channel(64);
        let state = AppState::new(
            source,
            Arc::new(StubFeed { table: None }),
            StressSettings::default(),
            ws_tx,
            Arc::new(Mutex::new(VecDeque::new())),
        );

        let first = tokio::spawn({
            let state = state.clone();
            async move { refresh_snapshot(&state).await }
        });
        // Let the slow first refresh start its fetch.
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = refresh_snapshot(&state).await.unwrap();
        let first = first.await.unwrap().unwrap();

        assert_eq!(first.record_count, 1);
        assert_eq!(second.record_count, 3);
        assert!(second.generation > first.generation);
        assert_eq!(state.session.read().await.records().len(), 3);
    }

    #[test]
    fn test_replay_cache_is_bounded() {
        let cache: WsCache = Arc::new(Mutex::new(VecDeque::new()));
        for generation in 0..(WS_CACHE_SIZE as u64 + 5) {
            push_cached(&cache, WsMessage::RecordsRefreshed(WsRecordsRefreshed { generation, record_count: 0 }));
        }
        let cache = cache.lock().unwrap();
        assert_eq!(cache.len(), WS_CACHE_SIZE);
        assert!(matches!(cache.front(), Some(WsMessage::RecordsRefreshed(r)) if r.generation == 5));
    }
}
