// --- WebSocket Message Structures ---

use analytics::PerformanceView;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Represents a log message event to be sent to the UI.
#[derive(Debug, Clone, Serialize)]
pub struct WsLogMessage {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
}

/// Sent after the record snapshot was reloaded from the asset API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WsRecordsRefreshed {
    pub generation: u64,
    pub record_count: usize,
}

/// Sent after the asset API accepted an uploaded file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WsUploadCompleted {
    pub file_name: String,
    pub successful: u64,
    pub failed: u64,
}

/// The top-level WebSocket message enum.
/// `tag` and `content` are used by serde for clean JSON representation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum WsMessage {
    Log(WsLogMessage),
    RecordsRefreshed(WsRecordsRefreshed),
    UploadCompleted(WsUploadCompleted),
    /// The portfolio curve or its benchmark changed; clients redraw the chart.
    PerformanceUpdated(PerformanceView),
}
