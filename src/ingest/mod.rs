// src/ingest/mod.rs - webhook ingestion handler family
//
// Receives document view/save payloads. When a viewer identity is present,
// one ReadEvent is appended to the document's read log; the append is
// fire-and-forget with respect to the HTTP response.

use crate::server::AppState;
use crate::stats::event_log::{self, ReadEvent};
use actix_web::{web, HttpResponse, Result as ActixResult};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct IngestPayload {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
    pub name: Option<String>,
    pub ts: Option<f64>,
    pub content: Option<String>,
    pub comments: Option<Vec<serde_json::Value>>,
    pub viewer: Option<Viewer>,
}

#[derive(Debug, Deserialize)]
pub struct Viewer {
    pub name: Option<String>,
    pub nickname: Option<String>,
}

pub async fn ingest_handler(
    payload: web::Json<IngestPayload>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let payload = payload.into_inner();

    // Required fields are validated before any write is attempted.
    let Some(doc_id) = payload.id.filter(|id| !id.is_empty()) else {
        return Ok(bad_request("Missing required field 'id'"));
    };
    let Some(doc_type) = payload.doc_type.filter(|t| !t.is_empty()) else {
        return Ok(bad_request("Missing required field 'type'"));
    };

    let doc_name = payload.name.unwrap_or_else(|| "document".into());
    let ts = payload
        .ts
        .unwrap_or_else(|| Local::now().timestamp_millis() as f64);

    let mut recorded = false;
    if let Some(viewer) = payload.viewer {
        let event = ReadEvent {
            name: viewer.name.unwrap_or_default(),
            nickname: viewer.nickname.unwrap_or_default(),
            last_ts: ts,
        };
        match event_log::append_event(
            &state.config.storage.data_dir,
            &doc_id,
            &doc_name,
            &doc_type,
            event,
        )
        .await
        {
            Ok(()) => recorded = true,
            // Log-write failures do not affect the response to the caller.
            Err(e) => log::error!("Failed to record read event for '{}': {}", doc_id, e),
        }
    }

    Ok(HttpResponse::Ok().json(json!({
        "status": "accepted",
        "id": doc_id,
        "recorded": recorded,
        "timestamp": Local::now().to_rfc3339(),
    })))
}

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({
        "status": "rejected",
        "error": message,
    }))
}
