// src/stats/event_log.rs
//
// Per-document append-only read logs. The log file is a JSON array of
// ReadEvent records sitting next to the document content file:
//
//   {docName}_{docId}.{docType}        content (written elsewhere)
//   {docName}_{docId}.{docType}.json   event log (this module)
//
// The read path never errors: a missing directory, missing file or
// unparseable log all degrade to an empty history.

use crate::core::constants::UNKNOWN_VIEWER;
use crate::core::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One recorded view of a document, as written by the ingestion handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadEvent {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(rename = "lastTs", default)]
    pub last_ts: f64,
}

impl ReadEvent {
    /// Viewer identity with fallback: name, else nickname, else "unknown".
    /// All anonymous viewers collapse into one unique-visitor bucket; this
    /// undercounts UV but matches the recorded log semantics.
    pub fn subject_id(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else if !self.nickname.is_empty() {
            &self.nickname
        } else {
            UNKNOWN_VIEWER
        }
    }

    /// Events with a non-finite or non-positive timestamp are discarded
    /// during aggregation.
    pub fn is_valid(&self) -> bool {
        self.last_ts.is_finite() && self.last_ts > 0.0
    }
}

/// Locate the event log for a document id. Candidates are files whose name
/// contains `_{doc_id}.` and ends with `.json`; naming collisions are broken
/// by most recent modification time. Zero candidates means empty history.
pub fn resolve_log_file(data_dir: &Path, doc_id: &str) -> Option<PathBuf> {
    let marker = format!("_{}.", doc_id);
    let entries = std::fs::read_dir(data_dir).ok()?;

    entries
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !file_name.contains(&marker) || !file_name.ends_with(".json") {
                return None;
            }
            let modified = entry.metadata().ok()?.modified().ok()?;
            Some((modified, entry.path()))
        })
        .max_by_key(|(modified, _)| *modified)
        .map(|(_, path)| path)
}

/// Read the full event history for a document. Any failure along the way
/// degrades to an empty vec.
pub fn read_events(data_dir: &Path, doc_id: &str) -> Vec<ReadEvent> {
    let Some(path) = resolve_log_file(data_dir, doc_id) else {
        return Vec::new();
    };
    let Ok(content) = std::fs::read_to_string(&path) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<ReadEvent>>(&content) {
        Ok(events) => events,
        Err(e) => {
            log::debug!("Malformed read log {:?}, treating as empty: {}", path, e);
            Vec::new()
        }
    }
}

/// Append one event to a document's log. Creates the log file from the
/// payload metadata when no candidate exists yet. The rewrite goes through
/// a temp file + rename so a crashed write cannot truncate history;
/// concurrent appends may still lose one record (single-writer assumption).
pub async fn append_event(
    data_dir: &Path,
    doc_id: &str,
    doc_name: &str,
    doc_type: &str,
    event: ReadEvent,
) -> Result<()> {
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(AppError::Io)?;

    let path = resolve_log_file(data_dir, doc_id)
        .unwrap_or_else(|| data_dir.join(format!("{}_{}.{}.json", doc_name, doc_id, doc_type)));

    let mut events: Vec<ReadEvent> = match tokio::fs::read_to_string(&path).await {
        Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
        Err(_) => Vec::new(),
    };
    events.push(event);

    let content = serde_json::to_string(&events)
        .map_err(|e| AppError::Validation(format!("Failed to serialize read log: {}", e)))?;

    let temp_path = path.with_extension("json.tmp");
    tokio::fs::write(&temp_path, content)
        .await
        .map_err(AppError::Io)?;
    tokio::fs::rename(&temp_path, &path)
        .await
        .map_err(AppError::Io)?;

    log::debug!("Appended read event to {:?} ({} total)", path, events.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str, ts: f64) -> ReadEvent {
        ReadEvent {
            name: name.to_string(),
            nickname: String::new(),
            last_ts: ts,
        }
    }

    #[test]
    fn test_subject_id_fallback_chain() {
        let named = event("alice", 1.0);
        assert_eq!(named.subject_id(), "alice");

        let nick_only = ReadEvent {
            name: String::new(),
            nickname: "al".into(),
            last_ts: 1.0,
        };
        assert_eq!(nick_only.subject_id(), "al");

        let anon = ReadEvent {
            name: String::new(),
            nickname: String::new(),
            last_ts: 1.0,
        };
        assert_eq!(anon.subject_id(), "unknown");
    }

    #[test]
    fn test_is_valid_rejects_bad_timestamps() {
        assert!(event("a", 1700000000000.0).is_valid());
        assert!(!event("a", 0.0).is_valid());
        assert!(!event("a", -5.0).is_valid());
        assert!(!event("a", f64::NAN).is_valid());
        assert!(!event("a", f64::INFINITY).is_valid());
    }

    #[test]
    fn test_read_events_missing_dir_is_empty() {
        let events = read_events(Path::new("/nonexistent/hookwatch"), "doc1");
        assert!(events.is_empty());
    }

    #[test]
    fn test_read_events_malformed_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes_doc1.md.json"), "not json at all").unwrap();
        assert!(read_events(dir.path(), "doc1").is_empty());
    }

    #[test]
    fn test_resolve_ignores_non_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes_doc1.md"), "content").unwrap();
        std::fs::write(dir.path().join("notes_doc2.md.json"), "[]").unwrap();
        assert!(resolve_log_file(dir.path(), "doc1").is_none());
        assert!(resolve_log_file(dir.path(), "doc2").is_some());
    }

    #[test]
    fn test_resolve_picks_most_recently_modified() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old_doc1.md.json"), "[]").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(25));
        std::fs::write(dir.path().join("new_doc1.md.json"), "[]").unwrap();

        let resolved = resolve_log_file(dir.path(), "doc1").unwrap();
        assert_eq!(
            resolved.file_name().unwrap().to_string_lossy(),
            "new_doc1.md.json"
        );
    }

    #[tokio::test]
    async fn test_append_creates_and_extends_log() {
        let dir = tempfile::tempdir().unwrap();
        append_event(dir.path(), "doc1", "notes", "md", event("alice", 1000.0))
            .await
            .unwrap();
        append_event(dir.path(), "doc1", "notes", "md", event("bob", 2000.0))
            .await
            .unwrap();

        let events = read_events(dir.path(), "doc1");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].subject_id(), "alice");
        assert_eq!(events[1].subject_id(), "bob");
        assert!(dir.path().join("notes_doc1.md.json").exists());
    }

    #[tokio::test]
    async fn test_append_recovers_from_corrupt_log() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes_doc1.md.json"), "{broken").unwrap();
        append_event(dir.path(), "doc1", "notes", "md", event("alice", 1000.0))
            .await
            .unwrap();
        assert_eq!(read_events(dir.path(), "doc1").len(), 1);
    }
}
