//! Telemetry storage. Append-only by construction: the public trait has no
//! `update`/`delete`, only `append` and `read_run` (spec §7 observable
//! behavior, §8 "no event is ever mutated once emitted").

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

use crate::error::{Error, ErrorKind, Result};
use crate::strategy::StrategyKind;

use super::event::TelemetryEvent;

pub trait TelemetryStore: Send + Sync {
    fn append(&self, event: &TelemetryEvent) -> Result<()>;
    fn read_run(&self, run_id: &str) -> Result<Vec<TelemetryEvent>>;
}

/// SQLite-backed telemetry store, modeled on the same `Arc<Mutex<Connection>>`
/// + idempotent-schema-init discipline used elsewhere in this codebase for
/// small embedded stores.
pub struct SqliteTelemetryStore {
    conn: Mutex<Connection>,
}

const SCHEMA_VERSION: i32 = 1;

fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current: i32 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |row| row.get(0))
        .unwrap_or(0);

    if current < SCHEMA_VERSION {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS telemetry_events (
                rowid_order INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id TEXT NOT NULL,
                step_number INTEGER NOT NULL,
                strategy_kind TEXT NOT NULL,
                attempt_index INTEGER NOT NULL,
                succeeded INTEGER NOT NULL,
                confidence REAL NOT NULL,
                duration_ms INTEGER NOT NULL,
                error_kind TEXT
            )",
            [],
        )?;
        conn.execute("INSERT INTO schema_version (version) VALUES (?1)", params![SCHEMA_VERSION])?;
    }

    Ok(())
}

fn strategy_kind_to_str(kind: StrategyKind) -> &'static str {
    match kind {
        StrategyKind::CdpSemantic => "cdp_semantic",
        StrategyKind::CdpPower => "cdp_power",
        StrategyKind::DomSelector => "dom_selector",
        StrategyKind::EvidenceScoring => "evidence_scoring",
        StrategyKind::CssSelector => "css_selector",
        StrategyKind::VisionOcr => "vision_ocr",
        StrategyKind::Coordinates => "coordinates",
    }
}

fn strategy_kind_from_str(s: &str) -> Result<StrategyKind> {
    Ok(match s {
        "cdp_semantic" => StrategyKind::CdpSemantic,
        "cdp_power" => StrategyKind::CdpPower,
        "dom_selector" => StrategyKind::DomSelector,
        "evidence_scoring" => StrategyKind::EvidenceScoring,
        "css_selector" => StrategyKind::CssSelector,
        "vision_ocr" => StrategyKind::VisionOcr,
        "coordinates" => StrategyKind::Coordinates,
        other => return Err(Error::Telemetry(format!("unknown strategy kind `{other}`"))),
    })
}

fn error_kind_to_str(kind: ErrorKind) -> String {
    serde_json::to_value(kind)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn error_kind_from_str(s: &str) -> Option<ErrorKind> {
    serde_json::from_value(serde_json::Value::String(s.to_string())).ok()
}

impl SqliteTelemetryStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| Error::Telemetry(e.to_string()))?;
        initialize_schema(&conn).map_err(|e| Error::Telemetry(e.to_string()))?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::Telemetry(e.to_string()))?;
        initialize_schema(&conn).map_err(|e| Error::Telemetry(e.to_string()))?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

impl TelemetryStore for SqliteTelemetryStore {
    fn append(&self, event: &TelemetryEvent) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| Error::Internal("telemetry store lock poisoned".into()))?;
        conn.execute(
            "INSERT INTO telemetry_events
                (run_id, step_number, strategy_kind, attempt_index, succeeded, confidence, duration_ms, error_kind)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                event.run_id,
                event.step_number,
                strategy_kind_to_str(event.strategy_kind),
                event.attempt_index as i64,
                event.succeeded,
                event.confidence,
                event.duration_ms as i64,
                event.error_kind.map(error_kind_to_str),
            ],
        )
        .map_err(|e| Error::Telemetry(e.to_string()))?;
        Ok(())
    }

    fn read_run(&self, run_id: &str) -> Result<Vec<TelemetryEvent>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| Error::Internal("telemetry store lock poisoned".into()))?;
        let mut stmt = conn
            .prepare(
                "SELECT run_id, step_number, strategy_kind, attempt_index, succeeded, confidence, duration_ms, error_kind
                 FROM telemetry_events WHERE run_id = ?1 ORDER BY rowid_order ASC",
            )
            .map_err(|e| Error::Telemetry(e.to_string()))?;

        let rows = stmt
            .query_map(params![run_id], |row| {
                let strategy_kind_str: String = row.get(2)?;
                let error_kind_str: Option<String> = row.get(7)?;
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)? as u32,
                    strategy_kind_str,
                    row.get::<_, i64>(3)? as usize,
                    row.get::<_, bool>(4)?,
                    row.get::<_, f64>(5)?,
                    row.get::<_, i64>(6)? as u64,
                    error_kind_str,
                ))
            })
            .map_err(|e| Error::Telemetry(e.to_string()))?;

        let mut events = Vec::new();
        for row in rows {
            let (run_id, step_number, strategy_kind_str, attempt_index, succeeded, confidence, duration_ms, error_kind_str) =
                row.map_err(|e| Error::Telemetry(e.to_string()))?;
            events.push(TelemetryEvent {
                run_id,
                step_number,
                strategy_kind: strategy_kind_from_str(&strategy_kind_str)?,
                attempt_index,
                succeeded,
                confidence,
                duration_ms,
                error_kind: error_kind_str.and_then(|s| error_kind_from_str(&s)),
            });
        }
        Ok(events)
    }
}

#[allow(dead_code)]
fn _silence_unused_optional_extension(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    conn.query_row("SELECT 1", [], |r| r.get(0)).optional()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_read_preserves_order() {
        let store = SqliteTelemetryStore::in_memory().unwrap();
        for i in 0..3 {
            store
                .append(&TelemetryEvent::new(
                    "run-1",
                    1,
                    StrategyKind::CdpSemantic,
                    i,
                    i == 2,
                    0.9,
                    10,
                    if i == 2 { None } else { Some(ErrorKind::ElementNotFound) },
                ))
                .unwrap();
        }
        let events = store.read_run("run-1").unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].attempt_index, 0);
        assert_eq!(events[2].attempt_index, 2);
        assert!(events[2].succeeded);
    }

    #[test]
    fn read_run_is_scoped_to_run_id() {
        let store = SqliteTelemetryStore::in_memory().unwrap();
        store
            .append(&TelemetryEvent::new("run-a", 1, StrategyKind::DomSelector, 0, true, 0.8, 5, None))
            .unwrap();
        store
            .append(&TelemetryEvent::new("run-b", 1, StrategyKind::DomSelector, 0, true, 0.8, 5, None))
            .unwrap();
        assert_eq!(store.read_run("run-a").unwrap().len(), 1);
    }

    #[test]
    fn store_trait_has_no_mutation_api() {
        // Compile-time property: TelemetryStore exposes only append/read_run.
        fn assert_append_only<T: TelemetryStore>() {}
        assert_append_only::<SqliteTelemetryStore>();
    }
}
