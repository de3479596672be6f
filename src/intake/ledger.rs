use crate::intake::namer::NamingDecision;
use anyhow::{Context, Result};
use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Transcription status written for every fresh row; a downstream job
/// flips it once the recording has been transcribed.
pub const TRANSCRIPT_STATUS_PENDING: &str = "未実行";

/// One audit row per processed file. Append-only; never mutated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub record_id: String,
    pub file_name: String,
    pub file_id: String,
    pub category: String,
    pub date: String,
    pub weekday: String,
    pub start_time: String,
    pub file_url: String,
    pub status: String,
    pub transcript_id: String,
}

impl LedgerRecord {
    pub fn for_processed_file(
        instant: &DateTime<Tz>,
        decision: &NamingDecision,
        file_name: &str,
        file_id: &str,
        file_url: &str,
    ) -> Self {
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            file_name: file_name.to_string(),
            file_id: file_id.to_string(),
            category: decision.category.clone(),
            date: instant.format("%Y-%m-%d").to_string(),
            weekday: instant.format("%a").to_string(),
            start_time: instant.format("%H:%M:%S").to_string(),
            file_url: file_url.to_string(),
            status: TRANSCRIPT_STATUS_PENDING.to_string(),
            transcript_id: String::new(),
        }
    }
}

/// The "sheet within a store" surface: one JSONL file per sheet name
/// inside the ledger directory.
pub fn ledger_file(ledger_dir: &Path, sheet: &str) -> PathBuf {
    ledger_dir.join(format!("{sheet}.jsonl"))
}

pub fn append_record(path: &Path, record: &LedgerRecord) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let line = format!("{}\n", serde_json::to_string(record)?);
    use std::io::Write;
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open ledger {}", path.display()))?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

pub fn read_records(path: &Path) -> Result<Vec<LedgerRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut out = Vec::new();
    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record: LedgerRecord = serde_json::from_str(trimmed)
            .with_context(|| format!("failed to parse ledger line in {}", path.display()))?;
        out.push(record);
    }
    Ok(out)
}
