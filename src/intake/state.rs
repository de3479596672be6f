use crate::intake::paths::IntakePaths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeState {
    pub schema_version: u32,
    pub last_run_epoch_secs: u64,
    pub total_processed: u64,
    pub total_skipped: u64,
    pub total_failed: u64,
}

impl Default for IntakeState {
    fn default() -> Self {
        Self {
            schema_version: 1,
            last_run_epoch_secs: 0,
            total_processed: 0,
            total_skipped: 0,
            total_failed: 0,
        }
    }
}

pub fn load(paths: &IntakePaths) -> Result<IntakeState> {
    let file = &paths.state_file;
    if !file.exists() {
        return Ok(IntakeState::default());
    }

    let raw =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let parsed: IntakeState = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", file.display()))?;
    Ok(parsed)
}

pub fn save(paths: &IntakePaths, state: &IntakeState) -> Result<PathBuf> {
    let file = &paths.state_file;
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let data = serde_json::to_string_pretty(state)?;
    fs::write(file, format!("{data}\n"))
        .with_context(|| format!("failed to write {}", file.display()))?;
    Ok(file.clone())
}
