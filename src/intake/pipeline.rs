use crate::error::IntakeError;
use crate::intake::audit;
use crate::intake::calendar::{self, CalendarSource};
use crate::intake::config::IntakeConfig;
use crate::intake::ledger::{self, LedgerRecord};
use crate::intake::matcher;
use crate::intake::namer;
use crate::intake::paths::IntakePaths;
use crate::intake::resolve;
use crate::intake::schedule::StaticSchedule;
use crate::intake::state;
use crate::intake::store::{self, StoredFile};
use crate::intake::util::{now_epoch_secs, truncate_with_ellipsis};
use crate::intake::warn::{self, WarnEvent};
use anyhow::{Context, Result};
use chrono_tz::Tz;
use fs2::FileExt;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Names starting with a date prefix have already been categorized.
fn processed_name_guard() -> &'static Regex {
    static GUARD: OnceLock<Regex> = OnceLock::new();
    GUARD.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}_").expect("valid guard pattern"))
}

#[derive(Debug, Clone)]
pub struct FileEvent {
    pub file: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub upload_dir: String,
    pub ledger_file: String,
    pub scanned: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub events: Vec<FileEvent>,
}

#[derive(Debug, Clone)]
struct ProcessedFile {
    new_name: String,
    category: String,
    ledger_ok: bool,
}

pub struct Pipeline {
    paths: IntakePaths,
    cfg: IntakeConfig,
    tz: Tz,
    schedule: StaticSchedule,
    calendar: Box<dyn CalendarSource>,
}

impl Pipeline {
    pub fn from_config(paths: IntakePaths, cfg: IntakeConfig) -> Result<Self> {
        let tz = cfg.timezone()?;
        let schedule = cfg.static_schedule()?;
        let calendar = calendar::from_config(
            &cfg.calendar.base_url,
            &cfg.calendar.calendar_id,
            cfg.calendar.timeout_secs,
        )?;
        Ok(Self {
            paths,
            cfg,
            tz,
            schedule,
            calendar,
        })
    }

    pub fn poll_interval_secs(&self) -> u64 {
        self.cfg.watcher.poll_interval_secs
    }

    fn upload_dir(&self) -> Result<PathBuf> {
        let raw = self.cfg.locations.upload_dir.trim();
        if raw.is_empty() || raw.starts_with("YOUR_") {
            return Err(IntakeError::ConfigurationError(
                "upload dir is unset; set locations.upload_dir or INTAKE_UPLOAD_DIR".to_string(),
            )
            .into());
        }
        Ok(PathBuf::from(raw))
    }

    fn ledger_file(&self) -> Option<PathBuf> {
        let dir = self.cfg.locations.ledger_dir.trim();
        if dir.is_empty() || dir.starts_with("YOUR_") {
            return None;
        }
        Some(ledger::ledger_file(
            Path::new(dir),
            self.cfg.locations.ledger_sheet.trim(),
        ))
    }

    /// Hold an exclusive lock for the duration of a run; overlapping runs
    /// would race on the category folders and the ledger.
    fn acquire_run_lock(&self) -> Result<fs::File> {
        if let Some(parent) = self.paths.lock_file.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let lock = fs::File::create(&self.paths.lock_file)
            .with_context(|| format!("failed to open {}", self.paths.lock_file.display()))?;
        lock.try_lock_exclusive().map_err(|_| {
            anyhow::anyhow!(
                "another intake run holds {}; refusing to overlap",
                self.paths.lock_file.display()
            )
        })?;
        Ok(lock)
    }

    /// Process every candidate file currently in the upload location.
    /// Per-file failures are recorded and never abort the run.
    pub fn run(&self) -> Result<RunOutcome> {
        let _lock = self.acquire_run_lock()?;

        let upload_dir = self.upload_dir()?;
        let mut out = RunOutcome {
            upload_dir: upload_dir.display().to_string(),
            ledger_file: self
                .ledger_file()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            ..RunOutcome::default()
        };

        let files = store::list_files(&upload_dir)?;
        for file in files {
            out.scanned += 1;

            if processed_name_guard().is_match(&file.name)
                && !resolve::has_embedded_timestamp(&file.name)
            {
                out.skipped += 1;
                out.events.push(FileEvent {
                    file: file.name.clone(),
                    status: "skipped".to_string(),
                    message: "already categorized".to_string(),
                });
                continue;
            }

            match self.process_file(&file) {
                Ok(done) => {
                    out.processed += 1;
                    out.events.push(FileEvent {
                        file: file.name.clone(),
                        status: if done.ledger_ok {
                            "processed".to_string()
                        } else {
                            "processed-without-ledger".to_string()
                        },
                        message: format!("renamed={} category={}", done.new_name, done.category),
                    });
                }
                Err(err) => {
                    out.failed += 1;
                    let message = truncate_with_ellipsis(&format!("{err:#}"), 240);
                    out.events.push(FileEvent {
                        file: file.name.clone(),
                        status: "failed".to_string(),
                        message: message.clone(),
                    });
                    audit::append_event(
                        &self.paths,
                        "intake",
                        "degraded",
                        &format!("file={} error={message}", file.name),
                    )?;
                }
            }
        }

        audit::append_event(
            &self.paths,
            "intake",
            if out.failed == 0 { "ok" } else { "degraded" },
            &format!(
                "scanned={} processed={} skipped={} failed={} upload_dir={}",
                out.scanned, out.processed, out.skipped, out.failed, out.upload_dir
            ),
        )?;

        let mut run_state = state::load(&self.paths)?;
        run_state.last_run_epoch_secs = now_epoch_secs()?;
        run_state.total_processed += out.processed as u64;
        run_state.total_skipped += out.skipped as u64;
        run_state.total_failed += out.failed as u64;
        state::save(&self.paths, &run_state)?;

        Ok(out)
    }

    fn process_file(&self, file: &StoredFile) -> Result<ProcessedFile> {
        let instant = resolve::resolve(&file.name, file.created, file.modified, self.tz)?;
        let slot = matcher::match_slot(&instant, self.calendar.as_ref(), &self.schedule);
        let decision = namer::name(&instant, slot.as_ref());
        let new_name = namer::final_name(&decision.base_name, &file.name);

        let renamed = store::rename_in_place(&file.path, &new_name)?;

        let category_root = PathBuf::from(self.cfg.category_root());
        let category_dir = store::ensure_category_dir(&category_root, &decision.category)?;
        // The move may uniquify on a same-slot collision; the landed name
        // is the one the ledger and the run report get.
        let target = store::move_into(&renamed, &category_dir)?;
        let final_name = target
            .file_name()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .unwrap_or(new_name);

        // Ledger append is best-effort: the categorization stands even
        // when the sink is missing or unwritable.
        let ledger_ok = match self.ledger_file() {
            Some(path) => {
                let record = LedgerRecord::for_processed_file(
                    &instant,
                    &decision,
                    &final_name,
                    &target.display().to_string(),
                    &store::file_url(&target),
                );
                match self.append_ledger(&path, &record) {
                    Ok(()) => true,
                    Err(err) => {
                        warn::emit(WarnEvent {
                            code: "LEDGER_APPEND_FAILED",
                            stage: "pipeline",
                            file: &final_name,
                            reason: "ledger-sink-unavailable",
                            err: &err.to_string(),
                        });
                        false
                    }
                }
            }
            None => {
                warn::emit(WarnEvent {
                    code: "LEDGER_UNCONFIGURED",
                    stage: "pipeline",
                    file: &final_name,
                    reason: "ledger-dir-unset",
                    err: "set locations.ledger_dir or INTAKE_LEDGER_DIR",
                });
                false
            }
        };

        Ok(ProcessedFile {
            new_name: final_name,
            category: decision.category,
            ledger_ok,
        })
    }

    fn append_ledger(&self, path: &Path, record: &LedgerRecord) -> Result<(), IntakeError> {
        ledger::append_record(path, record)
            .map_err(|err| IntakeError::CollaboratorUnavailable(format!("ledger: {err:#}")))
    }
}
