use anyhow::Result;
use std::path::Path;

use crate::commands::CommandReport;
use crate::intake::config::load_config;
use crate::intake::ledger;
use crate::intake::paths::resolve_paths;
use crate::intake::state;

mod generated {
    include!(concat!(env!("OUT_DIR"), "/intake_env_allowlist.rs"));
}

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("status");

    report.detail(format!("intake_home={}", paths.intake_home.display()));
    report.detail(format!("logs_dir={}", paths.logs_dir.display()));
    report.detail(format!("state_file={}", paths.state_file.display()));
    report.detail(format!("config_file={}", paths.config_file.display()));

    if !paths.config_file.exists() {
        report.detail("config=defaults (no intake.toml found)");
    }

    match load_config(&paths) {
        Ok(cfg) => {
            report.detail(format!("timezone={}", cfg.timezone));
            let upload = cfg.locations.upload_dir.trim();
            if upload.is_empty() {
                report.issue("upload dir unset; set locations.upload_dir or INTAKE_UPLOAD_DIR");
            } else {
                report.detail(format!("upload_dir={upload}"));
                if !Path::new(upload).is_dir() {
                    report.issue(format!("upload dir does not exist: {upload}"));
                }
            }
            report.detail(format!("category_root={}", cfg.category_root()));

            let ledger_dir = cfg.locations.ledger_dir.trim();
            if ledger_dir.is_empty() {
                report.detail("ledger=unconfigured (appends will be skipped with a warning)");
            } else {
                let file = ledger::ledger_file(Path::new(ledger_dir), cfg.locations.ledger_sheet.trim());
                match ledger::read_records(&file) {
                    Ok(rows) => report.detail(format!(
                        "ledger_file={} rows={}",
                        file.display(),
                        rows.len()
                    )),
                    Err(err) => report.issue(format!("ledger unreadable: {err:#}")),
                }
            }

            match cfg.static_schedule() {
                Ok(schedule) if schedule.is_empty() => {
                    report.detail("schedule=empty (every file will be 未分類 unless a calendar matches)");
                }
                Ok(schedule) => {
                    report.detail(format!("schedule_slots={}", schedule.all_slots().count()));
                }
                Err(err) => report.issue(format!("schedule invalid: {err:#}")),
            }

            let calendar_id = cfg.calendar.calendar_id.trim();
            if calendar_id.is_empty() || calendar_id.eq_ignore_ascii_case("none") {
                report.detail("calendar=disabled");
            } else {
                report.detail(format!(
                    "calendar_id={calendar_id} base_url={}",
                    cfg.calendar.base_url
                ));
            }
        }
        Err(err) => report.issue(format!("config invalid: {err:#}")),
    }

    match state::load(&paths) {
        Ok(run_state) => {
            report.detail(format!(
                "last_run_epoch_secs={} total_processed={} total_skipped={} total_failed={}",
                run_state.last_run_epoch_secs,
                run_state.total_processed,
                run_state.total_skipped,
                run_state.total_failed
            ));
        }
        Err(err) => report.issue(format!("state unreadable: {err:#}")),
    }

    report.detail(format!(
        "recognized_env_overrides={}",
        generated::GENERATED_INTAKE_ENV_ALLOWLIST.join(",")
    ));

    Ok(report)
}
