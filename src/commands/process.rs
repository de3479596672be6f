use anyhow::Result;
use std::thread;
use std::time::Duration;

use crate::commands::CommandReport;
use crate::intake::config::load_config;
use crate::intake::paths::resolve_paths;
use crate::intake::pipeline::{Pipeline, RunOutcome};

#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    pub once: bool,
    pub daemon: bool,
}

fn report_outcome(report: &mut CommandReport, outcome: &RunOutcome) {
    report.detail(format!("upload_dir={}", outcome.upload_dir));
    if outcome.ledger_file.is_empty() {
        report.detail("ledger=unconfigured");
    } else {
        report.detail(format!("ledger_file={}", outcome.ledger_file));
    }
    report.detail(format!(
        "scanned={} processed={} skipped={} failed={}",
        outcome.scanned, outcome.processed, outcome.skipped, outcome.failed
    ));
    for event in &outcome.events {
        report.detail(format!(
            "file={} status={} {}",
            event.file, event.status, event.message
        ));
    }
    if outcome.failed > 0 {
        report.issue(format!("{} file(s) failed; see details above", outcome.failed));
    }
}

pub fn run(opts: &ProcessOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("process");

    if opts.once && opts.daemon {
        report.issue("invalid flags: use only one of --once or --daemon");
        return Ok(report);
    }

    let paths = resolve_paths()?;
    let cfg = load_config(&paths)?;
    let pipeline = Pipeline::from_config(paths, cfg)?;

    if opts.daemon {
        report.detail("starting intake pipeline in daemon mode");
        report.detail(format!("poll_interval_secs={}", pipeline.poll_interval_secs()));
        loop {
            let outcome = pipeline.run()?;
            if outcome.scanned > 0 {
                println!(
                    "intake cycle: scanned={} processed={} skipped={} failed={}",
                    outcome.scanned, outcome.processed, outcome.skipped, outcome.failed
                );
            }
            thread::sleep(Duration::from_secs(pipeline.poll_interval_secs()));
        }
    }

    let outcome = pipeline.run()?;
    report.detail("intake pipeline run completed");
    report_outcome(&mut report, &outcome);
    Ok(report)
}
