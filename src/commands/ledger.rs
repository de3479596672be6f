use anyhow::Result;
use std::path::Path;

use crate::commands::CommandReport;
use crate::intake::config::load_config;
use crate::intake::ledger;
use crate::intake::paths::resolve_paths;

#[derive(Debug, Clone)]
pub struct LedgerOptions {
    pub limit: usize,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self { limit: 10 }
    }
}

pub fn run(opts: &LedgerOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config(&paths)?;
    let mut report = CommandReport::new("ledger");

    let ledger_dir = cfg.locations.ledger_dir.trim();
    if ledger_dir.is_empty() {
        report.issue("ledger unconfigured; set locations.ledger_dir or INTAKE_LEDGER_DIR");
        return Ok(report);
    }

    let file = ledger::ledger_file(Path::new(ledger_dir), cfg.locations.ledger_sheet.trim());
    let rows = ledger::read_records(&file)?;
    report.detail(format!("ledger_file={}", file.display()));
    report.detail(format!("rows={}", rows.len()));

    for row in rows.iter().rev().take(opts.limit) {
        report.detail(format!(
            "record_id={} date={} weekday={} start={} category={} file={} status={}",
            row.record_id,
            row.date,
            row.weekday,
            row.start_time,
            row.category,
            row.file_name,
            row.status
        ));
    }

    Ok(report)
}
