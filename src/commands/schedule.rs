use anyhow::{Context, Result, anyhow};
use chrono::NaiveDateTime;
use chrono::TimeZone;

use crate::commands::CommandReport;
use crate::intake::calendar;
use crate::intake::config::load_config;
use crate::intake::matcher;
use crate::intake::namer;
use crate::intake::paths::resolve_paths;

#[derive(Debug, Clone, Default)]
pub struct ScheduleOptions {
    /// Dry-run classify this local timestamp instead of listing the table.
    pub at: Option<String>,
}

fn parse_local_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let trimmed = raw.trim();
    for layout in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, layout) {
            return Ok(parsed);
        }
    }
    Err(anyhow!(
        "unparseable timestamp `{trimmed}`: use YYYY-MM-DDTHH:MM[:SS]"
    ))
}

pub fn run(opts: &ScheduleOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config(&paths)?;
    let mut report = CommandReport::new("schedule");

    let tz = cfg.timezone()?;
    let schedule = cfg.static_schedule()?;

    if let Some(raw) = &opts.at {
        let naive = parse_local_timestamp(raw)?;
        let instant = tz
            .from_local_datetime(&naive)
            .earliest()
            .with_context(|| format!("timestamp `{raw}` does not exist in {tz}"))?;

        let calendar = calendar::from_config(
            &cfg.calendar.base_url,
            &cfg.calendar.calendar_id,
            cfg.calendar.timeout_secs,
        )?;
        let slot = matcher::match_slot(&instant, calendar.as_ref(), &schedule);
        let decision = namer::name(&instant, slot.as_ref());

        report.detail(format!("instant={}", instant.format("%Y-%m-%d %H:%M:%S %Z")));
        match &slot {
            Some(slot) => report.detail(format!(
                "slot=[{}, {}) subject={} period={}",
                slot.start.format("%H:%M"),
                slot.end.format("%H:%M"),
                slot.subject,
                slot.period
            )),
            None => report.detail("slot=none"),
        }
        report.detail(format!("category={}", decision.category));
        report.detail(format!("base_name={}", decision.base_name));
        return Ok(report);
    }

    report.detail(format!("timezone={tz}"));
    if schedule.is_empty() {
        report.detail("schedule=empty");
        return Ok(report);
    }
    for weekday in 1..=7u8 {
        for slot in schedule.slots_for(weekday) {
            report.detail(format!(
                "weekday={} [{}, {}) subject={} period={}",
                weekday,
                slot.start.format("%H:%M"),
                slot.end.format("%H:%M"),
                slot.subject,
                slot.period
            ));
        }
    }
    Ok(report)
}
