use crate::intake::paths::IntakePaths;
use crate::intake::schedule::{ScheduleSlot, StaticSchedule};
use anyhow::{Result, anyhow};
use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;

pub const DEFAULT_TIMEZONE: &str = "Asia/Tokyo";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeLocations {
    pub upload_dir: String,
    pub category_root: String,
    pub ledger_dir: String,
    pub ledger_sheet: String,
}

impl Default for IntakeLocations {
    fn default() -> Self {
        Self {
            upload_dir: String::new(),
            category_root: String::new(),
            ledger_dir: String::new(),
            ledger_sheet: "recordings".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub base_url: String,
    pub calendar_id: String,
    pub timeout_secs: u64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            calendar_id: "none".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    pub poll_interval_secs: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 300,
        }
    }
}

/// One static timetable slot as written in the config file; times are
/// `HH:MM` strings until validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotConfig {
    pub weekday: u8,
    #[serde(default)]
    pub period: String,
    pub start: String,
    pub end: String,
    pub subject: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    pub timezone: String,
    pub locations: IntakeLocations,
    pub calendar: CalendarConfig,
    pub watcher: WatcherConfig,
    pub schedule: Vec<SlotConfig>,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            locations: IntakeLocations::default(),
            calendar: CalendarConfig::default(),
            watcher: WatcherConfig::default(),
            schedule: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
struct PartialIntakeConfig {
    timezone: Option<String>,
    locations: Option<IntakeLocations>,
    calendar: Option<CalendarConfig>,
    watcher: Option<WatcherConfig>,
    schedule: Option<Vec<SlotConfig>>,
}

fn env_or_u64(var: &str, fallback: u64) -> u64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn parse_slot_time(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S"))
        .map_err(|_| anyhow!("invalid slot time `{raw}`: use HH:MM"))
}

impl IntakeConfig {
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| anyhow!("unknown timezone `{}`", self.timezone))
    }

    /// Category folders are created under the category root, which falls
    /// back to the upload dir itself when unset.
    pub fn category_root(&self) -> &str {
        let root = self.locations.category_root.trim();
        if root.is_empty() {
            self.locations.upload_dir.trim()
        } else {
            root
        }
    }

    /// The validated, read-only weekly table in configuration order.
    pub fn static_schedule(&self) -> Result<StaticSchedule> {
        let mut slots = Vec::with_capacity(self.schedule.len());
        for slot in &self.schedule {
            if !(1..=7).contains(&slot.weekday) {
                return Err(anyhow!(
                    "invalid schedule weekday {}: use 1 (Monday) through 7 (Sunday)",
                    slot.weekday
                ));
            }
            let start = parse_slot_time(&slot.start)?;
            let end = parse_slot_time(&slot.end)?;
            if start >= end {
                return Err(anyhow!(
                    "invalid schedule slot `{}`: start {} is not before end {}",
                    slot.subject,
                    slot.start,
                    slot.end
                ));
            }
            if slot.subject.trim().is_empty() {
                return Err(anyhow!("invalid schedule slot: subject cannot be empty"));
            }
            slots.push(ScheduleSlot {
                weekday: slot.weekday,
                period: slot.period.clone(),
                start,
                end,
                subject: slot.subject.trim().to_string(),
            });
        }
        Ok(StaticSchedule::from_slots(slots))
    }
}

fn validate(cfg: &IntakeConfig) -> Result<()> {
    cfg.timezone()?;
    cfg.static_schedule()?;
    if cfg.watcher.poll_interval_secs == 0 {
        return Err(anyhow!("invalid watcher poll interval: must be >= 1 second"));
    }
    if cfg.calendar.timeout_secs == 0 {
        return Err(anyhow!("invalid calendar timeout: must be >= 1 second"));
    }
    if cfg.locations.ledger_sheet.trim().is_empty() {
        return Err(anyhow!("invalid ledger sheet name: cannot be empty"));
    }
    Ok(())
}

fn merge_file_config(base: &mut IntakeConfig, paths: &IntakePaths) -> Result<()> {
    let path = &paths.config_file;
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(path)?;
    let parsed: PartialIntakeConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse intake config {}: {err}", path.display()))?;
    if let Some(timezone) = parsed.timezone {
        base.timezone = timezone;
    }
    if let Some(locations) = parsed.locations {
        base.locations = locations;
    }
    if let Some(calendar) = parsed.calendar {
        base.calendar = calendar;
    }
    if let Some(watcher) = parsed.watcher {
        base.watcher = watcher;
    }
    if let Some(schedule) = parsed.schedule {
        base.schedule = schedule;
    }
    Ok(())
}

pub fn load_config(paths: &IntakePaths) -> Result<IntakeConfig> {
    let mut cfg = IntakeConfig::default();
    merge_file_config(&mut cfg, paths)?;

    cfg.timezone = env_or_string("INTAKE_TIMEZONE", &cfg.timezone);
    cfg.locations.upload_dir = env_or_string("INTAKE_UPLOAD_DIR", &cfg.locations.upload_dir);
    cfg.locations.category_root =
        env_or_string("INTAKE_CATEGORY_ROOT", &cfg.locations.category_root);
    cfg.locations.ledger_dir = env_or_string("INTAKE_LEDGER_DIR", &cfg.locations.ledger_dir);
    cfg.locations.ledger_sheet = env_or_string("INTAKE_LEDGER_SHEET", &cfg.locations.ledger_sheet);
    cfg.calendar.base_url = env_or_string("INTAKE_CALENDAR_BASE_URL", &cfg.calendar.base_url);
    cfg.calendar.calendar_id = env_or_string("INTAKE_CALENDAR_ID", &cfg.calendar.calendar_id);
    cfg.calendar.timeout_secs =
        env_or_u64("INTAKE_CALENDAR_TIMEOUT_SECS", cfg.calendar.timeout_secs);
    cfg.watcher.poll_interval_secs =
        env_or_u64("INTAKE_POLL_INTERVAL_SECS", cfg.watcher.poll_interval_secs);

    validate(&cfg)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg_with_slots(slots: Vec<SlotConfig>) -> IntakeConfig {
        IntakeConfig {
            schedule: slots,
            ..IntakeConfig::default()
        }
    }

    fn slot(weekday: u8, start: &str, end: &str) -> SlotConfig {
        SlotConfig {
            weekday,
            period: "朝".to_string(),
            start: start.to_string(),
            end: end.to_string(),
            subject: "定例会議".to_string(),
        }
    }

    #[test]
    fn defaults_validate_cleanly() {
        let cfg = IntakeConfig::default();
        assert!(validate(&cfg).is_ok());
        assert_eq!(cfg.timezone, "Asia/Tokyo");
        assert!(cfg.static_schedule().expect("schedule").is_empty());
    }

    #[test]
    fn schedule_slots_parse_in_order() {
        let cfg = cfg_with_slots(vec![slot(1, "09:00", "10:00"), slot(1, "13:00", "15:00")]);
        let schedule = cfg.static_schedule().expect("schedule");
        let monday = schedule.slots_for(1);
        assert_eq!(monday.len(), 2);
        assert!(monday[0].start < monday[1].start);
    }

    #[test]
    fn invalid_weekday_is_rejected() {
        let cfg = cfg_with_slots(vec![slot(8, "09:00", "10:00")]);
        assert!(cfg.static_schedule().is_err());
    }

    #[test]
    fn inverted_interval_is_rejected() {
        let cfg = cfg_with_slots(vec![slot(1, "10:00", "09:00")]);
        assert!(cfg.static_schedule().is_err());
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let mut cfg = IntakeConfig::default();
        cfg.timezone = "Mars/Olympus".to_string();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn category_root_falls_back_to_upload_dir() {
        let mut cfg = IntakeConfig::default();
        cfg.locations.upload_dir = "/data/upload".to_string();
        assert_eq!(cfg.category_root(), "/data/upload");
        cfg.locations.category_root = "/data/archive".to_string();
        assert_eq!(cfg.category_root(), "/data/archive");
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let config_file = tmp.path().join("intake.toml");
        std::fs::write(
            &config_file,
            r#"
timezone = "Asia/Tokyo"

[locations]
upload_dir = "/data/upload"
category_root = ""
ledger_dir = "/data/ledger"
ledger_sheet = "シート1"

[[schedule]]
weekday = 1
period = "朝"
start = "09:00"
end = "10:00"
subject = "定例会議"
"#,
        )
        .expect("write config");

        let paths = IntakePaths {
            intake_home: tmp.path().to_path_buf(),
            logs_dir: tmp.path().join("logs"),
            state_file: tmp.path().join("state.json"),
            lock_file: tmp.path().join("intake.lock"),
            config_file,
        };

        let cfg = load_config(&paths).expect("load");
        assert_eq!(cfg.locations.upload_dir, "/data/upload");
        assert_eq!(cfg.locations.ledger_sheet, "シート1");
        assert_eq!(cfg.static_schedule().expect("schedule").slots_for(1).len(), 1);
    }
}
