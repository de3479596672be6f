use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// One event as returned by the calendar collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct CalendarEvent {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub title: String,
}

/// Narrow collaborator interface: all the pipeline ever asks a calendar
/// is "which events cover this civil day".
pub trait CalendarSource {
    fn is_enabled(&self) -> bool;
    fn events_on(&self, day: NaiveDate) -> Result<Vec<CalendarEvent>>;
}

/// The valid "no calendar configured" state.
pub struct DisabledCalendar;

impl CalendarSource for DisabledCalendar {
    fn is_enabled(&self) -> bool {
        false
    }

    fn events_on(&self, _day: NaiveDate) -> Result<Vec<CalendarEvent>> {
        Ok(Vec::new())
    }
}

/// HTTP JSON calendar: `GET {base_url}/calendars/{calendar_id}/events?date=YYYY-MM-DD`
/// returning an array of `{start, end, title}` with RFC 3339 datetimes.
pub struct HttpCalendar {
    base_url: String,
    calendar_id: String,
    client: Client,
}

impl HttpCalendar {
    pub fn new(base_url: &str, calendar_id: &str, timeout_secs: u64) -> Result<Self> {
        let timeout = if timeout_secs == 0 {
            REQUEST_TIMEOUT_SECS
        } else {
            timeout_secs
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .context("failed to build calendar http client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            calendar_id: calendar_id.to_string(),
            client,
        })
    }
}

impl CalendarSource for HttpCalendar {
    fn is_enabled(&self) -> bool {
        true
    }

    fn events_on(&self, day: NaiveDate) -> Result<Vec<CalendarEvent>> {
        let url = format!(
            "{}/calendars/{}/events?date={}",
            self.base_url,
            self.calendar_id,
            day.format("%Y-%m-%d")
        );
        let response = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("calendar request failed: {url}"))?;
        if !response.status().is_success() {
            anyhow::bail!("calendar returned status {} for {url}", response.status());
        }
        let events: Vec<CalendarEvent> = response
            .json()
            .with_context(|| format!("calendar returned malformed events for {url}"))?;
        Ok(events)
    }
}

/// Build the calendar collaborator from configuration. An empty or `none`
/// calendar id, or a missing base URL, disables the calendar entirely.
pub fn from_config(
    base_url: &str,
    calendar_id: &str,
    timeout_secs: u64,
) -> Result<Box<dyn CalendarSource>> {
    let id = calendar_id.trim();
    if id.is_empty() || id.eq_ignore_ascii_case("none") || base_url.trim().is_empty() {
        return Ok(Box::new(DisabledCalendar));
    }
    Ok(Box::new(HttpCalendar::new(base_url, id, timeout_secs)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_calendar_returns_no_events() {
        let cal = DisabledCalendar;
        assert!(!cal.is_enabled());
        let events = cal
            .events_on(NaiveDate::from_ymd_opt(2024, 5, 20).unwrap())
            .expect("events");
        assert!(events.is_empty());
    }

    #[test]
    fn sentinel_ids_disable_the_calendar() {
        for id in ["", "  ", "none", "NONE"] {
            let cal = from_config("http://localhost:9", id, 1).expect("build");
            assert!(!cal.is_enabled());
        }
        let cal = from_config("", "team", 1).expect("build");
        assert!(!cal.is_enabled());
    }

    #[test]
    fn configured_id_enables_http_calendar() {
        let cal = from_config("http://localhost:9/", "team", 1).expect("build");
        assert!(cal.is_enabled());
    }

    #[test]
    fn event_json_shape_deserializes() {
        let raw = r#"{"start":"2024-05-20T09:00:00+09:00","end":"2024-05-20T10:30:00+09:00","title":"Planning"}"#;
        let event: CalendarEvent = serde_json::from_str(raw).expect("parse");
        assert_eq!(event.title, "Planning");
        assert!(event.start < event.end);
    }
}
