use crate::error::IntakeError;
use crate::intake::calendar::{CalendarEvent, CalendarSource};
use crate::intake::schedule::{ScheduleSlot, StaticSchedule};
use crate::intake::warn::{self, WarnEvent};
use chrono::{DateTime, Datelike};
use chrono_tz::Tz;

pub const CALENDAR_PERIOD_LABEL: &str = "Calendar";

fn event_contains(event: &CalendarEvent, instant: &DateTime<Tz>) -> bool {
    // Same half-open rule as static slots, on full datetimes.
    event.start <= *instant && *instant < event.end
}

fn slot_from_event(event: &CalendarEvent, instant: &DateTime<Tz>) -> ScheduleSlot {
    let tz = instant.timezone();
    ScheduleSlot {
        weekday: instant.weekday().number_from_monday() as u8,
        period: CALENDAR_PERIOD_LABEL.to_string(),
        start: event.start.with_timezone(&tz).time(),
        end: event.end.with_timezone(&tz).time(),
        subject: event.title.clone(),
    }
}

fn calendar_match(
    instant: &DateTime<Tz>,
    calendar: &dyn CalendarSource,
) -> Result<Option<ScheduleSlot>, IntakeError> {
    if !calendar.is_enabled() {
        return Ok(None);
    }

    let events = calendar
        .events_on(instant.date_naive())
        .map_err(|err| IntakeError::CollaboratorUnavailable(format!("calendar: {err:#}")))?;

    Ok(events
        .iter()
        .find(|event| event_contains(event, instant))
        .map(|event| slot_from_event(event, instant)))
}

/// Find the slot covering `instant`. A calendar event strictly precedes
/// the static weekly table; within each source the first match in order
/// wins. `None` means unclassified.
pub fn match_slot(
    instant: &DateTime<Tz>,
    calendar: &dyn CalendarSource,
    schedule: &StaticSchedule,
) -> Option<ScheduleSlot> {
    match calendar_match(instant, calendar) {
        Ok(Some(slot)) => return Some(slot),
        Ok(None) => {}
        // Calendar failure never aborts a file; fall through to the
        // static table.
        Err(err) => warn::emit(WarnEvent {
            code: "CALENDAR_UNAVAILABLE",
            stage: "matcher",
            file: "",
            reason: "calendar-query-failed",
            err: &err.to_string(),
        }),
    }

    let weekday = instant.weekday().number_from_monday() as u8;
    schedule.match_time(weekday, instant.time()).cloned()
}
