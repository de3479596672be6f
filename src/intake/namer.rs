use crate::intake::schedule::ScheduleSlot;
use chrono::DateTime;
use chrono_tz::Tz;

/// Fallback category when no slot covers the instant.
pub const UNCLASSIFIED_LABEL: &str = "未分類";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingDecision {
    pub category: String,
    pub base_name: String,
}

/// Turn a matched slot (or its absence) into the category label and base
/// filename. The period label is available on the slot but not part of
/// the default name.
pub fn name(instant: &DateTime<Tz>, slot: Option<&ScheduleSlot>) -> NamingDecision {
    let date = instant.format("%Y-%m-%d");
    match slot {
        Some(slot) => NamingDecision {
            category: slot.subject.clone(),
            base_name: format!("{date}_{}", slot.subject),
        },
        None => NamingDecision {
            category: UNCLASSIFIED_LABEL.to_string(),
            base_name: format!("{date}_{UNCLASSIFIED_LABEL}_{}", instant.format("%H%M")),
        },
    }
}

/// Append the original extension, taken verbatim from the last `.` of the
/// original name onward; empty when the name has no dot.
pub fn final_name(base_name: &str, original_name: &str) -> String {
    let ext = original_name
        .rfind('.')
        .map(|idx| &original_name[idx..])
        .unwrap_or("");
    format!("{base_name}{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Asia::Tokyo;

    fn instant(h: u32, m: u32) -> DateTime<Tz> {
        Tokyo.with_ymd_and_hms(2024, 5, 20, h, m, 0).single().expect("instant")
    }

    fn slot(subject: &str) -> ScheduleSlot {
        ScheduleSlot {
            weekday: 1,
            period: "朝".to_string(),
            start: chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end: chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            subject: subject.to_string(),
        }
    }

    #[test]
    fn matched_slot_names_by_date_and_subject() {
        let decision = name(&instant(9, 30), Some(&slot("定例会議")));
        assert_eq!(decision.category, "定例会議");
        assert_eq!(decision.base_name, "2024-05-20_定例会議");
    }

    #[test]
    fn unmatched_instant_names_by_time_of_day() {
        let decision = name(&instant(11, 0), None);
        assert_eq!(decision.category, "未分類");
        assert_eq!(decision.base_name, "2024-05-20_未分類_1100");
    }

    #[test]
    fn extension_is_carried_over_verbatim() {
        assert_eq!(final_name("2024-05-20_定例会議", "rec.wav"), "2024-05-20_定例会議.wav");
        assert_eq!(final_name("base", "archive.tar.gz"), "base.gz");
        assert_eq!(final_name("base", "noext"), "base");
        assert_eq!(final_name("base", ".env"), "base.env");
    }
}
