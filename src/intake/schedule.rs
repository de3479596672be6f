use chrono::NaiveTime;
use std::collections::BTreeMap;

/// One `[start, end)` slot of the weekly timetable. `weekday` is ISO
/// numbering: 1 = Monday .. 7 = Sunday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSlot {
    pub weekday: u8,
    pub period: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub subject: String,
}

impl ScheduleSlot {
    /// Half-open containment: `start` matches, `end` does not.
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time < self.end
    }
}

/// Read-only weekly timetable, injected from configuration. Slots keep
/// their configuration order within a weekday; the first containing slot
/// wins and overlaps are not detected.
#[derive(Debug, Clone, Default)]
pub struct StaticSchedule {
    slots: BTreeMap<u8, Vec<ScheduleSlot>>,
}

impl StaticSchedule {
    pub fn from_slots(slots: Vec<ScheduleSlot>) -> Self {
        let mut by_weekday: BTreeMap<u8, Vec<ScheduleSlot>> = BTreeMap::new();
        for slot in slots {
            by_weekday.entry(slot.weekday).or_default().push(slot);
        }
        Self { slots: by_weekday }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.values().all(Vec::is_empty)
    }

    /// Slots for an ISO weekday; absent weekday yields an empty slice.
    pub fn slots_for(&self, weekday: u8) -> &[ScheduleSlot] {
        self.slots.get(&weekday).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn all_slots(&self) -> impl Iterator<Item = &ScheduleSlot> {
        self.slots.values().flatten()
    }

    pub fn match_time(&self, weekday: u8, time: NaiveTime) -> Option<&ScheduleSlot> {
        self.slots_for(weekday).iter().find(|slot| slot.contains(time))
    }
}
