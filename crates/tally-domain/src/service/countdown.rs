//! Countdown - Time left until the event instant
//!
//! Instants are plain milliseconds since the Unix epoch so this stays
//! pure. Turning a date/time pair into an instant is done by the
//! use case layer, which knows about calendars and time zones.
//!
//! Nothing here is persisted. Callers recompute on every display tick.

const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;

/// Strict breakdown of a positive duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRemaining {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl TimeRemaining {
    /// Floor-divide at each unit; sub-second remainder is dropped.
    pub fn from_millis(ms: u64) -> Self {
        Self {
            days: ms / MS_PER_DAY,
            hours: (ms % MS_PER_DAY) / MS_PER_HOUR,
            minutes: (ms % MS_PER_HOUR) / MS_PER_MINUTE,
            seconds: (ms % MS_PER_MINUTE) / MS_PER_SECOND,
        }
    }
}

impl core::fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}d {:02}h {:02}m {:02}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Time left before `event_ms`, or `None` when there is no event instant
/// or it is not in the future (the event has started).
pub fn time_remaining(now_ms: i64, event_ms: Option<i64>) -> Option<TimeRemaining> {
    let event_ms = event_ms?;
    if event_ms <= now_ms {
        return None;
    }
    let diff = event_ms.abs_diff(now_ms);
    Some(TimeRemaining::from_millis(diff))
}

/// Where the event stands relative to "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    /// No event instant (date or time missing)
    Unconfigured,
    /// Event instant still in the future
    Countdown(TimeRemaining),
    /// Event instant reached; attendance entry allowed
    Started,
}

impl EventPhase {
    pub fn at(now_ms: i64, event_ms: Option<i64>) -> Self {
        match (event_ms, time_remaining(now_ms, event_ms)) {
            (None, _) => EventPhase::Unconfigured,
            (Some(_), Some(remaining)) => EventPhase::Countdown(remaining),
            (Some(_), None) => EventPhase::Started,
        }
    }

    /// Attendance can be entered only once the event has started
    pub fn attendance_open(&self) -> bool {
        matches!(self, EventPhase::Started)
    }
}
