//! Schedule - Turning the configured date and time into an event instant
//!
//! The admin enters a calendar date (`YYYY-MM-DD`) and a time of day
//! (`HH:MM`) in the venue's wall-clock time. The countdown and the
//! "attendance entry allowed" gate both hang off the resulting instant.

use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use tally_domain::{EventConfig, EventPhase};

const WEEKDAYS: [&str; 7] = [
    "lunes",
    "martes",
    "miércoles",
    "jueves",
    "viernes",
    "sábado",
    "domingo",
];

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Combine date and time into an instant in `tz`.
///
/// `None` when either field is missing, does not parse, or names a
/// wall-clock time that does not exist in `tz` (a DST gap).
pub fn event_instant<Tz: TimeZone>(config: &EventConfig, tz: &Tz) -> Option<DateTime<Tz>> {
    if !config.is_configured() {
        return None;
    }

    let date = match NaiveDate::parse_from_str(config.date().trim(), "%Y-%m-%d") {
        Ok(date) => date,
        Err(e) => {
            tracing::debug!(date = config.date(), error = %e, "event date does not parse");
            return None;
        }
    };
    let time = match NaiveTime::parse_from_str(config.time().trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(config.time().trim(), "%H:%M:%S"))
    {
        Ok(time) => time,
        Err(e) => {
            tracing::debug!(time = config.time(), error = %e, "event time does not parse");
            return None;
        }
    };

    tz.from_local_datetime(&date.and_time(time)).earliest()
}

/// Where the event stands at `now`
pub fn event_phase<Tz: TimeZone>(
    config: Option<&EventConfig>,
    now: DateTime<Utc>,
    tz: &Tz,
) -> EventPhase {
    let event_ms = config
        .and_then(|c| event_instant(c, tz))
        .map(|instant| instant.timestamp_millis());
    EventPhase::at(now.timestamp_millis(), event_ms)
}

/// Long Spanish date, e.g. `sábado, 17 de octubre de 2026`
pub fn format_event_date<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    let weekday = WEEKDAYS[instant.weekday().num_days_from_monday() as usize];
    let month = MONTHS[instant.month0() as usize];
    format!(
        "{}, {} de {} de {}",
        weekday,
        instant.day(),
        month,
        instant.year()
    )
}

fn config_in<Tz: TimeZone>(instant: &DateTime<Tz>) -> EventConfig
where
    Tz::Offset: std::fmt::Display,
{
    EventConfig::new(
        instant.format("%Y-%m-%d").to_string(),
        instant.format("%H:%M").to_string(),
    )
}

/// The time zone event dates are read in: the machine's, or a fixed offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    offset: Option<FixedOffset>,
}

impl Schedule {
    /// Use the machine's local time zone
    pub fn local() -> Self {
        Self { offset: None }
    }

    pub fn fixed(offset: FixedOffset) -> Self {
        Self {
            offset: Some(offset),
        }
    }

    /// `None` or an out-of-range offset falls back to local time
    pub fn from_offset_minutes(minutes: Option<i32>) -> Self {
        match minutes.and_then(|m| FixedOffset::east_opt(m * 60)) {
            Some(offset) => Self::fixed(offset),
            None => Self::local(),
        }
    }

    pub fn event_instant(&self, config: &EventConfig) -> Option<DateTime<Utc>> {
        match self.offset {
            Some(offset) => event_instant(config, &offset).map(|i| i.with_timezone(&Utc)),
            None => event_instant(config, &Local).map(|i| i.with_timezone(&Utc)),
        }
    }

    pub fn phase(&self, config: Option<&EventConfig>, now: DateTime<Utc>) -> EventPhase {
        match self.offset {
            Some(offset) => event_phase(config, now, &offset),
            None => event_phase(config, now, &Local),
        }
    }

    /// The config that schedules the event at `instant`, to the minute
    pub fn config_at(&self, instant: DateTime<Utc>) -> EventConfig {
        match self.offset {
            Some(offset) => config_in(&instant.with_timezone(&offset)),
            None => config_in(&instant.with_timezone(&Local)),
        }
    }

    /// Display line for the configured event, e.g.
    /// `sábado, 17 de octubre de 2026 - 21:00hs`
    pub fn describe(&self, config: &EventConfig) -> Option<String> {
        let date = match self.offset {
            Some(offset) => event_instant(config, &offset).map(|i| format_event_date(&i)),
            None => event_instant(config, &Local).map(|i| format_event_date(&i)),
        }?;
        Some(format!("{} - {}hs", date, config.time().trim()))
    }
}
