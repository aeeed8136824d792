//! Board rendering
//!
//! Plain text, one line per fact, so the board reads the same in a
//! terminal and in logs.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use tally_domain::EventPhase;
use tally_usecase::{Schedule, StorePhase, StoreSnapshot};

const NAME_WIDTH: usize = 16;
const MANAGER_WIDTH: usize = 14;

/// Render the board for `snapshot` as seen at `now`
pub fn render_board(snapshot: &StoreSnapshot, schedule: &Schedule, now: DateTime<Utc>) -> String {
    let mut out = String::new();

    if snapshot.phase != StorePhase::Live {
        out.push_str("Waiting for live data...\n");
        return out;
    }

    let event = snapshot
        .config
        .as_ref()
        .and_then(|config| schedule.describe(config))
        .unwrap_or_else(|| "not configured".to_string());
    let _ = writeln!(out, "Event:      {}", event);

    let status = match schedule.phase(snapshot.config.as_ref(), now) {
        EventPhase::Unconfigured => "counting closed (no event date)".to_string(),
        EventPhase::Countdown(remaining) => format!("starts in {}", remaining),
        EventPhase::Started => "counting open".to_string(),
    };
    let _ = writeln!(out, "Status:     {}", status);

    let tally = snapshot.tally;
    let _ = writeln!(
        out,
        "Attendees:  {} ({}/{} sectors counted, {}%)",
        tally.total_attendees(),
        tally.counted_sectors(),
        tally.sector_count(),
        tally.percent_counted()
    );

    for (feed, reason) in &snapshot.degraded {
        let _ = writeln!(out, "! {} feed degraded: {} (showing last known data)", feed, reason);
    }

    out.push('\n');
    if snapshot.sectors.is_empty() {
        out.push_str("  (no sectors)\n");
    }
    for sector in &snapshot.sectors {
        let count = sector
            .attendee_count()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "  {:<name$} {:<manager$} {:>6}",
            sector.name(),
            sector.manager(),
            count,
            name = NAME_WIDTH,
            manager = MANAGER_WIDTH
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tally_domain::{EventConfig, Sector, SectorId, Tally};
    use tally_usecase::Feed;

    fn snapshot(config: Option<EventConfig>, sectors: Vec<Sector>) -> StoreSnapshot {
        StoreSnapshot {
            phase: StorePhase::Live,
            tally: Tally::compute(&sectors),
            sectors,
            config,
            degraded: Vec::new(),
        }
    }

    fn sectors() -> Vec<Sector> {
        vec![
            Sector::new(SectorId::new("a"), "Platea", "Juan").with_attendee_count(Some(40)),
            Sector::new(SectorId::new("b"), "Pullman", "Ana"),
            Sector::new(SectorId::new("c"), "Palco", "Luis").with_attendee_count(Some(2)),
        ]
    }

    #[test]
    fn test_countdown_board() {
        let schedule = Schedule::from_offset_minutes(Some(0));
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 19, 58, 59).unwrap();
        let board = render_board(
            &snapshot(Some(EventConfig::new("2026-10-17", "21:00")), sectors()),
            &schedule,
            now,
        );

        assert!(board.contains("Event:      sábado, 17 de octubre de 2026 - 21:00hs"));
        assert!(board.contains("Status:     starts in 1d 01h 01m 01s"));
        assert!(board.contains("Attendees:  42 (2/3 sectors counted, 67%)"));
        assert!(board.contains("Pullman"));
        assert!(board.lines().any(|l| l.starts_with("  Pullman") && l.ends_with('-')));
    }

    #[test]
    fn test_started_and_unconfigured() {
        let schedule = Schedule::from_offset_minutes(Some(0));
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 22, 0, 0).unwrap();

        let board = render_board(
            &snapshot(Some(EventConfig::new("2026-10-17", "21:00")), vec![]),
            &schedule,
            now,
        );
        assert!(board.contains("counting open"));
        assert!(board.contains("(no sectors)"));

        let board = render_board(&snapshot(Some(EventConfig::empty()), vec![]), &schedule, now);
        assert!(board.contains("Event:      not configured"));
        assert!(board.contains("counting closed"));
    }

    #[test]
    fn test_degraded_and_waiting() {
        let schedule = Schedule::from_offset_minutes(Some(0));
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 22, 0, 0).unwrap();

        let mut degraded = snapshot(None, sectors());
        degraded.degraded = vec![(Feed::Sectors, "unavailable: offline".to_string())];
        let board = render_board(&degraded, &schedule, now);
        assert!(board.contains("! sectors feed degraded: unavailable: offline"));
        assert!(board.contains("Platea"));

        let mut waiting = snapshot(None, sectors());
        waiting.phase = StorePhase::Subscribing;
        assert_eq!(render_board(&waiting, &schedule, now), "Waiting for live data...\n");
    }
}
