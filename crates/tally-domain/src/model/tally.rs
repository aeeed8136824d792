//! Tally - The derived aggregate over the live sector set
//!
//! Never persisted. Recomputed from scratch every time a sector
//! snapshot is applied.

use super::sector::Sector;

/// Totals over a sector set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Sum of attendee counts, absent counts as 0
    total_attendees: u64,
    /// Sectors with a positive count
    counted_sectors: usize,
    /// Size of the sector set
    sector_count: usize,
}

impl Tally {
    /// Compute the aggregate for a sector set
    pub fn compute(sectors: &[Sector]) -> Self {
        let total_attendees = sectors
            .iter()
            .fold(0u64, |sum, s| sum.saturating_add(s.attendees()));
        let counted_sectors = sectors.iter().filter(|s| s.is_counted()).count();

        Self {
            total_attendees,
            counted_sectors,
            sector_count: sectors.len(),
        }
    }

    pub fn total_attendees(&self) -> u64 {
        self.total_attendees
    }

    pub fn counted_sectors(&self) -> usize {
        self.counted_sectors
    }

    pub fn sector_count(&self) -> usize {
        self.sector_count
    }

    /// Every sector has been counted. An empty set is never "all counted".
    pub fn all_counted(&self) -> bool {
        self.sector_count > 0 && self.counted_sectors == self.sector_count
    }

    /// Share of counted sectors, rounded half-up to a whole percent.
    pub fn percent_counted(&self) -> u8 {
        if self.sector_count == 0 {
            return 0;
        }
        let counted = self.counted_sectors as u64;
        let total = self.sector_count as u64;
        // round(100 * counted / total) in integer arithmetic
        ((counted * 200 + total) / (total * 2)) as u8
    }
}
