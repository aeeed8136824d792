//! tally demo command
//!
//! A scripted evening against the in-memory gateway: schedule the event,
//! set up sectors, open counting, record attendance, reset.

use std::time::Duration;

use chrono::{TimeDelta, Utc};
use clap::Args;
use shared::TallyConfig;
use tally_adapter::InMemoryGateway;
use tally_domain::coerce_attendance_input;
use tally_usecase::{EventStateStore, Schedule};

use super::{live_store, settle};
use crate::render::render_board;

#[derive(Debug, Args)]
pub struct DemoCommand {
    /// Pause between steps, in milliseconds
    #[arg(long, default_value_t = 0)]
    pub pause_ms: u64,
}

impl DemoCommand {
    pub async fn run(&self, config: &TallyConfig) -> anyhow::Result<()> {
        let (gateway, store, handle) = live_store(config).await?;
        let schedule = Schedule::from_offset_minutes(config.board.utc_offset_minutes);
        let mut events = store.events();

        // ========================================
        // The event is scheduled for tomorrow
        // ========================================

        let tomorrow = schedule.config_at(Utc::now() + TimeDelta::days(1));
        store.save_config(tomorrow.clone()).await?;
        let platea = store.add_sector("Platea", "Juan").await?;
        let pullman = store.add_sector("Pullman", "Ana").await?;
        store.add_sector("Palco", "Luis").await?;
        settle(&store, &mut events, |s| {
            s.sectors.len() == 3 && s.config.as_ref() == Some(&tomorrow)
        })
        .await;
        self.show(&store, &schedule, "Event scheduled").await;

        if !schedule.phase(store.config().as_ref(), Utc::now()).attendance_open() {
            println!("Attendance entry stays closed until the event starts.");
        }

        if let Err(e) = store.add_sector("", "Juan").await {
            println!("Rejected sector without a name: {}", e);
        }

        // ========================================
        // Doors open
        // ========================================

        let started = schedule.config_at(Utc::now() - TimeDelta::minutes(1));
        store.save_config(started.clone()).await?;
        settle(&store, &mut events, |s| s.config.as_ref() == Some(&started)).await;

        if schedule.phase(store.config().as_ref(), Utc::now()).attendance_open() {
            store
                .record_attendance(&platea, coerce_attendance_input("120"))
                .await?;
            store
                .record_attendance(&pullman, coerce_attendance_input("85.9"))
                .await?;
        }
        settle(&store, &mut events, |s| s.tally.counted_sectors() == 2).await;
        self.show(&store, &schedule, "Counting in progress").await;

        // ========================================
        // Back to a clean slate
        // ========================================

        store.reset_all().await?;
        settle(&store, &mut events, |s| {
            s.tally.total_attendees() == 0
                && s.config.as_ref().map(|c| !c.is_configured()).unwrap_or(true)
        })
        .await;
        self.show(&store, &schedule, "After reset").await;

        let stats = gateway.stats();
        tracing::info!(
            creates = stats.creates,
            updates = stats.updates,
            deletes = stats.deletes,
            document_sets = stats.document_sets,
            "demo finished"
        );

        handle.release();
        Ok(())
    }

    async fn show(&self, store: &EventStateStore<InMemoryGateway>, schedule: &Schedule, title: &str) {
        println!("\n== {} ==", title);
        println!("{}", render_board(&store.snapshot(), schedule, Utc::now()));
        if self.pause_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.pause_ms)).await;
        }
    }
}
