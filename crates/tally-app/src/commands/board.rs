//! tally board command

use chrono::Utc;
use clap::Args;
use shared::TallyConfig;
use tally_usecase::{Schedule, StoreEvent};
use tokio::sync::broadcast::error::RecvError;

use super::{live_store, settle};
use crate::render::render_board;
use crate::seed::apply_seed;

#[derive(Debug, Args)]
pub struct BoardCommand {
    /// Number of board refreshes before exiting (0 runs until Ctrl-C)
    #[arg(long, default_value_t = 1)]
    pub ticks: u64,
}

impl BoardCommand {
    pub async fn run(&self, config: &TallyConfig) -> anyhow::Result<()> {
        let (_gateway, store, handle) = live_store(config).await?;
        let mut events = store.events();
        if let Some(seed) = &config.seed {
            let expected = apply_seed(&store, seed).await?.len();
            settle(&store, &mut events, |s| s.sectors.len() >= expected).await;
        }

        let schedule = Schedule::from_offset_minutes(config.board.utc_offset_minutes);
        let mut interval = tokio::time::interval(config.board.tick_interval());
        let mut rendered = 0;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    println!("{}", render_board(&store.snapshot(), &schedule, Utc::now()));
                    rendered += 1;
                    if self.ticks != 0 && rendered >= self.ticks {
                        break;
                    }
                }
                event = events.recv() => match event {
                    Ok(StoreEvent::Degraded { feed, reason }) => {
                        tracing::warn!(%feed, %reason, "board showing stale data");
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(missed)) => {
                        tracing::debug!(missed, "board skipped store events");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("interrupted");
                    break;
                }
            }
        }

        handle.release();
        Ok(())
    }
}
