//! tally init command

use anyhow::bail;
use clap::Args;
use shared::TallyConfig;
use std::path::PathBuf;

pub const CONFIG_FILE: &str = "tally.json";

#[derive(Debug, Args)]
pub struct InitCommand {
    /// Directory to write tally.json into
    #[arg(default_value = ".")]
    pub directory: PathBuf,

    /// Overwrite an existing tally.json
    #[arg(long)]
    pub force: bool,

    /// Leave out the example seed data
    #[arg(long)]
    pub minimal: bool,
}

impl InitCommand {
    pub fn run(&self) -> anyhow::Result<PathBuf> {
        let path = self.directory.join(CONFIG_FILE);
        if path.exists() && !self.force {
            bail!("{} already exists (use --force to overwrite)", path.display());
        }

        let config = if self.minimal {
            TallyConfig::default()
        } else {
            TallyConfig::example()
        };

        std::fs::create_dir_all(&self.directory)?;
        std::fs::write(&path, serde_json::to_string_pretty(&config)?)?;

        tracing::info!(path = %path.display(), "configuration written");
        println!("✓ Wrote {}", path.display());
        Ok(path)
    }
}
