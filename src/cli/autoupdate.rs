use clap::{Args, ValueEnum};

use crate::cli::State;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OnOff {
    On,
    Off,
}

/// Toggle the automatic update check
#[derive(Debug, Args)]
pub struct Autoupdate {
    setting: OnOff,
}

impl Autoupdate {
    pub async fn run(self, mut state: State) -> eyre::Result<()> {
        let enabled = matches!(self.setting, OnOff::On);
        state.config.set_auto_update(enabled, &state.data_root)?;
        println!("auto-update: {}", if enabled { "on" } else { "off" });
        Ok(())
    }
}
