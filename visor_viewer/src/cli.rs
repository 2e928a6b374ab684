use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, ensure};
use clap::Parser;
use visor_actors::Roster;
use visor_assets::AssetResolver;

use crate::install::InstallOptions;

#[derive(Parser, Debug)]
#[command(
    about = "Cycle, pose and inspect cog actors from extracted game phases",
    version
)]
pub struct Args {
    /// Directory holding the extracted phase_* folders (skips the prompt)
    #[arg(long, value_name = "DIR")]
    pub install_dir: Option<PathBuf>,

    /// File remembering the last install directory that mounted
    #[arg(long, default_value = "visor_install_dir.txt")]
    pub state_file: PathBuf,

    /// Drop the remembered install directory before starting
    #[arg(long)]
    pub forget_install_dir: bool,

    /// Roster JSON to use instead of the bundled one
    #[arg(long)]
    pub roster: Option<PathBuf>,

    /// Read viewer commands from this file instead of stdin
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Actor to show first, by roster index or name
    #[arg(long, value_name = "INDEX|NAME")]
    pub start: Option<String>,

    /// Frame count the headless scene reports for every animation
    #[arg(long, default_value_t = 24)]
    pub frame_count: u32,

    /// Playback rate in frames per second for every animation
    #[arg(long, default_value_t = 24.0)]
    pub frame_rate: f32,
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.frame_rate.is_finite() && self.frame_rate > 0.0,
            "--frame-rate must be positive (got {})",
            self.frame_rate
        );
        ensure!(self.frame_count > 0, "--frame-count must be at least 1");
        Ok(())
    }

    pub fn install_options(&self) -> InstallOptions {
        InstallOptions {
            install_dir: self.install_dir.clone(),
            state_file: self.state_file.clone(),
            forget: self.forget_install_dir,
        }
    }
}

pub fn load_roster<R>(path: Option<&Path>, assets: &R) -> Result<Roster>
where
    R: AssetResolver + ?Sized,
{
    let Some(path) = path else {
        return Roster::builtin(assets).context("loading bundled roster");
    };
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading roster {}", path.display()))?;
    Roster::from_json(&data, assets)
        .with_context(|| format!("parsing roster {}", path.display()))
}
