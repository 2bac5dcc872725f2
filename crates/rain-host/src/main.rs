//! Rain host: opens a window and runs a Lua game script on the engine.
//!
//! ```bash
//! rain-host scripts/main.lua --title "Demo" --size 960x540
//! RAIN_SCRIPT=game.lua rain-host --frames 600 --log debug
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use rain_engine::logging::{init_logging, LoggingConfig};
use rain_engine::EngineConfig;

#[derive(Parser)]
#[command(name = "rain-host")]
#[command(version = "0.1.0")]
#[command(about = "Runs a Lua game script on the rain engine")]
struct Cli {
    /// Script assembly to load
    #[arg(env = "RAIN_SCRIPT", default_value = "scripts/main.lua")]
    script: PathBuf,

    /// Window title
    #[arg(long)]
    title: Option<String>,

    /// Window size as WIDTHxHEIGHT
    #[arg(long, value_parser = parse_size)]
    size: Option<(u32, u32)>,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// Log filter in env_logger syntax (e.g. "info,rain_engine=debug")
    #[arg(long)]
    log: Option<String>,

    /// Present without waiting for vertical blank
    #[arg(long)]
    no_vsync: bool,
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w: u32 = w.trim().parse().map_err(|_| format!("bad width '{w}'"))?;
    let h: u32 = h.trim().parse().map_err(|_| format!("bad height '{h}'"))?;
    if w == 0 || h == 0 {
        return Err("window size must be non-zero".to_string());
    }
    Ok((w, h))
}

impl Cli {
    fn into_config(self) -> (EngineConfig, Option<u64>) {
        let mut config = EngineConfig::default();
        config.script.assembly = self.script;
        if let Some(title) = self.title {
            config.window.title = title;
        }
        if let Some((w, h)) = self.size {
            config.window.width = w;
            config.window.height = h;
        }
        config.window.vsync = !self.no_vsync;
        config.logging = LoggingConfig {
            env_filter: self.log,
            ..LoggingConfig::default()
        };
        (config, self.frames)
    }
}

fn run(config: &EngineConfig, frames: Option<u64>) -> anyhow::Result<()> {
    let report = rain_engine::engine::run(config, frames)
        .with_context(|| format!("failed to run {}", config.script.assembly.display()))?;
    log::info!(
        "exited after {} frames (entry ran: {}, destroy ran: {})",
        report.frames,
        report.entry_ran,
        report.destroy_ran
    );
    Ok(())
}

fn main() -> ExitCode {
    let (config, frames) = Cli::parse().into_config();
    init_logging(config.logging.clone());

    match run(&config, frames) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_parses_width_by_height() {
        assert_eq!(parse_size("960x540"), Ok((960, 540)));
        assert_eq!(parse_size("64X32"), Ok((64, 32)));
        assert!(parse_size("960").is_err());
        assert!(parse_size("0x10").is_err());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "rain-host", "game.lua", "--title", "T", "--size", "10x20", "--frames", "5",
        ]);
        let (config, frames) = cli.into_config();
        assert_eq!(config.script.assembly, PathBuf::from("game.lua"));
        assert_eq!(config.window.title, "T");
        assert_eq!((config.window.width, config.window.height), (10, 20));
        assert_eq!(frames, Some(5));
        assert!(config.window.vsync);
    }
}
