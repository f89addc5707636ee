use std::process::ExitCode;

use clap::Parser;
use vr_ring::AppConfig;

#[derive(Parser)]
#[command(name = "vr_ring")]
#[command(about = "Curved virtual screen viewed through a simulated headset lens", long_about = None)]
#[command(version)]
struct Cli {
    /// Window width in pixels
    #[arg(long, default_value_t = 1200)]
    width: u32,

    /// Window height in pixels
    #[arg(long, default_value_t = 800)]
    height: u32,

    /// Ring tessellation segments per axis
    #[arg(long, default_value_t = 72)]
    segments: u32,

    /// Hide the reference floor
    #[arg(long)]
    no_floor: bool,

    /// Cull back faces of the ring (hides it from behind)
    #[arg(long)]
    cull_back_faces: bool,

    /// Present without waiting for vertical sync
    #[arg(long)]
    no_vsync: bool,

    /// Debug-level logging (RUST_LOG still wins)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> AppConfig {
        let mut config = AppConfig {
            window_width: self.width,
            window_height: self.height,
            vsync: !self.no_vsync,
            cull_back_faces: self.cull_back_faces,
            ..AppConfig::default()
        };
        config.ring.segments_u = self.segments;
        config.ring.segments_v = self.segments;
        config.floor.enabled = !self.no_floor;
        config
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    log::info!("vr_ring starting");

    match vr_ring::run(cli.into_config()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("vr_ring: {e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_overlay_defaults() {
        let cli = Cli::parse_from([
            "vr_ring",
            "--width",
            "640",
            "--segments",
            "8",
            "--no-floor",
            "--no-vsync",
        ]);
        let config = cli.into_config();
        assert_eq!((config.window_width, config.window_height), (640, 800));
        assert_eq!((config.ring.segments_u, config.ring.segments_v), (8, 8));
        assert!(!config.floor.enabled);
        assert!(!config.vsync);
        assert!(!config.cull_back_faces);
    }

    #[test]
    fn oversized_segments_fail_validation() {
        let config = Cli::parse_from(["vr_ring", "--segments", "65536"]).into_config();
        assert!(matches!(
            config.validate(),
            Err(vr_ring::ConfigError::TooManySegments { u: 65536, v: 65536, .. })
        ));
    }

    #[test]
    fn no_flags_match_defaults() {
        let config = Cli::parse_from(["vr_ring"]).into_config();
        assert_eq!(config, AppConfig::default());
    }
}
