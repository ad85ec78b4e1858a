//! CLI command implementations

pub mod apply;
pub mod chaos;
pub mod lut;
pub mod preset;

use anyhow::{Context, Result, bail};
use lumen_chaos::ChaosConfig;
use lumen_lut::{Channel, CurvePreset};
use std::path::Path;

/// Load a curve preset
pub fn load_preset(path: &Path) -> Result<CurvePreset> {
    lumen_lut::read_xmp(path).with_context(|| format!("Failed to read preset: {}", path.display()))
}

/// Load chaos settings, or the defaults when no file is given
pub fn load_chaos_config(path: Option<&Path>) -> Result<ChaosConfig> {
    match path {
        Some(path) => {
            ChaosConfig::load(path).with_context(|| format!("Failed to load chaos config: {}", path.display()))
        }
        None => Ok(ChaosConfig::default()),
    }
}

/// Parse a curve channel name
pub fn parse_channel(name: &str) -> Result<Channel> {
    match Channel::parse(name) {
        Some(channel) => Ok(channel),
        None => bail!("Unknown channel '{}' (expected rgb, red, green or blue)", name),
    }
}

/// Format milliseconds as `h:mm:ss.mmm`
pub fn format_ms(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}:{:02}.{:03}", secs / 3600, secs / 60 % 60, secs % 60, ms % 1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps() {
        assert_eq!(format_ms(0), "0:00:00.000");
        assert_eq!(format_ms(61_250), "0:01:01.250");
        assert_eq!(format_ms(3_600_000 + 59_000), "1:00:59.000");
    }

    #[test]
    fn channels() {
        assert_eq!(parse_channel("R").unwrap(), Channel::Red);
        assert!(parse_channel("alpha").is_err());
    }

    #[test]
    fn missing_chaos_config_defaults() {
        assert_eq!(load_chaos_config(None).unwrap(), ChaosConfig::default());
        assert!(load_chaos_config(Some(Path::new("/nonexistent/chaos.yaml"))).is_err());
    }
}
