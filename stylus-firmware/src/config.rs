//! Embedded plotter configuration

use defmt::*;

use stylus_core::config::{parse_config, MotionConfig};

/// Embedded configuration (compiled into firmware)
/// Edit plotter.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../plotter.toml");

/// Parse the embedded configuration, falling back to built-in defaults
pub fn load() -> MotionConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!(
                "Parsed embedded configuration: tick {} Hz, queue depth {}",
                config.motion.tick_hz, config.queue.depth
            );
            config
        }
        Err(e) => {
            // build.rs validates plotter.toml, so this only trips on keys
            // the firmware parser and the build check disagree about
            error!("Failed to parse embedded config: {:?}", e);
            error!("Using built-in defaults");
            MotionConfig::default()
        }
    }
}
