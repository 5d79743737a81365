//! Build script for stylus-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates plotter.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Keys accepted per section, with the integer range where one applies
const MOTION_KEYS: &[(&str, i64, i64)] = &[
    ("tick_hz", 1_000, 100_000),
    ("min_frequency_hz", 1, 100_000),
    ("max_frequency_hz", 1, 100_000),
    ("min_secondary_rate_centihz", 1, 100_000),
    ("arc_segment_steps", 1, 1_000),
];
const QUEUE_KEYS: &[(&str, i64, i64)] = &[("depth", 1, 64)];
const PROTOCOL_KEYS: &[&str] = &["checksum", "ok_replies", "echo_replies"];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate plotter.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=plotter.toml");

    let config_path = Path::new("plotter.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: plotter.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds a plotter.toml configuration file.          ║\n\
            ║  Please create one in the stylus-firmware directory.             ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read plotter.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in plotter.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_sections(&config, &mut errors);
    validate_integers(&config, "motion", MOTION_KEYS, &mut errors);
    validate_integers(&config, "queue", QUEUE_KEYS, &mut errors);
    validate_flags(&config, &mut errors);
    validate_frequency_range(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid plotter configuration                            ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=plotter.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Only `[motion]`, `[queue]` and `[protocol]` tables are understood
fn validate_sections(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(root) = config.as_table() else {
        return;
    };
    for (name, value) in root {
        if !["motion", "queue", "protocol"].contains(&name.as_str()) {
            errors.push(format!("unknown section [{}]", name));
        } else if !value.is_table() {
            errors.push(format!("[{}] must be a table", name));
        }
    }
}

fn validate_integers(
    config: &toml::Value,
    section: &str,
    keys: &[(&str, i64, i64)],
    errors: &mut Vec<String>,
) {
    let Some(table) = config.get(section).and_then(|s| s.as_table()) else {
        return;
    };
    for (key, value) in table {
        let Some(&(_, min, max)) = keys.iter().find(|(k, _, _)| k == key) else {
            errors.push(format!("[{}] unknown key '{}'", section, key));
            continue;
        };
        match value {
            toml::Value::Integer(n) if (min..=max).contains(n) => {}
            toml::Value::Integer(_) => {
                errors.push(format!("[{}] {} must be {}-{}", section, key, min, max));
            }
            _ => errors.push(format!("[{}] {} must be an integer", section, key)),
        }
    }
}

fn validate_flags(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(table) = config.get("protocol").and_then(|s| s.as_table()) else {
        return;
    };
    for (key, value) in table {
        if !PROTOCOL_KEYS.contains(&key.as_str()) {
            errors.push(format!("[protocol] unknown key '{}'", key));
        } else if !value.is_bool() {
            errors.push(format!("[protocol] {} must be true or false", key));
        }
    }
}

/// The HM/CM frequency window must sit inside the tick rate
fn validate_frequency_range(config: &toml::Value, errors: &mut Vec<String>) {
    let motion = config.get("motion");
    let get = |key: &str, default: i64| {
        motion
            .and_then(|m| m.get(key))
            .and_then(|v| v.as_integer())
            .unwrap_or(default)
    };
    let tick_hz = get("tick_hz", 25_000);
    let min = get("min_frequency_hz", 2);
    let max = get("max_frequency_hz", 25_000);

    if min > max {
        errors.push("[motion] min_frequency_hz exceeds max_frequency_hz".to_string());
    }
    if max > tick_hz {
        errors.push("[motion] max_frequency_hz exceeds tick_hz".to_string());
    }
}
