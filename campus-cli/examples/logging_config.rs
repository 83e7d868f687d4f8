/// Example showing the logging presets and which categories they silence
///
/// Run with: cargo run --example logging_config
use campus::logging::{LogConfig, LogFeatures};
use log::LevelFilter;
use std::path::PathBuf;

fn describe(label: &str, config: &LogConfig) {
    println!("{}:", label);
    println!("   enabled: {}", config.enabled);
    println!("   level: {:?}", config.level);
    println!("   log_file: {:?}", config.log_file);
    println!("   silenced targets: {:?}\n", config.features.disabled_targets());
}

fn main() {
    println!("=== Campus Logging Configuration Examples ===\n");

    describe("1. Disabled logging", &LogConfig::disabled());
    describe("2. Minimal logging (errors/warnings only)", &LogConfig::minimal());
    describe("3. Verbose logging (all categories)", &LogConfig::verbose());

    // Only trace backend calls, written next to the binary
    let api_only = LogConfig {
        enabled: true,
        log_file: PathBuf::from("campus_api.log"),
        clear_on_startup: false,
        features: LogFeatures {
            api_calls: true,
            comments: false,
            storage: false,
            general: false,
        },
        level: LevelFilter::Debug,
    };
    describe("4. Custom: backend calls only", &api_only);
}
