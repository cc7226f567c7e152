//! Logging setup
//!
//! Terraform captures the plugin's stderr, stdout is reserved for the
//! handshake. The level follows `TF_LOG_PROVIDER`, then `TF_LOG`, then
//! `RUST_LOG`.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn";

/// Filter directive derived from Terraform's log environment
pub fn filter_directive(debug: bool) -> String {
    if debug {
        return "debug".to_string();
    }

    ["TF_LOG_PROVIDER", "TF_LOG"]
        .iter()
        .find_map(|key| std::env::var(key).ok().and_then(|v| terraform_level(&v)))
        .or_else(|| std::env::var("RUST_LOG").ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

fn terraform_level(value: &str) -> Option<String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "off" => None,
        // TF_LOG=JSON means trace output in JSON
        "json" => Some("trace".to_string()),
        level @ ("trace" | "debug" | "info" | "warn" | "error") => Some(level.to_string()),
        _ => None,
    }
}

/// Install the global subscriber writing to stderr
pub fn init(debug: bool) {
    let filter = EnvFilter::try_new(filter_directive(debug))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_provider_level_wins() {
        temp_env::with_vars(
            [
                ("TF_LOG_PROVIDER", Some("TRACE")),
                ("TF_LOG", Some("ERROR")),
                ("RUST_LOG", Some("info")),
            ],
            || assert_eq!(filter_directive(false), "trace"),
        );
    }

    #[test]
    #[serial]
    fn test_falls_back_to_rust_log() {
        temp_env::with_vars(
            [
                ("TF_LOG_PROVIDER", None),
                ("TF_LOG", Some("off")),
                ("RUST_LOG", Some("cloudbit_provider=debug")),
            ],
            || assert_eq!(filter_directive(false), "cloudbit_provider=debug"),
        );
    }

    #[test]
    #[serial]
    fn test_default_and_debug() {
        temp_env::with_vars(
            [
                ("TF_LOG_PROVIDER", None::<&str>),
                ("TF_LOG", None),
                ("RUST_LOG", None),
            ],
            || {
                assert_eq!(filter_directive(false), "warn");
                assert_eq!(filter_directive(true), "debug");
            },
        );
    }
}
