use std::sync::Once;

/// Filter applied when neither the config nor `RUST_LOG` names one.
///
/// Batch exports run for thousands of frames; wgpu's internal targets log
/// per-submission detail that would drown the per-export progress lines, so
/// they are capped at warn. Per-file detail stays at debug either way.
const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g.
/// "iconforge_engine=debug,wgpu_core=warn").
///
/// `write_style` controls ANSI coloring behavior.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once.
///
/// Filter precedence: explicit config, then `RUST_LOG`, then
/// [`DEFAULT_FILTER`]. Idempotent; intended usage is early in `main`.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = config.env_filter {
            builder.parse_filters(&filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.parse_filters(DEFAULT_FILTER);
        }

        builder.write_style(config.write_style);

        builder.init();

        log::debug!("logging initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_quiets_gpu_internals() {
        assert!(DEFAULT_FILTER.starts_with("info"));
        for noisy in ["wgpu_core=warn", "wgpu_hal=warn", "naga=warn"] {
            assert!(DEFAULT_FILTER.contains(noisy), "missing {noisy}");
        }
    }

    #[test]
    fn default_config_defers_to_filter_resolution() {
        let config = LoggingConfig::default();
        assert!(config.env_filter.is_none());
    }
}
