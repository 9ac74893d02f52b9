use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` uses `env_logger` filter syntax, e.g. `"geostream_engine=debug,wgpu=warn"`.
/// When unset, `RUST_LOG` is consulted, then [`LoggingConfig::DEFAULT_FILTER`].
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl LoggingConfig {
    /// wgpu logs every pipeline and buffer at info; keep it to warnings.
    pub const DEFAULT_FILTER: &'static str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self {
            env_filter: Some(filter.into()),
            ..Self::default()
        }
    }

    fn resolve_filter(&self, rust_log: Option<String>) -> String {
        self.env_filter
            .clone()
            .or(rust_log)
            .unwrap_or_else(|| Self::DEFAULT_FILTER.to_string())
    }
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

/// Installs the global logger. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = config.resolve_filter(std::env::var("RUST_LOG").ok());

        env_logger::Builder::new()
            .parse_filters(&filter)
            .write_style(config.write_style)
            .format_timestamp_millis()
            .init();

        log::debug!("logging initialized with `{filter}`");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins() {
        let cfg = LoggingConfig::with_filter("debug");
        assert_eq!(cfg.resolve_filter(Some("trace".into())), "debug");
    }

    #[test]
    fn rust_log_beats_default() {
        let cfg = LoggingConfig::default();
        assert_eq!(cfg.resolve_filter(Some("warn".into())), "warn");
        assert_eq!(cfg.resolve_filter(None), LoggingConfig::DEFAULT_FILTER);
    }
}
