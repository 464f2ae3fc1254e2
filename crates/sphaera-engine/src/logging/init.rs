use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax
/// (e.g. "debug", "sphaera_engine::barrier=trace,wgpu_core=warn").
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

/// Filter used when neither the config nor `RUST_LOG` sets one.
/// wgpu and naga are chatty at info.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

static INIT: Once = Once::new();

/// Initializes the global logger once. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        let filter = config
            .env_filter
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        builder.parse_filters(&filter);
        builder.write_style(config.write_style);

        // A test harness may already own the global logger.
        if builder.try_init().is_ok() {
            log::debug!("logging initialized ({filter})");
        }
    });
}
