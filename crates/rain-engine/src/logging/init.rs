use std::sync::Once;

/// Log target used for lines produced by scripts through `Debug_Log`.
pub const SCRIPT_TARGET: &str = "script";

/// Module filters applied on top of the default level when neither the
/// config nor `RUST_LOG` names a filter. wgpu is chatty at info.
const QUIET_MODULES: [&str; 3] = ["wgpu_core", "wgpu_hal", "naga"];

/// Logger configuration.
///
/// `env_filter` uses the `env_logger` filter syntax, e.g.
/// "rain_engine=debug,script=info".
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
    /// Prefix lines with a timestamp. Off keeps script output easy to diff.
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
            timestamps: true,
        }
    }
}

/// Where the active filter came from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FilterSource {
    Config(String),
    Env(String),
    Default,
}

fn resolve_filter(configured: Option<String>, env: Option<String>) -> FilterSource {
    match (configured, env) {
        (Some(f), _) if !f.trim().is_empty() => FilterSource::Config(f),
        (_, Some(f)) if !f.trim().is_empty() => FilterSource::Env(f),
        _ => FilterSource::Default,
    }
}

static INIT: Once = Once::new();

/// Installs the global logger once; later calls are ignored.
///
/// The filter comes from `config.env_filter`, else `RUST_LOG`, else `info`
/// with the GPU stack quieted to `warn`.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        let source = resolve_filter(config.env_filter, std::env::var("RUST_LOG").ok());
        match &source {
            FilterSource::Config(filter) | FilterSource::Env(filter) => {
                builder.parse_filters(filter);
            }
            FilterSource::Default => {
                builder.filter_level(log::LevelFilter::Info);
                for module in QUIET_MODULES {
                    builder.filter_module(module, log::LevelFilter::Warn);
                }
            }
        }

        builder.write_style(config.write_style);
        if !config.timestamps {
            builder.format_timestamp(None);
        }

        // A test harness may already own the global logger.
        if builder.try_init().is_err() {
            return;
        }

        log::debug!("logging initialized ({source:?})");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_filter_wins_over_env() {
        let source = resolve_filter(Some("debug".into()), Some("warn".into()));
        assert_eq!(source, FilterSource::Config("debug".into()));
    }

    #[test]
    fn env_filter_used_when_config_is_blank() {
        let source = resolve_filter(Some("  ".into()), Some("warn".into()));
        assert_eq!(source, FilterSource::Env("warn".into()));
    }

    #[test]
    fn falls_back_to_default() {
        assert_eq!(resolve_filter(None, None), FilterSource::Default);
        assert_eq!(resolve_filter(None, Some(String::new())), FilterSource::Default);
    }
}
