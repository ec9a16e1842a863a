use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use super::TracingConfig;

/// Installs the global subscriber. `RUST_LOG` overrides the configured
/// directive.
pub fn init_tracing(config: &TracingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_directive));

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.json_format {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_target(true),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }

    tracing::info!(
        environment = %config.environment,
        json_format = config.json_format,
        "Tracing initialized"
    );
}
