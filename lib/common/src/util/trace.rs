use super::time::elapsed_subsec;
use crate::AdvisorConfig;
use anyhow::Result;
use indicatif::ProgressStyle;
use tracing::instrument;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber: formatted logs filtered at the configured
/// level, plus progress spans for the long-running search phases.
///
/// Calling this more than once is harmless; only the first call installs a subscriber.
#[instrument(skip(config))]
pub fn initialize_tracing(config: &AdvisorConfig) -> Result<()> {
    let filter = EnvFilter::try_new(config.log_level())?;

    let indicatif_layer = IndicatifLayer::new()
        .with_progress_style(
            ProgressStyle::with_template(
                "{span_child_prefix}{span_fields} -- {span_name} {wide_msg} {elapsed_subsec}",
            )?
            .with_key("elapsed_subsec", elapsed_subsec),
        )
        .with_span_child_prefix_symbol("↳ ")
        .with_span_child_prefix_indent(" ");

    if tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(indicatif_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("Tracing subscriber already installed");
    }

    Ok(())
}
