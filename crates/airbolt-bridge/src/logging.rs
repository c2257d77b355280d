use anyhow::Context;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, Registry, prelude::*};
use tracing_tree::HierarchicalLayer;

/// Install the global subscriber. `RUST_LOG` wins over the configured filter.
pub fn init(filter: &str) -> anyhow::Result<()> {
	let filter = match EnvFilter::try_from_default_env() {
		Ok(filter) => filter,
		Err(_) => EnvFilter::try_new(filter).with_context(|| format!("invalid log filter '{filter}'"))?,
	};

	Registry::default()
		.with(filter)
		.with(
			HierarchicalLayer::new(2)
				.with_targets(true)
				.with_bracketed_fields(true),
		)
		.with(ErrorLayer::default())
		.try_init()
		.context("failed to install tracing subscriber")
}
