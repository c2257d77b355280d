mod bridge;
mod config;
mod discovery;
mod logging;
mod publisher;

use airbolt_api::AirboltClient;
use airbolt_hub::Hub;
use anyhow::Context;
use clap::Parser;
use config::BridgeConfig;
use std::{path::PathBuf, process::ExitCode};
use tracing::info;

/// Publish Airbolt GPS trackers to Home Assistant over MQTT.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
	/// Configuration file, merged over the global one.
	#[arg(short, long, value_name = "FILE")]
	config: Option<PathBuf>,

	/// Log in to Airbolt, print the account name and exit.
	#[arg(long)]
	check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
	match run(Cli::parse()).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(error) => {
			eprintln!("Error: {error:?}");
			ExitCode::FAILURE
		}
	}
}

async fn run(cli: Cli) -> anyhow::Result<()> {
	let config = BridgeConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
	logging::init(&config.log.filter)?;

	let api = AirboltClient::new(config.airbolt.api_options()).context("failed to create Airbolt client")?;
	let mut hub = Hub::new(api, config.airbolt.credentials());

	if cli.check {
		let name = hub
			.verify_credentials()
			.await
			.context("failed to verify Airbolt credentials")?;
		println!("logged in as {name}");
		return Ok(());
	}

	let client = config
		.mqtt
		.options()
		.build()
		.await
		.context("failed to connect to MQTT broker")?;
	info!(client_id = client.client_id(), "connected to MQTT broker");

	bridge::run(hub, client, config.airbolt.poll_interval()).await
}
