use crate::publisher::Publisher;
use airbolt_hub::{Hub, TrackerApi};
use anyhow::Context;
use hass_mqtt_client::{HassMqttClient, HassStatus};
use std::{error::Error, time::Duration};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Poll the hub and mirror it to Home Assistant until interrupted.
pub async fn run<A: TrackerApi>(
	mut hub: Hub<A>,
	client: HassMqttClient,
	poll_interval: Duration,
) -> anyhow::Result<()> {
	let hass_status = client
		.hass_status()
		.await
		.context("failed to subscribe to Home Assistant status")?;
	let mut publisher = Publisher::new(client);

	let mut ticker = time::interval(poll_interval);
	ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

	let shutdown = tokio::signal::ctrl_c();
	tokio::pin!(shutdown);

	info!(interval = ?poll_interval, "bridge started");
	loop {
		tokio::select! {
			result = &mut shutdown => {
				result.context("failed to listen for shutdown signal")?;
				info!("shutting down");
				break;
			}

			_ = ticker.tick() => {
				let report = match hub.refresh().await {
					Ok(report) => report,
					Err(e) => {
						error!(error = &e as &dyn Error, "refresh failed");
						continue;
					}
				};

				if let Err(e) = publisher.sync(hub.trackers(), &report).await {
					error!(error = &e as &dyn Error, "failed to publish trackers");
				}
			}

			message = hass_status.recv() => {
				let Some(message) = message else {
					warn!("Home Assistant status subscription closed");
					break;
				};

				match HassStatus::from_payload(message.payload()) {
					Some(HassStatus::Online) => {
						info!("Home Assistant came online, announcing trackers again");
						if let Err(e) = publisher.republish(hub.trackers()).await {
							error!(error = &e as &dyn Error, "failed to republish trackers");
						}
					}
					status => debug!(?status, "ignoring Home Assistant status"),
				}
			}
		}
	}

	publisher
		.client()
		.disconnect(DISCONNECT_TIMEOUT)
		.await
		.context("failed to disconnect from MQTT broker")
}
