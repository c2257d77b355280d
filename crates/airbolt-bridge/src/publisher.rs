use crate::discovery::{
	DEVICE_TRACKER_COMPONENT, SENSOR_COMPONENT, TrackerTopics, location_document, sensor_document,
};
use airbolt_hub::{
	RefreshReport, Tracker,
	location::{self, LocationAttributes},
	sensor,
};
use hass_mqtt_client::{
	EntityCommandError, EntityPublishError, HassMqttClient, PublishCommandError, QosLevel,
};
use std::{collections::BTreeSet, error::Error as StdError, mem};
use thiserror::Error;
use tracing::{Level, debug, info, instrument, warn};

#[derive(Debug, Error)]
pub enum PublishError {
	#[error("failed to resolve entity topics for '{unique_id}'")]
	Entity {
		unique_id: String,
		source: EntityCommandError,
	},

	#[error(transparent)]
	Discovery(#[from] EntityPublishError),

	#[error("failed to publish state of tracker '{tracker}'")]
	State {
		tracker: String,
		source: PublishCommandError,
	},

	#[error("failed to serialize state of tracker '{tracker}'")]
	Serialize {
		tracker: String,
		source: serde_json::Error,
	},
}

/// Failures of one [Publisher::sync]. Each entry concerns a single tracker;
/// the others were still published.
#[derive(Debug, Error)]
#[error("failed to publish {} tracker update(s)", errors.len())]
pub struct SyncError {
	pub errors: Vec<PublishError>,
}

/// Mirrors hub state to Home Assistant.
pub struct Publisher {
	client: HassMqttClient,
	announced: BTreeSet<String>,
	/// Trackers whose entities could not be removed yet.
	pending_removals: BTreeSet<String>,
}

impl Publisher {
	pub fn new(client: HassMqttClient) -> Self {
		Self {
			client,
			announced: BTreeSet::new(),
			pending_removals: BTreeSet::new(),
		}
	}

	pub fn client(&self) -> &HassMqttClient {
		&self.client
	}

	fn topics(&self, tracker_id: &str) -> TrackerTopics {
		TrackerTopics {
			state: self.client.node_topic(format!("{tracker_id}/state")),
			attributes: self.client.node_topic(format!("{tracker_id}/attributes")),
			availability: self.client.availability_topic(),
		}
	}

	/// Publish the discovery documents of every entity of a tracker.
	#[instrument(level = Level::DEBUG, skip_all, fields(tracker = tracker.id()))]
	pub async fn announce(&mut self, tracker: &Tracker) -> Result<(), PublishError> {
		let topics = self.topics(tracker.id());

		for sensor in sensor::ALL {
			let unique_id = sensor.unique_id(tracker);
			let entity = self
				.client
				.entity(SENSOR_COMPONENT, unique_id.as_str())
				.await
				.map_err(|source| PublishError::Entity { unique_id, source })?;

			entity
				.publish_discovery(&sensor_document(tracker, *sensor, &topics))
				.await?;
		}

		let unique_id = location::unique_id(tracker);
		let entity = self
			.client
			.entity(DEVICE_TRACKER_COMPONENT, unique_id.as_str())
			.await
			.map_err(|source| PublishError::Entity { unique_id, source })?;

		entity
			.publish_discovery(&location_document(tracker, &topics))
			.await?;

		self.announced.insert(tracker.id().to_owned());
		info!(tracker = tracker.id(), name = tracker.name(), "announced tracker");
		Ok(())
	}

	/// Publish the retained sensor state and location attributes of a tracker.
	#[instrument(level = Level::DEBUG, skip_all, fields(tracker = tracker.id()))]
	pub async fn publish_state(&self, tracker: &Tracker) -> Result<(), PublishError> {
		let topics = self.topics(tracker.id());
		let serialize = |source| PublishError::Serialize {
			tracker: tracker.id().to_owned(),
			source,
		};
		let publish = |source| PublishError::State {
			tracker: tracker.id().to_owned(),
			source,
		};

		let state = serde_json::to_vec(&sensor::states(tracker)).map_err(serialize)?;
		self
			.client
			.publish(topics.state, state, true, QosLevel::AtLeastOnce)
			.await
			.map_err(publish)?;

		let attributes =
			serde_json::to_vec(&LocationAttributes::new(tracker)).map_err(serialize)?;
		self
			.client
			.publish(topics.attributes, attributes, true, QosLevel::AtLeastOnce)
			.await
			.map_err(publish)?;

		Ok(())
	}

	/// Remove every entity of a tracker that is no longer on the account.
	#[instrument(level = Level::DEBUG, skip(self))]
	pub async fn remove(&mut self, tracker_id: &str) -> Result<(), PublishError> {
		let unique_ids = sensor::ALL
			.iter()
			.map(|sensor| (SENSOR_COMPONENT, format!("{tracker_id}_{}", sensor.metric())))
			.chain([(DEVICE_TRACKER_COMPONENT, format!("{tracker_id}_{}", location::METRIC))]);

		for (component, unique_id) in unique_ids {
			let entity = match self.client.entity(component, unique_id.as_str()).await {
				Ok(entity) => entity,
				Err(source) => return Err(PublishError::Entity { unique_id, source }),
			};

			entity.remove().await.map_err(|source| PublishError::State {
				tracker: tracker_id.to_owned(),
				source,
			})?;
		}

		let topics = self.topics(tracker_id);
		for topic in [topics.state, topics.attributes] {
			self
				.client
				.publish(topic, Vec::new(), true, QosLevel::AtLeastOnce)
				.await
				.map_err(|source| PublishError::State {
					tracker: tracker_id.to_owned(),
					source,
				})?;
		}

		self.announced.remove(tracker_id);
		info!(tracker = tracker_id, "removed tracker");
		Ok(())
	}

	async fn update(&mut self, tracker: &Tracker) -> Result<(), PublishError> {
		if !self.announced.contains(tracker.id()) {
			self.announce(tracker).await?;
		}

		self.publish_state(tracker).await
	}

	/// Bring Home Assistant in line with the result of a refresh.
	///
	/// A failing tracker does not hold back the others. Removals that fail are
	/// kept and retried on the next sync.
	pub async fn sync<'t>(
		&mut self,
		trackers: impl IntoIterator<Item = &'t Tracker>,
		report: &RefreshReport,
	) -> Result<(), SyncError> {
		let mut errors = Vec::new();
		let mut current = BTreeSet::new();

		for tracker in trackers {
			current.insert(tracker.id());
			if let Err(e) = self.update(tracker).await {
				warn!(tracker = tracker.id(), error = &e as &dyn StdError, "failed to publish tracker");
				errors.push(e);
			}
		}

		self.pending_removals.extend(report.removed.iter().cloned());
		self.pending_removals.retain(|id| !current.contains(id.as_str()));

		for id in mem::take(&mut self.pending_removals) {
			if let Err(e) = self.remove(&id).await {
				warn!(tracker = %id, error = &e as &dyn StdError, "failed to remove tracker, will retry");
				self.pending_removals.insert(id);
				errors.push(e);
			}
		}

		debug!(
			announced = self.announced.len(),
			pending_removals = self.pending_removals.len(),
			"synchronized trackers"
		);

		if errors.is_empty() {
			Ok(())
		} else {
			Err(SyncError { errors })
		}
	}

	/// Announce and publish everything again, after Home Assistant restarted.
	pub async fn republish<'t>(
		&mut self,
		trackers: impl IntoIterator<Item = &'t Tracker>,
	) -> Result<(), SyncError> {
		self.announced.clear();
		self.sync(trackers, &RefreshReport::default()).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use airbolt_api::{DeviceHistoryPage, FoundDeviceList, schema::decode};
	use hass_mqtt_client::{
		HassMqttOptions,
		memory::{Broker, MemoryMqtt},
	};
	use serde_json::json;
	use std::time::Duration;

	const DEVICES: &[u8] = include_bytes!("../../airbolt-api/fixtures/devices.json");
	const HISTORY: &[u8] = include_bytes!("../../airbolt-api/fixtures/history.json");

	const BACKPACK: &str = "63f1c0ffee0000000000a001";

	fn backpack() -> Tracker {
		let devices: FoundDeviceList = decode(DEVICES).unwrap();
		let history: DeviceHistoryPage = decode(HISTORY).unwrap();
		Tracker::new(&devices[0], history.data.first())
	}

	fn tracker(id: &str, name: &str) -> Tracker {
		let devices: FoundDeviceList = decode(DEVICES).unwrap();
		let mut device = devices.into_iter().next().unwrap();
		device.id = id.into();
		device.name = name.into();
		Tracker::new(&device, None)
	}

	async fn publisher(host: &str) -> (Publisher, Broker) {
		let options = HassMqttOptions::new(host, "airbolt-bridge")
			.private_prefix("airbolt")
			.in_memory_persistence();
		let client = HassMqttClient::new::<MemoryMqtt>(options)
			.await
			.expect("should connect");

		(Publisher::new(client), Broker::for_host(host))
	}

	fn discovery_topic(component: &str, metric: &str) -> String {
		format!("homeassistant/{component}/default/{BACKPACK}_{metric}/config")
	}

	#[tokio::test]
	async fn announces_every_entity() {
		let (mut publisher, broker) = publisher("announce.bridge.test").await;
		let tracker = backpack();

		publisher.announce(&tracker).await.expect("should announce");

		for sensor in sensor::ALL {
			let published = broker.published_to(&discovery_topic(SENSOR_COMPONENT, sensor.metric()));
			assert_eq!(published.len(), 1, "{} announced once", sensor.metric());
			assert!(published[0].retained);
		}

		let published = broker.published_to(&discovery_topic(DEVICE_TRACKER_COMPONENT, location::METRIC));
		assert_eq!(published.len(), 1);
		let document: serde_json::Value = serde_json::from_slice(&published[0].payload).unwrap();
		assert_eq!(
			document["json_attributes_topic"],
			format!("airbolt/default/{BACKPACK}/attributes")
		);
	}

	#[tokio::test]
	async fn publishes_retained_state() {
		let (publisher, broker) = publisher("state.bridge.test").await;
		let tracker = backpack();

		publisher.publish_state(&tracker).await.expect("should publish");

		let state = broker.published_to(&format!("airbolt/default/{BACKPACK}/state"));
		assert_eq!(state.len(), 1);
		assert!(state[0].retained);
		let state: serde_json::Value = serde_json::from_slice(&state[0].payload).unwrap();
		assert_eq!(state["battery_percent"], json!(48));
		assert_eq!(state["last_seen"], json!("2024-05-02T15:00:00Z"));

		let attributes = broker.published_to(&format!("airbolt/default/{BACKPACK}/attributes"));
		assert_eq!(attributes.len(), 1);
		let attributes: serde_json::Value = serde_json::from_slice(&attributes[0].payload).unwrap();
		assert_eq!(attributes["address"], "1 Harbour St, Sydney NSW");
		assert_eq!(attributes["gps_accuracy"], json!(12.5));
	}

	#[tokio::test]
	async fn sync_announces_new_trackers_once() {
		let (mut publisher, broker) = publisher("sync.bridge.test").await;
		let tracker = backpack();
		let report = RefreshReport {
			added: vec![BACKPACK.into()],
			..Default::default()
		};

		publisher.sync([&tracker], &report).await.expect("first sync");
		publisher.sync([&tracker], &RefreshReport::default()).await.expect("second sync");

		let battery = discovery_topic(SENSOR_COMPONENT, "battery_percent");
		assert_eq!(broker.published_to(&battery).len(), 1);
		assert_eq!(
			broker.published_to(&format!("airbolt/default/{BACKPACK}/state")).len(),
			2
		);

		publisher.republish([&tracker]).await.expect("republish");
		assert_eq!(broker.published_to(&battery).len(), 2);
	}

	#[tokio::test]
	async fn removed_trackers_are_cleared() {
		let (mut publisher, broker) = publisher("remove.bridge.test").await;
		let tracker = backpack();
		publisher.announce(&tracker).await.expect("should announce");

		let report = RefreshReport {
			removed: vec![BACKPACK.into()],
			..Default::default()
		};
		publisher.sync(std::iter::empty(), &report).await.expect("should remove");

		let location = broker.published_to(&discovery_topic(DEVICE_TRACKER_COMPONENT, location::METRIC));
		assert_eq!(location.len(), 2);
		assert!(location[1].payload.is_empty());

		let state = broker.published_to(&format!("airbolt/default/{BACKPACK}/state"));
		assert_eq!(state.len(), 1);
		assert!(state[0].payload.is_empty() && state[0].retained);
	}

	#[tokio::test]
	async fn failing_tracker_does_not_hold_back_others() {
		let (mut publisher, broker) = publisher("isolation.bridge.test").await;
		let unnamed = tracker("00aa", "");
		let broken = tracker("", "Broken");
		let named = tracker("00bb", "Named");
		let report = RefreshReport {
			removed: vec!["gone".into()],
			..Default::default()
		};

		let err = publisher
			.sync([&unnamed, &broken, &named], &report)
			.await
			.expect_err("tracker without id cannot be announced");
		assert_eq!(err.errors.len(), 1);

		let discovery = broker.published_to("homeassistant/sensor/default/00aa_last_seen/config");
		assert_eq!(discovery.len(), 1);
		let document: serde_json::Value = serde_json::from_slice(&discovery[0].payload).unwrap();
		assert_eq!(document["device"]["name"], "00aa");

		assert_eq!(broker.published_to("airbolt/default/00aa/state").len(), 1);
		assert_eq!(broker.published_to("airbolt/default/00bb/state").len(), 1);

		let removal = broker.published_to("homeassistant/device_tracker/default/gone_location/config");
		assert_eq!(removal.len(), 1);
		assert!(removal[0].payload.is_empty());
		assert!(publisher.pending_removals.is_empty());
	}

	#[tokio::test]
	async fn failed_removals_are_kept_for_the_next_sync() {
		let (mut publisher, _broker) = publisher("retry.bridge.test").await;
		publisher
			.client()
			.disconnect(Duration::from_secs(1))
			.await
			.expect("should disconnect");

		let report = RefreshReport {
			removed: vec!["gone".into()],
			..Default::default()
		};
		let err = publisher
			.sync(std::iter::empty(), &report)
			.await
			.expect_err("client is stopped");
		assert_eq!(err.errors.len(), 1);
		assert!(publisher.pending_removals.contains("gone"));

		let back = tracker("gone", "Back again");
		let err = publisher
			.sync([&back], &RefreshReport::default())
			.await
			.expect_err("client is stopped");
		assert_eq!(err.errors.len(), 1);
		assert!(publisher.pending_removals.is_empty());
	}
}
