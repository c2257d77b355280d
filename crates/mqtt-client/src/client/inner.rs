use crate::{
	HassMqttOptions,
	client::{Message, command::Command, subscription::Subscriptions},
	mqtt::{HassMqttConnection, MqttProviderExt},
	router::{RouteId, Router},
	topics::TopicsConfig,
};
use futures::{StreamExt, pin_mut};
use hass_dyn_error::DynError;
use hass_mqtt_provider::{MqttClient, MqttMessage, MqttProvider};
use std::{thread, time::Duration};
use thiserror::Error;
use tokio::{select, sync::mpsc, task::LocalSet};
use tracing::{Level, Span, debug, field, instrument, span, warn};

const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ConnectError {
	#[error("failed to connect to MQTT broker")]
	Connect { source: DynError },

	#[error("failed to spawn MQTT thread")]
	SpawnThread { source: DynError },

	#[error("failed to create async MQTT runtime")]
	CreateRuntime { source: DynError },
}

impl ConnectError {
	fn connect(source: impl std::error::Error + Send + Sync + 'static) -> Self {
		Self::Connect {
			source: DynError::new(source),
		}
	}

	fn spawn_thread(source: impl std::error::Error + Send + Sync + 'static) -> Self {
		Self::SpawnThread {
			source: DynError::new(source),
		}
	}

	fn create_runtime(source: impl std::error::Error + Send + Sync + 'static) -> Self {
		Self::CreateRuntime {
			source: DynError::new(source),
		}
	}
}

/// State owned by the client thread.
pub(crate) struct InnerClient {
	pub(super) topics: TopicsConfig,
	pub(super) router: Router<flume::Sender<Message>>,
	pub(super) subscriptions: Subscriptions,
	pub(super) stopped: bool,
}

impl InnerClient {
	fn new(topics: TopicsConfig) -> Self {
		InnerClient {
			topics,
			router: Router::new(),
			subscriptions: Subscriptions::new(),
			stopped: false,
		}
	}

	#[instrument(level = Level::DEBUG, name = "InnerClient::run", skip_all)]
	async fn run<T: MqttClient>(mut self, mqtt: T, mut receiver: mpsc::UnboundedReceiver<Command>) {
		let messages = mqtt.messages().fuse();
		pin_mut!(messages);

		while !self.stopped {
			select! {
				id = self.subscriptions.dropped() => self.handle_unsubscribe(&mqtt, id).await,
				cmd = receiver.recv() => match cmd {
					Some(cmd) => cmd.run(&mut self, &mqtt).await,
					None => break,
				},
				Some(msg) = messages.next() => self.handle_message(&mqtt, msg).await,
			}
		}

		// Queued commands are dropped unanswered, which their callers see as a
		// stopped client. Closing first makes later sends fail the same way.
		receiver.close();
		let mut pending = 0usize;
		while let Ok(cmd) = receiver.try_recv() {
			drop(cmd);
			pending += 1;
		}

		if pending > 0 {
			debug!(pending, "dropped commands queued after stop");
		}

		if !self.stopped {
			debug!("all client handles dropped, disconnecting");
			if let Err(e) = mqtt.disconnect(DISCONNECT_TIMEOUT, true).await {
				warn!(error = %e, "failed to disconnect from MQTT broker");
			}
		}
	}

	async fn handle_unsubscribe<T: MqttClient>(&mut self, mqtt: &T, id: RouteId) {
		if let Some((_, Some(topic))) = self.router.remove(id) {
			debug!(%topic, "last subscriber dropped, unsubscribing");
			if let Err(e) = mqtt.unsubscribe(&*topic).await {
				warn!(%topic, error = %e, "failed to unsubscribe");
			}
		}
	}

	async fn handle_message<T: MqttClient>(&mut self, mqtt: &T, msg: T::Message) {
		let topic = msg.topic();
		let mut routes = self.router.matches(topic).peekable();
		if routes.peek().is_none() {
			return;
		}

		let message = Message::new(topic, msg.payload(), msg.retained());
		let closed = routes
			.filter(|(_, sender)| sender.send(message.clone()).is_err())
			.map(|(id, _)| id)
			.collect::<Vec<_>>();

		for id in closed {
			self.handle_unsubscribe(mqtt, id).await;
		}
	}
}

#[instrument(level = Level::DEBUG, name = "InnerClient::spawn", skip_all, fields(provider.name = %P::NAME))]
pub(super) async fn spawn<P: MqttProvider>(
	options: HassMqttOptions,
) -> Result<(mpsc::UnboundedSender<Command>, TopicsConfig, String), ConnectError> {
	let spawn_span = Span::current().id();
	let (result_sender, result_receiver) = tokio::sync::oneshot::channel();

	thread::Builder::new()
		.name(format!("mqtt-{}-hass", options.application_name.slug()))
		.spawn(move || {
			let span = {
				let span = span!(
					parent: None,
					Level::DEBUG,
					"InnerClient::thread",
					provider.name = %P::NAME,
					client.id = field::Empty,
				);
				span.follows_from(spawn_span);
				span.entered()
			};

			let rt = match tokio::runtime::Builder::new_current_thread()
				.enable_all()
				.build()
				.map_err(ConnectError::create_runtime)
			{
				Ok(rt) => rt,
				Err(e) => {
					let _ = result_sender.send(Err(e));
					return;
				}
			};

			let local = LocalSet::new();
			local.block_on(&rt, async {
				let HassMqttConnection {
					topics,
					client,
					client_id,
				} = match <P as MqttProviderExt>::create_client(&options).await {
					Ok(c) => c,
					Err(e) => {
						let _ = result_sender.send(Err(ConnectError::connect(e)));
						return;
					}
				};

				span.record("client.id", client_id.as_str());
				let (sender, receiver) = mpsc::unbounded_channel();
				let inner = InnerClient::new(topics.clone());

				if result_sender.send(Ok((sender, topics, client_id))).is_err() {
					debug!("connect caller went away");
				}

				inner.run(client, receiver).await;
			});

			drop(span);
		})
		.map_err(ConnectError::spawn_thread)?;

	match result_receiver.await {
		Ok(result) => result,
		Err(e) => Err(ConnectError::connect(e)),
	}
}
