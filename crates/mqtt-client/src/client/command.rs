mod disconnect;
mod entity;
mod publish;
mod subscribe;

use super::inner::InnerClient;
use async_trait::async_trait;
use hass_mqtt_provider::MqttClient;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{Instrument, Level, debug, span};

pub(crate) use disconnect::DisconnectCommand;
pub(crate) use entity::EntityCommand;
pub(crate) use publish::PublishCommand;
pub(crate) use subscribe::SubscribeCommand;

pub use disconnect::DisconnectCommandError;
pub use entity::EntityCommandError;
pub use publish::PublishCommandError;
pub use subscribe::SubscribeCommandError;

#[async_trait(?Send)]
pub(crate) trait ClientCommand {
	const NAME: &'static str;

	type Result: Send + 'static;
	type Error: std::error::Error + Send + Sync + 'static;

	async fn run<T: MqttClient>(
		&self,
		client: &mut InnerClient,
		mqtt: &T,
	) -> Result<Self::Result, Self::Error>;

	fn create_error(&self, source: impl std::error::Error + Send + Sync + 'static) -> Self::Error;
}

pub(crate) type CommandResult<T> =
	Result<<T as ClientCommand>::Result, <T as ClientCommand>::Error>;
pub(crate) type CommandResultSender<T> = oneshot::Sender<CommandResult<T>>;
pub(crate) type CommandResultReceiver<T> = oneshot::Receiver<CommandResult<T>>;

pub(crate) trait FromClientCommand<T: ClientCommand>: Sized {
	fn from_command(command: Arc<T>) -> (Self, CommandResultReceiver<T>);
}

macro_rules! commands {
	($vis:vis enum $name:ident {
		$($variant:ident),*$(,)?
	}) => {
		#[allow(clippy::enum_variant_names)]
		$vis enum $name {
			$($variant(Arc<$variant>, CommandResultSender<$variant>),)*
		}

		$(
			impl FromClientCommand<$variant> for $name {
				fn from_command(command: Arc<$variant>) -> (Self, CommandResultReceiver<$variant>) {
					let (tx, rx) = oneshot::channel();

					(Self::$variant(command, tx), rx)
				}
			}
		)*

		impl $name {
			pub(crate) fn from_command<T>(command: Arc<T>) -> (Self, CommandResultReceiver<T>)
			where
				T: ClientCommand,
				Self: FromClientCommand<T>,
			{
				<Self as FromClientCommand<T>>::from_command(command)
			}

			pub(crate) async fn run<T: MqttClient>(
				self,
				client: &mut InnerClient,
				mqtt: &T,
			) {
				match self {
					$(
						Self::$variant(command, tx) => {
							let span = span!(
								Level::DEBUG,
								"ClientCommand::run",
								command = <$variant as ClientCommand>::NAME
							);

							let result = command.run(client, mqtt).instrument(span).await;
							if let Err(e) = &result {
								debug!(error = %e, "command failed");
							}

							if tx.send(result).is_err() {
								debug!("command caller went away before the result was ready");
							}
						}
					)*
				}
			}
		}
	};
}

commands! {
	pub(crate) enum Command {
		DisconnectCommand,
		EntityCommand,
		PublishCommand,
		SubscribeCommand,
	}
}
