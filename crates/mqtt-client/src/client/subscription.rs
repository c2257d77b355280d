use crate::{client::Message, router::RouteId};
use futures::{FutureExt, Stream, StreamExt, stream::FuturesUnordered};
use std::{
	future::Future,
	pin::Pin,
	sync::Arc,
	task::{Context, Poll},
};
use tokio::sync::oneshot;

/// Keeps a route alive. Dropping it tells the client thread to remove the
/// route, and to unsubscribe if it was the last one for the topic.
pub(crate) struct SubscriptionToken {
	_lifetime: oneshot::Sender<()>,
}

struct SubscriptionRef {
	id: RouteId,
	lifetime: oneshot::Receiver<()>,
}

impl Future for SubscriptionRef {
	type Output = RouteId;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let this = self.get_mut();
		let id = this.id;
		this.lifetime.poll_unpin(cx).map(|_| id)
	}
}

#[derive(Default)]
pub(super) struct Subscriptions {
	live: FuturesUnordered<SubscriptionRef>,
}

static_assertions::assert_impl_all!(Subscriptions: Unpin);

impl Subscriptions {
	pub(super) fn new() -> Self {
		Self::default()
	}

	pub(super) fn insert(&mut self, id: RouteId) -> SubscriptionToken {
		let (lifetime_sender, lifetime_receiver) = oneshot::channel();
		self.live.push(SubscriptionRef {
			id,
			lifetime: lifetime_receiver,
		});

		SubscriptionToken {
			_lifetime: lifetime_sender,
		}
	}

	/// Resolves with the route of the next dropped subscription. Never
	/// resolves while there are no subscriptions.
	pub(super) async fn dropped(&mut self) -> RouteId {
		match self.live.next().await {
			Some(id) => id,
			None => std::future::pending().await,
		}
	}
}

/// Messages received on a subscribed topic.
pub struct Subscription {
	topic: Arc<str>,
	receiver: flume::Receiver<Message>,
	_token: SubscriptionToken,
}

impl Subscription {
	pub(crate) fn new(
		topic: Arc<str>,
		receiver: flume::Receiver<Message>,
		token: SubscriptionToken,
	) -> Self {
		Self {
			topic,
			receiver,
			_token: token,
		}
	}

	pub fn topic(&self) -> &str {
		&self.topic
	}

	/// Waits for the next message. Returns `None` once the client has shut down.
	pub async fn recv(&self) -> Option<Message> {
		self.receiver.recv_async().await.ok()
	}

	pub fn into_stream(self) -> impl Stream<Item = Message> + Send + 'static {
		futures::stream::unfold(self, |subscription| async move {
			let message = subscription.recv().await?;
			Some((message, subscription))
		})
	}
}
