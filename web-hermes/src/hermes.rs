use std::rc::Rc;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::{
	Callback, Capability, ChannelTransport, Environment, Error, Inbound, Registry, RelayTransport, StorageTransport,
	Target, Transport,
};

#[derive(Debug, Clone)]
pub struct HermesConfig {
	/// Prepended to the topic to form storage keys and broadcast channel names.
	pub prefix: String,

	/// The script run by the shared relay worker.
	pub worker_url: String,

	/// The shared worker name; contexts using the same name share a relay.
	pub worker_name: String,
}

impl Default for HermesConfig {
	fn default() -> Self {
		Self {
			prefix: "__hermes:".to_string(),
			worker_url: "hermes-worker.js".to_string(),
			worker_name: "hermes".to_string(),
		}
	}
}

impl HermesConfig {
	pub fn new() -> Self {
		Self::default()
	}

	/// Probe the environment and open the most preferred transport.
	///
	/// A primitive that is advertised but fails to open is skipped in favor of the next one.
	pub fn build<E: Environment + ?Sized>(self, env: &E) -> (Hermes, Inbox) {
		let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

		let transport = env
			.capabilities()
			.candidates()
			.find_map(|capability| match self.open(env, capability, &inbound_tx) {
				Ok(transport) => Some(transport),
				Err(err) => {
					tracing::warn!(%capability, %err, "transport unavailable");
					None
				}
			})
			.unwrap_or(Transport::Unsupported);

		tracing::debug!(capability = %transport.capability(), "selected transport");

		let hermes = Hermes {
			state: Rc::new(State {
				registry: Registry::new(),
				transport,
			}),
		};

		let inbox = Inbox { inbound: inbound_rx };

		(hermes, inbox)
	}

	fn open<E: Environment + ?Sized>(
		&self,
		env: &E,
		capability: Capability,
		inbound: &mpsc::UnboundedSender<Inbound>,
	) -> Result<Transport, Error> {
		Ok(match capability {
			Capability::BroadcastChannel => Transport::Channel(ChannelTransport::new(
				env.broadcast_channel()?,
				self.prefix.clone(),
				inbound.clone(),
			)),
			Capability::SharedWorker => Transport::Relay(RelayTransport::new(env.shared_worker(
				&self.worker_url,
				&self.worker_name,
				inbound.clone(),
			)?)),
			Capability::LocalStorage => Transport::Storage(StorageTransport::new(
				env.local_storage(inbound.clone())?,
				self.prefix.clone(),
			)),
			Capability::None => Transport::Unsupported,
		})
	}
}

struct State {
	registry: Registry,
	transport: Transport,
}

/// A handle to the messaging context. Cheap to clone; clones share subscribers and transport.
#[derive(Clone)]
pub struct Hermes {
	state: Rc<State>,
}

impl Hermes {
	/// The transport that was selected.
	pub fn capability(&self) -> Capability {
		self.state.transport.capability()
	}

	pub fn transport(&self) -> &Transport {
		&self.state.transport
	}

	pub fn registry(&self) -> &Registry {
		&self.state.registry
	}

	/// Subscribe `callback` to `topic`.
	pub fn on(&self, topic: &str, callback: &Callback) {
		self.state.transport.on(&self.state.registry, topic, callback.clone());
	}

	/// Unsubscribe one registration of `callback`, or every subscriber of `topic` when `None`.
	pub fn off(&self, topic: &str, callback: Option<&Callback>) {
		self.state.transport.off(&self.state.registry, topic, callback);
	}

	/// Send `data` to every other context.
	pub fn send<T: Serialize + ?Sized>(&self, topic: &str, data: &T) -> Result<(), Error> {
		self.send_to(topic, data, Target::Other)
	}

	/// Send `data` to the contexts selected by `target`.
	pub fn send_to<T: Serialize + ?Sized>(&self, topic: &str, data: &T, target: Target) -> Result<(), Error> {
		let payload = serde_json::to_value(data)?;
		self.state
			.transport
			.send(&self.state.registry, topic, &payload, target)
	}

	/// Deliver one inbound event to local subscribers.
	pub fn dispatch(&self, inbound: Inbound) {
		self.state.transport.receive(&self.state.registry, inbound);
	}

	/// Deliver every queued inbound event, returning how many there were.
	pub fn dispatch_pending(&self, inbox: &mut Inbox) -> usize {
		let mut count = 0;
		while let Some(inbound) = inbox.try_next() {
			self.dispatch(inbound);
			count += 1;
		}
		count
	}

	/// Deliver inbound events as they arrive, until the transport is gone.
	pub async fn run(&self, mut inbox: Inbox) {
		while let Some(inbound) = inbox.next().await {
			self.dispatch(inbound);
		}
	}
}

/// Events from other contexts, waiting to be dispatched.
pub struct Inbox {
	inbound: mpsc::UnboundedReceiver<Inbound>,
}

impl Inbox {
	pub async fn next(&mut self) -> Option<Inbound> {
		self.inbound.recv().await
	}

	pub fn try_next(&mut self) -> Option<Inbound> {
		self.inbound.try_recv().ok()
	}
}
