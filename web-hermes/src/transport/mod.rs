mod channel;
mod relay;
mod storage;

pub use channel::*;
pub use relay::*;
pub use storage::*;

use crate::{Callback, Capability, Error, Inbound, Payload, Registry, Target};

/// The single active transport, chosen once at startup.
pub enum Transport {
	Channel(ChannelTransport),
	Relay(RelayTransport),
	Storage(StorageTransport),

	/// Nothing is available; every call warns and does nothing else.
	Unsupported,
}

impl Transport {
	pub fn capability(&self) -> Capability {
		match self {
			Self::Channel(_) => Capability::BroadcastChannel,
			Self::Relay(_) => Capability::SharedWorker,
			Self::Storage(_) => Capability::LocalStorage,
			Self::Unsupported => Capability::None,
		}
	}

	pub fn on(&self, registry: &Registry, topic: &str, callback: Callback) {
		match self {
			Self::Channel(channel) => channel.on(registry, topic, callback),
			Self::Relay(_) | Self::Storage(_) => registry.on(topic, callback),
			Self::Unsupported => unsupported(),
		}
	}

	pub fn off(&self, registry: &Registry, topic: &str, callback: Option<&Callback>) {
		match self {
			Self::Channel(channel) => channel.off(registry, topic, callback),
			Self::Relay(_) | Self::Storage(_) => {
				registry.off(topic, callback);
			}
			Self::Unsupported => unsupported(),
		}
	}

	pub fn send(&self, registry: &Registry, topic: &str, payload: &Payload, target: Target) -> Result<(), Error> {
		match self {
			Self::Channel(channel) => channel.send(registry, topic, payload, target),
			Self::Relay(relay) => relay.send(registry, topic, payload, target),
			Self::Storage(storage) => storage.send(registry, topic, payload, target),
			Self::Unsupported => {
				unsupported();
				Ok(())
			}
		}
	}

	pub fn receive(&self, registry: &Registry, inbound: Inbound) {
		match (self, inbound) {
			(Self::Channel(channel), Inbound::Channel { topic, data }) => channel.receive(registry, &topic, &data),
			(Self::Relay(relay), Inbound::Relay { data }) => relay.receive(registry, &data),
			(Self::Storage(storage), Inbound::Storage(change)) => storage.receive(registry, change),
			(_, inbound) => tracing::debug!(?inbound, "ignoring event for inactive transport"),
		}
	}
}

fn unsupported() {
	tracing::warn!("hermes messaging is not supported");
}
