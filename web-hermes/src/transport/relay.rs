use crate::{Envelope, Error, Payload, Port, Registry, Target};

/// Sends every message through a single connection to the relay worker.
///
/// Subscriptions are purely local; the relay only forwards envelopes.
pub struct RelayTransport {
	port: Box<dyn Port>,
}

impl RelayTransport {
	pub fn new(port: Box<dyn Port>) -> Self {
		Self { port }
	}

	pub fn send(&self, registry: &Registry, topic: &str, payload: &Payload, target: Target) -> Result<(), Error> {
		if target.includes_remote() {
			let data = Envelope::new(topic, payload.clone()).encode()?;
			self.port.post(&data)?;
		}

		if target.includes_local() {
			registry.broadcast(topic, payload);
		}

		Ok(())
	}

	pub fn receive(&self, registry: &Registry, data: &str) {
		match Envelope::decode(data) {
			Ok(envelope) => registry.broadcast(&envelope.topic, &envelope.payload),
			Err(err) => tracing::warn!(%err, "dropping malformed message"),
		}
	}
}
