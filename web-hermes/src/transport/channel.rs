use std::{cell::RefCell, collections::HashMap};

use crate::{Callback, Channel, ChannelFactory, Envelope, Error, InboundSender, Payload, Registry, Target};

/// One broadcast channel per topic, opened lazily and closed when the topic loses its last subscriber.
pub struct ChannelTransport {
	factory: Box<dyn ChannelFactory>,
	prefix: String,
	inbound: InboundSender,
	channels: RefCell<HashMap<String, Box<dyn Channel>>>,
}

impl ChannelTransport {
	pub fn new(factory: Box<dyn ChannelFactory>, prefix: String, inbound: InboundSender) -> Self {
		Self {
			factory,
			prefix,
			inbound,
			channels: Default::default(),
		}
	}

	fn open(&self, topic: &str) -> Result<(), Error> {
		if self.channels.borrow().contains_key(topic) {
			return Ok(());
		}

		let name = format!("{}{}", self.prefix, topic);
		let channel = self.factory.open(&name, topic, self.inbound.clone())?;
		tracing::debug!(%topic, %name, "opened channel");

		self.channels.borrow_mut().insert(topic.to_string(), channel);
		Ok(())
	}

	/// The number of open channel handles.
	pub fn open_channels(&self) -> usize {
		self.channels.borrow().len()
	}

	pub fn on(&self, registry: &Registry, topic: &str, callback: Callback) {
		registry.on(topic, callback);

		if let Err(err) = self.open(topic) {
			tracing::warn!(%topic, %err, "failed to open channel");
		}
	}

	pub fn off(&self, registry: &Registry, topic: &str, callback: Option<&Callback>) {
		registry.off(topic, callback);
		self.release(registry, topic);
	}

	/// Close the channel for `topic` unless it still has subscribers.
	fn release(&self, registry: &Registry, topic: &str) {
		if registry.contains(topic) {
			return;
		}

		// Dropping the handle closes it.
		if self.channels.borrow_mut().remove(topic).is_some() {
			tracing::debug!(%topic, "closed channel");
		}
	}

	pub fn send(&self, registry: &Registry, topic: &str, payload: &Payload, target: Target) -> Result<(), Error> {
		if target.includes_remote() {
			let data = Envelope::new(topic, payload.clone()).encode()?;
			self.open(topic)?;

			let posted = match self.channels.borrow().get(topic) {
				Some(channel) => channel.post(&data),
				None => Ok(()),
			};

			// A topic that is only sent to doesn't keep a channel open.
			self.release(registry, topic);
			posted?;
		}

		if target.includes_local() {
			registry.broadcast(topic, payload);
		}

		Ok(())
	}

	pub fn receive(&self, registry: &Registry, topic: &str, data: &str) {
		let envelope = match Envelope::decode(data) {
			Ok(envelope) => envelope,
			Err(err) => {
				tracing::warn!(%topic, %err, "dropping malformed message");
				return;
			}
		};

		if envelope.topic != topic {
			tracing::warn!(%topic, other = %envelope.topic, "dropping message for another topic");
			return;
		}

		registry.broadcast(topic, &envelope.payload);
	}
}
