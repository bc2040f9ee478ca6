use std::{
	cell::RefCell,
	collections::{HashMap, HashSet, VecDeque},
};

use crate::{envelope, Error, Payload, Registry, Storage, StorageChange, Target};

/// A send waiting for its topic's slot to empty.
struct Queued {
	payload: Payload,
	encoded: String,
	target: Target,
}

/// Signals messages through shared storage: each send writes the payload under `prefix + topic` and immediately removes it.
///
/// Storage holds one value per key, so a send to an occupied slot waits in a per-topic FIFO until the slot empties.
/// That only orders sends from this context; writers in different contexts can still race.
pub struct StorageTransport {
	storage: Box<dyn Storage>,
	prefix: String,
	pending: RefCell<HashMap<String, VecDeque<Queued>>>,
	// Keys we wrote but failed to remove. No signal arrives for our own writes, so these are retried here.
	held: RefCell<HashSet<String>>,
}

impl StorageTransport {
	pub fn new(storage: Box<dyn Storage>, prefix: String) -> Self {
		Self {
			storage,
			prefix,
			pending: Default::default(),
			held: Default::default(),
		}
	}

	fn key(&self, topic: &str) -> String {
		format!("{}{}", self.prefix, topic)
	}

	fn occupied(&self, key: &str) -> Result<bool, Error> {
		Ok(self.storage.get(key)?.is_some_and(|value| !value.is_empty()))
	}

	/// Retry removing a slot this context left occupied.
	fn release(&self, key: &str) -> Result<(), Error> {
		if !self.held.borrow().contains(key) {
			return Ok(());
		}

		self.storage.remove(key)?;
		self.held.borrow_mut().remove(key);
		tracing::debug!(%key, "released held slot");

		Ok(())
	}

	/// The number of sends waiting for `topic`'s slot.
	pub fn queued(&self, topic: &str) -> usize {
		self.pending.borrow().get(topic).map_or(0, VecDeque::len)
	}

	pub fn send(&self, registry: &Registry, topic: &str, payload: &Payload, target: Target) -> Result<(), Error> {
		if !target.includes_remote() {
			registry.broadcast(topic, payload);
			return Ok(());
		}

		let queued = Queued {
			payload: payload.clone(),
			encoded: serde_json::to_string(payload)?,
			target,
		};

		let key = self.key(topic);
		self.release(&key)?;

		// Anything already waiting goes first.
		if self.pending.borrow().contains_key(topic) || self.occupied(&key)? {
			tracing::trace!(%topic, "slot occupied, queueing");
			self.pending.borrow_mut().entry(topic.to_string()).or_default().push_back(queued);
			return Ok(());
		}

		self.write(registry, topic, &key, queued)
	}

	fn write(&self, registry: &Registry, topic: &str, key: &str, queued: Queued) -> Result<(), Error> {
		self.storage.set(key, &queued.encoded)?;

		if let Err(err) = self.storage.remove(key) {
			self.held.borrow_mut().insert(key.to_string());
			return Err(err);
		}

		if queued.target.includes_local() {
			registry.broadcast(topic, &queued.payload);
		}

		Ok(())
	}

	/// Write queued sends for `topic` until the queue is empty or the slot is taken again.
	fn drain(&self, registry: &Registry, topic: &str) {
		let key = self.key(topic);

		if let Err(err) = self.release(&key) {
			tracing::warn!(%topic, %err, "failed to release slot");
			return;
		}

		loop {
			match self.occupied(&key) {
				Ok(false) => {}
				Ok(true) => return,
				Err(err) => {
					tracing::warn!(%topic, %err, "failed to read slot");
					return;
				}
			}

			let queued = {
				let mut pending = self.pending.borrow_mut();
				let Some(queue) = pending.get_mut(topic) else {
					return;
				};

				let queued = queue.pop_front();
				if queue.is_empty() {
					pending.remove(topic);
				}

				match queued {
					Some(queued) => queued,
					None => return,
				}
			};

			tracing::trace!(%topic, "slot free, sending queued");

			if let Err(err) = self.write(registry, topic, &key, queued) {
				tracing::warn!(%topic, %err, "failed to send queued message");
			}
		}
	}

	pub fn receive(&self, registry: &Registry, change: StorageChange) {
		let Some(key) = change.key else {
			// Everything was cleared, so every slot is free.
			let topics: Vec<String> = self.pending.borrow().keys().cloned().collect();
			for topic in topics {
				self.drain(registry, &topic);
			}
			return;
		};

		let Some(topic) = key.strip_prefix(self.prefix.as_str()) else {
			return;
		};

		let was_empty = change.old_value.as_deref().is_none_or(str::is_empty);

		match change.new_value.filter(|value| !value.is_empty()) {
			// Another context just wrote to an empty slot.
			Some(value) if was_empty => match envelope::decode_payload(&value) {
				Ok(payload) => registry.broadcast(topic, &payload),
				Err(err) => tracing::warn!(%topic, %err, "dropping malformed message"),
			},
			Some(_) => {}
			None => self.drain(registry, topic),
		}
	}
}
