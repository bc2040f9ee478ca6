#![allow(dead_code)]

use std::{
	cell::{Cell, RefCell},
	collections::BTreeMap,
	rc::{Rc, Weak},
};

use web_hermes::{
	Callback, Capabilities, Channel, ChannelFactory, Connection, ConnectionId, Environment, Error, Hermes,
	HermesConfig, Inbound, InboundSender, Inbox, Payload, Port, Relay, Storage, StorageChange,
};

/// Every browsing context of one simulated origin, sharing channels, storage and a relay.
#[derive(Clone)]
pub struct Origin {
	state: Rc<OriginState>,
}

struct OriginState {
	capabilities: Capabilities,
	failing: Cell<Capabilities>,

	contexts: Cell<u64>,
	handles: Cell<u64>,

	// (handle, name, topic, inbound)
	channels: RefCell<Vec<(u64, String, String, InboundSender)>>,
	closed: Cell<usize>,

	storage: RefCell<BTreeMap<String, String>>,
	failing_removals: Cell<usize>,
	// (context, inbound)
	listeners: RefCell<Vec<(u64, InboundSender)>>,

	relay: Relay<RelayConnection>,
}

impl Origin {
	pub fn new(capabilities: Capabilities) -> Self {
		Self {
			state: Rc::new(OriginState {
				capabilities,
				failing: Cell::new(Capabilities::none()),
				contexts: Cell::new(0),
				handles: Cell::new(0),
				channels: Default::default(),
				closed: Cell::new(0),
				storage: Default::default(),
				failing_removals: Cell::new(0),
				listeners: Default::default(),
				relay: Relay::new(),
			}),
		}
	}

	pub fn only(capability: web_hermes::Capability) -> Self {
		let mut caps = Capabilities::none();
		match capability {
			web_hermes::Capability::BroadcastChannel => caps.broadcast_channel = true,
			web_hermes::Capability::SharedWorker => caps.shared_worker = true,
			web_hermes::Capability::LocalStorage => caps.local_storage = true,
			web_hermes::Capability::None => {}
		}
		Self::new(caps)
	}

	/// Advertise these primitives but fail when they are opened.
	pub fn fail(&self, failing: Capabilities) {
		self.state.failing.set(failing);
	}

	/// Make the next `count` storage removals fail, leaving the key in place.
	pub fn fail_removals(&self, count: usize) {
		self.state.failing_removals.set(count);
	}

	/// Open a new browsing context.
	pub fn context(&self) -> Tab {
		let id = self.state.contexts.get();
		self.state.contexts.set(id + 1);

		let env = FakeEnvironment {
			origin: self.clone(),
			context: id,
		};

		let (hermes, inbox) = HermesConfig::default().build(&env);
		Tab { hermes, inbox }
	}

	pub fn open_channels(&self) -> usize {
		self.state.channels.borrow().len()
	}

	pub fn closed_channels(&self) -> usize {
		self.state.closed.get()
	}

	pub fn relay_connections(&self) -> usize {
		self.state.relay.len()
	}

	pub fn storage_keys(&self) -> Vec<String> {
		self.state.storage.borrow().keys().cloned().collect()
	}

	/// Write a key directly, as a context outside of hermes would, signalling every hermes context.
	pub fn external_set(&self, key: &str, value: &str) {
		self.set(u64::MAX, key, value);
	}

	pub fn external_remove(&self, key: &str) {
		self.remove(u64::MAX, key);
	}

	fn next_handle(&self) -> u64 {
		let id = self.state.handles.get();
		self.state.handles.set(id + 1);
		id
	}

	fn signal(&self, writer: u64, change: StorageChange) {
		for (context, inbound) in self.state.listeners.borrow().iter() {
			if *context != writer {
				inbound.send(Inbound::Storage(change.clone())).ok();
			}
		}
	}

	fn set(&self, writer: u64, key: &str, value: &str) {
		let old_value = self.state.storage.borrow_mut().insert(key.to_string(), value.to_string());
		if old_value.as_deref() == Some(value) {
			return;
		}

		self.signal(
			writer,
			StorageChange {
				key: Some(key.to_string()),
				old_value,
				new_value: Some(value.to_string()),
			},
		);
	}

	fn remove(&self, writer: u64, key: &str) {
		let Some(old_value) = self.state.storage.borrow_mut().remove(key) else {
			return;
		};

		self.signal(
			writer,
			StorageChange {
				key: Some(key.to_string()),
				old_value: Some(old_value),
				new_value: None,
			},
		);
	}
}

/// One browsing context.
pub struct Tab {
	pub hermes: Hermes,
	pub inbox: Inbox,
}

impl Tab {
	/// Deliver everything queued for this context.
	pub fn pump(&mut self) -> usize {
		self.hermes.dispatch_pending(&mut self.inbox)
	}

	/// Subscribe a callback that records every payload.
	pub fn record(&self, topic: &str) -> (Callback, Rc<RefCell<Vec<Payload>>>) {
		let seen = Rc::new(RefCell::new(Vec::new()));
		let seen2 = seen.clone();
		let callback = Callback::new(move |payload| seen2.borrow_mut().push(payload.clone()));
		self.hermes.on(topic, &callback);
		(callback, seen)
	}
}

struct FakeEnvironment {
	origin: Origin,
	context: u64,
}

impl Environment for FakeEnvironment {
	fn capabilities(&self) -> Capabilities {
		self.origin.state.capabilities
	}

	fn broadcast_channel(&self) -> Result<Box<dyn ChannelFactory>, Error> {
		if self.origin.state.failing.get().broadcast_channel {
			return Err(Error::Unsupported);
		}

		Ok(Box::new(FakeChannelFactory {
			origin: self.origin.clone(),
		}))
	}

	fn shared_worker(&self, _url: &str, _name: &str, inbound: InboundSender) -> Result<Box<dyn Port>, Error> {
		if self.origin.state.failing.get().shared_worker {
			return Err(Error::Unsupported);
		}

		let id = self.origin.state.relay.connect(|_| RelayConnection { inbound });
		Ok(Box::new(FakePort {
			origin: Rc::downgrade(&self.origin.state),
			id,
		}))
	}

	fn local_storage(&self, inbound: InboundSender) -> Result<Box<dyn Storage>, Error> {
		if self.origin.state.failing.get().local_storage {
			return Err(Error::Unsupported);
		}

		self.origin.state.listeners.borrow_mut().push((self.context, inbound));
		Ok(Box::new(FakeStorage {
			origin: self.origin.clone(),
			context: self.context,
		}))
	}
}

struct FakeChannelFactory {
	origin: Origin,
}

impl ChannelFactory for FakeChannelFactory {
	fn open(&self, name: &str, topic: &str, inbound: InboundSender) -> Result<Box<dyn Channel>, Error> {
		let handle = self.origin.next_handle();
		self.origin
			.state
			.channels
			.borrow_mut()
			.push((handle, name.to_string(), topic.to_string(), inbound));

		Ok(Box::new(FakeChannel {
			origin: self.origin.clone(),
			handle,
			name: name.to_string(),
		}))
	}
}

/// Delivers to every other handle with the same name, like a BroadcastChannel.
struct FakeChannel {
	origin: Origin,
	handle: u64,
	name: String,
}

impl Channel for FakeChannel {
	fn post(&self, data: &str) -> Result<(), Error> {
		for (handle, name, topic, inbound) in self.origin.state.channels.borrow().iter() {
			if *handle != self.handle && *name == self.name {
				inbound
					.send(Inbound::Channel {
						topic: topic.clone(),
						data: data.to_string(),
					})
					.ok();
			}
		}
		Ok(())
	}
}

impl Drop for FakeChannel {
	fn drop(&mut self) {
		self.origin.state.channels.borrow_mut().retain(|(handle, ..)| *handle != self.handle);
		self.origin.state.closed.set(self.origin.state.closed.get() + 1);
	}
}

struct RelayConnection {
	inbound: InboundSender,
}

impl Connection for RelayConnection {
	type Message = String;

	fn post(&self, message: &String) -> Result<(), Error> {
		self.inbound
			.send(Inbound::Relay { data: message.clone() })
			.map_err(|_| Error::Disconnected)
	}
}

struct FakePort {
	// Weak, since the relay holds this context's inbound sender.
	origin: Weak<OriginState>,
	id: ConnectionId,
}

impl Port for FakePort {
	fn post(&self, data: &str) -> Result<(), Error> {
		let origin = self.origin.upgrade().ok_or(Error::Disconnected)?;
		origin.relay.forward(self.id, &data.to_string());
		Ok(())
	}
}

impl Drop for FakePort {
	fn drop(&mut self) {
		if let Some(origin) = self.origin.upgrade() {
			origin.relay.disconnect(self.id);
		}
	}
}

struct FakeStorage {
	origin: Origin,
	context: u64,
}

impl Storage for FakeStorage {
	fn get(&self, key: &str) -> Result<Option<String>, Error> {
		Ok(self.origin.state.storage.borrow().get(key).cloned())
	}

	fn set(&self, key: &str, value: &str) -> Result<(), Error> {
		self.origin.set(self.context, key, value);
		Ok(())
	}

	fn remove(&self, key: &str) -> Result<(), Error> {
		let failing = self.origin.state.failing_removals.get();
		if failing > 0 {
			self.origin.state.failing_removals.set(failing - 1);
			return Err(Error::Disconnected);
		}

		self.origin.remove(self.context, key);
		Ok(())
	}
}
