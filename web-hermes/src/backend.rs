use tokio::sync::mpsc;

use crate::{Capabilities, Error};

/// An event from another browsing context, queued by a platform event handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
	/// A JSON envelope arrived on the broadcast channel opened for `topic`.
	Channel { topic: String, data: String },

	/// A JSON envelope was forwarded by the relay.
	Relay { data: String },

	/// Shared storage was changed by another context.
	Storage(StorageChange),
}

/// The contents of a storage change signal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageChange {
	/// The changed key, or `None` if the whole storage area was cleared.
	pub key: Option<String>,
	pub old_value: Option<String>,
	pub new_value: Option<String>,
}

pub type InboundSender = mpsc::UnboundedSender<Inbound>;

/// An open, named broadcast channel. Dropping it releases the underlying handle.
pub trait Channel {
	fn post(&self, data: &str) -> Result<(), Error>;
}

/// Opens broadcast channels by name.
pub trait ChannelFactory {
	/// Open `name`, queueing every message it receives as [Inbound::Channel] for `topic`.
	fn open(&self, name: &str, topic: &str, inbound: InboundSender) -> Result<Box<dyn Channel>, Error>;
}

/// A connection to the relay.
pub trait Port {
	fn post(&self, data: &str) -> Result<(), Error>;
}

/// Shared key-value storage.
///
/// Changes made through this handle are signalled to every *other* context, never this one.
pub trait Storage {
	fn get(&self, key: &str) -> Result<Option<String>, Error>;
	fn set(&self, key: &str, value: &str) -> Result<(), Error>;
	fn remove(&self, key: &str) -> Result<(), Error>;
}

/// The primitives available to this browsing context.
pub trait Environment {
	fn capabilities(&self) -> Capabilities;

	fn broadcast_channel(&self) -> Result<Box<dyn ChannelFactory>, Error>;

	/// Connect to the shared relay worker, queueing forwarded messages as [Inbound::Relay].
	fn shared_worker(&self, url: &str, name: &str, inbound: InboundSender) -> Result<Box<dyn Port>, Error>;

	/// Open shared storage, queueing change signals as [Inbound::Storage].
	fn local_storage(&self, inbound: InboundSender) -> Result<Box<dyn Storage>, Error>;
}
