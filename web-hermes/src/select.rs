use derive_more::Display;

/// A messaging primitive, in order of preference.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
	#[display("BroadcastChannel")]
	BroadcastChannel,

	#[display("SharedWorker")]
	SharedWorker,

	#[display("localStorage")]
	LocalStorage,

	#[display("none")]
	None,
}

impl Capability {
	/// Every real primitive, most preferred first.
	pub const PRIORITY: [Capability; 3] = [Self::BroadcastChannel, Self::SharedWorker, Self::LocalStorage];
}

/// Which primitives the environment exposes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
	pub broadcast_channel: bool,
	pub shared_worker: bool,
	pub local_storage: bool,
}

impl Capabilities {
	pub fn all() -> Self {
		Self {
			broadcast_channel: true,
			shared_worker: true,
			local_storage: true,
		}
	}

	pub fn none() -> Self {
		Self::default()
	}

	pub fn has(&self, capability: Capability) -> bool {
		match capability {
			Capability::BroadcastChannel => self.broadcast_channel,
			Capability::SharedWorker => self.shared_worker,
			Capability::LocalStorage => self.local_storage,
			Capability::None => true,
		}
	}

	/// The available primitives, most preferred first.
	pub fn candidates(&self) -> impl Iterator<Item = Capability> + '_ {
		Capability::PRIORITY.into_iter().filter(|c| self.has(*c))
	}

	/// The most preferred available primitive, or [Capability::None].
	pub fn select(&self) -> Capability {
		self.candidates().next().unwrap_or(Capability::None)
	}
}
