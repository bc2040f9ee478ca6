use std::str::FromStr;

use derive_more::Display;

use crate::Error;

/// Which browsing contexts a message is delivered to.
#[derive(Debug, Display, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
	/// Every other context of the same origin, but not this one.
	#[default]
	#[display("other")]
	Other,

	/// Only the subscribers in this context, synchronously.
	#[display("current")]
	Current,

	/// Both of the above.
	#[display("all")]
	All,
}

impl Target {
	/// Returns true if the message is written to the shared transport.
	pub fn includes_remote(self) -> bool {
		matches!(self, Self::Other | Self::All)
	}

	/// Returns true if the message is broadcast to the local registry.
	pub fn includes_local(self) -> bool {
		matches!(self, Self::Current | Self::All)
	}
}

impl FromStr for Target {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"other" => Ok(Self::Other),
			"current" => Ok(Self::Current),
			"all" => Ok(Self::All),
			_ => Err(Error::InvalidTarget(s.to_string())),
		}
	}
}
