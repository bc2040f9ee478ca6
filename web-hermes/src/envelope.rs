use serde::{Deserialize, Serialize};

use crate::{Error, Payload};

/// A topic-addressed message, as sent over a broadcast channel or the relay.
///
/// The wire form is a JSON object: `{ "topic": "...", "payload": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
	pub topic: String,
	pub payload: Payload,
}

impl Envelope {
	pub fn new<T: Into<String>>(topic: T, payload: Payload) -> Self {
		Self {
			topic: topic.into(),
			payload,
		}
	}

	pub fn encode(&self) -> Result<String, Error> {
		Ok(serde_json::to_string(self)?)
	}

	pub fn decode(data: &str) -> Result<Self, Error> {
		serde_json::from_str(data).map_err(|e| Error::Malformed(e.to_string()))
	}
}

/// Decode a bare payload, as stored in a storage slot.
pub fn decode_payload(data: &str) -> Result<Payload, Error> {
	serde_json::from_str(data).map_err(|e| Error::Malformed(e.to_string()))
}
