use std::cell::{Cell, RefCell};

use crate::Error;

/// One context connected to the relay.
pub trait Connection {
	type Message;

	fn post(&self, message: &Self::Message) -> Result<(), Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

/// Runs inside the shared worker and forwards each message to every other connected context.
///
/// Messages are never inspected or stored. The connection list only changes on connect and disconnect.
pub struct Relay<C: Connection> {
	connections: RefCell<Vec<(ConnectionId, C)>>,
	next: Cell<u64>,
}

impl<C: Connection> Default for Relay<C> {
	fn default() -> Self {
		Self {
			connections: RefCell::new(Vec::new()),
			next: Cell::new(0),
		}
	}
}

impl<C: Connection> Relay<C> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a connection, built from its assigned id.
	pub fn connect<F: FnOnce(ConnectionId) -> C>(&self, f: F) -> ConnectionId {
		let id = ConnectionId(self.next.get());
		self.next.set(id.0 + 1);

		let connection = f(id);
		self.connections.borrow_mut().push((id, connection));
		tracing::debug!(?id, "relay connected");

		id
	}

	/// Remove a connection, returning it if it was present.
	pub fn disconnect(&self, id: ConnectionId) -> Option<C> {
		let mut connections = self.connections.borrow_mut();
		let index = connections.iter().position(|(other, _)| *other == id)?;
		tracing::debug!(?id, "relay disconnected");
		Some(connections.remove(index).1)
	}

	pub fn len(&self) -> usize {
		self.connections.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.connections.borrow().is_empty()
	}

	/// Forward `message` from `from` to every other connection, returning how many received it.
	///
	/// A connection that can no longer be posted to is disconnected.
	pub fn forward(&self, from: ConnectionId, message: &C::Message) -> usize {
		let mut delivered = 0;
		let mut closed = Vec::new();

		for (id, connection) in self.connections.borrow().iter() {
			if *id == from {
				continue;
			}

			match connection.post(message) {
				Ok(()) => delivered += 1,
				Err(err) => {
					tracing::warn!(?id, %err, "relay connection failed");
					closed.push(*id);
				}
			}
		}

		for id in closed {
			self.disconnect(id);
		}

		delivered
	}
}

#[cfg(test)]
mod test {
	use std::{cell::RefCell, rc::Rc};

	use super::*;

	#[derive(Clone, Default)]
	struct Recorder {
		received: Rc<RefCell<Vec<String>>>,
		broken: bool,
	}

	impl Connection for Recorder {
		type Message = String;

		fn post(&self, message: &String) -> Result<(), Error> {
			if self.broken {
				return Err(Error::Disconnected);
			}
			self.received.borrow_mut().push(message.clone());
			Ok(())
		}
	}

	#[test]
	fn forward_to_others() {
		let relay = Relay::new();
		let a = Recorder::default();
		let b = Recorder::default();
		let c = Recorder::default();

		let a_id = relay.connect(|_| a.clone());
		relay.connect(|_| b.clone());
		relay.connect(|_| c.clone());

		assert_eq!(relay.forward(a_id, &"hello".to_string()), 2);

		assert!(a.received.borrow().is_empty());
		assert_eq!(*b.received.borrow(), vec!["hello"]);
		assert_eq!(*c.received.borrow(), vec!["hello"]);
	}

	#[test]
	fn disconnect() {
		let relay = Relay::new();
		let a = Recorder::default();
		let b = Recorder::default();

		let a_id = relay.connect(|_| a.clone());
		let b_id = relay.connect(|_| b.clone());
		assert_ne!(a_id, b_id);

		assert!(relay.disconnect(b_id).is_some());
		assert!(relay.disconnect(b_id).is_none());
		assert_eq!(relay.len(), 1);

		assert_eq!(relay.forward(a_id, &"x".to_string()), 0);
		assert!(b.received.borrow().is_empty());
	}

	#[test]
	fn broken_connection_dropped() {
		let relay = Relay::new();
		let a = Recorder::default();
		let b = Recorder::default();

		let a_id = relay.connect(|_| a.clone());
		relay.connect(|_| Recorder {
			broken: true,
			..Default::default()
		});
		relay.connect(|_| b.clone());

		assert_eq!(relay.forward(a_id, &"x".to_string()), 1);
		assert_eq!(relay.len(), 2);
		assert_eq!(*b.received.borrow(), vec!["x"]);
	}
}
