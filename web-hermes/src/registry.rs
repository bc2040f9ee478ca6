use std::{
	cell::RefCell,
	collections::HashMap,
	fmt,
	panic::{self, AssertUnwindSafe},
	rc::Rc,
};

use crate::Payload;

/// A subscriber, compared by identity.
///
/// Keep a clone around to pass to `off` later; two callbacks built from identical closures are different subscribers.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&Payload)>);

impl Callback {
	pub fn new<F: Fn(&Payload) + 'static>(f: F) -> Self {
		Self(Rc::new(f))
	}

	pub fn call(&self, payload: &Payload) {
		(self.0)(payload)
	}
}

impl PartialEq for Callback {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl Eq for Callback {}

impl fmt::Debug for Callback {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Callback").field(&Rc::as_ptr(&self.0).cast::<()>()).finish()
	}
}

/// Subscribers per topic, in registration order.
///
/// A topic only has an entry while it has at least one subscriber.
#[derive(Default)]
pub struct Registry {
	topics: RefCell<HashMap<String, Vec<Callback>>>,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Append a subscriber. Duplicates are kept and fire once per registration.
	pub fn on(&self, topic: &str, callback: Callback) {
		self.topics.borrow_mut().entry(topic.to_string()).or_default().push(callback);
	}

	/// Remove the first registration of `callback`, or every subscriber when `None`.
	///
	/// Returns true if the topic no longer has any subscribers as a result of this call.
	pub fn off(&self, topic: &str, callback: Option<&Callback>) -> bool {
		let mut topics = self.topics.borrow_mut();

		let Some(callbacks) = topics.get_mut(topic) else {
			return false;
		};

		if let Some(callback) = callback {
			match callbacks.iter().position(|c| c == callback) {
				Some(index) => {
					callbacks.remove(index);
				}
				None => return false,
			}

			if !callbacks.is_empty() {
				return false;
			}
		}

		topics.remove(topic);
		true
	}

	pub fn contains(&self, topic: &str) -> bool {
		self.topics.borrow().contains_key(topic)
	}

	pub fn len(&self, topic: &str) -> usize {
		self.topics.borrow().get(topic).map_or(0, Vec::len)
	}

	/// Invoke every subscriber of `topic` with `payload`.
	///
	/// The subscriber list is snapshotted first, so callbacks may call `on`/`off` freely.
	/// A panicking subscriber is logged and skipped; the rest still run.
	/// This needs unwinding: on `wasm32-unknown-unknown` a panic aborts the module instead.
	pub fn broadcast(&self, topic: &str, payload: &Payload) {
		let callbacks = match self.topics.borrow().get(topic) {
			Some(callbacks) => callbacks.clone(),
			None => return,
		};

		for callback in callbacks {
			if panic::catch_unwind(AssertUnwindSafe(|| callback.call(payload))).is_err() {
				tracing::warn!(%topic, "subscriber panicked");
			}
		}
	}
}
