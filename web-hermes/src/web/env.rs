use wasm_bindgen::prelude::*;
use web_sys::js_sys;

use crate::{
	Capabilities, Channel, ChannelFactory, Environment, Error, Inbound, InboundSender, Port, Storage, StorageChange,
};

/// Serialize a structured-clone value back to JSON text.
pub(crate) fn to_json(value: &JsValue) -> Result<String, Error> {
	let text: JsValue = js_sys::JSON::stringify(value)?.into();
	text.as_string()
		.ok_or_else(|| Error::Malformed("not JSON-serializable".to_string()))
}

pub(crate) fn from_json(data: &str) -> Result<JsValue, Error> {
	Ok(js_sys::JSON::parse(data)?)
}

/// The primitives of the current window.
pub struct WebEnvironment {
	window: Option<web_sys::Window>,
}

impl WebEnvironment {
	pub fn new() -> Self {
		Self {
			window: web_sys::window(),
		}
	}

	fn has(&self, name: &str) -> bool {
		self.window
			.as_ref()
			.is_some_and(|window| js_sys::Reflect::has(window, &JsValue::from_str(name)).unwrap_or(false))
	}

	fn window(&self) -> Result<&web_sys::Window, Error> {
		self.window.as_ref().ok_or(Error::Unsupported)
	}
}

impl Default for WebEnvironment {
	fn default() -> Self {
		Self::new()
	}
}

impl Environment for WebEnvironment {
	fn capabilities(&self) -> Capabilities {
		Capabilities {
			broadcast_channel: self.has("BroadcastChannel"),
			shared_worker: self.has("SharedWorker"),
			local_storage: self.has("localStorage"),
		}
	}

	fn broadcast_channel(&self) -> Result<Box<dyn ChannelFactory>, Error> {
		Ok(Box::new(WebChannelFactory))
	}

	fn shared_worker(&self, url: &str, name: &str, inbound: InboundSender) -> Result<Box<dyn Port>, Error> {
		Ok(Box::new(WebPort::new(url, name, inbound)?))
	}

	fn local_storage(&self, inbound: InboundSender) -> Result<Box<dyn Storage>, Error> {
		let window = self.window()?;
		let storage = window.local_storage()?.ok_or(Error::Unsupported)?;
		Ok(Box::new(WebStorage::new(window.clone(), storage, inbound)?))
	}
}

struct WebChannelFactory;

impl ChannelFactory for WebChannelFactory {
	fn open(&self, name: &str, topic: &str, inbound: InboundSender) -> Result<Box<dyn Channel>, Error> {
		let inner = web_sys::BroadcastChannel::new(name)?;
		let topic = topic.to_string();

		let on_message = Closure::wrap(Box::new(move |e: JsValue| {
			let e: web_sys::MessageEvent = e.unchecked_into();

			match to_json(&e.data()) {
				Ok(data) => {
					inbound
						.send(Inbound::Channel {
							topic: topic.clone(),
							data,
						})
						.ok();
				}
				Err(err) => tracing::warn!(%topic, %err, "dropping message"),
			}
		}) as Box<dyn FnMut(_)>);

		inner.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

		Ok(Box::new(WebChannel { inner, on_message }))
	}
}

struct WebChannel {
	inner: web_sys::BroadcastChannel,

	// Held to avoid dropping it.
	#[allow(dead_code)]
	on_message: Closure<dyn FnMut(JsValue)>,
}

impl Channel for WebChannel {
	fn post(&self, data: &str) -> Result<(), Error> {
		self.inner.post_message(&from_json(data)?)?;
		Ok(())
	}
}

impl Drop for WebChannel {
	fn drop(&mut self) {
		self.inner.set_onmessage(None);
		self.inner.close();
	}
}

struct WebPort {
	// The worker stays alive as long as a port is open, but keep the handle anyway.
	#[allow(dead_code)]
	worker: web_sys::SharedWorker,
	port: web_sys::MessagePort,

	#[allow(dead_code)]
	on_message: Closure<dyn FnMut(JsValue)>,
}

impl WebPort {
	fn new(url: &str, name: &str, inbound: InboundSender) -> Result<Self, Error> {
		let worker = web_sys::SharedWorker::new_with_str(url, name)?;
		let port = worker.port();

		let on_message = Closure::wrap(Box::new(move |e: JsValue| {
			let e: web_sys::MessageEvent = e.unchecked_into();

			match to_json(&e.data()) {
				Ok(data) => {
					inbound.send(Inbound::Relay { data }).ok();
				}
				Err(err) => tracing::warn!(%err, "dropping message"),
			}
		}) as Box<dyn FnMut(_)>);

		port.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
		port.start();

		Ok(Self {
			worker,
			port,
			on_message,
		})
	}
}

impl Port for WebPort {
	fn post(&self, data: &str) -> Result<(), Error> {
		self.port.post_message(&from_json(data)?)?;
		Ok(())
	}
}

impl Drop for WebPort {
	fn drop(&mut self) {
		self.port.set_onmessage(None);
		self.port.close();
	}
}

struct WebStorage {
	window: web_sys::Window,
	storage: web_sys::Storage,
	on_storage: Closure<dyn FnMut(JsValue)>,
}

impl WebStorage {
	fn new(window: web_sys::Window, storage: web_sys::Storage, inbound: InboundSender) -> Result<Self, Error> {
		let on_storage = Closure::wrap(Box::new(move |e: JsValue| {
			let e: web_sys::StorageEvent = e.unchecked_into();

			let change = StorageChange {
				key: e.key(),
				old_value: e.old_value(),
				new_value: e.new_value(),
			};

			inbound.send(Inbound::Storage(change)).ok();
		}) as Box<dyn FnMut(_)>);

		window.add_event_listener_with_callback("storage", on_storage.as_ref().unchecked_ref())?;

		Ok(Self {
			window,
			storage,
			on_storage,
		})
	}
}

impl Storage for WebStorage {
	fn get(&self, key: &str) -> Result<Option<String>, Error> {
		Ok(self.storage.get_item(key)?)
	}

	fn set(&self, key: &str, value: &str) -> Result<(), Error> {
		Ok(self.storage.set_item(key, value)?)
	}

	fn remove(&self, key: &str) -> Result<(), Error> {
		Ok(self.storage.remove_item(key)?)
	}
}

impl Drop for WebStorage {
	fn drop(&mut self) {
		let _ = self
			.window
			.remove_event_listener_with_callback("storage", self.on_storage.as_ref().unchecked_ref());
	}
}
