use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use web_sys::js_sys;

use crate::{Connection, ConnectionId, Error, Relay};

struct WebConnection {
	port: web_sys::MessagePort,

	// Held to avoid dropping it.
	#[allow(dead_code)]
	on_message: Closure<dyn FnMut(JsValue)>,
}

impl Connection for WebConnection {
	type Message = JsValue;

	fn post(&self, message: &JsValue) -> Result<(), Error> {
		self.port.post_message(message)?;
		Ok(())
	}
}

impl Drop for WebConnection {
	fn drop(&mut self) {
		self.port.set_onmessage(None);
		self.port.close();
	}
}

/// Turn the current shared worker into a relay: every message received from one context is posted unmodified to all others.
///
/// Must be called from a `SharedWorkerGlobalScope`, once.
///
/// A connection is only dropped when posting to it fails. The port of a closed tab usually doesn't fail, so in a
/// long-lived worker the connection list keeps growing with every context that ever connected.
pub fn run_relay() -> Result<(), Error> {
	let scope: web_sys::SharedWorkerGlobalScope = js_sys::global().dyn_into().map_err(|_| Error::Unsupported)?;
	let relay: Rc<Relay<WebConnection>> = Rc::new(Relay::new());

	let on_connect = Closure::wrap(Box::new(move |e: JsValue| {
		let e: web_sys::MessageEvent = e.unchecked_into();

		let Ok(port) = e.ports().get(0).dyn_into::<web_sys::MessagePort>() else {
			tracing::warn!("connect event without a port");
			return;
		};

		relay.connect(|id| connection(Rc::downgrade(&relay), id, port));
	}) as Box<dyn FnMut(_)>);

	scope.set_onconnect(Some(on_connect.as_ref().unchecked_ref()));

	// The worker lives as long as the relay does.
	on_connect.forget();

	Ok(())
}

fn connection(relay: Weak<Relay<WebConnection>>, id: ConnectionId, port: web_sys::MessagePort) -> WebConnection {
	let on_message = Closure::wrap(Box::new(move |e: JsValue| {
		let e: web_sys::MessageEvent = e.unchecked_into();

		if let Some(relay) = relay.upgrade() {
			relay.forward(id, &e.data());
		}
	}) as Box<dyn FnMut(_)>);

	port.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
	port.start();

	WebConnection { port, on_message }
}
