use std::cell::OnceCell;

use serde::Serialize;

use super::{init_logging, WebEnvironment};
use crate::{Callback, Error, Hermes, HermesConfig, Target};

thread_local! {
	static HERMES: OnceCell<Hermes> = const { OnceCell::new() };
}

/// Create the instance for this context with `config`, if it doesn't exist yet, and start delivering inbound messages.
///
/// Later calls return the existing instance and ignore `config`.
pub fn init(config: HermesConfig) -> Hermes {
	HERMES.with(|cell| cell.get_or_init(|| start(config)).clone())
}

/// The instance for this context, created with the default config on first use.
pub fn hermes() -> Hermes {
	init(HermesConfig::default())
}

fn start(config: HermesConfig) -> Hermes {
	// Warnings (like an unsupported browser) go to the console unless the app installed its own subscriber.
	init_logging(tracing::Level::WARN);

	let (hermes, inbox) = config.build(&WebEnvironment::new());

	let runner = hermes.clone();
	web_async::spawn(async move { runner.run(inbox).await });

	hermes
}

pub fn on(topic: &str, callback: &Callback) {
	hermes().on(topic, callback)
}

pub fn off(topic: &str, callback: Option<&Callback>) {
	hermes().off(topic, callback)
}

pub fn send<T: Serialize + ?Sized>(topic: &str, data: &T) -> Result<(), Error> {
	hermes().send(topic, data)
}

pub fn send_to<T: Serialize + ?Sized>(topic: &str, data: &T, target: Target) -> Result<(), Error> {
	hermes().send_to(topic, data, target)
}
