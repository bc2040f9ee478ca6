//! Cross-tab publish/subscribe messaging.
//!
//! Browsing contexts of the same origin exchange topic-addressed JSON messages through whichever primitive the browser offers,
//! in order of preference:
//!
//! - [BroadcastChannel](https://developer.mozilla.org/en-US/docs/Web/API/BroadcastChannel), one channel per topic.
//! - [SharedWorker](https://developer.mozilla.org/en-US/docs/Web/API/SharedWorker), relaying each message to every other context (see [Relay]).
//! - [localStorage](https://developer.mozilla.org/en-US/docs/Web/API/Window/localStorage), writing and removing a key per message and listening for the `storage` event.
//!
//! If none are available every call logs a warning and does nothing.
//!
//! ```rs
//! let hermes = web_hermes::web::hermes();
//!
//! let callback = Callback::new(|payload| tracing::info!(?payload, "score"));
//! hermes.on("score", &callback);
//! hermes.send("score", &serde_json::json!({ "v": 1 }))?;
//! hermes.off("score", Some(&callback));
//! ```
//!
//! The core is independent of the browser: platform event handlers only push [Inbound] events onto a queue,
//! and [Hermes::dispatch] fans them out. Tests drive it with an in-memory [Environment].

mod backend;
mod envelope;
mod error;
mod hermes;
mod registry;
mod relay;
mod select;
mod target;
mod transport;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use backend::*;
pub use envelope::Envelope;
pub use error::*;
pub use hermes::*;
pub use registry::*;
pub use relay::*;
pub use select::*;
pub use target::*;
pub use transport::*;

/// Any JSON value.
pub type Payload = serde_json::Value;
