//! Async helpers and utilities for WASM.
//!
//! The browser has a single thread and no executor of our own, so futures are spawned onto the microtask queue.
//! Natively the same code runs on a [tokio::task::LocalSet], which is how tests drive it.
use std::future::Future;

/// Spawn a `!Send` future on the current thread.
///
/// Natively this must be called from within a [tokio::task::LocalSet].
pub fn spawn<F: Future<Output = ()> + 'static>(f: F) {
	#[cfg(feature = "tracing")]
	let f = tracing::Instrument::in_current_span(f);

	#[cfg(target_arch = "wasm32")]
	wasm_bindgen_futures::spawn_local(f);

	#[cfg(not(target_arch = "wasm32"))]
	tokio::task::spawn_local(f);
}
