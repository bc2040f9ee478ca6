use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;
use wasm_bindgen::JsValue;

/// Send `tracing` output at `level` and above to the browser console.
///
/// Does nothing if a global subscriber is already installed.
pub fn init_logging(level: Level) {
	if tracing::dispatcher::has_been_set() {
		return;
	}

	let subscriber = tracing_subscriber::fmt()
		.with_max_level(level)
		.with_writer(Console)
		.with_ansi(false)
		.without_time()
		.finish();

	let _ = tracing::subscriber::set_global_default(subscriber);
}

struct Console;

impl<'a> MakeWriter<'a> for Console {
	type Writer = ConsoleWriter;

	fn make_writer(&'a self) -> Self::Writer {
		ConsoleWriter {
			level: Level::INFO,
			buffer: Vec::new(),
		}
	}

	fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
		ConsoleWriter {
			level: *meta.level(),
			buffer: Vec::new(),
		}
	}
}

/// Buffers one formatted event and logs it on drop.
struct ConsoleWriter {
	level: Level,
	buffer: Vec<u8>,
}

impl io::Write for ConsoleWriter {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.buffer.extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

impl Drop for ConsoleWriter {
	fn drop(&mut self) {
		let line = String::from_utf8_lossy(&self.buffer);
		let line = JsValue::from_str(line.trim_end());

		match self.level {
			Level::ERROR => web_sys::console::error_1(&line),
			Level::WARN => web_sys::console::warn_1(&line),
			Level::INFO => web_sys::console::info_1(&line),
			_ => web_sys::console::debug_1(&line),
		}
	}
}
