#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("messaging is not supported")]
	Unsupported,

	#[error("invalid target: {0}")]
	InvalidTarget(String),

	#[error("malformed message: {0}")]
	Malformed(String),

	#[error("json error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("disconnected")]
	Disconnected,

	#[cfg(target_arch = "wasm32")]
	#[error("unknown error: {0:?}")]
	Unknown(wasm_bindgen::JsValue),
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for Error {
	fn from(e: wasm_bindgen::JsValue) -> Self {
		Self::Unknown(e)
	}
}

pub type Result<T> = std::result::Result<T, Error>;
