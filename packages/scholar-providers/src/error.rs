pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
	#[error("Unknown model {model}: {detail}")]
	UnknownModel { model: String, detail: String },
	#[error("Provider returned status {status}: {detail}")]
	Http { status: u16, detail: String },
}
impl Error {
	/// Configuration mistakes need a different operator response than
	/// transient network trouble, so callers log them apart.
	pub fn is_configuration(&self) -> bool {
		matches!(self, Self::UnknownModel { .. } | Self::InvalidConfig { .. })
	}
}
