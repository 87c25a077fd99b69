#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Vector store error: {message}")]
	Qdrant { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
impl From<scholar_storage::Error> for Error {
	fn from(err: scholar_storage::Error) -> Self {
		match err {
			scholar_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			scholar_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			scholar_storage::Error::Qdrant { status, message } =>
				Self::Qdrant { message: format!("status {status}: {message}") },
			other => Self::Storage { message: other.to_string() },
		}
	}
}
impl From<scholar_providers::Error> for Error {
	fn from(err: scholar_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
