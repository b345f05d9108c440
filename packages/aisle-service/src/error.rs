use crate::state::Stage;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Invalid {stage} response: {message}")]
	InvalidResponse { stage: Stage, message: String },
}
impl Error {
	pub(crate) fn invalid(stage: Stage, message: impl Into<String>) -> Self {
		Self::InvalidResponse { stage, message: message.into() }
	}
}

impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<aisle_storage::Error> for Error {
	fn from(err: aisle_storage::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
