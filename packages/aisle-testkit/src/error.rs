pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid fixture: {0}")]
	Fixture(String),
	#[error("Fixture I/O failed: {0}")]
	Io(#[from] std::io::Error),
	#[error("Fixture JSON failed: {0}")]
	Json(#[from] serde_json::Error),
}
