use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read {path:?}.")]
	Io { path: PathBuf, source: std::io::Error },
	#[error("Invalid catalog row at {path:?}:{line}.")]
	Row { path: PathBuf, line: usize, source: serde_json::Error },
	#[error("Duplicate product id {product_id} in catalog.")]
	DuplicateProduct { product_id: String },
	#[error("Vector dimension mismatch: expected {expected}, got {actual}.")]
	DimensionMismatch { expected: usize, actual: usize },
	#[error("Query vector holds a non-finite value.")]
	NonFiniteQuery,
	#[error("Invalid catalog shape: {0}")]
	Shape(String),
}
