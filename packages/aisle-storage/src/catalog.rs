use std::{
	collections::HashSet,
	fs,
	path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// One product as stored in the catalog file.
///
/// `price` is kept as raw JSON because catalog exports mix numbers, currency strings and blanks;
/// interpretation happens at retrieval time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRow {
	pub product_id: String,
	pub name: String,
	#[serde(default)]
	pub price: Value,
	#[serde(default)]
	pub category: Option<String>,
	#[serde(default)]
	pub brand: Option<String>,
	#[serde(default)]
	pub material: Option<String>,
	#[serde(default)]
	pub description: Option<String>,
}

/// Reads a JSON Lines catalog. Blank lines are skipped; product ids must be unique.
pub fn load_rows(path: &Path) -> Result<Vec<CatalogRow>> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::Io { path: path.to_path_buf(), source: err })?;
	let mut rows = Vec::new();
	let mut seen = HashSet::new();

	for (idx, line) in raw.lines().enumerate() {
		if line.trim().is_empty() {
			continue;
		}

		let row: CatalogRow = serde_json::from_str(line).map_err(|err| Error::Row {
			path: PathBuf::from(path),
			line: idx + 1,
			source: err,
		})?;

		if !seen.insert(row.product_id.clone()) {
			return Err(Error::DuplicateProduct { product_id: row.product_id });
		}

		rows.push(row);
	}

	Ok(rows)
}

/// Reads a row-major little-endian `f32` matrix with `dimensions` columns. Every value must be
/// finite.
pub fn load_matrix(path: &Path, dimensions: usize) -> Result<Vec<f32>> {
	let bytes =
		fs::read(path).map_err(|err| Error::Io { path: path.to_path_buf(), source: err })?;

	decode_matrix(&bytes, dimensions)
}

fn decode_matrix(bytes: &[u8], dimensions: usize) -> Result<Vec<f32>> {
	let row_bytes = dimensions * size_of::<f32>();

	if row_bytes == 0 || bytes.len() % row_bytes != 0 {
		return Err(Error::Shape(format!(
			"embedding matrix has {} bytes, not a multiple of {row_bytes}.",
			bytes.len()
		)));
	}

	let matrix: Vec<f32> = bytes
		.chunks_exact(size_of::<f32>())
		.map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
		.collect();

	if let Some(idx) = matrix.iter().position(|value| !value.is_finite()) {
		return Err(Error::Shape(format!(
			"embedding matrix value {idx} (row {}) is not finite.",
			idx / dimensions
		)));
	}

	Ok(matrix)
}
