use std::cmp::Ordering;

use crate::{
	Error, Result,
	catalog::{self, CatalogRow},
};

/// A nearest-neighbor hit: the catalog row index and its inner-product score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
	pub row: usize,
	pub score: f32,
}

/// Exhaustive inner-product index over L2-normalized catalog embeddings.
///
/// Built once at startup and read-only afterwards; share it behind an `Arc`.
#[derive(Debug)]
pub struct VectorStore {
	rows: Vec<CatalogRow>,
	matrix: Vec<f32>,
	dimensions: usize,
}
impl VectorStore {
	pub fn load(cfg: &aisle_config::Catalog) -> Result<Self> {
		let dimensions = cfg.dimensions as usize;
		let rows = catalog::load_rows(&cfg.products_path)?;
		let matrix = catalog::load_matrix(&cfg.embeddings_path, dimensions)?;
		let store = Self::from_parts(rows, matrix, dimensions)?;

		tracing::info!(
			products = store.len(),
			dimensions,
			path = %cfg.products_path.display(),
			"Vector store loaded."
		);

		Ok(store)
	}

	/// Builds the index from rows and a row-major matrix in the same order, normalizing each
	/// embedding row in place.
	pub fn from_parts(rows: Vec<CatalogRow>, mut matrix: Vec<f32>, dimensions: usize) -> Result<Self> {
		if dimensions == 0 {
			return Err(Error::Shape("dimensions must be greater than zero.".to_string()));
		}
		if matrix.len() != rows.len() * dimensions {
			return Err(Error::Shape(format!(
				"{} catalog rows but {} embedding values at {dimensions} dimensions.",
				rows.len(),
				matrix.len()
			)));
		}

		if let Some(idx) = matrix.iter().position(|value| !value.is_finite()) {
			return Err(Error::Shape(format!(
				"embedding row {} holds a non-finite value.",
				idx / dimensions
			)));
		}

		for row in matrix.chunks_exact_mut(dimensions) {
			normalize(row);
		}

		Ok(Self { rows, matrix, dimensions })
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn dimensions(&self) -> usize {
		self.dimensions
	}

	pub fn row(&self, idx: usize) -> Option<&CatalogRow> {
		self.rows.get(idx)
	}

	/// Returns up to `limit` rows ranked by descending cosine similarity to `query`.
	/// Ties keep catalog order. A non-finite query is rejected.
	pub fn search(&self, query: &[f32], limit: usize) -> Result<Vec<Neighbor>> {
		if query.len() != self.dimensions {
			return Err(Error::DimensionMismatch { expected: self.dimensions, actual: query.len() });
		}

		if query.iter().any(|value| !value.is_finite()) {
			return Err(Error::NonFiniteQuery);
		}

		let mut needle = query.to_vec();

		normalize(&mut needle);

		let mut hits: Vec<Neighbor> = self
			.matrix
			.chunks_exact(self.dimensions)
			.enumerate()
			.map(|(row, embedding)| Neighbor { row, score: dot(embedding, &needle) })
			.collect();
		let limit = limit.min(hits.len());

		if limit == 0 {
			return Ok(Vec::new());
		}
		if limit < hits.len() {
			hits.select_nth_unstable_by(limit - 1, rank_order);
			hits.truncate(limit);
		}

		hits.sort_by(rank_order);

		Ok(hits)
	}
}

/// Scales `vec` to unit length. Zero vectors are left untouched.
pub fn normalize(vec: &mut [f32]) {
	let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();

	if norm > 0.0 && norm.is_finite() {
		for value in vec.iter_mut() {
			*value /= norm;
		}
	}
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
	a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn rank_order(a: &Neighbor, b: &Neighbor) -> Ordering {
	b.score.total_cmp(&a.score).then(a.row.cmp(&b.row))
}
