//! Filter extraction, similarity search and progressive relaxation over the product index.
//!
//! Candidates are the top `k * candidate_multiplier` neighbors. Strict filtering keeps the first
//! `k` candidates passing the category and price-range checks. When none pass, the top `k`
//! candidates by raw similarity are used instead, filtered by the price ceiling only. Whatever
//! path produced the set, the ceiling is applied once more before returning.

use serde::Serialize;

use aisle_domain::{
	filters::{self, ProductFilters},
	json_object,
};
use aisle_storage::vector::{Neighbor, VectorStore};

use crate::{AisleService, Error, Result, prompts, state::Document};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalPath {
	Strict,
	Relaxed,
}

#[derive(Debug, Clone)]
pub struct Retrieval {
	pub filters: ProductFilters,
	pub path: RetrievalPath,
	/// Neighbors considered before filtering.
	pub candidates: usize,
	/// Documents removed by the final price-ceiling pass.
	pub backstop_dropped: usize,
	pub documents: Vec<Document>,
}

impl AisleService {
	/// Asks the filter extractor for structured filters. Failures are logged and yield no
	/// filters; retrieval continues unfiltered.
	pub async fn extract_filters(&self, query: &str) -> ProductFilters {
		let messages = prompts::filter_messages(query);

		match self
			.providers
			.completion
			.complete(&self.cfg.providers.filter_extractor, &messages)
			.await
		{
			Ok(raw) => parse_filters(&raw),
			Err(err) => {
				tracing::warn!(error = %err, "Filter extraction failed. Searching without filters.");

				ProductFilters::default()
			},
		}
	}

	pub async fn retrieve(&self, query: &str, k: usize) -> Result<Retrieval> {
		let filters = self.extract_filters(query).await;
		let texts = [query.to_string()];
		let vectors = self.providers.embedding.embed(&self.cfg.providers.embedding, &texts).await?;
		let Some(vector) = vectors.into_iter().next() else {
			return Err(Error::Provider {
				message: "Embedding provider returned no vectors.".to_string(),
			});
		};
		let limit = k.saturating_mul(self.cfg.retrieval.candidate_multiplier as usize);
		let neighbors = self.store.search(&vector, limit)?;
		let retrieval = select(&self.store, &neighbors, filters, k);

		tracing::info!(
			candidates = retrieval.candidates,
			path = ?retrieval.path,
			documents = retrieval.documents.len(),
			filters = ?retrieval.filters,
			"Retrieval finished."
		);

		Ok(retrieval)
	}
}

/// Reads filters from extractor output. Output without a JSON object yields no filters.
pub fn parse_filters(raw: &str) -> ProductFilters {
	let Some(map) = json_object::first_json_object(raw) else {
		tracing::debug!("Filter extractor output held no JSON object.");

		return ProductFilters::default();
	};
	let (filters, rejected) = ProductFilters::from_object(&map);

	if !rejected.is_empty() {
		tracing::warn!(keys = ?rejected, "Dropped filter values that could not be interpreted.");
	}

	filters
}

/// Applies strict filtering, relaxation and the price-ceiling backstop to ranked neighbors.
pub fn select(
	store: &VectorStore,
	neighbors: &[Neighbor],
	filters: ProductFilters,
	k: usize,
) -> Retrieval {
	let mut documents = Vec::with_capacity(k);

	for neighbor in neighbors {
		if documents.len() >= k {
			break;
		}

		let Some((row, price)) = priced_row(store, neighbor) else {
			continue;
		};

		if filters.matches_category(row.category.as_deref().unwrap_or_default())
			&& filters.matches_price(price)
		{
			documents.push(Document::from_row(row, price, neighbor.score));
		}
	}

	let path = if documents.is_empty() {
		documents = neighbors
			.iter()
			.take(k)
			.filter_map(|neighbor| {
				priced_row(store, neighbor)
					.filter(|(_, price)| filters.within_ceiling(*price))
					.map(|(row, price)| Document::from_row(row, price, neighbor.score))
			})
			.collect();

		RetrievalPath::Relaxed
	} else {
		RetrievalPath::Strict
	};
	let before = documents.len();

	documents.retain(|doc| filters.within_ceiling(doc.price));

	let backstop_dropped = before - documents.len();

	if backstop_dropped > 0 {
		tracing::warn!(dropped = backstop_dropped, "Price ceiling removed retrieved documents.");
	}

	Retrieval { filters, path, candidates: neighbors.len(), backstop_dropped, documents }
}

fn priced_row<'a>(
	store: &'a VectorStore,
	neighbor: &Neighbor,
) -> Option<(&'a aisle_storage::catalog::CatalogRow, f64)> {
	let row = store.row(neighbor.row)?;

	match filters::parse_price(&row.price) {
		Some(price) => Some((row, price)),
		None => {
			tracing::debug!(product_id = %row.product_id, "Skipping product without a usable price.");

			None
		},
	}
}
