pub mod answerer;
pub mod pipeline;
pub mod planner;
pub mod prompts;
pub mod retrieval;
pub mod router;
pub mod state;
pub mod time_serde;

mod error;

pub use error::{Error, Result};
pub use retrieval::{Retrieval, RetrievalPath};
pub use state::{
	Constraints, Document, LogEntry, Plan, QueryState, Source, Stage, StageOutcome, Task,
};

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

use aisle_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use aisle_providers::{completion, embedding};
use aisle_storage::vector::VectorStore;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

/// A chat-completion backend. Router, planner, filter extraction and answer synthesis all go
/// through this seam with their own provider config.
pub trait CompletionProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub completion: Arc<dyn CompletionProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		completion: Arc<dyn CompletionProvider>,
	) -> Self {
		Self { embedding, completion }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), completion: provider }
	}
}

/// Everything a query needs: configuration, the shared read-only index and the providers.
pub struct AisleService {
	pub cfg: Config,
	pub store: Arc<VectorStore>,
	pub providers: Providers,
}
impl AisleService {
	pub fn new(cfg: Config, store: Arc<VectorStore>) -> Self {
		Self::with_providers(cfg, store, Providers::default())
	}

	pub fn with_providers(cfg: Config, store: Arc<VectorStore>, providers: Providers) -> Self {
		Self { cfg, store, providers }
	}
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, texts).await?) })
	}
}

impl CompletionProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(async move { Ok(completion::complete(cfg, messages).await?) })
	}
}
