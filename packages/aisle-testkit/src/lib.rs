mod error;

pub use error::{Error, Result};

use std::{
	env, fs,
	path::{Path, PathBuf},
};

use serde_json::Value;
use uuid::Uuid;

pub const KEYWORD_DIMENSIONS: usize = 1024;

/// A catalog written to a private temp directory, removed on drop.
pub struct TestCatalog {
	dir: PathBuf,
	products_path: PathBuf,
	embeddings_path: PathBuf,
	dimensions: usize,
}
impl TestCatalog {
	/// Writes `products` as JSON Lines and embeds each one with [`keyword_embedding`] over its
	/// name, category, brand, material and description.
	pub fn with_keyword_embeddings(products: &[Value]) -> Result<Self> {
		let embeddings: Vec<Vec<f32>> = products
			.iter()
			.map(|product| keyword_embedding(&product_text(product), KEYWORD_DIMENSIONS))
			.collect();

		Self::write(products, &embeddings, KEYWORD_DIMENSIONS)
	}

	pub fn write(products: &[Value], embeddings: &[Vec<f32>], dimensions: usize) -> Result<Self> {
		if products.len() != embeddings.len() {
			return Err(Error::Fixture(format!(
				"{} products but {} embeddings.",
				products.len(),
				embeddings.len()
			)));
		}

		let dir = env::temp_dir().join(format!("aisle_test_{}", Uuid::new_v4().simple()));

		fs::create_dir_all(&dir)?;

		let products_path = dir.join("products.jsonl");
		let embeddings_path = dir.join("embeddings.f32");
		let mut lines = String::new();

		for product in products {
			lines.push_str(&serde_json::to_string(product)?);
			lines.push('\n');
		}

		fs::write(&products_path, lines)?;

		let mut bytes = Vec::with_capacity(embeddings.len() * dimensions * size_of::<f32>());

		for embedding in embeddings {
			if embedding.len() != dimensions {
				return Err(Error::Fixture(format!(
					"Embedding has {} values, expected {dimensions}.",
					embedding.len()
				)));
			}

			bytes.extend(embedding.iter().flat_map(|value| value.to_le_bytes()));
		}

		fs::write(&embeddings_path, bytes)?;

		Ok(Self { dir, products_path, embeddings_path, dimensions })
	}

	pub fn products_path(&self) -> &Path {
		&self.products_path
	}

	pub fn embeddings_path(&self) -> &Path {
		&self.embeddings_path
	}

	pub fn dimensions(&self) -> usize {
		self.dimensions
	}
}
impl Drop for TestCatalog {
	fn drop(&mut self) {
		if let Err(err) = fs::remove_dir_all(&self.dir) {
			eprintln!("Test catalog cleanup failed: {err}.");
		}
	}
}

/// Builds a catalog product row in the on-disk shape.
pub fn product(id: &str, name: &str, price: Value, category: &str, brand: &str) -> Value {
	serde_json::json!({
		"product_id": id,
		"name": name,
		"price": price,
		"category": category,
		"brand": brand,
		"material": "",
		"description": format!("{name} by {brand}."),
	})
}

/// Deterministic bag-of-words embedding: lowercase alphanumeric tokens hashed into buckets,
/// then L2-normalized. Texts sharing words score higher under inner product.
pub fn keyword_embedding(text: &str, dimensions: usize) -> Vec<f32> {
	let mut vec = vec![0.0_f32; dimensions.max(1)];
	let len = vec.len();

	for token in text
		.split(|c: char| !c.is_alphanumeric())
		.filter(|token| !token.is_empty())
		.map(str::to_lowercase)
	{
		vec[(fnv1a(token.as_bytes()) % len as u64) as usize] += 1.0;
	}

	let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();

	if norm > 0.0 {
		vec.iter_mut().for_each(|v| *v /= norm);
	}

	vec
}

fn product_text(product: &Value) -> String {
	["name", "category", "brand", "material", "description"]
		.iter()
		.filter_map(|key| product.get(*key).and_then(Value::as_str))
		.collect::<Vec<_>>()
		.join(" ")
}

fn fnv1a(bytes: &[u8]) -> u64 {
	let mut hash: u64 = 0xcbf2_9ce4_8422_2325;

	for byte in bytes {
		hash ^= u64::from(*byte);
		hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
	}

	hash
}
