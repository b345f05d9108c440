use serde_json::Value;

use aisle_storage::{Error, vector::VectorStore};
use aisle_testkit::{KEYWORD_DIMENSIONS, TestCatalog, keyword_embedding, product};

fn catalog_config(catalog: &TestCatalog) -> aisle_config::Catalog {
	aisle_config::Catalog {
		products_path: catalog.products_path().to_path_buf(),
		embeddings_path: catalog.embeddings_path().to_path_buf(),
		dimensions: catalog.dimensions() as u32,
	}
}

#[test]
fn loads_catalog_and_finds_nearest_product() {
	let products = vec![
		product("p1", "Bamboo Cutting Board", Value::from(24.0), "Kitchen", "Grove"),
		product("p2", "Drop-Through Longboard", Value::from(189.0), "Skateboards", "Loaded"),
		product("p3", "Stainless Kettle", Value::String("$39.99".to_string()), "Kitchen", "Brew"),
	];
	let catalog = TestCatalog::with_keyword_embeddings(&products).expect("Failed to write catalog.");
	let store = VectorStore::load(&catalog_config(&catalog)).expect("Failed to load store.");

	assert_eq!(store.len(), 3);
	assert_eq!(store.dimensions(), KEYWORD_DIMENSIONS);

	let query = keyword_embedding("longboard for cruising", KEYWORD_DIMENSIONS);
	let hits = store.search(&query, 2).expect("search failed");
	let top = store.row(hits[0].row).expect("Missing top row.");

	assert_eq!(top.product_id, "p2");
	assert!(hits[0].score >= hits[1].score);
}

#[test]
fn duplicate_product_ids_are_rejected() {
	let products = vec![
		product("p1", "Yoga Mat", Value::from(30.0), "Fitness", "Flow"),
		product("p1", "Yoga Block", Value::from(12.0), "Fitness", "Flow"),
	];
	let catalog = TestCatalog::with_keyword_embeddings(&products).expect("Failed to write catalog.");
	let err = VectorStore::load(&catalog_config(&catalog)).expect_err("Expected duplicate error.");

	assert!(matches!(err, Error::DuplicateProduct { ref product_id } if product_id == "p1"));
}

#[test]
fn matrix_must_match_row_count() {
	let products = vec![product("p1", "Yoga Mat", Value::from(30.0), "Fitness", "Flow")];
	let catalog = TestCatalog::write(&products, &[vec![1.0, 0.0]], 2)
		.expect("Failed to write catalog.");
	let mut cfg = catalog_config(&catalog);

	cfg.dimensions = 1;

	let err = VectorStore::load(&cfg).expect_err("Expected shape error.");

	assert!(matches!(err, Error::Shape(_)));
}

#[test]
fn corrupt_embeddings_are_rejected_at_load() {
	let products: Vec<Value> = (0..200)
		.map(|idx| product(&format!("p{idx}"), "Yoga Mat", Value::from(30.0), "Fitness", "Flow"))
		.collect();
	let embeddings: Vec<Vec<f32>> = (0..200)
		.map(|idx| if idx % 3 == 0 { vec![f32::NAN, 0.0] } else { vec![1.0, idx as f32] })
		.collect();
	let catalog = TestCatalog::write(&products, &embeddings, 2).expect("Failed to write catalog.");
	let err = VectorStore::load(&catalog_config(&catalog)).expect_err("Expected shape error.");

	assert!(matches!(err, Error::Shape(_)), "Unexpected error: {err}");
}
