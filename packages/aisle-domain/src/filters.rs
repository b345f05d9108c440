use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const FILTER_KEYS: [&str; 5] = ["category", "min_price", "max_price", "material", "brand"];

/// Structured filters pulled out of a free-text shopping query.
///
/// Only `category` and the price bounds constrain strict matching; `material` and `brand` are
/// carried for reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductFilters {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub min_price: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_price: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub material: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub brand: Option<String>,
}
impl ProductFilters {
	/// Builds filters from a loosely-typed object, keeping only recognised keys with usable
	/// values. Keys whose values cannot be interpreted are reported in the second element.
	pub fn from_object(map: &Map<String, Value>) -> (Self, Vec<String>) {
		let mut rejected = Vec::new();
		let mut text = |key: &str| match map.get(key) {
			None | Some(Value::Null) => None,
			Some(value) => {
				let parsed = loose_text(value);

				if parsed.is_none() {
					rejected.push(key.to_string());
				}

				parsed
			},
		};
		let category = text("category");
		let material = text("material");
		let brand = text("brand");
		let mut price = |key: &str| match map.get(key) {
			None | Some(Value::Null) => None,
			Some(value) => {
				let parsed = parse_price(value);

				if parsed.is_none() {
					rejected.push(key.to_string());
				}

				parsed
			},
		};
		let min_price = price("min_price");
		let max_price = price("max_price");

		(Self { category, min_price, max_price, material, brand }, rejected)
	}

	pub fn is_empty(&self) -> bool {
		self.category.is_none()
			&& self.min_price.is_none()
			&& self.max_price.is_none()
			&& self.material.is_none()
			&& self.brand.is_none()
	}

	/// Category check: a document with an empty category is never excluded.
	pub fn matches_category(&self, doc_category: &str) -> bool {
		let Some(wanted) = self.category.as_deref() else {
			return true;
		};

		if doc_category.trim().is_empty() {
			return true;
		}

		doc_category.to_lowercase().contains(&wanted.to_lowercase())
	}

	pub fn matches_price(&self, price: f64) -> bool {
		if self.min_price.is_some_and(|min| price < min) {
			return false;
		}

		self.within_ceiling(price)
	}

	pub fn within_ceiling(&self, price: f64) -> bool {
		self.max_price.is_none_or(|max| price <= max)
	}
}

/// Interprets a catalog or model-supplied price: JSON numbers, or strings such as `"$1,299.00"`.
/// Negative and non-finite values are rejected.
pub fn parse_price(value: &Value) -> Option<f64> {
	let price = match value {
		Value::Number(number) => number.as_f64()?,
		Value::String(raw) => {
			let cleaned: String =
				raw.trim().trim_start_matches('$').chars().filter(|c| *c != ',').collect();

			cleaned.trim().parse::<f64>().ok()?
		},
		_ => return None,
	};

	(price.is_finite() && price >= 0.0).then_some(price)
}

fn loose_text(value: &Value) -> Option<String> {
	let text = match value {
		Value::String(raw) => raw.trim().to_string(),
		Value::Number(number) => number.to_string(),
		_ => return None,
	};

	(!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn object(value: Value) -> Map<String, Value> {
		value.as_object().cloned().expect("Expected an object.")
	}

	#[test]
	fn keeps_known_keys_and_ignores_the_rest() {
		let (filters, rejected) = ProductFilters::from_object(&object(serde_json::json!({
			"category": "cleaner",
			"material": "stainless",
			"max_price": 15,
			"color": "red"
		})));

		assert_eq!(filters.category.as_deref(), Some("cleaner"));
		assert_eq!(filters.material.as_deref(), Some("stainless"));
		assert_eq!(filters.max_price, Some(15.0));
		assert!(filters.brand.is_none());
		assert!(rejected.is_empty());
	}

	#[test]
	fn accepts_price_strings_and_reports_garbage() {
		let (filters, rejected) = ProductFilters::from_object(&object(serde_json::json!({
			"min_price": "$1,000",
			"max_price": "cheap",
			"brand": ""
		})));

		assert_eq!(filters.min_price, Some(1_000.0));
		assert!(filters.max_price.is_none());
		assert!(filters.brand.is_none());
		assert_eq!(rejected, vec!["brand".to_string(), "max_price".to_string()]);
	}

	#[test]
	fn category_is_a_case_insensitive_substring() {
		let filters = ProductFilters { category: Some("Board".to_string()), ..Default::default() };

		assert!(filters.matches_category("Sports > Skateboards & Longboards"));
		assert!(filters.matches_category(""));
		assert!(!filters.matches_category("Kitchen > Kettles"));
	}

	#[test]
	fn price_bounds_are_inclusive() {
		let filters =
			ProductFilters { min_price: Some(20.0), max_price: Some(40.0), ..Default::default() };

		assert!(filters.matches_price(20.0));
		assert!(filters.matches_price(40.0));
		assert!(!filters.matches_price(19.99));
		assert!(!filters.matches_price(40.01));
		assert!(filters.within_ceiling(5.0));
	}

	#[test]
	fn parse_price_rejects_negative_and_non_numeric() {
		assert_eq!(parse_price(&Value::from(12.5)), Some(12.5));
		assert_eq!(parse_price(&Value::String(" 7 ".to_string())), Some(7.0));
		assert_eq!(parse_price(&Value::from(-1)), None);
		assert_eq!(parse_price(&Value::String("N/A".to_string())), None);
		assert_eq!(parse_price(&Value::Bool(true)), None);
	}
}
