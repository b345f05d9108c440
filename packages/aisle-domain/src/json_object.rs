//! Best-effort recovery of a JSON object embedded in free-form model output.
//!
//! Completion services are asked for bare JSON but routinely wrap it in prose or code fences.
//! Parsing runs in two phases: locate each balanced `{...}` candidate in order, then attempt a
//! strict parse of that slice. The first candidate that parses as an object wins.

use serde_json::{Map, Value};

/// Returns the first balanced `{...}` substring of `text` that parses as a JSON object.
pub fn first_json_object(text: &str) -> Option<Map<String, Value>> {
	let bytes = text.as_bytes();
	let mut start = 0;

	while let Some(offset) = text[start..].find('{') {
		let open = start + offset;

		if let Some(close) = matching_brace(bytes, open)
			&& let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&text[open..=close])
		{
			return Some(map);
		}

		start = open + 1;
	}

	None
}

/// Finds the index of the `}` closing the `{` at `open`, skipping braces inside string literals.
fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
	let mut depth = 0_usize;
	let mut in_string = false;
	let mut escaped = false;

	for (idx, &byte) in bytes.iter().enumerate().skip(open) {
		if in_string {
			match byte {
				_ if escaped => escaped = false,
				b'\\' => escaped = true,
				b'"' => in_string = false,
				_ => {},
			}

			continue;
		}

		match byte {
			b'"' => in_string = true,
			b'{' => depth += 1,
			b'}' => {
				depth -= 1;

				if depth == 0 {
					return Some(idx);
				}
			},
			_ => {},
		}
	}

	None
}
