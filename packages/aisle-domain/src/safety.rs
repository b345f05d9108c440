pub const SAFETY_FLAGS: [&str; 5] =
	["adult_content", "age_restricted", "hazardous_material", "medical_claim", "weapon"];

/// Keeps recognised safety flags, normalised to lowercase snake case, without duplicates.
pub fn sanitize_flags<I, S>(flags: I) -> Vec<String>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut out: Vec<String> = Vec::new();

	for flag in flags {
		let normalized = flag.as_ref().trim().to_lowercase().replace([' ', '-'], "_");

		if SAFETY_FLAGS.contains(&normalized.as_str()) && !out.contains(&normalized) {
			out.push(normalized);
		}
	}

	out
}
