use serde::Serializer;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Writes a timestamp as an RFC 3339 string.
pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	let formatted = value.format(&Rfc3339).map_err(serde::ser::Error::custom)?;

	serializer.serialize_str(&formatted)
}
