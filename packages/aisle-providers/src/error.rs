pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("HTTP request failed: {0}")]
	Http(#[from] reqwest::Error),
	#[error("Invalid header name: {0}")]
	HeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error("Invalid header value: {0}")]
	HeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("Provider {provider_id} returned HTTP {status}: {body}")]
	Status { provider_id: String, status: u16, body: String },
	#[error("Invalid provider config: {message}")]
	InvalidConfig { message: String },
	#[error("Invalid provider response: {message}")]
	InvalidResponse { message: String },
}
