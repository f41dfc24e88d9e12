use thiserror::Error;

/// Errors raised while preparing or running a fuzz pass.
///
/// Everything except [`Error::Synthesis`] is fatal and aborts the run before
/// any dispatch begins. A synthesis failure only skips one endpoint iteration.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid target URL {0}")]
    InvalidTarget(String),

    #[error("fuzz count must be between 1 and {max}, got {count}")]
    FuzzCountOutOfRange { count: u32, max: u32 },

    #[error("invalid header format: {0}")]
    InvalidHeader(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to fetch description: {0}")]
    Fetch(#[source] reqwest::Error),

    #[error("failed to fetch description {url}: HTTP {status}")]
    FetchStatus { url: String, status: u16 },

    #[error("JSON parsing error {0}")]
    Parse(#[from] serde_json::Error),

    #[error("description has no host field")]
    MissingHost,

    #[error("null or empty servers array in OpenAPI definition")]
    MissingServers,

    #[error("invalid base URL {0}")]
    InvalidBaseUrl(String),

    #[error("couldn't build fuzzable URL for {path} after {attempts} attempts")]
    Synthesis { path: String, attempts: usize },

    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
