//! Rendering endpoints into concrete request URLs.

use tracing::debug;
use url::Url;

use crate::endpoint::{Endpoint, Parameter};
use crate::error::{Error, Result};
use crate::fuzz::ValueGenerator;

/// How many sets of random values are tried before giving up on an endpoint.
pub const SYNTHESIS_ATTEMPTS: usize = 10;

/// Fills in `endpoint`'s path template and query string.
///
/// Path variables replace exactly one `{name}` occurrence; every other
/// parameter becomes `name=value` in declaration order.
pub fn render_path<F>(endpoint: &Endpoint, mut value_for: F) -> String
where
    F: FnMut(&Parameter) -> String,
{
    let mut rendered = format!("{}?", endpoint.path());
    let mut has_query = false;

    for param in endpoint.parameters() {
        let value = value_for(param);
        if param.is_path_variable() {
            rendered = rendered.replacen(&param.placeholder(), &value, 1);
        } else {
            if has_query {
                rendered.push('&');
            }
            rendered.push_str(param.name());
            rendered.push('=');
            rendered.push_str(&value);
            has_query = true;
        }
    }

    if !has_query {
        rendered.pop();
    }
    rendered
}

/// Produces one URL per call for a given host and scheme.
pub struct UrlSynthesizer {
    base_url: String,
    scheme: String,
    fuzz_word: Option<String>,
    values: ValueGenerator,
}

impl UrlSynthesizer {
    pub fn new(
        base_url: impl Into<String>,
        scheme: impl Into<String>,
        fuzz_word: Option<String>,
        values: ValueGenerator,
    ) -> Self {
        UrlSynthesizer {
            base_url: base_url.into(),
            scheme: scheme.into(),
            fuzz_word,
            values,
        }
    }

    /// Renders a fresh URL for `endpoint`.
    ///
    /// With a fuzz word every parameter gets that word verbatim; otherwise each
    /// parameter gets a new random value of its type. Values are redrawn until
    /// the result parses as a URL, up to [`SYNTHESIS_ATTEMPTS`] times.
    pub fn synthesize(&mut self, endpoint: &Endpoint) -> Result<String> {
        for attempt in 1..=SYNTHESIS_ATTEMPTS {
            let path = match &self.fuzz_word {
                Some(word) => render_path(endpoint, |_| word.clone()),
                None => {
                    let values = &mut self.values;
                    render_path(endpoint, |param| values.generate(param.param_type()).to_string())
                }
            };

            let candidate = self.qualify(&path);
            match Url::parse(&candidate) {
                Ok(_) => return Ok(candidate),
                Err(e) => debug!(
                    "Attempt {} for {} is not a URL ({}): {}",
                    attempt,
                    endpoint.path(),
                    e,
                    candidate
                ),
            }
        }

        Err(Error::Synthesis {
            path: endpoint.path().to_string(),
            attempts: SYNTHESIS_ATTEMPTS,
        })
    }

    /// Joins the base URL and a rendered path, adding the scheme when the base
    /// does not already carry one.
    fn qualify(&self, path: &str) -> String {
        let url = format!("{}{}", self.base_url, path);
        let prefix = format!("{}://", self.scheme);
        if url.starts_with(&prefix) || url.starts_with("http://") || url.starts_with("https://") {
            url
        } else {
            format!("{}{}", prefix, url)
        }
    }
}
