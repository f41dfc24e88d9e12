//! Raw Swagger/OpenAPI description as it arrives over the wire.
//!
//! Only the fields needed to find GET parameters and the API host are
//! modelled. Every field decodes leniently: a value of the wrong shape is
//! treated as absent instead of failing the whole document.

use indexmap::IndexMap;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SwaggerSpec {
    #[serde(default, deserialize_with = "lenient")]
    pub swagger: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub openapi: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub host: Option<String>,
    #[serde(rename = "basePath", default, deserialize_with = "lenient")]
    pub base_path: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub servers: Option<Vec<Server>>,
    #[serde(default, deserialize_with = "lenient")]
    pub paths: Option<IndexMap<String, Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Server {
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem {
    #[serde(default, deserialize_with = "lenient")]
    pub parameters: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient")]
    pub get: Option<Operation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Operation {
    #[serde(default, deserialize_with = "lenient")]
    pub parameters: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawParameter {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(rename = "in", default, deserialize_with = "lenient")]
    pub location: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub param_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub required: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub schema: Option<RawSchema>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawSchema {
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub schema_type: Option<String>,
}

/// Decodes a field, mapping any shape mismatch to `None`.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Which description dialect a document is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Swagger2,
    OpenApi3,
}

impl SwaggerSpec {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Documents carrying an `openapi` field are 3.x; anything else is read
    /// as Swagger 2.0.
    pub fn dialect(&self) -> Dialect {
        if self.openapi.is_some() {
            Dialect::OpenApi3
        } else {
            Dialect::Swagger2
        }
    }

    /// Paths in document order, each decoded into a [`PathItem`].
    pub fn path_items(&self) -> impl Iterator<Item = (&str, PathItem)> + '_ {
        self.paths
            .iter()
            .flatten()
            .map(|(path, raw)| (path.as_str(), PathItem::from_value(raw)))
    }

    pub fn base_url_source(&self) -> Box<dyn BaseUrlSource + '_> {
        match self.dialect() {
            Dialect::Swagger2 => Box::new(SwaggerHost {
                host: self.host.as_deref(),
                base_path: self.base_path.as_deref(),
            }),
            Dialect::OpenApi3 => Box::new(OpenApiServers {
                servers: self.servers.as_deref().unwrap_or_default(),
            }),
        }
    }

    pub fn base_url(&self, description_url: &Url) -> Result<String> {
        self.base_url_source().base_url(description_url)
    }
}

impl PathItem {
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// Parameters that apply to the GET operation, path-level ones first.
    ///
    /// An operation parameter with the same name and location as a path-level
    /// one replaces it in place. A path without a GET operation has none.
    pub fn get_parameters(&self) -> Vec<RawParameter> {
        let Some(get) = &self.get else {
            return Vec::new();
        };

        let mut merged = decode_parameters(self.parameters.as_deref());
        for param in decode_parameters(get.parameters.as_deref()) {
            match merged
                .iter_mut()
                .find(|p| p.name == param.name && p.location == param.location)
            {
                Some(existing) => *existing = param,
                None => merged.push(param),
            }
        }
        merged
    }
}

fn decode_parameters(raw: Option<&[Value]>) -> Vec<RawParameter> {
    raw.unwrap_or_default()
        .iter()
        .filter_map(|value| {
            let param = serde_json::from_value::<RawParameter>(value.clone()).ok()?;
            if param.name.as_deref().map_or(true, str::is_empty) {
                debug!("Dropping parameter without a name: {}", value);
                return None;
            }
            Some(param)
        })
        .collect()
}

impl RawParameter {
    /// The declared type string, falling back to the OpenAPI 3.x schema.
    pub fn declared_type(&self) -> Option<&str> {
        self.param_type
            .as_deref()
            .or_else(|| self.schema.as_ref()?.schema_type.as_deref())
    }
}

/// Anything that yields the base URL requests are sent to.
pub trait BaseUrlSource {
    fn base_url(&self, description_url: &Url) -> Result<String>;
}

/// Swagger 2.0: `host` plus an optional `basePath`.
pub struct SwaggerHost<'a> {
    pub host: Option<&'a str>,
    pub base_path: Option<&'a str>,
}

impl BaseUrlSource for SwaggerHost<'_> {
    fn base_url(&self, _description_url: &Url) -> Result<String> {
        let host = self
            .host
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(Error::MissingHost)?;
        let mut base = host.trim_end_matches('/').to_string();

        if let Some(base_path) = self.base_path.map(|p| p.trim().trim_matches('/')) {
            if !base_path.is_empty() {
                base.push('/');
                base.push_str(base_path);
            }
        }
        Ok(base)
    }
}

/// OpenAPI 3.x: the first entry of `servers`.
pub struct OpenApiServers<'a> {
    pub servers: &'a [Server],
}

impl BaseUrlSource for OpenApiServers<'_> {
    fn base_url(&self, description_url: &Url) -> Result<String> {
        let url = self
            .servers
            .first()
            .and_then(|s| s.url.as_deref())
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(Error::MissingServers)?;

        if url.starts_with('/') {
            let joined = description_url
                .join(url)
                .map_err(|_| Error::InvalidBaseUrl(url.to_string()))?;
            return Ok(joined.as_str().trim_end_matches('/').to_string());
        }
        Ok(url.trim_end_matches('/').to_string())
    }
}

/// Fetches and decodes the description at `url`.
pub async fn fetch_spec(client: &Client, url: &Url) -> Result<SwaggerSpec> {
    let response = client.get(url.clone()).send().await.map_err(Error::Fetch)?;

    if !response.status().is_success() {
        return Err(Error::FetchStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let body = response.bytes().await.map_err(Error::Fetch)?;
    SwaggerSpec::from_slice(&body)
}
