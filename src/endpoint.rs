//! Normalized endpoint model extracted from a raw description.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::document::{RawParameter, SwaggerSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterType {
    String,
    Integer,
    Float,
}

impl ParameterType {
    /// `"integer"` and `"number"` are recognised; anything else, including
    /// no type at all, is a string.
    pub fn from_declared(declared: Option<&str>) -> Self {
        match declared {
            Some("integer") => ParameterType::Integer,
            Some("number") => ParameterType::Float,
            _ => ParameterType::String,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    name: String,
    param_type: ParameterType,
    required: bool,
    is_path_variable: bool,
}

impl Parameter {
    /// Builds a parameter owned by the endpoint at `path`.
    ///
    /// Whether it is a path variable is decided by the presence of `{name}`
    /// in the template, never by the declared location.
    pub fn new(name: impl Into<String>, param_type: ParameterType, required: bool, path: &str) -> Self {
        let name = name.into();
        let is_path_variable = path.contains(&placeholder(&name));
        Parameter {
            name,
            param_type,
            required,
            is_path_variable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_type(&self) -> ParameterType {
        self.param_type
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn is_path_variable(&self) -> bool {
        self.is_path_variable
    }

    /// The `{name}` token this parameter replaces in a path template.
    pub fn placeholder(&self) -> String {
        placeholder(&self.name)
    }
}

fn placeholder(name: &str) -> String {
    format!("{{{}}}", name)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    path: String,
    parameters: Vec<Parameter>,
}

impl Endpoint {
    /// Parameters are given as `(name, type, required)` and keep their order.
    pub fn new<I, S>(path: impl Into<String>, parameters: I) -> Self
    where
        I: IntoIterator<Item = (S, ParameterType, bool)>,
        S: Into<String>,
    {
        let path = path.into();
        let parameters = parameters
            .into_iter()
            .map(|(name, param_type, required)| Parameter::new(name, param_type, required, &path))
            .collect();
        Endpoint { path, parameters }
    }

    fn from_raw(path: &str, raw: Vec<RawParameter>) -> Self {
        Endpoint::new(
            path,
            raw.into_iter().filter_map(|param| {
                let param_type = ParameterType::from_declared(param.declared_type());
                let required = param.required.unwrap_or(false);
                Some((param.name?, param_type, required))
            }),
        )
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Endpoints without parameters have nothing to fuzz.
    pub fn is_fuzz_target(&self) -> bool {
        !self.parameters.is_empty()
    }
}

/// All endpoints of one description, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointSet {
    endpoints: Vec<Endpoint>,
}

impl EndpointSet {
    pub fn extract(spec: &SwaggerSpec) -> Self {
        let endpoints: Vec<Endpoint> = spec
            .path_items()
            .map(|(path, item)| Endpoint::from_raw(path, item.get_parameters()))
            .collect();

        debug!("Extracted {} endpoints", endpoints.len());
        EndpointSet { endpoints }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }

    pub fn fuzz_targets(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter().filter(|e| e.is_fuzz_target())
    }

    /// Presentation-only reordering; the endpoints themselves are untouched.
    pub fn shuffled<R: Rng + ?Sized>(mut self, rng: &mut R) -> Self {
        self.endpoints.shuffle(rng);
        self
    }
}

impl FromIterator<Endpoint> for EndpointSet {
    fn from_iter<T: IntoIterator<Item = Endpoint>>(iter: T) -> Self {
        EndpointSet {
            endpoints: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for EndpointSet {
    type Item = Endpoint;
    type IntoIter = std::vec::IntoIter<Endpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.endpoints.into_iter()
    }
}
