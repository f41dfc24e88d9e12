//! Generate fuzzable request URLs from Swagger/OpenAPI descriptions and
//! optionally probe them.

pub mod config;
pub mod dispatch;
pub mod document;
pub mod endpoint;
pub mod error;
pub mod fuzz;
pub mod scanner;
pub mod sink;
pub mod synth;

pub use config::{Args, Config};
pub use endpoint::{Endpoint, EndpointSet, Parameter, ParameterType};
pub use error::{Error, Result};
pub use scanner::{RunSummary, Scanner};
pub use sink::OutputSink;
pub use synth::UrlSynthesizer;
