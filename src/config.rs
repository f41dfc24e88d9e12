use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::{ArgAction, Parser};
use url::Url;

use crate::error::{Error, Result};

/// Upper bound on fuzz iterations per endpoint.
pub const MAX_FUZZ_COUNT: u32 = 1000;

#[derive(Parser, Debug, Clone)]
#[command(name = "waggers")]
#[command(about = "Generate and fuzz URLs from Swagger and OpenAPI docs")]
pub struct Args {
    /// URL of the Swagger/OpenAPI JSON description
    pub url: String,

    /// Only print URLs, no fuzzing. Use --dryrun false to send requests
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub dryrun: bool,

    /// How many fuzzable URLs to generate/fuzz per endpoint (1-1000)
    #[arg(long, default_value_t = 1)]
    pub fuzzcount: u32,

    /// A custom fuzz word (e.g. FUZZ) inserted for every parameter
    #[arg(long)]
    pub fuzzword: Option<String>,

    /// Custom header, e.g. "User-Agent: foobar". Can be given multiple times
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    pub headers: Vec<String>,

    /// Basic authentication credentials, e.g. user:pass
    #[arg(long, value_name = "USER:PASS")]
    pub basicauth: Option<String>,

    /// Append output to this file instead of printing it
    #[arg(short = 'o', long = "file", value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Shuffle the endpoint list
    #[arg(long)]
    pub shuffle: bool,

    /// Ignore certificate errors
    #[arg(long)]
    pub ignorecert: bool,

    /// Seed for random values and shuffling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Don't print the banner
    #[arg(short, long)]
    pub quiet: bool,
}

/// Validated run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub target: Url,
    pub dry_run: bool,
    pub fuzz_count: u32,
    pub fuzz_word: Option<String>,
    pub headers: Vec<(String, String)>,
    pub output: Option<PathBuf>,
    pub shuffle: bool,
    pub ignore_cert: bool,
    pub seed: Option<u64>,
}

impl Config {
    /// The scheme of the description URL, reused for generated URLs.
    pub fn scheme(&self) -> &str {
        self.target.scheme()
    }
}

impl TryFrom<Args> for Config {
    type Error = Error;

    fn try_from(args: Args) -> Result<Self> {
        let fuzz_count = validate_fuzz_count(args.fuzzcount)?;
        let target = parse_target(&args.url)?;

        let mut headers = parse_headers(&args.headers)?;
        if let Some(credentials) = args.basicauth.as_deref().filter(|c| !c.is_empty()) {
            headers.push(basic_auth_header(credentials));
        }

        Ok(Config {
            target,
            dry_run: args.dryrun,
            fuzz_count,
            fuzz_word: args.fuzzword.filter(|w| !w.is_empty()),
            headers,
            output: args.file,
            shuffle: args.shuffle,
            ignore_cert: args.ignorecert,
            seed: args.seed,
        })
    }
}

pub fn validate_fuzz_count(count: u32) -> Result<u32> {
    if (1..=MAX_FUZZ_COUNT).contains(&count) {
        Ok(count)
    } else {
        Err(Error::FuzzCountOutOfRange {
            count,
            max: MAX_FUZZ_COUNT,
        })
    }
}

/// The description URL must be absolute http or https.
pub fn parse_target(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::InvalidTarget(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(Error::InvalidTarget(raw.to_string())),
    }
}

/// Splits `Name: value` strings at the first colon.
pub fn parse_headers(header_strings: &[String]) -> Result<Vec<(String, String)>> {
    header_strings
        .iter()
        .map(|header| {
            let (key, value) = header
                .split_once(':')
                .ok_or_else(|| Error::InvalidHeader(header.clone()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(Error::InvalidHeader(header.clone()));
            }
            Ok((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

pub fn basic_auth_header(credentials: &str) -> (String, String) {
    (
        "Authorization".to_string(),
        format!("Basic {}", STANDARD.encode(credentials)),
    )
}
