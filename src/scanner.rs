use std::time::{Duration, Instant};

use reqwest::Client;
use tracing::{info, warn};

use crate::config::Config;
use crate::dispatch::{build_client, Dispatcher};
use crate::document::fetch_spec;
use crate::endpoint::EndpointSet;
use crate::error::Result;
use crate::fuzz::ValueGenerator;
use crate::sink::OutputSink;
use crate::synth::UrlSynthesizer;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub endpoints: usize,
    pub fuzz_targets: usize,
    pub generated: usize,
    pub skipped: usize,
    pub dispatched: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

pub struct Scanner {
    config: Config,
    client: Client,
}

impl Scanner {
    pub fn new(config: Config) -> Result<Self> {
        let client = build_client(&config.headers, config.ignore_cert)?;
        Ok(Scanner { config, client })
    }

    /// Fetches the description, then prints or dispatches every URL.
    ///
    /// All fatal errors surface before the first URL is produced.
    pub async fn run(&self, sink: OutputSink) -> Result<RunSummary> {
        let start = Instant::now();
        let config = &self.config;

        let spec = fetch_spec(&self.client, &config.target).await?;
        let base_url = spec.base_url(&config.target)?;
        info!("Found spec at {}, base URL {}", config.target, base_url);

        let mut values = match config.seed {
            Some(seed) => ValueGenerator::seeded(seed),
            None => ValueGenerator::from_entropy(),
        };

        let mut endpoints = EndpointSet::extract(&spec);
        if config.shuffle {
            endpoints = endpoints.shuffled(values.rng());
        }

        let mut summary = RunSummary {
            endpoints: endpoints.iter().count(),
            fuzz_targets: endpoints.fuzz_targets().count(),
            ..Default::default()
        };
        info!(
            "Extracted {} endpoints, {} with parameters",
            summary.endpoints, summary.fuzz_targets
        );

        if config.dry_run {
            info!("Dry run, just printing URLs. Use --dryrun false to fuzz.");
        }

        let mut synthesizer = UrlSynthesizer::new(
            base_url,
            config.scheme(),
            config.fuzz_word.clone(),
            values,
        );
        let mut dispatcher = Dispatcher::new(self.client.clone(), sink.clone());

        for endpoint in endpoints.fuzz_targets() {
            for _ in 0..config.fuzz_count {
                let url = match synthesizer.synthesize(endpoint) {
                    Ok(url) => url,
                    Err(e) => {
                        warn!("{}", e);
                        summary.skipped += 1;
                        continue;
                    }
                };
                summary.generated += 1;

                if config.dry_run {
                    sink.write_line(&url).await?;
                } else {
                    dispatcher.dispatch(url);
                }
            }
        }

        let dispatch = dispatcher.finish().await?;
        summary.dispatched = dispatch.dispatched;
        summary.failed = dispatch.failed + dispatch.panicked;
        summary.elapsed = start.elapsed();

        if config.dry_run {
            info!("Generated {} URLs, skipped {}", summary.generated, summary.skipped);
        } else {
            info!(
                "Fuzzing took {:?}: {} requests, {} failed, {} skipped",
                summary.elapsed, summary.dispatched, summary.failed, summary.skipped
            );
        }

        Ok(summary)
    }
}
