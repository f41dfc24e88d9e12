use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use waggers::{Args, Config, OutputSink, Scanner};

fn print_banner() {
    eprintln!(r#"
__  _  ______     ____   ____   ___________  ______
\ \/ \/ /\__  \   / ___\ / ___\_/ __ \_  __ \/  ___/
 \     /  / __ \_/ /_/  > /_/  >  ___/|  | \/\___ \
  \/\_/  (____  /\___  /\___  / \___  >__|  /____  >
              \//_____//_____/      \/           \/
                 Fuzzable URLs from Swagger and OpenAPI docs
    "#);
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if !args.quiet {
        print_banner();
    }

    let config = Config::try_from(args)?;
    let sink = OutputSink::open(config.output.as_deref())?;
    let scanner = Scanner::new(config)?;

    scanner.run(sink).await?;
    Ok(())
}
