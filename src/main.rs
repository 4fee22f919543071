use clap::Parser;

use pointbook::adapter::inbound::cli::command::Cli;
use pointbook::adapter::inbound::cli::output::{self, OutputConfig};
use pointbook::adapter::inbound::cli::run;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    output::configure(OutputConfig::new(cli.json, cli.quiet));

    if let Err(e) = run::execute(cli) {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
