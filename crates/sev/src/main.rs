use clap::Parser;

mod cli;
mod logging;
mod settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    logging::init(cli.verbose);
    cli.run().await
}
