use anyhow::Result;
use clap::Parser;
use log::error;
use pocketcal::cli::Cli;

fn main() -> Result<()> {
    pocketcal::init_logger();

    let cli = Cli::parse();
    if let Err(e) = pocketcal::run(cli) {
        error!("Command failed: {:?}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
    Ok(())
}
