use anyhow::Result;
use ecourts_scraper::utils::logging;
use ecourts_scraper::{App, Config};

/// Config file read from the working directory when present
const CONFIG_FILE: &str = "ecourts.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load(CONFIG_FILE)?;

    // logging
    logging::init(config.verbose_logging);

    App::initialize(config).await?.run().await
}
