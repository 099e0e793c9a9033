use relaybot::config::ApiConfig;
use relaybot::{api, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env();
    logging::init_console()?;
    api::serve(config).await
}
