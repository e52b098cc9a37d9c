use redirect_cache::config::{Config, load_from_env};
use redirect_cache::server;
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&config.log_level)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match config.log_format.as_str() {
        "json" => builder.json().init(),
        _ => builder.init(),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = load_from_env()?;
    init_tracing(&config)?;
    config.print_summary();

    server::run(config).await
}
