use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use coderunner::config::JudgeConfig;
use coderunner::judge::Judge;
use coderunner::languages::LanguageTable;
use coderunner::server;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("coderunner=info".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let config = JudgeConfig::from_env();
    let languages = LanguageTable::builtin()?;
    info!(
        "Loaded language configurations: {}",
        languages.supported().join(", ")
    );

    let judge = Arc::new(Judge::new(languages, config.clone()));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(
        "Judge server listening on {} (max {} concurrent submissions)",
        config.bind_addr, config.max_concurrent
    );

    axum::serve(listener, server::router(judge)).await?;

    Ok(())
}
