mod application;
mod domain;
mod infrastructure;
mod presentation;

use tracing_subscriber::EnvFilter;

use crate::infrastructure::container::AppContainer;
use crate::presentation::http::HttpServer;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let container = match AppContainer::new().await {
        Ok(container) => container,
        Err(error) => {
            tracing::error!(error = %error, "Failed to initialize application");
            std::process::exit(1);
        }
    };

    let port = std::env::var("PORT").ok().and_then(|raw| raw.parse().ok());
    let server = HttpServer::new(
        container.document_handler.clone(),
        container.job_queue.clone(),
        port,
    );

    if let Err(error) = server.run().await {
        tracing::error!(error = %error, "HTTP server exited with error");
        std::process::exit(1);
    }
}
