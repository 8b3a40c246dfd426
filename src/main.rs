// src/main.rs

use std::{net::SocketAddr, sync::Arc};

use dotenvy::dotenv;
use quiz_backend::clients::llm::{OpenAiClient, OpenAiConfig};
use quiz_backend::config::Config;
use quiz_backend::routes;
use quiz_backend::services::generator::QuizGenerator;
use quiz_backend::state::AppState;
use quiz_backend::utils::logging::{init_tracing, log_startup};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    // Initialize Tracing (Logging)
    let _guard = init_tracing(&config.rust_log);
    log_startup(&config);

    // The LLM client is built once and shared by every request.
    let generator = config.openai_api_key.as_ref().map(|api_key| {
        let client = OpenAiClient::new(OpenAiConfig {
            api_key: api_key.clone(),
            base_url: config.openai_base_url.clone(),
            model: config.openai_model.clone(),
            temperature: config.temperature,
        });
        Arc::new(QuizGenerator::new(
            Arc::new(client),
            config.generator_config(),
        ))
    });

    let bind_addr = config.bind_addr.clone();

    // Create AppState
    let state = AppState { config, generator };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", bind_addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Listening on {}", bind_addr);

    // Start the server
    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!("Server error: {}", e);
    }
}
