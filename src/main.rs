use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use careline::config::AppConfig;
use careline::db;
use careline::handlers;
use careline::services::ai::ollama::OllamaProvider;
use careline::services::ai::openai::OpenAiProvider;
use careline::services::ai::semantic::LlmExtractor;
use careline::services::ai::LlmProvider;
use careline::services::assistant::Assistant;
use careline::services::booking_sink::{BookingSink, HttpBookingSink, LogBookingSink};
use careline::services::composer::ResponseComposer;
use careline::services::dialogue::DialogueController;
use careline::services::messaging::whatsapp::WhatsAppCloudProvider;
use careline::services::session_store::{MemorySessionStore, SessionStore, SqliteSessionStore};
use careline::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let llm: Arc<dyn LlmProvider> = match config.llm_provider.as_str() {
        "ollama" => {
            tracing::info!("using Ollama LLM provider (url: {}, model: {})", config.ollama_url, config.ollama_model);
            Arc::new(OllamaProvider::new(config.ollama_url.clone(), config.ollama_model.clone()))
        }
        _ => {
            anyhow::ensure!(
                !config.openai_api_key.is_empty(),
                "OPENAI_API_KEY must be set when LLM_PROVIDER=openai"
            );
            tracing::info!("using OpenAI-compatible LLM provider (model: {})", config.openai_model);
            Arc::new(OpenAiProvider::new(
                config.openai_base_url.clone(),
                config.openai_api_key.clone(),
                config.openai_model.clone(),
            ))
        }
    };

    let store: Arc<dyn SessionStore> = if config.session_db.is_empty() {
        tracing::info!("using in-memory session store");
        Arc::new(MemorySessionStore::new())
    } else {
        tracing::info!("using SQLite session store at {}", config.session_db);
        let conn = db::init_db(&config.session_db)?;
        Arc::new(SqliteSessionStore::new(Arc::new(Mutex::new(conn))))
    };

    let sink: Arc<dyn BookingSink> = if config.booking_sink_url.is_empty() {
        tracing::info!("no BOOKING_SINK_URL set, confirmed bookings are logged only");
        Arc::new(LogBookingSink)
    } else {
        Arc::new(HttpBookingSink::new(
            config.booking_sink_url.clone(),
            config.booking_sink_secret.clone(),
        )?)
    };

    if config.whatsapp_token.is_empty() || config.phone_number_id.is_empty() {
        tracing::warn!("WHATSAPP_TOKEN or PHONE_NUMBER_ID not set, outbound messages will fail");
    }
    let messaging = WhatsAppCloudProvider::new(
        config.whatsapp_token.clone(),
        &config.phone_number_id,
        &config.graph_api_version,
    );

    let dialogue = DialogueController::new(
        Arc::new(LlmExtractor::new(llm)),
        sink,
        ResponseComposer::default(),
        config.extractor_timeout,
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        assistant: Arc::new(Assistant::new(store, Arc::new(messaging), dialogue)),
    });

    let mut app = Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/webhook",
            get(handlers::webhook::verify).post(handlers::webhook::receive),
        );
    if config.dev_mode {
        tracing::info!("dev mode on, /api/dev/message enabled");
        app = app.route("/api/dev/message", post(handlers::dev::send_message));
    }
    let app = app.layer(TraceLayer::new_for_http()).with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
