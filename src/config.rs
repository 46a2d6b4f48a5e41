use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    /// SQLite path for sessions; in-memory sessions when empty.
    pub session_db: String,
    pub whatsapp_token: String,
    pub phone_number_id: String,
    pub graph_api_version: String,
    pub verify_token: String,
    pub app_secret: String,
    pub llm_provider: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub extractor_timeout: Duration,
    pub booking_sink_url: String,
    pub booking_sink_secret: String,
    pub dev_mode: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            session_db: env::var("SESSION_DB").unwrap_or_default(),
            whatsapp_token: env::var("WHATSAPP_TOKEN").unwrap_or_default(),
            phone_number_id: env::var("PHONE_NUMBER_ID").unwrap_or_default(),
            graph_api_version: env::var("GRAPH_API_VERSION").unwrap_or_else(|_| "v21.0".to_string()),
            verify_token: env::var("VERIFY_TOKEN").unwrap_or_default(),
            app_secret: env::var("APP_SECRET").unwrap_or_default(),
            llm_provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string()),
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| crate::services::ai::openai::DEFAULT_BASE_URL.to_string()),
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),
            extractor_timeout: Duration::from_secs(
                env::var("EXTRACTOR_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(15),
            ),
            booking_sink_url: env::var("BOOKING_SINK_URL").unwrap_or_default(),
            booking_sink_secret: env::var("BOOKING_SINK_SECRET").unwrap_or_default(),
            dev_mode: env::var("DEV_MODE")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }
}
