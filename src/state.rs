use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::assistant::Assistant;

pub struct AppState {
    pub config: AppConfig,
    pub assistant: Arc<Assistant>,
}
