use crate::config::AppConfig;
use crate::fc::Extractor;

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub config: AppConfig,
    pub extractor: Extractor,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        let extractor = Extractor::new(&config.extraction.options());
        Self { config, extractor }
    }
}
