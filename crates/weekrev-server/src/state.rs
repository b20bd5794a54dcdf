use crate::config::ServerConfig;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use weekrev_ai::ReportGenerator;
use weekrev_export::PdfOptions;
use weekrev_storage::ReportStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ReportStore>,
    pub generator: Arc<dyn ReportGenerator>,
    pub pdf_options: PdfOptions,
    pub start_time: DateTime<Utc>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn locale(&self) -> &str {
        &self.config.locale
    }
}
