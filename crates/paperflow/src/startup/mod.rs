//! Application startup: logging and backend wiring

pub mod logging;

use std::sync::Arc;

use anyhow::Context;
use paperflow_client::{SupabaseAuth, SupabaseHttpClient, SupabaseStore};
use tracing::info;

use crate::app::PaperflowApp;
use crate::settings::Settings;

pub use logging::{LogRotation, LoggingGuard, init_logging};

/// Build the app against the hosted backend described by `settings`.
///
/// Data requests carry the signed-in user's token, refreshed by the auth adapter.
pub fn connect(settings: &Settings) -> anyhow::Result<PaperflowApp> {
    let http = SupabaseHttpClient::new(settings.backend.client_config())
        .context("Failed to build backend HTTP client")?;

    let auth = Arc::new(SupabaseAuth::new(http.clone()));
    let store = SupabaseStore::new(http, settings.tables.clone()).with_token_source(auth.clone());
    info!("Connecting to backend at {}", settings.backend.url);

    Ok(PaperflowApp::new(
        auth,
        Arc::new(store),
        &settings.workspace.default_author,
    ))
}
