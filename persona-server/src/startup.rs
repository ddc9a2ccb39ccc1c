//! Session bootstrap: resolve the row store, then the optional generator.
//!
//! `[uninitialized] -> [store resolved] -> [ready]`. Any error returned here
//! is fatal; the binary exits before serving.

use std::sync::Arc;

use persona_core::{
    load_context, GeminiTextClient, GeminiTextConfig, MemoryRowStore, PersonaConfig, PersonaError,
    RowStore, SheetsConfig, SheetsRowStore, TextGenerator,
};

use crate::http::HttpState;

/// Resolve the configured spreadsheet, or an in-memory store when `dry_run` is set.
pub async fn resolve_store(
    config: &PersonaConfig,
    dry_run: bool,
) -> Result<Arc<dyn RowStore>, PersonaError> {
    if dry_run {
        tracing::warn!("Dry run: personas are kept in memory and lost on exit");
        return Ok(Arc::new(MemoryRowStore::new()));
    }

    let sheets_config = SheetsConfig::from_config(&config.store);
    let store = SheetsRowStore::resolve(&config.store, sheets_config).await?;
    let info = store.describe();
    tracing::info!(
        spreadsheet = %info.id,
        title = %info.title,
        worksheet = %info.worksheet,
        columns = store.schema().header().len(),
        "Row store resolved"
    );
    Ok(Arc::new(store))
}

/// Build the Gemini client when generation is enabled.
///
/// A missing API key with generation enabled is a configuration error.
pub fn build_generator(
    config: &PersonaConfig,
) -> Result<Option<Arc<dyn TextGenerator>>, PersonaError> {
    if !config.generation.enabled {
        return Ok(None);
    }
    let client = GeminiTextClient::new(GeminiTextConfig::from_config(&config.generation))?;
    tracing::info!(model = client.model(), "Text generation enabled");
    Ok(Some(Arc::new(client)))
}

pub async fn build_state(config: PersonaConfig, dry_run: bool) -> Result<HttpState, PersonaError> {
    let store = resolve_store(&config, dry_run).await?;
    let generator = build_generator(&config)?;
    let context = if generator.is_some() {
        load_context(&config.generation.documents, config.generation.max_context_chars).text
    } else {
        String::new()
    };

    Ok(HttpState {
        store,
        generator,
        context,
        config,
    })
}
