use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Settings;
use crate::render::RenderPipeline;
use crate::store::SnippetStore;
use crate::template::TemplateRegistry;

/// Shared per-request dependencies: the settings, the snippet store over
/// the shared pool, and the render pipeline over the immutable template
/// registry. Built once in `main`, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: SnippetStore,
    pub pipeline: RenderPipeline,
}

impl AppState {
    pub fn new(settings: Settings, pool: PgPool, registry: TemplateRegistry) -> Self {
        Self {
            settings: Arc::new(settings),
            store: SnippetStore::new(pool),
            pipeline: RenderPipeline::new(registry),
        }
    }
}
