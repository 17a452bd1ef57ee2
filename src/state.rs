//! Application state shared between the pipeline and the web handlers.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::extract::admission::AdmissionSectionParser;
use crate::extract::background::BackgroundResolver;
use crate::extract::tables::ReferenceTables;
use crate::rank::ArticleRecord;

/// Shared state handed to every request handler.
///
/// The reference tables and resolvers are immutable after startup; the
/// corpus snapshot is replaced wholesale after a pipeline run, so readers
/// only ever see a complete corpus.
#[derive(Clone)]
pub struct AppState {
    pub tables: Arc<ReferenceTables>,
    pub background: Arc<BackgroundResolver>,
    pub admission: Arc<AdmissionSectionParser>,
    pub corpus: Arc<RwLock<Vec<ArticleRecord>>>,
}

impl AppState {
    pub fn new(tables: Arc<ReferenceTables>) -> Self {
        AppState {
            background: Arc::new(BackgroundResolver::new(tables.clone())),
            admission: Arc::new(AdmissionSectionParser::new(tables.clone())),
            tables,
            corpus: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Swap in a freshly built corpus snapshot.
    pub async fn replace_corpus(&self, records: Vec<ArticleRecord>) {
        *self.corpus.write().await = records;
    }
}
