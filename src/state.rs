use std::sync::Arc;

use snail_core::{Clock, DocumentStore, SystemClock, TableStore};
use snail_model::{DocumentModel, Schema, TableModel};

/// Application state shared across handlers.
///
/// Holds the store clients, constructed once at startup; every request
/// builds its mappers from these handles.
#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<dyn DocumentStore>,
    pub tables: Arc<dyn TableStore>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(documents: Arc<dyn DocumentStore>, tables: Arc<dyn TableStore>) -> Self {
        Self {
            documents,
            tables,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn document_model<M: Schema>(&self) -> DocumentModel<M> {
        DocumentModel::new(self.documents.clone()).with_clock(self.clock.clone())
    }

    pub fn table_model<M: Schema>(&self) -> TableModel<M> {
        TableModel::new(self.tables.clone()).with_clock(self.clock.clone())
    }
}
