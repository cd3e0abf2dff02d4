//! Contracts for the hosted backend the dashboard talks to, plus the client
//! bundle services receive instead of reaching for global handles.

mod functions;
pub mod memory;
mod storage;
mod store;

use std::sync::Arc;

pub use functions::{expect_success, FunctionError, FunctionInvoker};
pub use memory::{InMemoryDocumentStore, InMemoryObjectStorage};
pub use storage::{ObjectStorage, StorageError, StoredObject};
pub use store::{
    Direction, Document, DocumentStore, FieldUpdate, Filter, FilterOp, Query, SnapshotListener,
    StoreError, Subscription,
};

/// Collection names shared with the dashboard.
pub mod collections {
    pub const PROPERTIES: &str = "properties";
    pub const MAINTENANCE_REQUESTS: &str = "maintenanceRequests";
    pub const CONTRACTORS: &str = "contractors";
    pub const USERS: &str = "users";
    pub const INVITE_CODES: &str = "inviteCodes";
}

/// Explicitly constructed backend client threaded through service constructors.
#[derive(Clone)]
pub struct Backend {
    documents: Arc<dyn DocumentStore>,
    functions: Arc<dyn FunctionInvoker>,
    storage: Arc<dyn ObjectStorage>,
}

impl Backend {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        functions: Arc<dyn FunctionInvoker>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        Self {
            documents,
            functions,
            storage,
        }
    }

    pub fn documents(&self) -> Arc<dyn DocumentStore> {
        self.documents.clone()
    }

    pub fn functions(&self) -> Arc<dyn FunctionInvoker> {
        self.functions.clone()
    }

    pub fn storage(&self) -> Arc<dyn ObjectStorage> {
        self.storage.clone()
    }
}
