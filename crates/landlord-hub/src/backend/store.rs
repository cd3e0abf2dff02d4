use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// A stored document: its id plus the raw JSON body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Decode the body into a domain type, filling `id` from the document key when absent.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        let mut body = self.data.clone();
        if let Value::Object(map) = &mut body {
            map.entry("id")
                .or_insert_with(|| Value::String(self.id.clone()));
        }
        serde_json::from_value(body).map_err(|err| StoreError::Decode {
            id: self.id.clone(),
            message: err.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    ArrayContains,
    In,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Filter, order, and limit applied to a single collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: &str, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Eq, value)
    }

    pub fn array_contains(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::ArrayContains, value)
    }

    pub fn is_in(self, field: &str, values: Vec<Value>) -> Self {
        self.filter(field, FilterOp::In, Value::Array(values))
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Field-level mutation applied atomically to one document.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Set { field: String, value: Value },
    Delete { field: String },
    Increment { field: String, by: f64 },
    /// Append `value` to the array at `field` unless an equal element is already present.
    ArrayUnion { field: String, value: Value },
    ArrayRemove { field: String, value: Value },
}

impl FieldUpdate {
    pub fn set(field: &str, value: impl Into<Value>) -> Self {
        Self::Set {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn increment(field: &str, by: f64) -> Self {
        Self::Increment {
            field: field.to_string(),
            by,
        }
    }

    pub fn array_union(field: &str, value: impl Into<Value>) -> Self {
        Self::ArrayUnion {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn array_remove(field: &str, value: impl Into<Value>) -> Self {
        Self::ArrayRemove {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::Set { field, .. }
            | Self::Delete { field }
            | Self::Increment { field, .. }
            | Self::ArrayUnion { field, .. }
            | Self::ArrayRemove { field, .. } => field,
        }
    }
}

/// Callback receiving the full result set every time it changes.
pub type SnapshotListener = Box<dyn Fn(&[Document]) + Send + Sync>;

/// Disposer for a live query. Dropping it tears the listener down.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Hosted document database contract.
pub trait DocumentStore: Send + Sync {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;
    fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;
    /// Create or replace a document.
    fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError>;
    /// Apply updates to an existing document; fails with `NotFound` when it is absent.
    fn update(&self, collection: &str, id: &str, updates: &[FieldUpdate])
        -> Result<(), StoreError>;
    /// Apply updates only while `marker` is unset, checking and writing in one
    /// step. Returns `false`, leaving the document untouched, when it was set.
    fn claim(
        &self,
        collection: &str,
        id: &str,
        marker: &str,
        updates: &[FieldUpdate],
    ) -> Result<bool, StoreError>;
    /// Push the current result set to `listener`, then again after every change.
    fn subscribe(
        &self,
        collection: &str,
        query: Query,
        listener: SnapshotListener,
    ) -> Result<Subscription, StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{collection}/{id} not found")]
    NotFound { collection: String, id: String },
    #[error("document {id} could not be decoded: {message}")]
    Decode { id: String, message: String },
    #[error("update rejected for field '{field}': {message}")]
    InvalidUpdate { field: String, message: String },
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}
