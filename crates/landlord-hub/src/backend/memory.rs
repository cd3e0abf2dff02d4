//! In-process implementations of the backend contracts, used by the local
//! server, the CLI demo, and tests.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, Weak};

use serde_json::{Map, Number, Value};

use super::storage::{ObjectStorage, StorageError, StoredObject};
use super::store::{
    Direction, Document, DocumentStore, FieldUpdate, Filter, FilterOp, Query, SnapshotListener,
    StoreError, Subscription,
};

type SharedListener = Arc<dyn Fn(&[Document]) + Send + Sync>;

struct ListenerEntry {
    id: u64,
    collection: String,
    query: Query,
    callback: SharedListener,
}

#[derive(Default)]
struct StoreState {
    collections: HashMap<String, BTreeMap<String, Value>>,
    listeners: Vec<ListenerEntry>,
    next_listener: u64,
}

impl StoreState {
    fn run_query(&self, collection: &str, query: &Query) -> Vec<Document> {
        let Some(documents) = self.collections.get(collection) else {
            return Vec::new();
        };

        let mut matched: Vec<Document> = documents
            .iter()
            .filter(|(_, data)| query.filters.iter().all(|filter| matches(data, filter)))
            .map(|(id, data)| Document::new(id.clone(), data.clone()))
            .collect();

        if let Some((field, direction)) = &query.order_by {
            matched.sort_by(|left, right| {
                let ordering = compare_values(
                    lookup(&left.data, field),
                    lookup(&right.data, field),
                );
                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        matched
    }

    fn pending_notifications(&self, collection: &str) -> Vec<(SharedListener, Vec<Document>)> {
        self.listeners
            .iter()
            .filter(|entry| entry.collection == collection)
            .map(|entry| {
                (
                    entry.callback.clone(),
                    self.run_query(collection, &entry.query),
                )
            })
            .collect()
    }
}

/// Document store backed by a mutex-guarded map. Listeners are always invoked
/// after the lock is released so they may call back into the store.
#[derive(Default, Clone)]
pub struct InMemoryDocumentStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener_count(&self) -> usize {
        self.state
            .lock()
            .expect("document store mutex poisoned")
            .listeners
            .len()
    }

    pub fn len(&self, collection: &str) -> usize {
        self.state
            .lock()
            .expect("document store mutex poisoned")
            .collections
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn notify(notifications: Vec<(SharedListener, Vec<Document>)>) {
        for (callback, snapshot) in notifications {
            callback(&snapshot);
        }
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let guard = self.state.lock().expect("document store mutex poisoned");
        Ok(guard
            .collections
            .get(collection)
            .and_then(|documents| documents.get(id))
            .map(|data| Document::new(id, data.clone())))
    }

    fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let guard = self.state.lock().expect("document store mutex poisoned");
        Ok(guard.run_query(collection, query))
    }

    fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        if !data.is_object() {
            return Err(StoreError::InvalidUpdate {
                field: id.to_string(),
                message: "documents must be JSON objects".to_string(),
            });
        }

        let notifications = {
            let mut guard = self.state.lock().expect("document store mutex poisoned");
            guard
                .collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.to_string(), data);
            guard.pending_notifications(collection)
        };

        Self::notify(notifications);
        Ok(())
    }

    fn update(
        &self,
        collection: &str,
        id: &str,
        updates: &[FieldUpdate],
    ) -> Result<(), StoreError> {
        let notifications = {
            let mut guard = self.state.lock().expect("document store mutex poisoned");
            let document = guard
                .collections
                .get_mut(collection)
                .and_then(|documents| documents.get_mut(id))
                .ok_or_else(|| StoreError::not_found(collection, id))?;

            // Apply to a copy so a rejected update leaves the stored document untouched.
            let mut staged = document.clone();
            for update in updates {
                apply_update(&mut staged, update)?;
            }
            *document = staged;

            guard.pending_notifications(collection)
        };

        Self::notify(notifications);
        Ok(())
    }

    fn claim(
        &self,
        collection: &str,
        id: &str,
        marker: &str,
        updates: &[FieldUpdate],
    ) -> Result<bool, StoreError> {
        let notifications = {
            let mut guard = self.state.lock().expect("document store mutex poisoned");
            let document = guard
                .collections
                .get_mut(collection)
                .and_then(|documents| documents.get_mut(id))
                .ok_or_else(|| StoreError::not_found(collection, id))?;
            if lookup(document, marker).is_some_and(|value| !value.is_null()) {
                return Ok(false);
            }

            let mut staged = document.clone();
            for update in updates {
                apply_update(&mut staged, update)?;
            }
            *document = staged;

            guard.pending_notifications(collection)
        };

        Self::notify(notifications);
        Ok(true)
    }

    fn subscribe(
        &self,
        collection: &str,
        query: Query,
        listener: SnapshotListener,
    ) -> Result<Subscription, StoreError> {
        let callback: SharedListener = Arc::from(listener);
        let (id, initial) = {
            let mut guard = self.state.lock().expect("document store mutex poisoned");
            let id = guard.next_listener;
            guard.next_listener += 1;
            let initial = guard.run_query(collection, &query);
            guard.listeners.push(ListenerEntry {
                id,
                collection: collection.to_string(),
                query,
                callback: callback.clone(),
            });
            (id, initial)
        };

        callback(&initial);

        let state: Weak<Mutex<StoreState>> = Arc::downgrade(&self.state);
        Ok(Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                if let Ok(mut guard) = state.lock() {
                    guard.listeners.retain(|entry| entry.id != id);
                }
            }
        }))
    }
}

fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(data, |current, segment| current.get(segment))
}

fn matches(data: &Value, filter: &Filter) -> bool {
    let Some(actual) = lookup(data, &filter.field) else {
        return false;
    };

    match filter.op {
        FilterOp::Eq => actual == &filter.value,
        FilterOp::ArrayContains => actual
            .as_array()
            .is_some_and(|items| items.contains(&filter.value)),
        FilterOp::In => filter
            .value
            .as_array()
            .is_some_and(|candidates| candidates.contains(actual)),
    }
}

fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let a = a.as_f64().unwrap_or_default();
            let b = b.as_f64().unwrap_or_default();
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn parent_object<'a>(
    document: &'a mut Value,
    field: &'a str,
) -> Result<(&'a mut Map<String, Value>, &'a str), StoreError> {
    let invalid = |message: &str| StoreError::InvalidUpdate {
        field: field.to_string(),
        message: message.to_string(),
    };

    let (parent_path, leaf) = match field.rsplit_once('.') {
        Some((parent, leaf)) => (Some(parent), leaf),
        None => (None, field),
    };

    let mut current = document;
    if let Some(parent_path) = parent_path {
        for segment in parent_path.split('.') {
            let map = current
                .as_object_mut()
                .ok_or_else(|| invalid("parent is not an object"))?;
            current = map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
    }

    let map = current
        .as_object_mut()
        .ok_or_else(|| invalid("parent is not an object"))?;
    Ok((map, leaf))
}

fn apply_update(document: &mut Value, update: &FieldUpdate) -> Result<(), StoreError> {
    let field = update.field();
    let invalid = |message: &str| StoreError::InvalidUpdate {
        field: field.to_string(),
        message: message.to_string(),
    };

    let (map, leaf) = parent_object(document, field)?;
    match update {
        FieldUpdate::Set { value, .. } => {
            map.insert(leaf.to_string(), value.clone());
        }
        FieldUpdate::Delete { .. } => {
            map.remove(leaf);
        }
        FieldUpdate::Increment { by, .. } => {
            let next = match map.get(leaf) {
                None | Some(Value::Null) => increment_number(None, *by),
                Some(Value::Number(current)) => increment_number(Some(current), *by),
                Some(_) => return Err(invalid("cannot increment a non-numeric field")),
            };
            let next = next.ok_or_else(|| invalid("increment produced a non-finite number"))?;
            map.insert(leaf.to_string(), Value::Number(next));
        }
        FieldUpdate::ArrayUnion { value, .. } => {
            let entry = map
                .entry(leaf.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if entry.is_null() {
                *entry = Value::Array(Vec::new());
            }
            let items = entry
                .as_array_mut()
                .ok_or_else(|| invalid("array-union target is not an array"))?;
            if !items.contains(value) {
                items.push(value.clone());
            }
        }
        FieldUpdate::ArrayRemove { value, .. } => {
            if let Some(existing) = map.get_mut(leaf) {
                let items = existing
                    .as_array_mut()
                    .ok_or_else(|| invalid("array-remove target is not an array"))?;
                items.retain(|item| item != value);
            }
        }
    }

    Ok(())
}

fn increment_number(current: Option<&Number>, by: f64) -> Option<Number> {
    let whole_step = by.fract() == 0.0 && by.abs() < i64::MAX as f64;
    match current {
        None if whole_step => Some(Number::from(by as i64)),
        Some(number) if whole_step && number.is_i64() => number
            .as_i64()
            .and_then(|value| value.checked_add(by as i64))
            .map(Number::from),
        _ => {
            let base = current.and_then(Number::as_f64).unwrap_or_default();
            Number::from_f64(base + by)
        }
    }
}

/// Object storage that keeps uploads in memory and fabricates public URLs.
#[derive(Clone)]
pub struct InMemoryObjectStorage {
    base_url: String,
    objects: Arc<Mutex<HashMap<String, (String, Vec<u8>)>>>,
}

impl InMemoryObjectStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: Arc::default(),
        }
    }

    pub fn object(&self, key: &str) -> Option<(String, Vec<u8>)> {
        self.objects
            .lock()
            .expect("object storage mutex poisoned")
            .get(key)
            .cloned()
    }
}

impl Default for InMemoryObjectStorage {
    fn default() -> Self {
        Self::new("memory://uploads")
    }
}

impl ObjectStorage for InMemoryObjectStorage {
    fn upload(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        if key.trim().is_empty() {
            return Err(StorageError::Rejected("object key is empty".to_string()));
        }

        self.objects
            .lock()
            .expect("object storage mutex poisoned")
            .insert(key.to_string(), (content_type.to_string(), bytes.to_vec()));

        Ok(StoredObject {
            key: key.to_string(),
            size: bytes.len(),
            content_type: content_type.to_string(),
        })
    }

    fn download_url(&self, key: &str) -> Result<String, StorageError> {
        let guard = self.objects.lock().expect("object storage mutex poisoned");
        if guard.contains_key(key) {
            Ok(format!("{}/{}", self.base_url, key))
        } else {
            Err(StorageError::NotFound(key.to_string()))
        }
    }
}
