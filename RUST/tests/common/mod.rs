#![allow(dead_code)]

use reltree::*;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A small shop: user 42 with `order_count` orders, one profile and a handful of posts.
/// User 7 has nothing related; user 99 is soft-deleted.
pub fn shop_fixture(order_count: usize) -> Value {
    let orders: Vec<Value> = (1..=order_count)
        .map(|i| json!({ "id": i, "user_id": 42, "total": i * 10, "paid": i % 2 == 0 }))
        .collect();

    json!({
        "name": "shop",
        "types": {
            "User": {
                "fields": ["id", "name", "email", "deleted"],
                "relationships": {
                    "orders": { "macro": "has_many", "target": "Order" },
                    "profile": { "macro": "has_one", "target": "Profile" },
                    "posts": { "macro": "has_many", "target": "Post" }
                }
            },
            "Order": {
                "relationships": {
                    "user": { "macro": "belongs_to", "target": "User" }
                }
            },
            "Profile": {},
            "Post": {}
        },
        "records": {
            "User": [
                { "id": 42, "name": "Ada", "email": "ada@example.com", "deleted": false },
                { "id": 7, "name": "Grace", "email": "grace@example.com", "deleted": false },
                { "id": 99, "name": "Gone", "email": "gone@example.com", "deleted": true }
            ],
            "Order": orders,
            "Profile": [
                { "id": 1, "user_id": 42, "bio": "first programmer" }
            ],
            "Post": [
                { "id": 1, "user_id": 42, "title": "draft", "published": false },
                { "id": 2, "user_id": 42, "title": "hello", "published": true },
                { "id": 3, "user_id": 42, "title": "removed", "published": true, "deleted": true },
                { "id": 4, "user_id": 42, "title": "again", "published": true }
            ]
        }
    })
}

pub fn shop_store(order_count: usize) -> MemoryStore {
    MemoryStore::from_json_str(&shop_fixture(order_count).to_string()).unwrap()
}

pub fn shop_config() -> Config {
    let mut config = Config::default();
    config.model_mut("User").configure_children(["orders", "profile", "posts"]);
    config.model_mut("Order").configure_children(["user"]);
    config
}

pub fn open_user(store: Arc<dyn RecordStore>, config: Config, id: i64) -> TreeState {
    TreeState::open(store, Arc::new(config), "User", &RecordId::from(id)).unwrap()
}

pub fn shop_state(order_count: usize) -> TreeState {
    open_user(Arc::new(shop_store(order_count)), shop_config(), 42)
}

pub fn labels(state: &mut TreeState) -> Vec<String> {
    state.visible_rows().into_iter().map(|r| r.label).collect()
}

/// Put the cursor on the first visible row with this label.
pub fn move_to(state: &mut TreeState, label: &str) {
    let idx = state
        .visible_rows()
        .iter()
        .position(|r| r.label == label)
        .unwrap_or_else(|| panic!("no visible row labelled {label:?}"));
    state.move_to_top();
    for _ in 0..idx {
        state.move_down();
    }
    assert_eq!(state.cursor(), idx);
}

/// Counts every fetch that reaches the wrapped store.
pub struct CountingStore {
    inner: MemoryStore,
    fetches: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl RecordStore for CountingStore {
    fn source_name(&self) -> String {
        self.inner.source_name()
    }

    fn has_type(&self, type_name: &str) -> bool {
        self.inner.has_type(type_name)
    }

    fn type_names(&self) -> Vec<String> {
        self.inner.type_names()
    }

    fn relationships(&self, type_name: &str) -> Vec<Reflection> {
        self.inner.relationships(type_name)
    }

    fn field_names(&self, type_name: &str) -> Vec<String> {
        self.inner.field_names(type_name)
    }

    fn find(&self, type_name: &str, id: &RecordId, scope: Option<&Scope>) -> Result<Option<Record>> {
        self.inner.find(type_name, id, scope)
    }

    fn reflect(&self, type_name: &str, relationship: &str) -> Option<Reflection> {
        self.inner.reflect(type_name, relationship)
    }

    fn fetch_many(&self, owner: &Record, reflection: &Reflection, query: &PageQuery<'_>) -> Result<Vec<Record>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_many(owner, reflection, query)
    }

    fn fetch_one(&self, owner: &Record, reflection: &Reflection, scopes: &[&Scope]) -> Result<Option<Record>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_one(owner, reflection, scopes)
    }
}

/// Every relationship fetch fails.
pub struct FailingStore {
    inner: MemoryStore,
}

impl FailingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self { inner }
    }
}

impl RecordStore for FailingStore {
    fn source_name(&self) -> String {
        "failing".to_string()
    }

    fn has_type(&self, type_name: &str) -> bool {
        self.inner.has_type(type_name)
    }

    fn type_names(&self) -> Vec<String> {
        self.inner.type_names()
    }

    fn relationships(&self, type_name: &str) -> Vec<Reflection> {
        self.inner.relationships(type_name)
    }

    fn field_names(&self, type_name: &str) -> Vec<String> {
        self.inner.field_names(type_name)
    }

    fn find(&self, type_name: &str, id: &RecordId, scope: Option<&Scope>) -> Result<Option<Record>> {
        self.inner.find(type_name, id, scope)
    }

    fn reflect(&self, type_name: &str, relationship: &str) -> Option<Reflection> {
        self.inner.reflect(type_name, relationship)
    }

    fn fetch_many(&self, _: &Record, _: &Reflection, _: &PageQuery<'_>) -> Result<Vec<Record>> {
        Err(ReltreeError::Store("connection reset".to_string()))
    }

    fn fetch_one(&self, _: &Record, _: &Reflection, _: &[&Scope]) -> Result<Option<Record>> {
        Err(ReltreeError::Store("connection reset".to_string()))
    }
}
