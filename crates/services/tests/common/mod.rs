#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use services::{Clock, SessionSetupService, parse_question_source};
use storage::repository::{InMemorySessionStore, SessionKey, SessionStore, StorageError};

pub const QUESTIONS: &str = r#"[
    {"id": 1, "question": "<p>2 + 2?</p>", "choices": ["3", "4", "5"], "correctAnswer": "4"},
    {"id": 2, "question": "Largest planet?", "choices": ["Mars", "Jupiter"], "correctAnswer": "Jupiter"},
    {"id": 3, "question": "H<sub>2</sub>O is?", "choices": ["Water", "Salt"], "correctAnswer": "Water"}
]"#;

/// In-memory store that counts successful writes per key and can be told to
/// fail the next write of a key.
#[derive(Clone, Default)]
pub struct CountingStore {
    inner: InMemorySessionStore,
    writes: Arc<Mutex<HashMap<SessionKey, usize>>>,
    failing: Arc<Mutex<HashSet<SessionKey>>>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self, key: SessionKey) -> usize {
        self.writes.lock().unwrap().get(&key).copied().unwrap_or(0)
    }

    pub fn fail_next_write(&self, key: SessionKey) {
        self.failing.lock().unwrap().insert(key);
    }
}

#[async_trait]
impl SessionStore for CountingStore {
    async fn get(&self, key: SessionKey) -> Result<Option<String>, StorageError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: SessionKey, value: String) -> Result<(), StorageError> {
        if self.failing.lock().unwrap().remove(&key) {
            return Err(StorageError::Connection("disk full".into()));
        }
        *self.writes.lock().unwrap().entry(key).or_default() += 1;
        self.inner.set(key, value).await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.inner.clear().await
    }
}

/// Seed `store` with the three-question fixture, started at `clock.now()`.
pub async fn seed(store: Arc<dyn SessionStore>, clock: Clock) {
    SessionSetupService::new(clock, store)
        .begin("taker@example.com", parse_question_source(QUESTIONS).unwrap())
        .await
        .unwrap();
}
