//! Context-scoped key-value storage and the task resume contract.
//!
//! Keys are task names; values are JSON. Re-entering a task whose key is
//! already stored returns the stored value without invoking the LLM.
//! Without a storage attached to the context, every helper is a
//! pass-through and nothing persists.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::context::Context;
use crate::errors::Error;
use crate::events::{AgentEvents, LLMEvents};
use crate::request::LLMRequest;
use crate::response::LLMResponse;

/// Opaque key to opaque value. Implementations must be safe for concurrent
/// use across tasks sharing a context.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn store(&self, id: &str, value: Value) -> Result<(), Error>;

    async fn load(&self, id: &str) -> Result<Option<Value>, Error>;
}

#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Returns the storage scoped to the given workflow execution id.
    async fn storage(&self, id: &str) -> Arc<dyn Storage>;
}

#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<HashMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn store(&self, id: &str, value: Value) -> Result<(), Error> {
        self.state.lock().await.insert(id.to_string(), value);
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<Value>, Error> {
        Ok(self.state.lock().await.get(id).cloned())
    }
}

#[derive(Default)]
pub struct MemoryStorageProvider {
    state: Mutex<HashMap<String, Arc<MemoryStorage>>>,
}

impl MemoryStorageProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageProvider for MemoryStorageProvider {
    async fn storage(&self, id: &str) -> Arc<dyn Storage> {
        let mut state = self.state.lock().await;
        state
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(MemoryStorage::new()))
            .clone()
    }
}

/// Filesystem-backed storage: one JSON file per key under a base
/// directory. Writes go through a temp file and rename so readers never
/// observe a partial checkpoint.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self, Error> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)
            .map_err(|err| Error::Storage(format!("failed to create storage dir: {}", err)))?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn key_to_path(&self, key: &str) -> PathBuf {
        // Keys may contain separators like "travel > formatter". Escaping
        // is one-to-one: unsafe bytes become %XX, so distinct keys can
        // never alias to the same checkpoint file.
        let mut encoded = String::with_capacity(key.len());
        for c in key.chars() {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                encoded.push(c);
            } else {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).as_bytes() {
                    encoded.push('%');
                    encoded.push_str(&format!("{:02X}", byte));
                }
            }
        }
        self.base_path.join(format!("{}.json", encoded))
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn store(&self, id: &str, value: Value) -> Result<(), Error> {
        let path = self.key_to_path(id);
        let payload = serde_json::to_vec_pretty(&value)?;

        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &payload)
            .await
            .map_err(|err| Error::Storage(format!("failed to write '{}': {}", id, err)))?;
        tokio::fs::rename(&temp_path, &path)
            .await
            .map_err(|err| Error::Storage(format!("failed to commit '{}': {}", id, err)))
    }

    async fn load(&self, id: &str) -> Result<Option<Value>, Error> {
        let path = self.key_to_path(id);

        let payload = match tokio::fs::read(&path).await {
            Ok(payload) => payload,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(Error::Storage(format!("failed to read '{}': {}", id, err)))
            }
        };

        Ok(Some(serde_json::from_slice(&payload)?))
    }
}

/// Checkpoint of an agent task. `terminal` means the stored response is the
/// final answer; otherwise it is the running conversation and the task
/// resumes by invoking with that history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentTaskState {
    pub response: LLMResponse,
    pub terminal: bool,
}

impl AgentTaskState {
    pub fn new(response: LLMResponse, terminal: bool) -> Self {
        Self { response, terminal }
    }
}

pub(crate) async fn load_task(ctx: &Context, id: &str) -> Option<LLMResponse> {
    let storage = ctx.storage()?;
    let value = storage.load(id).await.ok()??;
    serde_json::from_value(value).ok()
}

pub(crate) async fn save_task(
    ctx: &Context,
    id: &str,
    response: LLMResponse,
) -> Result<LLMResponse, Error> {
    if let Some(storage) = ctx.storage() {
        storage.store(id, serde_json::to_value(&response)?).await?;
    }
    Ok(response)
}

pub(crate) async fn load_agent_task(ctx: &Context, id: &str) -> Option<AgentTaskState> {
    let storage = ctx.storage()?;
    let value = storage.load(id).await.ok()??;
    serde_json::from_value(value).ok()
}

pub(crate) async fn save_agent_task(
    ctx: &Context,
    id: &str,
    response: &LLMResponse,
    terminal: bool,
) -> Result<(), Error> {
    let Some(storage) = ctx.storage() else {
        return Ok(());
    };

    let state = AgentTaskState::new(response.clone(), terminal);
    storage.store(id, serde_json::to_value(&state)?).await
}

pub(crate) async fn load_work<T: DeserializeOwned>(ctx: &Context, id: &str) -> Option<T> {
    let storage = ctx.storage()?;
    let value = storage.load(id).await.ok()??;
    serde_json::from_value(value).ok()
}

pub(crate) async fn save_work<T: Serialize>(
    ctx: &Context,
    id: &str,
    value: T,
) -> Result<T, Error> {
    if let Some(storage) = ctx.storage() {
        storage.store(id, serde_json::to_value(&value)?).await?;
    }
    Ok(value)
}

/// Event sink that checkpoints an agent task's conversation after every
/// turn. The checkpoint is terminal once a turn carries no tool calls.
pub struct AgentStorageHook {
    id: String,
}

impl AgentStorageHook {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl LLMEvents for AgentStorageHook {
    async fn on_response(&self, ctx: &Context, request: &LLMRequest, response: &LLMResponse) {
        let conversation = request.history.clone().append(response.messages.clone());
        let saved = LLMResponse::new(conversation).with_usage(response.usage.clone());
        let terminal = response.tool_calls().is_empty();

        if let Err(error) = save_agent_task(ctx, &self.id, &saved, terminal).await {
            log::warn!("failed to checkpoint agent task '{}': {}", self.id, error);
        }
    }
}

impl AgentEvents for AgentStorageHook {}
