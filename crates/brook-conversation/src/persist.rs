//! Persistence gateway: debounced write-through of the message list.
//!
//! Stores receive read-only snapshots and never feed anything back into the
//! live transcript. The debounce exists because streaming mutates the
//! transcript on every delta; one write per keystroke-sized change would
//! hammer the store for no benefit.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use brook_chat::Message;

/// Delay between the last transcript mutation and the write it triggers
pub const DEFAULT_PERSIST_DELAY: Duration = Duration::from_secs(1);

/// Durable storage for one conversation's message list.
///
/// `persist` replaces whatever was stored for the id; partial appends are
/// the store's own concern.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn persist(&self, conversation_id: &str, messages: &[Message]) -> std::io::Result<()>;
}

/// In-memory store, mainly for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryStore {
    saved: Mutex<HashMap<String, Vec<Message>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last snapshot persisted for a conversation
    pub fn get(&self, conversation_id: &str) -> Option<Vec<Message>> {
        self.saved.lock().get(conversation_id).cloned()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn persist(&self, conversation_id: &str, messages: &[Message]) -> std::io::Result<()> {
        self.saved
            .lock()
            .insert(conversation_id.to_string(), messages.to_vec());
        Ok(())
    }
}

/// Entry types for the JSONL conversation files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StoreEntry {
    /// File header
    Header {
        conversation_id: String,
        saved_at: i64,
    },
    /// A message in the conversation
    Message { message: Message },
}

/// File-backed store writing one `<conversation_id>.jsonl` per conversation
pub struct JsonlStore {
    dir: PathBuf,
}

impl JsonlStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, conversation_id: &str) -> PathBuf {
        self.dir.join(format!("{}.jsonl", conversation_id))
    }

    /// Load a previously persisted conversation
    pub fn load(&self, conversation_id: &str) -> std::io::Result<Vec<Message>> {
        let path = self.path_for(conversation_id);
        if !path.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Conversation not found: {}", conversation_id),
            ));
        }

        let file = File::open(&path)?;
        let reader = BufReader::new(file);

        let mut messages = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            if let Ok(StoreEntry::Message { message }) = serde_json::from_str::<StoreEntry>(&line) {
                messages.push(message);
            }
        }
        Ok(messages)
    }
}

#[async_trait]
impl ConversationStore for JsonlStore {
    async fn persist(&self, conversation_id: &str, messages: &[Message]) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let file = File::create(self.path_for(conversation_id))?;
        let mut writer = BufWriter::new(file);

        let header = StoreEntry::Header {
            conversation_id: conversation_id.to_string(),
            saved_at: chrono::Utc::now().timestamp_millis(),
        };
        writeln!(writer, "{}", serde_json::to_string(&header)?)?;

        for message in messages {
            let entry = StoreEntry::Message {
                message: message.clone(),
            };
            writeln!(writer, "{}", serde_json::to_string(&entry)?)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Trailing-edge debouncer in front of a [`ConversationStore`].
///
/// Every nudge re-arms the timer with the latest snapshot; the write happens
/// once the transcript has been quiet for the configured delay. Failures are
/// logged and swallowed, persistence is fire-and-forget for the caller.
/// Spawns onto the ambient Tokio runtime.
pub struct DebouncedPersister {
    conversation_id: String,
    store: Arc<dyn ConversationStore>,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl DebouncedPersister {
    pub fn new(
        conversation_id: impl Into<String>,
        store: Arc<dyn ConversationStore>,
        delay: Duration,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            store,
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Schedule a write of this snapshot, replacing any still-pending one
    pub fn nudge(&self, messages: Vec<Message>) {
        let conversation_id = self.conversation_id.clone();
        let store = Arc::clone(&self.store);
        let delay = self.delay;

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = store.persist(&conversation_id, &messages).await {
                tracing::warn!("Failed to persist conversation {}: {}", conversation_id, e);
            }
        });

        if let Some(previous) = self.pending.lock().replace(task) {
            previous.abort();
        }
    }

    /// Write this snapshot now, dropping any pending delayed write
    pub async fn flush(&self, messages: Vec<Message>) {
        if let Some(previous) = self.pending.lock().take() {
            previous.abort();
        }
        if let Err(e) = self.store.persist(&self.conversation_id, &messages).await {
            tracing::warn!(
                "Failed to persist conversation {}: {}",
                self.conversation_id,
                e
            );
        }
    }
}
