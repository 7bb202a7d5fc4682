use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use futures::{stream, StreamExt, TryStreamExt};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use drivex_types::{Node, NodeMetadata, FOLDER_MIME_TYPE};

use crate::error::{StoreError, StoreResult};
use crate::query::{sort_nodes, Query};
use crate::traits::{ByteStream, ListRequest, RemoteStore};

/// MIME type of a store-native document: readable only through export.
pub const NATIVE_DOC_MIME_TYPE: &str = "application/vnd.google-apps.document";

/// Root IDs present in every in-memory store.
const ROOTS: &[(&str, &str)] = &[("root", "My Drive"), ("appDataFolder", "Application Data")];

/// First modification timestamp handed out; each mutation advances it.
const EPOCH_SECS: i64 = 1_700_000_000;

const SESSION_PREFIX: &str = "memory://upload/";

/// Operations of [`RemoteStore`], used for fault injection and call logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreOp {
    List,
    Get,
    Media,
    Export,
    Create,
    CreateResumable,
    UploadSession,
    Update,
    Delete,
    About,
}

struct Entry {
    node: Node,
    content: Bytes,
}

struct State {
    entries: HashMap<String, Entry>,
    sessions: HashMap<String, NodeMetadata>,
    tick: i64,
    account_email: String,
    checksum_override: Option<String>,
    failures: HashMap<StoreOp, String>,
    list_log: Vec<ListRequest>,
    op_log: Vec<StoreOp>,
}

impl State {
    fn next_time(&mut self) -> Option<DateTime<Utc>> {
        self.tick += 1;
        DateTime::from_timestamp(EPOCH_SECS + self.tick, 0)
    }

    fn insert(&mut self, metadata: NodeMetadata, content: Bytes) -> Node {
        let is_folder = metadata.mime_type == FOLDER_MIME_TYPE;
        let checksum = if is_folder || metadata.mime_type == NATIVE_DOC_MIME_TYPE {
            None
        } else {
            Some(
                self.checksum_override
                    .clone()
                    .unwrap_or_else(|| hex::encode(md5::compute(&content).0)),
            )
        };
        let node = Node {
            id: Uuid::now_v7().simple().to_string(),
            name: metadata.name,
            mime_type: metadata.mime_type,
            parents: metadata.parents,
            size: (!is_folder).then_some(content.len() as u64),
            modified_time: self.next_time(),
            content_checksum: checksum,
            properties: metadata.properties,
            app_properties: metadata.app_properties,
            ..Node::default()
        };
        self.entries.insert(
            node.id.clone(),
            Entry {
                node: node.clone(),
                content,
            },
        );
        node
    }

    fn check_parents(&self, metadata: &NodeMetadata) -> StoreResult<()> {
        if metadata.name.is_empty() {
            return Err(StoreError::Api {
                status: 400,
                message: "name is required".into(),
            });
        }
        for parent in &metadata.parents {
            match self.entries.get(parent) {
                Some(e) if e.node.is_folder() => {}
                Some(_) => {
                    return Err(StoreError::Api {
                        status: 400,
                        message: format!("parent {parent} is not a folder"),
                    })
                }
                None => return Err(StoreError::NodeNotFound { id: parent.clone() }),
            }
        }
        Ok(())
    }

    fn entry(&self, id: &str) -> StoreResult<&Entry> {
        self.entries
            .get(id)
            .ok_or_else(|| StoreError::NodeNotFound { id: id.to_string() })
    }
}

/// In-memory, HashMap-based remote store.
///
/// Intended for tests and embedding. Evaluates the same query language as the
/// real store (see [`crate::query`]), starts with `root` and `appDataFolder`
/// folders, and supports fault injection:
///
/// - [`fail_next`](Self::fail_next) makes the next call of one operation fail;
/// - [`set_checksum_override`](Self::set_checksum_override) makes the store
///   report a fixed checksum for new content;
/// - [`list_requests`](Self::list_requests) and [`operations`](Self::operations)
///   expose what callers asked for.
pub struct InMemoryRemoteStore {
    state: Mutex<State>,
}

impl InMemoryRemoteStore {
    /// Create a store containing only the root folders.
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        for (id, name) in ROOTS {
            entries.insert(
                id.to_string(),
                Entry {
                    node: Node::new(*id, *name, FOLDER_MIME_TYPE),
                    content: Bytes::new(),
                },
            );
        }
        Self {
            state: Mutex::new(State {
                entries,
                sessions: HashMap::new(),
                tick: 0,
                account_email: "someone@example.com".into(),
                checksum_override: None,
                failures: HashMap::new(),
                list_log: Vec::new(),
                op_log: Vec::new(),
            }),
        }
    }

    /// Email address reported by `about`.
    pub fn with_account_email(self, email: impl Into<String>) -> Self {
        self.state.lock().expect("lock poisoned").account_email = email.into();
        self
    }

    /// Seed a folder without going through the trait.
    pub fn insert_folder(&self, parent: &str, name: &str) -> Node {
        let meta = NodeMetadata::new(name, FOLDER_MIME_TYPE).with_parent(parent);
        self.state.lock().expect("lock poisoned").insert(meta, Bytes::new())
    }

    /// Seed a file without going through the trait.
    pub fn insert_file(
        &self,
        parent: &str,
        name: &str,
        mime_type: &str,
        content: impl Into<Bytes>,
    ) -> Node {
        let meta = NodeMetadata::new(name, mime_type).with_parent(parent);
        self.state.lock().expect("lock poisoned").insert(meta, content.into())
    }

    /// Seed a store-native document whose content is only reachable by export.
    pub fn insert_native_doc(&self, parent: &str, name: &str, text: &str) -> Node {
        self.insert_file(parent, name, NATIVE_DOC_MIME_TYPE, text.to_string())
    }

    /// Report `checksum` for every file created from now on (`None` restores
    /// real checksums).
    pub fn set_checksum_override(&self, checksum: Option<String>) {
        self.state.lock().expect("lock poisoned").checksum_override = checksum;
    }

    /// Make the next call of `op` fail with a 500 carrying `message`.
    pub fn fail_next(&self, op: StoreOp, message: impl Into<String>) {
        self.state
            .lock()
            .expect("lock poisoned")
            .failures
            .insert(op, message.into());
    }

    /// Every list request received, in order.
    pub fn list_requests(&self) -> Vec<ListRequest> {
        self.state.lock().expect("lock poisoned").list_log.clone()
    }

    /// Every operation received, in order.
    pub fn operations(&self) -> Vec<StoreOp> {
        self.state.lock().expect("lock poisoned").op_log.clone()
    }

    pub fn node(&self, id: &str) -> Option<Node> {
        let state = self.state.lock().expect("lock poisoned");
        state.entries.get(id).map(|e| e.node.clone())
    }

    pub fn content(&self, id: &str) -> Option<Bytes> {
        let state = self.state.lock().expect("lock poisoned");
        state.entries.get(id).map(|e| e.content.clone())
    }

    /// Children of `parent`, sorted by name.
    pub fn children(&self, parent: &str) -> Vec<Node> {
        let state = self.state.lock().expect("lock poisoned");
        let mut nodes: Vec<Node> = state
            .entries
            .values()
            .filter(|e| e.node.has_parent(parent))
            .map(|e| e.node.clone())
            .collect();
        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        nodes
    }

    /// Number of nodes, root folders included.
    pub fn len(&self) -> usize {
        self.state.lock().expect("lock poisoned").entries.len()
    }

    /// Returns `true` if only the root folders exist.
    pub fn is_empty(&self) -> bool {
        self.len() == ROOTS.len()
    }

    fn begin(&self, op: StoreOp) -> StoreResult<()> {
        let mut state = self.state.lock().expect("lock poisoned");
        state.op_log.push(op);
        debug!(?op, "memory store call");
        match state.failures.remove(&op) {
            Some(message) => Err(StoreError::Api {
                status: 500,
                message,
            }),
            None => Ok(()),
        }
    }
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

fn once(content: Bytes) -> ByteStream {
    stream::once(async move { Ok(content) }).boxed()
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn list(&self, request: &ListRequest) -> StoreResult<Vec<Node>> {
        self.begin(StoreOp::List)?;
        debug!(query = %request.query, page_size = request.page_size, "list");
        let query = Query::parse(&request.query)?;
        let mut state = self.state.lock().expect("lock poisoned");
        state.list_log.push(request.clone());
        let mut found: Vec<Node> = state
            .entries
            .values()
            .filter(|e| query.matches(&e.node, &e.content))
            .map(|e| e.node.clone())
            .collect();
        sort_nodes(&mut found, &request.order_by)?;
        found.truncate(request.page_size.max(1));
        Ok(found)
    }

    async fn get(&self, id: &str, _fields: Option<&str>) -> StoreResult<Node> {
        self.begin(StoreOp::Get)?;
        let state = self.state.lock().expect("lock poisoned");
        Ok(state.entry(id)?.node.clone())
    }

    async fn get_media(&self, id: &str) -> StoreResult<ByteStream> {
        self.begin(StoreOp::Media)?;
        let state = self.state.lock().expect("lock poisoned");
        let entry = state.entry(id)?;
        if entry.node.is_folder() {
            return Err(StoreError::Api {
                status: 403,
                message: format!("{id} is a folder and has no content"),
            });
        }
        if entry.node.mime_type == NATIVE_DOC_MIME_TYPE {
            return Err(StoreError::from_api_message(
                403,
                "Only files with binary content can be downloaded. Use Export with Docs Editors files.",
                Some(id),
            ));
        }
        Ok(once(entry.content.clone()))
    }

    async fn export(&self, id: &str, _mime_type: &str) -> StoreResult<ByteStream> {
        self.begin(StoreOp::Export)?;
        let state = self.state.lock().expect("lock poisoned");
        let entry = state.entry(id)?;
        if entry.node.mime_type != NATIVE_DOC_MIME_TYPE {
            return Err(StoreError::Api {
                status: 403,
                message: "Export only supports Docs Editors files.".into(),
            });
        }
        Ok(once(entry.content.clone()))
    }

    async fn create(&self, metadata: &NodeMetadata, _fields: &str) -> StoreResult<Node> {
        self.begin(StoreOp::Create)?;
        let mut state = self.state.lock().expect("lock poisoned");
        state.check_parents(metadata)?;
        Ok(state.insert(metadata.clone(), Bytes::new()))
    }

    async fn create_resumable(&self, metadata: &NodeMetadata, _fields: &str) -> StoreResult<String> {
        self.begin(StoreOp::CreateResumable)?;
        let mut state = self.state.lock().expect("lock poisoned");
        state.check_parents(metadata)?;
        let url = format!("{SESSION_PREFIX}{}", Uuid::now_v7().simple());
        state.sessions.insert(url.clone(), metadata.clone());
        Ok(url)
    }

    async fn upload_session(
        &self,
        session_url: &str,
        mime_type: &str,
        body: ByteStream,
    ) -> StoreResult<Node> {
        self.begin(StoreOp::UploadSession)?;
        let mut metadata = {
            let mut state = self.state.lock().expect("lock poisoned");
            state
                .sessions
                .remove(session_url)
                .ok_or_else(|| StoreError::InvalidSession(session_url.to_string()))?
        };
        let content = body
            .try_fold(BytesMut::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await?
            .freeze();
        if metadata.mime_type.is_empty() {
            metadata.mime_type = mime_type.to_string();
        }
        let mut state = self.state.lock().expect("lock poisoned");
        Ok(state.insert(metadata, content))
    }

    async fn update(&self, id: &str, patch: &Value, _fields: &str) -> StoreResult<Node> {
        self.begin(StoreOp::Update)?;
        let patch = patch
            .as_object()
            .ok_or_else(|| StoreError::Serialization("patch must be an object".into()))?;
        let mut state = self.state.lock().expect("lock poisoned");
        let modified = state.next_time();
        let entry = state
            .entries
            .get_mut(id)
            .ok_or_else(|| StoreError::NodeNotFound { id: id.to_string() })?;
        let node = &mut entry.node;
        for (key, value) in patch {
            match (key.as_str(), value) {
                ("name", Value::String(s)) => node.name = s.clone(),
                ("mimeType", Value::String(s)) => node.mime_type = s.clone(),
                ("trashed", Value::Bool(b)) => node.trashed = *b,
                ("starred", Value::Bool(b)) => node.starred = *b,
                ("properties" | "appProperties", Value::Object(map)) => {
                    let props = if key == "properties" {
                        &mut node.properties
                    } else {
                        &mut node.app_properties
                    };
                    for (k, v) in map {
                        match v {
                            Value::Null => {
                                props.remove(k);
                            }
                            Value::String(s) => {
                                props.insert(k.clone(), s.clone());
                            }
                            other => {
                                props.insert(k.clone(), other.to_string());
                            }
                        }
                    }
                }
                _ => {
                    return Err(StoreError::Api {
                        status: 400,
                        message: format!("field {key} is not writable"),
                    })
                }
            }
        }
        node.modified_time = modified;
        Ok(node.clone())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.begin(StoreOp::Delete)?;
        let mut state = self.state.lock().expect("lock poisoned");
        if state.entries.remove(id).is_none() {
            return Err(StoreError::NodeNotFound { id: id.to_string() });
        }
        // Cascade to nodes left without any surviving parent.
        let mut removed: HashSet<String> = HashSet::from([id.to_string()]);
        loop {
            let orphans: Vec<String> = state
                .entries
                .values()
                .filter(|e| {
                    !e.node.parents.is_empty() && e.node.parents.iter().all(|p| removed.contains(p))
                })
                .map(|e| e.node.id.clone())
                .collect();
            if orphans.is_empty() {
                break;
            }
            for orphan in orphans {
                state.entries.remove(&orphan);
                removed.insert(orphan);
            }
        }
        Ok(())
    }

    async fn about(&self, _fields: &str) -> StoreResult<Value> {
        self.begin(StoreOp::About)?;
        let state = self.state.lock().expect("lock poisoned");
        let usage: usize = state.entries.values().map(|e| e.content.len()).sum();
        Ok(json!({
            "user": { "emailAddress": state.account_email },
            "storageQuota": { "limit": "16106127360", "usage": usage.to_string() },
        }))
    }
}

impl std::fmt::Debug for InMemoryRemoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryRemoteStore")
            .field("node_count", &count)
            .finish()
    }
}
