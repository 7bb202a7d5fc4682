use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// MIME type the store uses to mark folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Whether a [`Node`] is a folder or a file.
///
/// Never stored or sent; always derived from the node's MIME type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Folder,
    File,
}

impl NodeKind {
    /// Derive the kind from a MIME type.
    pub fn from_mime_type(mime_type: &str) -> Self {
        if mime_type == FOLDER_MIME_TYPE {
            Self::Folder
        } else {
            Self::File
        }
    }
}

/// One entry in the remote store, as reported by the store.
///
/// Field names follow the store's JSON representation. Everything except
/// `id` is optional in responses because callers choose which fields the
/// store returns.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub mime_type: String,

    /// The store permits several parents; drivex always creates with one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,

    #[serde(default, with = "size_repr", skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<Utc>>,

    /// Present only for files the store has computed a checksum for.
    #[serde(
        default,
        rename = "md5Checksum",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_checksum: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub app_properties: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub trashed: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub starred: bool,

    /// Set locally on nodes this process just created. Never serialized.
    #[serde(skip)]
    pub is_new: bool,
}

impl Node {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: mime_type.into(),
            ..Self::default()
        }
    }

    /// A folder node with the given parent.
    pub fn folder(id: impl Into<String>, name: impl Into<String>, parent: impl Into<String>) -> Self {
        let mut node = Self::new(id, name, FOLDER_MIME_TYPE);
        node.parents.push(parent.into());
        node
    }

    /// Derived kind. Compares the MIME type against [`FOLDER_MIME_TYPE`].
    pub fn kind(&self) -> NodeKind {
        NodeKind::from_mime_type(&self.mime_type)
    }

    pub fn is_folder(&self) -> bool {
        self.kind() == NodeKind::Folder
    }

    pub fn has_parent(&self, parent_id: &str) -> bool {
        self.parents.iter().any(|p| p == parent_id)
    }

    /// Tag the node as freshly created by this process.
    pub fn mark_new(mut self) -> Self {
        self.is_new = true;
        self
    }
}

/// A [`Node`] serialized together with its derived folder flag.
///
/// Output only. The flag is computed on every serialization and never read
/// back into a `Node`.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView<'a> {
    #[serde(flatten)]
    node: &'a Node,
    is_folder: bool,
}

impl<'a> NodeView<'a> {
    pub fn new(node: &'a Node) -> Self {
        Self {
            node,
            is_folder: node.is_folder(),
        }
    }
}

impl<'a> From<&'a Node> for NodeView<'a> {
    fn from(node: &'a Node) -> Self {
        Self::new(node)
    }
}

/// Metadata sent when creating a folder or file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    pub name: String,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub app_properties: BTreeMap<String, String>,
}

impl NodeMetadata {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            ..Self::default()
        }
    }

    /// Replace the parent list with a single parent.
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parents = vec![parent_id.into()];
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// The store reports sizes as decimal strings; accept numbers too.
mod size_repr {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &Option<u64>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(n) => s.serialize_str(&n.to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        match Option::<Repr>::deserialize(d)? {
            None => Ok(None),
            Some(Repr::Num(n)) => Ok(Some(n)),
            Some(Repr::Text(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
        }
    }
}
