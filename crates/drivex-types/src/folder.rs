use std::fmt;

use crate::error::TypeError;
use crate::node::Node;

/// A folder given either by raw ID or as a folder node.
///
/// Resolved once into a plain ID at the API boundary via [`FolderRef::resolve_id`].
#[derive(Clone, Debug, PartialEq)]
pub enum FolderRef {
    Id(String),
    Folder(Node),
}

impl FolderRef {
    /// The ID this reference points at, if it names a usable folder.
    ///
    /// Fails for an empty ID and for a node that is not a folder.
    pub fn resolve_id(&self) -> Result<&str, TypeError> {
        match self {
            Self::Id(id) if id.is_empty() => {
                Err(TypeError::InvalidFolderRef("empty folder id".into()))
            }
            Self::Id(id) => Ok(id.as_str()),
            Self::Folder(node) if node.id.is_empty() => {
                Err(TypeError::InvalidFolderRef("folder node has no id".into()))
            }
            Self::Folder(node) if !node.is_folder() => Err(TypeError::InvalidFolderRef(format!(
                "{:?} ({}) is not a folder",
                node.name, node.id
            ))),
            Self::Folder(node) => Ok(node.id.as_str()),
        }
    }

    /// Raw ID without validation.
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id.as_str(),
            Self::Folder(node) => node.id.as_str(),
        }
    }

    pub fn node(&self) -> Option<&Node> {
        match self {
            Self::Id(_) => None,
            Self::Folder(node) => Some(node),
        }
    }

    pub fn into_node(self) -> Option<Node> {
        match self {
            Self::Id(_) => None,
            Self::Folder(node) => Some(node),
        }
    }
}

impl From<&str> for FolderRef {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

impl From<String> for FolderRef {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

impl From<Node> for FolderRef {
    fn from(node: Node) -> Self {
        Self::Folder(node)
    }
}

impl fmt::Display for FolderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Folder(node) => write!(f, "{} ({})", node.name, node.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::FOLDER_MIME_TYPE;

    #[test]
    fn raw_id_resolves_to_itself() {
        let r = FolderRef::from("root");
        assert_eq!(r.resolve_id().unwrap(), "root");
    }

    #[test]
    fn folder_node_resolves_to_its_id() {
        let r = FolderRef::from(Node::folder("f1", "a", "root"));
        assert_eq!(r.resolve_id().unwrap(), "f1");
        assert_eq!(r.node().map(|n| n.name.as_str()), Some("a"));
    }

    #[test]
    fn file_node_is_rejected() {
        let r = FolderRef::from(Node::new("x1", "r.txt", "text/plain"));
        let err = r.resolve_id().unwrap_err();
        assert!(err.to_string().contains("not a folder"));
        // raw access still works
        assert_eq!(r.id(), "x1");
    }

    #[test]
    fn empty_references_are_rejected() {
        assert!(FolderRef::from("").resolve_id().is_err());
        let idless = Node::new("", "a", FOLDER_MIME_TYPE);
        assert!(FolderRef::from(idless).resolve_id().is_err());
    }
}
