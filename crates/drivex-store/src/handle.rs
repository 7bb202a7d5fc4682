use std::fmt;
use std::sync::Arc;

use crate::traits::RemoteStore;

/// A store plus the space every call should be scoped to.
///
/// Cheap to clone; components each hold their own copy instead of sharing
/// mutable state.
#[derive(Clone)]
pub struct StoreHandle {
    store: Arc<dyn RemoteStore>,
    spaces: String,
}

impl StoreHandle {
    pub fn new(store: Arc<dyn RemoteStore>, spaces: impl Into<String>) -> Self {
        Self {
            store,
            spaces: spaces.into(),
        }
    }

    pub fn store(&self) -> &dyn RemoteStore {
        self.store.as_ref()
    }

    /// A new owning reference to the store.
    pub fn store_arc(&self) -> Arc<dyn RemoteStore> {
        Arc::clone(&self.store)
    }

    pub fn spaces(&self) -> &str {
        &self.spaces
    }

    /// Same store, different space.
    pub fn with_spaces(&self, spaces: impl Into<String>) -> Self {
        Self::new(Arc::clone(&self.store), spaces)
    }
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle")
            .field("spaces", &self.spaces)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryRemoteStore;

    #[test]
    fn with_spaces_shares_the_store() {
        let store = Arc::new(InMemoryRemoteStore::new());
        let handle = StoreHandle::new(store.clone(), "drive");
        let app = handle.with_spaces("appDataFolder");
        assert_eq!(handle.spaces(), "drive");
        assert_eq!(app.spaces(), "appDataFolder");
        store.insert_folder("root", "a");
        assert_eq!(Arc::strong_count(&store), 3);
        drop(app.store_arc());
        assert!(format!("{handle:?}").contains("drive"));
    }
}
