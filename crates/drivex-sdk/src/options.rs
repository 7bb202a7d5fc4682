use serde::{Deserialize, Serialize};

/// Root folder ID of the per-application hidden space.
pub const APP_DATA_ROOT: &str = "appDataFolder";
pub const APP_DATA_SPACE: &str = "appDataFolder";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveOptions {
    /// Folder ID paths are resolved from.
    pub root: String,
    /// Store space searches run in.
    pub spaces: String,
    /// Key material for [`Drive::hexid`](crate::Drive::hexid).
    pub salt: Option<String>,
}

impl Default for DriveOptions {
    fn default() -> Self {
        Self {
            root: "root".into(),
            spaces: "drive".into(),
            salt: None,
        }
    }
}

impl DriveOptions {
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    /// The same options rooted in the app-data space.
    pub fn app_data(&self) -> Self {
        Self {
            root: APP_DATA_ROOT.into(),
            spaces: APP_DATA_SPACE.into(),
            salt: self.salt.clone(),
        }
    }
}
