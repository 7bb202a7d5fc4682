use std::fs;
use std::path::Path;

use anyhow::Context;
use drivex_http::HttpConfig;
use drivex_sdk::DriveOptions;
use serde::Deserialize;

/// Contents of the `--config` file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub http: HttpConfig,
    pub drive: DriveOptions,
}

impl CliConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Failed to parse config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn no_file_means_defaults() {
        let c = CliConfig::load(None).unwrap();
        assert_eq!(c.drive.root, "root");
        assert_eq!(c.http.timeout_secs, 60);
    }

    #[test]
    fn loads_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[http]\naccess_token = \"tok\"\ntimeout_secs = 10\n\n[drive]\nsalt = \"pepper\""
        )
        .unwrap();
        let c = CliConfig::load(Some(file.path())).unwrap();
        assert_eq!(c.http.access_token.as_deref(), Some("tok"));
        assert_eq!(c.http.timeout_secs, 10);
        assert_eq!(c.drive.salt.as_deref(), Some("pepper"));
        assert_eq!(c.drive.spaces, "drive");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CliConfig::load(Some(dir.path().join("nope.toml").as_path())).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http\n").unwrap();
        assert!(CliConfig::load(Some(file.path())).is_err());
    }
}
