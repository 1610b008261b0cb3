// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Saved login for CLI commands, kept at `~/.udmt/session.json`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::client::IntakeClient;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub server: String,
    pub email: String,
    pub token: String,
}

impl Session {
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".udmt").join("session.json"))
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file {:?}", path))?;
        let session = serde_json::from_str(&content).context("Session file is corrupt; run 'udmt login' again")?;
        Ok(Some(session))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write session file {:?}", path))?;
        Ok(())
    }

    pub fn load() -> Result<Option<Self>> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::default_path().context("Could not determine home directory")?;
        self.save_to(&path)?;
        Ok(path)
    }
}

/// Client for `server` carrying a token: the explicit one if given,
/// otherwise the saved session's.
pub fn authenticated_client(server: &str, token: Option<String>) -> Result<IntakeClient> {
    let token = match token {
        Some(token) => token,
        None => Session::load()?
            .map(|session| session.token)
            .context("Not logged in. Run 'udmt login' first or pass --token")?,
    };
    Ok(IntakeClient::new(server)?.with_token(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_session_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Session::load_from(&dir.path().join("session.json")).unwrap(), None);
    }

    #[test]
    fn test_session_persists_across_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let session = Session {
            server: "http://localhost:3001".to_string(),
            email: "applicantA@example.com".to_string(),
            token: "t0k3n".to_string(),
        };

        session.save_to(&path).unwrap();
        assert_eq!(Session::load_from(&path).unwrap(), Some(session));
    }

    #[test]
    fn test_corrupt_session_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(Session::load_from(&path).is_err());
    }
}
