//! Persistent credential storage.
//!
//! All credential mutation funnels through [`SessionStore`]; nothing else in
//! the crate touches the file. The store holds exactly two string slots and
//! enforces the both-or-neither invariant at the load site: a document with
//! only one half present reads back as logged out.

use std::{collections::HashMap, path::PathBuf};

use {
    anyhow::Result,
    secrecy::{ExposeSecret, Secret},
    tracing::debug,
};

/// Storage key for the short-lived access credential.
pub const ACCESS_KEY: &str = "lw_access_token";
/// Storage key for the long-lived refresh credential.
pub const REFRESH_KEY: &str = "lw_refresh_token";

/// A matched access/refresh credential pair. Never constructed with only
/// one half.
#[derive(Clone)]
pub struct Credentials {
    pub access: Secret<String>,
    pub refresh: Secret<String>,
}

impl Credentials {
    pub fn new(access: String, refresh: String) -> Self {
        Self {
            access: Secret::new(access),
            refresh: Secret::new(refresh),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access", &"[REDACTED]")
            .field("refresh", &"[REDACTED]")
            .finish()
    }
}

/// File-based credential storage at `~/.config/livewire/credentials.json`.
///
/// Writes are last-write-wins with no cross-process locking: a login racing
/// a logout in the same tick can lose an update. Tolerable because stored
/// values are idempotent snapshots — any valid pair is as good as another.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new() -> Self {
        let path = livewire_config::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("credentials.json");
        Self { path }
    }

    /// Create a session store at a specific path (useful for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the stored credential pair. Returns `None` when logged out or
    /// when only one half is present.
    pub fn load(&self) -> Option<Credentials> {
        let map = self.read_map()?;
        let access = map.get(ACCESS_KEY)?;
        let refresh = map.get(REFRESH_KEY)?;
        Some(Credentials::new(access.clone(), refresh.clone()))
    }

    /// Persist a full credential pair, replacing whatever was stored.
    pub fn store(&self, credentials: &Credentials) -> Result<()> {
        let mut map = HashMap::new();
        map.insert(ACCESS_KEY, credentials.access.expose_secret().as_str());
        map.insert(REFRESH_KEY, credentials.refresh.expose_secret().as_str());
        self.write_map(&map)?;
        debug!(path = %self.path.display(), "stored credential pair");
        Ok(())
    }

    /// Overwrite only the access slot after a refresh exchange. The refresh
    /// credential is untouched; storing an access half with no refresh half
    /// present is refused.
    pub fn store_access(&self, access: &str) -> Result<()> {
        let refresh = self
            .read_map()
            .and_then(|m| m.get(REFRESH_KEY).cloned())
            .ok_or_else(|| anyhow::anyhow!("no refresh credential stored"))?;

        let mut map = HashMap::new();
        map.insert(ACCESS_KEY, access);
        map.insert(REFRESH_KEY, refresh.as_str());
        self.write_map(&map)?;
        debug!(path = %self.path.display(), "rotated access credential");
        Ok(())
    }

    /// Drop both credential slots.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "cleared credentials");
                Ok(())
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn read_map(&self) -> Option<HashMap<String, String>> {
        let data = std::fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&data).ok()
    }

    fn write_map(&self, map: &HashMap<&str, &str>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, &data)?;

        // Set file permissions to 0600 on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
