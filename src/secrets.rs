//! Scoped access to signing key material
//!
//! A [`SecretManager`] only hands out the WIF between `start()` and `stop()`.
//! Callers never pair those by hand; they open a [`SecretScope`], which stops
//! the manager when dropped, on every exit path.

use std::fs;
use std::path::PathBuf;

use crate::error::{IssuerError, Result};

pub trait SecretManager {
    /// Make key material available
    fn start(&mut self) -> Result<()>;

    /// Forget key material
    fn stop(&mut self);

    /// WIF of the signing key, only while started
    fn wif(&self) -> Option<&str>;
}

/// RAII bracket around `start()`/`stop()`
pub struct SecretScope<'a> {
    manager: &'a mut dyn SecretManager,
}

impl<'a> SecretScope<'a> {
    pub fn acquire(manager: &'a mut dyn SecretManager) -> Result<Self> {
        if let Err(e) = manager.start() {
            // A half-started manager still gets released
            manager.stop();
            return Err(e);
        }
        Ok(Self { manager })
    }

    pub fn wif(&self) -> Result<&str> {
        self.manager
            .wif()
            .ok_or_else(|| IssuerError::Secret("key material not available".to_string()))
    }
}

impl Drop for SecretScope<'_> {
    fn drop(&mut self) {
        self.manager.stop();
        log::trace!("Secret access released");
    }
}

/// Reads a WIF from a file (typically on removable media) on every `start()`
pub struct FileSecretManager {
    path: PathBuf,
    wif: Option<String>,
}

impl FileSecretManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            wif: None,
        }
    }
}

impl SecretManager for FileSecretManager {
    fn start(&mut self) -> Result<()> {
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            IssuerError::Secret(format!("cannot read key file {:?}: {}", self.path, e))
        })?;

        let wif = contents.trim();
        if wif.is_empty() {
            return Err(IssuerError::Secret(format!("key file {:?} is empty", self.path)));
        }

        self.wif = Some(wif.to_string());
        Ok(())
    }

    fn stop(&mut self) {
        self.wif = None;
    }

    fn wif(&self) -> Option<&str> {
        self.wif.as_deref()
    }
}

/// In-memory WIF that is still only exposed while started
pub struct WifSecretManager {
    wif: String,
    started: bool,
}

impl WifSecretManager {
    pub fn new(wif: impl Into<String>) -> Self {
        Self {
            wif: wif.into(),
            started: false,
        }
    }
}

impl SecretManager for WifSecretManager {
    fn start(&mut self) -> Result<()> {
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.started = false;
    }

    fn wif(&self) -> Option<&str> {
        self.started.then_some(self.wif.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wif_hidden_outside_scope() {
        let mut manager = WifSecretManager::new("cTestWif");
        assert!(manager.wif().is_none());

        {
            let scope = SecretScope::acquire(&mut manager).unwrap();
            assert_eq!(scope.wif().unwrap(), "cTestWif");
        }

        assert!(manager.wif().is_none());
    }

    #[test]
    fn test_file_manager_reads_and_forgets() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("pk_issuer.txt");
        fs::write(&path, "cTestWif\n").unwrap();

        let mut manager = FileSecretManager::new(&path);
        {
            let scope = SecretScope::acquire(&mut manager).unwrap();
            assert_eq!(scope.wif().unwrap(), "cTestWif");
        }
        assert!(manager.wif().is_none());
    }

    #[test]
    fn test_file_manager_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut manager = FileSecretManager::new(dir.path().join("missing.txt"));
        assert!(matches!(
            SecretScope::acquire(&mut manager),
            Err(IssuerError::Secret(_))
        ));
    }
}
