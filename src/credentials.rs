use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

pub const STORE_FILE: &str = "api_keys.json";

/// Ordered provider keys with the rotation cursor fixed at the front: the
/// current key is always `keys[0]`, a failed key moves to the back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyRing {
    keys: Vec<String>,
}

impl KeyRing {
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys }
    }

    pub fn current(&self) -> Option<&str> {
        self.keys.first().map(String::as_str)
    }

    /// Move the front key to the back. A no-op on rings of one or zero keys.
    pub fn rotate(&mut self) {
        if self.keys.len() > 1 {
            let front = self.keys.remove(0);
            self.keys.push(front);
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Append a key unless it is already present.
    pub fn add(&mut self, key: String) -> bool {
        if self.keys.contains(&key) {
            return false;
        }
        self.keys.push(key);
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<String> {
        if index < self.keys.len() {
            Some(self.keys.remove(index))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialStore {
    #[serde(default)]
    pub cohere_keys: KeyRing,
    #[serde(default)]
    pub elevenlabs_keys: KeyRing,
    #[serde(default = "default_provider")]
    pub preferred_ai_provider: String,

    #[serde(skip)]
    path: PathBuf,
}

fn default_provider() -> String {
    "cohere".to_string()
}

impl CredentialStore {
    /// Read the store file; a missing file yields an empty store that will be
    /// created on the first save.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut store = if fs::metadata(path).await.is_ok() {
            let content = fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read credentials: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse credentials: {}", path.display()))?
        } else {
            Self {
                cohere_keys: KeyRing::default(),
                elevenlabs_keys: KeyRing::default(),
                preferred_ai_provider: default_provider(),
                path: PathBuf::new(),
            }
        };
        store.path = path.to_path_buf();
        Ok(store)
    }

    pub async fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write credentials: {}", self.path.display()))?;
        Ok(())
    }

    pub fn switch_provider(&mut self) {
        self.preferred_ai_provider = if self.preferred_ai_provider == "cohere" {
            "elevenlabs".to_string()
        } else {
            "cohere".to_string()
        };
    }
}

/// Shorten a key for display: first 10 and last 4 characters.
pub fn mask_key(key: &str) -> String {
    if key.len() <= 14 {
        return key.to_string();
    }
    format!("{}...{}", &key[..10], &key[key.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(n: usize) -> KeyRing {
        KeyRing::new((0..n).map(|i| format!("key-{}", i)).collect())
    }

    #[test]
    fn rotation_is_a_cyclic_permutation() {
        let mut r = ring(3);
        let original: Vec<String> = r.keys().to_vec();

        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(r.current().unwrap().to_string());
            r.rotate();
        }

        // every key tried exactly once, original order restored
        assert_eq!(seen, original);
        assert_eq!(r.keys(), original.as_slice());
    }

    #[test]
    fn single_key_ring_rotates_to_itself() {
        let mut r = ring(1);
        r.rotate();
        assert_eq!(r.current(), Some("key-0"));
    }

    #[test]
    fn empty_ring_has_no_current() {
        let mut r = KeyRing::default();
        assert!(r.current().is_none());
        r.rotate();
        assert!(r.is_empty());
    }

    #[test]
    fn add_deduplicates() {
        let mut r = KeyRing::default();
        assert!(r.add("a".to_string()));
        assert!(!r.add("a".to_string()));
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn mask_hides_the_middle() {
        assert_eq!(mask_key("sk-1234567890abcdefgh"), "sk-1234567...efgh");
        assert_eq!(mask_key("short"), "short");
    }

    #[tokio::test]
    async fn store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORE_FILE);

        let mut store = CredentialStore::load(&path).await.unwrap();
        assert!(store.cohere_keys.is_empty());
        assert_eq!(store.preferred_ai_provider, "cohere");

        store.cohere_keys.add("co-key".to_string());
        store.elevenlabs_keys.add("el-key".to_string());
        store.save().await.unwrap();

        let reloaded = CredentialStore::load(&path).await.unwrap();
        assert_eq!(reloaded.cohere_keys.current(), Some("co-key"));
        assert_eq!(reloaded.elevenlabs_keys.current(), Some("el-key"));
    }
}
