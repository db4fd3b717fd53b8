// core/src/storage.rs
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};

/// Enkel nøkkel/verdi-lagring av tekst (brukerpreferanser på klokken).
///
/// `get` gir rå bytes; tolkning som tekst er kallerens ansvar.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>>;
    fn set(&mut self, key: &str, text: &str) -> io::Result<()>;
}

/// Én fil per nøkkel i en katalog: `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        if path.exists() {
            let bytes = std::fs::read(&path)?;
            debug!("📂 Leste {} bytes fra {}", bytes.len(), path.display());
            Ok(Some(bytes))
        } else {
            debug!("⚠️ Fant ikke {}", path.display());
            Ok(None)
        }
    }

    fn set(&mut self, key: &str, text: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        std::fs::write(&path, text)?;
        info!("✅ Lagret '{}' til {}", key, path.display());
        Ok(())
    }
}

/// In-memory variant for tester og simulering.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Legger inn vilkårlige bytes (også ugyldig UTF-8).
    pub fn insert_raw(&mut self, key: &str, bytes: Vec<u8>) {
        self.entries.insert(key.to_string(), bytes);
    }

    pub fn raw(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, text: &str) -> io::Result<()> {
        self.entries.insert(key.to_string(), text.as_bytes().to_vec());
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, text: &str) -> io::Result<()> {
        (**self).set(key, text)
    }
}
