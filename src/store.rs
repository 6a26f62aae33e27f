use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use color_eyre::Result;
use color_eyre::eyre::{Context, eyre};
use serde::{Deserialize, Serialize};

use crate::profile::Profile;

/// Whole persisted record: every profile plus the advisory active pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreData {
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
    #[serde(default)]
    pub active_profile: Option<String>,
}

/// Where a [`ProfileStore`] reads and writes its record.
pub trait StoreBackend {
    /// # Errors
    ///
    /// Returns an error when the backing storage cannot be read or decoded.
    fn load(&self) -> Result<StoreData>;

    /// # Errors
    ///
    /// Returns an error when the record cannot be written in full.
    fn save(&mut self, data: &StoreData) -> Result<()>;
}

/// JSON file replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StoreBackend for FileBackend {
    fn load(&self) -> Result<StoreData> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StoreData::default());
            }
            Err(err) => {
                return Err(err)
                    .wrap_err_with(|| format!("failed to read {}", self.path.display()));
            }
        };
        if raw.trim().is_empty() {
            return Ok(StoreData::default());
        }
        serde_json::from_str(&raw)
            .wrap_err_with(|| format!("failed to parse {}", self.path.display()))
    }

    fn save(&mut self, data: &StoreData) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create {}", parent.display()))?;

        // The temp file is created 0600 on Unix, and persist keeps that mode.
        let tmp = tempfile::NamedTempFile::new_in(parent)
            .wrap_err_with(|| format!("failed to stage write in {}", parent.display()))?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, data)
                .wrap_err("failed to encode profile store")?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|err| eyre!(err.error))
            .wrap_err_with(|| format!("failed to replace {}", self.path.display()))?;
        tracing::debug!(
            path = %self.path.display(),
            profiles = data.profiles.len(),
            "saved profile store"
        );
        Ok(())
    }
}

/// Non-persistent backend for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    data: StoreData,
    saves: usize,
}

impl MemoryBackend {
    #[must_use]
    pub fn with_data(data: StoreData) -> Self {
        Self { data, saves: 0 }
    }

    #[must_use]
    pub fn data(&self) -> &StoreData {
        &self.data
    }

    /// How many times the record has been written.
    #[must_use]
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl StoreBackend for MemoryBackend {
    fn load(&self) -> Result<StoreData> {
        Ok(self.data.clone())
    }

    fn save(&mut self, data: &StoreData) -> Result<()> {
        self.data = data.clone();
        self.saves += 1;
        Ok(())
    }
}

/// Profile CRUD plus the active pointer.
///
/// Each call loads the record, applies its change, and writes the whole
/// record back before returning. Nothing is cached between calls, so two
/// processes racing on the same file resolve as last-writer-wins.
#[derive(Debug)]
pub struct ProfileStore<B: StoreBackend = FileBackend> {
    backend: B,
}

impl ProfileStore<FileBackend> {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(FileBackend::new(path))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.backend.path()
    }
}

impl ProfileStore<MemoryBackend> {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::default())
    }
}

impl<B: StoreBackend> ProfileStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// # Errors
    ///
    /// Returns an error when the store exists but cannot be read.
    pub fn profiles(&self) -> Result<BTreeMap<String, Profile>> {
        Ok(self.backend.load()?.profiles)
    }

    /// # Errors
    ///
    /// Returns an error when the store exists but cannot be read.
    pub fn profile(&self, name: &str) -> Result<Option<Profile>> {
        Ok(self.backend.load()?.profiles.remove(name))
    }

    /// # Errors
    ///
    /// Returns an error when the store exists but cannot be read.
    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.backend.load()?.profiles.contains_key(name))
    }

    /// Insert or overwrite by name. Timestamps are the caller's job.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read or written.
    pub fn save_profile(&mut self, profile: Profile) -> Result<()> {
        let mut data = self.backend.load()?;
        tracing::debug!(profile = %profile.name, "saving profile");
        data.profiles.insert(profile.name.clone(), profile);
        self.backend.save(&data)
    }

    /// Remove by name; absent names are not an error. Returns whether a
    /// profile was removed. Deleting the active profile clears the pointer.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read or written.
    pub fn delete_profile(&mut self, name: &str) -> Result<bool> {
        let mut data = self.backend.load()?;
        if data.profiles.remove(name).is_none() {
            return Ok(false);
        }
        if data.active_profile.as_deref() == Some(name) {
            data.active_profile = None;
        }
        self.backend.save(&data)?;
        tracing::debug!(profile = name, "deleted profile");
        Ok(true)
    }

    /// Last activated profile name. Read failures degrade to `None`.
    #[must_use]
    pub fn active_profile(&self) -> Option<String> {
        match self.backend.load() {
            Ok(data) => data.active_profile,
            Err(err) => {
                tracing::warn!(error = %err, "could not read active profile");
                None
            }
        }
    }

    /// # Errors
    ///
    /// Returns an error when the store cannot be read or written.
    pub fn set_active_profile(&mut self, name: Option<&str>) -> Result<()> {
        let mut data = self.backend.load()?;
        let next = name.map(str::to_string);
        if data.active_profile == next {
            return Ok(());
        }
        data.active_profile = next;
        self.backend.save(&data)
    }
}
