//! Persistence adapters for the phrase collection.
//!
//! The whole collection lives in one slot as a JSON array and is always
//! replaced wholesale. [`LmdbStorage`] is the durable adapter; [`MemoryStorage`]
//! keeps the serialized slot in memory and can be told to fail.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lmdb::{Database, DatabaseFlags, Environment, Transaction, WriteFlags};
use log::{info, warn};

use crate::error::PhraseError;
use crate::phrase_model::Phrase;

/// Name of the LMDB database inside the environment.
const DB_NAME: &str = "phrase_slots";

/// Single-slot store for the phrase collection.
pub trait PhraseStorage: Send {
    /// Returns the stored collection, or an empty one if the slot is unset.
    fn load(&self) -> Result<Vec<Phrase>, PhraseError>;

    /// Replaces the stored collection with `phrases`.
    fn save(&mut self, phrases: &[Phrase]) -> Result<(), PhraseError>;
}

/// LMDB-backed storage.
///
/// The environment directory is `<name>.lmdb`. The collection is stored
/// under one key (the slot name) inside a single named database, and every
/// save is one write transaction.
pub struct LmdbStorage {
    env: Option<Environment>,
    db: Database,
    slot: String,
    path: PathBuf,
}

impl LmdbStorage {
    /// Opens (or creates) the environment at `<name>.lmdb`.
    ///
    /// # Errors
    ///
    /// [`PhraseError::LoadFailure`] if the directory cannot be created or the
    /// environment cannot be opened.
    pub fn init(name: &str, slot: &str, map_size: usize) -> Result<Self, PhraseError> {
        let path = PathBuf::from(format!("{name}.lmdb"));

        std::fs::create_dir_all(&path).map_err(|e| {
            PhraseError::LoadFailure(format!("cannot create {}: {e}", path.display()))
        })?;

        let env = Environment::new()
            .set_max_dbs(1)
            .set_map_size(map_size)
            .open(&path)
            .map_err(|e| {
                PhraseError::LoadFailure(format!("cannot open environment at {}: {e}", path.display()))
            })?;

        let db = env
            .create_db(Some(DB_NAME), DatabaseFlags::empty())
            .map_err(|e| PhraseError::LoadFailure(format!("cannot open database: {e}")))?;

        info!("Opened phrase storage at {}", path.display());

        Ok(Self {
            env: Some(env),
            db,
            slot: slot.to_string(),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn is_open(&self) -> bool {
        self.env.is_some()
    }

    /// Removes the slot. Returns whether anything was stored.
    pub fn clear(&mut self) -> Result<bool, PhraseError> {
        let env = self.env_or(PhraseError::SaveFailure)?;
        let mut txn = env
            .begin_rw_txn()
            .map_err(|e| PhraseError::SaveFailure(format!("cannot begin write: {e}")))?;

        let existed = match txn.del(self.db, &self.slot, None) {
            Ok(()) => true,
            Err(lmdb::Error::NotFound) => false,
            Err(e) => return Err(PhraseError::SaveFailure(format!("cannot clear slot: {e}"))),
        };

        txn.commit()
            .map_err(|e| PhraseError::SaveFailure(format!("cannot commit clear: {e}")))?;
        Ok(existed)
    }

    /// Releases the environment. Later loads and saves fail until a new
    /// storage is opened on the same path.
    pub fn close(&mut self) {
        if let Some(env) = self.env.take() {
            if let Err(e) = env.sync(true) {
                warn!("Failed to sync environment before close: {e}");
            }
            info!("Closed phrase storage at {}", self.path.display());
        }
    }

    fn env_or(&self, err: fn(String) -> PhraseError) -> Result<&Environment, PhraseError> {
        self.env
            .as_ref()
            .ok_or_else(|| err(format!("storage at {} is closed", self.path.display())))
    }
}

impl PhraseStorage for LmdbStorage {
    fn load(&self) -> Result<Vec<Phrase>, PhraseError> {
        let env = self.env_or(PhraseError::LoadFailure)?;
        let txn = env
            .begin_ro_txn()
            .map_err(|e| PhraseError::LoadFailure(format!("cannot begin read: {e}")))?;

        let phrases = match txn.get(self.db, &self.slot) {
            Ok(bytes) => serde_json::from_slice(bytes)
                .map_err(|e| PhraseError::LoadFailure(format!("corrupt phrase slot: {e}")))?,
            Err(lmdb::Error::NotFound) => Vec::new(),
            Err(e) => return Err(PhraseError::LoadFailure(format!("cannot read slot: {e}"))),
        };
        Ok(phrases)
    }

    fn save(&mut self, phrases: &[Phrase]) -> Result<(), PhraseError> {
        let json = serde_json::to_vec(phrases)
            .map_err(|e| PhraseError::SaveFailure(format!("cannot serialize phrases: {e}")))?;

        let env = self.env_or(PhraseError::SaveFailure)?;
        let mut txn = env
            .begin_rw_txn()
            .map_err(|e| PhraseError::SaveFailure(format!("cannot begin write: {e}")))?;

        txn.put(self.db, &self.slot, &json, WriteFlags::empty())
            .map_err(|e| PhraseError::SaveFailure(format!("cannot write slot: {e}")))?;

        txn.commit()
            .map_err(|e| PhraseError::SaveFailure(format!("cannot commit write: {e}")))
    }
}

impl Drop for LmdbStorage {
    fn drop(&mut self) {
        self.close();
    }
}

#[derive(Debug, Default)]
struct MemorySlot {
    value: Option<Vec<u8>>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

/// In-memory slot holding the same JSON bytes LMDB would.
///
/// Clones share the slot, so a caller can keep a handle after moving one
/// into a store and inspect or sabotage it later.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<MemorySlot>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that already holds `phrases`.
    pub fn with_phrases(phrases: &[Phrase]) -> Result<Self, PhraseError> {
        let mut storage = Self::new();
        storage.save(phrases)?;
        storage.lock().writes = 0;
        Ok(storage)
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Number of successful saves.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    /// Raw slot contents.
    pub fn raw(&self) -> Option<String> {
        self.lock()
            .value
            .as_ref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    fn lock(&self) -> MutexGuard<'_, MemorySlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PhraseStorage for MemoryStorage {
    fn load(&self) -> Result<Vec<Phrase>, PhraseError> {
        let slot = self.lock();
        if slot.fail_reads {
            return Err(PhraseError::LoadFailure("memory slot unavailable".to_string()));
        }
        match &slot.value {
            Some(bytes) => serde_json::from_slice(bytes)
                .map_err(|e| PhraseError::LoadFailure(format!("corrupt phrase slot: {e}"))),
            None => Ok(Vec::new()),
        }
    }

    fn save(&mut self, phrases: &[Phrase]) -> Result<(), PhraseError> {
        let mut slot = self.lock();
        if slot.fail_writes {
            return Err(PhraseError::SaveFailure("memory slot rejected write".to_string()));
        }
        let json = serde_json::to_vec(phrases)
            .map_err(|e| PhraseError::SaveFailure(format!("cannot serialize phrases: {e}")))?;
        slot.value = Some(json);
        slot.writes += 1;
        Ok(())
    }
}
