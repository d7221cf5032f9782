//! PIN-gated private journal.
//!
//! Only a SHA-256 digest of the PIN is stored. There is no recovery path,
//! so after too many wrong PINs the user is offered a reset that wipes the
//! PIN together with every entry.

use std::rc::Rc;
use sha2::{Digest, Sha256};
use companion_types::{
    JournalError,
    config::JournalConfig,
    journal::{JournalEntry, JournalStatus},
    keys::{JOURNAL_ENTRIES_KEY, JOURNAL_PIN_KEY},
};
use crate::ports::StoragePort;
use crate::record::{read_json, write_json};

/// Lowercase hex SHA-256 of the PIN.
pub fn digest_pin(pin: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pin.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub struct Journal {
    storage: Rc<dyn StoragePort>,
    config: JournalConfig,
    pin_digest: Option<String>,
    /// Newest first
    entries: Vec<JournalEntry>,
    unlocked: bool,
    failed_attempts: u32,
}

impl Journal {
    /// Load the stored digest and entries. Unreadable data counts as absent.
    pub fn open(storage: Rc<dyn StoragePort>, config: JournalConfig) -> Self {
        let pin_digest = match storage.get(JOURNAL_PIN_KEY) {
            Ok(digest) => digest.filter(|d| !d.is_empty()),
            Err(e) => {
                log::error!("Failed to load journal PIN: {}", e);
                None
            }
        };
        let entries = match read_json::<Vec<JournalEntry>>(storage.as_ref(), JOURNAL_ENTRIES_KEY) {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e) => {
                log::error!("Failed to load journal entries: {}", e);
                Vec::new()
            }
        };

        Self {
            storage,
            config,
            pin_digest,
            entries,
            unlocked: false,
            failed_attempts: 0,
        }
    }

    pub fn status(&self) -> JournalStatus {
        match (&self.pin_digest, self.unlocked) {
            (None, _) => JournalStatus::NeedsPin,
            (Some(_), false) => JournalStatus::Locked,
            (Some(_), true) => JournalStatus::Unlocked,
        }
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    /// Whether the destructive reset should be offered.
    pub fn can_reset(&self) -> bool {
        self.failed_attempts >= self.config.max_pin_attempts
    }

    /// Choose a PIN (first use) or change it (while unlocked).
    /// Leaves the journal unlocked.
    pub fn set_pin(&mut self, pin: &str, confirm: &str) -> Result<(), JournalError> {
        if self.status() == JournalStatus::Locked {
            return Err(JournalError::Locked);
        }
        if pin.chars().count() < self.config.min_pin_len {
            return Err(JournalError::PinTooShort {
                min: self.config.min_pin_len,
            });
        }
        if pin != confirm {
            return Err(JournalError::PinMismatch);
        }

        let digest = digest_pin(pin);
        if let Err(e) = self.storage.set(JOURNAL_PIN_KEY, &digest) {
            log::error!("Failed to store journal PIN: {}", e);
        }
        self.pin_digest = Some(digest);
        self.unlocked = true;
        self.failed_attempts = 0;
        Ok(())
    }

    pub fn unlock(&mut self, pin: &str) -> Result<(), JournalError> {
        let Some(ref stored) = self.pin_digest else {
            return Err(JournalError::PinNotSet);
        };

        if digest_pin(pin) == *stored {
            self.unlocked = true;
            self.failed_attempts = 0;
            return Ok(());
        }

        self.failed_attempts += 1;
        let attempts = self.failed_attempts;
        log::warn!("Incorrect journal PIN ({} attempts)", attempts);
        if attempts >= self.config.max_pin_attempts {
            Err(JournalError::TooManyAttempts { attempts })
        } else {
            Err(JournalError::IncorrectPin { attempts })
        }
    }

    pub fn lock(&mut self) {
        self.unlocked = false;
    }

    /// Wipe the PIN and all entries.
    pub fn reset(&mut self) {
        for key in [JOURNAL_PIN_KEY, JOURNAL_ENTRIES_KEY] {
            if let Err(e) = self.storage.delete(key) {
                log::error!("Failed to reset journal storage at {}: {}", key, e);
            }
        }
        self.pin_digest = None;
        self.entries.clear();
        self.unlocked = false;
        self.failed_attempts = 0;
        log::info!("Journal reset");
    }

    pub fn entries(&self) -> Result<&[JournalEntry], JournalError> {
        self.ensure_unlocked()?;
        Ok(&self.entries)
    }

    /// Add a note at the front. Blank text is ignored (`Ok(None)`).
    pub fn add_entry(&mut self, text: &str) -> Result<Option<&JournalEntry>, JournalError> {
        self.ensure_unlocked()?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        self.entries.insert(0, JournalEntry::new(text));
        self.persist_entries();
        Ok(self.entries.first())
    }

    /// Replace an entry's text. Blank text leaves it unchanged (`Ok(false)`).
    pub fn edit_entry(&mut self, entry_id: &str, text: &str) -> Result<bool, JournalError> {
        self.ensure_unlocked()?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(false);
        }
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or_else(|| JournalError::EntryNotFound(entry_id.to_string()))?;
        entry.text = text.to_string();
        self.persist_entries();
        Ok(true)
    }

    pub fn delete_entry(&mut self, entry_id: &str) -> Result<(), JournalError> {
        self.ensure_unlocked()?;
        let before = self.entries.len();
        self.entries.retain(|e| e.id != entry_id);
        if self.entries.len() == before {
            return Err(JournalError::EntryNotFound(entry_id.to_string()));
        }
        self.persist_entries();
        Ok(())
    }

    fn ensure_unlocked(&self) -> Result<(), JournalError> {
        match self.status() {
            JournalStatus::Unlocked => Ok(()),
            JournalStatus::NeedsPin => Err(JournalError::PinNotSet),
            JournalStatus::Locked => Err(JournalError::Locked),
        }
    }

    fn persist_entries(&self) {
        if let Err(e) = write_json(self.storage.as_ref(), JOURNAL_ENTRIES_KEY, &self.entries) {
            log::error!("Failed to save journal entries: {}", e);
        }
    }
}
