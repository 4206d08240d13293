//! Saved SIP calculations.
//!
//! [`ScenarioBook`] keeps the authoritative list in memory and mirrors it to a
//! [`ScenarioStore`] after every change. Persistence failures are logged and
//! never surface to callers; the in-memory list stays correct either way.

mod file;
mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{SipInputs, SipResult};

pub use file::{JsonFileStore, STORAGE_KEY};
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Storage not available: {0}")]
    NotAvailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScenarioError {
    #[error("Please enter a name and ensure you have calculated results.")]
    MissingName,
}

/// Persistence port for the saved-calculation list. The whole list is read
/// and written as one blob.
pub trait ScenarioStore {
    fn load(&self) -> Result<Vec<SavedCalculation>, StoreError>;

    fn save(&self, records: &[SavedCalculation]) -> Result<(), StoreError>;
}

impl<S: ScenarioStore + ?Sized> ScenarioStore for Box<S> {
    fn load(&self) -> Result<Vec<SavedCalculation>, StoreError> {
        (**self).load()
    }

    fn save(&self, records: &[SavedCalculation]) -> Result<(), StoreError> {
        (**self).save(records)
    }
}

/// A named snapshot of SIP inputs and the result they produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCalculation {
    pub id: i64,
    pub name: String,
    pub investment_amount: f64,
    pub sip_duration: f64,
    pub annual_return: f64,
    pub result: SipResult,
    /// Display date, `dd/mm/yyyy`.
    pub date: String,
    pub timestamp: DateTime<Utc>,
}

impl SavedCalculation {
    pub fn inputs(&self) -> SipInputs {
        SipInputs::new(self.investment_amount, self.sip_duration, self.annual_return)
    }
}

pub struct ScenarioBook<S> {
    store: S,
    records: Vec<SavedCalculation>,
}

impl<S: ScenarioStore> ScenarioBook<S> {
    /// Loads the stored list. An unreadable or corrupt blob starts an empty
    /// book.
    pub fn open(store: S) -> Self {
        let records = match store.load() {
            Ok(records) => {
                tracing::debug!(count = records.len(), "loaded saved calculations");
                records
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load saved calculations, starting empty");
                Vec::new()
            }
        };
        Self { store, records }
    }

    pub fn append(
        &mut self,
        name: &str,
        inputs: SipInputs,
        result: &SipResult,
    ) -> Result<SavedCalculation, ScenarioError> {
        self.append_at(name, inputs, result, Utc::now())
    }

    pub fn append_at(
        &mut self,
        name: &str,
        inputs: SipInputs,
        result: &SipResult,
        now: DateTime<Utc>,
    ) -> Result<SavedCalculation, ScenarioError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ScenarioError::MissingName);
        }

        let mut id = now.timestamp_millis();
        if let Some(max) = self.records.iter().map(|r| r.id).max() {
            id = id.max(max + 1);
        }

        let record = SavedCalculation {
            id,
            name: name.to_string(),
            investment_amount: inputs.investment_amount,
            sip_duration: inputs.sip_duration,
            annual_return: inputs.annual_return,
            result: result.clone(),
            date: now.format("%d/%m/%Y").to_string(),
            timestamp: now,
        };
        self.records.push(record.clone());
        tracing::info!(id, name, "saved calculation");
        self.persist();
        Ok(record)
    }

    /// Most recent first.
    pub fn list(&self) -> Vec<&SavedCalculation> {
        let mut records: Vec<&SavedCalculation> = self.records.iter().collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        records
    }

    pub fn get(&self, id: i64) -> Option<&SavedCalculation> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn remove(&mut self, id: i64) -> Option<SavedCalculation> {
        let index = self.records.iter().position(|r| r.id == id)?;
        let removed = self.records.remove(index);
        tracing::info!(id, "deleted calculation");
        self.persist();
        Some(removed)
    }

    pub fn clear(&mut self) {
        let count = self.records.len();
        self.records.clear();
        tracing::info!(count, "cleared saved calculations");
        self.persist();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn persist(&self) {
        if let Err(err) = self.store.save(&self.records) {
            tracing::warn!(error = %err, "failed to persist saved calculations");
        }
    }
}
