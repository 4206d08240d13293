use std::sync::{Arc, Mutex};

use super::{SavedCalculation, ScenarioStore, StoreError};

/// Process-local store. Clones share the same underlying list.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<Vec<SavedCalculation>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScenarioStore for MemoryStore {
    fn load(&self) -> Result<Vec<SavedCalculation>, StoreError> {
        let records = self
            .records
            .lock()
            .map_err(|_| StoreError::NotAvailable("memory store lock poisoned".to_string()))?;
        Ok(records.clone())
    }

    fn save(&self, records: &[SavedCalculation]) -> Result<(), StoreError> {
        let mut stored = self
            .records
            .lock()
            .map_err(|_| StoreError::NotAvailable("memory store lock poisoned".to_string()))?;
        *stored = records.to_vec();
        Ok(())
    }
}
