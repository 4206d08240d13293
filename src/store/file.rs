use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{SavedCalculation, ScenarioStore, StoreError};

/// Key the saved-calculation blob is stored under.
pub const STORAGE_KEY: &str = "sipCalculations";

/// Stores the whole list as one JSON document, `<dir>/sipCalculations.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{STORAGE_KEY}.json"))
    }
}

impl ScenarioStore for JsonFileStore {
    fn load(&self) -> Result<Vec<SavedCalculation>, StoreError> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| StoreError::Parse(e.to_string()))
    }

    fn save(&self, records: &[SavedCalculation]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(records)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;
        atomic_write(&self.path(), &content)?;
        Ok(())
    }
}

/// Write-then-rename so an interrupted save never leaves a truncated blob.
fn atomic_write(path: &Path, content: &str) -> io::Result<()> {
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)
}
