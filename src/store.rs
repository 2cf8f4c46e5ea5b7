use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::{ManualOverride, RunParams};
use crate::error::MtuResult;

/// Durable record of last-run parameters and the manual override.
pub trait ConfigStore {
    fn load_params(&self) -> MtuResult<Option<RunParams>>;
    fn save_params(&mut self, params: &RunParams) -> MtuResult<()>;

    fn load_override(&self) -> MtuResult<Option<ManualOverride>>;
    fn save_override(&mut self, manual: &ManualOverride) -> MtuResult<()>;
    fn clear_override(&mut self) -> MtuResult<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct StoredState {
    #[serde(default)]
    params: Option<RunParams>,
    #[serde(default, rename = "override")]
    manual_override: Option<ManualOverride>,
}

/// ~/.config/pathmtu/state.json on Linux
pub fn default_state_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
    });
    base.join("pathmtu").join("state.json")
}

/// Keeps everything in a single JSON file. No locking, last writer wins.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> JsonFileStore {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> MtuResult<StoredState> {
        if !self.path.exists() {
            return Ok(StoredState::default());
        }
        let text = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn write(&self, state: &StoredState) -> MtuResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(state)?)?;
        debug!("Saved state to {}", self.path.display());
        Ok(())
    }

    fn update<F>(&mut self, f: F) -> MtuResult<()>
    where F: FnOnce(&mut StoredState) {
        let mut state = self.read()?;
        f(&mut state);
        self.write(&state)
    }
}

impl ConfigStore for JsonFileStore {
    fn load_params(&self) -> MtuResult<Option<RunParams>> {
        Ok(self.read()?.params)
    }

    fn save_params(&mut self, params: &RunParams) -> MtuResult<()> {
        self.update(|state| state.params = Some(params.clone()))
    }

    fn load_override(&self) -> MtuResult<Option<ManualOverride>> {
        Ok(self.read()?.manual_override)
    }

    fn save_override(&mut self, manual: &ManualOverride) -> MtuResult<()> {
        self.update(|state| state.manual_override = Some(manual.clone()))
    }

    fn clear_override(&mut self) -> MtuResult<()> {
        self.update(|state| state.manual_override = None)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: StoredState,
}

impl ConfigStore for MemoryStore {
    fn load_params(&self) -> MtuResult<Option<RunParams>> {
        Ok(self.state.params.clone())
    }

    fn save_params(&mut self, params: &RunParams) -> MtuResult<()> {
        self.state.params = Some(params.clone());
        Ok(())
    }

    fn load_override(&self) -> MtuResult<Option<ManualOverride>> {
        Ok(self.state.manual_override.clone())
    }

    fn save_override(&mut self, manual: &ManualOverride) -> MtuResult<()> {
        self.state.manual_override = Some(manual.clone());
        Ok(())
    }

    fn clear_override(&mut self) -> MtuResult<()> {
        self.state.manual_override = None;
        Ok(())
    }
}
