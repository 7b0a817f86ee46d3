use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use log::warn;
use serde::{Serialize, de::DeserializeOwned};

use crate::session::result::RoundResult;
use crate::store::schema::{ProfileData, RoundHistoryData};

const PROFILE_FILE: &str = "profile.json";
const HISTORY_FILE: &str = "round_history.json";

pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("earstaff");
        Self::with_base_dir(base_dir)
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    fn load<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let path = self.file_path(name);
        if !path.exists() {
            return T::default();
        }
        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("{} is unreadable ({e}), starting fresh", path.display());
                T::default()
            }),
            Err(e) => {
                warn!("failed to read {}: {e}", path.display());
                T::default()
            }
        }
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Load and deserialize profile. Returns None if file exists but
    /// cannot be parsed (schema mismatch / corruption).
    pub fn load_profile(&self) -> Option<ProfileData> {
        let path = self.file_path(PROFILE_FILE);
        if path.exists() {
            let content = fs::read_to_string(&path).ok()?;
            serde_json::from_str(&content).ok()
        } else {
            Some(ProfileData::default())
        }
    }

    pub fn save_profile(&self, data: &ProfileData) -> Result<()> {
        self.save(PROFILE_FILE, data)
    }

    pub fn load_history(&self) -> RoundHistoryData {
        self.load(HISTORY_FILE)
    }

    pub fn save_history(&self, data: &RoundHistoryData) -> Result<()> {
        self.save(HISTORY_FILE, data)
    }

    /// Append one round to the on-disk history, dropping the oldest entries
    /// past the cap.
    pub fn append_round(&self, round: RoundResult) -> Result<RoundHistoryData> {
        let mut history = self.load_history();
        if history.needs_reset() {
            history = RoundHistoryData::default();
        }
        history.push_capped(round);
        self.save_history(&history)?;
        Ok(history)
    }

    /// Wipe both files back to empty defaults.
    #[allow(dead_code)]
    pub fn reset(&self) -> Result<()> {
        self.save_profile(&ProfileData::default())?;
        self.save_history(&RoundHistoryData::default())
    }
}
