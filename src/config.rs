use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Analysis service endpoint the clip is POSTed to.
    pub server_url: String,
    /// Seconds counted down before capture starts.
    pub countdown_ticks: u32,
    /// Recording budget in seconds; capture auto-stops when it runs out.
    pub recording_budget_secs: u32,
    /// Largest clip the service accepts.
    pub max_payload_bytes: u64,
    /// Capture sample rates to try, in order. Falls back to the device
    /// default with downsampling when none matches.
    pub preferred_sample_rates: Vec<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000/".into(),
            countdown_ticks: 3,
            recording_budget_secs: 5,
            max_payload_bytes: 10 * 1024 * 1024,
            preferred_sample_rates: vec![16000, 44100, 48000],
        }
    }
}

impl Config {
    /// Directory: ~/.config/soundcheck/
    fn dir() -> PathBuf {
        let mut p = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("soundcheck");
        p
    }

    fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load from disk, returning defaults if file doesn't exist or is invalid.
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let dir = Self::dir();
        fs::create_dir_all(&dir)?;
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_service_contract() {
        let cfg = Config::default();
        assert_eq!(cfg.server_url, "http://127.0.0.1:5000/");
        assert_eq!(cfg.countdown_ticks, 3);
        assert_eq!(cfg.recording_budget_secs, 5);
        assert_eq!(cfg.max_payload_bytes, 10 * 1024 * 1024);
        assert_eq!(cfg.preferred_sample_rates, vec![16000, 44100, 48000]);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!(
            "soundcheck-config-missing-{}.json",
            std::process::id()
        ));
        let cfg = Config::load_from(&path);
        assert_eq!(cfg.server_url, Config::default().server_url);
    }

    #[test]
    fn invalid_json_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!(
            "soundcheck-config-invalid-{}.json",
            std::process::id()
        ));
        fs::write(&path, "{not json").unwrap();
        let cfg = Config::load_from(&path);
        assert_eq!(cfg.recording_budget_secs, Config::default().recording_budget_secs);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn save_and_load_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "soundcheck-config-roundtrip-{}.json",
            std::process::id()
        ));
        let mut cfg = Config::default();
        cfg.server_url = "http://10.0.0.2:8080/analyze".into();
        cfg.recording_budget_secs = 12;
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded.server_url, "http://10.0.0.2:8080/analyze");
        assert_eq!(loaded.recording_budget_secs, 12);
        fs::remove_file(&path).unwrap();
    }
}
