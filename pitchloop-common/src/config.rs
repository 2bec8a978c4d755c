use crate::error::ConfigError;
use crate::music::MetricStructure;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn install_test_logger() {
        let _ = fern::Dispatch::new()
            .level(log::LevelFilter::Debug)
            .chain(fern::Output::call(|record| println!("{}", record.args())))
            .apply();
    }

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(8, config.tracks);
        assert_eq!(120.0, config.tempo_bpm);
        assert_eq!(4, config.beats_per_bar);
        assert!(!config.monitor_input);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        install_test_logger();

        let mut file = NamedTempFile::new().unwrap();
        {
            let file = file.as_file_mut();
            writeln!(file, "tracks = 4").unwrap();
            writeln!(file, "tempo_bpm = 95.5").unwrap();
            file.flush().unwrap();
        }

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(4, config.tracks);
        assert_eq!(95.5, config.tempo_bpm);
        // unspecified fields keep their defaults
        assert_eq!(4, config.beats_per_bar);
        assert_eq!(DEFAULT_GUI_QUEUE_SIZE, config.gui_queue_size);
    }

    #[test]
    fn test_missing_file_is_default() {
        install_test_logger();

        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_file(&dir.path().join("config.toml")).unwrap();
        assert_eq!(Config::new(), config);
    }

    #[test]
    fn test_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file.as_file_mut(), "tracks = [").unwrap();

        match Config::from_file(file.path()) {
            Err(ConfigError::ParseError(_)) => {}
            r => panic!("expected parse error, got {:?}", r),
        }
    }

    #[test]
    fn test_validation() {
        let mut config = Config::new();
        config.tracks = 0;
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.tracks = MAX_TRACKS + 1;
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.tempo_bpm = -3.0;
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.beats_per_bar = 0;
        assert!(config.validate().is_err());

        // rounds to zero micro-bpm
        let mut config = Config::new();
        config.tempo_bpm = 1e-7;
        match config.validate() {
            Err(ConfigError::Invalid(_)) => {}
            r => panic!("expected validation error, got {:?}", r),
        }

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file.as_file_mut(), "tracks = 40").unwrap();
        match Config::from_file(file.path()) {
            Err(ConfigError::Invalid(_)) => {}
            r => panic!("expected validation error, got {:?}", r),
        }
    }

    #[test]
    fn test_metric_structure() {
        let mut config = Config::new();
        config.beats_per_bar = 3;
        config.tempo_bpm = 140.0;
        let ms = config.metric_structure().unwrap();
        assert_eq!(3, ms.beats_per_bar());
        assert_eq!(140.0, ms.tempo.bpm());
    }
}

/// MIDI note-on/off and controller messages are matched against the track
/// index as channel, so there can be no more tracks than MIDI channels.
pub const MAX_TRACKS: usize = 16;
pub const DEFAULT_GUI_QUEUE_SIZE: usize = 512;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub tracks: usize,
    pub tempo_bpm: f32,
    pub beats_per_bar: u8,
    /// copy the input to the output
    pub monitor_input: bool,
    pub gui_queue_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

impl Config {
    pub fn new() -> Config {
        Config {
            tracks: 8,
            tempo_bpm: 120.0,
            beats_per_bar: 4,
            monitor_input: false,
            gui_queue_size: DEFAULT_GUI_QUEUE_SIZE,
        }
    }

    pub fn default_path() -> PathBuf {
        let mut config_path = dirs::config_dir().unwrap_or_default();
        config_path.push("pitchloop/config.toml");
        config_path
    }

    /// Reads the config at `path`. A missing file is not an error and produces
    /// the default config.
    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let config_string = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No config file at {}, using defaults", path.display());
                String::new()
            }
            Err(e) => return Err(e.into()),
        };

        let config: Config = toml::from_str(&config_string)?;
        config.validate()?;

        debug!("Config: {:#?}", config);

        Ok(config)
    }

    pub fn read() -> Result<Config, ConfigError> {
        Config::from_file(&Config::default_path())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracks == 0 || self.tracks > MAX_TRACKS {
            return Err(ConfigError::Invalid(format!(
                "tracks must be between 1 and {}",
                MAX_TRACKS
            )));
        }

        if self.gui_queue_size == 0 {
            return Err(ConfigError::Invalid(
                "gui_queue_size must be positive".to_string(),
            ));
        }

        self.metric_structure().map(|_| ())
    }

    pub fn metric_structure(&self) -> Result<MetricStructure, ConfigError> {
        MetricStructure::new(self.beats_per_bar, 4, self.tempo_bpm).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "invalid tempo {} or beats per bar {}",
                self.tempo_bpm, self.beats_per_bar
            ))
        })
    }
}
