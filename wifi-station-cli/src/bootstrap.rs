//! Device bring-up that happens before the Wi-Fi client exists:
//! persistent storage and log routing.

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use wifi_station::types::bounded::{Passphrase, Ssid};
use wifi_station::{Bssid, DRIVER_LOG_TARGETS, StationConfig};

/// Failure reported by the storage partition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The partition has no free pages left.
    #[error("storage partition has no free pages")]
    NoFreePages,
    /// The partition was written by a newer storage format.
    #[error("storage partition holds a newer format version")]
    NewVersionFound,
    #[error("storage error: {0}")]
    Other(String),
}

impl StorageError {
    /// Errors that an erase of the partition clears.
    fn recoverable(&self) -> bool {
        matches!(self, Self::NoFreePages | Self::NewVersionFound)
    }
}

/// Key-value storage partition the radio driver persists its
/// configuration in.
pub trait FlashStorage {
    fn init(&mut self) -> Result<(), StorageError>;
    fn erase(&mut self) -> Result<(), StorageError>;

    /// Station configuration saved by an earlier run, if any.
    fn load_station(&self) -> Result<Option<StationConfig>, StorageError>;

    /// Replaces the saved station configuration. One that names no
    /// network clears the entry.
    fn store_station(&mut self, config: &StationConfig) -> Result<(), StorageError>;
}

/// Initializes storage, erasing the partition and retrying once if it is
/// full or was written by a newer format.
pub fn init_storage<S>(flash: &mut S) -> Result<(), StorageError>
where
    S: FlashStorage + ?Sized,
{
    match flash.init() {
        Err(e) if e.recoverable() => {
            warn!("{e}, erasing partition");
            flash.erase()?;
            flash.init()
        }
        other => other,
    }
}

/// In-memory storage partition.
#[derive(Debug, Default)]
pub struct MemoryFlash {
    /// Error `init` keeps returning until the partition is erased.
    fault: Option<StorageError>,
    initialized: bool,
    station: Option<StationConfig>,
    pub init_calls: u32,
    pub erase_calls: u32,
}

impl MemoryFlash {
    pub fn new() -> Self {
        Self::default()
    }

    /// A partition whose `init` fails with `fault` until erased.
    pub fn with_fault(fault: StorageError) -> Self {
        Self {
            fault: Some(fault),
            ..Self::default()
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl FlashStorage for MemoryFlash {
    fn init(&mut self) -> Result<(), StorageError> {
        self.init_calls += 1;
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }
        self.initialized = true;
        Ok(())
    }

    fn erase(&mut self) -> Result<(), StorageError> {
        self.erase_calls += 1;
        self.initialized = false;
        self.fault = None;
        self.station = None;
        Ok(())
    }

    fn load_station(&self) -> Result<Option<StationConfig>, StorageError> {
        Ok(self.station)
    }

    fn store_station(&mut self, config: &StationConfig) -> Result<(), StorageError> {
        self.station = config.is_present().then_some(*config);
        Ok(())
    }
}

/// On-disk layout of a [`FileFlash`] partition.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Image {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    station: Option<StoredStation>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredStation {
    ssid: Ssid,
    #[serde(default)]
    password: Passphrase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bssid: Option<Bssid>,
}

impl From<&StationConfig> for StoredStation {
    fn from(config: &StationConfig) -> Self {
        Self {
            ssid: config.ssid,
            password: config.password,
            bssid: config.bssid_set.then_some(config.bssid),
        }
    }
}

impl From<StoredStation> for StationConfig {
    fn from(stored: StoredStation) -> Self {
        Self {
            ssid: stored.ssid,
            password: stored.password,
            bssid: stored.bssid.unwrap_or(Bssid::UNSET),
            bssid_set: stored.bssid.is_some(),
            ..Self::default()
        }
    }
}

/// Storage partition kept in a TOML file, so the saved network survives
/// between runs.
///
/// A missing file is an empty partition. A file that does not parse is
/// reported as [`StorageError::NewVersionFound`], which makes
/// [`init_storage`] erase it.
#[derive(Debug, Clone)]
pub struct FileFlash {
    path: PathBuf,
}

impl FileFlash {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, e: io::Error) -> StorageError {
        StorageError::Other(format!("{}: {e}", self.path.display()))
    }

    fn read_image(&self) -> Result<Image, StorageError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Image::default()),
            Err(e) => return Err(self.io_error(e)),
        };
        toml::from_str(&text).map_err(|e| {
            debug!("unreadable storage image {}: {e}", self.path.display());
            StorageError::NewVersionFound
        })
    }

    fn write_image(&self, image: &Image) -> Result<(), StorageError> {
        let text = toml::to_string(image).map_err(|e| StorageError::Other(e.to_string()))?;
        fs::write(&self.path, text).map_err(|e| self.io_error(e))
    }
}

impl FlashStorage for FileFlash {
    fn init(&mut self) -> Result<(), StorageError> {
        self.read_image().map(|_| ())
    }

    fn erase(&mut self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn load_station(&self) -> Result<Option<StationConfig>, StorageError> {
        Ok(self.read_image()?.station.map(StationConfig::from))
    }

    fn store_station(&mut self, config: &StationConfig) -> Result<(), StorageError> {
        let image = Image {
            station: config.is_present().then(|| StoredStation::from(config)),
        };
        self.write_image(&image)
    }
}

/// Filter directives that silence the radio driver's own output.
pub fn driver_log_directives(enable_driver_logs: bool) -> Vec<String> {
    if enable_driver_logs {
        return Vec::new();
    }
    DRIVER_LOG_TARGETS
        .iter()
        .map(|target| format!("{target}=off"))
        .collect()
}

/// Builds the log filter from `RUST_LOG` (or the verbosity level when it is
/// unset) plus the driver target directives.
pub fn log_filter(verbosity: u8, enable_driver_logs: bool) -> Result<EnvFilter> {
    let base_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(base_level));
    for directive in driver_log_directives(enable_driver_logs) {
        filter = filter.add_directive(
            directive
                .parse()
                .with_context(|| format!("invalid log directive `{directive}`"))?,
        );
    }
    Ok(filter)
}

/// Installs the global subscriber; `log` records are routed through it.
pub fn init_logging(verbosity: u8, enable_driver_logs: bool) -> Result<()> {
    let filter = log_filter(verbosity, enable_driver_logs)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to install log subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_partition_initializes_once() {
        let mut flash = MemoryFlash::new();
        init_storage(&mut flash).unwrap();
        assert!(flash.is_initialized());
        assert_eq!(flash.init_calls, 1);
        assert_eq!(flash.erase_calls, 0);
    }

    #[test]
    fn full_partition_is_erased_and_retried() {
        let mut flash = MemoryFlash::with_fault(StorageError::NoFreePages);
        init_storage(&mut flash).unwrap();
        assert!(flash.is_initialized());
        assert_eq!(flash.init_calls, 2);
        assert_eq!(flash.erase_calls, 1);
    }

    #[test]
    fn newer_format_is_erased_and_retried() {
        let mut flash = MemoryFlash::with_fault(StorageError::NewVersionFound);
        init_storage(&mut flash).unwrap();
        assert_eq!(flash.erase_calls, 1);
    }

    #[test]
    fn other_errors_are_not_retried() {
        let mut flash = MemoryFlash::with_fault(StorageError::Other("bad crc".into()));
        let err = init_storage(&mut flash).unwrap_err();
        assert_eq!(err, StorageError::Other("bad crc".into()));
        assert_eq!(flash.init_calls, 1);
        assert_eq!(flash.erase_calls, 0);
    }

    /// Stays full even after an erase.
    struct WornFlash {
        init_calls: u32,
    }

    impl FlashStorage for WornFlash {
        fn init(&mut self) -> Result<(), StorageError> {
            self.init_calls += 1;
            Err(StorageError::NoFreePages)
        }

        fn erase(&mut self) -> Result<(), StorageError> {
            Ok(())
        }

        fn load_station(&self) -> Result<Option<StationConfig>, StorageError> {
            Ok(None)
        }

        fn store_station(&mut self, _config: &StationConfig) -> Result<(), StorageError> {
            Err(StorageError::NoFreePages)
        }
    }

    #[test]
    fn retry_happens_only_once() {
        let mut flash = WornFlash { init_calls: 0 };
        assert_eq!(init_storage(&mut flash), Err(StorageError::NoFreePages));
        assert_eq!(flash.init_calls, 2);
    }

    fn home_station() -> StationConfig {
        StationConfig {
            ssid: Ssid::from("HomeNet"),
            password: Passphrase::from("secret"),
            ..StationConfig::default()
        }
    }

    #[test]
    fn memory_flash_keeps_station_until_erased() {
        let mut flash = MemoryFlash::new();
        flash.store_station(&home_station()).unwrap();
        assert_eq!(flash.load_station().unwrap(), Some(home_station()));

        flash.erase().unwrap();
        assert_eq!(flash.load_station().unwrap(), None);
    }

    #[test]
    fn file_flash_survives_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("station.toml");

        let mut flash = FileFlash::new(&path);
        init_storage(&mut flash).unwrap();
        assert_eq!(flash.load_station().unwrap(), None);

        let pinned = StationConfig {
            bssid: Bssid([2, 0, 0, 0, 0, 1]),
            bssid_set: true,
            ..home_station()
        };
        flash.store_station(&pinned).unwrap();

        let reopened = FileFlash::new(&path);
        assert_eq!(reopened.load_station().unwrap(), Some(pinned));
    }

    #[test]
    fn file_flash_clears_entry_for_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut flash = FileFlash::new(dir.path().join("station.toml"));

        flash.store_station(&home_station()).unwrap();
        flash.store_station(&StationConfig::default()).unwrap();

        assert_eq!(flash.load_station().unwrap(), None);
    }

    #[test]
    fn unreadable_file_is_erased_by_init() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("station.toml");
        fs::write(&path, "station = 42").unwrap();

        let mut flash = FileFlash::new(&path);
        assert_eq!(flash.init(), Err(StorageError::NewVersionFound));
        init_storage(&mut flash).unwrap();

        assert!(!path.exists());
        assert_eq!(flash.load_station().unwrap(), None);
    }

    #[test]
    fn driver_logs_silenced_per_target() {
        assert!(driver_log_directives(true).is_empty());
        assert_eq!(
            driver_log_directives(false),
            vec!["wifi=off", "esp_netif_handlers=off", "phy_init=off"]
        );
    }

    #[test]
    fn log_filter_accepts_driver_directives() {
        let filter = log_filter(0, false).unwrap();
        let rendered = filter.to_string();
        for target in DRIVER_LOG_TARGETS {
            assert!(rendered.contains(&format!("{target}=off")), "{rendered}");
        }
    }
}
