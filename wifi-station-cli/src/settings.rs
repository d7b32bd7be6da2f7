//! TOML configuration file.
//!
//! ```toml
//! [client]
//! setup_storage = true
//! enable_logs = false
//! init_failure = "report"
//!
//! [storage]
//! path = "/var/lib/wifi-station/station.toml"
//!
//! [[network]]
//! ssid = "HomeNet"
//! password = "secret"
//! rssi = -48
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use wifi_station::sim::SimAccessPoint;
use wifi_station::{Bssid, ClientConfig};

/// Everything the configuration file can set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub client: ClientConfig,
    pub storage: StorageSettings,
    /// Networks visible to the simulated radio.
    #[serde(rename = "network")]
    pub networks: Vec<NetworkEntry>,
}

/// Where the saved network is kept between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Storage file; the partition lives in memory when unset.
    pub path: Option<PathBuf>,
}

/// One simulated access point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkEntry {
    pub ssid: String,
    #[serde(default)]
    pub password: Option<String>,
    /// Derived from the entry's position when omitted.
    #[serde(default)]
    pub bssid: Option<Bssid>,
    #[serde(default = "default_rssi")]
    pub rssi: i8,
    #[serde(default = "default_channel")]
    pub channel: u8,
    #[serde(default = "default_true")]
    pub dhcp: bool,
}

fn default_rssi() -> i8 {
    -50
}

fn default_channel() -> u8 {
    1
}

fn default_true() -> bool {
    true
}

impl NetworkEntry {
    /// Builds the access point for the `index`-th configured network.
    pub fn access_point(&self, index: usize) -> Result<SimAccessPoint> {
        let bssid = match self.bssid {
            Some(bssid) => bssid,
            None => derived_bssid(index)
                .with_context(|| format!("network '{}' needs an explicit bssid", self.ssid))?,
        };

        let mut ap = SimAccessPoint::new(&self.ssid, bssid)
            .rssi(self.rssi)
            .channel(self.channel);
        if let Some(password) = &self.password {
            ap = ap.password(password);
        }
        if !self.dhcp {
            ap = ap.without_dhcp();
        }
        Ok(ap)
    }
}

/// Locally administered address numbered after the entry's position.
fn derived_bssid(index: usize) -> Result<Bssid> {
    let number = index
        .checked_add(1)
        .and_then(|n| u16::try_from(n).ok())
        .with_context(|| format!("too many networks to number entry {index}"))?;
    let [hi, lo] = number.to_be_bytes();
    Ok(Bssid([0x02, 0x00, 0x00, 0x00, hi, lo]))
}

impl Settings {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    /// Reads `path`, or returns the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn access_points(&self) -> Result<Vec<SimAccessPoint>> {
        self.networks
            .iter()
            .enumerate()
            .map(|(index, entry)| entry.access_point(index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wifi_station::InitFailurePolicy;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.client.setup_storage);
        assert!(settings.networks.is_empty());
        assert!(settings.storage.path.is_none());
    }

    #[test]
    fn full_file() {
        let settings = Settings::parse(
            r#"
            [client]
            enable_logs = false
            init_failure = "report"

            [storage]
            path = "/tmp/station.toml"

            [[network]]
            ssid = "HomeNet"
            password = "secret"
            bssid = "a4:2b:b0:11:22:33"
            rssi = -40

            [[network]]
            ssid = "Guest"
            channel = 11
            dhcp = false
            "#,
        )
        .unwrap();

        assert!(settings.client.setup_storage);
        assert!(!settings.client.enable_logs);
        assert_eq!(settings.client.init_failure, InitFailurePolicy::Report);
        assert_eq!(settings.storage.path, Some(PathBuf::from("/tmp/station.toml")));

        let aps = settings.access_points().unwrap();
        assert_eq!(aps.len(), 2);
        assert_eq!(aps[0].bssid, "a4:2b:b0:11:22:33".parse::<Bssid>().unwrap());
        assert_eq!(aps[0].rssi, -40);
        assert!(aps[0].password.is_some());
        assert_eq!(aps[1].bssid, Bssid([0x02, 0, 0, 0, 0, 0x02]));
        assert_eq!(aps[1].channel, 11);
        assert!(!aps[1].dhcp);
        assert!(aps[1].password.is_none());
    }

    #[test]
    fn malformed_bssid_is_rejected() {
        let err = Settings::parse(
            r#"
            [[network]]
            ssid = "HomeNet"
            bssid = "not-a-mac"
            "#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn derived_bssids_count_past_one_byte() {
        let entry = NetworkEntry {
            ssid: "Net".into(),
            password: None,
            bssid: None,
            rssi: default_rssi(),
            channel: default_channel(),
            dhcp: true,
        };
        assert_eq!(entry.access_point(0).unwrap().bssid, Bssid([2, 0, 0, 0, 0, 1]));
        assert_eq!(entry.access_point(300).unwrap().bssid, Bssid([2, 0, 0, 0, 1, 45]));
        assert_eq!(
            entry.access_point(usize::from(u16::MAX) - 1).unwrap().bssid,
            Bssid([2, 0, 0, 0, 0xff, 0xff])
        );
    }

    #[test]
    fn derived_bssid_does_not_wrap() {
        let entry = NetworkEntry {
            ssid: "Net".into(),
            password: None,
            bssid: None,
            rssi: default_rssi(),
            channel: default_channel(),
            dhcp: true,
        };
        let err = entry.access_point(usize::from(u16::MAX)).unwrap_err();
        assert!(format!("{err:#}").contains("explicit bssid"));

        let pinned = NetworkEntry {
            bssid: Some(Bssid([2, 0, 0, 0, 0, 9])),
            ..entry
        };
        assert_eq!(
            pinned.access_point(usize::from(u16::MAX)).unwrap().bssid,
            Bssid([2, 0, 0, 0, 0, 9])
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/wifi-station.toml"))).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
