//! Constants for driver buffer sizes, reason codes and simulated timings.
//!
//! These values mirror the fixed layouts the radio driver expects for its
//! station configuration and scan records.

/// Fixed buffer capacities used by the radio driver.
pub mod capacity {
    /// SSID buffer in the station configuration.
    pub const SSID: usize = 32;
    /// Passphrase buffer in the station configuration.
    pub const PASSWORD: usize = 64;
    /// Physical address length.
    pub const BSSID: usize = 6;
    /// Dotted-quad IPv4 text, including the terminator slot.
    pub const IPV4_TEXT: usize = 16;
    /// Textual IPv6 address, including the terminator slot.
    pub const IPV6_TEXT: usize = 40;
}

/// Driver disconnect reason codes.
pub mod reason {
    pub const UNSPECIFIED: u16 = 1;
    pub const AUTH_EXPIRE: u16 = 2;
    pub const AUTH_LEAVE: u16 = 3;
    pub const ASSOC_EXPIRE: u16 = 4;
    pub const ASSOC_LEAVE: u16 = 8;
    pub const FOUR_WAY_HANDSHAKE_TIMEOUT: u16 = 15;
    pub const BEACON_TIMEOUT: u16 = 200;
    pub const NO_AP_FOUND: u16 = 201;
    pub const AUTH_FAIL: u16 = 202;
    pub const ASSOC_FAIL: u16 = 203;
    pub const HANDSHAKE_TIMEOUT: u16 = 204;
    pub const CONNECTION_FAIL: u16 = 205;
}

/// Authentication mode codes reported in scan records.
pub mod auth_mode {
    pub const OPEN: u8 = 0;
    pub const WEP: u8 = 1;
    pub const WPA_PSK: u8 = 2;
    pub const WPA2_PSK: u8 = 3;
    pub const WPA_WPA2_PSK: u8 = 4;
    pub const WPA2_ENTERPRISE: u8 = 5;
    pub const WPA3_PSK: u8 = 6;
    pub const WPA2_WPA3_PSK: u8 = 7;
}

/// Latencies used by the simulated platform's dispatcher.
///
/// Real hardware takes anywhere from tens of milliseconds to seconds to
/// associate and lease an address; the simulation only needs the events to
/// arrive on another context, after the caller is already waiting.
pub mod timings {
    use std::time::Duration;

    /// Delay between a connect request and its link outcome event.
    const LINK_LATENCY_MS: u64 = 20;

    /// Delay between a link-up event and the address-assigned event.
    const LEASE_LATENCY_MS: u64 = 30;

    /// Returns the simulated association latency.
    pub fn link_latency() -> Duration {
        Duration::from_millis(LINK_LATENCY_MS)
    }

    /// Returns the simulated DHCP lease latency.
    pub fn lease_latency() -> Duration {
        Duration::from_millis(LEASE_LATENCY_MS)
    }
}
