use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

use crate::types::bounded::{Ipv4Text, Ipv6Text, Passphrase, Ssid};
use crate::types::constants::{auth_mode, capacity, reason};

/// Lifecycle status of a [`WifiClient`](crate::WifiClient).
///
/// The status is the single source of truth for which operations are
/// legal. The only transitions are:
///
/// ```text
/// NotInitialized --setup--> Disconnected --connect/restore--> Connected
///                                 ^                               |
///                                 +----------disconnect-----------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    /// `setup` has not run yet; no station interface exists.
    #[default]
    NotInitialized,
    /// The stack is up and the radio is idle.
    Disconnected,
    /// The radio is associated with an access point.
    Connected,
}

impl Display for ClientStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "not initialized"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// What `setup` does when the platform fails to initialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitFailurePolicy {
    /// Log the failure and panic. Without a working network stack there is
    /// nothing meaningful left for the device to do.
    #[default]
    Abort,
    /// Return the driver error and leave the client uninitialized.
    Report,
}

/// Client behavior flags.
///
/// `setup_storage` and `enable_logs` are read by whatever bootstraps the
/// device (storage partition init, driver log levels); the client itself
/// only consults `init_failure`.
///
/// # Example
///
/// ```rust
/// use wifi_station::{ClientConfig, InitFailurePolicy};
///
/// let config = ClientConfig {
///     enable_logs: false,
///     init_failure: InitFailurePolicy::Report,
///     ..ClientConfig::default()
/// };
/// assert!(config.setup_storage);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Initialize persistent storage before bringing the radio up.
    pub setup_storage: bool,
    /// Keep the radio driver's own log output.
    pub enable_logs: bool,
    /// Behavior when platform initialization fails during `setup`.
    pub init_failure: InitFailurePolicy,
}

impl Default for ClientConfig {
    /// Defaults:
    /// - `setup_storage`: `true`
    /// - `enable_logs`: `true`
    /// - `init_failure`: [`InitFailurePolicy::Abort`]
    fn default() -> Self {
        Self {
            setup_storage: true,
            enable_logs: true,
            init_failure: InitFailurePolicy::Abort,
        }
    }
}

/// Physical address of an access point radio.
///
/// The all-`0xFF` value ([`Bssid::UNSET`]) is what an erased configuration
/// partition reads back as, and is treated as "not set".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bssid(pub [u8; capacity::BSSID]);

impl Bssid {
    /// Sentinel for "no BSSID configured".
    pub const UNSET: Bssid = Bssid([0xFF; capacity::BSSID]);

    /// Returns `true` unless this is the [`Bssid::UNSET`] sentinel.
    pub fn is_set(&self) -> bool {
        *self != Self::UNSET
    }

    pub fn octets(&self) -> [u8; capacity::BSSID] {
        self.0
    }
}

impl Default for Bssid {
    fn default() -> Self {
        Self::UNSET
    }
}

impl Display for Bssid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for Bssid {
    type Err = WifiError;

    /// Parses `aa:bb:cc:dd:ee:ff` (or `-` separated) notation. Separators
    /// cannot be mixed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || WifiError::InvalidAddress(s.to_string());
        let separator = if s.contains(':') { ':' } else { '-' };
        let mut octets = [0u8; capacity::BSSID];
        let mut parts = s.split(separator);

        for octet in octets.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }

        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Bssid(octets))
    }
}

impl Serialize for Bssid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Bssid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Credentials identifying the network to join.
///
/// SSID and password are truncated to the driver's 32 and 64 byte buffers.
/// Supplying a BSSID pins the connection to that specific radio.
///
/// # Example
///
/// ```rust
/// use wifi_station::{Bssid, NetworkCredentials};
///
/// let creds = NetworkCredentials::new("HomeNet")
///     .with_password("correct horse")
///     .with_bssid("a4:2b:b0:11:22:33".parse::<Bssid>().unwrap());
/// assert_eq!(creds.ssid.as_str(), Some("HomeNet"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NetworkCredentials {
    /// Network name.
    pub ssid: Ssid,
    /// Specific access point to associate with, if any.
    pub bssid: Option<Bssid>,
    /// WPA passphrase; `None` for open networks.
    pub password: Option<Passphrase>,
}

impl NetworkCredentials {
    pub fn new(ssid: &str) -> Self {
        Self {
            ssid: Ssid::from(ssid),
            bssid: None,
            password: None,
        }
    }

    #[must_use]
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(Passphrase::from(password));
        self
    }

    #[must_use]
    pub fn with_bssid(mut self, bssid: Bssid) -> Self {
        self.bssid = Some(bssid);
        self
    }

    /// A network can be targeted by name, by radio, or both.
    pub(crate) fn has_target(&self) -> bool {
        !self.ssid.is_empty() || self.bssid.is_some()
    }
}

/// IPv4 address, netmask and gateway of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv4Info {
    pub ip: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub gateway: Ipv4Addr,
}

impl Default for Ipv4Info {
    fn default() -> Self {
        Self {
            ip: Ipv4Addr::UNSPECIFIED,
            netmask: Ipv4Addr::UNSPECIFIED,
            gateway: Ipv4Addr::UNSPECIFIED,
        }
    }
}

impl Ipv4Info {
    pub fn new(ip: Ipv4Addr, netmask: Ipv4Addr, gateway: Ipv4Addr) -> Self {
        Self {
            ip,
            netmask,
            gateway,
        }
    }

    /// Parses a dotted-quad triple.
    ///
    /// Each input goes through the 16-byte address buffer first, so
    /// anything longer than a dotted quad is cut before parsing.
    ///
    /// ```rust
    /// use wifi_station::Ipv4Info;
    ///
    /// let info = Ipv4Info::parse("192.168.86.150", "255.255.255.0", "192.168.86.1").unwrap();
    /// assert_eq!(info.ip.octets(), [192, 168, 86, 150]);
    /// ```
    pub fn parse(ip: &str, netmask: &str, gateway: &str) -> Result<Self, WifiError> {
        Ok(Self {
            ip: parse_ipv4(ip)?,
            netmask: parse_ipv4(netmask)?,
            gateway: parse_ipv4(gateway)?,
        })
    }

    /// `true` when no address is bound (`0.0.0.0`).
    pub fn is_unset(&self) -> bool {
        self.ip.is_unspecified()
    }
}

fn parse_ipv4(input: &str) -> Result<Ipv4Addr, WifiError> {
    let text = Ipv4Text::from(input);
    text.as_str()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| WifiError::InvalidAddress(input.to_string()))
}

/// Manual IPv6 configuration slot.
///
/// Carried through the data model but never applied to the interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ipv6Config {
    pub addr: Ipv6Text,
    pub prefix_len: u8,
}

/// Manual network-layer configuration.
///
/// Passing `None` to [`WifiClient::connect`](crate::WifiClient::connect)
/// instead of an `AddressConfig` enables DHCP on the interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AddressConfig {
    pub ipv4: Option<Ipv4Info>,
    pub ipv6: Option<Ipv6Config>,
}

impl AddressConfig {
    /// Static IPv4 only.
    pub fn ipv4(info: Ipv4Info) -> Self {
        Self {
            ipv4: Some(info),
            ipv6: None,
        }
    }
}

/// Radio operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WifiMode {
    /// Radio mode not set (after a defaults restore).
    #[default]
    Null,
    /// Client of an access point.
    Station,
}

/// How the driver searches channels when connecting or scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMethod {
    /// Stop at the first matching access point.
    #[default]
    Fast,
    /// Sweep every channel.
    AllChannel,
}

/// Station configuration as applied to, and read back from, the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StationConfig {
    pub ssid: Ssid,
    pub password: Passphrase,
    /// Raw BSSID bytes; only honoured when `bssid_set` is true.
    pub bssid: Bssid,
    pub bssid_set: bool,
    pub scan_method: ScanMethod,
}

impl StationConfig {
    /// Builds the configuration for a connection attempt.
    pub fn from_credentials(creds: &NetworkCredentials) -> Self {
        Self {
            ssid: creds.ssid,
            password: creds.password.unwrap_or_default(),
            bssid: creds.bssid.unwrap_or(Bssid::UNSET),
            bssid_set: creds.bssid.is_some(),
            scan_method: ScanMethod::Fast,
        }
    }

    /// Empty configuration that sweeps all channels; used for scanning.
    pub fn scan_all_channels() -> Self {
        Self {
            scan_method: ScanMethod::AllChannel,
            ..Self::default()
        }
    }

    /// Whether a saved configuration names a network worth restoring:
    /// either the SSID is non-empty or the BSSID is not the sentinel.
    pub fn is_present(&self) -> bool {
        !self.ssid.is_empty() || self.bssid.is_set()
    }
}

/// Authentication mode advertised by an access point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    Open,
    Wep,
    WpaPsk,
    Wpa2Psk,
    WpaWpa2Psk,
    Wpa2Enterprise,
    Wpa3Psk,
    Wpa2Wpa3Psk,
    /// Unknown mode code not mapped to a specific variant.
    Other(u8),
}

impl From<u8> for AuthMode {
    fn from(code: u8) -> Self {
        match code {
            auth_mode::OPEN => Self::Open,
            auth_mode::WEP => Self::Wep,
            auth_mode::WPA_PSK => Self::WpaPsk,
            auth_mode::WPA2_PSK => Self::Wpa2Psk,
            auth_mode::WPA_WPA2_PSK => Self::WpaWpa2Psk,
            auth_mode::WPA2_ENTERPRISE => Self::Wpa2Enterprise,
            auth_mode::WPA3_PSK => Self::Wpa3Psk,
            auth_mode::WPA2_WPA3_PSK => Self::Wpa2Wpa3Psk,
            v => Self::Other(v),
        }
    }
}

impl AuthMode {
    pub fn secured(&self) -> bool {
        !matches!(self, Self::Open)
    }
}

impl Display for AuthMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Wep => write!(f, "WEP"),
            Self::WpaPsk => write!(f, "WPA-PSK"),
            Self::Wpa2Psk => write!(f, "WPA2-PSK"),
            Self::WpaWpa2Psk => write!(f, "WPA/WPA2-PSK"),
            Self::Wpa2Enterprise => write!(f, "WPA2-Enterprise"),
            Self::Wpa3Psk => write!(f, "WPA3-PSK"),
            Self::Wpa2Wpa3Psk => write!(f, "WPA2/WPA3-PSK"),
            Self::Other(v) => write!(f, "unknown auth mode ({v})"),
        }
    }
}

bitflags! {
    /// PHY capabilities advertised in a scan record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct PhyModes: u8 {
        const B = 0b0000_0001;
        const G = 0b0000_0010;
        const N = 0b0000_0100;
        /// Long-range mode.
        const LR = 0b0000_1000;
        /// Wi-Fi Protected Setup supported.
        const WPS = 0b0001_0000;
    }
}

/// One access point discovered by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPoint {
    /// Network name (may be empty for hidden networks)
    pub ssid: Ssid,
    /// Radio physical address
    pub bssid: Bssid,
    /// Primary channel
    pub channel: u8,
    /// Received signal strength in dBm
    pub rssi: i8,
    pub auth_mode: AuthMode,
    pub phy: PhyModes,
}

/// Reason code carried by a link-down event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    Unspecified,
    AuthExpire,
    AuthLeave,
    AssocExpire,
    /// The station left on its own request.
    AssocLeave,
    FourWayHandshakeTimeout,
    BeaconTimeout,
    /// No access point matched the configuration.
    NoApFound,
    /// Authentication rejected, usually a wrong passphrase.
    AuthFail,
    AssocFail,
    HandshakeTimeout,
    ConnectionFail,
    /// Unknown reason code not mapped to a specific variant.
    Other(u16),
}

impl From<u16> for DisconnectReason {
    fn from(code: u16) -> Self {
        match code {
            reason::UNSPECIFIED => Self::Unspecified,
            reason::AUTH_EXPIRE => Self::AuthExpire,
            reason::AUTH_LEAVE => Self::AuthLeave,
            reason::ASSOC_EXPIRE => Self::AssocExpire,
            reason::ASSOC_LEAVE => Self::AssocLeave,
            reason::FOUR_WAY_HANDSHAKE_TIMEOUT => Self::FourWayHandshakeTimeout,
            reason::BEACON_TIMEOUT => Self::BeaconTimeout,
            reason::NO_AP_FOUND => Self::NoApFound,
            reason::AUTH_FAIL => Self::AuthFail,
            reason::ASSOC_FAIL => Self::AssocFail,
            reason::HANDSHAKE_TIMEOUT => Self::HandshakeTimeout,
            reason::CONNECTION_FAIL => Self::ConnectionFail,
            v => Self::Other(v),
        }
    }
}

impl DisconnectReason {
    /// Raw driver code for this reason.
    pub fn code(&self) -> u16 {
        match self {
            Self::Unspecified => reason::UNSPECIFIED,
            Self::AuthExpire => reason::AUTH_EXPIRE,
            Self::AuthLeave => reason::AUTH_LEAVE,
            Self::AssocExpire => reason::ASSOC_EXPIRE,
            Self::AssocLeave => reason::ASSOC_LEAVE,
            Self::FourWayHandshakeTimeout => reason::FOUR_WAY_HANDSHAKE_TIMEOUT,
            Self::BeaconTimeout => reason::BEACON_TIMEOUT,
            Self::NoApFound => reason::NO_AP_FOUND,
            Self::AuthFail => reason::AUTH_FAIL,
            Self::AssocFail => reason::ASSOC_FAIL,
            Self::HandshakeTimeout => reason::HANDSHAKE_TIMEOUT,
            Self::ConnectionFail => reason::CONNECTION_FAIL,
            Self::Other(v) => *v,
        }
    }
}

impl Display for DisconnectReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unspecified => write!(f, "unspecified"),
            Self::AuthExpire => write!(f, "authentication expired"),
            Self::AuthLeave => write!(f, "deauthenticated"),
            Self::AssocExpire => write!(f, "association expired"),
            Self::AssocLeave => write!(f, "disassociated by station"),
            Self::FourWayHandshakeTimeout => write!(f, "4-way handshake timeout"),
            Self::BeaconTimeout => write!(f, "beacon timeout"),
            Self::NoApFound => write!(f, "no access point found"),
            Self::AuthFail => write!(f, "authentication failed"),
            Self::AssocFail => write!(f, "association failed"),
            Self::HandshakeTimeout => write!(f, "handshake timeout"),
            Self::ConnectionFail => write!(f, "connection failed"),
            Self::Other(v) => write!(f, "unknown reason ({v})"),
        }
    }
}

/// Result of [`WifiClient::restore_connection`](crate::WifiClient::restore_connection).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The saved network was joined; the client is connected.
    Restored,
    /// The driver holds no saved network; the radio was not touched.
    NothingSaved,
    /// A saved network exists but refused or dropped the client.
    Unreachable(DisconnectReason),
}

impl RestoreOutcome {
    pub fn is_restored(&self) -> bool {
        matches!(self, Self::Restored)
    }
}

/// Category of a failed platform call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// The subsystem was used before its init call.
    NotInitialized,
    /// The radio must be started first.
    NotStarted,
    /// The radio is not in station mode.
    WrongMode,
    InvalidArgument,
    /// Static addressing requires the DHCP client to be stopped.
    DhcpNotStopped,
    NotFound,
    Busy,
    /// Platform specific error code.
    Other(i32),
}

impl Display for DriverErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "not initialized"),
            Self::NotStarted => write!(f, "radio not started"),
            Self::WrongMode => write!(f, "wrong radio mode"),
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::DhcpNotStopped => write!(f, "DHCP client not stopped"),
            Self::NotFound => write!(f, "not found"),
            Self::Busy => write!(f, "busy"),
            Self::Other(code) => write!(f, "error code {code:#x}"),
        }
    }
}

/// A radio, interface or event-loop call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{op} failed: {kind}")]
pub struct DriverError {
    /// Name of the failing platform call.
    pub op: &'static str,
    pub kind: DriverErrorKind,
}

impl DriverError {
    pub fn new(op: &'static str, kind: DriverErrorKind) -> Self {
        Self { op, kind }
    }
}

/// Errors returned by client operations.
///
/// Argument and state checks happen before any platform call, so those two
/// variants guarantee nothing was changed. `ConnectionRejected` is an
/// expected outcome (wrong passphrase, network out of range) and the caller
/// may retry with other credentials; `Driver` is an infrastructure fault.
///
/// # Example
///
/// ```no_run
/// use wifi_station::{NetworkCredentials, WifiError};
/// # fn example<R, N, E>(client: &mut wifi_station::WifiClient<R, N, E>)
/// # where R: wifi_station::RadioDriver, N: wifi_station::NetworkStack, E: wifi_station::EventDispatcher {
/// match client.connect(&NetworkCredentials::new("Net").with_password("pw"), None) {
///     Ok(()) => println!("connected"),
///     Err(WifiError::ConnectionRejected(reason)) => eprintln!("rejected: {reason}"),
///     Err(e) => eprintln!("error: {e}"),
/// }
/// # }
/// ```
#[derive(Debug, Error)]
pub enum WifiError {
    /// A required input was missing or empty.
    #[error("required argument missing: {0}")]
    MissingArgument(&'static str),

    /// The operation is not allowed in the client's current status.
    #[error("`{operation}` is not allowed while the client is {status}")]
    InvalidState {
        operation: &'static str,
        status: ClientStatus,
    },

    /// A platform call failed.
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    /// The access point refused or dropped the client during the handshake.
    #[error("connection rejected: {0}")]
    ConnectionRejected(DisconnectReason),

    /// An address string could not be parsed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The event dispatcher dropped a pending wait without delivering.
    #[error("event loop closed while waiting")]
    EventLoopClosed,
}
