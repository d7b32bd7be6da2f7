use log::{debug, error, info, warn};

use crate::Result;
use crate::api::models::{
    AccessPoint, AddressConfig, ClientConfig, ClientStatus, InitFailurePolicy, Ipv4Info,
    NetworkCredentials, RestoreOutcome, StationConfig, WifiError,
};
use crate::core::address::{apply_address_config, wait_for_address};
use crate::core::connection::{connect_using_config, teardown};
use crate::core::scan::scan_networks;
use crate::platform::{DriverResult, EventDispatcher, NetworkStack, RadioDriver, StationInterface};

/// Station-mode Wi-Fi client.
///
/// This is the main entry point of the crate. It sequences the three
/// platform collaborators through one explicit lifecycle:
///
/// ```text
/// NotInitialized --setup--> Disconnected --connect/restore--> Connected
///                                 ^                               |
///                                 +----------disconnect-----------+
/// ```
///
/// Every operation checks the current [`ClientStatus`] before touching the
/// platform and fails with [`WifiError::InvalidState`] otherwise.
///
/// # Examples
///
/// ## Joining a network
///
/// ```rust
/// use wifi_station::sim::{SimAccessPoint, SimulatedPlatform};
/// use wifi_station::{Bssid, ClientConfig, NetworkCredentials};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let platform = SimulatedPlatform::new()?
///     .with_access_point(SimAccessPoint::new("HomeNet", Bssid([2, 0, 0, 0, 0, 7])).password("secret"));
/// let mut client = platform.into_client(ClientConfig::default());
///
/// client.setup()?;
/// client.connect(&NetworkCredentials::new("HomeNet").with_password("secret"), None)?;
/// let ip = client.wait_for_address()?;
/// println!("got {}", ip.ip);
///
/// client.disconnect()?;
/// # Ok(())
/// # }
/// ```
///
/// ## Reconnecting after a reboot
///
/// ```rust
/// use wifi_station::sim::{SimAccessPoint, SimulatedPlatform};
/// use wifi_station::{Bssid, ClientConfig, RestoreOutcome};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let platform = SimulatedPlatform::new()?;
/// let mut client = platform.into_client(ClientConfig::default());
/// client.setup()?;
///
/// match client.restore_connection()? {
///     RestoreOutcome::Restored => println!("back online"),
///     RestoreOutcome::NothingSaved => println!("no saved network"),
///     RestoreOutcome::Unreachable(reason) => println!("saved network refused: {reason}"),
/// }
/// # Ok(())
/// # }
/// ```
///
/// # Blocking
///
/// `connect`, `restore_connection` and `wait_for_address` block the calling
/// thread until the platform reports an outcome on its event loop. There are
/// no timeouts.
pub struct WifiClient<R, N, E> {
    config: ClientConfig,
    status: ClientStatus,
    station: Option<StationInterface>,
    radio: R,
    netif: N,
    events: E,
}

impl<R, N, E> WifiClient<R, N, E>
where
    R: RadioDriver,
    N: NetworkStack,
    E: EventDispatcher,
{
    /// Creates an uninitialized client over the given platform.
    ///
    /// Nothing is called on the platform until [`WifiClient::setup`].
    pub fn new(config: ClientConfig, radio: R, netif: N, events: E) -> Self {
        Self {
            config,
            status: ClientStatus::NotInitialized,
            station: None,
            radio,
            netif,
            events,
        }
    }

    pub fn status(&self) -> ClientStatus {
        self.status
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Station interface created by `setup`, if it has run.
    pub fn station(&self) -> Option<StationInterface> {
        self.station
    }

    /// Brings up the network layer, the default event loop and the radio
    /// driver, then creates the station interface.
    ///
    /// On a platform failure the configured [`InitFailurePolicy`] applies:
    /// `Abort` logs the error and panics, `Report` returns it and leaves
    /// the client uninitialized.
    pub fn setup(&mut self) -> Result<()> {
        self.require("setup", ClientStatus::NotInitialized)?;

        match self.init_platform() {
            Ok(station) => {
                self.station = Some(station);
                self.status = ClientStatus::Disconnected;
                info!("Wi-Fi station ready");
                Ok(())
            }
            Err(e) => match self.config.init_failure {
                InitFailurePolicy::Abort => {
                    error!("Wi-Fi platform initialization failed: {e}");
                    panic!("Wi-Fi platform initialization failed: {e}");
                }
                InitFailurePolicy::Report => {
                    error!("Wi-Fi platform initialization failed: {e}");
                    Err(e.into())
                }
            },
        }
    }

    fn init_platform(&mut self) -> DriverResult<StationInterface> {
        self.netif.init()?;
        self.events.create_default_loop()?;
        self.radio.init()?;
        let station = self.netif.create_default_station()?;
        debug!("Created station interface {}", station.raw());
        Ok(station)
    }

    /// Scans every channel and returns up to `max_results` access points,
    /// strongest first.
    ///
    /// The radio is stopped again afterwards. Any configuration the driver
    /// had saved is reset by the scan.
    pub fn scan(&mut self, max_results: usize) -> Result<Vec<AccessPoint>> {
        self.require("scan", ClientStatus::Disconnected)?;
        if max_results == 0 {
            return Err(WifiError::MissingArgument("max_results"));
        }

        scan_networks(&mut self.radio, max_results)
    }

    /// Joins a network.
    ///
    /// With `address` set to `None` the interface gets its address by DHCP;
    /// otherwise the DHCP client is stopped and the manual IPv4 settings are
    /// applied. Returns once the radio is associated; use
    /// [`WifiClient::wait_for_address`] to wait for the network layer.
    ///
    /// A refused association (wrong passphrase, network not found) resets
    /// the radio and is returned as [`WifiError::ConnectionRejected`].
    pub fn connect(
        &mut self,
        credentials: &NetworkCredentials,
        address: Option<&AddressConfig>,
    ) -> Result<()> {
        let station = self.require_station("connect", ClientStatus::Disconnected)?;
        if !credentials.has_target() {
            return Err(WifiError::MissingArgument("ssid"));
        }

        apply_address_config(&mut self.netif, station, address)?;

        let config = StationConfig::from_credentials(credentials);
        connect_using_config(&mut self.radio, &self.events, &config)?;
        self.status = ClientStatus::Connected;
        Ok(())
    }

    /// Rejoins the network the driver saved from an earlier session.
    ///
    /// The radio is left untouched when nothing is saved, or when the saved
    /// configuration cannot be read back. A saved network
    /// that refuses the client is reported as
    /// [`RestoreOutcome::Unreachable`], not as an error.
    pub fn restore_connection(&mut self) -> Result<RestoreOutcome> {
        self.require("restore_connection", ClientStatus::Disconnected)?;

        let saved = match self.radio.get_config() {
            Ok(saved) => saved,
            Err(e) => {
                warn!("Could not read saved station configuration: {e}");
                return Ok(RestoreOutcome::NothingSaved);
            }
        };
        if !saved.is_present() {
            debug!("No saved station configuration");
            return Ok(RestoreOutcome::NothingSaved);
        }

        info!("Restoring connection to '{}'", saved.ssid);
        match connect_using_config(&mut self.radio, &self.events, &saved) {
            Ok(()) => {
                self.status = ClientStatus::Connected;
                Ok(RestoreOutcome::Restored)
            }
            Err(WifiError::ConnectionRejected(reason)) => Ok(RestoreOutcome::Unreachable(reason)),
            Err(e) => Err(e),
        }
    }

    /// Returns the station's IPv4 settings, blocking until an address is
    /// bound if there is none yet.
    pub fn wait_for_address(&self) -> Result<Ipv4Info> {
        let station = self.require_station("wait_for_address", ClientStatus::Connected)?;
        wait_for_address(&self.netif, &self.events, station)
    }

    /// Leaves the current network: disconnect, stop, and restore radio
    /// defaults.
    ///
    /// The first failing step is returned, but the client is considered
    /// disconnected either way.
    pub fn disconnect(&mut self) -> Result<()> {
        self.require("disconnect", ClientStatus::Connected)?;

        let result = teardown(&mut self.radio);
        self.status = ClientStatus::Disconnected;
        if result.is_ok() {
            info!("Disconnected");
        }
        result
    }

    /// Current IPv4 settings of the station interface, without waiting.
    pub fn ip_info(&self) -> Result<Ipv4Info> {
        let station = self.require_initialized("ip_info")?;
        Ok(self.netif.ip_info(station)?)
    }

    /// Station configuration the driver currently holds in persistent
    /// storage.
    pub fn saved_config(&self) -> Result<StationConfig> {
        self.require_initialized("saved_config")?;
        Ok(self.radio.get_config()?)
    }

    fn require(&self, operation: &'static str, expected: ClientStatus) -> Result<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(self.invalid_state(operation))
        }
    }

    fn require_station(
        &self,
        operation: &'static str,
        expected: ClientStatus,
    ) -> Result<StationInterface> {
        self.require(operation, expected)?;
        self.station.ok_or_else(|| self.invalid_state(operation))
    }

    fn require_initialized(&self, operation: &'static str) -> Result<StationInterface> {
        match (self.status, self.station) {
            (ClientStatus::NotInitialized, _) | (_, None) => Err(self.invalid_state(operation)),
            (_, Some(station)) => Ok(station),
        }
    }

    fn invalid_state(&self, operation: &'static str) -> WifiError {
        WifiError::InvalidState {
            operation,
            status: self.status,
        }
    }
}
