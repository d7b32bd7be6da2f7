//! Seams to the device platform.
//!
//! The client never talks to hardware directly. It drives three
//! collaborators, each a thin trait over the platform's own API:
//!
//! - [`RadioDriver`] - the Wi-Fi driver (mode, configuration, start/stop,
//!   association, scanning, persisted configuration)
//! - [`NetworkStack`] - the network interface layer (station interface,
//!   DHCP client, IPv4 settings)
//! - [`EventDispatcher`] - the default event loop that delivers link and
//!   address notifications on its own context
//!
//! Every call is synchronous and reports failure as a [`DriverError`].
//! [`crate::sim`] provides in-memory implementations of all three.

pub mod events;

use std::sync::Arc;

use crate::api::models::{AccessPoint, DriverError, Ipv4Info, StationConfig, WifiMode};
use events::{EventFilter, EventSink, HandlerId};

/// Result of a platform call.
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Opaque handle to the station network interface.
///
/// Created once by [`NetworkStack::create_default_station`] and owned by the
/// client for the rest of its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StationInterface(pub(crate) u32);

impl StationInterface {
    /// Wraps a platform interface index. Only platform implementations
    /// should need this.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }
}

/// The Wi-Fi driver.
pub trait RadioDriver {
    /// One-time driver initialization; calling it again is a no-op.
    fn init(&mut self) -> DriverResult<()>;

    /// Resets the driver configuration, and its persisted copy, to defaults.
    fn restore(&mut self) -> DriverResult<()>;

    fn set_mode(&mut self, mode: WifiMode) -> DriverResult<()>;

    /// Applies a station configuration. The driver persists it as the
    /// "last configuration" returned by [`RadioDriver::get_config`].
    fn set_config(&mut self, config: &StationConfig) -> DriverResult<()>;

    /// Reads back the persisted station configuration.
    fn get_config(&self) -> DriverResult<StationConfig>;

    fn start(&mut self) -> DriverResult<()>;

    fn stop(&mut self) -> DriverResult<()>;

    /// Requests association. The outcome arrives later as a link event.
    fn connect(&mut self) -> DriverResult<()>;

    fn disconnect(&mut self) -> DriverResult<()>;

    /// Starts a scan; with `block` set, returns only once it has finished.
    fn scan_start(&mut self, block: bool) -> DriverResult<()>;

    /// Takes up to `max` records from the last scan, strongest first.
    fn scan_results(&mut self, max: usize) -> DriverResult<Vec<AccessPoint>>;
}

/// The network interface layer.
pub trait NetworkStack {
    /// One-time initialization; calling it again is a no-op.
    fn init(&mut self) -> DriverResult<()>;

    fn create_default_station(&mut self) -> DriverResult<StationInterface>;

    fn ip_info(&self, iface: StationInterface) -> DriverResult<Ipv4Info>;

    /// Binds a static address. Fails while the DHCP client is running.
    fn set_ip_info(&mut self, iface: StationInterface, info: &Ipv4Info) -> DriverResult<()>;

    fn dhcp_start(&mut self, iface: StationInterface) -> DriverResult<()>;

    fn dhcp_stop(&mut self, iface: StationInterface) -> DriverResult<()>;
}

/// The platform's default event loop.
pub trait EventDispatcher {
    /// Creates the default loop; calling it again is a no-op.
    fn create_default_loop(&mut self) -> DriverResult<()>;

    /// Registers `sink` for every event matching `filter` emitted from now on.
    fn register(&self, filter: EventFilter, sink: Arc<dyn EventSink>) -> DriverResult<HandlerId>;

    fn unregister(&self, id: HandlerId) -> DriverResult<()>;
}
