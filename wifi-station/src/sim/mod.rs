//! In-memory platform for tests, demos and host-side development.
//!
//! [`SimulatedPlatform`] implements [`RadioDriver`](crate::RadioDriver),
//! [`NetworkStack`](crate::NetworkStack) and
//! [`EventDispatcher`](crate::EventDispatcher) over one shared world state.
//! It behaves like the real stack where the client depends on it:
//!
//! - init calls are idempotent, other calls fail before init
//! - `set_config` persists the configuration, `restore` erases it
//! - association outcomes and address leases arrive as events, on a
//!   dedicated dispatcher thread, after a short delay
//! - static addressing fails while the DHCP client runs
//!
//! A [`SimHandle`] lets the owner inspect and steer the world while the
//! client owns the drivers: read radio state, inject events, hand out
//! addresses, make the next call of a given operation fail.
//!
//! ```rust
//! use wifi_station::sim::{SimAccessPoint, SimulatedPlatform};
//! use wifi_station::{Bssid, ClientConfig, NetworkCredentials};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let platform = SimulatedPlatform::new()?
//!     .with_access_point(SimAccessPoint::new("Net", Bssid([2, 0, 0, 0, 0, 1])).password("pw"));
//! let mut client = platform.into_client(ClientConfig::default());
//!
//! client.setup()?;
//! client.connect(&NetworkCredentials::new("Net").with_password("pw"), None)?;
//! let ip = client.wait_for_address()?;
//! println!("leased {}", ip.ip);
//! # Ok(())
//! # }
//! ```

mod events;
mod netif;
mod radio;

pub use events::SimEvents;
pub use netif::SimNetif;
pub use radio::SimRadio;

use futures_timer::Delay;
use log::debug;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::api::client::WifiClient;
use crate::api::models::{
    AccessPoint, AuthMode, Bssid, ClientConfig, DisconnectReason, DriverError, DriverErrorKind,
    Ipv4Info, PhyModes, StationConfig, WifiMode,
};
use crate::platform::events::{Event, EventFilter, EventSink, HandlerId, IpEvent};
use crate::platform::{DriverResult, StationInterface};
use crate::types::bounded::{Passphrase, Ssid};

/// Log targets used by the simulated drivers, named after the platform
/// components whose output they stand in for.
pub mod targets {
    pub const WIFI: &str = "wifi";
    pub const NETIF: &str = "esp_netif_handlers";
    pub const PHY: &str = "phy_init";
}

/// Every log target the simulated drivers write to.
pub const DRIVER_LOG_TARGETS: &[&str] = &[targets::WIFI, targets::NETIF, targets::PHY];

/// A client wired to the simulated platform.
pub type SimClient = WifiClient<SimRadio, SimNetif, SimEvents>;

/// An access point visible to the simulated radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimAccessPoint {
    pub ssid: Ssid,
    pub bssid: Bssid,
    /// `None` for an open network.
    pub password: Option<Passphrase>,
    pub channel: u8,
    pub rssi: i8,
    /// Whether the network hands out DHCP leases.
    pub dhcp: bool,
    /// Address leased to the station.
    pub lease: Ipv4Info,
    /// Forces every association attempt to fail with this reason.
    pub reject: Option<DisconnectReason>,
    /// Never answers association attempts; the outcome is left to events
    /// injected through [`SimHandle::emit`].
    pub silent: bool,
}

impl SimAccessPoint {
    /// An open network on channel 1 that leases `192.168.4.2/24`.
    pub fn new(ssid: &str, bssid: Bssid) -> Self {
        Self {
            ssid: Ssid::from(ssid),
            bssid,
            password: None,
            channel: 1,
            rssi: -50,
            dhcp: true,
            lease: Ipv4Info::new(
                Ipv4Addr::new(192, 168, 4, 2),
                Ipv4Addr::new(255, 255, 255, 0),
                Ipv4Addr::new(192, 168, 4, 1),
            ),
            reject: None,
            silent: false,
        }
    }

    #[must_use]
    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(Passphrase::from(password));
        self
    }

    #[must_use]
    pub fn channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    #[must_use]
    pub fn rssi(mut self, rssi: i8) -> Self {
        self.rssi = rssi;
        self
    }

    /// Associations succeed but no lease is ever offered.
    #[must_use]
    pub fn without_dhcp(mut self) -> Self {
        self.dhcp = false;
        self
    }

    #[must_use]
    pub fn lease(mut self, lease: Ipv4Info) -> Self {
        self.lease = lease;
        self
    }

    #[must_use]
    pub fn rejecting(mut self, reason: DisconnectReason) -> Self {
        self.reject = Some(reason);
        self
    }

    #[must_use]
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    fn auth_mode(&self) -> AuthMode {
        if self.password.is_some() {
            AuthMode::Wpa2Psk
        } else {
            AuthMode::Open
        }
    }

    fn record(&self) -> AccessPoint {
        AccessPoint {
            ssid: self.ssid,
            bssid: self.bssid,
            channel: self.channel,
            rssi: self.rssi,
            auth_mode: self.auth_mode(),
            phy: PhyModes::B | PhyModes::G | PhyModes::N,
        }
    }

    /// Whether `config` selects this access point.
    fn matches(&self, config: &StationConfig) -> bool {
        let ssid_ok = config.ssid.is_empty() || config.ssid == self.ssid;
        let bssid_ok = !config.bssid_set || config.bssid == self.bssid;
        ssid_ok && bssid_ok && (config.bssid_set || !config.ssid.is_empty())
    }

    /// How an association attempt with `config` ends.
    fn answer(&self, config: &StationConfig) -> Result<(), DisconnectReason> {
        if let Some(reason) = self.reject {
            return Err(reason);
        }
        match &self.password {
            Some(expected) if *expected != config.password => Err(DisconnectReason::AuthFail),
            _ => Ok(()),
        }
    }
}

/// DHCP client state of the station interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhcpState {
    Running,
    Stopped,
}

#[derive(Debug)]
struct RadioState {
    initialized: bool,
    mode: WifiMode,
    config: StationConfig,
    saved: StationConfig,
    started: bool,
    /// Access point the station is associated with.
    link: Option<Bssid>,
    last_scan: Vec<AccessPoint>,
    /// Bumped whenever pending association work becomes stale.
    session: u64,
}

#[derive(Debug)]
struct NetifState {
    initialized: bool,
    station: Option<StationInterface>,
    interfaces_created: u32,
    dhcp: DhcpState,
    ip: Ipv4Info,
}

#[derive(Debug)]
struct SimState {
    networks: Vec<SimAccessPoint>,
    radio: RadioState,
    netif: NetifState,
    loop_created: bool,
    faults: HashMap<&'static str, DriverErrorKind>,
    calls: Vec<&'static str>,
}

impl SimState {
    fn new() -> Self {
        Self {
            networks: Vec::new(),
            radio: RadioState {
                initialized: false,
                mode: WifiMode::Null,
                config: StationConfig::default(),
                saved: StationConfig::default(),
                started: false,
                link: None,
                last_scan: Vec::new(),
                session: 0,
            },
            netif: NetifState {
                initialized: false,
                station: None,
                interfaces_created: 0,
                dhcp: DhcpState::Running,
                ip: Ipv4Info::default(),
            },
            loop_created: false,
            faults: HashMap::new(),
            calls: Vec::new(),
        }
    }

    /// Records a radio or interface call and applies any injected fault.
    fn enter(&mut self, op: &'static str) -> DriverResult<()> {
        self.calls.push(op);
        self.injected(op)
    }

    fn injected(&mut self, op: &'static str) -> DriverResult<()> {
        match self.faults.remove(op) {
            Some(kind) => Err(DriverError::new(op, kind)),
            None => Ok(()),
        }
    }

    /// The lease is only kept while the DHCP client manages the address.
    fn drop_lease(&mut self) {
        if self.netif.dhcp == DhcpState::Running {
            self.netif.ip = Ipv4Info::default();
        }
    }
}

/// State shared by the three simulated drivers and every [`SimHandle`].
struct World {
    state: Mutex<SimState>,
    handlers: Mutex<HashMap<HandlerId, (EventFilter, Arc<dyn EventSink>)>>,
    dispatcher: tokio::runtime::Handle,
}

impl World {
    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handlers(&self) -> MutexGuard<'_, HashMap<HandlerId, (EventFilter, Arc<dyn EventSink>)>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `action` on the dispatcher thread after `delay` and publishes
    /// the event it returns, if any.
    fn schedule<F>(self: &Arc<Self>, delay: Duration, action: F)
    where
        F: FnOnce(&Arc<World>) -> Option<Event> + Send + 'static,
    {
        let world = Arc::clone(self);
        self.dispatcher.spawn(async move {
            if !delay.is_zero() {
                Delay::new(delay).await;
            }
            if let Some(event) = action(&world) {
                world.deliver(&event);
            }
        });
    }

    /// Publishes `event` from the dispatcher thread without delay.
    fn post(self: &Arc<Self>, event: Event) {
        self.schedule(Duration::ZERO, move |_| Some(event));
    }

    /// Like [`World::post`], but the event is dropped if the radio has
    /// moved on to another session by the time it would be delivered.
    fn post_in_session(self: &Arc<Self>, session: u64, event: Event) {
        self.schedule(Duration::ZERO, move |world| {
            (world.lock().radio.session == session).then_some(event)
        });
    }

    fn deliver(&self, event: &Event) {
        let sinks: Vec<Arc<dyn EventSink>> = self
            .handlers()
            .values()
            .filter(|(filter, _)| filter.matches(event))
            .map(|(_, sink)| Arc::clone(sink))
            .collect();

        debug!(target: targets::WIFI, "event: {event} -> {} handler(s)", sinks.len());
        for sink in sinks {
            sink.deliver(event);
        }
    }
}

/// The simulated drivers plus a handle onto their shared world.
pub struct SimulatedPlatform {
    radio: SimRadio,
    netif: SimNetif,
    events: SimEvents,
    handle: SimHandle,
}

impl SimulatedPlatform {
    /// Creates an empty world with no access points and nothing saved.
    ///
    /// Starts the dispatcher thread; fails only if it cannot be spawned.
    pub fn new() -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("sim-event-loop")
            .build()?;

        let world = Arc::new(World {
            state: Mutex::new(SimState::new()),
            handlers: Mutex::new(HashMap::new()),
            dispatcher: runtime.handle().clone(),
        });

        Ok(Self {
            radio: SimRadio::new(Arc::clone(&world)),
            netif: SimNetif::new(Arc::clone(&world)),
            events: SimEvents::new(Arc::clone(&world), runtime),
            handle: SimHandle { world },
        })
    }

    #[must_use]
    pub fn with_access_point(self, ap: SimAccessPoint) -> Self {
        self.handle.add_access_point(ap);
        self
    }

    /// Seeds the driver's persisted configuration, as left by an earlier boot.
    #[must_use]
    pub fn with_saved_config(self, config: StationConfig) -> Self {
        self.handle.world.lock().radio.saved = config;
        self
    }

    pub fn handle(&self) -> SimHandle {
        self.handle.clone()
    }

    pub fn into_parts(self) -> (SimRadio, SimNetif, SimEvents) {
        (self.radio, self.netif, self.events)
    }

    pub fn into_client(self, config: ClientConfig) -> SimClient {
        let (radio, netif, events) = self.into_parts();
        WifiClient::new(config, radio, netif, events)
    }
}

/// Observes and steers a simulated world.
#[derive(Clone)]
pub struct SimHandle {
    world: Arc<World>,
}

impl SimHandle {
    pub fn add_access_point(&self, ap: SimAccessPoint) {
        self.world.lock().networks.push(ap);
    }

    /// Makes the next call of `op` (for example `"wifi_start"`) fail.
    pub fn fail_next(&self, op: &'static str, kind: DriverErrorKind) {
        self.world.lock().faults.insert(op, kind);
    }

    /// Platform calls made so far, oldest first. Event registration is
    /// not recorded.
    pub fn calls(&self) -> Vec<&'static str> {
        self.world.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.world.lock().calls.clear();
    }

    /// Publishes an arbitrary event from the dispatcher thread.
    pub fn emit(&self, event: Event) {
        self.world.post(event);
    }

    /// Binds `info` to the station interface and announces it, as a
    /// late DHCP server would.
    pub fn grant_address(&self, info: Ipv4Info) {
        self.world.schedule(Duration::ZERO, move |world| {
            world.lock().netif.ip = info;
            Some(Event::Ip(IpEvent::StaGotIp(info)))
        });
    }

    pub fn handler_count(&self) -> usize {
        self.world.handlers().len()
    }

    pub fn radio_started(&self) -> bool {
        self.world.lock().radio.started
    }

    pub fn radio_mode(&self) -> WifiMode {
        self.world.lock().radio.mode
    }

    pub fn link_up(&self) -> bool {
        self.world.lock().radio.link.is_some()
    }

    /// Configuration currently applied to the radio.
    pub fn active_config(&self) -> StationConfig {
        self.world.lock().radio.config
    }

    /// Configuration the driver would hand back after a reboot.
    pub fn saved_config(&self) -> StationConfig {
        self.world.lock().radio.saved
    }

    pub fn dhcp_state(&self) -> DhcpState {
        self.world.lock().netif.dhcp
    }

    pub fn ip_info(&self) -> Ipv4Info {
        self.world.lock().netif.ip
    }

    pub fn interfaces_created(&self) -> u32 {
        self.world.lock().netif.interfaces_created
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ap() -> SimAccessPoint {
        SimAccessPoint::new("Net", Bssid([2, 0, 0, 0, 0, 1])).password("pw")
    }

    fn config(ssid: &str, password: &str) -> StationConfig {
        StationConfig {
            ssid: Ssid::from(ssid),
            password: Passphrase::from(password),
            ..StationConfig::default()
        }
    }

    #[test]
    fn access_point_matching() {
        let ap = ap();
        assert!(ap.matches(&config("Net", "")));
        assert!(!ap.matches(&config("Other", "")));
        assert!(!ap.matches(&StationConfig::default()));

        let pinned = StationConfig {
            bssid: Bssid([2, 0, 0, 0, 0, 1]),
            bssid_set: true,
            ..StationConfig::default()
        };
        assert!(ap.matches(&pinned));

        let wrong_radio = StationConfig {
            bssid: Bssid([9; 6]),
            ..pinned
        };
        assert!(!ap.matches(&wrong_radio));
    }

    #[test]
    fn access_point_answers() {
        assert_eq!(ap().answer(&config("Net", "pw")), Ok(()));
        assert_eq!(
            ap().answer(&config("Net", "nope")),
            Err(DisconnectReason::AuthFail)
        );
        assert_eq!(
            SimAccessPoint::new("Open", Bssid([1; 6])).answer(&config("Open", "anything")),
            Ok(())
        );
        assert_eq!(
            ap().rejecting(DisconnectReason::AssocFail)
                .answer(&config("Net", "pw")),
            Err(DisconnectReason::AssocFail)
        );
    }

    #[test]
    fn records_reflect_security() {
        assert_eq!(ap().record().auth_mode, AuthMode::Wpa2Psk);
        assert_eq!(
            SimAccessPoint::new("Open", Bssid([1; 6])).record().auth_mode,
            AuthMode::Open
        );
    }

    #[test]
    fn injected_fault_fires_once() {
        let mut state = SimState::new();
        state.faults.insert("wifi_start", DriverErrorKind::Busy);
        assert_eq!(
            state.enter("wifi_start"),
            Err(DriverError::new("wifi_start", DriverErrorKind::Busy))
        );
        assert_eq!(state.enter("wifi_start"), Ok(()));
        assert_eq!(state.calls, vec!["wifi_start", "wifi_start"]);
    }
}
