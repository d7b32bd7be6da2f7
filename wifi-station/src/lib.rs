//! A Rust library for managing the Wi-Fi station of an embedded device.
//!
//! This crate provides a blocking, state-checked API over a device's Wi-Fi
//! driver, network interface layer and event loop:
//!
//! - Bringing the network stack up once per boot
//! - Scanning for access points
//! - Joining open and WPA networks, by name or by radio address
//! - Rejoining the network saved by an earlier session
//! - Waiting for an address, by DHCP or static configuration
//!
//! The platform is reached through three traits, [`RadioDriver`],
//! [`NetworkStack`] and [`EventDispatcher`]. The [`sim`] module implements
//! them in memory.
//!
//! # Example
//!
//! ```rust
//! use wifi_station::sim::{SimAccessPoint, SimulatedPlatform};
//! use wifi_station::{Bssid, ClientConfig, NetworkCredentials};
//!
//! # fn main() -> wifi_station::Result<()> {
//! # let platform = SimulatedPlatform::new()
//! #     .expect("dispatcher thread")
//! #     .with_access_point(SimAccessPoint::new("MyNetwork", Bssid([2, 0, 0, 0, 0, 1])).password("password123"));
//! let mut client = platform.into_client(ClientConfig::default());
//! client.setup()?;
//!
//! // List visible networks
//! for ap in client.scan(10)? {
//!     println!("{} ({} dBm)", ap.ssid, ap.rssi);
//! }
//!
//! // Connect to a network
//! let creds = NetworkCredentials::new("MyNetwork").with_password("password123");
//! client.connect(&creds, None)?;
//! println!("address: {}", client.wait_for_address()?.ip);
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All operations return `Result<T, WifiError>`. Calling an operation in the
//! wrong lifecycle state fails with [`WifiError::InvalidState`] before any
//! platform call is made. An access point refusing the client is reported as
//! [`WifiError::ConnectionRejected`] with the driver's reason code; platform
//! failures surface as [`WifiError::Driver`].
//!
//! # Event-Based Waiting
//!
//! Association outcomes and address assignments are not polled. Before
//! triggering the action the client registers a one-shot handler on the
//! platform's event loop, then blocks until that handler fires. The handler
//! is unregistered on every exit path.
//!
//! # Logging
//!
//! This crate uses the [`log`](https://docs.rs/log) facade for logging. To see
//! log output, install a logger such as `tracing-subscriber` or `env_logger`.
//! The simulated drivers log under the targets listed in
//! [`DRIVER_LOG_TARGETS`].

// Internal implementation modules
mod core;

// Public API modules
pub mod api;
pub mod platform;
pub mod sim;
pub mod types;

// Re-exported public API
pub use api::client::WifiClient;
pub use api::models::{
    AccessPoint, AddressConfig, AuthMode, Bssid, ClientConfig, ClientStatus, DisconnectReason,
    DriverError, DriverErrorKind, InitFailurePolicy, Ipv4Info, Ipv6Config, NetworkCredentials,
    PhyModes, RestoreOutcome, ScanMethod, StationConfig, WifiError, WifiMode,
};
pub use platform::events::{
    Event, EventBase, EventFilter, EventKind, EventSink, HandlerId, IpEvent, WifiEvent,
};
pub use platform::{DriverResult, EventDispatcher, NetworkStack, RadioDriver, StationInterface};
pub use sim::DRIVER_LOG_TARGETS;
pub use types::bounded::BoundedString;

/// A specialized `Result` type for client operations.
pub type Result<T> = std::result::Result<T, WifiError>;
