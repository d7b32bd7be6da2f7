//! Asynchronous notifications emitted by the platform.
//!
//! Events are grouped by base, the same way the platform's event loop
//! groups them: radio (`Wifi`) events report link state, `Ip` events report
//! address assignment. A handler subscribes with an [`EventFilter`] naming a
//! base and optionally one [`EventKind`] inside it.

use std::fmt::{Display, Formatter};
use uuid::Uuid;

use crate::api::models::{Bssid, DisconnectReason, Ipv4Info};
use crate::types::bounded::Ssid;

/// Radio events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiEvent {
    StaStart,
    StaStop,
    /// The station associated with an access point.
    StaConnected { ssid: Ssid, bssid: Bssid, channel: u8 },
    /// The station lost, or never got, its association.
    StaDisconnected { reason: DisconnectReason },
    ScanDone { count: usize },
}

/// Network-layer events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpEvent {
    /// The station interface got an address, by DHCP or statically.
    StaGotIp(Ipv4Info),
    StaLostIp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Wifi(WifiEvent),
    Ip(IpEvent),
}

/// Event family a handler can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventBase {
    Wifi,
    Ip,
}

/// Identifier of a single event inside its base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    StaStart,
    StaStop,
    StaConnected,
    StaDisconnected,
    ScanDone,
    StaGotIp,
    StaLostIp,
}

impl EventKind {
    pub fn base(&self) -> EventBase {
        match self {
            Self::StaGotIp | Self::StaLostIp => EventBase::Ip,
            _ => EventBase::Wifi,
        }
    }
}

impl Event {
    pub fn base(&self) -> EventBase {
        match self {
            Self::Wifi(_) => EventBase::Wifi,
            Self::Ip(_) => EventBase::Ip,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::Wifi(WifiEvent::StaStart) => EventKind::StaStart,
            Self::Wifi(WifiEvent::StaStop) => EventKind::StaStop,
            Self::Wifi(WifiEvent::StaConnected { .. }) => EventKind::StaConnected,
            Self::Wifi(WifiEvent::StaDisconnected { .. }) => EventKind::StaDisconnected,
            Self::Wifi(WifiEvent::ScanDone { .. }) => EventKind::ScanDone,
            Self::Ip(IpEvent::StaGotIp(_)) => EventKind::StaGotIp,
            Self::Ip(IpEvent::StaLostIp) => EventKind::StaLostIp,
        }
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wifi(WifiEvent::StaStart) => write!(f, "station started"),
            Self::Wifi(WifiEvent::StaStop) => write!(f, "station stopped"),
            Self::Wifi(WifiEvent::StaConnected { ssid, bssid, channel }) => {
                write!(f, "connected to '{ssid}' ({bssid}, channel {channel})")
            }
            Self::Wifi(WifiEvent::StaDisconnected { reason }) => {
                write!(f, "disconnected ({reason})")
            }
            Self::Wifi(WifiEvent::ScanDone { count }) => write!(f, "scan done ({count} found)"),
            Self::Ip(IpEvent::StaGotIp(info)) => write!(f, "got ip {}", info.ip),
            Self::Ip(IpEvent::StaLostIp) => write!(f, "lost ip"),
        }
    }
}

/// Selects which events a handler receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventFilter {
    pub base: EventBase,
    /// `None` matches every event of `base`.
    pub kind: Option<EventKind>,
}

impl EventFilter {
    /// Every event of a base.
    pub fn any(base: EventBase) -> Self {
        Self { base, kind: None }
    }

    /// A single event kind.
    pub fn only(kind: EventKind) -> Self {
        Self {
            base: kind.base(),
            kind: Some(kind),
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        event.base() == self.base && self.kind.is_none_or(|k| k == event.kind())
    }
}

/// Registration token returned by
/// [`EventDispatcher::register`](crate::EventDispatcher::register).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(Uuid);

impl HandlerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HandlerId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for HandlerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Receiver side of a subscription.
///
/// Sinks run on the dispatcher's context, never on the thread that
/// registered them, and must not block.
pub trait EventSink: Send + Sync {
    fn deliver(&self, event: &Event);
}
