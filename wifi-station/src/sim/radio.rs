use log::{debug, info};
use std::sync::Arc;

use super::{DhcpState, SimState, World, targets};
use crate::api::models::{
    AccessPoint, DisconnectReason, DriverError, DriverErrorKind, StationConfig, WifiMode,
};
use crate::platform::events::{Event, IpEvent, WifiEvent};
use crate::platform::{DriverResult, RadioDriver};
use crate::types::constants::timings;

/// Simulated Wi-Fi driver.
pub struct SimRadio {
    world: Arc<World>,
}

impl SimRadio {
    pub(super) fn new(world: Arc<World>) -> Self {
        Self { world }
    }
}

fn require_init(state: &SimState, op: &'static str) -> DriverResult<()> {
    if state.radio.initialized {
        Ok(())
    } else {
        Err(DriverError::new(op, DriverErrorKind::NotInitialized))
    }
}

fn require_station(state: &SimState, op: &'static str) -> DriverResult<()> {
    require_init(state, op)?;
    if state.radio.mode == WifiMode::Station {
        Ok(())
    } else {
        Err(DriverError::new(op, DriverErrorKind::WrongMode))
    }
}

fn require_started(state: &SimState, op: &'static str) -> DriverResult<()> {
    require_station(state, op)?;
    if state.radio.started {
        Ok(())
    } else {
        Err(DriverError::new(op, DriverErrorKind::NotStarted))
    }
}

/// Tears down any association and invalidates pending link work.
/// Returns `true` if a link was up.
fn drop_link(state: &mut SimState) -> bool {
    state.radio.session += 1;
    let was_up = state.radio.link.take().is_some();
    if was_up {
        state.drop_lease();
    }
    was_up
}

impl RadioDriver for SimRadio {
    fn init(&mut self) -> DriverResult<()> {
        let mut state = self.world.lock();
        state.enter("wifi_init")?;
        if !state.radio.initialized {
            state.radio.initialized = true;
            debug!(target: targets::PHY, "phy calibration done");
            info!(target: targets::WIFI, "wifi driver initialized");
        }
        Ok(())
    }

    fn restore(&mut self) -> DriverResult<()> {
        let mut state = self.world.lock();
        state.enter("wifi_restore")?;
        require_init(&state, "wifi_restore")?;

        drop_link(&mut state);
        state.radio.mode = WifiMode::Null;
        state.radio.config = StationConfig::default();
        state.radio.saved = StationConfig::default();
        debug!(target: targets::WIFI, "configuration restored to defaults");
        Ok(())
    }

    fn set_mode(&mut self, mode: WifiMode) -> DriverResult<()> {
        let mut state = self.world.lock();
        state.enter("wifi_set_mode")?;
        require_init(&state, "wifi_set_mode")?;

        state.radio.mode = mode;
        debug!(target: targets::WIFI, "mode set to {mode:?}");
        Ok(())
    }

    fn set_config(&mut self, config: &StationConfig) -> DriverResult<()> {
        let mut state = self.world.lock();
        state.enter("wifi_set_config")?;
        require_station(&state, "wifi_set_config")?;

        state.radio.config = *config;
        state.radio.saved = *config;
        debug!(target: targets::WIFI, "station config set, ssid='{}'", config.ssid);
        Ok(())
    }

    fn get_config(&self) -> DriverResult<StationConfig> {
        let mut state = self.world.lock();
        state.enter("wifi_get_config")?;
        require_init(&state, "wifi_get_config")?;
        Ok(state.radio.saved)
    }

    fn start(&mut self) -> DriverResult<()> {
        let mut state = self.world.lock();
        state.enter("wifi_start")?;
        require_station(&state, "wifi_start")?;

        if !state.radio.started {
            state.radio.started = true;
            drop(state);
            info!(target: targets::WIFI, "station started");
            self.world.post(Event::Wifi(WifiEvent::StaStart));
        }
        Ok(())
    }

    fn stop(&mut self) -> DriverResult<()> {
        let mut state = self.world.lock();
        state.enter("wifi_stop")?;
        require_init(&state, "wifi_stop")?;

        let was_up = drop_link(&mut state);
        let was_started = std::mem::replace(&mut state.radio.started, false);
        let session = state.radio.session;
        drop(state);

        if was_up {
            self.world.post_in_session(
                session,
                Event::Wifi(WifiEvent::StaDisconnected {
                    reason: DisconnectReason::AssocLeave,
                }),
            );
        }
        if was_started {
            info!(target: targets::WIFI, "station stopped");
            self.world.post(Event::Wifi(WifiEvent::StaStop));
        }
        Ok(())
    }

    fn connect(&mut self) -> DriverResult<()> {
        let mut state = self.world.lock();
        state.enter("wifi_connect")?;
        require_started(&state, "wifi_connect")?;

        let config = state.radio.config;
        if config.ssid.is_empty() && !config.bssid_set {
            return Err(DriverError::new("wifi_connect", DriverErrorKind::InvalidArgument));
        }

        // Strongest matching radio wins, like a real association scan.
        let target = state
            .networks
            .iter()
            .filter(|ap| ap.matches(&config))
            .max_by_key(|ap| ap.rssi)
            .cloned();
        let session = state.radio.session;
        drop(state);

        debug!(target: targets::WIFI, "connecting to '{}'", config.ssid);
        self.world.schedule(timings::link_latency(), move |world| {
            let mut state = world.lock();
            if state.radio.session != session || !state.radio.started {
                debug!(target: targets::WIFI, "dropping stale association attempt");
                return None;
            }

            let Some(ap) = target else {
                return Some(Event::Wifi(WifiEvent::StaDisconnected {
                    reason: DisconnectReason::NoApFound,
                }));
            };
            if ap.silent {
                debug!(target: targets::WIFI, "no answer from {}", ap.bssid);
                return None;
            }
            if let Err(reason) = ap.answer(&config) {
                return Some(Event::Wifi(WifiEvent::StaDisconnected { reason }));
            }

            state.radio.link = Some(ap.bssid);
            let lease = match state.netif.dhcp {
                DhcpState::Running if ap.dhcp => Some((ap.lease, true)),
                DhcpState::Stopped if !state.netif.ip.is_unset() => Some((state.netif.ip, false)),
                _ => None,
            };
            drop(state);

            if let Some((info, leased)) = lease {
                world.schedule(timings::lease_latency(), move |world| {
                    let mut state = world.lock();
                    if state.radio.session != session || state.radio.link.is_none() {
                        return None;
                    }
                    if leased {
                        state.netif.ip = info;
                    }
                    debug!(target: targets::NETIF, "sta ip: {}, mask: {}, gw: {}", info.ip, info.netmask, info.gateway);
                    Some(Event::Ip(IpEvent::StaGotIp(info)))
                });
            }

            Some(Event::Wifi(WifiEvent::StaConnected {
                ssid: ap.ssid,
                bssid: ap.bssid,
                channel: ap.channel,
            }))
        });
        Ok(())
    }

    fn disconnect(&mut self) -> DriverResult<()> {
        let mut state = self.world.lock();
        state.enter("wifi_disconnect")?;
        require_started(&state, "wifi_disconnect")?;

        let was_up = drop_link(&mut state);
        let session = state.radio.session;
        drop(state);

        if was_up {
            self.world.post_in_session(
                session,
                Event::Wifi(WifiEvent::StaDisconnected {
                    reason: DisconnectReason::AssocLeave,
                }),
            );
            self.world.post_in_session(session, Event::Ip(IpEvent::StaLostIp));
        }
        Ok(())
    }

    fn scan_start(&mut self, block: bool) -> DriverResult<()> {
        let mut state = self.world.lock();
        state.enter("wifi_scan_start")?;
        require_started(&state, "wifi_scan_start")?;
        if state.radio.link.is_some() {
            return Err(DriverError::new("wifi_scan_start", DriverErrorKind::Busy));
        }

        let mut found: Vec<AccessPoint> = state.networks.iter().map(|ap| ap.record()).collect();
        found.sort_by(|a, b| b.rssi.cmp(&a.rssi));
        let count = found.len();
        state.radio.last_scan = found;
        drop(state);

        debug!(target: targets::WIFI, "scan done, blocking={block}, {count} found");
        self.world.post(Event::Wifi(WifiEvent::ScanDone { count }));
        Ok(())
    }

    fn scan_results(&mut self, max: usize) -> DriverResult<Vec<AccessPoint>> {
        let mut state = self.world.lock();
        state.enter("wifi_scan_get_ap_records")?;
        require_init(&state, "wifi_scan_get_ap_records")?;

        let mut records = std::mem::take(&mut state.radio.last_scan);
        records.truncate(max);
        Ok(records)
    }
}
