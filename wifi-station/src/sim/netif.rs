use log::debug;
use std::sync::Arc;

use super::{DhcpState, SimState, World, targets};
use crate::api::models::{DriverError, DriverErrorKind, Ipv4Info};
use crate::platform::{DriverResult, NetworkStack, StationInterface};

/// Simulated network interface layer.
pub struct SimNetif {
    world: Arc<World>,
}

impl SimNetif {
    pub(super) fn new(world: Arc<World>) -> Self {
        Self { world }
    }
}

fn require_station(
    state: &SimState,
    iface: StationInterface,
    op: &'static str,
) -> DriverResult<()> {
    if !state.netif.initialized {
        return Err(DriverError::new(op, DriverErrorKind::NotInitialized));
    }
    if state.netif.station != Some(iface) {
        return Err(DriverError::new(op, DriverErrorKind::NotFound));
    }
    Ok(())
}

impl NetworkStack for SimNetif {
    fn init(&mut self) -> DriverResult<()> {
        let mut state = self.world.lock();
        state.enter("netif_init")?;
        state.netif.initialized = true;
        Ok(())
    }

    fn create_default_station(&mut self) -> DriverResult<StationInterface> {
        let mut state = self.world.lock();
        state.enter("netif_create_default_wifi_sta")?;
        if !state.netif.initialized {
            return Err(DriverError::new(
                "netif_create_default_wifi_sta",
                DriverErrorKind::NotInitialized,
            ));
        }

        state.netif.interfaces_created += 1;
        let iface = StationInterface::from_raw(state.netif.interfaces_created);
        state.netif.station = Some(iface);
        debug!(target: targets::NETIF, "created station interface {}", iface.raw());
        Ok(iface)
    }

    fn ip_info(&self, iface: StationInterface) -> DriverResult<Ipv4Info> {
        let mut state = self.world.lock();
        state.enter("netif_get_ip_info")?;
        require_station(&state, iface, "netif_get_ip_info")?;
        Ok(state.netif.ip)
    }

    fn set_ip_info(&mut self, iface: StationInterface, info: &Ipv4Info) -> DriverResult<()> {
        let mut state = self.world.lock();
        state.enter("netif_set_ip_info")?;
        require_station(&state, iface, "netif_set_ip_info")?;
        if state.netif.dhcp == DhcpState::Running {
            return Err(DriverError::new(
                "netif_set_ip_info",
                DriverErrorKind::DhcpNotStopped,
            ));
        }

        state.netif.ip = *info;
        debug!(target: targets::NETIF, "static ip: {}, mask: {}, gw: {}", info.ip, info.netmask, info.gateway);
        Ok(())
    }

    fn dhcp_start(&mut self, iface: StationInterface) -> DriverResult<()> {
        let mut state = self.world.lock();
        state.enter("netif_dhcpc_start")?;
        require_station(&state, iface, "netif_dhcpc_start")?;

        if state.netif.dhcp != DhcpState::Running {
            state.netif.dhcp = DhcpState::Running;
            state.netif.ip = Ipv4Info::default();
            debug!(target: targets::NETIF, "dhcp client started");
        }
        Ok(())
    }

    fn dhcp_stop(&mut self, iface: StationInterface) -> DriverResult<()> {
        let mut state = self.world.lock();
        state.enter("netif_dhcpc_stop")?;
        require_station(&state, iface, "netif_dhcpc_stop")?;

        if state.netif.dhcp != DhcpState::Stopped {
            state.netif.dhcp = DhcpState::Stopped;
            debug!(target: targets::NETIF, "dhcp client stopped");
        }
        Ok(())
    }
}
