//! Network-layer address handling for the station interface.

use log::{debug, info};

use crate::Result;
use crate::api::models::{AddressConfig, Ipv4Info};
use crate::core::state_wait::subscribe_address;
use crate::platform::{EventDispatcher, NetworkStack, StationInterface};

/// Prepares the interface's addressing before an association attempt.
///
/// Without a manual configuration the DHCP client is started. With one,
/// the DHCP client is stopped and the IPv4 triple (if any, and not
/// `0.0.0.0`) is bound. The IPv6 slot is accepted but not applied.
pub(crate) fn apply_address_config<N>(
    netif: &mut N,
    iface: StationInterface,
    address: Option<&AddressConfig>,
) -> Result<()>
where
    N: NetworkStack + ?Sized,
{
    let Some(address) = address else {
        debug!("Enabling DHCP on station interface");
        netif.dhcp_start(iface)?;
        return Ok(());
    };

    netif.dhcp_stop(iface)?;

    if let Some(ipv4) = address.ipv4.filter(|info| !info.is_unset()) {
        debug!(
            "Applying static IPv4 {} mask {} gateway {}",
            ipv4.ip, ipv4.netmask, ipv4.gateway
        );
        netif.set_ip_info(iface, &ipv4)?;
    }

    if let Some(ipv6) = &address.ipv6 {
        debug!("Ignoring manual IPv6 configuration {}/{}", ipv6.addr, ipv6.prefix_len);
    }

    Ok(())
}

/// Returns the interface's address, blocking until one is assigned.
///
/// Subscribes before reading the current address, so an assignment landing
/// between the two is still observed.
pub(crate) fn wait_for_address<N, E>(
    netif: &N,
    events: &E,
    iface: StationInterface,
) -> Result<Ipv4Info>
where
    N: NetworkStack + ?Sized,
    E: EventDispatcher + ?Sized,
{
    let assigned = subscribe_address(events)?;

    let current = netif.ip_info(iface)?;
    if !current.is_unset() {
        debug!("Address already bound: {}", current.ip);
        return Ok(current);
    }

    debug!("No address bound yet, waiting for assignment");
    let info = assigned.wait()?;
    info!("Got address {} (gateway {})", info.ip, info.gateway);
    Ok(info)
}
