use log::{debug, info, warn};

use crate::Result;
use crate::api::models::{StationConfig, WifiError, WifiMode};
use crate::core::state_wait::{LinkOutcome, subscribe_link};
use crate::platform::{EventDispatcher, RadioDriver};

/// Joins the network described by `config`.
///
/// This is the shared path behind `connect` and `restore_connection`. The flow:
/// 1. Restore radio defaults, dropping anything left from an earlier session
/// 2. Switch to station mode
/// 3. Apply the station configuration
/// 4. Start the radio
/// 5. Subscribe to link events
/// 6. Request association
/// 7. Block until the link comes up or goes down
///
/// A driver failure in steps 1-6 is returned as is, without unwinding. A
/// link-down outcome tears the radio back down (disconnect, stop, restore)
/// and is returned as [`WifiError::ConnectionRejected`].
pub(crate) fn connect_using_config<R, E>(
    radio: &mut R,
    events: &E,
    config: &StationConfig,
) -> Result<()>
where
    R: RadioDriver + ?Sized,
    E: EventDispatcher + ?Sized,
{
    debug!(
        "Connecting to '{}' | bssid_set={} secured={}",
        config.ssid,
        config.bssid_set,
        !config.password.is_empty()
    );

    radio.restore()?;
    radio.set_mode(WifiMode::Station)?;
    radio.set_config(config)?;
    radio.start()?;

    // Subscribe FIRST so an outcome reported right after the request is
    // not lost.
    let link = subscribe_link(events)?;
    radio.connect()?;

    match link.wait() {
        Ok(LinkOutcome::Connected) => {
            info!("Successfully connected to '{}'", config.ssid);
            Ok(())
        }
        Ok(LinkOutcome::Disconnected(reason)) => {
            warn!("Connection to '{}' rejected: {reason}", config.ssid);
            unwind(radio);
            Err(WifiError::ConnectionRejected(reason))
        }
        Err(e) => {
            unwind(radio);
            Err(e)
        }
    }
}

/// Disconnects, stops, and restores radio defaults, in that order.
///
/// Stops at the first failing step.
pub(crate) fn teardown<R>(radio: &mut R) -> Result<()>
where
    R: RadioDriver + ?Sized,
{
    radio.disconnect()?;
    radio.stop()?;
    radio.restore()?;
    debug!("Radio torn down");
    Ok(())
}

/// Best-effort teardown after a failed association.
fn unwind<R>(radio: &mut R)
where
    R: RadioDriver + ?Sized,
{
    if let Err(e) = teardown(radio) {
        warn!("Failed to unwind radio after failed connection: {e}");
    }
}
