//! Wi-Fi network scanning.
//!
//! A scan borrows the radio for the duration of the call: it brings the
//! radio up with an empty all-channel configuration, runs one blocking scan
//! and stops the radio again, so the client is back in a stopped,
//! disconnected state afterwards.

use log::{debug, warn};

use crate::Result;
use crate::api::models::{AccessPoint, StationConfig, WifiMode};
use crate::platform::RadioDriver;

/// Scans all channels and returns at most `max_results` access points,
/// strongest first.
///
/// Once the radio has been started it is stopped again on every path; a
/// scan failure takes precedence over a stop failure.
pub(crate) fn scan_networks<R>(radio: &mut R, max_results: usize) -> Result<Vec<AccessPoint>>
where
    R: RadioDriver + ?Sized,
{
    radio.restore()?;
    radio.set_mode(WifiMode::Station)?;
    radio.set_config(&StationConfig::scan_all_channels())?;
    radio.start()?;

    let scanned = run_scan(radio, max_results);
    let stopped = radio.stop();

    match (scanned, stopped) {
        (Ok(found), Ok(())) => {
            debug!("Scan returned {} access point(s)", found.len());
            Ok(found)
        }
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), stopped) => {
            if let Err(stop_err) = stopped {
                warn!("Failed to stop radio after failed scan: {stop_err}");
            }
            Err(e)
        }
    }
}

fn run_scan<R>(radio: &mut R, max_results: usize) -> Result<Vec<AccessPoint>>
where
    R: RadioDriver + ?Sized,
{
    radio.scan_start(true)?;
    Ok(radio.scan_results(max_results)?)
}
