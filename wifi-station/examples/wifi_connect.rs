use std::env;

use wifi_station::sim::{SimAccessPoint, SimulatedPlatform};
use wifi_station::{Bssid, ClientConfig, NetworkCredentials, WifiError};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let password = env::args().nth(1).unwrap_or_else(|| "secret".to_string());

    let platform = SimulatedPlatform::new()?
        .with_access_point(SimAccessPoint::new("HomeNet", Bssid([2, 0, 0, 0, 0, 1])).password("secret"));
    let mut client = platform.into_client(ClientConfig::default());
    client.setup()?;

    let creds = NetworkCredentials::new("HomeNet").with_password(&password);
    match client.connect(&creds, None) {
        Ok(()) => {
            let ip = client.wait_for_address()?;
            println!("Connected, address {} gateway {}", ip.ip, ip.gateway);
            client.disconnect()?;
        }
        Err(WifiError::ConnectionRejected(reason)) => {
            println!("Access point refused the connection: {reason}");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
