use wifi_station::sim::{SimAccessPoint, SimulatedPlatform};
use wifi_station::{Bssid, ClientConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let platform = SimulatedPlatform::new()?
        .with_access_point(SimAccessPoint::new("HomeNet", Bssid([2, 0, 0, 0, 0, 1])).password("secret").rssi(-42))
        .with_access_point(SimAccessPoint::new("CoffeeShop", Bssid([2, 0, 0, 0, 0, 2])).channel(11).rssi(-71));
    let mut client = platform.into_client(ClientConfig::default());
    client.setup()?;

    println!("Scanning for WiFi networks...");
    for ap in client.scan(20)? {
        println!("{:30} {:>4} dBm  ch {:<2} {}", ap.ssid, ap.rssi, ap.channel, ap.auth_mode);
    }

    Ok(())
}
