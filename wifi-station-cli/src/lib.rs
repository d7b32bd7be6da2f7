pub mod bootstrap;
pub mod settings;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use log::{debug, info};
use serde::Serialize;
use std::path::PathBuf;
use wifi_station::sim::{SimClient, SimulatedPlatform};
use wifi_station::{
    AccessPoint, AddressConfig, Bssid, Ipv4Info, NetworkCredentials, RestoreOutcome,
};

use crate::bootstrap::{FileFlash, FlashStorage, MemoryFlash, init_logging, init_storage};
use crate::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "wifi-station")]
#[command(version, about = "Bring up a Wi-Fi station and join a network")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// File the saved network is kept in between runs
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    /// Silence the radio driver's own log output
    #[arg(long, global = true)]
    quiet_driver: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List visible access points, strongest first
    Scan {
        /// Maximum number of access points to report
        #[arg(short = 'n', long, default_value_t = 10)]
        max: usize,
    },
    /// Rejoin the saved network, or join the given one (default)
    Join(JoinArgs),
}

#[derive(ClapArgs, Debug, Default)]
struct JoinArgs {
    /// Network name to join when nothing saved can be restored
    #[arg(long)]
    ssid: Option<String>,

    #[arg(long)]
    password: Option<String>,

    /// Pin the connection to one access point radio
    #[arg(long)]
    bssid: Option<Bssid>,

    /// Static IPv4 address; disables DHCP
    #[arg(long, requires_all = ["netmask", "gateway"])]
    ip: Option<String>,

    #[arg(long, requires = "ip")]
    netmask: Option<String>,

    #[arg(long, requires = "ip")]
    gateway: Option<String>,

    /// Leave the network again once an address is bound
    #[arg(long)]
    disconnect: bool,
}

impl JoinArgs {
    fn credentials(&self) -> Option<NetworkCredentials> {
        if self.ssid.is_none() && self.bssid.is_none() {
            return None;
        }
        let mut creds = NetworkCredentials::new(self.ssid.as_deref().unwrap_or_default());
        if let Some(password) = &self.password {
            creds = creds.with_password(password);
        }
        if let Some(bssid) = self.bssid {
            creds = creds.with_bssid(bssid);
        }
        Some(creds)
    }

    fn address(&self) -> Result<Option<AddressConfig>> {
        let (Some(ip), Some(netmask), Some(gateway)) = (&self.ip, &self.netmask, &self.gateway)
        else {
            return Ok(None);
        };
        let info = Ipv4Info::parse(ip, netmask, gateway).context("invalid static address")?;
        Ok(Some(AddressConfig::ipv4(info)))
    }
}

#[derive(Debug, Serialize)]
struct JoinReport {
    restored: bool,
    ip: Ipv4Info,
    disconnected: bool,
}

#[derive(Debug)]
enum Output {
    Scan(Vec<AccessPoint>),
    Join(JoinReport),
}

impl Output {
    fn print(&self, json: bool) -> Result<()> {
        match self {
            Self::Scan(found) => print_scan(found, json),
            Self::Join(report) => print_join(report, json),
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    if args.quiet_driver {
        settings.client.enable_logs = false;
    }
    if let Some(path) = args.storage {
        settings.storage.path = Some(path);
    }

    init_logging(args.verbose, settings.client.enable_logs)?;

    let command = args.command.unwrap_or(Command::Join(JoinArgs::default()));
    let output = match settings.storage.path.clone() {
        Some(path) => {
            let mut flash = FileFlash::new(path);
            execute(command, &settings, storage(&settings, &mut flash))?
        }
        None => {
            let mut flash = MemoryFlash::new();
            execute(command, &settings, storage(&settings, &mut flash))?
        }
    };
    output.print(args.json)
}

/// Storage is only touched when the configuration asks for it.
fn storage<'a, S: FlashStorage>(settings: &Settings, flash: &'a mut S) -> Option<&'a mut S> {
    settings.client.setup_storage.then_some(flash)
}

/// Brings the station up over `flash`, runs `command`, and writes the
/// driver's saved network back to `flash`.
fn execute<S>(command: Command, settings: &Settings, mut flash: Option<&mut S>) -> Result<Output>
where
    S: FlashStorage + ?Sized,
{
    if let Some(flash) = flash.as_deref_mut() {
        init_storage(flash).context("failed to initialize storage")?;
    }

    let mut platform = SimulatedPlatform::new().context("failed to start event loop")?;
    for ap in settings.access_points()? {
        platform = platform.with_access_point(ap);
    }
    if let Some(flash) = flash.as_deref() {
        if let Some(saved) = flash.load_station().context("failed to read saved network")? {
            debug!("Loaded saved network '{}'", saved.ssid);
            platform = platform.with_saved_config(saved);
        }
    }

    let mut client = platform.into_client(settings.client);
    client.setup().context("failed to set up Wi-Fi station")?;

    let output = match command {
        Command::Scan { max } => client.scan(max).context("scan failed").map(Output::Scan),
        Command::Join(join) => join_network(&mut client, &join).map(Output::Join),
    };

    if let Some(flash) = flash {
        let saved = client.saved_config()?;
        flash
            .store_station(&saved)
            .context("failed to persist saved network")?;
    }
    output
}

fn join_network(client: &mut SimClient, join: &JoinArgs) -> Result<JoinReport> {
    let restored = match client.restore_connection()? {
        RestoreOutcome::Restored => {
            info!("Wi-Fi connection restored");
            true
        }
        outcome => {
            if let RestoreOutcome::Unreachable(reason) = outcome {
                info!("Saved network unreachable ({reason})");
            }
            let Some(creds) = join.credentials() else {
                bail!("no saved network to restore; pass --ssid or --bssid");
            };
            info!("Connecting to '{}'", creds.ssid);
            client
                .connect(&creds, join.address()?.as_ref())
                .with_context(|| format!("failed to connect to '{}'", creds.ssid))?;
            false
        }
    };

    let ip = client.wait_for_address()?;

    if join.disconnect {
        client.disconnect()?;
    }

    Ok(JoinReport {
        restored,
        ip,
        disconnected: join.disconnect,
    })
}

fn print_scan(found: &[AccessPoint], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(found)?);
        return Ok(());
    }

    if found.is_empty() {
        println!("No networks found");
    }
    for ap in found {
        println!(
            "{:32} {}  {:>4} dBm  ch {:<3} {}",
            ap.ssid, ap.bssid, ap.rssi, ap.channel, ap.auth_mode
        );
    }
    Ok(())
}

fn print_join(report: &JoinReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    if report.restored {
        println!("+-- WiFi connection restored.");
    }
    println!(
        "+-- Address {} netmask {} gateway {}",
        report.ip.ip, report.ip.netmask, report.ip.gateway
    );
    if report.disconnected {
        println!("+-- Disconnected.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wifi_station::sim::SimAccessPoint;
    use wifi_station::{ClientConfig, ClientStatus};

    fn home_settings() -> Settings {
        Settings::parse(
            r#"
            [[network]]
            ssid = "HomeNet"
            password = "secret"
            "#,
        )
        .unwrap()
    }

    fn join_report(output: Output) -> JoinReport {
        match output {
            Output::Join(report) => report,
            other => panic!("expected a join report, got {other:?}"),
        }
    }

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    fn join_args(argv: &[&str]) -> JoinArgs {
        match parse(argv).command {
            Some(Command::Join(join)) => join,
            other => panic!("expected join, got {other:?}"),
        }
    }

    fn client() -> SimClient {
        let platform = SimulatedPlatform::new()
            .unwrap()
            .with_access_point(SimAccessPoint::new("HomeNet", Bssid([2, 0, 0, 0, 0, 1])).password("secret"));
        let mut client = platform.into_client(ClientConfig::default());
        client.setup().unwrap();
        client
    }

    #[test]
    fn join_is_the_default_command() {
        let args = parse(&["wifi-station", "--json"]);
        assert!(args.json);
        assert!(args.command.is_none());
    }

    #[test]
    fn scan_defaults_to_ten() {
        match parse(&["wifi-station", "scan"]).command {
            Some(Command::Scan { max }) => assert_eq!(max, 10),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn static_address_needs_all_three_parts() {
        assert!(Args::try_parse_from(["wifi-station", "join", "--ip", "192.168.86.150"]).is_err());

        let join = join_args(&[
            "wifi-station",
            "join",
            "--ip",
            "192.168.86.150",
            "--netmask",
            "255.255.255.0",
            "--gateway",
            "192.168.86.1",
        ]);
        let address = join.address().unwrap().unwrap();
        assert_eq!(address.ipv4.unwrap().ip.octets(), [192, 168, 86, 150]);
    }

    #[test]
    fn bssid_flag_is_parsed() {
        let join = join_args(&["wifi-station", "join", "--bssid", "02:00:00:00:00:01"]);
        let creds = join.credentials().unwrap();
        assert!(creds.ssid.is_empty());
        assert_eq!(creds.bssid, Some(Bssid([2, 0, 0, 0, 0, 1])));

        assert!(Args::try_parse_from(["wifi-station", "join", "--bssid", "nope"]).is_err());
    }

    #[test]
    fn join_without_target_fails() {
        let mut client = client();
        let err = join_network(&mut client, &JoinArgs::default()).unwrap_err();
        assert!(err.to_string().contains("--ssid"));
    }

    #[test]
    fn join_connects_and_disconnects() {
        let mut client = client();
        let join = join_args(&[
            "wifi-station",
            "join",
            "--ssid",
            "HomeNet",
            "--password",
            "secret",
            "--disconnect",
        ]);

        let report = join_network(&mut client, &join).unwrap();

        assert!(!report.restored);
        assert!(report.disconnected);
        assert!(!report.ip.is_unset());
        assert_eq!(client.status(), ClientStatus::Disconnected);
    }

    #[test]
    fn join_with_wrong_password_reports_rejection() {
        let mut client = client();
        let join = join_args(&["wifi-station", "join", "--ssid", "HomeNet", "--password", "nope"]);

        let err = join_network(&mut client, &join).unwrap_err();
        assert!(format!("{err:#}").contains("authentication failed"));
    }

    #[test]
    fn joined_network_is_restored_on_next_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("station.toml");
        let settings = home_settings();
        let join = join_args(&["wifi-station", "join", "--ssid", "HomeNet", "--password", "secret"]);

        let mut flash = FileFlash::new(&path);
        let first = join_report(execute(Command::Join(join), &settings, Some(&mut flash)).unwrap());
        assert!(!first.restored);
        assert!(path.exists());

        let mut flash = FileFlash::new(&path);
        let second = join_report(
            execute(Command::Join(JoinArgs::default()), &settings, Some(&mut flash)).unwrap(),
        );
        assert!(second.restored);
        assert!(!second.ip.is_unset());
    }

    #[test]
    fn disconnect_forgets_saved_network() {
        let settings = home_settings();
        let mut flash = MemoryFlash::new();
        let join = join_args(&[
            "wifi-station",
            "join",
            "--ssid",
            "HomeNet",
            "--password",
            "secret",
            "--disconnect",
        ]);

        execute(Command::Join(join), &settings, Some(&mut flash)).unwrap();

        assert_eq!(flash.load_station().unwrap(), None);
        let err = execute(Command::Join(JoinArgs::default()), &settings, Some(&mut flash)).unwrap_err();
        assert!(err.to_string().contains("--ssid"));
    }

    #[test]
    fn nothing_persists_without_storage_setup() {
        let mut settings = home_settings();
        settings.client.setup_storage = false;
        let mut flash = MemoryFlash::new();
        let join = join_args(&["wifi-station", "join", "--ssid", "HomeNet", "--password", "secret"]);

        execute(Command::Join(join), &settings, storage(&settings, &mut flash)).unwrap();

        assert_eq!(flash.init_calls, 0);
        assert_eq!(flash.load_station().unwrap(), None);
    }
}
