fn main() -> anyhow::Result<()> {
    wifi_station_cli::run()
}
