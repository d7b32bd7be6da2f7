//! Tests for input validation.
//!
//! These tests verify that oversized or malformed inputs are cut or
//! rejected the way the driver's fixed buffers would, before any platform
//! call is made.

use wifi_station::types::bounded::{Ipv4Text, Passphrase, Ssid};
use wifi_station::types::constants::capacity;
use wifi_station::{Bssid, Ipv4Info, NetworkCredentials, StationConfig, WifiError};

#[test]
fn test_ssid_too_long_is_truncated() {
    let long_ssid = "a".repeat(33);
    let ssid = Ssid::from(long_ssid.as_str());

    assert_eq!(ssid.len(), capacity::SSID);
    assert_eq!(ssid.as_str(), Some(&long_ssid[..32]));
}

#[test]
fn test_valid_ssids_are_kept() {
    let valid_ssids = vec![
        "MyNetwork",
        "Test-Network_123",
        "A",
        "12345678901234567890123456789012", // Exactly 32 bytes
    ];

    for ssid in valid_ssids {
        let bounded = Ssid::from(ssid);
        assert_eq!(bounded.as_str(), Some(ssid), "SSID '{}' should be kept", ssid);
    }
}

#[test]
fn test_passphrase_capacity() {
    let max = "p".repeat(64);
    assert_eq!(Passphrase::from(max.as_str()).len(), capacity::PASSWORD);

    let over = "p".repeat(65);
    assert_eq!(Passphrase::from(over.as_str()).len(), capacity::PASSWORD);
}

#[test]
fn test_truncation_can_split_a_character() {
    // 31 ASCII bytes followed by a 2-byte character: only its first byte fits.
    let input = format!("{}é", "x".repeat(31));
    let ssid = Ssid::from(input.as_str());

    assert_eq!(ssid.len(), 32);
    assert!(ssid.as_str().is_none());
    assert!(ssid.to_string_lossy().starts_with(&"x".repeat(31)));
}

#[test]
fn test_credentials_carry_truncated_fields() {
    let creds = NetworkCredentials::new(&"n".repeat(40)).with_password(&"k".repeat(80));
    let config = StationConfig::from_credentials(&creds);

    assert_eq!(config.ssid.len(), capacity::SSID);
    assert_eq!(config.password.len(), capacity::PASSWORD);
}

#[test]
fn test_invalid_bssid() {
    for bad in ["", "not-a-mac", "00:11:22:33:44", "00:11:22:33:44:55:66", "00:11:22:33:44:GG"] {
        assert!(
            matches!(bad.parse::<Bssid>(), Err(WifiError::InvalidAddress(_))),
            "BSSID '{}' should be rejected",
            bad
        );
    }
}

#[test]
fn test_valid_bssid() {
    let bssid: Bssid = "de:ad:be:ef:00:01".parse().unwrap();
    assert!(bssid.is_set());
    assert_eq!(bssid.to_string().parse::<Bssid>().unwrap(), bssid);
}

#[test]
fn test_invalid_ipv4() {
    let cases = [
        ("192.168.1", "255.255.255.0", "192.168.1.1"),
        ("192.168.1.10", "255.255.255.256", "192.168.1.1"),
        ("192.168.1.10", "255.255.255.0", ""),
        ("192.168.100.100.5", "255.255.255.0", "192.168.1.1"),
    ];

    for (ip, mask, gw) in cases {
        assert!(
            matches!(Ipv4Info::parse(ip, mask, gw), Err(WifiError::InvalidAddress(_))),
            "{ip}/{mask} via {gw} should be rejected"
        );
    }
}

#[test]
fn test_ipv4_text_buffer() {
    let text = Ipv4Text::from("255.255.255.255");
    assert_eq!(text.len(), 15);
    assert!(!Ipv4Text::would_truncate("255.255.255.255"));
    assert!(Ipv4Text::would_truncate("1234.1234.1234.1234"));
}
