//! Fixed-capacity byte strings matching the driver's buffer layouts.
//!
//! The radio driver copies SSIDs, passphrases and address strings into
//! fixed-size arrays. [`BoundedString`] keeps that contract visible in the
//! type system: anything longer than the capacity is truncated at exactly
//! `N` bytes, the same way a bounded copy into the driver buffer would.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};

use crate::types::constants::capacity;

/// A byte string holding at most `N` bytes.
///
/// Truncation is byte-based, so a multi-byte UTF-8 sequence cut at the
/// boundary is kept as raw bytes; [`BoundedString::to_string_lossy`] renders
/// it with a replacement character.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundedString<const N: usize> {
    buf: [u8; N],
    len: usize,
}

/// SSID as stored in the station configuration (32 bytes).
pub type Ssid = BoundedString<{ capacity::SSID }>;
/// WPA passphrase as stored in the station configuration (64 bytes).
pub type Passphrase = BoundedString<{ capacity::PASSWORD }>;
/// Dotted-quad IPv4 text (16 bytes).
pub type Ipv4Text = BoundedString<{ capacity::IPV4_TEXT }>;
/// Textual IPv6 address (40 bytes).
pub type Ipv6Text = BoundedString<{ capacity::IPV6_TEXT }>;

impl<const N: usize> BoundedString<N> {
    /// Maximum number of bytes this string can hold.
    pub const CAPACITY: usize = N;

    /// Returns an empty string.
    pub const fn empty() -> Self {
        Self { buf: [0; N], len: 0 }
    }

    /// Copies `bytes`, truncating to `N` bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let len = bytes.len().min(N);
        let mut buf = [0; N];
        buf[..len].copy_from_slice(&bytes[..len]);
        Self { buf, len }
    }

    /// Returns `true` if the input would not fit without truncation.
    pub fn would_truncate(input: &str) -> bool {
        input.len() > N
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Returns the contents as `&str`, or `None` if truncation split a
    /// character or the bytes were never UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(self.as_bytes()).ok()
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<const N: usize> Default for BoundedString<N> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<const N: usize> From<&str> for BoundedString<N> {
    fn from(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }
}

impl<const N: usize> Display for BoundedString<N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.to_string_lossy())
    }
}

impl<const N: usize> Debug for BoundedString<N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

impl<const N: usize> Serialize for BoundedString<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string_lossy())
    }
}

impl<'de, const N: usize> Deserialize<'de> for BoundedString<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_input_is_kept() {
        let ssid = Ssid::from("HomeNet");
        assert_eq!(ssid.as_str(), Some("HomeNet"));
        assert_eq!(ssid.len(), 7);
        assert!(!ssid.is_empty());
    }

    #[test]
    fn truncates_at_capacity() {
        let long = "a".repeat(40);
        let ssid = Ssid::from(long.as_str());
        assert_eq!(ssid.len(), 32);
        assert_eq!(ssid.as_bytes(), &long.as_bytes()[..32]);
        assert!(Ssid::would_truncate(&long));
    }

    #[test]
    fn exact_capacity_fits() {
        let exact = "p".repeat(64);
        let pass = Passphrase::from(exact.as_str());
        assert_eq!(pass.as_str(), Some(exact.as_str()));
        assert!(!Passphrase::would_truncate(&exact));
    }

    #[test]
    fn truncation_can_split_a_character() {
        // 31 ASCII bytes followed by a two-byte character: the cut lands
        // in the middle of it.
        let input = format!("{}é", "x".repeat(31));
        let ssid = Ssid::from(input.as_str());
        assert_eq!(ssid.len(), 32);
        assert!(ssid.as_str().is_none());
        assert!(ssid.to_string_lossy().ends_with('\u{FFFD}'));
    }

    #[test]
    fn ipv4_text_capacity() {
        assert_eq!(Ipv4Text::CAPACITY, 16);
        assert_eq!(Ipv6Text::CAPACITY, 40);
        let text = Ipv4Text::from("255.255.255.255");
        assert_eq!(text.as_str(), Some("255.255.255.255"));
    }

    #[test]
    fn default_is_empty() {
        assert!(Ssid::default().is_empty());
        assert_eq!(Ssid::empty(), Ssid::from(""));
    }
}
