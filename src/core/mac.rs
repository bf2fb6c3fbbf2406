use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A 48-bit hardware address.
///
/// Parsing ignores case and the usual separators, so `08:00:27:E8:52:CC`,
/// `08-00-27-e8-52-cc`, `0800.27e8.52cc` and `080027E852CC` are all the same
/// address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid MAC address: {0:?}")]
pub struct InvalidMacAddress(pub String);

impl MacAddress {
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Bare uppercase form, the way VirtualBox reports adapters.
    pub fn compact(&self) -> String {
        self.0.iter().map(|b| format!("{:02X}", b)).collect()
    }
}

impl FromStr for MacAddress {
    type Err = InvalidMacAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: Vec<u8> = s
            .trim()
            .bytes()
            .filter(|b| !matches!(b, b':' | b'-' | b'.'))
            .collect();
        if digits.len() != 12 {
            return Err(InvalidMacAddress(s.to_string()));
        }

        let mut octets = [0u8; 6];
        for (i, pair) in digits.chunks(2).enumerate() {
            let hi = hex_value(pair[0]).ok_or_else(|| InvalidMacAddress(s.to_string()))?;
            let lo = hex_value(pair[1]).ok_or_else(|| InvalidMacAddress(s.to_string()))?;
            octets[i] = (hi << 4) | lo;
        }
        Ok(Self(octets))
    }
}

fn hex_value(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}", a, b, c, d, e, g)
    }
}

impl TryFrom<String> for MacAddress {
    type Error = InvalidMacAddress;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_and_case_do_not_matter() {
        let canonical: MacAddress = "08:00:27:E8:52:CC".parse().unwrap();
        for variant in ["080027e852cc", "080027E852CC", "08-00-27-e8-52-cc", "0800.27e8.52cc"] {
            assert_eq!(variant.parse::<MacAddress>().unwrap(), canonical, "{}", variant);
        }
        assert_eq!(canonical.compact(), "080027E852CC");
        assert_eq!(canonical.to_string(), "08:00:27:E8:52:CC");
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<MacAddress>().is_err());
        assert!("08:00:27:E8:52".parse::<MacAddress>().is_err());
        assert!("zz0027e852cc".parse::<MacAddress>().is_err());
        assert!("080027e852cc00".parse::<MacAddress>().is_err());
    }

    #[test]
    fn deserializes_from_config_strings() {
        let mac: MacAddress = serde_json::from_str("\"aa-bb-cc-dd-ee-ff\"").unwrap();
        assert_eq!(mac.octets(), [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        assert!(serde_json::from_str::<MacAddress>("\"nope\"").is_err());
    }
}
