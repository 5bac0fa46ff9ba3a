//! Scheme permission bitmask.
//!
//! The controller stores each registered scheme's permissions as a 32-bit
//! mask. The on-chain form is an 8-digit hex string (`"0x0000001f"`).

use crate::errors::TypeError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;

/// Permission mask for a scheme registered with a controller
#[derive(Clone, Copy, Eq, PartialEq, Hash, Default)]
pub struct SchemePermissions(pub u32);

impl SchemePermissions {
    pub const NONE: Self = Self(0x0000_0000);
    /// Set for every registered scheme
    pub const REGISTERED: Self = Self(0x0000_0001);
    pub const CAN_REGISTER_SCHEMES: Self = Self(0x0000_0002);
    pub const CAN_ADD_REMOVE_GLOBAL_CONSTRAINTS: Self = Self(0x0000_0004);
    pub const CAN_UPGRADE_CONTROLLER: Self = Self(0x0000_0008);
    pub const CAN_CALL_DELEGATECALL: Self = Self(0x0000_0010);
    pub const ALL: Self = Self(0x0000_001f);

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Effective mask for registration. Required bits always survive;
    /// callers can only add, never clear.
    pub fn with_required(self, required: Self) -> Self {
        Self(self.0 | required.0)
    }

    /// The on-chain hex form, zero-padded to 8 digits
    pub fn to_hex_string(&self) -> String {
        format!("0x{:08x}", self.0)
    }
}

impl fmt::Debug for SchemePermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchemePermissions({})", self.to_hex_string())
    }
}

impl fmt::Display for SchemePermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex_string())
    }
}

impl FromStr for SchemePermissions {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        u32::from_str_radix(stripped, 16)
            .map(Self)
            .map_err(|_| TypeError::InvalidHex(s.to_string()))
    }
}

impl BitOr for SchemePermissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SchemePermissions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for SchemePermissions {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl From<u32> for SchemePermissions {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl Serialize for SchemePermissions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex_string())
    }
}

impl<'de> Deserialize<'de> for SchemePermissions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_bits() {
        let p = SchemePermissions::REGISTERED | SchemePermissions::CAN_REGISTER_SCHEMES;
        assert_eq!(p.bits(), 0x0000_0003);
        assert!(p.contains(SchemePermissions::REGISTERED));
        assert!(!p.contains(SchemePermissions::CAN_UPGRADE_CONTROLLER));
        assert!(SchemePermissions::ALL.contains(p));
    }

    #[test]
    fn test_required_bits_cannot_be_cleared() {
        let required = SchemePermissions::REGISTERED | SchemePermissions::CAN_REGISTER_SCHEMES;
        let effective = SchemePermissions::NONE.with_required(required);
        assert!(effective.contains(required));

        let extra = SchemePermissions::CAN_UPGRADE_CONTROLLER;
        let widened = extra.with_required(required);
        assert!(widened.contains(required));
        assert!(widened.contains(extra));
    }

    #[test]
    fn test_hex_form() {
        assert_eq!(SchemePermissions::ALL.to_hex_string(), "0x0000001f");
        assert_eq!(SchemePermissions::NONE.to_hex_string(), "0x00000000");
        let parsed: SchemePermissions = "0x0000001f".parse().unwrap();
        assert_eq!(parsed, SchemePermissions::ALL);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let json = serde_json::to_string(&SchemePermissions::REGISTERED).unwrap();
        assert_eq!(json, "\"0x00000001\"");
        let back: SchemePermissions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SchemePermissions::REGISTERED);
    }
}
