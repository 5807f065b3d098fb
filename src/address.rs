// Principal addresses and human-readable alias resolution
// This file defines the 20-byte account identifier shared by callers, assets,
// backends and directories, with EIP-55 checksum handling
//
// Numan Thabit 2025 Nov

use crate::errors::AddressError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// 20-byte principal identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Deterministic address for a label: the last 20 bytes of keccak256(label).
    /// Used to place sandbox contracts and accounts at stable addresses.
    pub fn derive(label: &str) -> Self {
        let digest = Keccak256::digest(label.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// EIP-55 mixed-case rendering.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = Keccak256::digest(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Strict parse: the input must carry a valid EIP-55 checksum.
    pub fn parse_checksummed(input: &str) -> Result<Self, AddressError> {
        let addr = Self::from_str(input)?;
        if addr.to_checksum() != input {
            return Err(AddressError::BadChecksum(input.to_string()));
        }
        Ok(addr)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    /// Lenient parse: any case, but a mixed-case input must still checksum.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| AddressError::Malformed(s.to_string()))?;
        if body.len() != 40 {
            return Err(AddressError::Malformed(s.to_string()));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(body, &mut bytes)
            .map_err(|_| AddressError::Malformed(s.to_string()))?;
        let addr = Self(bytes);

        let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
        let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
        if has_upper && has_lower && addr.to_checksum()[2..] != *body {
            return Err(AddressError::BadChecksum(s.to_string()));
        }
        Ok(addr)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Address::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

/// Alias table for turning operator input into addresses.
///
/// Resolution accepts either a strictly checksummed address or a known alias,
/// never a bare lowercase string that merely looks like an address.
#[derive(Debug, Clone, Default)]
pub struct AddressBook {
    aliases: HashMap<String, Address>,
}

impl AddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, alias: impl Into<String>, address: Address) -> Option<Address> {
        self.aliases.insert(alias.into().to_ascii_lowercase(), address)
    }

    pub fn get(&self, alias: &str) -> Option<Address> {
        self.aliases.get(&alias.to_ascii_lowercase()).copied()
    }

    pub fn resolve(&self, input: &str) -> Result<Address, AddressError> {
        let input = input.trim();
        if let Ok(addr) = Address::parse_checksummed(input) {
            return Ok(addr);
        }
        self.get(input)
            .ok_or_else(|| AddressError::Unresolved(input.to_string()))
    }

    /// Reverse lookup for log output; falls back to the checksum form.
    pub fn label(&self, address: &Address) -> String {
        self.aliases
            .iter()
            .filter(|(_, a)| *a == address)
            .map(|(alias, _)| alias.clone())
            .min()
            .unwrap_or_else(|| address.to_checksum())
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
