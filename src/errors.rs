// Error types and error handling module
// This file defines the router's error taxonomy and the errors raised by
// the collaborators it calls out to (assets, backends, directories, host)
//
// Numan Thabit 2025 Nov

use crate::address::Address;
use thiserror::Error;

/// Failures reported by collaborators: asset books, backends, directories and the host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("insufficient balance for {account}: required {required}, available {available}")]
    InsufficientBalance {
        account: Address,
        required: u128,
        available: u128,
    },
    #[error("insufficient allowance from {owner} to {spender}: required {required}, available {available}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        required: u128,
        available: u128,
    },
    #[error("no backends registered for asset {asset}")]
    NoBackends { asset: Address },
    #[error("backend index {index} out of range for asset {asset} ({count} registered)")]
    IndexOutOfRange {
        asset: Address,
        index: usize,
        count: usize,
    },
    #[error("{caller} is not authorized: {action}")]
    Unauthorized { caller: Address, action: String },
    #[error("unknown account {0}")]
    UnknownAccount(Address),
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("arithmetic overflow")]
    Overflow,
    #[error("host error: {0}")]
    Host(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    #[error("{caller} is not authorized to administer the router")]
    NotAuthorized { caller: Address },
    #[error("invalid directory {directory}: {reason}")]
    InvalidDirectory { directory: Address, reason: String },
    #[error("no backend available for asset {asset}")]
    NoBackendAvailable { asset: Address },
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u128, available: u128 },
    #[error("amount must be non-zero")]
    ZeroAmount,
    #[error("recipient must not be the zero address")]
    InvalidRecipient,
    #[error("router re-entered while an operation is in flight")]
    Reentrancy,
    #[error("share conversion overflow")]
    Arithmetic,
    #[error(transparent)]
    Collaborator(#[from] LedgerError),
}

impl RouterError {
    /// Short stable label used for metrics and API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotAuthorized { .. } => "not_authorized",
            Self::InvalidDirectory { .. } => "invalid_directory",
            Self::NoBackendAvailable { .. } => "no_backend_available",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::ZeroAmount => "zero_amount",
            Self::InvalidRecipient => "invalid_recipient",
            Self::Reentrancy => "reentrancy",
            Self::Arithmetic => "arithmetic",
            Self::Collaborator(_) => "collaborator",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address must be 0x-prefixed 40 hex characters: {0}")]
    Malformed(String),
    #[error("address is not EIP-55 checksummed: {0}")]
    BadChecksum(String),
    #[error("'{0}' is not a checksummed address or known alias")]
    Unresolved(String),
}
