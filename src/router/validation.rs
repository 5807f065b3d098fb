// Pre-operation validation
// Rejects malformed requests before the router touches any collaborator
//
// Numan Thabit 2025 Nov

use crate::address::Address;
use crate::errors::RouterError;

pub fn validate_amount(amount: u128) -> Result<(), RouterError> {
    if amount == 0 {
        return Err(RouterError::ZeroAmount);
    }
    Ok(())
}

/// An omitted amount means "everything"; an explicit zero is a mistake.
pub fn validate_optional_amount(amount: Option<u128>) -> Result<(), RouterError> {
    amount.map_or(Ok(()), validate_amount)
}

/// Resolve the effective recipient, defaulting to the caller.
pub fn resolve_recipient(caller: &Address, recipient: Option<Address>) -> Result<Address, RouterError> {
    let recipient = recipient.unwrap_or(*caller);
    if recipient.is_zero() {
        return Err(RouterError::InvalidRecipient);
    }
    Ok(recipient)
}

/// Fail a sized request whose `available` amount falls short, unless the
/// caller takes what there is. A request for everything never falls short.
pub fn check_shortfall(
    requested: Option<u128>,
    available: u128,
    accept_partial: bool,
) -> Result<(), RouterError> {
    match requested {
        Some(requested) if available < requested && !accept_partial => {
            Err(RouterError::InsufficientBalance {
                requested,
                available,
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_amounts_rejected() {
        assert_eq!(validate_amount(0), Err(RouterError::ZeroAmount));
        assert!(validate_amount(1).is_ok());
        assert!(validate_optional_amount(None).is_ok());
        assert_eq!(validate_optional_amount(Some(0)), Err(RouterError::ZeroAmount));
    }

    #[test]
    fn recipient_defaults_to_caller() {
        let caller = Address::derive("caller");
        let other = Address::derive("other");
        assert_eq!(resolve_recipient(&caller, None).unwrap(), caller);
        assert_eq!(resolve_recipient(&caller, Some(other)).unwrap(), other);
        assert_eq!(
            resolve_recipient(&caller, Some(Address::ZERO)),
            Err(RouterError::InvalidRecipient)
        );
    }

    #[test]
    fn shortfall_only_fails_sized_strict_requests() {
        assert!(check_shortfall(None, 0, false).is_ok());
        assert!(check_shortfall(Some(10), 10, false).is_ok());
        assert!(check_shortfall(Some(10), 4, true).is_ok());
        assert_eq!(
            check_shortfall(Some(10), 4, false),
            Err(RouterError::InsufficientBalance {
                requested: 10,
                available: 4
            })
        );
    }
}
