// File: jurisguard-core/src/validators.rs
//! Programmatic validation functions for specific sensitive data types.
//!
//! Pattern recognizers match structure; these checks confirm that a match is a
//! plausible identifier (known invalid SSN ranges, Luhn checksums, IBAN mod-97)
//! and so cut false positives before they reach the policy engine.
//!
//! License: MIT OR APACHE 2.0

use serde::{Deserialize, Serialize};

/// Checksum/structure validators a pattern rule can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validator {
    UsSsn,
    Luhn,
    Iban,
}

impl Validator {
    pub fn validate(self, candidate: &str) -> bool {
        match self {
            Validator::UsSsn => is_valid_ssn_programmatically(candidate),
            Validator::Luhn => is_valid_credit_card_programmatically(candidate),
            Validator::Iban => is_valid_iban_programmatically(candidate),
        }
    }
}

/// Validates an SSN based on US Social Security Administration rules.
///
/// Expects the "XXX-XX-XXXX" form and rejects area 000, 666 and 900-999,
/// group 00 and serial 0000.
pub fn is_valid_ssn_programmatically(ssn: &str) -> bool {
    let mut parts = ssn.split('-');

    let (Some(area), Some(group), Some(serial), None) = (parts.next(), parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    if area.len() != 3 || group.len() != 2 || serial.len() != 4 {
        return false;
    }

    let Some(area_num) = area.parse::<u16>().ok() else { return false; };
    let Some(group_num) = group.parse::<u8>().ok() else { return false; };
    let Some(serial_num) = serial.parse::<u16>().ok() else { return false; };

    let invalid_area = (area_num == 0) || (area_num == 666) || (area_num >= 900);
    let invalid_group = group_num == 0;
    let invalid_serial = serial_num == 0;

    !(invalid_area || invalid_group || invalid_serial)
}

/// Validates a digit string using the Luhn (mod 10) algorithm.
pub fn is_valid_luhn(num_str: &str) -> bool {
    let mut sum = 0;
    let mut alternate = false;

    for c in num_str.chars().rev() {
        let Some(mut digit) = c.to_digit(10) else { return false; };

        if alternate {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
        alternate = !alternate;
    }

    sum % 10 == 0
}

/// Strips separators from a card number and applies the Luhn check.
/// Card numbers are 13 to 19 digits long.
pub fn is_valid_credit_card_programmatically(cc_number: &str) -> bool {
    let digits: String = cc_number.chars().filter(|c| c.is_ascii_digit()).collect();
    if !(13..=19).contains(&digits.len()) {
        return false;
    }
    is_valid_luhn(&digits)
}

/// Validates an IBAN with the ISO 13616 mod-97 check.
///
/// Spaces are ignored. The country code is moved behind the account number,
/// letters are expanded to two-digit numbers (A = 10 ... Z = 35) and the
/// resulting number must leave a remainder of 1 when divided by 97.
pub fn is_valid_iban_programmatically(iban: &str) -> bool {
    let compact: String = iban
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if !(15..=34).contains(&compact.len()) || !compact.chars().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }

    let (head, tail) = compact.split_at(4);
    let mut chars = head.chars();
    let (Some(c1), Some(c2), Some(d1), Some(d2)) = (chars.next(), chars.next(), chars.next(), chars.next()) else {
        return false;
    };
    if !c1.is_ascii_alphabetic() || !c2.is_ascii_alphabetic() || !d1.is_ascii_digit() || !d2.is_ascii_digit() {
        return false;
    }

    let mut remainder: u32 = 0;
    for c in tail.chars().chain(head.chars()) {
        let Some(value) = c.to_digit(36) else { return false; };
        remainder = if value >= 10 {
            (remainder * 100 + value) % 97
        } else {
            (remainder * 10 + value) % 97
        };
    }

    remainder == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssn_validation() {
        assert!(is_valid_ssn_programmatically("123-45-6789"));
        assert!(!is_valid_ssn_programmatically("000-45-6789"));
        assert!(!is_valid_ssn_programmatically("666-45-6789"));
        assert!(!is_valid_ssn_programmatically("912-45-6789"));
        assert!(!is_valid_ssn_programmatically("123-00-6789"));
        assert!(!is_valid_ssn_programmatically("123-45-0000"));
        assert!(!is_valid_ssn_programmatically("123456789"));
    }

    #[test]
    fn test_luhn_and_credit_cards() {
        assert!(is_valid_luhn("4111111111111111"));
        assert!(is_valid_credit_card_programmatically("4111 1111 1111 1111"));
        assert!(is_valid_credit_card_programmatically("3782-822463-10005"));
        assert!(!is_valid_credit_card_programmatically("4111 1111 1111 1112"));
        assert!(!is_valid_credit_card_programmatically("0"));
    }

    #[test]
    fn test_iban_validation() {
        assert!(is_valid_iban_programmatically("DE89370400440532013000"));
        assert!(is_valid_iban_programmatically("GB82 WEST 1234 5698 7654 32"));
        assert!(!is_valid_iban_programmatically("DE89370400440532013001"));
        assert!(!is_valid_iban_programmatically("DE89"));
        assert!(!is_valid_iban_programmatically("1289370400440532013000"));
    }

    #[test]
    fn test_validator_dispatch() {
        assert!(Validator::UsSsn.validate("123-45-6789"));
        assert!(Validator::Luhn.validate("4111-1111-1111-1111"));
        assert!(Validator::Iban.validate("DE89370400440532013000"));
    }
}
