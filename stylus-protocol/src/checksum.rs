//! Optional trailing checksum.
//!
//! When checksum mode is on, a line carries one extra decimal field: the
//! two's complement of the 8-bit sum of every byte before the comma that
//! introduces it. Adding the checksum to that sum therefore yields zero.

use crate::fields::{FieldError, FieldErrorKind};

/// Compute the checksum the host must append to `body`
pub fn checksum_of(body: &str) -> u8 {
    let sum = body.bytes().fold(0u8, |acc, b| acc.wrapping_add(b));
    sum.wrapping_neg()
}

/// Verify and remove the trailing checksum field
///
/// Returns the line without its checksum.
pub fn strip_checksum(line: &str) -> Result<&str, FieldError> {
    let mismatch = FieldError::new(FieldErrorKind::Checksum, 0);
    let (body, field) = line.rsplit_once(',').ok_or(mismatch)?;
    let field = field.trim();
    if field.is_empty() || field.len() > 3 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(mismatch);
    }
    let value: u16 = field.parse().map_err(|_| mismatch)?;
    let value = u8::try_from(value).map_err(|_| mismatch)?;
    if checksum_of(body) != value {
        return Err(mismatch);
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_zeroes_sum() {
        let body = "SM,100,100,0";
        let cs = checksum_of(body);
        let total = body
            .bytes()
            .fold(0u8, |acc, b| acc.wrapping_add(b))
            .wrapping_add(cs);
        assert_eq!(total, 0);
    }

    #[test]
    fn test_strip_valid() {
        let body = "QS";
        // 'Q' + 'S' = 81 + 83 = 164, 256 - 164 = 92
        assert_eq!(checksum_of(body), 92);
        assert_eq!(strip_checksum("QS,92"), Ok("QS"));
    }

    #[test]
    fn test_strip_rejects_wrong_or_missing() {
        let bad = FieldError::new(FieldErrorKind::Checksum, 0);
        assert_eq!(strip_checksum("QS,93"), Err(bad));
        assert_eq!(strip_checksum("QS"), Err(bad));
        assert_eq!(strip_checksum("QS,"), Err(bad));
        assert_eq!(strip_checksum("QS,256"), Err(bad));
        assert_eq!(strip_checksum("QS,abc"), Err(bad));
    }

    #[test]
    fn test_strip_keeps_other_fields() {
        let body = "SM,100,-5,7";
        let mut line = heapless::String::<32>::new();
        core::fmt::write(&mut line, format_args!("{},{}", body, checksum_of(body))).unwrap();
        assert_eq!(strip_checksum(&line), Ok(body));
    }
}
