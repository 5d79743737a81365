//! Comma-separated field extraction.
//!
//! Fields are consumed left to right. Each extraction reports whether the
//! field was present at all (`Ok(None)` for absent), so callers can tell an
//! omitted optional parameter from one that is present but invalid.

/// Why a field was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldErrorKind {
    /// Required field absent
    Missing,
    /// Numeric value does not fit the declared type or range
    OutOfRange,
    /// Not a decimal number
    Malformed,
    /// Content left after the last expected field
    Extra,
    /// Checksum absent or wrong
    Checksum,
}

/// A rejected field and its 1-based position after the command code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldError {
    pub kind: FieldErrorKind,
    /// 1-based field index, 0 when the error is not tied to a field
    pub index: u8,
}

impl FieldError {
    pub const fn new(kind: FieldErrorKind, index: u8) -> Self {
        Self { kind, index }
    }
}

/// Integer types that can be read from a field
pub trait FieldValue: Sized + Copy {
    fn from_i64(value: i64) -> Option<Self>;
}

macro_rules! field_value {
    ($($ty:ty),*) => {
        $(impl FieldValue for $ty {
            fn from_i64(value: i64) -> Option<Self> {
                <$ty>::try_from(value).ok()
            }
        })*
    };
}

field_value!(u8, u16, u32, i16, i32);

/// Cursor over the fields of one command line
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    rest: Option<&'a str>,
    index: u8,
}

impl<'a> Fields<'a> {
    /// Wrap the text following the command code and its comma
    ///
    /// `None` or an empty string means the command had no fields.
    pub fn new(rest: Option<&'a str>) -> Self {
        Self {
            rest: rest.filter(|r| !r.is_empty()),
            index: 0,
        }
    }

    /// 1-based index of the last field taken
    pub fn index(&self) -> u8 {
        self.index
    }

    fn next_token(&mut self) -> Option<&'a str> {
        let rest = self.rest?;
        self.index = self.index.saturating_add(1);
        match rest.split_once(',') {
            Some((token, tail)) => {
                self.rest = Some(tail);
                Some(token.trim())
            }
            None => {
                self.rest = None;
                Some(rest.trim())
            }
        }
    }

    fn error(&self, kind: FieldErrorKind) -> FieldError {
        FieldError::new(kind, self.index)
    }

    /// Take the next field if present
    ///
    /// An empty token (`SM,,5`) counts as absent.
    pub fn next<T: FieldValue>(&mut self) -> Result<Option<T>, FieldError> {
        let token = match self.next_token() {
            None => {
                self.index = self.index.saturating_add(1);
                return Ok(None);
            }
            Some("") => return Ok(None),
            Some(token) => token,
        };
        let value = parse_decimal(token).ok_or(self.error(FieldErrorKind::Malformed))?;
        T::from_i64(value)
            .map(Some)
            .ok_or(self.error(FieldErrorKind::OutOfRange))
    }

    /// Take the next field, which must be present
    pub fn required<T: FieldValue>(&mut self) -> Result<T, FieldError> {
        self.next()?.ok_or(self.error(FieldErrorKind::Missing))
    }

    /// Take the next field and check it against an inclusive range
    pub fn required_in<T>(&mut self, min: T, max: T) -> Result<T, FieldError>
    where
        T: FieldValue + PartialOrd,
    {
        let value = self.required()?;
        self.check_range(value, min, max)
    }

    /// Take the next optional field and check it against an inclusive range
    pub fn optional_in<T>(&mut self, min: T, max: T) -> Result<Option<T>, FieldError>
    where
        T: FieldValue + PartialOrd,
    {
        match self.next()? {
            Some(value) => self.check_range(value, min, max).map(Some),
            None => Ok(None),
        }
    }

    fn check_range<T: PartialOrd>(&self, value: T, min: T, max: T) -> Result<T, FieldError> {
        if value < min || value > max {
            Err(self.error(FieldErrorKind::OutOfRange))
        } else {
            Ok(value)
        }
    }

    /// Succeed only if every field has been consumed
    ///
    /// Trailing empty fields (`SM,10,1,1,`) are tolerated.
    pub fn finish(mut self) -> Result<(), FieldError> {
        while let Some(token) = self.next_token() {
            if !token.is_empty() {
                return Err(self.error(FieldErrorKind::Extra));
            }
        }
        Ok(())
    }
}

/// Parse an optionally signed decimal integer
///
/// Inputs longer than 18 digits saturate, so they fail every range check
/// instead of wrapping.
fn parse_decimal(token: &str) -> Option<i64> {
    let (negative, digits) = match token.as_bytes().first()? {
        b'-' => (true, &token[1..]),
        b'+' => (false, &token[1..]),
        _ => (false, token),
    };
    if digits.is_empty() || digits.len() > 18 {
        return if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            Some(if negative { i64::MIN } else { i64::MAX })
        } else {
            None
        };
    }
    let mut value: i64 = 0;
    for b in digits.bytes() {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value * 10 + i64::from(b - b'0');
    }
    Some(if negative { -value } else { value })
}
