//! Size strings with binary unit suffixes
//!
//! Sizes are written as a whole number followed by an optional `T`, `G`,
//! `M`, `K` or `B` suffix (case-insensitive), all powers of 1024. Converting
//! to a larger unit is refused whenever it would produce a fraction.

use crate::PtmError;
use std::fmt;

/// Unit suffix of a size string
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Unit {
    Byte,
    Kilobyte,
    Megabyte,
    Gigabyte,
    Terabyte,
}

impl Unit {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.to_ascii_uppercase().as_str() {
            "B" => Some(Self::Byte),
            "K" => Some(Self::Kilobyte),
            "M" => Some(Self::Megabyte),
            "G" => Some(Self::Gigabyte),
            "T" => Some(Self::Terabyte),
            _ => None,
        }
    }

    /// Number of bytes in one of this unit
    pub fn bytes(self) -> u64 {
        match self {
            Self::Byte => 1,
            Self::Kilobyte => 1 << 10,
            Self::Megabyte => 1 << 20,
            Self::Gigabyte => 1 << 30,
            Self::Terabyte => 1 << 40,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Byte => write!(f, "B"),
            Self::Kilobyte => write!(f, "K"),
            Self::Megabyte => write!(f, "M"),
            Self::Gigabyte => write!(f, "G"),
            Self::Terabyte => write!(f, "T"),
        }
    }
}

/// A parsed size such as `4G`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub value: u64,
    /// `None` when the string had no suffix
    pub unit: Option<Unit>,
}

impl Size {
    /// Parse a size string like `512M`, `4g` or `1024`
    pub fn parse(input: &str) -> Result<Self, PtmError> {
        let input = input.trim();
        let digits = input.trim_end_matches(|c: char| "TtGgMmKkBb".contains(c));
        let suffix = &input[digits.len()..];

        let value = digits
            .parse::<u64>()
            .map_err(|_| PtmError::InvalidData(format!("invalid size `{}`", input)))?;

        let unit = if suffix.is_empty() {
            None
        } else {
            Some(
                Unit::from_suffix(suffix)
                    .ok_or_else(|| PtmError::InvalidData(format!("invalid size `{}`", input)))?,
            )
        };

        Ok(Self { value, unit })
    }

    /// Convert to `target`, failing when the result would not be whole
    pub fn convert(&self, target: Unit) -> Result<u64, PtmError> {
        let unit = self.unit.ok_or_else(|| {
            PtmError::InvalidData(format!("size `{}` has no unit", self.value))
        })?;

        if unit < target {
            return Err(PtmError::InvalidData(
                "conversion to units which will produce floating point number is not possible"
                    .to_string(),
            ));
        }

        self.value
            .checked_mul(unit.bytes() / target.bytes())
            .ok_or_else(|| PtmError::InvalidData(format!("size `{}` is too large", self)))
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            Some(unit) => write!(f, "{}{}", self.value, unit),
            None => write!(f, "{}", self.value),
        }
    }
}

/// Convert a size string to kilobytes
pub fn to_kilobytes(input: &str) -> Result<u64, PtmError> {
    Size::parse(input)?.convert(Unit::Kilobyte)
}

/// Convert a size string to megabytes
pub fn to_megabytes(input: &str) -> Result<u64, PtmError> {
    Size::parse(input)?.convert(Unit::Megabyte)
}

/// Parse a memory amount; a bare number is taken as megabytes
pub fn parse_memory_mb(input: &str) -> Result<u64, PtmError> {
    let size = Size::parse(input)?;
    match size.unit {
        None => Ok(size.value),
        Some(_) => size.convert(Unit::Megabyte),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        let size = Size::parse("4G").unwrap();
        assert_eq!(size.value, 4);
        assert_eq!(size.unit, Some(Unit::Gigabyte));

        let size = Size::parse("512m").unwrap();
        assert_eq!(size.unit, Some(Unit::Megabyte));
        assert_eq!(size.to_string(), "512M");

        assert_eq!(Size::parse("1024").unwrap().unit, None);
    }

    #[test]
    fn test_parse_size_invalid() {
        assert!(Size::parse("").is_err());
        assert!(Size::parse("G").is_err());
        assert!(Size::parse("4GB").is_err());
        assert!(Size::parse("four").is_err());
    }

    #[test]
    fn test_conversions() {
        assert_eq!(to_kilobytes("4G").unwrap(), 4 * 1024 * 1024);
        assert_eq!(to_megabytes("1T").unwrap(), 1_048_576);
        assert_eq!(to_megabytes("2G").unwrap(), 2048);
        assert_eq!(Size::parse("3K").unwrap().convert(Unit::Byte).unwrap(), 3072);
    }

    #[test]
    fn test_fractional_conversion_refused() {
        assert!(to_megabytes("512K").is_err());
        assert!(Size::parse("1M").unwrap().convert(Unit::Gigabyte).is_err());
    }

    #[test]
    fn test_memory_bare_number_is_megabytes() {
        assert_eq!(parse_memory_mb("1024").unwrap(), 1024);
        assert_eq!(parse_memory_mb("512M").unwrap(), 512);
        assert_eq!(parse_memory_mb("1G").unwrap(), 1024);
        assert!(parse_memory_mb("100K").is_err());
    }
}
