//! Country-aware phone number normalization.

use serde::{Deserialize, Serialize};

use super::{Defect, OrderError};

const FIELD: &str = "contact_phone_number";

/// Numbering rules of one country, used to read numbers written in
/// national format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhoneRegion {
    code: &'static str,
    calling_code: &'static str,
    trunk_prefix: Option<char>,
    min_national_len: usize,
    max_national_len: usize,
}

const REGIONS: &[PhoneRegion] = &[
    PhoneRegion::define("ID", "62", Some('0'), 8, 12),
    PhoneRegion::define("MY", "60", Some('0'), 8, 10),
    PhoneRegion::define("SG", "65", None, 8, 8),
    PhoneRegion::define("PH", "63", Some('0'), 10, 10),
    PhoneRegion::define("AU", "61", Some('0'), 9, 9),
    PhoneRegion::define("IN", "91", Some('0'), 10, 10),
    PhoneRegion::define("GB", "44", Some('0'), 9, 10),
    PhoneRegion::define("DE", "49", Some('0'), 6, 11),
    PhoneRegion::define("US", "1", None, 10, 10),
];

impl PhoneRegion {
    const fn define(
        code: &'static str,
        calling_code: &'static str,
        trunk_prefix: Option<char>,
        min_national_len: usize,
        max_national_len: usize,
    ) -> Self {
        Self {
            code,
            calling_code,
            trunk_prefix,
            min_national_len,
            max_national_len,
        }
    }

    /// Looks up a region by its ISO 3166-1 alpha-2 code.
    pub fn from_code(code: &str) -> Option<Self> {
        REGIONS
            .iter()
            .find(|r| r.code.eq_ignore_ascii_case(code.trim()))
            .copied()
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn calling_code(&self) -> &'static str {
        self.calling_code
    }

    fn accepts_national(&self, national: &str) -> bool {
        (self.min_national_len..=self.max_national_len).contains(&national.len())
            && !national.starts_with('0')
    }
}

impl Default for PhoneRegion {
    fn default() -> Self {
        REGIONS[0]
    }
}

/// A phone number normalized to E.164 (`+` followed by up to 15 digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parses a number written in international (`+62…`, `0062…`) or
    /// national (`0812…`) format. National numbers are read with `region`'s
    /// rules. Spaces, dashes, dots and parentheses are ignored.
    pub fn parse(raw: &str, region: PhoneRegion) -> Result<Self, OrderError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(OrderError::invalid(FIELD, Defect::Empty));
        }

        let mut digits = String::with_capacity(trimmed.len());
        let mut international = false;
        for (i, c) in trimmed.chars().enumerate() {
            match c {
                '0'..='9' => digits.push(c),
                '+' if i == 0 => international = true,
                ' ' | '-' | '.' | '(' | ')' => {}
                _ => return Err(malformed()),
            }
        }

        let e164 = if international {
            from_international(&digits)?
        } else if let Some(rest) = digits.strip_prefix("00") {
            from_international(rest)?
        } else {
            from_national(&digits, region)?
        };

        Ok(Self(e164))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn malformed() -> OrderError {
    OrderError::invalid(FIELD, Defect::Malformed)
}

/// `digits` starts with the country calling code.
fn from_international(digits: &str) -> Result<String, OrderError> {
    if digits.starts_with('0') || !(8..=15).contains(&digits.len()) {
        return Err(malformed());
    }

    if let Some(region) = REGIONS.iter().find(|r| digits.starts_with(r.calling_code)) {
        let national = &digits[region.calling_code.len()..];
        if !region.accepts_national(national) {
            return Err(malformed());
        }
    }

    Ok(format!("+{digits}"))
}

fn from_national(digits: &str, region: PhoneRegion) -> Result<String, OrderError> {
    let national = match region.trunk_prefix {
        Some(trunk) if digits.starts_with(trunk) => &digits[trunk.len_utf8()..],
        // Regions with a trunk prefix: a number without it is most likely
        // the international form typed without the leading `+`.
        Some(_) => match digits.strip_prefix(region.calling_code) {
            Some(rest) if region.accepts_national(rest) => rest,
            _ => digits,
        },
        None if region.accepts_national(digits) => digits,
        None => digits.strip_prefix(region.calling_code).unwrap_or(digits),
    };

    if !region.accepts_national(national) {
        return Err(malformed());
    }

    Ok(format!("+{}{}", region.calling_code, national))
}
