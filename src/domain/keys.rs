use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Company identifier normalized for joins.
///
/// Upstream stages disagree on zero-padding, so `"007526346"` and `"7526346"` must
/// resolve to the same company. The raw identifier stays untouched in the tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CompanyKey(String);

impl CompanyKey {
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        let stripped = trimmed.trim_start_matches('0');
        if stripped.is_empty() && !trimmed.is_empty() {
            CompanyKey("0".to_string())
        } else {
            CompanyKey(stripped.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompanyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Industry segment code (NAICS).
///
/// Numeric codes compare numerically regardless of how the artifact wrote them
/// (`61111000` and `61111000.0` are equal); anything else is kept as text and
/// sorts after every numeric code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum SegmentCode {
    Numeric(i64),
    Text(String),
}

impl SegmentCode {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            return Some(SegmentCode::Numeric(n));
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Some(SegmentCode::Numeric(f as i64))
            }
            _ => Some(SegmentCode::Text(trimmed.to_string())),
        }
    }
}

impl Ord for SegmentCode {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SegmentCode::Numeric(a), SegmentCode::Numeric(b)) => a.cmp(b),
            (SegmentCode::Numeric(_), SegmentCode::Text(_)) => Ordering::Less,
            (SegmentCode::Text(_), SegmentCode::Numeric(_)) => Ordering::Greater,
            (SegmentCode::Text(a), SegmentCode::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for SegmentCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SegmentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentCode::Numeric(n) => write!(f, "{}", n),
            SegmentCode::Text(s) => write!(f, "{}", s),
        }
    }
}
