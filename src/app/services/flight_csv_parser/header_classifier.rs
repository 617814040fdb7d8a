//! Units row detection for the second line of a recording
//!
//! Flight recordings often carry a row of units (`ft`, `kt`, `deg`, `%`)
//! directly under the header. This is a best-effort heuristic: an all-zero
//! units row or a textual first data row can be misclassified, which is why
//! [`UnitsRowMode`] lets the caller force either answer.

use crate::config::UnitsRowMode;
use crate::constants::{UNIT_FIELD_MAX_LEN, UNITS_ROW_RATIO};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Letters, parentheses, percent, slash and degree-like symbols
static UNIT_SYMBOLS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}()%/°º˚]").expect("valid unit symbol pattern"));

/// A plain signed decimal number such as `-12`, `+3.5` or `.25`
static SIGNED_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)$").expect("valid decimal pattern"));

/// Classification of the second non-blank line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondLine {
    /// The line holds units; data starts on the following line
    Units,
    /// The line is already the first data row
    Data,
}

/// Whether a single field looks like a unit rather than a measurement
pub fn is_unit_like(field: &str) -> bool {
    let field = field.trim();

    field.is_empty()
        || UNIT_SYMBOLS.is_match(field)
        || (field.chars().count() < UNIT_FIELD_MAX_LEN && !SIGNED_DECIMAL.is_match(field))
}

/// Decide whether the parsed second line is a units row
///
/// A line whose field count differs from the header is always data. Otherwise
/// it is a units row when more than 60% of its fields are unit-like.
pub fn classify_second_line(fields: &[String], header_count: usize) -> SecondLine {
    if fields.len() != header_count || fields.is_empty() {
        return SecondLine::Data;
    }

    let unit_like = fields.iter().filter(|field| is_unit_like(field)).count();
    let ratio = unit_like as f64 / fields.len() as f64;

    debug!(
        "Units heuristic: {}/{} unit-like fields ({:.0}%)",
        unit_like,
        fields.len(),
        ratio * 100.0
    );

    if ratio > UNITS_ROW_RATIO {
        SecondLine::Units
    } else {
        SecondLine::Data
    }
}

/// Apply the caller's override on top of the heuristic
pub fn resolve_second_line(
    fields: &[String],
    header_count: usize,
    mode: UnitsRowMode,
) -> SecondLine {
    match mode {
        UnitsRowMode::Auto => classify_second_line(fields, header_count),
        UnitsRowMode::Present => SecondLine::Units,
        UnitsRowMode::Absent => SecondLine::Data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn test_unit_like_fields() {
        assert!(is_unit_like(""));
        assert!(is_unit_like("ft"));
        assert!(is_unit_like("(deg)"));
        assert!(is_unit_like("%"));
        assert!(is_unit_like("m/s"));
        assert!(is_unit_like("°"));
        assert!(is_unit_like("-"));
    }

    #[test]
    fn test_numbers_are_not_unit_like() {
        assert!(!is_unit_like("12"));
        assert!(!is_unit_like("-3.5"));
        assert!(!is_unit_like("+.25"));
        assert!(!is_unit_like("1234567890123"));
    }

    #[test]
    fn test_units_row_detected() {
        let line = fields(&["s", "ft", "kt", "deg"]);
        assert_eq!(classify_second_line(&line, 4), SecondLine::Units);
    }

    #[test]
    fn test_data_row_detected() {
        let line = fields(&["0.0", "1000", "120", "ON"]);
        assert_eq!(classify_second_line(&line, 4), SecondLine::Data);
    }

    #[test]
    fn test_field_count_mismatch_is_data() {
        let line = fields(&["ft", "kt"]);
        assert_eq!(classify_second_line(&line, 3), SecondLine::Data);
    }

    #[test]
    fn test_sixty_percent_is_not_enough() {
        // 3 of 5 unit-like is exactly 60%, which does not exceed the threshold
        let line = fields(&["ft", "kt", "deg", "1", "2"]);
        assert_eq!(classify_second_line(&line, 5), SecondLine::Data);

        let line = fields(&["ft", "kt", "deg", "%", "2"]);
        assert_eq!(classify_second_line(&line, 5), SecondLine::Units);
    }

    #[test]
    fn test_override_modes() {
        let numeric_units = fields(&["0", "0", "0"]);
        assert_eq!(
            resolve_second_line(&numeric_units, 3, UnitsRowMode::Auto),
            SecondLine::Data
        );
        assert_eq!(
            resolve_second_line(&numeric_units, 3, UnitsRowMode::Present),
            SecondLine::Units
        );
        let textual = fields(&["ON", "OFF", "ARMED"]);
        assert_eq!(
            resolve_second_line(&textual, 3, UnitsRowMode::Absent),
            SecondLine::Data
        );
    }
}
