/// Parsed amounts at or below this are treated as extraction noise.
pub const SALARY_FLOOR: i64 = 100_000;

/// Monthly salary in pesos from free-form text like `"$1.600.000 + comisiones"`.
///
/// Only the leading phrase before any `+` or `-` is read. Periods are
/// thousands separators when there are several, or one followed by exactly
/// three digits; any other period makes the parse fail. Decimal amounts
/// (`"1.300,50"`) are not recognized and fail the same way.
/// A range joined by a word (`"$1.200.000 a $1.500.000"`) is read as one
/// run of digits.
pub fn parse_salary(text: Option<&str>) -> Option<i64> {
    let text = text?;
    let leading = text.split(['+', '-']).next().unwrap_or_default().trim();
    let cleaned: String = leading
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let parts: Vec<&str> = cleaned.split('.').collect();
    let digits = if parts.len() > 2 || (parts.len() == 2 && parts[1].len() == 3) {
        parts.concat()
    } else {
        cleaned
    };

    let value: i64 = digits.parse().ok()?;
    (value > SALARY_FLOOR).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_thousands_format() {
        assert_eq!(parse_salary(Some("1.300.000")), Some(1_300_000));
        assert_eq!(parse_salary(Some("$ 2.100.000 COP")), Some(2_100_000));
    }

    #[test]
    fn plain_digits() {
        assert_eq!(parse_salary(Some("2000000")), Some(2_000_000));
    }

    #[test]
    fn trailing_bonus_and_ranges_are_dropped() {
        assert_eq!(parse_salary(Some("$1.500.000 + comisiones")), Some(1_500_000));
        assert_eq!(parse_salary(Some("1.400.000 - 1.800.000")), Some(1_400_000));
    }

    #[test]
    fn worded_ranges_run_both_amounts_together() {
        assert_eq!(
            parse_salary(Some("$1.200.000 a $1.500.000")),
            Some(12_000_001_500_000)
        );
    }

    #[test]
    fn single_period_with_three_digits_is_a_separator() {
        assert_eq!(parse_salary(Some("950.000")), Some(950_000));
    }

    #[test]
    fn single_period_with_short_tail_fails() {
        assert_eq!(parse_salary(Some("1300000.50")), None);
    }

    #[test]
    fn below_floor_is_rejected() {
        assert_eq!(parse_salary(Some("50000")), None);
        assert_eq!(parse_salary(Some("100.000")), None);
        assert_eq!(parse_salary(Some("100.001")), Some(100_001));
    }

    #[test]
    fn absent_or_textual_input() {
        assert_eq!(parse_salary(None), None);
        assert_eq!(parse_salary(Some("A convenir")), None);
        assert_eq!(parse_salary(Some("")), None);
    }

    #[test]
    fn decimal_comma_is_not_recognized() {
        assert_eq!(parse_salary(Some("1.300,50")), None);
    }

    #[test]
    fn overflow_is_a_parse_failure() {
        assert_eq!(parse_salary(Some("99999999999999999999999")), None);
    }
}
