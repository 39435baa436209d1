//! Repeat rules and next-occurrence evaluation.
//!
//! A rule is `"<kind> <arg>"`:
//! - `d N` repeats every N days, `1 <= N <= 400`
//! - `y` / `y N` repeats yearly; N must be a positive integer but only
//!   single-year steps are taken
//!
//! `w` and `m` are recognised by [`is_well_formed`] but cannot be evaluated.

use chrono::{Datelike, Days, NaiveDate};

use crate::dates::{add_years, format_date, parse_date};
use crate::errors::RuleError;

/// Largest interval accepted by a `d N` rule.
pub const MAX_DAILY_INTERVAL: u32 = 400;

/// Results must fit the four-digit `YYYYMMDD` form.
const MAX_YEAR: i32 = 9999;

/// A parsed, evaluable repeat rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepeatRule {
    Daily(u32),
    Yearly,
}

impl RepeatRule {
    /// Parse a rule string. Argument validation happens here, before any
    /// date arithmetic.
    pub fn parse(rule: &str) -> Result<Self, RuleError> {
        let mut parts = rule.split_whitespace();
        let Some(kind) = parts.next() else {
            return Err(RuleError::EmptyRule);
        };
        let args: Vec<&str> = parts.collect();

        match kind {
            "d" => {
                let [count] = args.as_slice() else {
                    return Err(RuleError::InvalidArgument(format!(
                        "expected `d <days>`, got {:?}",
                        rule.trim()
                    )));
                };
                let days = parse_count(count)?;
                if !(1..=i64::from(MAX_DAILY_INTERVAL)).contains(&days) {
                    return Err(RuleError::InvalidArgument(format!(
                        "days must be between 1 and {MAX_DAILY_INTERVAL}, got {days}"
                    )));
                }
                Ok(Self::Daily(days as u32))
            }
            "y" => match args.as_slice() {
                [] => Ok(Self::Yearly),
                [count] => {
                    let years = parse_count(count)?;
                    if years < 1 {
                        return Err(RuleError::InvalidArgument(format!(
                            "years must be positive, got {years}"
                        )));
                    }
                    Ok(Self::Yearly)
                }
                _ => Err(RuleError::InvalidArgument(format!(
                    "expected `y [years]`, got {:?}",
                    rule.trim()
                ))),
            },
            _ => Err(RuleError::UnsupportedRule(rule.trim().to_string())),
        }
    }

    /// First occurrence of this rule, counted from `start`, relative to `now`.
    ///
    /// Daily rules return `start` itself when it is not before `now`, and the
    /// first `start + k*N` not before `now` otherwise. Yearly rules always
    /// step at least once and stop at the first date strictly after `now`.
    pub fn next_after(&self, now: NaiveDate, start: NaiveDate) -> Result<NaiveDate, RuleError> {
        let next = self.step_past(now, start)?;
        if next.year() > MAX_YEAR {
            return Err(out_of_range());
        }
        Ok(next)
    }

    fn step_past(&self, now: NaiveDate, start: NaiveDate) -> Result<NaiveDate, RuleError> {
        match *self {
            Self::Daily(interval) => {
                if start >= now {
                    return Ok(start);
                }
                let interval = i64::from(interval);
                let behind = (now - start).num_days();
                let steps = (behind + interval - 1) / interval;
                start
                    .checked_add_days(Days::new((steps * interval) as u64))
                    .ok_or_else(out_of_range)
            }
            Self::Yearly => {
                let mut next = start;
                loop {
                    next = add_years(next, 1).ok_or_else(out_of_range)?;
                    if next > now {
                        return Ok(next);
                    }
                }
            }
        }
    }
}

impl std::str::FromStr for RepeatRule {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn out_of_range() -> RuleError {
    RuleError::InvalidArgument("date out of range".into())
}

fn parse_count(raw: &str) -> Result<i64, RuleError> {
    raw.parse()
        .map_err(|_| RuleError::InvalidArgument(format!("not a number: {raw:?}")))
}

/// Compute the next occurrence of `rule` for a task starting on `start`.
///
/// `start` is an 8-digit `YYYYMMDD` string and the result uses the same format.
pub fn next_date(now: NaiveDate, start: &str, rule: &str) -> Result<String, RuleError> {
    if rule.trim().is_empty() {
        return Err(RuleError::EmptyRule);
    }
    let start = parse_date(start)?;
    let rule = RepeatRule::parse(rule)?;
    rule.next_after(now, start).map(format_date)
}

/// Structural check used when a task is edited: one of `d`, `w`, `m`, `y`,
/// a single space, then one or more ASCII digits.
///
/// This is looser than [`RepeatRule::parse`]; it says nothing about whether
/// the rule can be evaluated.
pub fn is_well_formed(rule: &str) -> bool {
    match rule.as_bytes() {
        [kind, b' ', digits @ ..] => {
            matches!(kind, b'd' | b'w' | b'm' | b'y')
                && !digits.is_empty()
                && digits.iter().all(u8::is_ascii_digit)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn daily_steps_past_start_to_first_not_before_now() {
        // 0301 -> 0306 -> 0311
        assert_eq!(next_date(ymd(2025, 3, 10), "20250301", "d 5").unwrap(), "20250311");
    }

    #[test]
    fn daily_keeps_start_equal_to_now() {
        assert_eq!(next_date(ymd(2025, 3, 10), "20250310", "d 400").unwrap(), "20250310");
    }

    #[test]
    fn daily_keeps_future_start() {
        assert_eq!(next_date(ymd(2024, 1, 26), "20240202", "d 30").unwrap(), "20240202");
    }

    #[test]
    fn daily_lands_exactly_on_now() {
        assert_eq!(next_date(ymd(2024, 1, 27), "20240113", "d 7").unwrap(), "20240127");
    }

    #[test]
    fn daily_single_step() {
        assert_eq!(next_date(ymd(2024, 1, 26), "20240120", "d 20").unwrap(), "20240209");
    }

    #[test]
    fn daily_crosses_year_boundary() {
        assert_eq!(next_date(ymd(2025, 1, 2), "20241230", "d 1").unwrap(), "20250102");
    }

    #[test]
    fn yearly_advances_until_after_now() {
        assert_eq!(next_date(ymd(2024, 1, 26), "20231106", "y").unwrap(), "20241106");
        assert_eq!(next_date(ymd(2024, 1, 26), "20160101", "y 1").unwrap(), "20250101");
    }

    #[test]
    fn yearly_steps_even_from_future_start() {
        assert_eq!(next_date(ymd(2024, 1, 26), "20250701", "y").unwrap(), "20260701");
    }

    #[test]
    fn yearly_equal_to_now_moves_forward() {
        assert_eq!(next_date(ymd(2024, 1, 26), "20230126", "y").unwrap(), "20250126");
    }

    #[test]
    fn yearly_leap_day_rolls_to_march() {
        assert_eq!(next_date(ymd(2024, 1, 26), "20240229", "y").unwrap(), "20250301");
        assert_eq!(next_date(ymd(2025, 6, 1), "20240229", "y").unwrap(), "20260301");
    }

    #[test]
    fn empty_rule_rejected() {
        assert_eq!(next_date(ymd(2024, 1, 26), "20240126", ""), Err(RuleError::EmptyRule));
        assert_eq!(next_date(ymd(2024, 1, 26), "20240126", "   "), Err(RuleError::EmptyRule));
    }

    #[test]
    fn empty_rule_checked_before_date() {
        assert_eq!(next_date(ymd(2024, 1, 26), "garbage", ""), Err(RuleError::EmptyRule));
    }

    #[test]
    fn invalid_start_date_rejected() {
        assert!(matches!(
            next_date(ymd(2024, 1, 26), "20241350", "d 1"),
            Err(RuleError::InvalidDate(_))
        ));
        assert!(matches!(next_date(ymd(2024, 1, 26), "", "d 1"), Err(RuleError::InvalidDate(_))));
    }

    #[test]
    fn weekly_and_monthly_unsupported() {
        for rule in ["w 1", "m 1", "w 1,4,5", "m 4 1,2", "x 3", "dd 5"] {
            assert!(
                matches!(next_date(ymd(2024, 1, 26), "20240126", rule), Err(RuleError::UnsupportedRule(_))),
                "{rule}"
            );
        }
    }

    #[test]
    fn malformed_day_counts_rejected() {
        for rule in ["d", "d 0", "d -1", "d 401", "d x", "d 5 6", "d 1.5"] {
            assert!(
                matches!(next_date(ymd(2024, 1, 26), "20240126", rule), Err(RuleError::InvalidArgument(_))),
                "{rule}"
            );
        }
    }

    #[test]
    fn malformed_year_counts_rejected() {
        for rule in ["y 0", "y -2", "y one", "y 1 2"] {
            assert!(
                matches!(next_date(ymd(2024, 1, 26), "20240126", rule), Err(RuleError::InvalidArgument(_))),
                "{rule}"
            );
        }
    }

    #[test]
    fn parse_tolerates_extra_whitespace() {
        assert_eq!(RepeatRule::parse("  d   7 ").unwrap(), RepeatRule::Daily(7));
        assert_eq!("y 3".parse::<RepeatRule>().unwrap(), RepeatRule::Yearly);
    }

    #[test]
    fn well_formed_accepts_all_kinds() {
        for rule in ["d 1", "w 3", "m 12", "y 1", "d 999"] {
            assert!(is_well_formed(rule), "{rule}");
        }
    }

    #[test]
    fn well_formed_rejects_bad_shapes() {
        for rule in ["", "d", "d ", "d5", "x 1", "d 1a", "w 1,2", "d  1", "y -1"] {
            assert!(!is_well_formed(rule), "{rule}");
        }
    }

    #[test]
    fn results_past_year_9999_are_out_of_range() {
        let err = next_date(ymd(9999, 12, 31), "99991230", "d 400").unwrap_err();
        assert_eq!(err, RuleError::InvalidArgument("date out of range".into()));

        let err = next_date(ymd(9999, 6, 1), "20000101", "y").unwrap_err();
        assert!(matches!(err, RuleError::InvalidArgument(_)));

        assert_eq!(next_date(ymd(9999, 12, 30), "99991229", "d 1").unwrap(), "99991230");
    }

    fn base() -> NaiveDate {
        ymd(1990, 1, 1)
    }

    proptest! {
        #[test]
        fn daily_result_is_smallest_step_not_before_now(
            now_off in 0i64..20_000,
            start_off in 0i64..20_000,
            interval in 1u32..=MAX_DAILY_INTERVAL,
        ) {
            let now = base() + Duration::days(now_off);
            let start = base() + Duration::days(start_off);
            let got = RepeatRule::Daily(interval).next_after(now, start).unwrap();

            prop_assert!(got >= now);
            let diff = (got - start).num_days();
            prop_assert!(diff >= 0);
            prop_assert_eq!(diff % i64::from(interval), 0);
            if diff > 0 {
                prop_assert!(got - Duration::days(i64::from(interval)) < now);
            }
        }

        #[test]
        fn yearly_result_is_first_whole_year_after_now(
            now_off in 0i64..20_000,
            start_off in 0i64..20_000,
        ) {
            let now = base() + Duration::days(now_off);
            let start = base() + Duration::days(start_off);
            let got = RepeatRule::Yearly.next_after(now, start).unwrap();

            prop_assert!(got > now);
            prop_assert!(got.year() > start.year());

            let mut prev = start;
            let mut cur = add_years(start, 1).unwrap();
            while cur != got {
                prev = cur;
                cur = add_years(cur, 1).unwrap();
            }
            prop_assert!(prev == start || prev <= now);

            if !(start.month() == 2 && start.day() == 29) {
                prop_assert_eq!((got.month(), got.day()), (start.month(), start.day()));
            }
        }
    }
}
