use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_iso, r"^(\d{4})-(\d{1,2})-(\d{1,2})$");
re!(re_slash, r"^(\d{1,2})/(\d{1,2})/(\d{4})$");
re!(re_dash, r"^(\d{1,2})-(\d{1,2})-(\d{4})$");

/// Parses a date written as `YYYY-MM-DD`, `D/M/YYYY` or `D-M-YYYY`.
///
/// Slash and dash forms are day-first (Australian convention). Out-of-range
/// days or months, impossible calendar dates and every other layout yield
/// `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();

    if let Some(caps) = re_iso().captures(s) {
        return build(&caps[1], &caps[2], &caps[3]);
    }
    if let Some(caps) = re_slash().captures(s) {
        return build(&caps[3], &caps[2], &caps[1]);
    }
    if let Some(caps) = re_dash().captures(s) {
        return build(&caps[3], &caps[2], &caps[1]);
    }
    None
}

fn build(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}
