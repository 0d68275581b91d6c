use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Danish month names, in calendar order.
const MONTHS: [&str; 12] = [
    "januar",
    "februar",
    "marts",
    "april",
    "maj",
    "juni",
    "juli",
    "august",
    "september",
    "oktober",
    "november",
    "december",
];

/// Convert a Ja/Nej/"Ikke angivet" token to a boolean.
///
/// "Ikke angivet" (not specified) collapses into `false`, matching the
/// site's downstream schema. Any other text yields `None` so the caller
/// keeps the raw string.
pub fn tri_state(value: &str) -> Option<bool> {
    match value {
        "Ja" => Some(true),
        "Nej" => Some(false),
        "Ikke angivet" => Some(false),
        _ => None,
    }
}

/// Normalize a Danish publish-date phrase to `YYYY-MM-DD`.
///
/// Handles "10. januar" (day + month name, current year, rolled back one
/// year when that would land in the future), "I går", and relative counts
/// like "5 min.", "2 timer" or "3 dage". Anything else is returned
/// unchanged; the store tolerates non-ISO strings.
pub fn normalize_date(text: &str, now: DateTime<Utc>) -> String {
    let text = text.trim();

    if let Some(date) = parse_day_month(text, now.date_naive()) {
        return date.format("%Y-%m-%d").to_string();
    }

    if text.eq_ignore_ascii_case("i går") {
        return (now - Duration::days(1)).format("%Y-%m-%d").to_string();
    }

    if let Some(date) = parse_relative(text, now) {
        return date.format("%Y-%m-%d").to_string();
    }

    text.to_string()
}

/// "D. month" form, e.g. "10. januar". The year is assumed current; a date
/// strictly after today means the listing referenced last year's month.
fn parse_day_month(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let (day_part, rest) = text.split_once('.')?;
    let day: u32 = day_part.trim().parse().ok()?;
    let month_name = rest.trim().to_lowercase();
    let month = MONTHS.iter().position(|m| *m == month_name)? as u32 + 1;

    let date = NaiveDate::from_ymd_opt(today.year(), month, day)?;
    if date > today {
        NaiveDate::from_ymd_opt(today.year() - 1, month, day)
    } else {
        Some(date)
    }
}

/// Relative counts: "5 min.", "2 timer", "3 dage".
fn parse_relative(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let amount: i64 = text.split_whitespace().next()?.parse().ok()?;
    if text.contains("min") {
        Some(now - Duration::minutes(amount))
    } else if text.contains("tim") {
        Some(now - Duration::hours(amount))
    } else if text.contains("dag") {
        Some(now - Duration::days(amount))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn mid_june() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn tri_state_known_tokens() {
        assert_eq!(tri_state("Ja"), Some(true));
        assert_eq!(tri_state("Nej"), Some(false));
        assert_eq!(tri_state("Ikke angivet"), Some(false));
        assert_eq!(tri_state("Ukendt"), None);
    }

    #[test]
    fn yesterday() {
        assert_eq!(normalize_date("I går", mid_june()), "2024-06-14");
    }

    #[test]
    fn relative_days() {
        assert_eq!(normalize_date("3 dage", mid_june()), "2024-06-12");
    }

    #[test]
    fn relative_minutes_stay_on_today() {
        assert_eq!(normalize_date("5 min.", mid_june()), "2024-06-15");
    }

    #[test]
    fn relative_hours() {
        assert_eq!(normalize_date("2 timer", mid_june()), "2024-06-15");
    }

    #[test]
    fn day_month_in_the_past_keeps_current_year() {
        assert_eq!(normalize_date("10. januar", mid_june()), "2024-01-10");
    }

    #[test]
    fn day_month_in_the_future_rolls_back_a_year() {
        assert_eq!(normalize_date("10. december", mid_june()), "2023-12-10");
    }

    #[test]
    fn unknown_text_passes_through() {
        assert_eq!(normalize_date("for længe siden", mid_june()), "for længe siden");
    }
}
