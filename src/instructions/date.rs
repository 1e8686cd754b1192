use chrono::{Datelike, Days, Months, NaiveDate, Weekday};

/// Resolves a short natural-language date relative to `today`.
///
/// Understands ISO dates (`2026-10-20`), `today`, `tomorrow`, `yesterday`,
/// `next week|month|year`, weekday names (optionally prefixed with `next`,
/// `this` or `on`), `in <n> <unit>` and shorthand offsets such as `3d`, `2w`,
/// `1mo`, `1y`. Weekdays always resolve to the next occurrence strictly after
/// `today`. Returns `None` for anything else.
pub fn resolve_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let lower = text.trim().to_lowercase();
    if let Ok(date) = NaiveDate::parse_from_str(&lower, "%Y-%m-%d") {
        return Some(date);
    }

    let words: Vec<&str> = lower.split_whitespace().collect();
    match words.as_slice() {
        ["today"] => Some(today),
        ["tomorrow"] => today.succ_opt(),
        ["yesterday"] => today.pred_opt(),
        ["next", "week"] => today.checked_add_days(Days::new(7)),
        ["next", "month"] => today.checked_add_months(Months::new(1)),
        ["next", "year"] => today.checked_add_months(Months::new(12)),
        ["next" | "this" | "on", day] => parse_weekday(day).and_then(|wd| next_weekday(today, wd)),
        ["in", amount, unit] => {
            let amount = parse_english_number(amount)?;
            offset(today, amount, unit)
        }
        [single] => parse_weekday(single)
            .and_then(|wd| next_weekday(today, wd))
            .or_else(|| parse_shorthand(today, single)),
        _ => None,
    }
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    match s {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tues" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thurs" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

fn parse_english_number(s: &str) -> Option<u32> {
    match s {
        "a" | "an" | "one" => Some(1),
        "two" => Some(2),
        "three" => Some(3),
        "four" => Some(4),
        "five" => Some(5),
        "six" => Some(6),
        "seven" => Some(7),
        "eight" => Some(8),
        "nine" => Some(9),
        "ten" => Some(10),
        "eleven" => Some(11),
        "twelve" => Some(12),
        _ => s.parse::<u32>().ok(),
    }
}

fn offset(today: NaiveDate, amount: u32, unit: &str) -> Option<NaiveDate> {
    match unit {
        "d" | "day" | "days" => today.checked_add_days(Days::new(amount as u64)),
        "w" | "week" | "weeks" => today.checked_add_days(Days::new(amount as u64 * 7)),
        "mo" | "month" | "months" => today.checked_add_months(Months::new(amount)),
        "y" | "year" | "years" => today.checked_add_months(Months::new(amount.checked_mul(12)?)),
        _ => None,
    }
}

fn parse_shorthand(today: NaiveDate, s: &str) -> Option<NaiveDate> {
    let idx = s.find(|c: char| !c.is_ascii_digit())?;
    let (amount, unit) = s.split_at(idx);
    let amount = amount.parse::<u32>().ok()?;
    offset(today, amount, unit)
}

fn next_weekday(from: NaiveDate, target: Weekday) -> Option<NaiveDate> {
    let current = from.weekday().num_days_from_monday();
    let wanted = target.num_days_from_monday();
    let ahead = match (7 + wanted - current) % 7 {
        0 => 7,
        n => n,
    };
    from.checked_add_days(Days::new(ahead as u64))
}
