use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};

/// Years outside this window are treated as typos, not dates.
const MIN_YEAR: i32 = 1970;
const MAX_YEAR: i32 = 2100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    #[error("date out of range: {0}")]
    OutOfBounds(String),
    #[error("could not parse date: {0}")]
    Unparseable(String),
}

/// Parse a date expression into a timestamp.
///
/// Accepted forms: `today`, `tomorrow`, `YYYY-MM-DD`, and
/// `YYYY-MM-DD HH:MM`. A bare date means midnight.
pub fn parse_date(text: &str) -> Result<NaiveDateTime, DateError> {
    let text = text.trim();
    match text.to_ascii_lowercase().as_str() {
        "today" => return Ok(midnight(today())),
        "tomorrow" => {
            let date = today().checked_add_days(Days::new(1)).unwrap_or(today());
            return Ok(midnight(date));
        }
        _ => {}
    }

    let parsed = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .map(midnight)
        })
        .ok_or_else(|| DateError::Unparseable(text.to_string()))?;

    if parsed.year() < MIN_YEAR || parsed.year() > MAX_YEAR {
        return Err(DateError::OutOfBounds(text.to_string()));
    }
    Ok(parsed)
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).unwrap_or_default()
}
