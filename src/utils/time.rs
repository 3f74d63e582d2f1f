use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};

/// Storage form of an instant: RFC 3339, fixed microsecond width, `Z` suffix,
/// so that text order matches time order in SQLite.
pub fn to_db(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn from_db(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

pub fn date_to_db(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn date_from_db(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Parse an instant given on the command line.
/// Accepts RFC 3339 (any offset, normalized to UTC) or a bare `YYYY-MM-DD`
/// meaning midnight UTC.
pub fn parse_instant_arg(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(start_of_day)
        .map_err(|_| anyhow!("Bad date '{}'. Use YYYY-MM-DD or RFC 3339", s))
}
