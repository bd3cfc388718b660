//! Business rules on user-supplied values: the renewal window and loose
//! field checks used by the catalog request types.

use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use validator::ValidationError;

/// Latest allowed renewal, in days from today (four weeks).
pub const RENEWAL_MAX_DAYS: i64 = 28;

/// Renewal date proposed before the librarian enters one (three weeks).
pub const RENEWAL_DEFAULT_DAYS: i64 = 21;

/// Why a proposed renewal date was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenewalDateError {
    #[error("in the past")]
    InPast,
    #[error("too far ahead")]
    TooFarAhead,
}

impl RenewalDateError {
    /// Message shown next to the date field
    pub fn message(&self) -> &'static str {
        match self {
            RenewalDateError::InPast => "Invalid date - renewal in past.",
            RenewalDateError::TooFarAhead => "Invalid date - renewal more than 4 weeks ahead.",
        }
    }
}

/// Check that `candidate` lies in `[today, today + 28 days]`.
pub fn validate_renewal_date(
    candidate: NaiveDate,
    today: NaiveDate,
) -> Result<NaiveDate, RenewalDateError> {
    if candidate < today {
        return Err(RenewalDateError::InPast);
    }
    if candidate > today + Duration::days(RENEWAL_MAX_DAYS) {
        return Err(RenewalDateError::TooFarAhead);
    }
    Ok(candidate)
}

pub fn default_renewal_date(today: NaiveDate) -> NaiveDate {
    today + Duration::days(RENEWAL_DEFAULT_DAYS)
}

static ISBN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9A-Za-z]{1,13}$").unwrap());

/// Stored ISBN column width, separators included.
pub const ISBN_MAX_LEN: usize = 17;

/// Loose ISBN check: at most 17 characters, and up to 13 alphanumerics once
/// hyphens and spaces are removed.
pub fn validate_isbn(isbn: &str) -> Result<(), ValidationError> {
    let compact: String = isbn.chars().filter(|c| *c != '-' && *c != ' ').collect();
    if isbn.len() <= ISBN_MAX_LEN && ISBN_RE.is_match(&compact) {
        Ok(())
    } else {
        let mut err = ValidationError::new("isbn");
        err.message = Some("ISBN must be 1 to 13 letters or digits, at most 17 characters with separators".into());
        Err(err)
    }
}

/// Date of death may not precede date of birth.
pub fn validate_lifespan(
    date_of_birth: Option<NaiveDate>,
    date_of_death: Option<NaiveDate>,
) -> Result<(), ValidationError> {
    match (date_of_birth, date_of_death) {
        (Some(born), Some(died)) if died < born => {
            let mut err = ValidationError::new("lifespan");
            err.message = Some("Date of death precedes date of birth".into());
            Err(err)
        }
        _ => Ok(()),
    }
}
