use super::validation::ValidationError;
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

const CARD_NUMBER_LENGTH: std::ops::RangeInclusive<usize> = 14..=19;
const CVV_LENGTH: std::ops::RangeInclusive<usize> = 3..=4;
const EXPIRY_YEAR: std::ops::RangeInclusive<i32> = 1..=9999;

/// A validated payment card.
///
/// Only constructible through [`CreditCard::new`] / [`CreditCard::new_at`], so
/// holding one means every field passed validation at construction time.
#[derive(Clone, PartialEq, Eq)]
pub struct CreditCard {
    card_number: String,
    expiry_month: u32,
    expiry_year: i32,
    cvv: String,
}

impl CreditCard {
    /// Validates the raw card fields against the current UTC time.
    pub fn new(
        card_number: Option<&str>,
        expiry_month: i32,
        expiry_year: i32,
        cvv: Option<&str>,
    ) -> Result<Self, ValidationError> {
        Self::new_at(card_number, expiry_month, expiry_year, cvv, Utc::now())
    }

    /// Validates the raw card fields, judging expiry relative to `now`.
    ///
    /// Rules are checked in a fixed order and the first failure is returned.
    pub fn new_at(
        card_number: Option<&str>,
        expiry_month: i32,
        expiry_year: i32,
        cvv: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let card_number = card_number
            .filter(|n| !n.is_empty())
            .ok_or(ValidationError::MissingField("card_number"))?;
        let cvv = cvv
            .filter(|c| !c.is_empty())
            .ok_or(ValidationError::MissingField("cvv"))?;

        if !CARD_NUMBER_LENGTH.contains(&card_number.len()) {
            return Err(ValidationError::CardNumberLength(card_number.len()));
        }
        if !is_digits(card_number) {
            return Err(ValidationError::CardNumberDigits);
        }
        if !(1..=12).contains(&expiry_month) {
            return Err(ValidationError::ExpiryMonth(expiry_month));
        }
        if !EXPIRY_YEAR.contains(&expiry_year) {
            return Err(ValidationError::ExpiryYear(expiry_year));
        }

        // Range-checked above.
        let month = expiry_month as u32;
        if is_expired(month, expiry_year, now) {
            return Err(ValidationError::CardExpired {
                month,
                year: expiry_year,
            });
        }

        if !CVV_LENGTH.contains(&cvv.len()) {
            return Err(ValidationError::CvvLength(cvv.len()));
        }
        if !is_digits(cvv) {
            return Err(ValidationError::CvvDigits);
        }

        Ok(Self {
            card_number: card_number.to_string(),
            expiry_month: month,
            expiry_year,
            cvv: cvv.to_string(),
        })
    }

    pub fn card_number(&self) -> &str {
        &self.card_number
    }

    pub fn expiry_month(&self) -> u32 {
        self.expiry_month
    }

    pub fn expiry_year(&self) -> i32 {
        self.expiry_year
    }

    pub fn cvv(&self) -> &str {
        &self.cvv
    }

    pub fn last_four(&self) -> &str {
        &self.card_number[self.card_number.len() - 4..]
    }

    /// Expiry formatted as `MM/YYYY`, the form the gateway expects.
    pub fn expiry_date(&self) -> String {
        format!("{:02}/{}", self.expiry_month, self.expiry_year)
    }
}

impl fmt::Debug for CreditCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreditCard")
            .field("card_number", &format_args!("**** {}", self.last_four()))
            .field("expiry_month", &self.expiry_month)
            .field("expiry_year", &self.expiry_year)
            .field("cvv", &"***")
            .finish()
    }
}

fn is_digits(value: &str) -> bool {
    value.bytes().all(|b| b.is_ascii_digit())
}

/// A card stays valid until the last instant of its expiry month.
fn is_expired(month: u32, year: i32, now: DateTime<Utc>) -> bool {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    match NaiveDate::from_ymd_opt(next_year, next_month, 1).and_then(|d| d.and_hms_opt(0, 0, 0)) {
        Some(end_of_validity) => now >= end_of_validity.and_utc(),
        None => true,
    }
}
