//! Input validation for new records.
//!
//! Forms arrive as raw text, the way a user typed them. Validation turns them into typed
//! [`NewCollection`] / [`NewEmi`] values or a [`Error::Validation`]; nothing reaches the
//! record store until validation has passed.

use crate::errors::{Error, Result};
use chrono::NaiveDate;

const DATE_FORMAT: &str = "%Y-%m-%d";
const COLLECTION_INVALID: &str = "Please enter a valid date and amount";
const EMI_INVALID: &str = "Please fill all fields correctly";

/// Raw input for a new collection.
#[derive(Debug, Clone, Default)]
pub struct CollectionForm {
    /// Calendar date as `YYYY-MM-DD`
    pub date: String,
    /// Amount as typed
    pub amount: String,
}

/// Raw input for a new EMI.
#[derive(Debug, Clone, Default)]
pub struct EmiForm {
    /// Lender or purpose
    pub name: String,
    /// Installment amount as typed
    pub amount: String,
    /// Day of month the installment is due
    pub due_day: String,
    /// First installment date as `YYYY-MM-DD`
    pub start_date: String,
    /// Total installment count
    pub total_months: String,
}

/// A validated collection ready to be written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewCollection {
    /// Calendar day of the collection
    pub date: NaiveDate,
    /// Positive amount
    pub amount: f64,
}

/// A validated EMI ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEmi {
    /// Non-empty, trimmed name
    pub name: String,
    /// Positive installment amount
    pub amount: f64,
    /// Due day in `1..=31`
    pub due_day: i32,
    /// First installment date
    pub start_date: NaiveDate,
    /// Positive installment count
    pub total_months: i32,
}

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).ok()
}

/// Parses a strictly positive, finite amount.
pub fn parse_amount(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite() && *amount > 0.0)
}

fn parse_positive_int(input: &str) -> Option<i32> {
    input.trim().parse::<i32>().ok().filter(|n| *n > 0)
}

impl CollectionForm {
    /// Builds a form from raw date and amount text.
    pub fn new(date: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            amount: amount.into(),
        }
    }

    /// Validates the form.
    ///
    /// # Errors
    /// [`Error::Validation`] when the date is missing or malformed, or the amount is not
    /// a number greater than zero.
    pub fn validate(&self) -> Result<NewCollection> {
        let date = parse_date(&self.date).ok_or_else(|| Error::validation(COLLECTION_INVALID))?;
        let amount =
            parse_amount(&self.amount).ok_or_else(|| Error::validation(COLLECTION_INVALID))?;
        Ok(NewCollection { date, amount })
    }
}

impl EmiForm {
    /// Validates the form.
    ///
    /// # Errors
    /// [`Error::Validation`] when any field is missing, the amount is not positive, the
    /// due day is outside `1..=31`, or the installment count is not positive.
    pub fn validate(&self) -> Result<NewEmi> {
        let invalid = || Error::validation(EMI_INVALID);

        let name = self.name.trim();
        if name.is_empty() {
            return Err(invalid());
        }
        let amount = parse_amount(&self.amount).ok_or_else(invalid)?;
        let due_day = parse_positive_int(&self.due_day)
            .filter(|day| *day <= 31)
            .ok_or_else(invalid)?;
        let start_date = parse_date(&self.start_date).ok_or_else(invalid)?;
        let total_months = parse_positive_int(&self.total_months).ok_or_else(invalid)?;

        Ok(NewEmi {
            name: name.to_string(),
            amount,
            due_day,
            start_date,
            total_months,
        })
    }
}
