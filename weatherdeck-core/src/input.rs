//! Search box and date picker behaviour shared by front ends.

use chrono::NaiveDate;

use crate::{error::InputError, model::Mode};

/// Text field feeding [`crate::QueryController::submit_query`].
#[derive(Debug, Clone, Default)]
pub struct SearchBox {
    text: String,
}

impl SearchBox {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Returns the trimmed query and clears the field. Blank input is
    /// ignored and left in place.
    pub fn submit(&mut self) -> Option<String> {
        let query = self.text.trim();
        if query.is_empty() {
            return None;
        }

        let query = query.to_string();
        self.text.clear();
        Some(query)
    }
}

/// The date picker is only shown on the historical tab.
pub fn date_picker_visible(mode: Mode) -> bool {
    mode == Mode::Historical
}

/// Date input whose latest selectable day is `max` (today).
#[derive(Debug, Clone, Copy)]
pub struct DatePicker {
    max: NaiveDate,
}

impl DatePicker {
    pub fn new(max: NaiveDate) -> Self {
        Self { max }
    }

    pub fn max(&self) -> NaiveDate {
        self.max
    }

    pub fn pick(&self, date: NaiveDate) -> Result<NaiveDate, InputError> {
        if date > self.max {
            return Err(InputError::FutureDate { date, max: self.max });
        }
        Ok(date)
    }

    /// Parse a `YYYY-MM-DD` entry and validate it.
    pub fn parse(&self, value: &str) -> Result<NaiveDate, InputError> {
        let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .map_err(|_| InputError::InvalidDate(value.trim().to_string()))?;
        self.pick(date)
    }
}
