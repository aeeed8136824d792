//! EventConfig - When counting is permitted
//!
//! A singleton value object. It is replaced wholesale on every save and
//! reset to empty strings, never deleted.

/// Event date and time as entered by the administrator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventConfig {
    /// Calendar date, `YYYY-MM-DD`
    date: String,
    /// Time of day, `HH:MM`
    time: String,
}

impl EventConfig {
    pub fn new(date: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
        }
    }

    /// The value written by a full reset
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn time(&self) -> &str {
        &self.time
    }

    /// Both fields are present. Anything else is "unconfigured".
    pub fn is_configured(&self) -> bool {
        !self.date.trim().is_empty() && !self.time.trim().is_empty()
    }
}
