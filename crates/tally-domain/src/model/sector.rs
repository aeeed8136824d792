//! Sector - One countable area of the venue
//!
//! Sector is an Entity: its identity is assigned by the gateway when it
//! is created and never changes, even when the name or manager do.
//!
//! The store never originates a sector. Everything here describes either
//! a sector the gateway already holds, or a request to change one.

/// Unique identifier for a Sector (assigned by the gateway)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectorId(String);

impl SectorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for SectorId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sector - A venue subdivision with a manager and an attendee count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sector {
    /// Gateway-assigned identity
    id: SectorId,
    /// Display label
    name: String,
    /// Person responsible for counting
    manager: String,
    /// Absent (or zero) means "not yet counted"
    attendee_count: Option<u64>,
}

impl Sector {
    /// Create a Sector as read from the gateway
    pub fn new(id: SectorId, name: impl Into<String>, manager: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            manager: manager.into(),
            attendee_count: None,
        }
    }

    /// Builder: set the attendee count
    pub fn with_attendee_count(mut self, count: Option<u64>) -> Self {
        self.attendee_count = count;
        self
    }

    // ========== Getters ==========

    pub fn id(&self) -> &SectorId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn manager(&self) -> &str {
        &self.manager
    }

    pub fn attendee_count(&self) -> Option<u64> {
        self.attendee_count
    }

    /// Attendees with "not yet counted" read as 0
    pub fn attendees(&self) -> u64 {
        self.attendee_count.unwrap_or(0)
    }

    /// Whether a positive count has been recorded
    pub fn is_counted(&self) -> bool {
        self.attendees() > 0
    }
}

/// Fields required to create a sector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSector {
    name: String,
    manager: String,
}

impl NewSector {
    /// Validate and build a creation request.
    ///
    /// Both fields must be non-blank.
    pub fn new(
        name: impl Into<String>,
        manager: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let manager = manager.into();
        require_non_blank("name", &name)?;
        require_non_blank("manager", &manager)?;
        Ok(Self { name, manager })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn manager(&self) -> &str {
        &self.manager
    }
}

/// Partial update of a sector. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectorPatch {
    pub name: Option<String>,
    pub manager: Option<String>,
    pub attendee_count: Option<u64>,
}

impl SectorPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_manager(mut self, manager: impl Into<String>) -> Self {
        self.manager = Some(manager.into());
        self
    }

    pub fn with_attendee_count(mut self, count: u64) -> Self {
        self.attendee_count = Some(count);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.manager.is_none() && self.attendee_count.is_none()
    }

    /// Apply the same constraints as [`NewSector::new`] to every provided field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyPatch);
        }
        if let Some(name) = &self.name {
            require_non_blank("name", name)?;
        }
        if let Some(manager) = &self.manager {
            require_non_blank("manager", manager)?;
        }
        Ok(())
    }
}

fn require_non_blank(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyField { field })
    } else {
        Ok(())
    }
}

/// Coerce free-text attendance input into a count.
///
/// This is the input layer's job, not the store's: anything that is not a
/// finite non-negative number becomes 0, and fractions are truncated.
pub fn coerce_attendance_input(raw: &str) -> u64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value.trunc() as u64,
        _ => 0,
    }
}

/// Errors raised when caller-supplied sector fields break local constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field was blank
    EmptyField { field: &'static str },
    /// An update carried no fields at all
    EmptyPatch,
}

impl core::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ValidationError::EmptyField { field } => {
                write!(f, "Field '{}' must not be empty", field)
            }
            ValidationError::EmptyPatch => write!(f, "Update contains no fields"),
        }
    }
}

impl std::error::Error for ValidationError {}
