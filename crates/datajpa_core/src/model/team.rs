//! Team (member group) model.

use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned team identifier.
pub type TeamId = i64;

/// Validation failures for team writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamValidationError {
    /// Name is empty or whitespace only.
    BlankName,
}

impl Display for TeamValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "team name must not be blank"),
        }
    }
}

impl Error for TeamValidationError {}

/// A named group that zero or more members may reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Team {
    pub(crate) id: Option<TeamId>,
    pub name: String,
}

impl Team {
    /// Creates an unsaved team.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    /// Identifier assigned by the first successful save.
    pub fn id(&self) -> Option<TeamId> {
        self.id
    }

    pub fn validate(&self) -> Result<(), TeamValidationError> {
        if self.name.trim().is_empty() {
            return Err(TeamValidationError::BlankName);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Team, TeamValidationError};

    #[test]
    fn validate_rejects_blank_name() {
        assert_eq!(Team::new(" \t").validate(), Err(TeamValidationError::BlankName));
        assert!(Team::new("teamA").validate().is_ok());
    }
}
