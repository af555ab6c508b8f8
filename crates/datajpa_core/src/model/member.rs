//! Member domain model.
//!
//! # Responsibility
//! - Define the stored member record and its optional team reference.
//! - Validate member fields before repositories write them.
//!
//! # Invariants
//! - `id` is `None` until the first save and is never reassigned afterwards.
//! - `team_id`, when set, must name an existing team; the storage engine
//!   enforces this with a foreign key.

use crate::model::team::TeamId;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned member identifier.
pub type MemberId = i64;

/// Validation failures for member writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberValidationError {
    /// Username is empty or whitespace only.
    BlankUsername,
    /// Age must not be negative.
    NegativeAge(i32),
}

impl Display for MemberValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankUsername => write!(f, "member username must not be blank"),
            Self::NegativeAge(age) => write!(f, "member age must not be negative, got {age}"),
        }
    }
}

impl Error for MemberValidationError {}

/// Stored member record.
///
/// Equality compares every field including the identifier, so a value read
/// back from the store equals the value returned by `save`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub(crate) id: Option<MemberId>,
    pub username: String,
    pub age: i32,
    /// Many-to-one reference; `None` means the member has no team.
    pub team_id: Option<TeamId>,
}

impl Member {
    /// Creates an unsaved member with age 0 and no team.
    pub fn new(username: impl Into<String>) -> Self {
        Self::with_age(username, 0)
    }

    /// Creates an unsaved member with the given age and no team.
    pub fn with_age(username: impl Into<String>, age: i32) -> Self {
        Self {
            id: None,
            username: username.into(),
            age,
            team_id: None,
        }
    }

    /// Creates an unsaved member that references `team_id`.
    pub fn with_team(username: impl Into<String>, age: i32, team_id: TeamId) -> Self {
        let mut member = Self::with_age(username, age);
        member.change_team(team_id);
        member
    }

    /// Identifier assigned by the first successful save.
    pub fn id(&self) -> Option<MemberId> {
        self.id
    }

    /// Moves this member to another team. Takes effect on the next save.
    pub fn change_team(&mut self, team_id: TeamId) {
        self.team_id = Some(team_id);
    }

    /// Clears the team reference. Takes effect on the next save.
    pub fn leave_team(&mut self) {
        self.team_id = None;
    }

    /// Checks field-level rules enforced on every write.
    pub fn validate(&self) -> Result<(), MemberValidationError> {
        if self.username.trim().is_empty() {
            return Err(MemberValidationError::BlankUsername);
        }
        if self.age < 0 {
            return Err(MemberValidationError::NegativeAge(self.age));
        }
        Ok(())
    }
}
