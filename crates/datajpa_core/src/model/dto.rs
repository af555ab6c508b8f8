//! Read-only projections built from members and their teams.

use crate::model::member::{Member, MemberId};
use crate::model::team::Team;
use serde::Serialize;

/// Flat member view carrying the team name instead of the team id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDto {
    pub id: MemberId,
    pub username: String,
    pub team_name: Option<String>,
}

impl MemberDto {
    /// Projects a persisted member. Returns `None` for an unsaved member,
    /// which has no identifier to expose.
    pub fn from_member(member: &Member, team: Option<&Team>) -> Option<Self> {
        Some(Self {
            id: member.id()?,
            username: member.username.clone(),
            team_name: team.map(|team| team.name.clone()),
        })
    }
}

/// Member loaded together with its team in one explicit join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberWithTeam {
    pub member: Member,
    pub team: Team,
}
