//! Member use-case service.
//!
//! # Responsibility
//! - Provide the lookup/listing use-cases served over HTTP.
//! - Own page-request normalization defaults.
//! - Seed demo data and run bulk updates with diagnostic logging.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - A missing member is reported as `Ok(None)`; callers choose the reaction.
//! - Callers supply the transaction; every method here is one unit of work
//!   only when run inside `db::with_transaction`.

use crate::model::dto::{MemberDto, MemberWithTeam};
use crate::model::member::{Member, MemberId};
use crate::model::page::{Page, PageRequest, Sort};
use crate::model::team::{Team, TeamId};
use crate::repo::member_repo::{MemberFilter, MemberRepository};
use crate::repo::team_repo::TeamRepository;
use crate::repo::{RepoError, RepoResult};
use log::{info, warn};
use std::collections::HashMap;

/// Page size used when the caller does not supply a usable one.
pub const DEFAULT_PAGE_SIZE: u32 = 5;
/// Upper bound applied to caller-supplied page sizes.
pub const MAX_PAGE_SIZE: u32 = 2000;

/// Use-case service over member and team repositories.
pub struct MemberService<M: MemberRepository, T: TeamRepository> {
    members: M,
    teams: T,
}

impl<M: MemberRepository, T: TeamRepository> MemberService<M, T> {
    /// Creates a service using the provided repository implementations.
    pub fn new(members: M, teams: T) -> Self {
        Self { members, teams }
    }

    pub fn save_member(&self, member: Member) -> RepoResult<Member> {
        self.members.save(member)
    }

    pub fn find_member(&self, id: MemberId) -> RepoResult<Option<Member>> {
        self.members.find_by_id(id)
    }

    /// Username lookup behind `GET /members/{id}`.
    pub fn find_username(&self, id: MemberId) -> RepoResult<Option<String>> {
        Ok(self.find_member(id)?.map(|member| member.username))
    }

    /// Unfiltered listing behind `GET /members`.
    pub fn list_members(&self, request: &PageRequest) -> RepoResult<Page<Member>> {
        if !request.is_valid() {
            warn!(
                "event=member_list module=service status=invalid_request page={} size={}",
                request.page, request.size
            );
        }
        self.members.find_all_page(request)
    }

    /// Same page as `list_members`, projected to DTOs with team names.
    pub fn list_member_dtos(&self, request: &PageRequest) -> RepoResult<Page<MemberDto>> {
        let page = self.list_members(request)?;

        let mut team_names: HashMap<TeamId, String> = HashMap::new();
        for team_id in page.content().iter().filter_map(|member| member.team_id) {
            if team_names.contains_key(&team_id) {
                continue;
            }
            if let Some(team) = self.teams.find_by_id(team_id)? {
                team_names.insert(team_id, team.name);
            }
        }

        page.try_map(|member| -> RepoResult<MemberDto> {
            let id = member.id().ok_or_else(|| {
                RepoError::InvalidData("listed member has no identifier".to_string())
            })?;
            Ok(MemberDto {
                id,
                team_name: member
                    .team_id
                    .and_then(|team_id| team_names.get(&team_id).cloned()),
                username: member.username,
            })
        })
    }

    /// Members of exactly `age`, paged.
    pub fn members_by_age(&self, age: i32, request: &PageRequest) -> RepoResult<Page<Member>> {
        self.members
            .find_page(&MemberFilter::all().age_eq(age), request)
    }

    /// Members named `username` and older than `age`.
    pub fn members_by_username_older_than(
        &self,
        username: &str,
        age: i32,
    ) -> RepoResult<Vec<Member>> {
        self.members.find_by_filter(
            &MemberFilter::all().username_eq(username).age_gt(age),
            &Sort::unsorted(),
        )
    }

    pub fn members_with_team(&self) -> RepoResult<Vec<MemberWithTeam>> {
        self.members.find_with_team()
    }

    pub fn create_team(&self, name: impl Into<String>) -> RepoResult<Team> {
        self.teams.save(Team::new(name))
    }

    /// Current members of a team; empty when the team has none or is unknown.
    pub fn team_members(&self, team_id: TeamId) -> RepoResult<Vec<Member>> {
        self.teams.find_members(team_id)
    }

    pub fn count_members(&self) -> RepoResult<u64> {
        self.members.count()
    }

    /// Inserts `user{i}` aged `i` for `i in 0..count` when no members exist.
    ///
    /// Returns the number of inserted members (0 when data already existed).
    pub fn seed_members_if_empty(&self, count: u32) -> RepoResult<u32> {
        let existing = self.members.count()?;
        if existing > 0 {
            info!(
                "event=member_seed module=service status=skipped existing={}",
                existing
            );
            return Ok(0);
        }

        for index in 0..count {
            let age = i32::try_from(index).map_err(|_| {
                RepoError::InvalidData(format!("seed index {index} does not fit an age"))
            })?;
            self.members
                .save(Member::with_age(format!("user{index}"), age))?;
        }

        info!(
            "event=member_seed module=service status=ok inserted={}",
            count
        );
        Ok(count)
    }

    /// Adds one to the age of every member aged `threshold` or older.
    ///
    /// Values previously returned by this service are stale afterwards.
    pub fn bulk_age_plus(&self, threshold: i32) -> RepoResult<usize> {
        let affected = self.members.bulk_age_plus(threshold)?;
        info!(
            "event=member_bulk_age_plus module=service status=ok threshold={} affected={}",
            threshold, affected
        );
        Ok(affected)
    }
}

/// Builds a page request from raw, possibly out-of-range HTTP inputs.
///
/// Rules:
/// - missing or negative `page` -> 0
/// - missing or non-positive `size` -> `DEFAULT_PAGE_SIZE`
/// - `size` above `MAX_PAGE_SIZE` -> `MAX_PAGE_SIZE`
pub fn normalize_page_request(page: Option<i64>, size: Option<i64>, sort: Sort) -> PageRequest {
    let page = page
        .filter(|value| *value > 0)
        .map_or(0, |value| u32::try_from(value).unwrap_or(u32::MAX));
    let size = match size {
        Some(value) if value <= 0 => DEFAULT_PAGE_SIZE,
        Some(value) if value > i64::from(MAX_PAGE_SIZE) => MAX_PAGE_SIZE,
        Some(value) => u32::try_from(value).unwrap_or(MAX_PAGE_SIZE),
        None => DEFAULT_PAGE_SIZE,
    };
    PageRequest::of_sorted(page, size, sort)
}

#[cfg(test)]
mod tests {
    use super::{normalize_page_request, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
    use crate::model::page::Sort;

    #[test]
    fn page_request_defaults_apply_to_missing_values() {
        let request = normalize_page_request(None, None, Sort::unsorted());
        assert_eq!(request.page, 0);
        assert_eq!(request.size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn page_request_clamps_out_of_range_values() {
        let request = normalize_page_request(Some(-3), Some(0), Sort::unsorted());
        assert_eq!(request.page, 0);
        assert_eq!(request.size, DEFAULT_PAGE_SIZE);

        let capped = normalize_page_request(Some(2), Some(1_000_000), Sort::unsorted());
        assert_eq!(capped.page, 2);
        assert_eq!(capped.size, MAX_PAGE_SIZE);
    }
}
