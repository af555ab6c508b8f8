//! Core data-access logic for the member/team store.
//! This crate is the single source of truth for persistence invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::with_transaction;
pub use logging::{
    default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget,
};
pub use model::dto::{MemberDto, MemberWithTeam};
pub use model::member::{Member, MemberId, MemberValidationError};
pub use model::page::{Direction, MemberSortKey, Order, Page, PageRequest, ParseSortError, Sort};
pub use model::team::{Team, TeamId, TeamValidationError};
pub use repo::member_repo::{
    MemberFilter, MemberPredicate, MemberRepository, SqliteMemberRepository,
};
pub use repo::team_repo::{SqliteTeamRepository, TeamRepository};
pub use repo::{RepoError, RepoResult};
pub use service::member_service::{
    normalize_page_request, MemberService, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};

/// Service type wired to the SQLite repositories of one connection.
pub type SqliteMemberService<'conn> =
    MemberService<SqliteMemberRepository<'conn>, SqliteTeamRepository<'conn>>;

/// Builds the SQLite-backed service over `conn` (or a transaction on it).
pub fn sqlite_member_service(conn: &rusqlite::Connection) -> RepoResult<SqliteMemberService<'_>> {
    Ok(MemberService::new(
        SqliteMemberRepository::try_new(conn)?,
        SqliteTeamRepository::try_new(conn)?,
    ))
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
