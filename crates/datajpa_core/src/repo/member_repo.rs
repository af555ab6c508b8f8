//! Member repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide save/lookup/delete/count over the `members` table.
//! - Provide filtered, sorted and paginated listings driven by an explicit
//!   `MemberFilter` value.
//! - Provide scalar, DTO and fetch-join projections.
//!
//! # Invariants
//! - `save` assigns the identifier exactly once, on first insert.
//! - Listing order is fully determined by the requested sort plus an
//!   `id ASC` tie-breaker.
//! - `bulk_age_plus` is one UPDATE statement; its return value is the
//!   number of rows that statement changed.

use crate::model::dto::{MemberDto, MemberWithTeam};
use crate::model::member::{Member, MemberId};
use crate::model::page::{Page, PageRequest, Sort};
use crate::model::team::{Team, TeamId};
use crate::repo::{count_from_db, ensure_connection_ready, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

pub(crate) const MEMBER_SELECT_SQL: &str = "SELECT
    id,
    username,
    age,
    team_id
FROM members";

const MEMBER_COLUMNS: &[&str] = &["id", "username", "age", "team_id"];

/// One comparison applied to a member attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberPredicate {
    UsernameEquals(String),
    AgeEquals(i32),
    AgeGreaterThan(i32),
    AgeGreaterOrEqual(i32),
    AgeLessThan(i32),
    TeamEquals(TeamId),
}

/// Conjunction of predicates. An empty filter matches every member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberFilter {
    predicates: Vec<MemberPredicate>,
}

impl MemberFilter {
    /// Filter that matches every member.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with(mut self, predicate: MemberPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn username_eq(self, username: impl Into<String>) -> Self {
        self.with(MemberPredicate::UsernameEquals(username.into()))
    }

    pub fn age_eq(self, age: i32) -> Self {
        self.with(MemberPredicate::AgeEquals(age))
    }

    pub fn age_gt(self, age: i32) -> Self {
        self.with(MemberPredicate::AgeGreaterThan(age))
    }

    pub fn age_gte(self, age: i32) -> Self {
        self.with(MemberPredicate::AgeGreaterOrEqual(age))
    }

    pub fn age_lt(self, age: i32) -> Self {
        self.with(MemberPredicate::AgeLessThan(age))
    }

    pub fn team_eq(self, team_id: TeamId) -> Self {
        self.with(MemberPredicate::TeamEquals(team_id))
    }

    pub fn predicates(&self) -> &[MemberPredicate] {
        &self.predicates
    }

    /// Renders ` WHERE ...` (or an empty string) plus positional binds.
    fn where_clause(&self) -> (String, Vec<Value>) {
        if self.predicates.is_empty() {
            return (String::new(), Vec::new());
        }

        let mut terms = Vec::with_capacity(self.predicates.len());
        let mut bind_values = Vec::with_capacity(self.predicates.len());
        for predicate in &self.predicates {
            let (term, value) = match predicate {
                MemberPredicate::UsernameEquals(username) => {
                    ("username = ?", Value::Text(username.clone()))
                }
                MemberPredicate::AgeEquals(age) => ("age = ?", Value::Integer(i64::from(*age))),
                MemberPredicate::AgeGreaterThan(age) => {
                    ("age > ?", Value::Integer(i64::from(*age)))
                }
                MemberPredicate::AgeGreaterOrEqual(age) => {
                    ("age >= ?", Value::Integer(i64::from(*age)))
                }
                MemberPredicate::AgeLessThan(age) => ("age < ?", Value::Integer(i64::from(*age))),
                MemberPredicate::TeamEquals(team_id) => ("team_id = ?", Value::Integer(*team_id)),
            };
            terms.push(term);
            bind_values.push(value);
        }

        (format!(" WHERE {}", terms.join(" AND ")), bind_values)
    }
}

/// Repository interface for member operations.
pub trait MemberRepository {
    /// Inserts an unsaved member (assigning its id) or upserts a saved one.
    fn save(&self, member: Member) -> RepoResult<Member>;
    fn find_by_id(&self, id: MemberId) -> RepoResult<Option<Member>>;
    /// Lists all members in identifier (insertion) order.
    fn find_all(&self) -> RepoResult<Vec<Member>>;
    /// Lists every member matching `filter`, ordered by `sort`.
    fn find_by_filter(&self, filter: &MemberFilter, sort: &Sort) -> RepoResult<Vec<Member>>;
    /// Returns one page of members matching `filter`.
    fn find_page(&self, filter: &MemberFilter, request: &PageRequest) -> RepoResult<Page<Member>>;
    /// Returns one page over all members.
    fn find_all_page(&self, request: &PageRequest) -> RepoResult<Page<Member>> {
        self.find_page(&MemberFilter::all(), request)
    }
    /// Usernames of all members in identifier order.
    fn find_usernames(&self) -> RepoResult<Vec<String>>;
    /// DTO projection of members that belong to a team.
    fn find_member_dtos(&self) -> RepoResult<Vec<MemberDto>>;
    /// Members that belong to a team, loaded together with that team.
    fn find_with_team(&self) -> RepoResult<Vec<MemberWithTeam>>;
    /// Removes the member if present. Unsaved or already-removed members are a no-op.
    fn delete(&self, member: &Member) -> RepoResult<()>;
    /// Removes by id; returns whether a row was removed.
    fn delete_by_id(&self, id: MemberId) -> RepoResult<bool>;
    fn count(&self) -> RepoResult<u64>;
    /// Adds one to the age of every member aged `threshold` or older.
    ///
    /// Member values loaded before this call keep their old age. If any age
    /// would leave the `i32` range the statement fails with
    /// `ConstraintViolation` and no row changes.
    fn bulk_age_plus(&self, threshold: i32) -> RepoResult<usize>;
}

/// SQLite-backed member repository.
pub struct SqliteMemberRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMemberRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "members", MEMBER_COLUMNS)?;
        Ok(Self { conn })
    }

    fn query_members(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Member>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row)?);
        }
        Ok(members)
    }
}

impl MemberRepository for SqliteMemberRepository<'_> {
    fn save(&self, member: Member) -> RepoResult<Member> {
        member.validate()?;

        let mut saved = member;
        match saved.id {
            None => {
                self.conn.execute(
                    "INSERT INTO members (username, age, team_id) VALUES (?1, ?2, ?3);",
                    params![saved.username.as_str(), saved.age, saved.team_id],
                )?;
                saved.id = Some(self.conn.last_insert_rowid());
            }
            Some(id) => {
                self.conn.execute(
                    "INSERT INTO members (id, username, age, team_id)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT (id) DO UPDATE SET
                        username = excluded.username,
                        age = excluded.age,
                        team_id = excluded.team_id;",
                    params![id, saved.username.as_str(), saved.age, saved.team_id],
                )?;
            }
        }

        Ok(saved)
    }

    fn find_by_id(&self, id: MemberId) -> RepoResult<Option<Member>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEMBER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_member_row(row)?));
        }
        Ok(None)
    }

    fn find_all(&self) -> RepoResult<Vec<Member>> {
        self.query_members(&format!("{MEMBER_SELECT_SQL} ORDER BY id ASC;"), Vec::new())
    }

    fn find_by_filter(&self, filter: &MemberFilter, sort: &Sort) -> RepoResult<Vec<Member>> {
        let (where_sql, bind_values) = filter.where_clause();
        let sql = format!(
            "{MEMBER_SELECT_SQL}{where_sql} ORDER BY {};",
            sort.to_sql()
        );
        self.query_members(&sql, bind_values)
    }

    fn find_page(&self, filter: &MemberFilter, request: &PageRequest) -> RepoResult<Page<Member>> {
        if !request.is_valid() {
            return Ok(Page::empty(request));
        }

        let (where_sql, mut bind_values) = filter.where_clause();
        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM members{where_sql};"),
            params_from_iter(bind_values.iter()),
            |row| row.get(0),
        )?;
        let total_elements = count_from_db(total, "members")?;

        if request.offset() >= total_elements {
            return Ok(Page::new(Vec::new(), request, total_elements));
        }
        let offset = i64::try_from(request.offset()).map_err(|_| {
            RepoError::InvalidData(format!("page offset {} out of range", request.offset()))
        })?;

        let sql = format!(
            "{MEMBER_SELECT_SQL}{where_sql} ORDER BY {} LIMIT ? OFFSET ?;",
            request.sort.to_sql()
        );
        bind_values.push(Value::Integer(i64::from(request.size)));
        bind_values.push(Value::Integer(offset));
        let content = self.query_members(&sql, bind_values)?;

        Ok(Page::new(content, request, total_elements))
    }

    fn find_usernames(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT username FROM members ORDER BY id ASC;")?;
        let usernames = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(usernames)
    }

    fn find_member_dtos(&self) -> RepoResult<Vec<MemberDto>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                m.id AS id,
                m.username AS username,
                t.name AS team_name
             FROM members m
             INNER JOIN teams t ON t.id = m.team_id
             ORDER BY m.id ASC;",
        )?;
        let dtos = stmt
            .query_map([], |row| {
                Ok(MemberDto {
                    id: row.get("id")?,
                    username: row.get("username")?,
                    team_name: Some(row.get("team_name")?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(dtos)
    }

    fn find_with_team(&self) -> RepoResult<Vec<MemberWithTeam>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                m.id AS id,
                m.username AS username,
                m.age AS age,
                m.team_id AS team_id,
                t.name AS team_name
             FROM members m
             INNER JOIN teams t ON t.id = m.team_id
             ORDER BY m.id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let member = parse_member_row(row)?;
            let team = Team {
                id: member.team_id,
                name: row.get("team_name")?,
            };
            result.push(MemberWithTeam { member, team });
        }
        Ok(result)
    }

    fn delete(&self, member: &Member) -> RepoResult<()> {
        if let Some(id) = member.id {
            self.delete_by_id(id)?;
        }
        Ok(())
    }

    fn delete_by_id(&self, id: MemberId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM members WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn count(&self) -> RepoResult<u64> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM members;", [], |row| row.get(0))?;
        count_from_db(total, "members")
    }

    fn bulk_age_plus(&self, threshold: i32) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE members SET age = age + 1 WHERE age >= ?1;",
            [threshold],
        )?;
        Ok(changed)
    }
}

pub(crate) fn parse_member_row(row: &Row<'_>) -> RepoResult<Member> {
    let id: MemberId = row.get("id")?;
    let member = Member {
        id: Some(id),
        username: row.get("username")?,
        age: row.get("age")?,
        team_id: row.get("team_id")?,
    };
    member
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("members.id={id}: {err}")))?;
    Ok(member)
}
