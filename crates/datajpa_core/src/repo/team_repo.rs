//! Team repository contract and SQLite implementation.
//!
//! # Invariants
//! - Deleting a team never cascades; it fails with `ConstraintViolation`
//!   while members still reference it.
//! - `find_members` is the only Team -> Members path and always reads the
//!   current member rows.

use crate::model::member::Member;
use crate::model::team::{Team, TeamId};
use crate::repo::member_repo::{parse_member_row, MEMBER_SELECT_SQL};
use crate::repo::{count_from_db, ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

/// Repository interface for team operations.
pub trait TeamRepository {
    /// Inserts an unsaved team (assigning its id) or upserts a saved one.
    fn save(&self, team: Team) -> RepoResult<Team>;
    fn find_by_id(&self, id: TeamId) -> RepoResult<Option<Team>>;
    fn find_all(&self) -> RepoResult<Vec<Team>>;
    fn count(&self) -> RepoResult<u64>;
    /// Removes the team if present. Unsaved or already-removed teams are a no-op.
    fn delete(&self, team: &Team) -> RepoResult<()>;
    /// Members currently referencing `team_id`, in identifier order.
    fn find_members(&self, team_id: TeamId) -> RepoResult<Vec<Member>>;
}

/// SQLite-backed team repository.
pub struct SqliteTeamRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTeamRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "teams", &["id", "name"])?;
        Ok(Self { conn })
    }
}

impl TeamRepository for SqliteTeamRepository<'_> {
    fn save(&self, team: Team) -> RepoResult<Team> {
        team.validate()?;

        let mut saved = team;
        match saved.id {
            None => {
                self.conn.execute(
                    "INSERT INTO teams (name) VALUES (?1);",
                    [saved.name.as_str()],
                )?;
                saved.id = Some(self.conn.last_insert_rowid());
            }
            Some(id) => {
                self.conn.execute(
                    "INSERT INTO teams (id, name) VALUES (?1, ?2)
                     ON CONFLICT (id) DO UPDATE SET name = excluded.name;",
                    params![id, saved.name.as_str()],
                )?;
            }
        }
        Ok(saved)
    }

    fn find_by_id(&self, id: TeamId) -> RepoResult<Option<Team>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM teams WHERE id = ?1;")?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_team_row(row)?));
        }
        Ok(None)
    }

    fn find_all(&self) -> RepoResult<Vec<Team>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM teams ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut teams = Vec::new();
        while let Some(row) = rows.next()? {
            teams.push(parse_team_row(row)?);
        }
        Ok(teams)
    }

    fn count(&self) -> RepoResult<u64> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM teams;", [], |row| row.get(0))?;
        count_from_db(total, "teams")
    }

    fn delete(&self, team: &Team) -> RepoResult<()> {
        let Some(id) = team.id else {
            return Ok(());
        };
        self.conn.execute("DELETE FROM teams WHERE id = ?1;", [id])?;
        Ok(())
    }

    fn find_members(&self, team_id: TeamId) -> RepoResult<Vec<Member>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEMBER_SELECT_SQL} WHERE team_id = ?1 ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([team_id])?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row)?);
        }
        Ok(members)
    }
}

fn parse_team_row(row: &Row<'_>) -> RepoResult<Team> {
    let id: TeamId = row.get("id")?;
    let team = Team {
        id: Some(id),
        name: row.get("name")?,
    };
    team
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("teams.id={id}: {err}")))?;
    Ok(team)
}
