use datajpa_core::db::migrations::latest_version;
use datajpa_core::db::open_db_in_memory;
use datajpa_core::{
    Direction, Member, MemberFilter, MemberRepository, MemberSortKey, RepoError, Sort,
    SqliteMemberRepository, SqliteTeamRepository, Team, TeamRepository,
};
use rusqlite::Connection;

#[test]
fn save_then_find_by_id_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let saved = repo.save(Member::new("memberA")).unwrap();
    let id = saved.id().expect("save assigns an id");

    let found = repo.find_by_id(id).unwrap().unwrap();
    assert_eq!(found.id(), saved.id());
    assert_eq!(found.username, "memberA");
    assert_eq!(found, saved);
}

#[test]
fn find_by_id_returns_none_for_unknown_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    assert!(repo.find_by_id(4242).unwrap().is_none());
}

#[test]
fn basic_crud_counts_follow_saves_and_deletes() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let member1 = repo.save(Member::new("Member1")).unwrap();
    let member2 = repo.save(Member::new("Member2")).unwrap();

    assert_eq!(
        repo.find_by_id(member1.id().unwrap()).unwrap().as_ref(),
        Some(&member1)
    );
    assert_eq!(
        repo.find_by_id(member2.id().unwrap()).unwrap().as_ref(),
        Some(&member2)
    );

    let all = repo.find_all().unwrap();
    assert_eq!(all, vec![member1.clone(), member2.clone()]);
    assert_eq!(repo.count().unwrap(), 2);

    repo.delete(&member1).unwrap();
    repo.delete(&member2).unwrap();
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn deleting_missing_member_is_a_no_op() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let kept = repo.save(Member::new("kept")).unwrap();
    let removed = repo.save(Member::new("removed")).unwrap();
    repo.delete(&removed).unwrap();

    repo.delete(&removed).unwrap();
    repo.delete(&Member::new("never saved")).unwrap();
    assert!(!repo.delete_by_id(removed.id().unwrap()).unwrap());

    assert_eq!(repo.count().unwrap(), 1);
    assert!(repo.find_by_id(kept.id().unwrap()).unwrap().is_some());
}

#[test]
fn save_with_existing_id_updates_in_place() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut member = repo.save(Member::with_age("draft", 10)).unwrap();
    let id = member.id();
    member.username = "renamed".to_string();
    member.age = 11;

    let updated = repo.save(member).unwrap();
    assert_eq!(updated.id(), id);
    assert_eq!(repo.count().unwrap(), 1);

    let loaded = repo.find_by_id(id.unwrap()).unwrap().unwrap();
    assert_eq!(loaded.username, "renamed");
    assert_eq!(loaded.age, 11);
}

#[test]
fn resaving_deleted_member_restores_same_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let member = repo.save(Member::with_age("phoenix", 30)).unwrap();
    repo.delete(&member).unwrap();

    let restored = repo.save(member.clone()).unwrap();
    assert_eq!(restored.id(), member.id());
    assert_eq!(
        repo.find_by_id(member.id().unwrap()).unwrap(),
        Some(member)
    );
}

#[test]
fn identifiers_are_not_reused_after_delete() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let first = repo.save(Member::new("first")).unwrap();
    repo.delete(&first).unwrap();
    let second = repo.save(Member::new("second")).unwrap();

    assert_ne!(first.id(), second.id());
}

#[test]
fn validation_failure_blocks_save() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let err = repo.save(Member::with_age("  ", 1)).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let err = repo.save(Member::with_age("young", -5)).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn dangling_team_reference_is_a_constraint_violation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let err = repo.save(Member::with_team("orphan", 10, 999)).unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)));
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn find_by_username_and_age_greater_than() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    repo.save(Member::with_age("AAA", 10)).unwrap();
    let m2 = repo.save(Member::with_age("AAA", 20)).unwrap();

    let result = repo
        .find_by_filter(
            &MemberFilter::all().username_eq("AAA").age_gt(15),
            &Sort::unsorted(),
        )
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].username, "AAA");
    assert_eq!(result[0].age, 20);
    assert_eq!(result[0], m2);
}

#[test]
fn find_by_exact_username_and_age() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let m1 = repo.save(Member::with_age("AAA", 10)).unwrap();
    repo.save(Member::with_age("BBB", 20)).unwrap();

    let result = repo
        .find_by_filter(
            &MemberFilter::all().username_eq("AAA").age_eq(10),
            &Sort::unsorted(),
        )
        .unwrap();
    assert_eq!(result, vec![m1]);
}

#[test]
fn find_by_filter_honours_sort_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    for (name, age) in [("c", 30), ("a", 10), ("b", 20), ("d", 5)] {
        repo.save(Member::with_age(name, age)).unwrap();
    }

    let result = repo
        .find_by_filter(
            &MemberFilter::all().age_gte(10).age_lt(30),
            &Sort::by(Direction::Desc, MemberSortKey::Age),
        )
        .unwrap();
    let names: Vec<_> = result.iter().map(|m| m.username.as_str()).collect();
    assert_eq!(names, vec!["b", "a"]);
}

#[test]
fn find_usernames_lists_every_member() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    repo.save(Member::with_age("AAA", 10)).unwrap();
    repo.save(Member::with_age("BBB", 20)).unwrap();

    assert_eq!(
        repo.find_usernames().unwrap(),
        vec!["AAA".to_string(), "BBB".to_string()]
    );
}

#[test]
fn member_dto_projection_joins_team_name() {
    let conn = open_db_in_memory().unwrap();
    let teams = SqliteTeamRepository::try_new(&conn).unwrap();
    let members = SqliteMemberRepository::try_new(&conn).unwrap();

    let team_a = teams.save(Team::new("teamA")).unwrap();
    let m1 = members
        .save(Member::with_team("AAA", 10, team_a.id().unwrap()))
        .unwrap();
    members.save(Member::with_age("no team", 30)).unwrap();

    let dtos = members.find_member_dtos().unwrap();
    assert_eq!(dtos.len(), 1);
    assert_eq!(dtos[0].id, m1.id().unwrap());
    assert_eq!(dtos[0].username, "AAA");
    assert_eq!(dtos[0].team_name.as_deref(), Some("teamA"));
}

#[test]
fn fetch_join_loads_team_with_each_member() {
    let conn = open_db_in_memory().unwrap();
    let teams = SqliteTeamRepository::try_new(&conn).unwrap();
    let members = SqliteMemberRepository::try_new(&conn).unwrap();

    let team_a = teams.save(Team::new("teamA")).unwrap();
    let team_b = teams.save(Team::new("teamB")).unwrap();
    members
        .save(Member::with_team("member1", 10, team_a.id().unwrap()))
        .unwrap();
    members
        .save(Member::with_team("member2", 20, team_b.id().unwrap()))
        .unwrap();

    let loaded = members.find_with_team().unwrap();
    let pairs: Vec<_> = loaded
        .iter()
        .map(|row| (row.member.username.as_str(), row.team.name.as_str()))
        .collect();
    assert_eq!(pairs, vec![("member1", "teamA"), ("member2", "teamB")]);
    assert_eq!(loaded[0].team, team_a);
    assert_eq!(loaded[1].team, team_b);
}

#[test]
fn team_members_is_a_derived_view() {
    let conn = open_db_in_memory().unwrap();
    let teams = SqliteTeamRepository::try_new(&conn).unwrap();
    let members = SqliteMemberRepository::try_new(&conn).unwrap();

    let team_a = teams.save(Team::new("teamA")).unwrap();
    let team_b = teams.save(Team::new("teamB")).unwrap();
    let mut mover = members
        .save(Member::with_team("mover", 10, team_a.id().unwrap()))
        .unwrap();
    members
        .save(Member::with_team("stayer", 11, team_a.id().unwrap()))
        .unwrap();

    assert_eq!(teams.find_members(team_a.id().unwrap()).unwrap().len(), 2);

    mover.change_team(team_b.id().unwrap());
    members.save(mover.clone()).unwrap();

    assert_eq!(teams.find_members(team_a.id().unwrap()).unwrap().len(), 1);
    assert_eq!(
        teams.find_members(team_b.id().unwrap()).unwrap(),
        vec![mover]
    );
}

#[test]
fn team_crud_and_no_cascading_delete() {
    let conn = open_db_in_memory().unwrap();
    let teams = SqliteTeamRepository::try_new(&conn).unwrap();
    let members = SqliteMemberRepository::try_new(&conn).unwrap();

    let team = teams.save(Team::new("teamA")).unwrap();
    let member = members
        .save(Member::with_team("member1", 10, team.id().unwrap()))
        .unwrap();
    assert_eq!(teams.count().unwrap(), 1);
    assert_eq!(teams.find_all().unwrap(), vec![team.clone()]);

    let err = teams.delete(&team).unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)));
    assert_eq!(teams.count().unwrap(), 1);

    members.delete(&member).unwrap();
    teams.delete(&team).unwrap();
    teams.delete(&team).unwrap();
    assert_eq!(teams.count().unwrap(), 0);
    assert!(teams.find_by_id(team.id().unwrap()).unwrap().is_none());
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteMemberRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE members (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL,
            age INTEGER NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteMemberRepository::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "members",
            column: "team_id"
        })
    ));
    assert!(matches!(
        SqliteTeamRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("teams"))
    ));
}

#[test]
fn invalid_persisted_row_is_rejected_on_read() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO members (username, age) VALUES ('   ', 1);",
        [],
    )
    .unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    assert!(matches!(
        repo.find_all().unwrap_err(),
        RepoError::InvalidData(_)
    ));
}

#[test]
fn blank_team_name_is_rejected_on_write_and_read() {
    let conn = open_db_in_memory().unwrap();
    let teams = SqliteTeamRepository::try_new(&conn).unwrap();

    let err = teams.save(Team::new("   ")).unwrap_err();
    assert!(matches!(err, RepoError::InvalidTeam(_)));
    assert_eq!(teams.count().unwrap(), 0);

    conn.execute("INSERT INTO teams (name) VALUES ('');", [])
        .unwrap();
    assert!(matches!(
        teams.find_all().unwrap_err(),
        RepoError::InvalidData(_)
    ));
}
