use works_core::{
    open_db_in_memory, ActivityRepository, ActivityType, ContentType, NewActivity, NewWork,
    RepoError, SqliteActivityRepository, SqliteTransactionRunner, SqliteWorkRepository,
    TransactionRunner, Work, WorkRepository,
};

fn runner() -> SqliteTransactionRunner {
    SqliteTransactionRunner::new(open_db_in_memory().unwrap())
}

fn new_work(title: &str) -> NewWork {
    NewWork {
        kind: ContentType::ByUrl,
        title: title.to_string(),
        description: "desc".to_string(),
        author_id: "author-1".to_string(),
        thumbnail_url: String::new(),
        content_url: "https://example.com/a".to_string(),
        version: 1,
    }
}

fn insert(runner: &SqliteTransactionRunner, title: &str) -> Work {
    runner
        .run(|uow| SqliteWorkRepository::new().create(uow, &new_work(title)))
        .unwrap()
}

#[test]
fn create_and_find_roundtrip() {
    let runner = runner();
    let repo = SqliteWorkRepository::new();

    let created = insert(&runner, "first");
    let loaded = runner
        .read(|conn| repo.find_by_id(conn, created.id))
        .unwrap();

    assert_eq!(loaded, created);
    assert_eq!(loaded.version, 1);
    assert_eq!(loaded.kind, ContentType::ByUrl);
    assert!(loaded.is_active());
    assert!(loaded.created_at > 0);
}

#[test]
fn save_overwrites_mutable_fields_but_keeps_author() {
    let runner = runner();
    let repo = SqliteWorkRepository::new();
    let mut work = insert(&runner, "draft");

    work.title = "final".to_string();
    work.version = 2;
    work.author_id = "someone-else".to_string();
    let saved = runner.run(|uow| repo.save(uow, &work)).unwrap();

    assert_eq!(saved.title, "final");
    assert_eq!(saved.version, 2);
    assert_eq!(saved.author_id, "author-1");
}

#[test]
fn create_rejects_invalid_row() {
    let runner = runner();
    let repo = SqliteWorkRepository::new();
    let invalid = new_work("   ");

    let err = runner.run(|uow| repo.create(uow, &invalid)).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[test]
fn deleted_rows_are_invisible_to_reads() {
    let runner = runner();
    let repo = SqliteWorkRepository::new();
    let kept = insert(&runner, "kept");
    let gone = insert(&runner, "gone");

    runner.run(|uow| repo.delete_by_id(uow, gone.id)).unwrap();

    let err = runner.read(|conn| repo.find_by_id(conn, gone.id)).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == gone.id));
    assert_eq!(runner.read(|conn| repo.count_all(conn)).unwrap(), 1);
    let listed = runner.read(|conn| repo.get_all(conn, 0, 10)).unwrap();
    assert_eq!(listed, vec![kept]);

    let again = runner.run(|uow| repo.delete_by_id(uow, gone.id)).unwrap_err();
    assert!(matches!(again, RepoError::NotFound(_)));
    let mut ghost = gone.clone();
    ghost.version = 2;
    let save_err = runner.run(|uow| repo.save(uow, &ghost)).unwrap_err();
    assert!(matches!(save_err, RepoError::NotFound(_)));
}

#[test]
fn get_all_pages_by_id() {
    let runner = runner();
    let repo = SqliteWorkRepository::new();
    let ids: Vec<_> = (0..5).map(|i| insert(&runner, &format!("w{i}")).id).collect();

    let page = runner.read(|conn| repo.get_all(conn, 1, 2)).unwrap();
    assert_eq!(
        page.iter().map(|work| work.id).collect::<Vec<_>>(),
        ids[1..3].to_vec()
    );
    assert_eq!(runner.read(|conn| repo.count_all(conn)).unwrap(), 5);
}

#[test]
fn activities_are_listed_newest_first_and_filtered_by_user() {
    let runner = runner();
    let activities = SqliteActivityRepository::new();
    let work = insert(&runner, "audited");

    runner
        .run(|uow| {
            activities.create(uow, &NewActivity::record(ActivityType::Added, "alice", &work))?;
            activities.create(uow, &NewActivity::record(ActivityType::Updated, "bob", &work))
        })
        .unwrap();

    let all = runner.read(|conn| activities.get_all(conn)).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].kind, ActivityType::Updated);
    assert_eq!(all[1].kind, ActivityType::Added);
    assert_eq!(all[1].work_title, "audited");

    let alice = runner
        .read(|conn| activities.find_by_user_id(conn, "alice"))
        .unwrap();
    assert_eq!(alice.len(), 1);
    assert_eq!(alice[0].work_id, work.id);
}

#[test]
fn activity_without_user_is_rejected() {
    let runner = runner();
    let activities = SqliteActivityRepository::new();
    let work = insert(&runner, "audited");

    let err = runner
        .run(|uow| activities.create(uow, &NewActivity::record(ActivityType::Added, " ", &work)))
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}
