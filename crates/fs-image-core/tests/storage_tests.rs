use fs_image_core::storage::models::ScanParameter;
use fs_image_core::storage::schema;
use fs_image_core::storage::{NewFile, StorageGate};
use fs_image_core::{platform, Error, Scanner, SilentReporter};
use std::collections::HashSet;
use std::fs;
use tempfile::tempdir;

fn root_params(root: &str) -> Vec<ScanParameter> {
    vec![ScanParameter {
        name: platform::root_parameter_key().to_string(),
        value: root.to_string(),
    }]
}

fn image_gate(batch_size: usize) -> StorageGate {
    let mut gate = StorageGate::in_memory().with_batch_size(batch_size);
    schema::declare_image_tables(&mut gate, true);
    gate.open().unwrap();
    gate
}

#[test]
fn test_open_creates_all_image_tables() {
    let gate = image_gate(100);
    for table in ["Folder", "FileEntry", "FileHash", "ScanParameter", "History"] {
        assert_eq!(gate.count_rows(table).unwrap(), 0, "table {}", table);
    }
}

#[test]
fn test_reopen_accepts_matching_schema() {
    let db_dir = tempdir().unwrap();
    let db_path = db_dir.path().join("image.sqlite");
    let db_path = db_path.to_str().unwrap();

    {
        let mut gate = StorageGate::new(db_path);
        schema::declare_image_tables(&mut gate, true);
        gate.open().unwrap();
        gate.close().unwrap();
    }

    // With definitions: compared case-insensitively and accepted.
    let mut gate = StorageGate::new(db_path);
    schema::declare_image_tables(&mut gate, true);
    gate.open().unwrap();

    // Without definitions: existing tables are accepted as they are.
    let mut gate = StorageGate::new(db_path);
    schema::declare_image_tables(&mut gate, false);
    gate.open().unwrap();
}

#[test]
fn test_schema_mismatch_is_fatal() {
    let db_dir = tempdir().unwrap();
    let db_path = db_dir.path().join("foreign.sqlite");

    let conn = rusqlite::Connection::open(&db_path).unwrap();
    conn.execute_batch("create table Folder (id integer, path text)")
        .unwrap();
    drop(conn);

    let mut gate = StorageGate::new(db_path.to_str().unwrap());
    schema::declare_image_tables(&mut gate, true);
    match gate.open() {
        Err(Error::SchemaMismatch { table, actual, .. }) => {
            assert_eq!(table, "Folder");
            assert_eq!(actual.to_lowercase(), "create table folder (id integer, path text)");
        }
        other => panic!("expected schema mismatch, got {:?}", other.err()),
    }
    drop(gate);

    let mut gate = StorageGate::new(db_path.to_str().unwrap());
    gate.open().unwrap();
    let history = gate.history().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].event, "error");
    assert!(history[0].message.starts_with("schema mismatch"));
}

#[test]
fn test_schema_mismatch_in_existing_image_is_traced() {
    let db_dir = tempdir().unwrap();
    let db_path = db_dir.path().join("altered.sqlite");
    let db_path = db_path.to_str().unwrap();

    {
        let mut gate = StorageGate::new(db_path);
        schema::declare_image_tables(&mut gate, true);
        gate.open().unwrap();
        gate.trace("create-image-start", "root=[/x/]");
        gate.execute("drop table FileHash", &[]).unwrap();
        gate.execute("create table FileHash (fileId integer, hash text)", &[])
            .unwrap();
    }

    let mut gate = StorageGate::new(db_path);
    schema::declare_image_tables(&mut gate, true);
    assert!(matches!(
        gate.open(),
        Err(Error::SchemaMismatch { table, .. }) if table == "FileHash"
    ));

    let events: Vec<String> = gate.history().unwrap().into_iter().map(|e| e.event).collect();
    assert_eq!(events, vec!["create-image-start", "error"]);
}

#[test]
fn test_case_only_schema_difference_is_accepted() {
    let db_dir = tempdir().unwrap();
    let db_path = db_dir.path().join("upper.sqlite");

    let conn = rusqlite::Connection::open(&db_path).unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE History ({})",
        schema::HISTORY_COLUMNS.to_uppercase()
    ))
    .unwrap();
    drop(conn);

    let mut gate = StorageGate::new(db_path.to_str().unwrap());
    gate.open().unwrap();
}

#[test]
fn test_folder_batches_at_boundaries() {
    for count in [99usize, 100, 101, 250] {
        let gate = image_gate(100);
        let paths: Vec<String> = (0..count).map(|i| format!("/dir{:04}/", i)).collect();
        assert_eq!(gate.insert_folders(&paths).unwrap(), count);

        let stored: HashSet<String> = gate
            .folders()
            .unwrap()
            .into_iter()
            .map(|f| f.path)
            .collect();
        assert_eq!(stored.len(), count, "batch of {}", count);
        assert_eq!(stored, paths.into_iter().collect::<HashSet<_>>());
    }
}

#[test]
fn test_file_batches_at_boundaries() {
    for count in [99usize, 100, 101] {
        let gate = image_gate(100);
        gate.insert_folder_if_missing("/").unwrap();
        let folder_id = gate.folder_id("/").unwrap().unwrap();

        let files: Vec<NewFile> = (0..count)
            .map(|i| NewFile {
                name: format!("f{}.bin", i),
                size: i as i64,
                create_time: "2011-06-02 10:00:00".to_string(),
                write_time: "2011-06-02 10:00:00".to_string(),
            })
            .collect();
        assert_eq!(gate.insert_files(folder_id, &files).unwrap(), count);

        let stored = gate.files().unwrap();
        assert_eq!(stored.len(), count);
        assert!(stored.iter().all(|f| f.folder_id == folder_id));
        let total: i64 = stored.iter().map(|f| f.size).sum();
        assert_eq!(total, (0..count as i64).sum::<i64>());
    }
}

#[test]
fn test_failed_batch_stops_insert() {
    let gate = image_gate(2);
    gate.insert_folders(&["/taken/".to_string()]).unwrap();

    // unique path: the second batch collides and aborts the call
    let paths = vec![
        "/a/".to_string(),
        "/b/".to_string(),
        "/taken/".to_string(),
        "/c/".to_string(),
        "/d/".to_string(),
    ];
    assert!(matches!(gate.insert_folders(&paths), Err(Error::Database(_))));

    let stored: Vec<String> = gate.folders().unwrap().into_iter().map(|f| f.path).collect();
    assert_eq!(stored, vec!["/taken/", "/a/", "/b/"]);
}

#[test]
fn test_scan_of_250_subdirectories() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("wide");
    for i in 0..250 {
        fs::create_dir_all(root.join(format!("sub{:03}", i))).unwrap();
    }

    let mut scanner = Scanner::new(StorageGate::in_memory());
    let summary = scanner
        .create_image(&root_params(root.to_str().unwrap()), &SilentReporter)
        .unwrap();

    assert_eq!(summary.dirs_found, 251);
    assert_eq!(summary.dirs_scanned, 251);

    let folders = scanner.gate().folders().unwrap();
    assert_eq!(folders.len(), 251);
    let unique: HashSet<&str> = folders.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(unique.len(), 251);
    assert!(unique.contains("/sub000/"));
    assert!(unique.contains("/sub249/"));
    assert!(folders.iter().all(|f| f.scan_time.is_some()));
}
