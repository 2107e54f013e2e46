use crate::error::AppError;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

pub const STUDENTS_QUERY: &str = "SELECT roll_no, name, group_name FROM students";

/// Opens the student database without ever creating it.
pub fn open_read_only(db_path: &Path) -> Result<Connection, AppError> {
    let unavailable = |message: String| AppError::StorageUnavailable {
        path: db_path.to_string_lossy().to_string(),
        message,
    };
    if !db_path.is_file() {
        return Err(unavailable("database file not found".to_string()));
    }
    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| unavailable(e.to_string()))?;
    // Opening is lazy in SQLite; touch the schema so a corrupt or non-sqlite
    // file is reported as a connection failure, not a query failure.
    conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |r| {
        r.get::<_, i64>(0)
    })
    .map_err(|e| unavailable(e.to_string()))?;
    Ok(conn)
}

/// NULL names or groups read as empty text; a NULL roll number is an error.
pub fn select_students(conn: &Connection) -> Result<Vec<(i64, String, String)>, AppError> {
    let mut stmt = conn.prepare(STUDENTS_QUERY)?;
    let rows = stmt
        .query_map([], |r| {
            let name: Option<String> = r.get(1)?;
            let group_name: Option<String> = r.get(2)?;
            Ok((
                r.get(0)?,
                name.unwrap_or_default(),
                group_name.unwrap_or_default(),
            ))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> PathBuf {
        let p = std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&p).expect("create temp dir");
        p
    }

    #[test]
    fn open_does_not_create_missing_file() {
        let ws = temp_dir("rollcall-db-missing");
        let path = ws.join("students.db");
        let e = open_read_only(&path).expect_err("missing db");
        assert_eq!(e.code(), "storage_unavailable");
        assert!(!path.exists());
    }

    #[test]
    fn garbage_file_is_storage_unavailable() {
        let ws = temp_dir("rollcall-db-garbage");
        let path = ws.join("students.db");
        std::fs::write(&path, b"this is not a database, just some text padding it out")
            .expect("write");
        let e = open_read_only(&path).expect_err("not sqlite");
        assert_eq!(e.code(), "storage_unavailable");
    }

    #[test]
    fn missing_table_is_query_failure() {
        let ws = temp_dir("rollcall-db-notable");
        let path = ws.join("students.db");
        let conn = Connection::open(&path).expect("create");
        conn.execute("CREATE TABLE other(x INTEGER)", [])
            .expect("create table");
        drop(conn);

        let conn = open_read_only(&path).expect("open");
        let e = select_students(&conn).expect_err("no students table");
        assert_eq!(e.code(), "query_failed");
    }

    #[test]
    fn null_name_or_group_reads_as_empty() {
        let ws = temp_dir("rollcall-db-nulls");
        let path = ws.join("students.db");
        let conn = Connection::open(&path).expect("create");
        conn.execute_batch(
            "CREATE TABLE students(roll_no INTEGER, name TEXT, group_name TEXT);
             INSERT INTO students VALUES (1, 'Asha', NULL);
             INSERT INTO students VALUES (2, NULL, 'G2');
             INSERT INTO students VALUES (3, 'Ravi', 'G1');",
        )
        .expect("seed");
        drop(conn);

        let conn = open_read_only(&path).expect("open");
        let rows = select_students(&conn).expect("rows");
        assert_eq!(
            rows,
            vec![
                (1, "Asha".to_string(), String::new()),
                (2, String::new(), "G2".to_string()),
                (3, "Ravi".to_string(), "G1".to_string()),
            ]
        );
    }
}
