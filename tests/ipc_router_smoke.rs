use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
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

fn seed_students(workspace: &Path, rows: &[(i64, &str, &str)]) {
    let conn = rusqlite::Connection::open(workspace.join("students.db")).expect("create db");
    conn.execute(
        "CREATE TABLE students(roll_no INTEGER, name TEXT, group_name TEXT)",
        [],
    )
    .expect("create table");
    for (roll, name, group) in rows {
        conn.execute(
            "INSERT INTO students(roll_no, name, group_name) VALUES(?, ?, ?)",
            (roll, name, group),
        )
        .expect("insert student");
    }
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_rollcalld");
    let mut child = Command::new(exe)
        .env_remove("ROLLCALL_WORKSPACE")
        .env_remove("ROLLCALL_FONT")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rollcalld");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn read_response(reader: &mut BufReader<ChildStdout>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response");
    serde_json::from_str(line.trim()).expect("parse response json")
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let value = read_response(reader);
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        assert_ne!(
            code, "not_implemented",
            "unexpected unknown method for {}",
            method
        );
    }
    value
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("rollcall-router-smoke");
    seed_students(&workspace, &[(1, "Aarav", "G1"), (2, "Bhavna", "G2")]);
    let out = workspace.join("smoke.pdf");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["result"]["workspacePath"], serde_json::Value::Null);
    let _ = request(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request(&mut stdin, &mut reader, "3", "roster.list", json!({}));
    let _ = request(&mut stdin, &mut reader, "4", "course.options", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "5",
        "attendance.reconcile",
        json!({ "rollNumbers": "1", "mode": "absentees" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "6",
        "reports.render",
        json!({ "variant": "plainList", "outPath": out.to_string_lossy() }),
    );

    let unknown = {
        writeln!(stdin, "{}", json!({ "id": "7", "method": "grades.list" })).expect("write");
        stdin.flush().expect("flush");
        read_response(&mut reader)
    };
    assert_eq!(unknown["ok"], false);
    assert_eq!(unknown["error"]["code"], "not_implemented");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn bad_json_line_does_not_stop_the_loop() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush");
    let bad = read_response(&mut reader);
    assert_eq!(bad["ok"], false);
    assert_eq!(bad["error"]["code"], "bad_json");

    let health = request(&mut stdin, &mut reader, "h", "health", json!({}));
    assert_eq!(health["ok"], true);
    assert_eq!(health["result"]["version"], env!("CARGO_PKG_VERSION"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn data_methods_require_a_workspace() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    for (i, method) in ["roster.list", "attendance.reconcile", "reports.render"]
        .iter()
        .enumerate()
    {
        let params = match *method {
            "attendance.reconcile" => json!({ "rollNumbers": "1", "mode": "present" }),
            "reports.render" => json!({ "variant": "plainList", "outPath": "/tmp/never.pdf" }),
            _ => json!({}),
        };
        let resp = request(&mut stdin, &mut reader, &i.to_string(), method, params);
        assert_eq!(resp["ok"], false, "{}", method);
        assert_eq!(resp["error"]["code"], "no_workspace", "{}", method);
    }

    let missing = request(
        &mut stdin,
        &mut reader,
        "ws",
        "workspace.select",
        json!({ "path": "/nonexistent/rollcall/workspace" }),
    );
    assert_eq!(missing["error"]["code"], "not_found");

    drop(stdin);
    let _ = child.wait();
}
