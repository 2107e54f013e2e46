mod attendance;
mod config;
mod course;
mod db;
mod error;
mod ipc;
mod report;
mod roster;

use log::{debug, warn};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

fn init_logging() {
    // stdout carries IPC responses; logs always go to stderr.
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("ROLLCALL_LOG", "warn"))
        .target(env_logger::Target::Stderr)
        .init();
}

fn main() {
    init_logging();
    let mut state = ipc::AppState::new();

    if let Some(ws) = std::env::var_os(config::ENV_WORKSPACE).map(PathBuf::from) {
        if let Err(e) = ipc::select_workspace(&mut state, &ws) {
            warn!(
                "ignoring {}={}: {:#}",
                config::ENV_WORKSPACE,
                ws.to_string_lossy(),
                e
            );
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                debug!("bad request line: {}", e);
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
