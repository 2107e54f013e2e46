use crate::db;
use crate::error::AppError;
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub roll_no: i64,
    pub name: String,
    pub group_name: String,
}

/// Students in storage retrieval order. Roll numbers are unique and positive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    students: Vec<StudentRecord>,
}

impl Roster {
    pub fn new(students: Vec<StudentRecord>) -> Result<Roster, AppError> {
        let mut seen = HashSet::with_capacity(students.len());
        for s in &students {
            if s.roll_no <= 0 {
                return Err(AppError::QueryFailed(format!(
                    "roll number must be positive, got {}",
                    s.roll_no
                )));
            }
            if !seen.insert(s.roll_no) {
                return Err(AppError::QueryFailed(format!(
                    "duplicate roll number {}",
                    s.roll_no
                )));
            }
        }
        Ok(Roster { students })
    }

    pub fn students(&self) -> &[StudentRecord] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn roll_numbers(&self) -> impl Iterator<Item = i64> + '_ {
        self.students.iter().map(|s| s.roll_no)
    }
}

#[derive(Debug)]
pub struct RosterLoad {
    pub roster: Roster,
    pub diagnostic: Option<AppError>,
}

/// Strict read: one connection, one query, released before returning.
pub fn read(db_path: &Path) -> Result<Roster, AppError> {
    let conn = db::open_read_only(db_path)?;
    let rows = db::select_students(&conn)?;
    drop(conn);

    let students = rows
        .into_iter()
        .map(|(roll_no, name, group_name)| StudentRecord {
            roll_no,
            name,
            group_name,
        })
        .collect();
    let roster = Roster::new(students)?;
    debug!(
        "loaded {} students from {}",
        roster.len(),
        db_path.to_string_lossy()
    );
    Ok(roster)
}

/// Degrading read: storage problems become an empty roster plus a diagnostic.
pub fn load(db_path: &Path) -> RosterLoad {
    match read(db_path) {
        Ok(roster) => RosterLoad {
            roster,
            diagnostic: None,
        },
        Err(e) => {
            warn!("roster unavailable: {}", e);
            RosterLoad {
                roster: Roster::default(),
                diagnostic: Some(e),
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn sample(rows: &[(i64, &str, &str)]) -> Roster {
    Roster::new(
        rows.iter()
            .map(|(r, n, g)| StudentRecord {
                roll_no: *r,
                name: n.to_string(),
                group_name: g.to_string(),
            })
            .collect(),
    )
    .expect("valid sample roster")
}
