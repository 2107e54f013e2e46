use crate::error::AppError;
use crate::roster::Roster;
use log::warn;
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMode {
    AbsenteesEntered,
    PresentEntered,
}

impl EntryMode {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryMode::AbsenteesEntered => "absentees",
            EntryMode::PresentEntered => "present",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntryMode::AbsenteesEntered => "Enter Absentees",
            EntryMode::PresentEntered => "Enter Present",
        }
    }

    pub fn parse(raw: &str) -> Option<EntryMode> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "absentees" | "absent" | "absenteesentered" => Some(EntryMode::AbsenteesEntered),
            "present" | "presententered" => Some(EntryMode::PresentEntered),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Present,
    Absent,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Present => "Present",
            Status::Absent => "Absent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceMark {
    pub roll_no: i64,
    pub status: Status,
}

/// Advisory conditions; they never stop a reconcile or render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    UnknownRollNumbers(Vec<i64>),
    /// Digit runs too large to be a roll number, as typed.
    OutOfRangeRollNumbers(Vec<String>),
}

impl Warning {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Warning::UnknownRollNumbers(rolls) => json!({
                "code": "unknown_roll_numbers",
                "message": format!(
                    "roll numbers not in roster were ignored: {}",
                    rolls.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", ")
                ),
                "rollNumbers": rolls,
            }),
            Warning::OutOfRangeRollNumbers(runs) => json!({
                "code": "out_of_range_roll_numbers",
                "message": format!(
                    "numbers too large to be roll numbers were ignored: {}",
                    runs.join(", ")
                ),
                "entries": runs,
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// One mark per roster member, in roster order.
    pub marks: Vec<AttendanceMark>,
    pub unknown_rolls: BTreeSet<i64>,
    pub out_of_range: Vec<String>,
}

impl Reconciliation {
    pub fn status_of(&self, roll_no: i64) -> Option<Status> {
        self.marks
            .iter()
            .find(|m| m.roll_no == roll_no)
            .map(|m| m.status)
    }

    pub fn present_count(&self) -> usize {
        self.marks
            .iter()
            .filter(|m| m.status == Status::Present)
            .count()
    }

    pub fn absent_count(&self) -> usize {
        self.marks.len() - self.present_count()
    }

    pub fn warnings(&self) -> Vec<Warning> {
        let mut out = Vec::new();
        if !self.unknown_rolls.is_empty() {
            out.push(Warning::UnknownRollNumbers(
                self.unknown_rolls.iter().copied().collect(),
            ));
        }
        if !self.out_of_range.is_empty() {
            out.push(Warning::OutOfRangeRollNumbers(self.out_of_range.clone()));
        }
        out
    }
}

/// Result of scanning free-text roll entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollScan {
    pub rolls: BTreeSet<i64>,
    /// Digit runs that do not fit an `i64`, deduplicated, in input order.
    pub out_of_range: Vec<String>,
}

/// Every maximal run of ASCII digits, parsed as a roll number. Anything else
/// separates.
pub fn extract_rolls(raw: &str) -> RollScan {
    let mut scan = RollScan::default();
    for run in raw.split(|c: char| !c.is_ascii_digit()).filter(|r| !r.is_empty()) {
        match run.parse::<i64>() {
            Ok(v) => {
                scan.rolls.insert(v);
            }
            Err(_) => {
                warn!("dropping roll number out of range: {}", run);
                if !scan.out_of_range.iter().any(|r| r == run) {
                    scan.out_of_range.push(run.to_string());
                }
            }
        }
    }
    scan
}

pub fn reconcile(
    roster: &Roster,
    raw_input: &str,
    mode: EntryMode,
) -> Result<Reconciliation, AppError> {
    if raw_input.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "enter at least one roll number".to_string(),
        ));
    }
    if roster.is_empty() {
        return Ok(Reconciliation::default());
    }
    let RollScan {
        rolls: input_rolls,
        out_of_range,
    } = extract_rolls(raw_input);
    if input_rolls.is_empty() {
        let message = if out_of_range.is_empty() {
            "no roll numbers found in input".to_string()
        } else {
            format!("numbers out of range: {}", out_of_range.join(", "))
        };
        return Err(AppError::InvalidInput(message));
    }
    let known: HashSet<i64> = roster.roll_numbers().collect();
    let unknown_rolls: BTreeSet<i64> = input_rolls
        .iter()
        .copied()
        .filter(|r| !known.contains(r))
        .collect();
    let applicable: HashSet<i64> = input_rolls
        .iter()
        .copied()
        .filter(|r| known.contains(r))
        .collect();

    let marks = roster
        .roll_numbers()
        .map(|roll_no| {
            let entered = applicable.contains(&roll_no);
            let status = match (mode, entered) {
                (EntryMode::AbsenteesEntered, true) | (EntryMode::PresentEntered, false) => {
                    Status::Absent
                }
                (EntryMode::AbsenteesEntered, false) | (EntryMode::PresentEntered, true) => {
                    Status::Present
                }
            };
            AttendanceMark { roll_no, status }
        })
        .collect();

    if !unknown_rolls.is_empty() {
        warn!("ignoring roll numbers not in roster: {:?}", unknown_rolls);
    }
    Ok(Reconciliation {
        marks,
        unknown_rolls,
        out_of_range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::sample;

    fn abc() -> Roster {
        sample(&[(1, "A", "G1"), (2, "B", "G1"), (3, "C", "G2")])
    }

    fn statuses(r: &Reconciliation) -> Vec<(i64, Status)> {
        r.marks.iter().map(|m| (m.roll_no, m.status)).collect()
    }

    #[test]
    fn extract_ignores_separator_style() {
        let expected: BTreeSet<i64> = [3, 12, 40].into_iter().collect();
        assert_eq!(extract_rolls("3,12,40").rolls, expected);
        assert_eq!(extract_rolls("3 12\n40").rolls, expected);
        assert_eq!(extract_rolls(" 40;\t3 ,, 12\r\n12 ").rolls, expected);
        assert_eq!(extract_rolls("#3/12-40.").rolls, expected);
    }

    #[test]
    fn extract_collapses_duplicates_and_drops_overflow() {
        let got = extract_rolls("7, 7, 07, 99999999999999999999999");
        assert_eq!(got.rolls.into_iter().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn extract_keeps_oversized_runs_as_typed() {
        let scan = extract_rolls("4, 99999999999999999999, 4 99999999999999999999");
        assert_eq!(scan.rolls.into_iter().collect::<Vec<_>>(), vec![4]);
        assert_eq!(scan.out_of_range, vec!["99999999999999999999".to_string()]);
    }

    #[test]
    fn only_oversized_numbers_is_invalid_input() {
        for mode in [EntryMode::AbsenteesEntered, EntryMode::PresentEntered] {
            let e = reconcile(&abc(), "99999999999999999999", mode).expect_err("overflow");
            assert_eq!(e.code(), "invalid_input");
            assert!(e.to_string().contains("99999999999999999999"), "{}", e);
        }
    }

    #[test]
    fn oversized_numbers_surface_as_warning() {
        let r = reconcile(&abc(), "2 99999999999999999999", EntryMode::AbsenteesEntered)
            .expect("reconcile");
        assert_eq!(r.absent_count(), 1);
        assert_eq!(
            r.warnings(),
            vec![Warning::OutOfRangeRollNumbers(vec![
                "99999999999999999999".to_string()
            ])]
        );
        assert_eq!(
            r.warnings()[0].to_json()["code"],
            "out_of_range_roll_numbers"
        );
    }

    #[test]
    fn absentees_mode_example() {
        let r = reconcile(&abc(), "1, 3", EntryMode::AbsenteesEntered).expect("reconcile");
        assert_eq!(
            statuses(&r),
            vec![(1, Status::Absent), (2, Status::Present), (3, Status::Absent)]
        );
        assert!(r.unknown_rolls.is_empty());
        assert!(r.warnings().is_empty());
        assert_eq!(r.present_count(), 1);
        assert_eq!(r.absent_count(), 2);
    }

    #[test]
    fn present_mode_reports_unknown() {
        let r = reconcile(&abc(), "5 2", EntryMode::PresentEntered).expect("reconcile");
        assert_eq!(r.unknown_rolls.iter().copied().collect::<Vec<_>>(), vec![5]);
        assert_eq!(
            statuses(&r),
            vec![(1, Status::Absent), (2, Status::Present), (3, Status::Absent)]
        );
        assert_eq!(r.warnings(), vec![Warning::UnknownRollNumbers(vec![5])]);
        assert_eq!(r.status_of(5), None);
    }

    #[test]
    fn modes_are_complements() {
        let roster = sample(&[
            (10, "A", "G1"),
            (11, "B", "G1"),
            (12, "C", "G2"),
            (13, "D", "G2"),
            (14, "E", "G3"),
        ]);
        for input in ["10 12", "11,13,14,99", "14", "10 11 12 13 14"] {
            let a = reconcile(&roster, input, EntryMode::AbsenteesEntered).expect("a");
            let p = reconcile(&roster, input, EntryMode::PresentEntered).expect("p");
            assert_eq!(a.marks.len(), roster.len());
            assert_eq!(p.marks.len(), roster.len());
            for (ma, mp) in a.marks.iter().zip(p.marks.iter()) {
                assert_eq!(ma.roll_no, mp.roll_no);
                assert_ne!(ma.status, mp.status, "roll {} input {:?}", ma.roll_no, input);
            }
            assert_eq!(a.present_count(), p.absent_count());
            assert_eq!(a.unknown_rolls, p.unknown_rolls);
        }
    }

    #[test]
    fn unknown_rolls_sorted_and_inert() {
        let r = reconcile(&abc(), "42, 2, 17, 8", EntryMode::AbsenteesEntered).expect("r");
        assert_eq!(
            r.unknown_rolls.iter().copied().collect::<Vec<_>>(),
            vec![8, 17, 42]
        );
        assert_eq!(r.absent_count(), 1);
        assert_eq!(r.status_of(2), Some(Status::Absent));
    }

    #[test]
    fn empty_input_rejected_before_marking() {
        for raw in ["", "   ", "\n\t"] {
            let e = reconcile(&abc(), raw, EntryMode::AbsenteesEntered).expect_err("empty");
            assert_eq!(e.code(), "invalid_input");
        }
        let e = reconcile(&abc(), "none, nobody", EntryMode::PresentEntered)
            .expect_err("no digits");
        assert_eq!(e.code(), "invalid_input");
    }

    #[test]
    fn empty_roster_yields_nothing() {
        let r = reconcile(&Roster::default(), "1 2 3", EntryMode::PresentEntered)
            .expect("empty roster");
        assert!(r.marks.is_empty());
        assert!(r.unknown_rolls.is_empty());
    }

    #[test]
    fn mode_parse_accepts_ui_values() {
        assert_eq!(EntryMode::parse("absentees"), Some(EntryMode::AbsenteesEntered));
        assert_eq!(EntryMode::parse(" Present "), Some(EntryMode::PresentEntered));
        assert_eq!(EntryMode::parse("late"), None);
    }
}
