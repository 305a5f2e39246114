//! Attempt-level observability.
//!
//! Controllers and the orchestrator report every device attempt to a
//! [`ScanObserver`] passed in by the caller. [`AttemptLog`] keeps the full
//! history for the end-of-run report; [`NullObserver`] drops it.

use std::fmt;

use strum_macros::Display;

use crate::grid::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum AttemptKind {
    #[strum(serialize = "Move")]
    Move,
    #[strum(serialize = "Measure")]
    Measure,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptStatus {
    /// `value` is the reading for measurements, `None` for moves.
    Success { value: Option<f64> },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub point: Point,
    pub kind: AttemptKind,
    /// 1-based attempt number.
    pub attempt: usize,
    pub status: AttemptStatus,
}

impl AttemptRecord {
    pub fn is_success(&self) -> bool {
        matches!(self.status, AttemptStatus::Success { .. })
    }
}

impl fmt::Display for AttemptRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = format!("{}:", self.kind);
        write!(
            f,
            "{:<8} x={:.2}, y={:.2}, attempt={}, ",
            label, self.point.x, self.point.y, self.attempt
        )?;
        match &self.status {
            AttemptStatus::Success { value: Some(value) } => {
                write!(f, "status=success, value={:.3}", value)
            }
            AttemptStatus::Success { value: None } => write!(f, "status=success"),
            AttemptStatus::Failed { reason } => write!(f, "status=fail, reason={}", reason),
        }
    }
}

pub trait ScanObserver {
    fn on_attempt(&mut self, record: AttemptRecord);

    /// Called once per point that ends up missing, after `kind` ran out of
    /// attempts.
    fn on_point_skipped(&mut self, point: Point, kind: AttemptKind) {
        let _ = (point, kind);
    }
}

impl<T: ScanObserver + ?Sized> ScanObserver for &mut T {
    fn on_attempt(&mut self, record: AttemptRecord) {
        (**self).on_attempt(record)
    }

    fn on_point_skipped(&mut self, point: Point, kind: AttemptKind) {
        (**self).on_point_skipped(point, kind)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ScanObserver for NullObserver {
    fn on_attempt(&mut self, _record: AttemptRecord) {}
}

/// Full history of a run's device attempts.
#[derive(Debug, Default, Clone)]
pub struct AttemptLog {
    records: Vec<AttemptRecord>,
    skipped: Vec<(Point, AttemptKind)>,
}

impl AttemptLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[AttemptRecord] {
        &self.records
    }

    pub fn skipped(&self) -> &[(Point, AttemptKind)] {
        &self.skipped
    }

    pub fn count(&self, kind: AttemptKind) -> usize {
        self.records.iter().filter(|r| r.kind == kind).count()
    }

    pub fn failures(&self, kind: AttemptKind) -> usize {
        self.records
            .iter()
            .filter(|r| r.kind == kind && !r.is_success())
            .count()
    }

    /// Attempts made at one point, in order.
    pub fn at(&self, point: Point) -> impl Iterator<Item = &AttemptRecord> + '_ {
        self.records.iter().filter(move |r| r.point == point)
    }

    /// Human readable report: one line per attempt, then totals.
    pub fn report(&self) -> String {
        let mut out = String::from("--- Full Scan Attempt Log ---\n");
        for record in &self.records {
            out.push_str(&record.to_string());
            out.push('\n');
        }
        out.push_str(&format!(
            "Moves: {} attempts, {} failed. Measurements: {} attempts, {} failed. Skipped points: {}\n",
            self.count(AttemptKind::Move),
            self.failures(AttemptKind::Move),
            self.count(AttemptKind::Measure),
            self.failures(AttemptKind::Measure),
            self.skipped.len()
        ));
        out
    }
}

impl ScanObserver for AttemptLog {
    fn on_attempt(&mut self, record: AttemptRecord) {
        self.records.push(record);
    }

    fn on_point_skipped(&mut self, point: Point, kind: AttemptKind) {
        self.skipped.push((point, kind));
    }
}
