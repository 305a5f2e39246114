//! Bounded-retry wrappers around the stage and the sensor.
//!
//! Both controllers make up to `max_retries` attempts (the first one
//! included), retry immediately on failure and never let a device error
//! escape: the caller only sees `bool` / `Option<f64>`.

use log::{error, info, warn};

use crate::devices::{DeviceError, Sensor, StageActuator};
use crate::grid::Point;
use crate::observer::{AttemptKind, AttemptRecord, AttemptStatus, ScanObserver};

#[derive(Debug)]
pub struct MotionController<S> {
    stage: S,
    max_retries: usize,
}

impl<S: StageActuator> MotionController<S> {
    pub fn new(stage: S, max_retries: usize) -> Self {
        assert!(max_retries > 0, "max_retries must be at least 1");
        Self { stage, max_retries }
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    pub fn into_inner(self) -> S {
        self.stage
    }

    /// Returns `true` once the stage reports success, `false` after
    /// `max_retries` failed attempts.
    pub fn move_to(&mut self, target: Point, observer: &mut dyn ScanObserver) -> bool {
        for attempt in 1..=self.max_retries {
            match self.stage.move_to(target) {
                Ok(()) => {
                    info!("Move to {} succeeded on attempt {}", target, attempt);
                    observer.on_attempt(AttemptRecord {
                        point: target,
                        kind: AttemptKind::Move,
                        attempt,
                        status: AttemptStatus::Success { value: None },
                    });
                    return true;
                }
                Err(err) => {
                    warn!("Attempt {} failed: moving to {} - {}", attempt, target, err);
                    observer.on_attempt(AttemptRecord {
                        point: target,
                        kind: AttemptKind::Move,
                        attempt,
                        status: AttemptStatus::Failed {
                            reason: err.to_string(),
                        },
                    });
                }
            }
        }

        error!(
            "Failed to move to {} after {} attempts",
            target, self.max_retries
        );
        false
    }
}

/// Why a single measurement attempt did not produce a value.
#[derive(Debug)]
enum ReadFailure {
    Device(DeviceError),
    Empty,
    NonFinite(f64),
}

impl std::fmt::Display for ReadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadFailure::Device(err) => write!(f, "{}", err),
            ReadFailure::Empty => write!(f, "Received no value from sensor reading"),
            ReadFailure::NonFinite(v) => write!(f, "Received non-finite sensor reading {}", v),
        }
    }
}

#[derive(Debug)]
pub struct MeasurementController<S> {
    sensor: S,
    max_retries: usize,
}

impl<S: Sensor> MeasurementController<S> {
    pub fn new(sensor: S, max_retries: usize) -> Self {
        assert!(max_retries > 0, "max_retries must be at least 1");
        Self {
            sensor,
            max_retries,
        }
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn into_inner(self) -> S {
        self.sensor
    }

    /// Returns the first finite reading, or `None` after `max_retries`
    /// attempts. Errors, empty readings and non-finite values all count as
    /// failed attempts. `at` only labels the log records.
    pub fn measure(&mut self, at: Point, observer: &mut dyn ScanObserver) -> Option<f64> {
        for attempt in 1..=self.max_retries {
            let failure = match self.sensor.measure() {
                Ok(Some(value)) if value.is_finite() => {
                    info!(
                        "Measure at {} succeeded on attempt {}: {:.3}",
                        at, attempt, value
                    );
                    observer.on_attempt(AttemptRecord {
                        point: at,
                        kind: AttemptKind::Measure,
                        attempt,
                        status: AttemptStatus::Success { value: Some(value) },
                    });
                    return Some(value);
                }
                Ok(Some(value)) => ReadFailure::NonFinite(value),
                Ok(None) => ReadFailure::Empty,
                Err(err) => ReadFailure::Device(err),
            };

            warn!(
                "Failed to measure at {} on attempt {}: {}",
                at, attempt, failure
            );
            observer.on_attempt(AttemptRecord {
                point: at,
                kind: AttemptKind::Measure,
                attempt,
                status: AttemptStatus::Failed {
                    reason: failure.to_string(),
                },
            });
        }

        error!(
            "Failed to measure at {} after all {} attempts",
            at, self.max_retries
        );
        None
    }
}
