//! Raster scan acquisition.

use log::{error, info};

use crate::controller::{MeasurementController, MotionController};
use crate::devices::{Sensor, StageActuator};
use crate::grid::ScanGrid;
use crate::observer::{AttemptKind, ScanObserver};

/// Result of one pass over the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Acquisition {
    pub raw: ScanGrid,
    /// Points left missing, whether the move or the measurement gave up.
    pub skipped_points: usize,
}

/// Visits every grid point: move, then measure. A point that cannot be
/// reached or read is left missing and the scan moves on.
#[derive(Debug)]
pub struct ScanOrchestrator<St, Se> {
    motion: MotionController<St>,
    measurement: MeasurementController<Se>,
}

impl<St: StageActuator, Se: Sensor> ScanOrchestrator<St, Se> {
    pub fn new(stage: St, sensor: Se, max_retries: usize) -> Self {
        Self::from_controllers(
            MotionController::new(stage, max_retries),
            MeasurementController::new(sensor, max_retries),
        )
    }

    pub fn from_controllers(
        motion: MotionController<St>,
        measurement: MeasurementController<Se>,
    ) -> Self {
        Self {
            motion,
            measurement,
        }
    }

    pub fn into_devices(self) -> (St, Se) {
        (self.motion.into_inner(), self.measurement.into_inner())
    }

    /// Fills `grid` in acquisition order (y outer, x inner). Cells start out
    /// missing, so only successful reads are written.
    pub fn acquire(&mut self, mut grid: ScanGrid, observer: &mut dyn ScanObserver) -> Acquisition {
        let mut skipped_points = 0;
        let points: Vec<_> = grid.points().collect();

        for (ix, iy, point) in points {
            if !self.motion.move_to(point, observer) {
                error!(
                    "Skipping point {} after {} move attempts",
                    point,
                    self.motion.max_retries()
                );
                observer.on_point_skipped(point, AttemptKind::Move);
                skipped_points += 1;
                continue;
            }

            match self.measurement.measure(point, observer) {
                Some(value) => grid.set(ix, iy, Some(value)),
                None => {
                    error!(
                        "Skipping point {} after {} measure attempts",
                        point,
                        self.measurement.max_retries()
                    );
                    observer.on_point_skipped(point, AttemptKind::Measure);
                    skipped_points += 1;
                }
            }
        }

        info!(
            "Acquired {} of {} points ({} skipped)",
            grid.len() - skipped_points,
            grid.len(),
            skipped_points
        );

        Acquisition {
            raw: grid,
            skipped_points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::DeviceError;
    use crate::grid::Point;
    use crate::observer::{AttemptLog, NullObserver};
    use crate::testing::{ScriptedSensor, ScriptedStage};

    fn grid(n: usize) -> ScanGrid {
        let axis: Vec<f64> = (0..n).map(|i| i as f64).collect();
        ScanGrid::empty(axis.clone(), axis)
    }

    #[test]
    fn reliable_devices_fill_every_cell() {
        let mut scan = ScanOrchestrator::new(
            ScriptedStage::always(true),
            ScriptedSensor::always(Ok(Some(2.0))),
            3,
        );
        let result = scan.acquire(grid(4), &mut NullObserver);

        assert_eq!(result.raw.len(), 16);
        assert_eq!(result.skipped_points, 0);
        assert!(result.raw.values().iter().all(|v| *v == Some(2.0)));

        let (stage, sensor) = scan.into_devices();
        assert_eq!(stage.calls, 16);
        assert_eq!(sensor.calls, 16);
    }

    #[test]
    fn stage_visits_points_in_row_major_order() {
        let mut scan = ScanOrchestrator::new(
            ScriptedStage::always(true),
            ScriptedSensor::always(Ok(Some(0.0))),
            1,
        );
        scan.acquire(grid(2), &mut NullObserver);

        let (stage, _) = scan.into_devices();
        assert_eq!(
            stage.reached,
            vec![
                Point::new(0.0, 0.0),
                Point::new(1.0, 0.0),
                Point::new(0.0, 1.0),
                Point::new(1.0, 1.0),
            ]
        );
    }

    #[test]
    fn unreached_point_is_never_measured() {
        // First point: all three moves fail. Every later move succeeds.
        let stage = ScriptedStage::scripted([false, false, false], true);
        let mut log = AttemptLog::new();
        let mut scan = ScanOrchestrator::new(stage, ScriptedSensor::always(Ok(Some(1.0))), 3);
        let result = scan.acquire(grid(2), &mut log);

        assert_eq!(result.raw.get(0, 0), None);
        assert_eq!(result.raw.missing_count(), 1);
        assert_eq!(result.skipped_points, 1);
        assert!(log
            .at(Point::new(0.0, 0.0))
            .all(|r| r.kind == AttemptKind::Move));
        assert_eq!(log.skipped(), &[(Point::new(0.0, 0.0), AttemptKind::Move)]);

        let (_, sensor) = scan.into_devices();
        assert_eq!(sensor.calls, 3);
    }

    #[test]
    fn failed_measurement_leaves_cell_missing_and_scan_continues() {
        let sensor = ScriptedSensor::scripted(
            [Ok(None), Err(DeviceError::ReadError)],
            Ok(Some(5.0)),
        );
        let mut scan = ScanOrchestrator::new(ScriptedStage::always(true), sensor, 2);
        let result = scan.acquire(grid(2), &mut NullObserver);

        assert_eq!(result.raw.get(0, 0), None);
        assert_eq!(result.raw.get(1, 0), Some(5.0));
        assert_eq!(result.raw.get(1, 1), Some(5.0));
        assert_eq!(result.skipped_points, 1);
    }

    #[test]
    fn always_failing_stage_yields_fully_missing_grid() {
        let mut scan = ScanOrchestrator::new(
            ScriptedStage::always(false),
            ScriptedSensor::always(Ok(Some(1.0))),
            2,
        );
        let result = scan.acquire(grid(3), &mut NullObserver);

        assert!(result.raw.is_all_missing());
        assert_eq!(result.skipped_points, 9);

        let (stage, sensor) = scan.into_devices();
        assert_eq!(stage.calls, 18);
        assert_eq!(sensor.calls, 0);
    }
}
