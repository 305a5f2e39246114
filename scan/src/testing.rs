//! Scripted device doubles for unit tests.

use std::collections::VecDeque;

use crate::devices::{DeviceError, DeviceResult, Sensor, StageActuator};
use crate::grid::Point;

/// Stage that plays back a script of outcomes, then repeats `fallback`.
#[derive(Debug)]
pub struct ScriptedStage {
    script: VecDeque<bool>,
    fallback: bool,
    pub calls: usize,
    pub reached: Vec<Point>,
}

impl ScriptedStage {
    pub fn always(succeed: bool) -> Self {
        Self::scripted([], succeed)
    }

    pub fn scripted(script: impl IntoIterator<Item = bool>, fallback: bool) -> Self {
        Self {
            script: script.into_iter().collect(),
            fallback,
            calls: 0,
            reached: Vec::new(),
        }
    }

    /// Fails until the `attempt`-th call, which succeeds.
    pub fn succeeding_on(attempt: usize) -> Self {
        Self::scripted(std::iter::repeat(false).take(attempt - 1), true)
    }
}

impl StageActuator for ScriptedStage {
    fn move_to(&mut self, target: Point) -> DeviceResult<()> {
        self.calls += 1;
        let ok = self.script.pop_front().unwrap_or(self.fallback);
        if ok {
            self.reached.push(target);
            Ok(())
        } else {
            Err(DeviceError::Timeout(target))
        }
    }
}

/// Sensor that plays back a script of readings, then repeats `fallback`.
#[derive(Debug)]
pub struct ScriptedSensor {
    script: VecDeque<DeviceResult<Option<f64>>>,
    fallback: DeviceResult<Option<f64>>,
    pub calls: usize,
}

impl ScriptedSensor {
    pub fn always(reading: DeviceResult<Option<f64>>) -> Self {
        Self::scripted([], reading)
    }

    pub fn scripted(
        script: impl IntoIterator<Item = DeviceResult<Option<f64>>>,
        fallback: DeviceResult<Option<f64>>,
    ) -> Self {
        Self {
            script: script.into_iter().collect(),
            fallback,
            calls: 0,
        }
    }
}

impl Sensor for ScriptedSensor {
    fn measure(&mut self) -> DeviceResult<Option<f64>> {
        self.calls += 1;
        self.script
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}
