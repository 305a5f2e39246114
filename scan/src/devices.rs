//! Device capabilities and their simulated implementations.
//!
//! The scan core only sees [`StageActuator`] and [`Sensor`]: "attempt an
//! action, it may fail". [`SimStage`] and [`SimSensor`] stand in for real
//! hardware, failing at configured rates.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use thiserror::Error;

use crate::config::{RunConfig, SensorConfig, SpotConfig};
use crate::error::{ConfigError, ConfigResult};
use crate::grid::Point;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DeviceError {
    #[error("Stage timeout moving to {0}")]
    Timeout(Point),
    #[error("Sensor read error")]
    ReadError,
    #[error("Sensor position unknown, stage has not reached any point")]
    NoPosition,
}

pub type DeviceResult<T> = Result<T, DeviceError>;

/// Translation stage.
pub trait StageActuator {
    fn move_to(&mut self, target: Point) -> DeviceResult<()>;
}

/// Point sensor. `Ok(None)` is an empty reading.
pub trait Sensor {
    fn measure(&mut self) -> DeviceResult<Option<f64>>;
}

impl<T: StageActuator + ?Sized> StageActuator for &mut T {
    fn move_to(&mut self, target: Point) -> DeviceResult<()> {
        (**self).move_to(target)
    }
}

impl<T: Sensor + ?Sized> Sensor for &mut T {
    fn measure(&mut self) -> DeviceResult<Option<f64>> {
        (**self).measure()
    }
}

/// Last position reached by the simulated stage, shared with the simulated
/// sensor so that readings depend on where the stage is.
#[derive(Debug, Clone, Default)]
pub struct StagePosition(Rc<Cell<Option<Point>>>);

impl StagePosition {
    pub fn get(&self) -> Option<Point> {
        self.0.get()
    }

    pub fn set(&self, point: Point) {
        self.0.set(Some(point));
    }
}

/// Noise-free sample signal: a constant background plus Gaussian spots.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalField {
    pub base: f64,
    pub spots: Vec<SpotConfig>,
}

impl SignalField {
    pub fn at(&self, p: Point) -> f64 {
        self.base
            + self
                .spots
                .iter()
                .map(|spot| {
                    let dx = p.x - spot.x;
                    let dy = p.y - spot.y;
                    let r_sq = dx * dx + dy * dy;
                    spot.amplitude * (-r_sq / (2.0 * spot.sigma * spot.sigma)).exp()
                })
                .sum::<f64>()
    }
}

impl From<&SensorConfig> for SignalField {
    fn from(config: &SensorConfig) -> Self {
        Self {
            base: config.base_signal,
            spots: config.spots.clone(),
        }
    }
}

const STAGE_STREAM: u64 = 0x5354_4147;
const SENSOR_STREAM: u64 = 0x5345_4e53;

/// Seeded RNG for one device. The stream constant keeps stage and sensor
/// sequences distinct under the same run seed.
fn device_rng(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed ^ stream),
        None => StdRng::from_os_rng(),
    }
}

// ============================================================================
// Simulated stage
// ============================================================================

#[derive(Debug)]
pub struct SimStage {
    rng: StdRng,
    fail_rate: f64,
    settle_time: Duration,
    position: StagePosition,
}

impl SimStage {
    pub fn new(fail_rate: f64, settle_time: Duration, rng: StdRng, position: StagePosition) -> Self {
        assert!(
            (0.0..=1.0).contains(&fail_rate),
            "fail_rate must be within [0, 1]"
        );
        Self {
            rng,
            fail_rate,
            settle_time,
            position,
        }
    }
}

impl StageActuator for SimStage {
    fn move_to(&mut self, target: Point) -> DeviceResult<()> {
        if !self.settle_time.is_zero() {
            std::thread::sleep(self.settle_time);
        }
        if self.rng.random_bool(self.fail_rate) {
            return Err(DeviceError::Timeout(target));
        }
        self.position.set(target);
        Ok(())
    }
}

// ============================================================================
// Simulated sensor
// ============================================================================

#[derive(Debug)]
pub struct SimSensor {
    rng: StdRng,
    fail_rate: f64,
    noise: Normal<f64>,
    field: SignalField,
    position: StagePosition,
}

impl SimSensor {
    pub fn new(
        fail_rate: f64,
        noise_level: f64,
        field: SignalField,
        rng: StdRng,
        position: StagePosition,
    ) -> ConfigResult<Self> {
        assert!(
            (0.0..=1.0).contains(&fail_rate),
            "fail_rate must be within [0, 1]"
        );
        let noise = Normal::new(0.0, noise_level)
            .map_err(|e| ConfigError::Sensor(format!("noise_level {}: {}", noise_level, e)))?;
        Ok(Self {
            rng,
            fail_rate,
            noise,
            field,
            position,
        })
    }
}

impl Sensor for SimSensor {
    fn measure(&mut self) -> DeviceResult<Option<f64>> {
        if self.rng.random_bool(self.fail_rate) {
            // Bad reads come back either empty or as an error.
            return if self.rng.random_bool(0.5) {
                Ok(None)
            } else {
                Err(DeviceError::ReadError)
            };
        }
        let position = self.position.get().ok_or(DeviceError::NoPosition)?;
        let signal = self.field.at(position) + self.noise.sample(&mut self.rng);
        Ok(Some(signal))
    }
}

/// Builds a stage and sensor that share one position, as configured.
pub fn simulated_devices(config: &RunConfig) -> ConfigResult<(SimStage, SimSensor)> {
    let position = StagePosition::default();
    let stage = SimStage::new(
        config.stage_fail_rate,
        Duration::from_millis(config.stage.settle_time_ms),
        device_rng(config.seed, STAGE_STREAM),
        position.clone(),
    );
    let sensor = SimSensor::new(
        config.sensor_fail_rate,
        config.sensor.noise_level,
        SignalField::from(&config.sensor),
        device_rng(config.seed, SENSOR_STREAM),
        position,
    )?;
    Ok((stage, sensor))
}
