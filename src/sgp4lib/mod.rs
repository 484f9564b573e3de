//! SGP4 orbit propagation
//!
//! Builds a propagatable state from a TLE pair and evaluates it at a UTC
//! instant. The perturbation model itself is the `sgp4` crate; this module
//! owns the time conversion (Julian whole/fraction pairs, microsecond
//! resolution) and the mapping of model failures onto the numeric status
//! codes used by Vallado's reference implementation.
//!
//! # Example
//!
//! ```ignore
//! use nearsat::sgp4lib::ElementState;
//!
//! let line1 = "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
//! let line2 = "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";
//!
//! let iss = ElementState::from_tle(line1, line2)?;
//! let state = iss.propagate(&chrono::Utc::now());
//! if state.is_ok() {
//!     println!("ISS TEME position: {:?} km", state.position_km);
//! }
//! ```

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::Serialize;
use sgp4::{Constants, Elements, MinutesSinceEpoch};

use crate::constants::SGP4_EARTH_RADIUS_KM;
use crate::time::JulianDate;
use crate::{NearsatError, Result};

/// Propagation succeeded
pub const STATUS_OK: i32 = 0;
/// Mean eccentricity left the `[0, 1)` range
pub const STATUS_ECCENTRICITY: i32 = 1;
/// Perturbed eccentricity left the `[0, 1]` range
pub const STATUS_PERTURBED_ECCENTRICITY: i32 = 3;
/// Semi-latus rectum became negative
pub const STATUS_SEMI_LATUS_RECTUM: i32 = 4;
/// Orbit radius fell below the Earth's surface
pub const STATUS_DECAYED: i32 = 6;

/// Position and velocity of one object at one instant, inertial frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropagatedState {
    /// TEME position in km (NaN when `status != 0`)
    pub position_km: Vector3<f64>,
    /// TEME velocity in km/s (NaN when `status != 0`)
    pub velocity_km_s: Vector3<f64>,
    /// SGP4 status code, 0 on success
    pub status: i32,
    /// Instant the state was evaluated at
    pub instant: DateTime<Utc>,
}

impl PropagatedState {
    fn failed(status: i32, instant: DateTime<Utc>) -> Self {
        let nan = Vector3::repeat(f64::NAN);
        PropagatedState {
            position_km: nan,
            velocity_km_s: nan,
            status,
            instant,
        }
    }

    /// True when the model produced a usable state.
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// A TLE pair initialized for SGP4 propagation.
#[derive(Debug, Clone)]
pub struct ElementState {
    /// NORAD catalog ID
    norad_id: u64,

    /// Element set epoch (UTC)
    epoch: DateTime<Utc>,

    /// Epoch as a Julian pair, cached for minute arithmetic
    epoch_jd: JulianDate,

    /// The SGP4 propagator constants
    model: Constants,

    /// Mean motion, revolutions per day
    mean_motion: f64,
}

impl ElementState {
    /// Create a propagatable state from the two element lines.
    ///
    /// Malformed lines and element sets the model refuses to initialize both
    /// yield [`NearsatError::InvalidElements`].
    pub fn from_tle(line1: &str, line2: &str) -> Result<Self> {
        let elements = Elements::from_tle(None, line1.trim().as_bytes(), line2.trim().as_bytes())
            .map_err(|e| NearsatError::InvalidElements(format!("Failed to parse TLE: {:?}", e)))?;
        Self::from_elements(elements)
    }

    /// Create a propagatable state from parsed SGP4 elements.
    pub fn from_elements(elements: Elements) -> Result<Self> {
        let model = Constants::from_elements(&elements).map_err(|e| {
            NearsatError::InvalidElements(format!("SGP4 initialization failed: {:?}", e))
        })?;

        let epoch = DateTime::<Utc>::from_naive_utc_and_offset(elements.datetime, Utc);
        let epoch_jd = JulianDate::from_naive_utc(&elements.datetime);

        Ok(ElementState {
            norad_id: elements.norad_id,
            epoch,
            epoch_jd,
            model,
            mean_motion: elements.mean_motion,
        })
    }

    /// NORAD catalog ID
    pub fn norad_id(&self) -> u64 {
        self.norad_id
    }

    /// Element set epoch (UTC)
    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    /// Mean motion in revolutions per day (from TLE)
    pub fn revs_per_day(&self) -> f64 {
        self.mean_motion
    }

    /// Minutes from the element epoch to `instant`.
    pub fn minutes_since_epoch(&self, instant: &DateTime<Utc>) -> f64 {
        JulianDate::from_utc(instant).minutes_since(&self.epoch_jd)
    }

    /// Evaluate SGP4 at `instant`.
    ///
    /// Never fails: model errors come back as a state with a non-zero
    /// `status` and NaN vectors so batch callers can skip the record.
    pub fn propagate(&self, instant: &DateTime<Utc>) -> PropagatedState {
        let minutes = self.minutes_since_epoch(instant);

        let prediction = match self.model.propagate(MinutesSinceEpoch(minutes)) {
            Ok(prediction) => prediction,
            Err(e) => return PropagatedState::failed(status_code(&e), *instant),
        };

        let position = Vector3::from(prediction.position);
        if position.norm() < SGP4_EARTH_RADIUS_KM {
            return PropagatedState::failed(STATUS_DECAYED, *instant);
        }

        PropagatedState {
            position_km: position,
            velocity_km_s: Vector3::from(prediction.velocity),
            status: STATUS_OK,
            instant: *instant,
        }
    }
}

/// Build and propagate in one step, turning a non-zero status into an error.
pub fn propagate_tle(line1: &str, line2: &str, instant: &DateTime<Utc>) -> Result<PropagatedState> {
    let state = ElementState::from_tle(line1, line2)?.propagate(instant);
    if state.is_ok() {
        Ok(state)
    } else {
        Err(NearsatError::Propagation {
            code: state.status,
            message: status_message(state.status).to_string(),
        })
    }
}

/// Vallado's status code for an `sgp4` propagation error.
#[allow(unreachable_patterns)]
fn status_code(err: &sgp4::Error) -> i32 {
    match err {
        sgp4::Error::OutOfRangeEccentricity { .. } => STATUS_ECCENTRICITY,
        sgp4::Error::OutOfRangePerturbedEccentricity { .. } => STATUS_PERTURBED_ECCENTRICITY,
        sgp4::Error::NegativeSemiLatusRectum { .. } => STATUS_SEMI_LATUS_RECTUM,
        _ => STATUS_ECCENTRICITY,
    }
}

/// Human-readable description of a status code.
pub fn status_message(status: i32) -> &'static str {
    match status {
        STATUS_OK => "ok",
        STATUS_ECCENTRICITY => "mean eccentricity out of range",
        STATUS_PERTURBED_ECCENTRICITY => "perturbed eccentricity out of range",
        STATUS_SEMI_LATUS_RECTUM => "negative semi-latus rectum",
        STATUS_DECAYED => "orbit decayed",
        _ => "unknown propagation failure",
    }
}
