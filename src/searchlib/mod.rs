//! Nearest-object resolution
//!
//! Scans every stored element set, propagates each one to the query instant,
//! rotates the result into the Earth-fixed frame and keeps the record closest
//! to the observer. Records that fail to initialize or propagate are skipped.
//!
//! - [`NearestResolver::find_nearest`] - closest object to a ground observer
//! - [`NearestResolver::get_all_states`] - every record's state at an instant

use std::sync::Arc;

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::Serialize;
use tracing::debug;

use crate::framelib::eci_to_ecef_jd;
use crate::sgp4lib::{status_message, ElementState, PropagatedState};
use crate::store::{ElementRecord, ElementStore};
use crate::time::JulianDate;
use crate::toposlib::ObserverPosition;
use crate::Result;

/// The object closest to an observer at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestResult {
    pub record: ElementRecord,
    /// Straight-line distance from the observer in km
    pub distance_km: f64,
    pub position_eci_km: Vector3<f64>,
    pub position_ecef_km: Vector3<f64>,
    pub velocity_km_s: Vector3<f64>,
    pub instant: DateTime<Utc>,
}

/// How one record fared when propagated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateOutcome {
    /// The model ran; `status` may still be non-zero
    Propagated(PropagatedState),
    /// The element lines could not be initialized
    InvalidElements { message: String },
}

/// One entry of a bulk state listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SatelliteState {
    pub record: ElementRecord,
    pub outcome: StateOutcome,
}

impl SatelliteState {
    /// The propagated state, when the model produced a usable one.
    pub fn state(&self) -> Option<&PropagatedState> {
        match &self.outcome {
            StateOutcome::Propagated(state) if state.is_ok() => Some(state),
            _ => None,
        }
    }
}

/// Answers proximity queries against a shared element store.
#[derive(Debug, Clone)]
pub struct NearestResolver {
    store: Arc<ElementStore>,
}

impl NearestResolver {
    pub fn new(store: Arc<ElementStore>) -> Self {
        NearestResolver { store }
    }

    /// Find the stored object closest to an observer at `instant`.
    ///
    /// # Arguments
    /// * `lat_deg` - Geodetic latitude in degrees
    /// * `lon_deg` - Longitude in degrees, east positive
    /// * `alt_m` - Height above the WGS84 ellipsoid in meters
    /// * `instant` - UTC instant to evaluate every orbit at
    ///
    /// # Returns
    /// `None` when the store is empty or no record propagates. Ties go to the
    /// record that was stored first. Only store failures are errors.
    pub fn find_nearest(
        &self,
        lat_deg: f64,
        lon_deg: f64,
        alt_m: f64,
        instant: &DateTime<Utc>,
    ) -> Result<Option<NearestResult>> {
        let observer = ObserverPosition::wgs84(lat_deg, lon_deg, alt_m);
        let records = self.store.fetch_all()?;
        let jd = JulianDate::from_utc(instant);

        let mut best: Option<NearestResult> = None;
        for record in records {
            let Some(state) = propagate_record(&record, instant) else {
                continue;
            };

            let position_ecef_km = eci_to_ecef_jd(&state.position_km, &jd);
            let distance_km = observer.distance_km(&position_ecef_km);

            let closer = best.as_ref().map_or(true, |b| distance_km < b.distance_km);
            if closer {
                best = Some(NearestResult {
                    record,
                    distance_km,
                    position_eci_km: state.position_km,
                    position_ecef_km,
                    velocity_km_s: state.velocity_km_s,
                    instant: *instant,
                });
            }
        }

        if let Some(b) = &best {
            debug!(
                name = %b.record.name,
                distance_km = b.distance_km,
                observer = %observer,
                "nearest object resolved"
            );
        }
        Ok(best)
    }

    /// Propagate every stored record to `instant`, in store order.
    pub fn get_all_states(&self, instant: &DateTime<Utc>) -> Result<Vec<SatelliteState>> {
        let records = self.store.fetch_all()?;

        let states = records
            .into_iter()
            .map(|record| {
                let outcome = match ElementState::from_tle(&record.line1, &record.line2) {
                    Ok(element_state) => StateOutcome::Propagated(element_state.propagate(instant)),
                    Err(e) => StateOutcome::InvalidElements {
                        message: e.to_string(),
                    },
                };
                SatelliteState { record, outcome }
            })
            .collect();

        Ok(states)
    }
}

fn propagate_record(record: &ElementRecord, instant: &DateTime<Utc>) -> Option<PropagatedState> {
    let element_state = match ElementState::from_tle(&record.line1, &record.line2) {
        Ok(s) => s,
        Err(e) => {
            debug!(id = record.id, name = %record.name, error = %e, "skipping record");
            return None;
        }
    };

    let state = element_state.propagate(instant);
    if !state.is_ok() {
        debug!(
            id = record.id,
            name = %record.name,
            status = state.status,
            reason = status_message(state.status),
            "skipping record"
        );
        return None;
    }
    Some(state)
}
