//! nearsat - nearest satellite resolution
//!
//! Keeps a local store of TLE element sets current from CelesTrak and answers
//! "which tracked object is closest to this point on the ground right now?"
//!
//! - [`store`] - SQLite element store, deduplicated on (name, line1, line2)
//! - [`data`] - feed retrieval and TLE text parsing
//! - [`scheduler`] - background refresh worker
//! - [`sgp4lib`] - SGP4 propagation to TEME position and velocity
//! - [`framelib`] - GMST rotation from TEME into the Earth-fixed frame
//! - [`toposlib`] - WGS84 observer positions
//! - [`searchlib`] - nearest-object resolver
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use nearsat::{NearestResolver, ElementStore};
//!
//! let store = Arc::new(ElementStore::open("database/tles.db")?);
//! let resolver = NearestResolver::new(store);
//! if let Some(hit) = resolver.find_nearest(43.6625, -79.3950, 100.0, &chrono::Utc::now())? {
//!     println!("{} at {:.1} km", hit.record.name, hit.distance_km);
//! }
//! ```

pub mod constants;
pub mod data;
pub mod errors;
pub mod framelib;
pub mod scheduler;
pub mod searchlib;
pub mod sgp4lib;
pub mod store;
pub mod time;
pub mod toposlib;

pub use errors::{NearsatError, Result};

pub use data::{CelestrakFeed, ElementFeed, ElementTriple};
pub use scheduler::{RefreshConfig, RefreshScheduler};
pub use searchlib::{NearestResolver, NearestResult, SatelliteState, StateOutcome};
pub use sgp4lib::{ElementState, PropagatedState};
pub use store::{ElementRecord, ElementStore};
pub use toposlib::ObserverPosition;
