//! Nearest satellite lookup against a live CelesTrak group
//!
//! Refreshes the local store, starts the background scheduler and reports the
//! tracked object closest to an observer in Toronto.
//!
//! Run with: cargo run --example nearest_satellite [config.toml]
//! Set RUST_LOG=nearsat=debug to see skipped records.

use std::sync::Arc;

use chrono::Utc;
use tracing_subscriber::EnvFilter;

use nearsat::scheduler::RefreshConfig;
use nearsat::toposlib::ObserverPosition;
use nearsat::{CelestrakFeed, ElementStore, NearestResolver, RefreshScheduler};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "nearsat=info".into()))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => RefreshConfig::load(path)?,
        None => RefreshConfig::default(),
    };

    let store = Arc::new(ElementStore::open("database/tles.db")?);
    let feed = Arc::new(CelestrakFeed::from_config(&config)?);
    let mut scheduler = RefreshScheduler::new(feed, Arc::clone(&store), config);

    // Populate before the first query; fall back to whatever is on disk
    if let Err(e) = scheduler.refresh_now() {
        eprintln!("Initial refresh failed ({}), using stored elements", e);
    }
    scheduler.start();

    let (lat, lon, alt_m) = (43.6625, -79.3950, 100.0);
    let observer = ObserverPosition::wgs84(lat, lon, alt_m);
    let now = Utc::now();

    println!("=== Nearest Satellite ===\n");
    println!("Observer: {}", observer);
    println!("Time:     {}", now.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Records:  {}\n", store.len()?);

    let resolver = NearestResolver::new(Arc::clone(&store));
    match resolver.find_nearest(lat, lon, alt_m, &now)? {
        Some(hit) => {
            let look = observer.look_angles(&hit.position_ecef_km);
            println!("Nearest:   {}", hit.record.name);
            println!("Distance:  {:.1} km", hit.distance_km);
            println!("Azimuth:   {:.1}°", look.azimuth_deg);
            println!("Elevation: {:.1}°", look.elevation_deg);
            println!();
            println!("{}", serde_json::to_string_pretty(&hit)?);
        }
        None => println!("No propagatable element sets in the store"),
    }

    scheduler.stop();
    Ok(())
}
