//! Element ingestion: fetching and parsing TLE text
//!
//! - [`celestrak`] - the network feed and the [`ElementFeed`] seam
//! - [`tle_text`] - the raw-text scanner

pub mod celestrak;
pub mod tle_text;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::store::{ElementStore, UpsertReport};
use crate::Result;

pub use self::celestrak::{CelestrakFeed, ElementFeed};
pub use self::tle_text::{format_tle_text, parse_tle_text};

/// One parsed element set: a display name and its two element lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementTriple {
    pub name: String,
    pub line1: String,
    pub line2: String,
}

impl ElementTriple {
    pub fn new(name: impl Into<String>, line1: impl Into<String>, line2: impl Into<String>) -> Self {
        ElementTriple {
            name: name.into(),
            line1: line1.into(),
            line2: line2.into(),
        }
    }
}

/// Source tag recorded with records fetched for `group`.
pub fn source_tag(group: &str) -> String {
    format!("celestrak:{}", group)
}

/// Fetch, parse and store one element group.
///
/// Network and store failures are returned to the caller; records that fail
/// to parse are simply absent from the batch.
pub fn fetch_and_store(
    feed: &dyn ElementFeed,
    store: &ElementStore,
    group: &str,
    timeout: Duration,
) -> Result<UpsertReport> {
    info!(group, "fetching element group");

    let text = feed.fetch_group(group, timeout)?;
    let triples = parse_tle_text(&text);
    info!(group, parsed = triples.len(), "parsed element sets");

    let report = store.upsert(&triples, &source_tag(group))?;
    info!(
        group,
        inserted = report.inserted,
        refreshed = report.refreshed,
        "stored element group"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NearsatError;

    struct StaticFeed(&'static str);

    impl ElementFeed for StaticFeed {
        fn fetch_group(&self, _group: &str, _timeout: Duration) -> Result<String> {
            Ok(self.0.to_string())
        }

        fn probe(&self, _timeout: Duration) -> Result<()> {
            Ok(())
        }
    }

    struct DownFeed;

    impl ElementFeed for DownFeed {
        fn fetch_group(&self, _group: &str, _timeout: Duration) -> Result<String> {
            Err(NearsatError::Network("timed out".into()))
        }

        fn probe(&self, _timeout: Duration) -> Result<()> {
            Err(NearsatError::Network("timed out".into()))
        }
    }

    #[test]
    fn test_source_tag() {
        assert_eq!(source_tag("amateur"), "celestrak:amateur");
    }

    #[test]
    fn test_fetch_and_store_counts() {
        let store = ElementStore::open_in_memory().unwrap();
        let feed = StaticFeed("A\n1 a\n2 a\nB\n1 b\n2 b\n");

        let report = fetch_and_store(&feed, &store, "amateur", Duration::from_secs(1)).unwrap();
        assert_eq!(report, UpsertReport { inserted: 2, refreshed: 0 });

        let report = fetch_and_store(&feed, &store, "amateur", Duration::from_secs(1)).unwrap();
        assert_eq!(report, UpsertReport { inserted: 0, refreshed: 2 });

        let records = store.fetch_all().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.source == "celestrak:amateur"));
    }

    #[test]
    fn test_network_error_surfaces_and_store_untouched() {
        let store = ElementStore::open_in_memory().unwrap();
        let err = fetch_and_store(&DownFeed, &store, "amateur", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, NearsatError::Network(_)));
        assert_eq!(store.len().unwrap(), 0);
    }
}
