//! Source readers - enumerate installed packages per source and hydrate
//! `latest` fields through the registry cache.

pub mod global;
pub mod local;

use crate::concurrency::map_bounded;
use crate::registry::RegistryCache;
use crate::types::PackageRow;

/// Fan-out ceiling for latest-version lookups during a read.
const HYDRATE_CONCURRENCY: usize = 5;

/// Sentinel recorded when a latest-version lookup fails.
pub const UNKNOWN_LATEST: &str = "?";

/// Fill every row's `latest` field, at most [`HYDRATE_CONCURRENCY`] lookups
/// in flight.
///
/// A failed lookup marks that one row with the `"?"` sentinel and accumulates
/// a non-fatal error; siblings are unaffected. Every row is settled before
/// this returns, and `actionable` is recomputed for each.
pub(crate) async fn hydrate_latest(
    rows: &mut [PackageRow],
    errors: &mut Vec<String>,
    registry: &RegistryCache,
) {
    let lookups: Vec<(usize, String)> = rows
        .iter()
        .enumerate()
        .map(|(index, row)| (index, row.name.clone()))
        .collect();

    let fetched = map_bounded(lookups, HYDRATE_CONCURRENCY, |(index, name)| async move {
        (index, registry.latest_version(&name).await)
    })
    .await;

    for (index, latest) in fetched {
        let row = &mut rows[index];
        match latest {
            Some(version) => row.latest = Some(version),
            None => {
                row.latest = Some(UNKNOWN_LATEST.to_string());
                errors.push(format!("Failed to load metadata for {}", row.name));
            }
        }
        row.recompute_actionable();
    }
}
