//! Geocoding results cache and batch resolution.
//!
//! The cache is an explicit object handed to [`CachedGeocoder`], built once
//! per process and shared by reference.

use std::collections::HashMap;
use std::sync::RwLock;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::GeocodeError;
use crate::model::Coordinates;
use crate::traits::{GeocodeCache, Geocoder};

/// Process-local cache keyed by normalised address.
#[derive(Debug, Default)]
pub struct InMemoryGeocodeCache {
    entries: RwLock<HashMap<String, Coordinates>>,
}

impl InMemoryGeocodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl GeocodeCache for InMemoryGeocodeCache {
    fn get(&self, address: &str) -> Option<Coordinates> {
        let entries = self.entries.read().ok()?;
        entries.get(&normalize_address(address)).copied()
    }

    fn put(&self, address: &str, coordinates: Coordinates) {
        match self.entries.write() {
            Ok(mut entries) => {
                entries.insert(normalize_address(address), coordinates);
            }
            Err(_) => warn!("geocode cache lock poisoned, result not cached"),
        }
    }
}

/// Trims, collapses inner whitespace and lower-cases.
pub fn normalize_address(address: &str) -> String {
    address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Wraps a geocoder with a cache. Only found results are cached.
pub struct CachedGeocoder<'c, G, C> {
    inner: G,
    cache: &'c C,
}

impl<'c, G, C> CachedGeocoder<'c, G, C>
where
    G: Geocoder,
    C: GeocodeCache,
{
    pub fn new(inner: G, cache: &'c C) -> Self {
        Self { inner, cache }
    }
}

impl<G, C> Geocoder for CachedGeocoder<'_, G, C>
where
    G: Geocoder,
    C: GeocodeCache,
{
    fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        if let Some(hit) = self.cache.get(address) {
            debug!(address, "geocode cache hit");
            return Ok(Some(hit));
        }

        let found = self.inner.geocode(address)?;
        if let Some(coordinates) = found {
            self.cache.put(address, coordinates);
        }
        Ok(found)
    }
}

/// Resolves `addresses` on at most `max_parallel` threads.
///
/// Output is in input order. A failed lookup is logged and reported as
/// `None`, like "not found"; it never aborts the batch.
pub fn geocode_batch<G>(
    geocoder: &G,
    addresses: &[String],
    max_parallel: usize,
) -> Result<Vec<Option<Coordinates>>, GeocodeError>
where
    G: Geocoder + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(max_parallel.max(1))
        .build()?;

    let results = pool.install(|| {
        addresses
            .par_iter()
            .map(|address| match geocoder.geocode(address) {
                Ok(found) => found,
                Err(err) => {
                    warn!(address = address.as_str(), error = %err, "geocoding failed");
                    None
                }
            })
            .collect()
    });

    Ok(results)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct FakeGeocoder {
        calls: AtomicUsize,
    }

    impl FakeGeocoder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Geocoder for FakeGeocoder {
        fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match address {
                "boom" => Err(GeocodeError::Provider("quota exceeded".to_string())),
                "nowhere" => Ok(None),
                _ => Ok(Some(Coordinates::new(38.0 + address.len() as f64 / 100.0, -9.0))),
            }
        }
    }

    #[test]
    fn test_normalize_address() {
        assert_eq!(normalize_address("  Rua   Augusta 10 \n"), "rua augusta 10");
    }

    #[test]
    fn test_cache_hit_skips_inner() {
        let cache = InMemoryGeocodeCache::new();
        let geocoder = CachedGeocoder::new(FakeGeocoder::new(), &cache);

        let first = geocoder.geocode("Rua Augusta 10").unwrap();
        let second = geocoder.geocode("rua  augusta 10").unwrap();

        assert_eq!(first, second);
        assert_eq!(geocoder.inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_not_found_is_not_cached() {
        let cache = InMemoryGeocodeCache::new();
        let geocoder = CachedGeocoder::new(FakeGeocoder::new(), &cache);

        assert_eq!(geocoder.geocode("nowhere").unwrap(), None);
        assert_eq!(geocoder.geocode("nowhere").unwrap(), None);
        assert_eq!(geocoder.inner.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_batch_preserves_order() {
        let geocoder = FakeGeocoder::new();
        let addresses: Vec<String> = ["a", "nowhere", "boom", "abcd"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let results = geocode_batch(&geocoder, &addresses, 2).unwrap();

        assert_eq!(results.len(), 4);
        assert_eq!(results[0], Some(Coordinates::new(38.0 + 1.0 / 100.0, -9.0)));
        assert_eq!(results[1], None);
        assert_eq!(results[2], None);
        assert_eq!(results[3], Some(Coordinates::new(38.0 + 4.0 / 100.0, -9.0)));
    }
}
