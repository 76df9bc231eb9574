//! Dedup and boundary admission for discovered records
//!
//! Two workers discovering the same entity concurrently must result in
//! exactly one acceptance, so the identifier check-and-insert and the
//! admission counters live behind a single lock.

use crate::geo::BoundaryBox;
use crate::record::BusinessRecord;
use std::collections::HashSet;
use std::sync::Mutex;

/// Outcome of offering one record to the filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// New entity inside the buffered boundary
    Accepted,
    /// Either identifier was already seen
    Duplicate,
    /// Coordinates fall outside the buffered boundary
    OutOfBounds,
}

/// Admission counters, snapshot of the filter's tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterCounts {
    pub accepted: u64,
    pub duplicates: u64,
    pub filtered: u64,
}

#[derive(Debug, Default)]
struct Inner {
    place_ids: HashSet<String>,
    hex_ids: HashSet<String>,
    counts: FilterCounts,
}

/// Shared admission gate: boundary check plus atomic dedup
#[derive(Debug)]
pub struct DedupFilter {
    boundary: BoundaryBox,
    inner: Mutex<Inner>,
}

impl DedupFilter {
    /// `boundary` is the buffered filter boundary, already expanded
    pub fn new(boundary: BoundaryBox) -> Self {
        Self {
            boundary,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Seeds the identifier sets from a prior run's checkpoint
    pub fn seed<'a>(
        &self,
        place_ids: impl IntoIterator<Item = &'a String>,
        hex_ids: impl IntoIterator<Item = &'a String>,
    ) {
        let mut inner = self.inner.lock().unwrap();
        inner.place_ids.extend(place_ids.into_iter().cloned());
        inner.hex_ids.extend(hex_ids.into_iter().cloned());
    }

    /// Decides one record's admission. Check-and-insert is a single
    /// critical section; callers may race freely.
    ///
    /// Records without coordinates pass the boundary check, and records
    /// without any identifier cannot be deduplicated and are accepted.
    pub fn admit(&self, record: &BusinessRecord) -> Admission {
        let mut inner = self.inner.lock().unwrap();

        if let (Some(lat), Some(lng)) = (record.latitude, record.longitude) {
            if !self.boundary.contains(lat, lng) {
                inner.counts.filtered += 1;
                return Admission::OutOfBounds;
            }
        }

        let place_dup = record
            .place_id()
            .is_some_and(|id| inner.place_ids.contains(id));
        let hex_dup = record.hex_id().is_some_and(|id| inner.hex_ids.contains(id));
        if place_dup || hex_dup {
            inner.counts.duplicates += 1;
            return Admission::Duplicate;
        }

        if let Some(id) = record.place_id() {
            inner.place_ids.insert(id.to_string());
        }
        if let Some(id) = record.hex_id() {
            inner.hex_ids.insert(id.to_string());
        }
        inner.counts.accepted += 1;
        Admission::Accepted
    }

    /// Current admission counters
    pub fn counts(&self) -> FilterCounts {
        self.inner.lock().unwrap().counts
    }

    /// Consistent snapshot of both identifier sets, for checkpointing.
    /// Taken under the same lock `admit` uses, so it never observes a
    /// half-applied insertion.
    pub fn snapshot_ids(&self) -> (HashSet<String>, HashSet<String>) {
        let inner = self.inner.lock().unwrap();
        (inner.place_ids.clone(), inner.hex_ids.clone())
    }
}
