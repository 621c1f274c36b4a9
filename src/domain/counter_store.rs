//! In-memory occupancy counters, one per region.

use serde::Serialize;

use super::Region;

/// Direction of an occupancy change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delta {
    /// Someone entered the region (+1).
    Enter,
    /// Someone left the region (-1).
    Leave,
}

impl Delta {
    /// Signed amount applied to the counter.
    #[must_use]
    pub const fn amount(self) -> i64 {
        match self {
            Self::Enter => 1,
            Self::Leave => -1,
        }
    }
}

/// Fixed-size array of occupancy counters, indexed by [`Region::index`].
///
/// Counters start at zero and are only changed through [`Self::adjust`].
/// There is no lower bound: leaving an empty region yields a negative count.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RegionCounterStore {
    counters: [i64; Region::COUNT],
}

impl RegionCounterStore {
    /// Creates a store with every counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `delta` to the counter of `region` and returns the new value.
    pub fn adjust(&mut self, region: Region, delta: Delta) -> i64 {
        match self.counters.get_mut(region.index()) {
            Some(slot) => {
                *slot = slot.saturating_add(delta.amount());
                *slot
            }
            // Region construction guarantees the index is in bounds.
            None => 0,
        }
    }

    /// Returns the current counter of `region`.
    #[must_use]
    pub fn get(&self, region: Region) -> i64 {
        self.counters.get(region.index()).copied().unwrap_or_default()
    }

    /// Returns a copy of all four counters.
    #[must_use]
    pub const fn snapshot(&self) -> [i64; Region::COUNT] {
        self.counters
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn region(id: u8) -> Region {
        let Ok(region) = Region::new(id) else {
            panic!("region {id} should be valid");
        };
        region
    }

    #[test]
    fn starts_at_zero() {
        assert_eq!(RegionCounterStore::new().snapshot(), [0, 0, 0, 0]);
    }

    #[test]
    fn enter_then_leave_round_trips_every_region() {
        let mut store = RegionCounterStore::new();
        for r in Region::all() {
            let before = store.get(r);
            store.adjust(r, Delta::Enter);
            store.adjust(r, Delta::Leave);
            assert_eq!(store.get(r), before);
        }
    }

    #[test]
    fn adjust_touches_only_target_region() {
        let mut store = RegionCounterStore::new();
        assert_eq!(store.adjust(region(3), Delta::Enter), 1);
        assert_eq!(store.adjust(region(3), Delta::Enter), 2);
        assert_eq!(store.snapshot(), [0, 0, 2, 0]);
    }

    #[test]
    fn leave_may_go_negative() {
        let mut store = RegionCounterStore::new();
        assert_eq!(store.adjust(region(4), Delta::Leave), -1);
        assert_eq!(store.snapshot(), [0, 0, 0, -1]);
    }

    #[test]
    fn enter_enter_leave_sequence() {
        let mut store = RegionCounterStore::new();
        let counts: Vec<i64> = [Delta::Enter, Delta::Enter, Delta::Leave]
            .into_iter()
            .map(|d| store.adjust(region(1), d))
            .collect();
        assert_eq!(counts, vec![1, 2, 1]);
        assert_eq!(store.snapshot(), [1, 0, 0, 0]);
    }

    #[test]
    fn serializes_as_array() {
        let mut store = RegionCounterStore::new();
        store.adjust(region(2), Delta::Enter);
        assert_eq!(
            serde_json::to_string(&store).ok().as_deref(),
            Some("[0,1,0,0]")
        );
    }
}
