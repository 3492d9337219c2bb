//! Weighted sampling with maskable coefficients.
//!
//! A [`WeightedTable`] holds `(weight, coefficient, value)` entries. The
//! effective weight of an entry is `weight * coefficient`; sampling picks
//! an entry with probability proportional to its effective weight.
//!
//! Coefficients exist for temporary masking: clone a template, zero the
//! coefficients of values that make no sense right now, sample the clone.
//! [`WeightedTable::reset_coefficients`] restores every coefficient to 1.
//!
//! # Sampling
//!
//! One uniform draw in `[0, total)` is compared against the running sum of
//! effective weights in stored order; the first entry whose cumulative sum
//! exceeds the draw wins. Entries with zero effective weight can never win.
//! If float round-off carries the draw past the last boundary, the last
//! entry that still carries weight is returned.

use rand::Rng;

/// Errors from sampling a [`WeightedTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DistributionError {
    /// The table has no entries at all.
    #[error("cannot sample an empty distribution")]
    Empty,

    /// Every entry has zero effective weight (all masked or weightless).
    #[error("every entry of the distribution has zero effective weight")]
    ZeroTotalWeight,
}

/// Clamp a weight or coefficient to a finite, non-negative value.
///
/// Negative and NaN inputs become zero; so do infinities, which would
/// otherwise poison the total.
fn sanitize(value: f32) -> f32 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// One entry of a [`WeightedTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedEntry<T> {
    weight: f32,
    coefficient: f32,
    value: T,
}

impl<T> WeightedEntry<T> {
    /// Base weight (always `>= 0`).
    pub const fn weight(&self) -> f32 {
        self.weight
    }

    /// Masking coefficient (always `>= 0`, 1 when unmasked).
    pub const fn coefficient(&self) -> f32 {
        self.coefficient
    }

    /// `weight * coefficient`.
    pub fn effective_weight(&self) -> f32 {
        self.weight * self.coefficient
    }

    /// The value this entry yields.
    pub const fn value(&self) -> &T {
        &self.value
    }
}

/// Discrete distribution over values of `T` with per-entry coefficients.
///
/// Values are unique: adding a value that is already present replaces its
/// weight. Cloning produces a fully independent table.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedTable<T> {
    entries: Vec<WeightedEntry<T>>,
}

impl<T> Default for WeightedTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: PartialEq> WeightedTable<T> {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build a table from `(value, weight)` pairs, in order.
    pub fn from_weights<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, f32)>,
    {
        let mut table = Self::new();
        for (value, weight) in pairs {
            table.add_entry(value, weight);
        }
        table
    }

    fn position(&self, value: &T) -> Option<usize> {
        self.entries.iter().position(|entry| entry.value == *value)
    }

    fn entry_mut(&mut self, value: &T) -> Option<&mut WeightedEntry<T>> {
        self.entries.iter_mut().find(|entry| entry.value == *value)
    }

    fn entry(&self, value: &T) -> Option<&WeightedEntry<T>> {
        self.entries.iter().find(|entry| entry.value == *value)
    }

    /// Add `value` with `weight` (clamped to `>= 0`) and coefficient 1.
    ///
    /// If `value` is already present its weight is replaced and its
    /// coefficient kept. Returns `true` when a new entry was appended.
    pub fn add_entry(&mut self, value: T, weight: f32) -> bool {
        let weight = sanitize(weight);
        if let Some(existing) = self.entry_mut(&value) {
            existing.weight = weight;
            return false;
        }
        self.entries.push(WeightedEntry {
            weight,
            coefficient: 1.0,
            value,
        });
        true
    }

    /// Remove the entry for `value`. Returns `false` when absent.
    pub fn remove_entry(&mut self, value: &T) -> bool {
        match self.position(value) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Set the base weight of `value` (clamped to `>= 0`). Returns `false`
    /// when absent.
    pub fn set_weight(&mut self, value: &T, weight: f32) -> bool {
        self.entry_mut(value).is_some_and(|entry| {
            entry.weight = sanitize(weight);
            true
        })
    }

    /// Set the coefficient of `value` (clamped to `>= 0`). Returns `false`
    /// when absent.
    pub fn set_coefficient(&mut self, value: &T, coefficient: f32) -> bool {
        self.entry_mut(value).is_some_and(|entry| {
            entry.coefficient = sanitize(coefficient);
            true
        })
    }

    /// Zero the coefficient of `value`, excluding it from sampling.
    pub fn mask(&mut self, value: &T) -> bool {
        self.set_coefficient(value, 0.0)
    }

    /// Restore every coefficient to 1.
    pub fn reset_coefficients(&mut self) {
        for entry in &mut self.entries {
            entry.coefficient = 1.0;
        }
    }

    /// Base weight of `value`, if present.
    pub fn weight_of(&self, value: &T) -> Option<f32> {
        self.entry(value).map(WeightedEntry::weight)
    }

    /// Coefficient of `value`, if present.
    pub fn coefficient_of(&self, value: &T) -> Option<f32> {
        self.entry(value).map(WeightedEntry::coefficient)
    }

    /// Sum of effective weights.
    pub fn total_weight(&self) -> f32 {
        self.entries.iter().map(WeightedEntry::effective_weight).sum()
    }

    /// Probability that [`Self::sample`] returns `value`.
    ///
    /// Zero when `value` is absent or the total weight is zero.
    pub fn probability_of(&self, value: &T) -> f32 {
        let total = self.total_weight();
        if total <= 0.0 {
            return 0.0;
        }
        self.entry(value)
            .map_or(0.0, |entry| entry.effective_weight() / total)
    }

    /// Whether `value` has an entry.
    pub fn contains(&self, value: &T) -> bool {
        self.position(value).is_some()
    }

    /// Number of entries (masked ones included).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in stored order.
    pub fn entries(&self) -> &[WeightedEntry<T>] {
        &self.entries
    }

    /// Draw one value.
    pub fn sample<R>(&self, rng: &mut R) -> Result<&T, DistributionError>
    where
        R: Rng + ?Sized,
    {
        if self.entries.is_empty() {
            return Err(DistributionError::Empty);
        }
        let total = self.total_weight();
        if total <= 0.0 {
            return Err(DistributionError::ZeroTotalWeight);
        }

        let draw = total * rng.random::<f32>();
        let mut cumulative = 0.0_f32;
        let mut last_weighted = None;
        for entry in &self.entries {
            let effective = entry.effective_weight();
            if effective <= 0.0 {
                continue;
            }
            cumulative += effective;
            last_weighted = Some(&entry.value);
            if cumulative > draw {
                return Ok(&entry.value);
            }
        }
        last_weighted.ok_or(DistributionError::ZeroTotalWeight)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    const DRAWS: u32 = 20_000;

    fn frequency<T: PartialEq + Copy>(table: &WeightedTable<T>, value: T, seed: u64) -> f32 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut hits = 0_u32;
        for _ in 0..DRAWS {
            if table.sample(&mut rng) == Ok(&value) {
                hits = hits.saturating_add(1);
            }
        }
        f32::from(u16::try_from(hits).unwrap_or(u16::MAX)) / f32::from(u16::try_from(DRAWS).unwrap_or(u16::MAX))
    }

    #[test]
    fn sampling_follows_effective_weights() {
        let table = WeightedTable::from_weights([('a', 1.0), ('b', 2.0), ('c', 5.0)]);
        for (value, expected) in [('a', 0.125), ('b', 0.25), ('c', 0.625)] {
            let observed = frequency(&table, value, 7);
            assert!(
                (observed - expected).abs() < 0.02,
                "{value}: observed {observed}, expected {expected}"
            );
        }
    }

    #[test]
    fn one_to_three_weights_give_three_quarters() {
        let table = WeightedTable::from_weights([("travel", 1.0), ("attack", 3.0)]);
        assert!((table.probability_of(&"attack") - 0.75).abs() < f32::EPSILON);
        let observed = frequency(&table, "attack", 42);
        assert!((observed - 0.75).abs() < 0.02, "observed {observed}");
    }

    #[test]
    fn masked_entry_is_never_drawn() {
        let mut table = WeightedTable::from_weights([(1, 4.0), (2, 4.0), (3, 4.0)]);
        assert!(table.mask(&2));
        assert!(table.probability_of(&2).abs() < f32::EPSILON);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..5_000 {
            assert_ne!(table.sample(&mut rng), Ok(&2));
        }
    }

    #[test]
    fn clones_are_independent() {
        let template = WeightedTable::from_weights([('x', 1.0), ('y', 1.0)]);
        let mut scratch = template.clone();
        scratch.mask(&'x');
        scratch.set_weight(&'y', 9.0);
        scratch.add_entry('z', 3.0);

        assert_eq!(template.coefficient_of(&'x'), Some(1.0));
        assert_eq!(template.weight_of(&'y'), Some(1.0));
        assert!(!template.contains(&'z'));
        assert!((template.probability_of(&'x') - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_table_cannot_be_sampled() {
        let table: WeightedTable<u8> = WeightedTable::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(table.sample(&mut rng), Err(DistributionError::Empty));
    }

    #[test]
    fn fully_masked_table_reports_zero_weight() {
        let mut table = WeightedTable::from_weights([(1, 2.0), (2, 0.0)]);
        table.mask(&1);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            table.sample(&mut rng),
            Err(DistributionError::ZeroTotalWeight)
        );
        assert!(table.probability_of(&1).abs() < f32::EPSILON);
    }

    #[test]
    fn negative_inputs_clamp_to_zero() {
        let mut table = WeightedTable::from_weights([('a', -3.0), ('b', 1.0)]);
        assert_eq!(table.weight_of(&'a'), Some(0.0));
        table.set_coefficient(&'b', -1.0);
        assert_eq!(table.coefficient_of(&'b'), Some(0.0));
        table.set_weight(&'a', f32::NAN);
        assert_eq!(table.weight_of(&'a'), Some(0.0));
    }

    #[test]
    fn adding_existing_value_replaces_weight() {
        let mut table = WeightedTable::new();
        assert!(table.add_entry('a', 1.0));
        table.mask(&'a');
        assert!(!table.add_entry('a', 4.0));
        assert_eq!(table.len(), 1);
        assert_eq!(table.weight_of(&'a'), Some(4.0));
        assert_eq!(table.coefficient_of(&'a'), Some(0.0));
    }

    #[test]
    fn reset_restores_masked_entries() {
        let mut table = WeightedTable::from_weights([('a', 1.0), ('b', 1.0)]);
        table.mask(&'a');
        table.mask(&'b');
        table.reset_coefficients();
        assert!((table.total_weight() - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn remove_and_lookup_of_absent_values() {
        let mut table = WeightedTable::from_weights([('a', 1.0)]);
        assert!(!table.remove_entry(&'q'));
        assert!(!table.set_weight(&'q', 1.0));
        assert!(table.remove_entry(&'a'));
        assert!(table.is_empty());
        assert!(table.probability_of(&'a').abs() < f32::EPSILON);
    }
}
