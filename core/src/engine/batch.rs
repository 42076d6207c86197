// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Range proof batching.
//!
//! Outputs are partitioned into batches by the transaction grouping, with a
//! single aggregated range proof per batch. Amounts and masks are only held
//! for the current batch, and are released once the final batch has been
//! proven or verified.

use heapless::Vec;
use static_assertions::const_assert;
use zeroize::Zeroize;

use curve25519_dalek::Scalar;

use super::Error;

/// Maximum number of outputs per transaction
pub const MAX_OUTPUTS: usize = 16;

/// Maximum number of outputs aggregated into a single range proof
pub const MAX_BATCH_OUTPUTS: usize = 16;

const_assert!(MAX_BATCH_OUTPUTS <= MAX_OUTPUTS);

/// Range proof batch plan, partitioning outputs into batches
#[derive(Clone, PartialEq, Debug)]
pub struct BatchPlan {
    grouping: Vec<usize, MAX_OUTPUTS>,
}

impl BatchPlan {
    /// Create a batch plan from the provided grouping, checking this
    /// partitions exactly `output_count` outputs
    pub fn new(grouping: &[usize], output_count: usize) -> Result<Self, Error> {
        if grouping.is_empty() || grouping.len() > MAX_OUTPUTS {
            return Err(Error::InvalidGrouping);
        }

        if grouping.iter().any(|g| *g == 0 || *g > MAX_BATCH_OUTPUTS) {
            return Err(Error::InvalidGrouping);
        }

        if grouping.iter().sum::<usize>() != output_count {
            return Err(Error::InvalidGrouping);
        }

        let grouping = Vec::from_slice(grouping).map_err(|_| Error::InvalidGrouping)?;

        Ok(Self { grouping })
    }

    /// Create a plan with a single batch over all outputs
    pub fn single(output_count: usize) -> Result<Self, Error> {
        Self::new(&[output_count], output_count)
    }

    /// Fetch the grouping
    pub fn grouping(&self) -> &[usize] {
        &self.grouping
    }

    /// Fetch the number of batches
    pub fn batches(&self) -> usize {
        self.grouping.len()
    }

    /// Fetch the size of the largest batch
    pub fn max_batch(&self) -> usize {
        self.grouping.iter().copied().max().unwrap_or(0)
    }

    /// Fetch the batch index for an output, the smallest `r` such that the
    /// prefix sum of `grouping[..=r]` exceeds the output index
    pub fn batch_of(&self, index: usize) -> Option<usize> {
        let mut end = 0;

        for (r, g) in self.grouping.iter().enumerate() {
            end += g;
            if index < end {
                return Some(r);
            }
        }

        None
    }

    /// Check whether an output closes its batch
    pub fn is_last_in_batch(&self, index: usize) -> bool {
        match self.batch_of(index) {
            Some(r) => self.grouping[..=r].iter().sum::<usize>() == index + 1,
            None => false,
        }
    }
}

/// Amounts and masks for a closed batch
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Batch {
    pub amounts: Vec<u64, MAX_BATCH_OUTPUTS>,
    pub masks: Vec<Scalar, MAX_BATCH_OUTPUTS>,
}

impl Zeroize for Batch {
    fn zeroize(&mut self) {
        self.amounts.iter_mut().for_each(|a| a.zeroize());
        self.masks.iter_mut().for_each(|m| m.zeroize());
        self.amounts.clear();
        self.masks.clear();
    }
}

impl Drop for Batch {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// Per-batch accumulator for output amounts and masks
#[derive(Debug, Default)]
pub struct BatchAccumulator {
    current: Batch,
    peak: usize,
    released: bool,
}

impl BatchAccumulator {
    /// Create a new (empty) accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an output amount and mask to the current batch
    pub fn push(&mut self, amount: u64, mask: Scalar) -> Result<(), Error> {
        if self.released {
            return Err(Error::InvalidState);
        }

        self.current
            .amounts
            .push(amount)
            .map_err(|_| Error::BatchTooLarge)?;

        if self.current.masks.push(mask).is_err() {
            self.current.amounts.pop();
            return Err(Error::BatchTooLarge);
        }

        self.peak = self.peak.max(self.current.amounts.len());

        Ok(())
    }

    /// Close the current batch, returning its contents and resetting the accumulator
    pub fn close(&mut self) -> Batch {
        core::mem::take(&mut self.current)
    }

    /// Release the accumulator once no further batches are expected
    pub fn release(&mut self) {
        self.current.zeroize();
        self.released = true;
    }

    /// Fetch amounts in the current batch
    pub fn amounts(&self) -> &[u64] {
        &self.current.amounts
    }

    /// Fetch masks in the current batch
    pub fn masks(&self) -> &[Scalar] {
        &self.current.masks
    }

    /// Fetch the number of outputs in the current batch
    pub fn len(&self) -> usize {
        self.current.amounts.len()
    }

    /// Check whether the current batch is empty
    pub fn is_empty(&self) -> bool {
        self.current.amounts.is_empty()
    }

    /// High-water mark of outputs held at once
    pub fn peak(&self) -> usize {
        self.peak
    }

    /// Check whether the accumulator has been released
    pub fn is_released(&self) -> bool {
        self.released
    }
}

#[cfg(test)]
mod test {
    extern crate std;

    use std::vec::Vec;

    use super::*;

    /// Brute force partition, batch index for each output
    fn partition(grouping: &[usize]) -> Vec<usize> {
        grouping
            .iter()
            .enumerate()
            .flat_map(|(r, g)| core::iter::repeat(r).take(*g))
            .collect()
    }

    #[test]
    fn batch_boundaries() {
        let tests: &[&[usize]] = &[
            &[1],
            &[2],
            &[1, 1],
            &[2, 1],
            &[1, 2],
            &[3, 1, 2],
            &[1, 1, 1, 1],
            &[4, 4, 4, 4],
            &[16],
            &[5, 1, 7, 3],
        ];

        for g in tests {
            let n = g.iter().sum();
            let plan = BatchPlan::new(g, n).unwrap();
            let expected = partition(g);

            for i in 0..n {
                assert_eq!(plan.batch_of(i), Some(expected[i]), "batch for {i} in {g:?}");

                let last = i + 1 == n || expected[i + 1] != expected[i];
                assert_eq!(plan.is_last_in_batch(i), last, "last for {i} in {g:?}");
            }

            // Exactly one closing output per batch
            let closing = (0..n).filter(|i| plan.is_last_in_batch(*i)).count();
            assert_eq!(closing, g.len());

            // Out of range outputs belong to no batch
            assert_eq!(plan.batch_of(n), None);
            assert!(!plan.is_last_in_batch(n));
        }
    }

    #[test]
    fn invalid_groupings() {
        let tests: &[(&[usize], usize)] = &[
            (&[], 0),
            (&[0, 2], 2),
            (&[1, 1], 3),
            (&[2, 2], 3),
            (&[17], 17),
        ];

        for (g, n) in tests {
            assert_eq!(
                BatchPlan::new(g, *n),
                Err(Error::InvalidGrouping),
                "grouping {g:?} for {n} outputs"
            );
        }
    }

    #[test]
    fn accumulator_lifecycle() {
        let mut a = BatchAccumulator::new();

        a.push(10, Scalar::from(1u64)).unwrap();
        a.push(20, Scalar::from(2u64)).unwrap();
        assert_eq!(a.len(), 2);

        // Close returns contents and resets
        let b = a.close();
        assert_eq!(&b.amounts[..], &[10, 20]);
        assert_eq!(&b.masks[..], &[Scalar::from(1u64), Scalar::from(2u64)]);
        assert!(a.is_empty());

        a.push(30, Scalar::from(3u64)).unwrap();
        assert_eq!(a.peak(), 2);

        // Released accumulators reject further use
        a.release();
        assert!(a.is_released());
        assert!(a.is_empty());
        assert_eq!(a.push(40, Scalar::ONE), Err(Error::InvalidState));
    }

    #[test]
    fn accumulator_bounded() {
        let mut a = BatchAccumulator::new();

        for i in 0..MAX_BATCH_OUTPUTS {
            a.push(i as u64, Scalar::ONE).unwrap();
        }

        assert_eq!(a.push(0, Scalar::ONE), Err(Error::BatchTooLarge));
        assert_eq!(a.len(), MAX_BATCH_OUTPUTS);
        assert_eq!(a.masks().len(), MAX_BATCH_OUTPUTS);
        assert_eq!(a.peak(), MAX_BATCH_OUTPUTS);
    }
}
