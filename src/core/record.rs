// src/core/record.rs

//! Per-shot measurement bookkeeping.

use super::error::{EngineError, EngineResult};
use std::fmt;

/// Append-only record of every measurement outcome produced during one shot,
/// plus an independent snapshot of the most recently captured block.
///
/// The global record only ever grows. Replacing the last-block snapshot never
/// touches the global record's length or ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasurementLog {
    /// Every outcome of the shot, in production order.
    record: Vec<bool>,
    /// Outcomes of the last block executed with `capture_as_last = true`.
    last_block: Vec<bool>,
}

impl MeasurementLog {
    /// Creates an empty log for a fresh shot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extends the global record with `outcomes`, preserving their order.
    pub fn append(&mut self, outcomes: &[bool]) {
        self.record.extend_from_slice(outcomes);
    }

    /// Replaces the last captured block with `outcomes`.
    pub fn set_last_block(&mut self, outcomes: Vec<bool>) {
        self.last_block = outcomes;
    }

    /// Reads the global record. Negative indices count back from the end,
    /// so `-1` is the most recent outcome.
    pub fn read(&self, index: i64) -> EngineResult<bool> {
        let len = self.record.len();
        resolve_index(index, len)
            .map(|actual| self.record[actual])
            .ok_or_else(|| {
                EngineError::index(format!(
                    "record index {} out of range for record of size {}",
                    index, len
                ))
            })
    }

    /// Reads position `index` of the last captured block. Negative indices
    /// are rejected: the block is addressed by plain offsets only.
    pub fn read_last(&self, index: i64) -> EngineResult<bool> {
        let len = self.last_block.len();
        usize::try_from(index)
            .ok()
            .filter(|i| *i < len)
            .map(|i| self.last_block[i])
            .ok_or_else(|| {
                EngineError::index(format!(
                    "LastMeas index {} out of range for last block of size {}",
                    index, len
                ))
            })
    }

    /// Number of outcomes recorded so far in this shot.
    pub fn len(&self) -> usize {
        self.record.len()
    }

    /// Returns `true` if nothing has been measured yet.
    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }

    /// The full global record.
    pub fn outcomes(&self) -> &[bool] {
        &self.record
    }

    /// The last captured block's outcomes.
    pub fn last_block(&self) -> &[bool] {
        &self.last_block
    }

    /// Consumes the log, yielding the global record as the shot's sample.
    pub fn into_outcomes(self) -> Vec<bool> {
        self.record
    }
}

/// Maps a possibly-negative index onto `[0, len)`.
pub(crate) fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let actual = if index < 0 { len + index } else { index };
    if (0..len).contains(&actual) {
        usize::try_from(actual).ok()
    } else {
        None
    }
}

impl fmt::Display for MeasurementLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record[")?;
        for bit in &self.record {
            write!(f, "{}", u8::from(*bit))?;
        }
        write!(f, "] Last[")?;
        for bit in &self.last_block {
            write!(f, "{}", u8::from(*bit))?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_grows_monotonically() {
        let mut log = MeasurementLog::new();
        assert!(log.is_empty());
        log.append(&[true, false]);
        log.append(&[]);
        log.append(&[true]);
        assert_eq!(log.outcomes(), &[true, false, true]);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn last_block_is_independent_of_record() {
        let mut log = MeasurementLog::new();
        log.append(&[false, false, true]);
        log.set_last_block(vec![true]);
        assert_eq!(log.len(), 3);
        assert_eq!(log.last_block(), &[true]);

        log.set_last_block(vec![false, true]);
        assert_eq!(log.outcomes(), &[false, false, true]);
        assert_eq!(log.last_block(), &[false, true]);
    }

    #[test]
    fn negative_read_counts_from_end() -> EngineResult<()> {
        let mut log = MeasurementLog::new();
        log.append(&[true, false, false]);
        assert!(!log.read(-1)?);
        assert!(log.read(-3)?);
        assert_eq!(log.read(-1)?, log.read(2)?);
        Ok(())
    }

    #[test]
    fn out_of_range_reads_fail() {
        let mut log = MeasurementLog::new();
        log.append(&[true, true]);
        assert!(matches!(log.read(2), Err(EngineError::Index { .. })));
        assert!(matches!(log.read(-3), Err(EngineError::Index { .. })));
        assert!(matches!(log.read_last(0), Err(EngineError::Index { .. })));

        log.set_last_block(vec![true]);
        assert!(matches!(log.read_last(-1), Err(EngineError::Index { .. })));
        assert!(matches!(log.read_last(1), Err(EngineError::Index { .. })));
        assert_eq!(log.read_last(0), Ok(true));
    }

    #[test]
    fn display_lists_bits() {
        let mut log = MeasurementLog::new();
        log.append(&[true, false]);
        log.set_last_block(vec![false]);
        assert_eq!(log.to_string(), "Record[10] Last[0]");
    }

    proptest::proptest! {
        #[test]
        fn negative_index_mirrors_positive(bits in proptest::collection::vec(proptest::bool::ANY, 1..32), offset in 0usize..32) {
            let mut log = MeasurementLog::new();
            log.append(&bits);
            let n = bits.len();
            let i = offset % n;
            let negative = i as i64 - n as i64;
            proptest::prop_assert_eq!(log.read(negative), log.read(i as i64));
            proptest::prop_assert_eq!(log.read(i as i64), Ok(bits[i]));
            proptest::prop_assert!(log.read(n as i64).is_err());
            proptest::prop_assert!(log.read(-(n as i64) - 1).is_err());
        }
    }
}
