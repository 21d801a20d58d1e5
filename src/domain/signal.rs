//! Entry/exit signal series aligned to a bar index.

use chrono::NaiveDateTime;

use super::error::ScalperError;
use super::ohlcv::Bar;

#[derive(Debug, Clone, PartialEq)]
pub struct SignalSet {
    pub timestamps: Vec<NaiveDateTime>,
    pub enter: Vec<bool>,
    pub exit: Vec<bool>,
}

impl SignalSet {
    /// Build a signal set on the bars' own index.
    pub fn from_flags(bars: &[Bar], enter: Vec<bool>, exit: Vec<bool>) -> Self {
        SignalSet {
            timestamps: bars.iter().map(|b| b.timestamp).collect(),
            enter,
            exit,
        }
    }

    /// All-false signals over the bars' index.
    pub fn empty(bars: &[Bar]) -> Self {
        Self::from_flags(bars, vec![false; bars.len()], vec![false; bars.len()])
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.enter.iter().filter(|&&f| f).count()
    }

    pub fn exit_count(&self) -> usize {
        self.exit.iter().filter(|&&f| f).count()
    }

    /// Bars where both flags are set; exit wins on these.
    pub fn conflict_count(&self) -> usize {
        self.enter
            .iter()
            .zip(&self.exit)
            .filter(|(e, x)| **e && **x)
            .count()
    }

    /// Verify the set lines up 1:1 with `bars`.
    pub fn check_alignment(&self, bars: &[Bar]) -> Result<(), ScalperError> {
        if self.enter.len() != self.timestamps.len() || self.exit.len() != self.timestamps.len() {
            return Err(ScalperError::alignment(format!(
                "signal series lengths differ: {} timestamps, {} enter, {} exit",
                self.timestamps.len(),
                self.enter.len(),
                self.exit.len()
            )));
        }
        if self.timestamps.len() != bars.len() {
            return Err(ScalperError::alignment(format!(
                "{} signals for {} bars",
                self.timestamps.len(),
                bars.len()
            )));
        }
        if let Some(i) = self
            .timestamps
            .iter()
            .zip(bars)
            .position(|(ts, bar)| *ts != bar.timestamp)
        {
            return Err(ScalperError::alignment(format!(
                "signal timestamp {} does not match bar timestamp {} at index {}",
                self.timestamps[i], bars[i].timestamp, i
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bars(n: usize) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n)
            .map(|i| Bar {
                timestamp: start + chrono::Duration::days(i as i64),
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: 1.0,
                volume: 0.0,
            })
            .collect()
    }

    #[test]
    fn counts() {
        let b = bars(4);
        let set = SignalSet::from_flags(
            &b,
            vec![true, false, true, false],
            vec![false, true, true, false],
        );
        assert_eq!(set.len(), 4);
        assert_eq!(set.entry_count(), 2);
        assert_eq!(set.exit_count(), 2);
        assert_eq!(set.conflict_count(), 1);
    }

    #[test]
    fn aligned_set_passes() {
        let b = bars(3);
        assert!(SignalSet::empty(&b).check_alignment(&b).is_ok());
    }

    #[test]
    fn length_mismatch_fails() {
        let b = bars(3);
        let set = SignalSet::empty(&b[..2]);
        assert!(matches!(
            set.check_alignment(&b),
            Err(ScalperError::DataAlignment { .. })
        ));
    }

    #[test]
    fn ragged_flags_fail() {
        let b = bars(3);
        let mut set = SignalSet::empty(&b);
        set.exit.pop();
        assert!(set.check_alignment(&b).is_err());
    }

    #[test]
    fn shifted_index_fails() {
        let b = bars(4);
        let set = SignalSet::empty(&b[1..]);
        let err = set.check_alignment(&b[..3]).unwrap_err();
        assert!(err.to_string().contains("index 0"));
    }
}
