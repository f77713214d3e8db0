//! Symbol frequency model.
//!
//! Both codec modes share one representation: a dense count table indexed
//! by symbol, sized to the whole alphabet so encoder and decoder always
//! start from an identical, fully-known model. Block mode fills it with a
//! single full pass; adaptive mode increments it one symbol at a time.

/// When any count reaches this ceiling, the normalize policy halves every
/// count before the next rebuild. Bounds growth while approximately
/// preserving relative frequency.
pub const COUNT_CEILING: u64 = 1 << 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyModel {
    counts: Vec<u64>,
}

impl FrequencyModel {
    /// A model with every count at zero over `alphabet_size` symbols.
    pub fn new(alphabet_size: usize) -> Self {
        Self {
            counts: vec![0; alphabet_size],
        }
    }

    /// Adds one occurrence of `symbol`.
    pub fn record(&mut self, symbol: u16) {
        self.counts[symbol as usize] += 1;
    }

    /// Full-pass initialization for block mode.
    pub fn count_all(&mut self, symbols: impl IntoIterator<Item = u16>) {
        for symbol in symbols {
            self.record(symbol);
        }
    }

    pub fn count(&self, symbol: u16) -> u64 {
        self.counts[symbol as usize]
    }

    /// Symbols with a non-zero count, in ascending symbol order.
    pub fn observed(&self) -> impl Iterator<Item = (u16, u64)> + '_ {
        self.all().filter(|&(_, count)| count > 0)
    }

    /// Every symbol of the alphabet with its count, in ascending order.
    pub fn all(&self) -> impl Iterator<Item = (u16, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(symbol, &count)| (symbol as u16, count))
    }

    /// True once any count has reached [`COUNT_CEILING`].
    pub fn saturated(&self) -> bool {
        self.counts.iter().any(|&count| count >= COUNT_CEILING)
    }

    /// Floor-halves every count simultaneously.
    pub fn halve(&mut self) {
        for count in &mut self.counts {
            *count /= 2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_start_at_zero_for_the_whole_alphabet() {
        let model = FrequencyModel::new(256);
        assert_eq!(model.all().count(), 256);
        assert_eq!(model.observed().count(), 0);
    }

    #[test]
    fn full_pass_counts_match_input() {
        let mut model = FrequencyModel::new(256);
        model.count_all(b"AAAB".iter().map(|&b| b as u16));
        assert_eq!(model.count(b'A' as u16), 3);
        assert_eq!(model.count(b'B' as u16), 1);
        let observed: Vec<_> = model.observed().collect();
        assert_eq!(observed, vec![(b'A' as u16, 3), (b'B' as u16, 1)]);
    }

    #[test]
    fn halving_floors_every_count() {
        let mut model = FrequencyModel::new(4);
        model.count_all([0, 0, 0, 1, 2]);
        model.halve();
        assert_eq!(model.count(0), 1);
        assert_eq!(model.count(1), 0);
        assert_eq!(model.count(2), 0);
        assert_eq!(model.count(3), 0);
    }

    #[test]
    fn saturation_triggers_exactly_at_the_ceiling() {
        let mut model = FrequencyModel::new(2);
        for _ in 0..COUNT_CEILING - 1 {
            model.record(1);
        }
        assert!(!model.saturated());
        model.record(1);
        assert!(model.saturated());
        model.halve();
        assert_eq!(model.count(1), COUNT_CEILING / 2);
        assert!(!model.saturated());
    }
}
