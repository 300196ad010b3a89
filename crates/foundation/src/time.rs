use std::time::Duration;

/// Logical timebase in milliseconds.
///
/// The engine never reads a wall clock; drivers pass `Millis` in, which keeps
/// debounce timing deterministic and replayable in tests.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Millis(pub u64);

impl Millis {
    pub fn from_duration(d: Duration) -> Self {
        Millis(d.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_millis(self.0)
    }

    pub fn saturating_add(self, ms: u64) -> Self {
        Millis(self.0.saturating_add(ms))
    }
}

#[cfg(test)]
mod tests {
    use super::Millis;
    use std::time::Duration;

    #[test]
    fn arithmetic_saturates() {
        assert_eq!(Millis(u64::MAX).saturating_add(1), Millis(u64::MAX));
        assert_eq!(Millis(5).saturating_add(4), Millis(9));
    }

    #[test]
    fn duration_conversions() {
        assert_eq!(Millis::from_duration(Duration::from_micros(1_500)), Millis(1));
        assert_eq!(Millis(250).as_duration(), Duration::from_millis(250));
    }
}
