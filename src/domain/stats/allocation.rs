use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Maps the current index level to the fraction of net liquidating value
/// earmarked for short premium.
///
/// Breakpoints are inclusive upper bounds checked in order; the first match
/// wins and anything above the last breakpoint (including NaN) gets
/// [`AllocationPolicy::CEILING`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllocationPolicy;

impl AllocationPolicy {
    pub const BREAKPOINTS: [(f64, Decimal); 4] = [
        (15.0, dec!(0.25)),
        (20.0, dec!(0.30)),
        (30.0, dec!(0.35)),
        (40.0, dec!(0.40)),
    ];

    pub const CEILING: Decimal = dec!(0.50);

    pub fn short_premium_allocation(index_last: f64) -> Decimal {
        Self::BREAKPOINTS
            .iter()
            .find(|(upper, _)| index_last <= *upper)
            .map(|(_, alloc)| *alloc)
            .unwrap_or(Self::CEILING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakpoint_table() {
        let levels = [15.0, 15.01, 20.0, 20.01, 30.0, 30.01, 40.0, 40.01, 100.0];
        let expected = [
            dec!(0.25),
            dec!(0.30),
            dec!(0.30),
            dec!(0.35),
            dec!(0.35),
            dec!(0.40),
            dec!(0.40),
            dec!(0.50),
            dec!(0.50),
        ];

        for (level, want) in levels.iter().zip(expected.iter()) {
            assert_eq!(
                AllocationPolicy::short_premium_allocation(*level),
                *want,
                "level {}",
                level
            );
        }
    }

    #[test]
    fn test_monotonic_non_decreasing() {
        let mut previous = Decimal::ZERO;
        let mut level = 0.0;
        while level < 80.0 {
            let alloc = AllocationPolicy::short_premium_allocation(level);
            assert!(alloc >= previous, "dropped at {}", level);
            previous = alloc;
            level += 0.05;
        }
    }

    #[test]
    fn test_total_over_odd_inputs() {
        assert_eq!(AllocationPolicy::short_premium_allocation(-5.0), dec!(0.25));
        assert_eq!(
            AllocationPolicy::short_premium_allocation(f64::NAN),
            AllocationPolicy::CEILING
        );
        assert_eq!(
            AllocationPolicy::short_premium_allocation(f64::INFINITY),
            AllocationPolicy::CEILING
        );
    }
}
