use super::allocation::AllocationPolicy;
use crate::domain::account::types::AccountRecord;
use crate::domain::errors::{DashboardError, DashboardResult};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Max buying-power reduction for undefined-risk positions, as a fraction of net liq.
pub const UNDEFINED_RISK_BPR: Decimal = dec!(0.07);
/// Max buying-power reduction for defined-risk positions, as a fraction of net liq.
pub const DEFINED_RISK_BPR: Decimal = dec!(0.05);
pub const THETA_FLOOR: Decimal = dec!(0.001);
pub const THETA_CEILING: Decimal = dec!(0.002);

/// Allocation figures for one account, derived against the current index level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountStats {
    pub account_number: String,
    pub nickname: String,
    pub net_liquidating_value: Decimal,
    pub max_short_premium_percent: Decimal,
    /// Always `1 - max_short_premium_percent`.
    pub cash_or_low_risk_percent: Decimal,
    pub max_short_premium: Decimal,
    pub cash_or_low_risk: Decimal,
    pub max_undefined_risk_bpr: Decimal,
    pub max_defined_risk_bpr: Decimal,
    /// `ceil(0.1% of net liq)`
    pub portfolio_theta_min: Decimal,
    /// `floor(0.2% of net liq)`. Can be below the min for small accounts.
    pub portfolio_theta_max: Decimal,
}

impl AccountStats {
    pub fn theta_range_inverted(&self) -> bool {
        self.portfolio_theta_min > self.portfolio_theta_max
    }
}

pub fn parse_net_liq(raw: &str, account_number: &str) -> DashboardResult<Decimal> {
    Decimal::from_str(raw.trim()).map_err(|e| {
        DashboardError::parse(format!(
            "net-liquidating-value '{}' for {} is not numeric: {}",
            raw, account_number, e
        ))
    })
}

/// Derives [`AccountStats`] for an account whose balance has been attached.
pub fn derive_account_stats(record: &AccountRecord, index_last: f64) -> DashboardResult<AccountStats> {
    let balance = record.balance.as_ref().ok_or_else(|| {
        DashboardError::unavailable(format!("no balance for {}", record.account_number))
    })?;
    let net_liq = parse_net_liq(&balance.net_liquidating_value, &record.account_number)?;

    let short_alloc = AllocationPolicy::short_premium_allocation(index_last);
    let cash_alloc = Decimal::ONE - short_alloc;

    Ok(AccountStats {
        account_number: record.account_number.clone(),
        nickname: record.nickname.clone(),
        net_liquidating_value: net_liq,
        max_short_premium_percent: short_alloc,
        cash_or_low_risk_percent: cash_alloc,
        max_short_premium: short_alloc * net_liq,
        cash_or_low_risk: cash_alloc * net_liq,
        max_undefined_risk_bpr: UNDEFINED_RISK_BPR * net_liq,
        max_defined_risk_bpr: DEFINED_RISK_BPR * net_liq,
        portfolio_theta_min: (THETA_FLOOR * net_liq).ceil(),
        portfolio_theta_max: (THETA_CEILING * net_liq).floor(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::types::Balance;

    fn record(net_liq: &str) -> AccountRecord {
        let mut record = AccountRecord::new("5WT00001", "Roth");
        record.balance = Some(Balance {
            account_number: "5WT00001".to_string(),
            net_liquidating_value: net_liq.to_string(),
            extra: Default::default(),
        });
        record
    }

    #[test]
    fn test_reference_account() {
        let stats = derive_account_stats(&record("100000"), 18.0).unwrap();

        assert_eq!(stats.max_short_premium_percent, dec!(0.30));
        assert_eq!(stats.max_short_premium, dec!(30000.00));
        assert_eq!(stats.cash_or_low_risk, dec!(70000.00));
        assert_eq!(stats.max_undefined_risk_bpr, dec!(7000.00));
        assert_eq!(stats.max_defined_risk_bpr, dec!(5000.00));
        assert_eq!(stats.portfolio_theta_min, dec!(100));
        assert_eq!(stats.portfolio_theta_max, dec!(200));
    }

    #[test]
    fn test_percentages_and_amounts_are_complementary() {
        for (net_liq, level) in [("12345.67", 12.0), ("98765.43", 25.5), ("0.01", 55.0)] {
            let stats = derive_account_stats(&record(net_liq), level).unwrap();
            assert_eq!(
                stats.max_short_premium_percent + stats.cash_or_low_risk_percent,
                Decimal::ONE
            );
            assert_eq!(
                stats.max_short_premium + stats.cash_or_low_risk,
                stats.net_liquidating_value
            );
        }
    }

    #[test]
    fn test_small_account_theta_range_inverts() {
        let stats = derive_account_stats(&record("700"), 18.0).unwrap();
        // ceil(0.7) = 1, floor(1.4) = 1
        assert_eq!(stats.portfolio_theta_min, dec!(1));
        assert_eq!(stats.portfolio_theta_max, dec!(1));
        assert!(!stats.theta_range_inverted());

        let stats = derive_account_stats(&record("1200"), 18.0).unwrap();
        // ceil(1.2) = 2, floor(2.4) = 2
        assert!(!stats.theta_range_inverted());

        let stats = derive_account_stats(&record("450"), 18.0).unwrap();
        // ceil(0.45) = 1, floor(0.9) = 0
        assert_eq!(stats.portfolio_theta_min, dec!(1));
        assert_eq!(stats.portfolio_theta_max, dec!(0));
        assert!(stats.theta_range_inverted());
    }

    #[test]
    fn test_non_numeric_net_liq_is_parse_error() {
        let err = derive_account_stats(&record("n/a"), 18.0).unwrap_err();
        assert!(matches!(err, DashboardError::Parse { .. }));
    }

    #[test]
    fn test_missing_balance_fails() {
        let record = AccountRecord::new("5WT00002", "IRA");
        assert!(matches!(
            derive_account_stats(&record, 18.0),
            Err(DashboardError::DataUnavailable { .. })
        ));
    }
}
