//! Fee schedule applied before distribution

use serde::{Deserialize, Serialize};

use fundpool_core::TokenAmount;

/// Platform fee taken from every campaign pool
pub const PLATFORM_FEE_PERCENT: u64 = 15;

/// Percentage deductions from a campaign pool
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// 0-100
    pub platform_percent: u64,
    /// 0-100
    pub admin_percent: u64,
}

impl FeeSchedule {
    /// Percentages above 100 are clamped
    pub fn new(platform_percent: u64, admin_percent: u64) -> Self {
        FeeSchedule {
            platform_percent: platform_percent.min(100),
            admin_percent: admin_percent.min(100),
        }
    }

    /// Standard platform fee plus a campaign's admin fee
    pub fn with_admin(admin_percent: u64) -> Self {
        Self::new(PLATFORM_FEE_PERCENT, admin_percent)
    }

    pub fn total_percent(&self) -> u64 {
        self.platform_percent + self.admin_percent
    }

    /// Fees consume the whole pool
    pub fn is_degenerate(&self) -> bool {
        self.total_percent() >= 100
    }

    /// `total × (1 − platform/100 − admin/100)`, clamped at zero.
    /// Computed on the fixed-point integer, rounded down.
    pub fn available_for_projects(&self, total: TokenAmount) -> TokenAmount {
        if self.is_degenerate() {
            return TokenAmount::ZERO;
        }
        total.percent_of(100 - self.total_percent())
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        FeeSchedule::with_admin(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_after_fees() {
        let fees = FeeSchedule::with_admin(5);
        let available = fees.available_for_projects(TokenAmount::from_tokens(1000));
        assert_eq!(available, TokenAmount::from_tokens(800));
    }

    #[test]
    fn test_degenerate_fees() {
        let fees = FeeSchedule::with_admin(85);
        assert!(fees.is_degenerate());
        assert_eq!(fees.available_for_projects(TokenAmount::from_tokens(1000)), TokenAmount::ZERO);

        let over = FeeSchedule::new(60, 70);
        assert_eq!(over.available_for_projects(TokenAmount::from_tokens(1)), TokenAmount::ZERO);
    }

    #[test]
    fn test_clamped_percentages() {
        let fees = FeeSchedule::new(250, 0);
        assert_eq!(fees.platform_percent, 100);
        assert!(fees.is_degenerate());
    }

    #[test]
    fn test_no_fees() {
        let fees = FeeSchedule::new(0, 0);
        let pool = TokenAmount::from_raw(123_456_789);
        assert_eq!(fees.available_for_projects(pool), pool);
    }
}
