//! # Settings
//!
//! The configuration value object threaded into every engine call.
//!
//! ## Why a value object?
//! Credit limits, loyalty parameters, and forecasting windows are read by
//! several engines. They are passed in explicitly rather than read from
//! ambient global state, so every engine call is a pure function of its
//! inputs and tests can vary settings freely.

use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Defaults
// =============================================================================

/// Default credit ceiling for customers without an explicit limit.
pub const DEFAULT_CREDIT_LIMIT_LAARI: i64 = 500_00;

/// Default loyalty earn rate: points per whole rufiyaa of the total.
pub const DEFAULT_POINTS_PER_MVR: i64 = 1;

/// Default sales lookback window for stock forecasting, in days.
pub const DEFAULT_FORECAST_LOOKBACK_DAYS: i64 = 30;

/// Default cover threshold: flag products with fewer days of stock left.
pub const DEFAULT_LOW_STOCK_COVER_DAYS: i64 = 7;

// =============================================================================
// Settings
// =============================================================================

/// Loyalty program configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltySettings {
    /// Whether points are earned at all.
    pub enabled: bool,
    /// Points earned per whole rufiyaa of a transaction total (before the
    /// tier multiplier).
    pub points_per_mvr: i64,
}

impl Default for LoyaltySettings {
    fn default() -> Self {
        LoyaltySettings {
            enabled: true,
            points_per_mvr: DEFAULT_POINTS_PER_MVR,
        }
    }
}

/// Stock forecasting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSettings {
    /// How many days of sale events to average over.
    pub lookback_days: i64,
    /// Flag a product when its remaining cover drops below this many days.
    pub low_stock_cover_days: i64,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        ForecastSettings {
            lookback_days: DEFAULT_FORECAST_LOOKBACK_DAYS,
            low_stock_cover_days: DEFAULT_LOW_STOCK_COVER_DAYS,
        }
    }
}

/// Till-wide settings read by the engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosSettings {
    /// Fallback credit ceiling (laari) for customers without their own.
    pub default_credit_limit_laari: i64,
    pub loyalty: LoyaltySettings,
    pub forecast: ForecastSettings,
}

impl PosSettings {
    /// Returns the fallback credit limit as Money.
    #[inline]
    pub fn default_credit_limit(&self) -> Money {
        Money::from_laari(self.default_credit_limit_laari)
    }
}

impl Default for PosSettings {
    fn default() -> Self {
        PosSettings {
            default_credit_limit_laari: DEFAULT_CREDIT_LIMIT_LAARI,
            loyalty: LoyaltySettings::default(),
            forecast: ForecastSettings::default(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = PosSettings::default();
        assert_eq!(settings.default_credit_limit().laari(), 500_00);
        assert!(settings.loyalty.enabled);
        assert_eq!(settings.forecast.lookback_days, 30);
    }
}
