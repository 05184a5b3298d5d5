use std::sync::Arc;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::application::ports::SettingsProvider;
use crate::domain::JobType;

const DEFAULT_HOURLY_RATE: f64 = 80_000.0;
const DEFAULT_MIN_HOURS: f64 = 2.0;
const DEFAULT_BASE_PRICE: f64 = 100_000.0;

/// Deterministic price computation driven by system settings:
/// `rate * max(hours, min_hours) * quantity`, floored at the base price.
pub struct PricingEngine {
    settings: Arc<dyn SettingsProvider>,
}

impl PricingEngine {
    pub fn new(settings: Arc<dyn SettingsProvider>) -> Self {
        Self { settings }
    }

    /// `job_type` is reserved for per-type multipliers; every category
    /// currently prices the same way.
    pub async fn price(
        &self,
        _job_type: JobType,
        worker_quantity: u32,
        estimated_hours: f64,
    ) -> Decimal {
        let hourly_rate = self
            .settings
            .get_number("hourly_rate", DEFAULT_HOURLY_RATE)
            .await;
        let min_hours = self.settings.get_number("min_hours", DEFAULT_MIN_HOURS).await;
        let base_price = self
            .settings
            .get_number("base_price", DEFAULT_BASE_PRICE)
            .await;

        let billed_hours = estimated_hours.max(min_hours);
        let raw = hourly_rate * billed_hours * worker_quantity as f64;

        let price = Decimal::from_f64(raw)
            .unwrap_or_else(|| Decimal::from_f64(DEFAULT_BASE_PRICE).unwrap_or_default())
            .round_dp(2);
        let floor = Decimal::from_f64(base_price).unwrap_or_default().round_dp(2);

        price.max(floor)
    }
}
