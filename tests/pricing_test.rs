use std::sync::Arc;

use quickcrew::application::services::PricingEngine;
use quickcrew::domain::JobType;
use quickcrew::infrastructure::settings::StaticSettings;
use rust_decimal_macros::dec;

fn engine(settings: StaticSettings) -> PricingEngine {
    PricingEngine::new(Arc::new(settings))
}

#[tokio::test]
async fn given_hours_below_minimum_then_minimum_hours_are_billed() {
    let pricing = engine(StaticSettings::new());

    // 1h requested, billed as the 2h minimum at 80_000/hr.
    let price = pricing.price(JobType::Cleaning, 1, 1.0).await;
    assert_eq!(price, dec!(160000.00));
}

#[tokio::test]
async fn given_multiple_workers_then_price_scales_linearly() {
    let pricing = engine(StaticSettings::new());

    let one = pricing.price(JobType::Moving, 1, 4.0).await;
    let three = pricing.price(JobType::Moving, 3, 4.0).await;

    assert_eq!(one, dec!(320000.00));
    assert_eq!(three, dec!(960000.00));
}

#[tokio::test]
async fn given_tiny_job_then_base_price_floor_applies() {
    let settings = StaticSettings::new()
        .with("hourly_rate", "100")
        .with("min_hours", "1")
        .with("base_price", "100000");
    let pricing = engine(settings);

    let price = pricing.price(JobType::OddJobs, 1, 1.0).await;
    assert_eq!(price, dec!(100000.00));
}

#[tokio::test]
async fn given_overridden_rates_then_settings_win_over_defaults() {
    let settings = StaticSettings::new()
        .with("hourly_rate", "50000")
        .with("min_hours", "2")
        .with("base_price", "60000");
    let pricing = engine(settings);

    let price = pricing.price(JobType::Loading, 2, 3.0).await;
    assert_eq!(price, dec!(300000.00));
}
