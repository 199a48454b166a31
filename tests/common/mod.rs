//! Shared fixtures for the integration tests

#![allow(dead_code)]

use polars::prelude::*;
use shoptrend::schema::{
    Record, AGE, CATEGORY, COLOR, CUSTOMER_ID, DISCOUNT_APPLIED, FREQUENCY_OF_PURCHASES, GENDER,
    ITEM_PURCHASED, LOCATION, PAYMENT_METHOD, PREVIOUS_PURCHASES, PROMO_CODE_USED,
    PURCHASE_AMOUNT, REVIEW_RATING, SEASON, SHIPPING_TYPE, SIZE, SUBSCRIPTION_STATUS,
};
use std::path::PathBuf;

const LOCATIONS: [&str; 5] = ["Kentucky", "Maine", "Oregon", "Montana", "Hawaii"];
const SIZES: [&str; 4] = ["S", "M", "L", "XL"];
const COLORS: [&str; 6] = ["Gray", "Maroon", "Teal", "White", "Black", "Olive"];
const SEASONS: [&str; 4] = ["Winter", "Spring", "Summer", "Fall"];
const SHIPPING: [&str; 4] = ["Express", "Free Shipping", "Standard", "Store Pickup"];
const PAYMENT: [&str; 5] = ["Venmo", "Cash", "PayPal", "Credit Card", "Debit Card"];
const FREQUENCY: [&str; 4] = ["Weekly", "Fortnightly", "Monthly", "Annually"];

/// Install a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Path of the bundled CSV sample
pub fn sample_csv() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/shopping_sample.csv")
}

/// Deterministic table in the full shopping-trends layout.
///
/// Even rows are Clothing with amounts in 20..45, odd rows Footwear with
/// amounts in 70..95; every other attribute cycles independently.
pub fn shopping_df(n: usize) -> DataFrame {
    let idx: Vec<usize> = (0..n).collect();
    let customer_id: Vec<i64> = idx.iter().map(|&i| i as i64 + 1).collect();
    let age: Vec<i64> = idx.iter().map(|&i| 18 + (i * 13 % 50) as i64).collect();
    let amount: Vec<f64> = idx
        .iter()
        .map(|&i| {
            if i % 2 == 0 {
                20.0 + (i * 7 % 25) as f64
            } else {
                70.0 + (i * 11 % 25) as f64
            }
        })
        .collect();
    let rating: Vec<f64> = idx.iter().map(|&i| 2.5 + (i % 25) as f64 / 10.0).collect();
    let previous: Vec<i64> = idx.iter().map(|&i| 1 + (i * 3 % 49) as i64).collect();

    df!(
        CUSTOMER_ID => customer_id,
        AGE => age,
        GENDER => pick(n, &["Male", "Female"], &|i| i / 3),
        ITEM_PURCHASED => pick(n, &["Blouse", "Sneakers"], &|i| i),
        CATEGORY => pick(n, &["Clothing", "Footwear"], &|i| i),
        PURCHASE_AMOUNT => amount,
        LOCATION => pick(n, &LOCATIONS, &|i| i),
        SIZE => pick(n, &SIZES, &|i| i / 2),
        COLOR => pick(n, &COLORS, &|i| i * 5),
        SEASON => pick(n, &SEASONS, &|i| i / 2),
        REVIEW_RATING => rating,
        SUBSCRIPTION_STATUS => yes_no(n, &|i| i % 3 == 0),
        SHIPPING_TYPE => pick(n, &SHIPPING, &|i| i / 3),
        DISCOUNT_APPLIED => yes_no(n, &|i| i % 5 == 0),
        PROMO_CODE_USED => yes_no(n, &|i| i % 5 == 0),
        PREVIOUS_PURCHASES => previous,
        PAYMENT_METHOD => pick(n, &PAYMENT, &|i| i * 3),
        FREQUENCY_OF_PURCHASES => pick(n, &FREQUENCY, &|i| i / 5),
    )
    .unwrap()
}

fn pick(n: usize, values: &[&str], f: &dyn Fn(usize) -> usize) -> Vec<String> {
    (0..n).map(|i| values[f(i) % values.len()].to_string()).collect()
}

fn yes_no(n: usize, f: &dyn Fn(usize) -> bool) -> Vec<String> {
    (0..n)
        .map(|i| if f(i) { "Yes" } else { "No" }.to_string())
        .collect()
}

/// Row `idx` as a prediction input (target removed, identifiers kept).
pub fn record_at(df: &DataFrame, idx: usize) -> Record {
    let mut record = Record::from_row(df, idx).unwrap();
    record.remove(CATEGORY);
    record
}

/// A hand-written customer using values present in [`shopping_df`].
pub fn clothing_customer() -> Record {
    Record::new()
        .with(AGE, 30i64)
        .with(GENDER, "Female")
        .with(PURCHASE_AMOUNT, 30.0)
        .with(LOCATION, "Maine")
        .with(SIZE, "M")
        .with(COLOR, "Teal")
        .with(SEASON, "Winter")
        .with(REVIEW_RATING, 3.5)
        .with(SUBSCRIPTION_STATUS, "No")
        .with(SHIPPING_TYPE, "Express")
        .with(DISCOUNT_APPLIED, "No")
        .with(PROMO_CODE_USED, "No")
        .with(PREVIOUS_PURCHASES, 12i64)
        .with(PAYMENT_METHOD, "Cash")
        .with(FREQUENCY_OF_PURCHASES, "Monthly")
}
