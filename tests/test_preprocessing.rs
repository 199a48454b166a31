//! Integration test: Preprocessing pipeline end-to-end

mod common;

use polars::prelude::*;
use proptest::prelude::*;
use shoptrend::error::ShoptrendError;
use shoptrend::preprocessing::{preprocess, EncoderSet, LabelEncoder, Preprocessor};
use shoptrend::schema::{self, ColumnKind};

#[test]
fn test_full_schema_fit_transform() {
    let df = common::shopping_df(40);
    let (encoded, encoders) = Preprocessor::default().fit_transform(&df).unwrap();

    assert_eq!(encoded.height(), 40, "row count should be preserved");
    assert_eq!(encoded.width(), df.width() - 2, "customer id and item dropped");
    assert!(encoded.column(schema::CUSTOMER_ID).is_err());
    assert!(encoded.column(schema::ITEM_PURCHASED).is_err());

    for column in encoded.get_columns() {
        assert!(
            matches!(column.dtype(), DataType::Int64 | DataType::Float64),
            "{} should be numeric after encoding, got {:?}",
            column.name(),
            column.dtype()
        );
    }

    // Gender, Location, Size, Color, Season, Subscription, Shipping, Discount,
    // Promo, Payment, Frequency, Category
    assert_eq!(encoders.len(), 12);
    assert!(!encoders.contains(schema::AGE));
    assert!(!encoders.contains(schema::REVIEW_RATING));
}

#[test]
fn test_classes_are_sorted() {
    let df = common::shopping_df(12);
    let (_, encoders) = Preprocessor::default().fit_transform(&df).unwrap();

    let seasons = encoders.get(schema::SEASON).unwrap();
    assert_eq!(seasons.classes(), &["Fall", "Spring", "Summer", "Winter"]);
    assert_eq!(seasons.encode("Winter").unwrap(), 3);
}

#[test]
fn test_preprocess_entry_point_modes() {
    let df = common::shopping_df(20);

    let (fitted, encoders) = preprocess(&df, None, true).unwrap();
    let (transformed, returned) = preprocess(&df, Some(&encoders), false).unwrap();

    assert!(fitted.equals(&transformed), "transform with fit encoders should reproduce the fit output");
    assert_eq!(returned, encoders);
}

#[test]
fn test_preprocess_fit_replaces_supplied_encoders() {
    let stale = LabelEncoder::fit(schema::SEASON, ["Monsoon"]);
    let extra = LabelEncoder::fit("Loyalty Tier", ["Gold"]);
    let supplied: EncoderSet = [stale, extra].into_iter().collect();

    let df = common::shopping_df(8);
    let (_, encoders) = preprocess(&df, Some(&supplied), true).unwrap();

    assert_eq!(encoders.get(schema::SEASON).unwrap().n_classes(), 4);
    assert!(encoders.contains("Loyalty Tier"), "untouched entries are kept");
}

#[test]
fn test_boolean_columns_are_categorical() {
    let df = df!(
        "Returning" => &[true, false, true],
        schema::CATEGORY => &["Clothing", "Footwear", "Clothing"],
    )
    .unwrap();

    assert_eq!(schema::Schema::infer(&df).kind("Returning"), Some(ColumnKind::Categorical));

    let (encoded, encoders) = Preprocessor::default().fit_transform(&df).unwrap();
    assert_eq!(encoders.get("Returning").unwrap().classes(), &["false", "true"]);
    assert_eq!(encoded.column("Returning").unwrap().dtype(), &DataType::Int64);
}

#[test]
fn test_unseen_value_reports_column() {
    let pre = Preprocessor::default();
    let (_, encoders) = pre.fit_transform(&common::shopping_df(20)).unwrap();

    let df = df!(schema::COLOR => &["Chartreuse"]).unwrap();
    let err = pre.transform(&df, &encoders).unwrap_err();

    match err {
        ShoptrendError::UnknownCategoryError { column, value } => {
            assert_eq!(column, schema::COLOR);
            assert_eq!(value, "Chartreuse");
        }
        other => panic!("expected UnknownCategoryError, got {:?}", other),
    }
}

proptest! {
    #[test]
    fn prop_encode_decode_is_identity(values in prop::collection::vec("[A-Za-z ]{1,12}", 1..40)) {
        let encoder = LabelEncoder::fit("Color", &values);

        for value in &values {
            let code = encoder.encode(value).unwrap();
            prop_assert!(code < encoder.n_classes());
            prop_assert_eq!(encoder.decode(code).unwrap(), value.as_str());
        }
    }

    #[test]
    fn prop_codes_are_dense(values in prop::collection::vec("[a-z]{1,4}", 1..60)) {
        let encoder = LabelEncoder::fit("Size", &values);

        let mut codes: Vec<usize> = values.iter().map(|v| encoder.encode(v).unwrap()).collect();
        codes.sort_unstable();
        codes.dedup();
        prop_assert_eq!(codes, (0..encoder.n_classes()).collect::<Vec<_>>());
    }
}
