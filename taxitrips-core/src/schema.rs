//! Canonical trip-record schema and vendor column normalization.

use polars::prelude::*;

/// The columns every validated frame must carry, in canonical order.
pub const CANONICAL_COLUMNS: [&str; 19] = [
    "vendor_id",
    "pickup_datetime",
    "dropoff_datetime",
    "passenger_count",
    "trip_distance",
    "rate_code_id",
    "store_and_fwd_flag",
    "pickup_location_id",
    "dropoff_location_id",
    "payment_type",
    "fare_amount",
    "extra",
    "mta_tax",
    "tip_amount",
    "tolls_amount",
    "improvement_surcharge",
    "total_amount",
    "congestion_surcharge",
    "airport_fee",
];

/// Vendor column name → canonical column name.
pub const VENDOR_RENAMES: [(&str, &str); 7] = [
    ("VendorID", "vendor_id"),
    ("tpep_pickup_datetime", "pickup_datetime"),
    ("tpep_dropoff_datetime", "dropoff_datetime"),
    ("RatecodeID", "rate_code_id"),
    ("PULocationID", "pickup_location_id"),
    ("DOLocationID", "dropoff_location_id"),
    ("Airport_fee", "airport_fee"),
];

/// Renames vendor-specific columns to their canonical names.
pub struct SchemaNormalizer;

impl SchemaNormalizer {
    /// Apply every applicable rename. Never fails.
    ///
    /// A rename is skipped when the vendor column is absent, or when the
    /// canonical name is already taken (the vendor column is then left as-is).
    pub fn normalize(df: DataFrame) -> DataFrame {
        Self::normalize_with_renames(df).0
    }

    /// Like [`normalize`](Self::normalize), also returning the renames that
    /// were actually applied, in table order.
    pub fn normalize_with_renames(
        mut df: DataFrame,
    ) -> (DataFrame, Vec<(&'static str, &'static str)>) {
        let mut applied = Vec::new();
        for (vendor, canonical) in Self::applicable_renames(&df) {
            if df.rename(vendor, canonical.into()).is_ok() {
                applied.push((vendor, canonical));
            }
        }
        (df, applied)
    }

    /// The renames `normalize` would perform on this frame, in table order.
    pub fn applicable_renames(df: &DataFrame) -> Vec<(&'static str, &'static str)> {
        let schema = df.schema();
        VENDOR_RENAMES
            .iter()
            .filter(|(vendor, canonical)| schema.contains(vendor) && !schema.contains(canonical))
            .copied()
            .collect()
    }
}
