//! Arrow schema for classifier feature vectors.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;

use crate::{FEATURE_COLUMNS, FeatureVector};

/// Schema of the classifier input table, one non-null Float64 column per feature.
pub fn feature_schema() -> Schema {
    Schema::new(
        FEATURE_COLUMNS
            .iter()
            .map(|name| Field::new(*name, DataType::Float64, false))
            .collect::<Vec<_>>(),
    )
}

/// Pack feature vectors into a RecordBatch, one row per vector.
pub fn features_to_batch(features: &[FeatureVector]) -> Result<RecordBatch, ArrowError> {
    let rows: Vec<[f64; FeatureVector::LEN]> = features.iter().map(|f| f.to_array()).collect();

    let columns: Vec<ArrayRef> = (0..FeatureVector::LEN)
        .map(|col| {
            let values: Float64Array = rows.iter().map(|row| row[col]).collect::<Vec<_>>().into();
            Arc::new(values) as ArrayRef
        })
        .collect();

    RecordBatch::try_new(Arc::new(feature_schema()), columns)
}
