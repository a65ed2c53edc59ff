//! Vertical card display for a single assessment.
//!
//! Groups the patient measurements, the derived feature row, and each
//! model's verdict with its recommendation.

use std::fmt;

use arrow::array::{Array, Float64Array};
use arrow::record_batch::RecordBatch;
use hyperisk_core::Assessment;

const LABEL_WIDTH: usize = 26;
const TEXT_WIDTH: usize = 72;

// ── Public API ──

/// An assessment rendered as a card. `features` is the one-row feature batch.
pub struct AssessmentCard<'a> {
    pub assessment: &'a Assessment,
    pub features: &'a RecordBatch,
}

impl fmt::Display for AssessmentCard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let assessment = self.assessment;
        let total = assessment.results.len();

        writeln!(f, "=== Hypertension risk assessment ===")?;
        if total == 0 {
            writeln!(f, "No models loaded")?;
        } else {
            writeln!(
                f,
                "{} of {} models predict hypertension",
                assessment.positive_count(),
                total
            )?;
        }
        writeln!(f)?;

        let p = &assessment.patient;
        writeln!(f, "Patient")?;
        row(f, "weight (kg)", p.weight)?;
        row(f, "height (m)", p.height)?;
        row(f, "total activity", p.total_activity)?;
        row(f, "arterial tension", p.arterial_tension)?;
        row(f, "age", p.age)?;
        writeln!(f)?;

        write_feature_section(f, self.features)?;

        if total > 0 {
            writeln!(f, "Predictions")?;
            for result in &assessment.results {
                row(f, &result.model, result.verdict)?;
                for line in wrap(&result.recommendation, TEXT_WIDTH) {
                    writeln!(f, "    {line}")?;
                }
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

// ── Section rendering ──

fn write_feature_section(f: &mut fmt::Formatter<'_>, batch: &RecordBatch) -> fmt::Result {
    if batch.num_rows() == 0 {
        return Ok(());
    }

    writeln!(f, "Features")?;
    let schema = batch.schema();
    for (field, col) in schema.fields().iter().zip(batch.columns()) {
        if col.is_null(0) {
            continue;
        }
        match col.as_any().downcast_ref::<Float64Array>() {
            Some(arr) => row(f, field.name(), format_args!("{:.2}", arr.value(0)))?,
            None => row(f, field.name(), format_args!("({})", field.data_type()))?,
        }
    }
    writeln!(f)
}

// ── Helpers ──

fn row(f: &mut fmt::Formatter<'_>, label: &str, value: impl fmt::Display) -> fmt::Result {
    writeln!(f, "  {label:<width$} {value}", width = LABEL_WIDTH)
}

/// Greedy word wrap. Words longer than `width` get a line of their own.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
