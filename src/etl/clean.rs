use crate::table::{Cell, ColumnType, Table};
use crate::{EtlError, EtlResult};
use tracing::{debug, warn};

pub const INTEGER_COLUMNS: [&str; 8] = [
    "CustomerID",
    "Age",
    "Tenure",
    "Usage Frequency",
    "Support Calls",
    "Payment Delay",
    "Last Interaction",
    "Churn",
];

pub const FLOAT_COLUMNS: [&str; 1] = ["Total Spend"];

/// Columns forced to a numeric type after incomplete rows are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionPlan {
    pub integer_columns: Vec<String>,
    pub float_columns: Vec<String>,
}

impl CoercionPlan {
    pub fn churn() -> Self {
        Self {
            integer_columns: INTEGER_COLUMNS.iter().map(|c| c.to_string()).collect(),
            float_columns: FLOAT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.integer_columns
            .iter()
            .chain(&self.float_columns)
            .map(String::as_str)
    }
}

impl Default for CoercionPlan {
    fn default() -> Self {
        Self::churn()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub initial_rows: usize,
    pub dropped_incomplete: usize,
    pub coercion_anomalies: usize,
    pub dropped_after_coercion: usize,
    pub final_rows: usize,
}

pub struct Cleaner {
    plan: CoercionPlan,
    refilter: bool,
}

impl Cleaner {
    pub fn new(plan: CoercionPlan) -> Self {
        Self {
            plan,
            refilter: true,
        }
    }

    // When off, non-numeric text survives as a missing cell in the output
    pub fn with_refilter(mut self, refilter: bool) -> Self {
        self.refilter = refilter;
        self
    }

    pub fn clean(&self, mut table: Table) -> EtlResult<(Table, CleanReport)> {
        let mut report = CleanReport {
            initial_rows: table.len(),
            ..CleanReport::default()
        };

        report.dropped_incomplete = table.drop_incomplete();

        let mut targets = Vec::new();
        for name in &self.plan.integer_columns {
            targets.push((name.as_str(), ColumnType::Int));
        }
        for name in &self.plan.float_columns {
            targets.push((name.as_str(), ColumnType::Float));
        }

        // all columns are checked before any is touched
        let mut resolved = Vec::with_capacity(targets.len());
        for (name, column_type) in targets {
            let idx = table
                .column_index(name)
                .ok_or_else(|| EtlError::MissingColumn(name.to_string()))?;
            resolved.push((name, idx, column_type));
        }

        for (name, idx, column_type) in resolved {
            let mut anomalies = 0;
            table.retype_column(idx, column_type, |cell| {
                let (coerced, anomaly) = match column_type {
                    ColumnType::Int => coerce_int(name, cell)?,
                    _ => coerce_float(cell),
                };
                if anomaly {
                    anomalies += 1;
                }
                Ok(coerced)
            })?;
            if anomalies > 0 {
                warn!(column = name, count = anomalies, "Non-numeric values stored as missing");
            }
            report.coercion_anomalies += anomalies;
        }

        if self.refilter {
            report.dropped_after_coercion = table.drop_incomplete();
        }
        report.final_rows = table.len();

        debug!(?report, "Cleaning finished");
        Ok((table, report))
    }
}

// Returns the coerced cell and whether a present value was turned into a missing one.
fn coerce_int(column: &str, cell: Cell) -> EtlResult<(Cell, bool)> {
    match cell {
        Cell::Int(v) => Ok((Cell::Int(v), false)),
        Cell::Float(f) if f.is_nan() => Ok((Cell::Missing, false)),
        Cell::Float(f) => {
            if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                Ok((Cell::Int(f as i64), false))
            } else {
                Err(EtlError::LossyCast {
                    column: column.to_string(),
                    value: f.to_string(),
                })
            }
        }
        Cell::Text(s) => {
            let trimmed = s.trim();
            if let Ok(v) = trimmed.parse::<i64>() {
                return Ok((Cell::Int(v), false));
            }
            match trimmed.parse::<f64>() {
                Ok(f) => coerce_int(column, Cell::Float(f)),
                Err(_) => {
                    debug!(column, value = %s, "Value is not numeric");
                    Ok((Cell::Missing, true))
                }
            }
        }
        Cell::Missing => Ok((Cell::Missing, false)),
    }
}

fn coerce_float(cell: Cell) -> (Cell, bool) {
    match cell {
        Cell::Int(v) => (Cell::Float(v as f64), false),
        Cell::Float(f) => (Cell::Float(f), false),
        Cell::Text(s) => match s.trim().parse::<f64>() {
            Ok(f) => (Cell::Float(f), false),
            Err(_) => {
                debug!(value = %s, "Value is not numeric");
                (Cell::Missing, true)
            }
        },
        Cell::Missing => (Cell::Missing, false),
    }
}
