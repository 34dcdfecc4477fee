// ============================================================
// PROFILER
// ============================================================
// Compute a ProfileReport from a DataTable

use std::collections::{HashMap, HashSet};

use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;

use super::stats;
use crate::domain::error::{AppError, Result};
use crate::domain::profile::{
    Alert, CorrelationMatrix, DatasetOverview, NumericStats, ProfileReport, TextStats,
    VariableProfile, VariableType,
};
use crate::domain::table::{CellValue, DataTable};

static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}[-/]\d{1,2}[-/]\d{1,2}([ T]\d{1,2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:?\d{2})?)?$")
        .expect("valid date regex")
});

/// Thresholds used by the analysis
#[derive(Debug, Clone)]
pub struct ProfileSettings {
    /// Compute correlation matrices
    pub correlations: bool,
    pub histogram_bins: usize,
    pub top_values: usize,
    pub sample_rows: usize,
    pub categorical_max_distinct: usize,
    pub categorical_max_ratio: f64,
    pub high_cardinality: usize,
    pub missing_threshold: f64,
    pub zeros_threshold: f64,
    pub skewness_threshold: f64,
    pub correlation_threshold: f64,
}

impl ProfileSettings {
    /// Full analysis, including correlations
    pub fn explorative() -> Self {
        Self {
            correlations: true,
            ..Self::minimal()
        }
    }

    pub fn minimal() -> Self {
        Self {
            correlations: false,
            histogram_bins: 10,
            top_values: 10,
            sample_rows: 10,
            categorical_max_distinct: 20,
            categorical_max_ratio: 0.5,
            high_cardinality: 50,
            missing_threshold: 0.2,
            zeros_threshold: 0.1,
            skewness_threshold: 20.0,
            correlation_threshold: 0.9,
        }
    }
}

pub struct Profiler {
    settings: ProfileSettings,
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new(ProfileSettings::explorative())
    }
}

impl Profiler {
    pub fn new(settings: ProfileSettings) -> Self {
        Self { settings }
    }

    pub fn profile(&self, table: &DataTable, title: &str) -> Result<ProfileReport> {
        if table.is_empty() {
            return Err(AppError::ProfilingError(
                "DataFrame is empty. Please provide a non-empty DataFrame.".to_string(),
            ));
        }

        let started_at = Local::now();

        let variables: Vec<VariableProfile> = (0..table.column_count())
            .map(|idx| self.profile_variable(table, idx))
            .collect();

        let n_duplicates = count_duplicate_rows(table);
        let overview = self.overview(table, &variables, n_duplicates);

        let correlations = if self.settings.correlations {
            self.correlations(table, &variables)
        } else {
            Vec::new()
        };

        let alerts = self.alerts(&variables, &correlations, n_duplicates);

        let to_strings =
            |row: &Vec<CellValue>| row.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        let n = self.settings.sample_rows;
        let head = table.rows.iter().take(n).map(to_strings).collect();
        let skip = table.row_count().saturating_sub(n);
        let tail = table.rows.iter().skip(skip).map(to_strings).collect();

        Ok(ProfileReport {
            title: title.to_string(),
            started_at,
            finished_at: Local::now(),
            overview,
            variables,
            correlations,
            alerts,
            columns: table.columns.clone(),
            head,
            tail,
        })
    }

    fn profile_variable(&self, table: &DataTable, idx: usize) -> VariableProfile {
        let values: Vec<&CellValue> = table.column(idx).collect();
        let n = values.len();
        let present: Vec<&CellValue> = values.iter().copied().filter(|v| !v.is_missing()).collect();
        let n_missing = n - present.len();

        let mut counts: HashMap<String, usize> = HashMap::new();
        for value in &present {
            *counts.entry(value.to_string()).or_insert(0) += 1;
        }
        let n_distinct = counts.len();

        let var_type = self.detect_type(&present, n_distinct);

        let mut value_counts: Vec<(String, usize)> = counts.into_iter().collect();
        value_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        value_counts.truncate(self.settings.top_values);

        let numeric = match var_type {
            VariableType::Numeric => {
                let raw: Vec<f64> = present.iter().filter_map(|v| v.as_f64()).collect();
                Some(self.numeric_stats(&raw))
            }
            _ => None,
        };

        let text = match var_type {
            VariableType::Categorical | VariableType::Text | VariableType::DateTime => {
                Some(text_stats(&present))
            }
            _ => None,
        };

        VariableProfile {
            name: table.columns[idx].clone(),
            var_type,
            n,
            n_missing,
            p_missing: ratio(n_missing, n),
            n_distinct,
            p_distinct: ratio(n_distinct, present.len()),
            is_unique: n_missing == 0 && n_distinct == n,
            memory_size: values.iter().map(|v| v.memory_size()).sum(),
            value_counts,
            numeric,
            text,
        }
    }

    fn detect_type(&self, present: &[&CellValue], n_distinct: usize) -> VariableType {
        if present.is_empty() {
            return VariableType::Unsupported;
        }
        if n_distinct == 1 {
            return VariableType::Constant;
        }
        if present.iter().all(|v| matches!(v, CellValue::Bool(_))) {
            return VariableType::Boolean;
        }
        if present
            .iter()
            .all(|v| matches!(v, CellValue::Int(_) | CellValue::Float(_)))
        {
            return VariableType::Numeric;
        }
        let all_dates = present.iter().all(|v| match v {
            CellValue::Text(s) => DATE_PATTERN.is_match(s.trim()),
            _ => false,
        });
        if all_dates {
            return VariableType::DateTime;
        }
        if n_distinct <= self.settings.categorical_max_distinct
            || ratio(n_distinct, present.len()) <= self.settings.categorical_max_ratio
        {
            return VariableType::Categorical;
        }
        VariableType::Text
    }

    fn numeric_stats(&self, raw: &[f64]) -> NumericStats {
        let n_infinite = raw.iter().filter(|v| v.is_infinite()).count();
        let finite: Vec<f64> = raw.iter().copied().filter(|v| v.is_finite()).collect();
        let sorted = stats::sorted(&finite);
        let count = raw.len();

        let mean = stats::mean(&finite);
        let variance = stats::variance(&finite);
        let std = variance.sqrt();
        let min = sorted.first().copied().unwrap_or(f64::NAN);
        let max = sorted.last().copied().unwrap_or(f64::NAN);
        let q1 = stats::quantile_sorted(&sorted, 0.25);
        let q3 = stats::quantile_sorted(&sorted, 0.75);
        let n_zeros = finite.iter().filter(|v| **v == 0.0).count();
        let n_negative = raw.iter().filter(|v| **v < 0.0).count();

        NumericStats {
            mean,
            std,
            variance,
            min,
            max,
            range: max - min,
            p5: stats::quantile_sorted(&sorted, 0.05),
            q1,
            median: stats::quantile_sorted(&sorted, 0.5),
            q3,
            p95: stats::quantile_sorted(&sorted, 0.95),
            iqr: q3 - q1,
            sum: stats::sum(&finite),
            cv: if mean != 0.0 { std / mean } else { f64::NAN },
            skewness: stats::skewness(&finite),
            kurtosis: stats::kurtosis(&finite),
            mad: stats::median_absolute_deviation(&finite),
            n_zeros,
            p_zeros: ratio(n_zeros, count),
            n_negative,
            p_negative: ratio(n_negative, count),
            n_infinite,
            monotonicity: stats::monotonicity(raw),
            histogram: stats::histogram(&finite, self.settings.histogram_bins),
        }
    }

    fn overview(
        &self,
        table: &DataTable,
        variables: &[VariableProfile],
        n_duplicates: usize,
    ) -> DatasetOverview {
        let n_cells = table.row_count() * table.column_count();
        let n_cells_missing: usize = variables.iter().map(|v| v.n_missing).sum();

        let mut type_counts: Vec<(VariableType, usize)> = Vec::new();
        for variable in variables {
            match type_counts.iter_mut().find(|(t, _)| *t == variable.var_type) {
                Some((_, count)) => *count += 1,
                None => type_counts.push((variable.var_type, 1)),
            }
        }

        DatasetOverview {
            n_variables: table.column_count(),
            n_observations: table.row_count(),
            n_cells_missing,
            p_cells_missing: ratio(n_cells_missing, n_cells),
            n_duplicates,
            p_duplicates: ratio(n_duplicates, table.row_count()),
            memory_size: variables.iter().map(|v| v.memory_size).sum(),
            type_counts,
        }
    }

    /// Pearson and Spearman matrices over numeric and boolean variables
    fn correlations(
        &self,
        table: &DataTable,
        variables: &[VariableProfile],
    ) -> Vec<CorrelationMatrix> {
        let selected: Vec<usize> = variables
            .iter()
            .enumerate()
            .filter(|(_, v)| matches!(v.var_type, VariableType::Numeric | VariableType::Boolean))
            .map(|(idx, _)| idx)
            .collect();

        if selected.len() < 2 {
            return Vec::new();
        }

        let names: Vec<String> = selected.iter().map(|&i| table.columns[i].clone()).collect();
        let methods: [(&str, fn(&[f64], &[f64]) -> Option<f64>); 2] =
            [("pearson", stats::pearson), ("spearman", stats::spearman)];

        methods
            .iter()
            .map(|(method, func)| {
                let values: Vec<Vec<Option<f64>>> = selected
                    .iter()
                    .map(|&a| {
                        selected
                            .iter()
                            .map(|&b| {
                                let (x, y) = paired_values(table, a, b);
                                func(&x, &y)
                            })
                            .collect::<Vec<_>>()
                    })
                    .collect();
                CorrelationMatrix {
                    method: method.to_string(),
                    variables: names.clone(),
                    values,
                }
            })
            .collect()
    }

    fn alerts(
        &self,
        variables: &[VariableProfile],
        correlations: &[CorrelationMatrix],
        n_duplicates: usize,
    ) -> Vec<Alert> {
        let s = &self.settings;
        let mut alerts = Vec::new();

        if n_duplicates > 0 {
            alerts.push(Alert::Duplicates { n_duplicates });
        }

        for v in variables {
            let variable = v.name.clone();
            if v.var_type == VariableType::Constant {
                alerts.push(Alert::Constant {
                    variable: variable.clone(),
                });
            }
            if v.p_missing > s.missing_threshold {
                alerts.push(Alert::HighMissing {
                    variable: variable.clone(),
                    p_missing: v.p_missing,
                });
            }
            if v.is_unique && v.n > 1 {
                alerts.push(Alert::Unique {
                    variable: variable.clone(),
                });
            }
            if v.var_type == VariableType::Categorical && v.n_distinct > s.high_cardinality {
                alerts.push(Alert::HighCardinality {
                    variable: variable.clone(),
                    n_distinct: v.n_distinct,
                });
            }
            if let Some(num) = &v.numeric {
                if num.p_zeros > s.zeros_threshold {
                    alerts.push(Alert::Zeros {
                        variable: variable.clone(),
                        p_zeros: num.p_zeros,
                    });
                }
                if num.skewness.abs() > s.skewness_threshold {
                    alerts.push(Alert::Skewed {
                        variable,
                        skewness: num.skewness,
                    });
                }
            }
        }

        if let Some(pearson) = correlations.iter().find(|m| m.method == "pearson") {
            for i in 0..pearson.variables.len() {
                for j in (i + 1)..pearson.variables.len() {
                    if let Some(coefficient) = pearson.get(i, j) {
                        if coefficient.abs() > s.correlation_threshold {
                            alerts.push(Alert::HighCorrelation {
                                left: pearson.variables[i].clone(),
                                right: pearson.variables[j].clone(),
                                coefficient,
                            });
                        }
                    }
                }
            }
        }

        alerts
    }
}

/// Finite values of two columns over rows where both are present
fn paired_values(table: &DataTable, a: usize, b: usize) -> (Vec<f64>, Vec<f64>) {
    table
        .rows
        .iter()
        .filter_map(|row| match (row[a].as_f64(), row[b].as_f64()) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((x, y)),
            _ => None,
        })
        .unzip()
}

fn text_stats(present: &[&CellValue]) -> TextStats {
    let lengths: Vec<usize> = present
        .iter()
        .map(|v| v.to_string().chars().count())
        .collect();
    TextStats {
        min_length: lengths.iter().copied().min().unwrap_or(0),
        mean_length: if lengths.is_empty() {
            0.0
        } else {
            lengths.iter().sum::<usize>() as f64 / lengths.len() as f64
        },
        max_length: lengths.iter().copied().max().unwrap_or(0),
    }
}

fn count_duplicate_rows(table: &DataTable) -> usize {
    let mut seen = HashSet::new();
    table
        .rows
        .iter()
        .filter(|row| {
            let key = row
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join("\u{1f}");
            !seen.insert(key)
        })
        .count()
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
