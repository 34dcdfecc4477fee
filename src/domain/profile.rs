// ============================================================
// PROFILE REPORT
// ============================================================
// Result of profiling a DataTable, consumed by the HTML renderer

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Detected type of a variable (column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableType {
    Numeric,
    Categorical,
    Boolean,
    DateTime,
    Text,
    Constant,
    Unsupported,
}

impl VariableType {
    pub fn label(&self) -> &'static str {
        match self {
            VariableType::Numeric => "Numeric",
            VariableType::Categorical => "Categorical",
            VariableType::Boolean => "Boolean",
            VariableType::DateTime => "DateTime",
            VariableType::Text => "Text",
            VariableType::Constant => "Constant",
            VariableType::Unsupported => "Unsupported",
        }
    }
}

/// Dataset-level statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetOverview {
    pub n_variables: usize,
    pub n_observations: usize,
    pub n_cells_missing: usize,
    pub p_cells_missing: f64,
    pub n_duplicates: usize,
    pub p_duplicates: f64,
    pub memory_size: usize,
    pub type_counts: Vec<(VariableType, usize)>,
}

/// One bin of a histogram, `[lower, upper)` except the last bin which is closed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Monotonicity {
    Increasing,
    StrictlyIncreasing,
    Decreasing,
    StrictlyDecreasing,
    NotMonotonic,
}

impl Monotonicity {
    pub fn label(&self) -> &'static str {
        match self {
            Monotonicity::Increasing => "Increasing",
            Monotonicity::StrictlyIncreasing => "Strictly increasing",
            Monotonicity::Decreasing => "Decreasing",
            Monotonicity::StrictlyDecreasing => "Strictly decreasing",
            Monotonicity::NotMonotonic => "Not monotonic",
        }
    }
}

/// Descriptive statistics for numeric variables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericStats {
    pub mean: f64,
    pub std: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    pub p5: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub p95: f64,
    pub iqr: f64,
    pub sum: f64,
    pub cv: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub mad: f64,
    pub n_zeros: usize,
    pub p_zeros: f64,
    pub n_negative: usize,
    pub p_negative: f64,
    pub n_infinite: usize,
    pub monotonicity: Monotonicity,
    pub histogram: Vec<HistogramBin>,
}

/// Length statistics for text-like variables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextStats {
    pub min_length: usize,
    pub mean_length: f64,
    pub max_length: usize,
}

/// Profile of a single variable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableProfile {
    pub name: String,
    pub var_type: VariableType,
    pub n: usize,
    pub n_missing: usize,
    pub p_missing: f64,
    pub n_distinct: usize,
    pub p_distinct: f64,
    pub is_unique: bool,
    pub memory_size: usize,
    /// Most frequent values with their counts, most frequent first
    pub value_counts: Vec<(String, usize)>,
    pub numeric: Option<NumericStats>,
    pub text: Option<TextStats>,
}

/// Square correlation matrix over the listed variables.
/// `None` marks pairs where the coefficient is undefined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub method: String,
    pub variables: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row).and_then(|r| r.get(col)).copied().flatten()
    }
}

/// Data quality warnings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Alert {
    HighMissing { variable: String, p_missing: f64 },
    Constant { variable: String },
    Unique { variable: String },
    HighCardinality { variable: String, n_distinct: usize },
    Zeros { variable: String, p_zeros: f64 },
    Skewed { variable: String, skewness: f64 },
    HighCorrelation { left: String, right: String, coefficient: f64 },
    Duplicates { n_duplicates: usize },
}

impl Alert {
    pub fn kind(&self) -> &'static str {
        match self {
            Alert::HighMissing { .. } => "Missing",
            Alert::Constant { .. } => "Constant",
            Alert::Unique { .. } => "Unique",
            Alert::HighCardinality { .. } => "High cardinality",
            Alert::Zeros { .. } => "Zeros",
            Alert::Skewed { .. } => "Skewed",
            Alert::HighCorrelation { .. } => "High correlation",
            Alert::Duplicates { .. } => "Duplicates",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Alert::HighMissing { variable, p_missing } => {
                format!("{} has {:.1}% missing values", variable, p_missing * 100.0)
            }
            Alert::Constant { variable } => format!("{} has constant value", variable),
            Alert::Unique { variable } => format!("{} has unique values", variable),
            Alert::HighCardinality {
                variable,
                n_distinct,
            } => format!("{} has a high cardinality: {} distinct values", variable, n_distinct),
            Alert::Zeros { variable, p_zeros } => {
                format!("{} has {:.1}% zeros", variable, p_zeros * 100.0)
            }
            Alert::Skewed { variable, skewness } => {
                format!("{} is highly skewed (\u{3b3}1 = {:.2})", variable, skewness)
            }
            Alert::HighCorrelation {
                left,
                right,
                coefficient,
            } => format!(
                "{} is highly correlated with {} (\u{3c1} = {:.3})",
                left, right, coefficient
            ),
            Alert::Duplicates { n_duplicates } => {
                format!("Dataset has {} duplicate rows", n_duplicates)
            }
        }
    }
}

/// Full exploratory analysis of a dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileReport {
    pub title: String,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub overview: DatasetOverview,
    pub variables: Vec<VariableProfile>,
    pub correlations: Vec<CorrelationMatrix>,
    pub alerts: Vec<Alert>,
    pub columns: Vec<String>,
    pub head: Vec<Vec<String>>,
    pub tail: Vec<Vec<String>>,
}
