use polars::prelude::*;
use rayon::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use crate::domain::{ColumnKind, DexError};

/// Typed values of one column, extracted once at load time.
/// Missing entries stay in place so columns remain row-aligned.
pub enum ColumnValues {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Boolean(Vec<Option<bool>>),
}

pub struct Column {
    pub name: String,
    pub dtype: DataType,
    pub values: ColumnValues,
}

impl Column {
    pub fn kind(&self) -> ColumnKind {
        match self.values {
            ColumnValues::Numeric(_) => ColumnKind::Numerical,
            ColumnValues::Text(_) => ColumnKind::Categorical,
            ColumnValues::Boolean(_) => ColumnKind::Boolean,
        }
    }

    pub fn len(&self) -> usize {
        match &self.values {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
            ColumnValues::Boolean(v) => v.len(),
        }
    }

    /// Non-missing numeric values, or None for non-numeric columns.
    pub fn numeric_values(&self) -> Option<Vec<f64>> {
        match &self.values {
            ColumnValues::Numeric(v) => Some(v.iter().flatten().copied().collect()),
            _ => None,
        }
    }

    /// Row-aligned numeric values including missing entries.
    pub fn numeric_options(&self) -> Option<&[Option<f64>]> {
        match &self.values {
            ColumnValues::Numeric(v) => Some(v),
            _ => None,
        }
    }

    /// Non-missing values coerced to text, for any column kind.
    pub fn text_values(&self) -> Vec<String> {
        match &self.values {
            ColumnValues::Text(v) => v.iter().flatten().cloned().collect(),
            ColumnValues::Numeric(v) => v
                .iter()
                .flatten()
                .map(|x| format_number(&self.dtype, *x))
                .collect(),
            ColumnValues::Boolean(v) => v.iter().flatten().map(|b| b.to_string()).collect(),
        }
    }

    /// Render one cell for the data preview.
    pub fn cell(&self, row: usize) -> String {
        match &self.values {
            ColumnValues::Numeric(v) => match v.get(row).copied().flatten() {
                Some(x) => format_number(&self.dtype, x),
                None => "∅".to_string(),
            },
            ColumnValues::Boolean(v) => match v.get(row).copied().flatten() {
                Some(b) => b.to_string(),
                None => "∅".to_string(),
            },
            ColumnValues::Text(v) => match v.get(row).and_then(|s| s.as_ref()) {
                Some(s) => s.replace("\r\n", " ↵ ").replace("\n", " ↵ "),
                None => "∅".to_string(),
            },
        }
    }

    pub fn as_string(&self) -> String {
        format!(
            "\"{}\", {:?}, {:?}, # rows {}",
            self.name,
            self.dtype,
            self.kind(),
            self.len(),
        )
    }
}

/// The uploaded table. Loaded wholesale, never mutated, owned by the session.
pub struct Table {
    pub name: String,
    pub(crate) nrows: usize,
    pub columns: Vec<Column>,
}

impl Table {
    /// Load a delimited text file with a header row. Only delimited text
    /// is supported; anything polars cannot parse fails here, upstream of
    /// all statistics.
    pub fn load(path: &Path, separator: u8) -> Result<Table, DexError> {
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => DexError::FileNotFound,
            ErrorKind::PermissionDenied => DexError::PermissionDenied,
            _ => DexError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(DexError::LoadingFailed("Not a file!".into()));
        }

        let frame = LazyCsvReader::new(PlPath::Local(path.into()))
            .with_has_header(true)
            .with_separator(separator)
            .finish()?;

        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string();

        let df = frame.collect()?;
        Table::from_frame(&df, &name)
    }

    /// Extract typed columns from a collected dataframe.
    /// Each column is extracted in its own rayon task.
    pub fn from_frame(df: &DataFrame, name: &str) -> Result<Table, DexError> {
        let start_time = Instant::now();

        let c_: Result<Vec<Column>, _> = df
            .get_column_names()
            .par_iter()
            .map(|name| Self::extract_column(df, name.as_str()))
            .collect();
        let columns = c_?;

        let data_loading_duration = start_time.elapsed().as_millis();
        info!("Loading data took {data_loading_duration}ms ...");
        for c in columns.iter() {
            debug!("Column: {}", c.as_string());
        }

        Ok(Table {
            name: name.to_string(),
            nrows: df.height(),
            columns,
        })
    }

    fn extract_column(df: &DataFrame, col_name: &str) -> Result<Column, PolarsError> {
        let dtype = df.column(col_name)?.dtype().clone();

        let values = if is_numeric_type(&dtype) {
            let col = df.column(col_name)?.cast(&DataType::Float64)?;
            ColumnValues::Numeric(col.f64()?.into_iter().collect())
        } else if dtype == DataType::Boolean {
            ColumnValues::Boolean(df.column(col_name)?.bool()?.into_iter().collect())
        } else {
            let col = df.column(col_name)?.cast(&DataType::String)?;
            ColumnValues::Text(
                col.str()?
                    .into_iter()
                    .map(|v| v.map(|s| s.to_string()))
                    .collect(),
            )
        };

        Ok(Column {
            name: col_name.to_string(),
            dtype,
            values,
        })
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    /// Indices of the columns of one kind, in table order.
    pub fn columns_of(&self, kind: ColumnKind) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.kind() == kind)
            .map(|(idx, _)| idx)
            .collect()
    }
}

pub fn is_numeric_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

fn format_number(dtype: &DataType, value: f64) -> String {
    if dtype.is_integer() {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture() -> Table {
        Table::load(&PathBuf::from("tests/fixtures/testdata_01.csv"), b',').unwrap()
    }

    #[test]
    fn load_counts_match_source_file() {
        let table = fixture();
        assert_eq!(table.nrows(), 5);
        assert_eq!(table.ncols(), 5);
    }

    #[test]
    fn column_kinds_follow_dtypes() {
        let table = fixture();
        let kinds: Vec<ColumnKind> = table.columns.iter().map(|c| c.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Categorical,
                ColumnKind::Numerical,
                ColumnKind::Numerical,
                ColumnKind::Boolean,
                ColumnKind::Categorical,
            ]
        );
        assert_eq!(table.columns_of(ColumnKind::Numerical), vec![1, 2]);
    }

    #[test]
    fn numeric_values_drop_missing() {
        let col = Column {
            name: "x".to_string(),
            dtype: DataType::Float64,
            values: ColumnValues::Numeric(vec![Some(1.0), None, Some(3.0)]),
        };
        assert_eq!(col.numeric_values().unwrap(), vec![1.0, 3.0]);
        assert_eq!(col.cell(1), "∅");
    }

    #[test]
    fn text_values_coerce_and_drop_missing() {
        let col = Column {
            name: "flag".to_string(),
            dtype: DataType::Boolean,
            values: ColumnValues::Boolean(vec![Some(true), None, Some(false)]),
        };
        assert_eq!(col.text_values(), vec!["true", "false"]);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = Table::load(&PathBuf::from("tests/fixtures/missing.csv"), b',');
        assert!(matches!(err, Err(DexError::FileNotFound)));
    }

    #[test]
    fn integer_cells_render_without_fraction() {
        let table = fixture();
        assert_eq!(table.columns[1].cell(0), "10");
        assert_eq!(table.columns[2].cell(0), "1.2");
    }
}
