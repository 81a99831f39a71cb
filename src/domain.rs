use polars::error::PolarsError;
use std::io::Error;

use derive_setters::Setters;

#[derive(Debug)]
pub enum DexError {
    IoError(Error),
    PolarsError(PolarsError),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    // A profile was requested for a column without a single valid value.
    EmptyColumn,
}

impl From<Error> for DexError {
    fn from(err: Error) -> Self {
        DexError::IoError(err)
    }
}

impl From<PolarsError> for DexError {
    fn from(err: PolarsError) -> Self {
        DexError::PolarsError(err)
    }
}

/// Analysis mode, the outer of the two widget selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    Explore,
    Correlation,
}

impl AnalysisMode {
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisMode::Explore => "Exploratory Analysis",
            AnalysisMode::Correlation => "Correlation Analysis",
        }
    }
}

/// Column kind, the inner widget selection within Explore mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numerical,
    Categorical,
    Boolean,
}

impl ColumnKind {
    pub fn label(&self) -> &'static str {
        match self {
            ColumnKind::Numerical => "Numerical",
            ColumnKind::Categorical => "Categorical",
            ColumnKind::Boolean => "Boolean",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    Quit,
    CycleMode,
    CycleKind,
    NextColumn,
    PrevColumn,
    ScrollDown,
    ScrollUp,
    ScrollPageDown,
    ScrollPageUp,
    MoreBins,
    FewerBins,
    MoreOpacity,
    LessOpacity,
    CycleColor,
    TogglePreview,
    CopyView,
    Help,
    Exit,
    Resize(usize, usize),
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct DexConfig {
    /// Event poll timeout in milliseconds.
    pub event_poll_time: u64,
    /// Maximum rendered cell width in the data preview.
    pub max_column_width: usize,
    /// Number of evaluation points for the density overlay.
    pub density_grid: usize,
    /// How long a transient status message stays visible, in seconds.
    pub status_message_time: u64,
}

impl Default for DexConfig {
    fn default() -> Self {
        DexConfig {
            event_poll_time: 100,
            max_column_width: 24,
            density_grid: 120,
            status_message_time: 5,
        }
    }
}

pub const HELP_TEXT: &str = "\
dex - interactive data exploration

  Tab        switch analysis mode (explore / correlation)
  t          switch column kind (numerical / categorical)
  h/l ←/→    previous / next column
  j/k ↓/↑    scroll table
  PgUp/PgDn  scroll table by page
  - / +      fewer / more histogram bins (5..100)
  [ / ]      less / more opacity (0.0..1.0)
  c          cycle chart color
  d          toggle raw data preview
  y          copy current table to clipboard as csv
  ?          show this help
  Esc        close popup / preview
  q          quit
";
