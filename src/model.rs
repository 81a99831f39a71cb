use arboard::Clipboard;
use std::path::Path;
use std::time::Instant;
use tracing::{info, trace};

use crate::domain::{AnalysisMode, ColumnKind, DexConfig, DexError, HELP_TEXT, Message};
use crate::stats::{self, CorrelationMatrix, FiveNumberSummary, Histogram};
use crate::table::Table;
use crate::ui::{PALETTE, STATUS_HEIGHT};

pub const MIN_BINS: usize = 5;
pub const MAX_BINS: usize = 100;
const SCROLL_PAGE: usize = 10;

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

/// Window into the raw table for the preview toggle.
pub struct PreviewTable {
    pub names: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub offset: usize,
    pub total: usize,
}

/// Render-ready snapshot handed to the UI. Rebuilt from scratch on every
/// interaction; nothing in here survives the next update.
pub struct UIData {
    pub name: String,
    pub mode: AnalysisMode,
    pub kind: ColumnKind,
    pub column: Option<String>,
    pub stats: Vec<(String, String)>,
    pub summary: Option<FiveNumberSummary>,
    pub counts: Vec<(String, usize)>,
    pub histogram: Option<Histogram>,
    pub density: Vec<(f64, f64)>,
    pub correlation: Option<CorrelationMatrix>,
    pub preview: Option<PreviewTable>,
    pub bins: usize,
    pub opacity: f64,
    pub color: (u8, u8, u8),
    pub scroll: usize,
    pub show_popup: bool,
    pub popup_message: String,
    pub status_message: String,
    pub last_status_message_update: Instant,
    pub last_update: Instant,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            name: String::new(),
            mode: AnalysisMode::Explore,
            kind: ColumnKind::Numerical,
            column: None,
            stats: Vec::new(),
            summary: None,
            counts: Vec::new(),
            histogram: None,
            density: Vec::new(),
            correlation: None,
            preview: None,
            bins: 30,
            opacity: 1.0,
            color: PALETTE[0],
            scroll: 0,
            show_popup: false,
            popup_message: String::new(),
            status_message: String::new(),
            last_status_message_update: Instant::now(),
            last_update: Instant::now(),
        }
    }
}

pub struct Model {
    config: DexConfig,
    pub status: Status,
    table: Table,
    mode: AnalysisMode,
    kind: ColumnKind,
    selected_numeric: usize,
    selected_categorical: usize,
    bins: usize,
    opacity: f64,
    color_idx: usize,
    show_preview: bool,
    preview_offset: usize,
    scroll: usize,
    show_popup: bool,
    width: usize,
    height: usize,
    uidata: UIData,
    clipboard: Option<Clipboard>,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn load(
        path: &Path,
        separator: u8,
        config: &DexConfig,
        width: usize,
        height: usize,
    ) -> Result<Self, DexError> {
        let table = Table::load(path, separator)?;
        info!("Loaded \"{}\": {}x{}", table.name, table.nrows(), table.ncols());
        Ok(Self::from_table(table, config, width, height))
    }

    pub fn from_table(table: Table, config: &DexConfig, width: usize, height: usize) -> Self {
        let message = format!("Loaded {} rows from \"{}\"", table.nrows(), table.name);
        let mut model = Self {
            config: config.clone(),
            status: Status::READY,
            table,
            mode: AnalysisMode::Explore,
            kind: ColumnKind::Numerical,
            selected_numeric: 0,
            selected_categorical: 0,
            bins: 30,
            opacity: 1.0,
            color_idx: 0,
            show_preview: false,
            preview_offset: 0,
            scroll: 0,
            show_popup: false,
            width,
            height,
            uidata: UIData::empty(),
            clipboard: Clipboard::new().ok(),
            status_message: String::new(),
            last_status_message_update: Instant::now(),
        };
        model.set_status_message(message);
        model.refresh();
        model
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn status_message_time(&self) -> u64 {
        self.config.status_message_time
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn update(&mut self, message: Message) -> Result<(), DexError> {
        trace!("Update: popup {}, message {:?}", self.show_popup, message);
        if self.show_popup {
            match message {
                Message::Quit => self.quit(),
                Message::Exit | Message::Help => self.show_popup = false,
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            }
        } else {
            match message {
                Message::Quit => self.quit(),
                Message::CycleMode => self.cycle_mode(),
                Message::CycleKind => self.cycle_kind(),
                Message::NextColumn => self.select_column(1),
                Message::PrevColumn => self.select_column(-1),
                Message::ScrollDown => self.scroll_by(1),
                Message::ScrollUp => self.scroll_by(-1),
                Message::ScrollPageDown => self.scroll_by(SCROLL_PAGE as i64),
                Message::ScrollPageUp => self.scroll_by(-(SCROLL_PAGE as i64)),
                Message::MoreBins => self.bins = (self.bins + 1).min(MAX_BINS),
                Message::FewerBins => self.bins = self.bins.saturating_sub(1).max(MIN_BINS),
                Message::MoreOpacity => self.step_opacity(1),
                Message::LessOpacity => self.step_opacity(-1),
                Message::CycleColor => self.color_idx = (self.color_idx + 1) % PALETTE.len(),
                Message::TogglePreview => {
                    self.show_preview = !self.show_preview;
                    self.preview_offset = 0;
                }
                Message::CopyView => self.copy_view(),
                Message::Help => self.show_popup = true,
                Message::Exit => self.show_preview = false,
                Message::Resize(width, height) => self.ui_resize(width, height),
            }
        }

        // Every widget change re-derives the complete view from the table.
        self.refresh();
        Ok(())
    }

    fn cycle_mode(&mut self) {
        self.mode = match self.mode {
            AnalysisMode::Explore => AnalysisMode::Correlation,
            AnalysisMode::Correlation => AnalysisMode::Explore,
        };
        self.scroll = 0;
    }

    // Only numerical and categorical columns are selectable for
    // profiling; boolean columns show up in the dataset statistics only.
    fn cycle_kind(&mut self) {
        if self.mode != AnalysisMode::Explore {
            return;
        }
        self.kind = match self.kind {
            ColumnKind::Numerical => ColumnKind::Categorical,
            _ => ColumnKind::Numerical,
        };
        self.scroll = 0;
    }

    fn select_column(&mut self, step: i64) {
        if self.mode != AnalysisMode::Explore {
            return;
        }
        let ids = self.table.columns_of(self.kind);
        if ids.is_empty() {
            return;
        }
        let len = ids.len() as i64;
        let selected = match self.kind {
            ColumnKind::Categorical => &mut self.selected_categorical,
            _ => &mut self.selected_numeric,
        };
        *selected = ((*selected as i64 + step).rem_euclid(len)) as usize;
        self.scroll = 0;
    }

    fn scroll_by(&mut self, delta: i64) {
        if self.show_preview {
            let max = self.table.nrows().saturating_sub(1);
            self.preview_offset =
                ((self.preview_offset as i64 + delta).clamp(0, max as i64)) as usize;
        } else {
            let max = self.uidata.counts.len().saturating_sub(1);
            self.scroll = ((self.scroll as i64 + delta).clamp(0, max as i64)) as usize;
        }
    }

    fn step_opacity(&mut self, steps: i64) {
        let tenths = (self.opacity * 10.0).round() as i64 + steps;
        self.opacity = tenths.clamp(0, 10) as f64 / 10.0;
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.width, width, self.height, height
        );
        self.width = width;
        self.height = height;
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
        self.uidata.status_message = self.status_message.clone();
        self.uidata.last_status_message_update = self.last_status_message_update;
        self.uidata.last_update = Instant::now();
    }

    /// Re-derive the complete UI snapshot from the table and the current
    /// widget selections. Pure except for the timestamps.
    fn refresh(&mut self) {
        let stats = stats::dataset_statistics(&self.table);
        let mut stats_rows: Vec<(String, String)> = vec![
            ("Number of rows".to_string(), stats.rows.to_string()),
            ("Number of columns".to_string(), stats.columns.to_string()),
        ];
        for (dtype, count) in stats.dtype_counts.iter() {
            stats_rows.push((format!("Columns of dtype {dtype}"), count.to_string()));
        }
        stats_rows.push(("Categorical variables".to_string(), stats.categorical.to_string()));
        stats_rows.push(("Numerical variables".to_string(), stats.numerical.to_string()));
        stats_rows.push(("Boolean variables".to_string(), stats.boolean.to_string()));

        let mut uidata = UIData {
            name: self.table.name.clone(),
            mode: self.mode,
            kind: self.kind,
            stats: stats_rows,
            bins: self.bins,
            opacity: self.opacity,
            color: PALETTE[self.color_idx],
            scroll: self.scroll,
            show_popup: self.show_popup,
            popup_message: if self.show_popup {
                HELP_TEXT.to_string()
            } else {
                String::new()
            },
            status_message: self.status_message.clone(),
            last_status_message_update: self.last_status_message_update,
            ..UIData::empty()
        };

        match self.mode {
            AnalysisMode::Explore => match self.kind {
                ColumnKind::Categorical => {
                    let ids = self.table.columns_of(ColumnKind::Categorical);
                    if let Some(&cid) = ids.get(self.selected_categorical) {
                        let column = &self.table.columns[cid];
                        uidata.column = Some(column.name.clone());
                        uidata.counts = stats::value_counts(column.text_values().into_iter());
                    }
                }
                _ => {
                    let ids = self.table.columns_of(ColumnKind::Numerical);
                    if let Some(&cid) = ids.get(self.selected_numeric) {
                        let column = &self.table.columns[cid];
                        uidata.column = Some(column.name.clone());
                        let values = column.numeric_values().unwrap_or_default();
                        // Empty columns have no defined summary; the UI
                        // shows a placeholder instead.
                        if let Ok(summary) = stats::five_number_summary(&values) {
                            uidata.summary = Some(summary);
                            if let Ok(hist) = stats::histogram(&values, self.bins) {
                                let scale = values.len() as f64 * hist.bin_width;
                                uidata.density =
                                    stats::density_curve(&values, self.config.density_grid)
                                        .into_iter()
                                        .map(|(x, y)| (x, y * scale))
                                        .collect();
                                uidata.histogram = Some(hist);
                            }
                        }
                    }
                }
            },
            AnalysisMode::Correlation => {
                uidata.correlation = Some(stats::correlation_matrix(&self.table));
            }
        }

        if self.show_preview {
            uidata.preview = Some(self.build_preview());
        }

        self.uidata = uidata;
    }

    fn build_preview(&self) -> PreviewTable {
        let page = self
            .height
            .saturating_sub(STATUS_HEIGHT as usize + 3)
            .max(1);
        let rbegin = self.preview_offset.min(self.table.nrows().saturating_sub(1));
        let rend = (rbegin + page).min(self.table.nrows());

        let names = self
            .table
            .columns
            .iter()
            .map(|c| truncate(&c.name, self.config.max_column_width))
            .collect();
        let rows = (rbegin..rend)
            .map(|row| {
                self.table
                    .columns
                    .iter()
                    .map(|c| truncate(&c.cell(row), self.config.max_column_width))
                    .collect()
            })
            .collect();

        PreviewTable {
            names,
            rows,
            offset: rbegin,
            total: self.table.nrows(),
        }
    }

    /// Current derived table as CSV text, or None when there is nothing
    /// to export in this view.
    fn view_as_csv(&self) -> Option<String> {
        match self.mode {
            AnalysisMode::Explore => match self.kind {
                ColumnKind::Categorical => {
                    let mut out = String::from("value,count\n");
                    for (value, count) in self.uidata.counts.iter() {
                        out.push_str(&format!("{},{}\n", wrap_cell_content(value), count));
                    }
                    Some(out)
                }
                _ => self.uidata.summary.as_ref().map(|s| {
                    format!(
                        "statistic,value\nminimum,{}\nq1,{}\nmedian,{}\nq3,{}\nmaximum,{}\n",
                        s.min, s.q1, s.median, s.q3, s.max
                    )
                }),
            },
            AnalysisMode::Correlation => self.uidata.correlation.as_ref().map(|corr| {
                let header: Vec<String> =
                    corr.names.iter().map(|n| wrap_cell_content(n)).collect();
                let mut out = String::from(",");
                out.push_str(&header.join(","));
                out.push('\n');
                for (name, row) in corr.names.iter().zip(corr.values.iter()) {
                    let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                    out.push_str(&format!(
                        "{},{}\n",
                        wrap_cell_content(name),
                        cells.join(",")
                    ));
                }
                out
            }),
        }
    }

    fn copy_view(&mut self) {
        let Some(content) = self.view_as_csv() else {
            return;
        };

        match self.clipboard.as_mut().map(|c| c.set_text(content)) {
            Some(Ok(_)) => self.set_status_message("Copied view to clipboard"),
            Some(Err(e)) => {
                trace!("Error copying to clipboard: {:?}", e);
                self.set_status_message("Clipboard copy failed");
            }
            None => self.set_status_message("Clipboard unavailable"),
        }
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() > width && width >= 3 {
        let mut out: String = value.chars().take(width - 3).collect();
        out.push_str("...");
        out
    } else {
        value.to_string()
    }
}

fn wrap_cell_content(c: &str) -> String {
    let needs_escaping = c.chars().any(|c| c == '"');
    let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
    let mut out = String::from(c);

    if needs_escaping {
        out = out.replace("\"", "\"\"");
    }
    if needs_wrapping || needs_escaping {
        out = format!("\"{out}\"");
    }
    out
}
