use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::Marker,
    text::{Line, Span, Text},
    widgets::{
        Axis, BarChart, Block, Cell, Chart, Clear, Dataset, GraphType, Paragraph, Row,
        Table as TableWidget,
    },
};

use crate::domain::{AnalysisMode, ColumnKind, DexConfig};
use crate::model::{MAX_BINS, MIN_BINS, Model, PreviewTable, UIData};

pub const STATUS_HEIGHT: u16 = 1;
pub const SIDEBAR_WIDTH: u16 = 30;

/// Chart colors the color picker cycles through. The first entry is the
/// classic seaborn-ish default.
pub const PALETTE: &[(u8, u8, u8)] = &[
    (0x69, 0xb3, 0xa2),
    (0x40, 0x7e, 0xc9),
    (0xe0, 0x7a, 0x5f),
    (0xf2, 0xcc, 0x8f),
    (0x9b, 0x5d, 0xe5),
    (0xc9, 0x40, 0x40),
];

pub struct DexUI {
    config: DexConfig,
}

impl DexUI {
    pub fn new(config: &DexConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn draw(&self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();

        let [main, status] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(STATUS_HEIGHT)])
                .areas(frame.area());
        let [sidebar, content] =
            Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
                .areas(main);

        self.draw_sidebar(uidata, frame, sidebar);

        if let Some(preview) = &uidata.preview {
            self.draw_preview(uidata, preview, frame, content);
        } else {
            match uidata.mode {
                AnalysisMode::Explore => self.draw_explore(uidata, frame, content),
                AnalysisMode::Correlation => self.draw_correlation(uidata, frame, content),
            }
        }

        self.draw_status(model, frame, status);

        if uidata.show_popup {
            self.draw_popup(uidata, frame);
        }
    }

    fn draw_sidebar(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let color = blend(uidata.color, uidata.opacity);
        let mut lines: Vec<Line> = Vec::new();

        lines.push(Line::from("Analysis mode (Tab)").bold());
        for mode in [AnalysisMode::Explore, AnalysisMode::Correlation] {
            lines.push(selector_line(mode.label(), uidata.mode == mode));
        }
        lines.push(Line::default());

        lines.push(Line::from("Column kind (t)").bold());
        for kind in [ColumnKind::Numerical, ColumnKind::Categorical] {
            let selected = uidata.mode == AnalysisMode::Explore && uidata.kind == kind;
            lines.push(selector_line(kind.label(), selected));
        }
        lines.push(Line::default());

        lines.push(Line::from("Column (h/l)").bold());
        lines.push(Line::from(format!(
            "  {}",
            uidata.column.as_deref().unwrap_or("-")
        )));
        lines.push(Line::default());

        lines.push(Line::from(format!(
            "Bins (-/+)     {:>3} [{}-{}]",
            uidata.bins, MIN_BINS, MAX_BINS
        )));
        lines.push(Line::from(format!("Opacity ([/])  {:.1}", uidata.opacity)));
        lines.push(Line::from(vec![
            Span::from("Color (c)      "),
            Span::styled("██████", Style::new().fg(color)),
            Span::from(format!(
                " #{:02x}{:02x}{:02x}",
                uidata.color.0, uidata.color.1, uidata.color.2
            )),
        ]));
        lines.push(Line::from(format!(
            "Preview (d)    {}",
            if uidata.preview.is_some() { "on" } else { "off" }
        )));

        let block = Block::bordered().title(format!(" {} ", uidata.name));
        frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
    }

    fn draw_explore(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let stats_height = uidata.stats.len() as u16 + 2;
        match uidata.kind {
            ColumnKind::Categorical => {
                let [stats_area, counts_area] =
                    Layout::vertical([Constraint::Length(stats_height), Constraint::Min(0)])
                        .areas(area);
                let [table_area, chart_area] =
                    Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)])
                        .areas(counts_area);
                self.draw_stats(uidata, frame, stats_area);
                self.draw_value_counts(uidata, frame, table_area);
                self.draw_bar_chart(uidata, frame, chart_area);
            }
            _ => {
                let [stats_area, summary_area, chart_area] = Layout::vertical([
                    Constraint::Length(stats_height),
                    Constraint::Length(4),
                    Constraint::Min(0),
                ])
                .areas(area);
                self.draw_stats(uidata, frame, stats_area);
                self.draw_summary(uidata, frame, summary_area);
                self.draw_histogram(uidata, frame, chart_area);
            }
        }
    }

    fn draw_stats(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let rows: Vec<Row> = uidata
            .stats
            .iter()
            .map(|(stat, value)| {
                Row::new(vec![
                    Cell::from(stat.as_str()),
                    Cell::from(value.as_str()).bold(),
                ])
            })
            .collect();
        let table = TableWidget::new(
            rows,
            [Constraint::Percentage(70), Constraint::Percentage(30)],
        )
        .block(Block::bordered().title(" Dataset Statistics "));
        frame.render_widget(table, area);
    }

    fn draw_summary(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let block = Block::bordered().title(format!(
            " Five-Number Summary: {} ",
            uidata.column.as_deref().unwrap_or("-")
        ));
        match &uidata.summary {
            Some(s) => {
                let header = Row::new(vec!["Minimum", "Q1", "Median", "Q3", "Maximum"])
                    .style(Style::new().add_modifier(Modifier::BOLD));
                let values = Row::new(
                    [s.min, s.q1, s.median, s.q3, s.max]
                        .iter()
                        .map(|v| Cell::from(format_value(*v)))
                        .collect::<Vec<Cell>>(),
                );
                let table = TableWidget::new(vec![values], [Constraint::Percentage(20); 5])
                    .header(header)
                    .block(block);
                frame.render_widget(table, area);
            }
            None => {
                frame.render_widget(
                    Paragraph::new("No valid values in this column.").block(block),
                    area,
                );
            }
        }
    }

    fn draw_histogram(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let name = uidata.column.as_deref().unwrap_or("-");
        let block = Block::bordered().title(format!(" Distribution of {name} "));
        let Some(hist) = &uidata.histogram else {
            frame.render_widget(Paragraph::new("Nothing to plot.").block(block), area);
            return;
        };

        let points: Vec<(f64, f64)> = hist
            .counts
            .iter()
            .enumerate()
            .map(|(i, &c)| ((hist.edges[i] + hist.edges[i + 1]) / 2.0, c as f64))
            .collect();
        let x_min = hist.edges[0];
        let x_max = hist.edges[hist.edges.len() - 1];
        let y_max = hist
            .counts
            .iter()
            .map(|&c| c as f64)
            .chain(uidata.density.iter().map(|p| p.1))
            .fold(1.0, f64::max)
            * 1.1;

        let color = blend(uidata.color, uidata.opacity);
        let mut datasets = vec![
            Dataset::default()
                .name(name.to_string())
                .marker(Marker::HalfBlock)
                .graph_type(GraphType::Bar)
                .style(Style::new().fg(color))
                .data(&points),
        ];
        if !uidata.density.is_empty() {
            datasets.push(
                Dataset::default()
                    .name("density")
                    .marker(Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::new().fg(Color::Gray))
                    .data(&uidata.density),
            );
        }

        let chart = Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .bounds([x_min, x_max])
                    .labels(vec![
                        format_value(x_min),
                        format_value((x_min + x_max) / 2.0),
                        format_value(x_max),
                    ])
                    .style(Style::new().fg(Color::DarkGray)),
            )
            .y_axis(
                Axis::default()
                    .bounds([0.0, y_max])
                    .labels(vec![
                        "0".to_string(),
                        format_value(y_max / 2.0),
                        format_value(y_max),
                    ])
                    .style(Style::new().fg(Color::DarkGray)),
            );
        frame.render_widget(chart, area);
    }

    fn draw_value_counts(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let total: usize = uidata.counts.iter().map(|(_, c)| c).sum();
        let header = Row::new(vec!["Value", "Count", "%"])
            .style(Style::new().add_modifier(Modifier::BOLD));
        let rows: Vec<Row> = uidata
            .counts
            .iter()
            .skip(uidata.scroll)
            .map(|(value, count)| {
                Row::new(vec![
                    Cell::from(value.as_str()),
                    Cell::from(count.to_string()),
                    Cell::from(format!("{:.0}%", *count as f64 * 100.0 / total.max(1) as f64)),
                ])
            })
            .collect();
        let title = format!(
            " Value Counts of {} ({}/{}) ",
            uidata.column.as_deref().unwrap_or("-"),
            (uidata.scroll + 1).min(uidata.counts.len()),
            uidata.counts.len()
        );
        let table = TableWidget::new(
            rows,
            [
                Constraint::Percentage(60),
                Constraint::Percentage(20),
                Constraint::Percentage(20),
            ],
        )
        .header(header)
        .block(Block::bordered().title(title));
        frame.render_widget(table, area);
    }

    fn draw_bar_chart(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let bar_width = 8u16;
        let visible = (area.width / (bar_width + 1)).max(1) as usize;
        let data: Vec<(&str, u64)> = uidata
            .counts
            .iter()
            .take(visible)
            .map(|(value, count)| (value.as_str(), *count as u64))
            .collect();

        let chart = BarChart::default()
            .block(Block::bordered().title(format!(
                " Value Counts of {} ",
                uidata.column.as_deref().unwrap_or("-")
            )))
            .data(&data[..])
            .bar_width(bar_width)
            .bar_gap(1)
            .bar_style(Style::new().fg(blend(uidata.color, uidata.opacity)))
            .value_style(Style::new().fg(Color::Black).bg(blend(uidata.color, uidata.opacity)));
        frame.render_widget(chart, area);
    }

    fn draw_correlation(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let block = Block::bordered().title(" Correlation Heatmap ");
        let Some(corr) = &uidata.correlation else {
            frame.render_widget(Paragraph::new("Nothing to plot.").block(block), area);
            return;
        };
        if corr.names.len() < 2 {
            frame.render_widget(
                Paragraph::new("Need at least two numerical columns.").block(block),
                area,
            );
            return;
        }

        let label_width = corr
            .names
            .iter()
            .map(|n| n.chars().count())
            .max()
            .unwrap_or(0)
            .min(self.config.max_column_width);
        const CELL_WIDTH: usize = 7;

        let mut lines: Vec<Line> = Vec::new();
        let mut header: Vec<Span> = vec![Span::from(" ".repeat(label_width + 1))];
        for name in corr.names.iter() {
            header.push(Span::styled(
                format!("{:^CELL_WIDTH$}", clip(name, CELL_WIDTH - 1)),
                Style::new().add_modifier(Modifier::BOLD),
            ));
        }
        lines.push(Line::from(header));

        for (name, row) in corr.names.iter().zip(corr.values.iter()) {
            let mut spans: Vec<Span> = vec![Span::styled(
                format!("{:>label_width$} ", clip(name, label_width)),
                Style::new().add_modifier(Modifier::BOLD),
            )];
            for &v in row.iter() {
                let text = if v.is_finite() {
                    format!("{:^CELL_WIDTH$}", format!("{v:+.2}"))
                } else {
                    format!("{:^CELL_WIDTH$}", "n/a")
                };
                spans.push(Span::styled(
                    text,
                    Style::new().fg(Color::Black).bg(heat_color(v)),
                ));
            }
            lines.push(Line::from(spans));
        }

        lines.push(Line::default());
        lines.push(Line::from(vec![
            Span::styled("  -1.0 ", Style::new().fg(Color::Black).bg(heat_color(-1.0))),
            Span::styled("  0.0 ", Style::new().fg(Color::Black).bg(heat_color(0.0))),
            Span::styled("  +1.0 ", Style::new().fg(Color::Black).bg(heat_color(1.0))),
            Span::from("  pairwise Pearson over complete rows"),
        ]));

        frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
    }

    fn draw_preview(
        &self,
        uidata: &UIData,
        preview: &PreviewTable,
        frame: &mut Frame,
        area: Rect,
    ) {
        let widths: Vec<Constraint> = preview
            .names
            .iter()
            .enumerate()
            .map(|(cidx, name)| {
                let data_width = preview
                    .rows
                    .iter()
                    .map(|r| r[cidx].chars().count())
                    .max()
                    .unwrap_or(0);
                Constraint::Length(
                    name.chars()
                        .count()
                        .max(data_width)
                        .min(self.config.max_column_width) as u16,
                )
            })
            .collect();

        let header = Row::new(
            preview
                .names
                .iter()
                .map(|n| Cell::from(n.as_str()))
                .collect::<Vec<Cell>>(),
        )
        .style(Style::new().add_modifier(Modifier::BOLD));
        let rows: Vec<Row> = preview
            .rows
            .iter()
            .map(|r| Row::new(r.iter().map(|c| Cell::from(c.as_str())).collect::<Vec<Cell>>()))
            .collect();

        let title = format!(
            " {} — rows {}-{} of {} ",
            uidata.name,
            preview.offset + 1,
            preview.offset + preview.rows.len(),
            preview.total
        );
        let table = TableWidget::new(rows, widths)
            .header(header)
            .block(Block::bordered().title(title));
        frame.render_widget(table, area);
    }

    fn draw_status(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let uidata = model.get_uidata();
        let recent = uidata.last_status_message_update.elapsed()
            < Duration::from_secs(model.status_message_time());
        let line = if recent && !uidata.status_message.is_empty() {
            Line::from(uidata.status_message.as_str()).yellow()
        } else {
            Line::from("Tab mode · t kind · h/l column · d preview · y copy · ? help · q quit")
                .dark_gray()
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_popup(&self, uidata: &UIData, frame: &mut Frame) {
        let area = centered_rect(frame.area(), 60, 20);
        frame.render_widget(Clear, area);
        let popup = Paragraph::new(uidata.popup_message.as_str())
            .block(Block::bordered().title(" Help "));
        frame.render_widget(popup, area);
    }
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn selector_line(label: &str, selected: bool) -> Line<'static> {
    if selected {
        Line::from(format!("▸ {label}")).bold().cyan()
    } else {
        Line::from(format!("  {label}"))
    }
}

/// Darken the chosen color toward the terminal background; the closest a
/// cell terminal gets to an opacity slider.
fn blend(rgb: (u8, u8, u8), opacity: f64) -> Color {
    let f = opacity.clamp(0.0, 1.0);
    Color::Rgb(
        (rgb.0 as f64 * f) as u8,
        (rgb.1 as f64 * f) as u8,
        (rgb.2 as f64 * f) as u8,
    )
}

/// Coolwarm-style ramp: blue for negative, white around zero, red for
/// positive, gray for undefined cells.
fn heat_color(v: f64) -> Color {
    if !v.is_finite() {
        return Color::DarkGray;
    }
    let t = v.clamp(-1.0, 1.0);
    if t >= 0.0 {
        lerp((0xf5, 0xf5, 0xf5), (0xb2, 0x18, 0x2b), t)
    } else {
        lerp((0xf5, 0xf5, 0xf5), (0x21, 0x66, 0xac), -t)
    }
}

fn lerp(a: (u8, u8, u8), b: (u8, u8, u8), t: f64) -> Color {
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t) as u8;
    Color::Rgb(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

fn format_value(v: f64) -> String {
    if v == v.trunc() && v.abs() < 1e12 {
        format!("{}", v as i64)
    } else {
        format!("{v:.2}")
    }
}

fn clip(s: &str, width: usize) -> String {
    s.chars().take(width).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_scales_toward_background() {
        assert_eq!(blend((100, 200, 50), 1.0), Color::Rgb(100, 200, 50));
        assert_eq!(blend((100, 200, 50), 0.5), Color::Rgb(50, 100, 25));
        assert_eq!(blend((100, 200, 50), 0.0), Color::Rgb(0, 0, 0));
    }

    #[test]
    fn heat_color_endpoints() {
        assert_eq!(heat_color(1.0), Color::Rgb(0xb2, 0x18, 0x2b));
        assert_eq!(heat_color(-1.0), Color::Rgb(0x21, 0x66, 0xac));
        assert_eq!(heat_color(0.0), Color::Rgb(0xf5, 0xf5, 0xf5));
        assert_eq!(heat_color(f64::NAN), Color::DarkGray);
    }

    #[test]
    fn values_format_compactly() {
        assert_eq!(format_value(30.0), "30");
        assert_eq!(format_value(1.75), "1.75");
        assert_eq!(format_value(2.5), "2.50");
    }
}
