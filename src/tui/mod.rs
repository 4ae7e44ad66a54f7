//! Ratatui-based terminal UI.
//!
//! Shows the signal statistics, the spread chart with inversion and recession
//! bands, and a scrollable list of dis-inversion -> recession links. The view is
//! read-only; the analysis is finished before the terminal is touched.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

use crate::app::pipeline::RunOutput;
use crate::domain::{HORIZON_MONTHS, LinkRecord};
use crate::error::{AppError, ErrorKind};
use crate::plot::SpreadChartData;

mod plotters_chart;

use plotters_chart::SpreadPlottersChart;

/// Show the interactive chart until the user quits.
pub fn run(output: &RunOutput) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(ErrorKind::Terminal, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(output);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode()
            .map_err(|e| AppError::new(ErrorKind::Terminal, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(
                ErrorKind::Terminal,
                format!("Failed to enter alternate screen: {e}"),
            ));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App<'a> {
    output: &'a RunOutput,
    chart: Option<SpreadChartData>,
    selected_link: usize,
}

impl<'a> App<'a> {
    fn new(output: &'a RunOutput) -> Self {
        Self {
            output,
            chart: SpreadChartData::from_analysis(&output.analysis),
            selected_link: 0,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let term_err = |what: &str, e: io::Error| AppError::new(ErrorKind::Terminal, format!("{what}: {e}"));

        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| term_err("Terminal draw error", e))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100)).map_err(|e| term_err("Event poll error", e))? {
                continue;
            }

            match event::read().map_err(|e| term_err("Event read error", e))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => needs_redraw = true,
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        let n_links = self.output.analysis.links.len();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => self.selected_link = self.selected_link.saturating_sub(1),
            KeyCode::Down => {
                if self.selected_link + 1 < n_links {
                    self.selected_link += 1;
                }
            }
            KeyCode::Home => self.selected_link = 0,
            KeyCode::End => self.selected_link = n_links.saturating_sub(1),
            _ => {}
        }
        false
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let analysis = &self.output.analysis;
        let stats = &analysis.stats;

        let window = match (analysis.rows.first(), analysis.rows.last()) {
            (Some(first), Some(last)) => format!("{} .. {}", first.date, last.date),
            _ => "no common dates".to_string(),
        };
        let hit_rate = stats
            .hit_rate
            .map(|r| format!("{:.1}%", r * 100.0))
            .unwrap_or_else(|| "n/a".to_string());

        let lines = vec![
            Line::from(vec![
                Span::styled("yc", Style::default().fg(Color::Cyan)),
                Span::raw(format!(" | 10y - 2y spread | {window} | n={}", analysis.rows.len())),
            ]),
            Line::from(Span::styled(
                format!(
                    "dis-inversions: {} | recession within {HORIZON_MONTHS}m: {} | false: {} | hit rate: {hit_rate}",
                    stats.total, stats.true_signals, stats.false_signals,
                ),
                Style::default().fg(Color::Gray),
            )),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(44)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_links(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title("Spread (pp) | orange: inversion | gray: recession")
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(data) = &self.chart else {
            let msg = Paragraph::new("No aligned observations to plot.").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        frame.render_widget(SpreadPlottersChart { data }, inner);
    }

    fn draw_links(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let links = &self.output.analysis.links;
        let items: Vec<ListItem> = links.iter().map(link_item).collect();

        let list = List::new(items)
            .block(Block::default().title("Dis-inversion -> recession").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        if !links.is_empty() {
            state.select(Some(self.selected_link));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ scroll links  Home/End jump  q/Esc quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(
                format!("{} onsets", self.output.analysis.onsets.len()),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn link_item(link: &LinkRecord) -> ListItem<'static> {
    let color = if link.found_recession { Color::Green } else { Color::Red };
    ListItem::new(link_label(link)).style(Style::default().fg(color))
}

fn link_label(link: &LinkRecord) -> String {
    match (link.recession_start, link.days_to_recession) {
        (Some(start), Some(days)) => format!("{} -> {start} ({days}d)", link.inversion_end),
        _ => format!("{} -> none", link.inversion_end),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::run_with_series;
    use crate::domain::{ObservedSeries, SeriesCode};
    use chrono::{Datelike, NaiveDate};
    use ratatui::backend::TestBackend;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample_run() -> RunOutput {
        let dates: Vec<NaiveDate> = (1..=28).map(|day| d(2022, 2, day)).collect();
        let dgs10 = dates.iter().map(|&dt| (dt, 2.0)).collect();
        let dgs2 = dates
            .iter()
            .map(|&dt| (dt, if dt.day() < 10 { 2.5 } else { 1.5 }))
            .collect();
        let mut usrec: Vec<(NaiveDate, f64)> = dates.iter().map(|&dt| (dt, 0.0)).collect();
        usrec.push((d(2022, 6, 1), 1.0));

        run_with_series(
            ObservedSeries::new(SeriesCode::Dgs10, dgs10),
            ObservedSeries::new(SeriesCode::Dgs2, dgs2),
            ObservedSeries::new(SeriesCode::Usrec, usrec),
        )
        .unwrap()
    }

    #[test]
    fn quit_keys_and_link_scrolling() {
        let run = sample_run();
        let mut app = App::new(&run);
        assert_eq!(run.analysis.links.len(), 1);

        assert!(!app.handle_key(KeyCode::Down));
        assert_eq!(app.selected_link, 0);
        assert!(!app.handle_key(KeyCode::Up));
        assert_eq!(app.selected_link, 0);
        assert!(app.handle_key(KeyCode::Char('q')));
        assert!(app.handle_key(KeyCode::Esc));
    }

    #[test]
    fn draws_stats_header_into_a_test_backend() {
        let run = sample_run();
        let app = App::new(&run);
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();

        let buffer = terminal.backend().buffer();
        let header: String = (0..buffer.area.width)
            .map(|x| buffer[(x, 2)].symbol().to_string())
            .collect();
        assert!(header.contains("hit rate: 100.0%"), "header was {header:?}");
    }

    #[test]
    fn link_labels_name_the_onset() {
        let mut link = LinkRecord {
            inversion_end: d(2022, 2, 11),
            found_recession: true,
            recession_start: Some(d(2023, 6, 1)),
            days_to_recession: Some(475),
        };
        assert_eq!(link_label(&link), "2022-02-11 -> 2023-06-01 (475d)");

        link.found_recession = false;
        link.recession_start = None;
        link.days_to_recession = None;
        assert_eq!(link_label(&link), "2022-02-11 -> none");
    }
}
