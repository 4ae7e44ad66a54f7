//! Plotters-powered spread chart widget for Ratatui.
//!
//! Plotters output is rendered into the Ratatui buffer using
//! `plotters-ratatui-backend`; the drawing itself is shared with the SVG export.

use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::plot::{ChartStyle, SpreadChartData, draw_spread_chart};

/// Render-only chart; all series and bounds are computed before drawing.
pub struct SpreadPlottersChart<'a> {
    pub data: &'a SpreadChartData,
}

impl Widget for SpreadPlottersChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to lay out axes in very small areas.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.data.x_bounds;
        let [y0, y1] = self.data.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let data = self.data;
        let style = ChartStyle::terminal();
        let widget = widget_fn(move |root| {
            draw_spread_chart(&root, data, &style)?;
            Ok(())
        });

        widget.render(area, buf);
    }
}
