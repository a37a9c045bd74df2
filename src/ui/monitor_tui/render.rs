use chrono::Local;
use ratatui::{
    prelude::*,
    widgets::{Block, Paragraph},
};

use super::app::MonitorApp;
use crate::core::config::PaletteRole;
use crate::ui::text::{branch_symbol, fit_label, header_line, pad_field, LABEL_WIDTH};

const TITLE: &str = "sense";

/// Main render function
pub fn render_ui(frame: &mut Frame, app: &MonitorApp) {
    let area = frame.area();
    frame.render_widget(
        Block::default().style(app.theme.style(PaletteRole::Background)),
        area,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Column header
            Constraint::Min(0),    // Groups
            Constraint::Length(1), // Footer
        ])
        .split(area);

    render_header(frame, chunks[0], app);
    render_groups(frame, chunks[1], app);
    render_footer(frame, chunks[2], app);
}

fn render_header(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let para = Paragraph::new(header_line()).style(app.theme.style(PaletteRole::Title));
    frame.render_widget(para, area);
}

fn group_lines(app: &MonitorApp) -> Vec<Line<'static>> {
    let theme = &app.theme;
    let chip = theme.style(PaletteRole::Chip);
    let symbol = theme.style(PaletteRole::Symbol);
    let sensor = theme.style(PaletteRole::Sensor);

    let mut lines = Vec::with_capacity(app.content_height());
    for group in &app.snapshot().groups {
        lines.push(Line::styled(group.name.clone(), chip));

        let count = group.rows.len();
        for (index, row) in group.rows.iter().enumerate() {
            let fields: String = row.fields().iter().map(|f| pad_field(f)).collect();
            lines.push(Line::from(vec![
                Span::styled(branch_symbol(index, count), symbol),
                Span::raw(" "),
                Span::styled(fit_label(&row.label, LABEL_WIDTH), sensor),
                Span::raw(fields),
            ]));
        }

        lines.push(Line::default());
    }

    lines
}

fn render_groups(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    if app.snapshot().groups.is_empty() {
        let para = Paragraph::new("No sensors found")
            .style(app.theme.style(PaletteRole::QuitHint))
            .alignment(Alignment::Center);
        frame.render_widget(para, area);
        return;
    }

    let max_offset = app.content_height().saturating_sub(area.height as usize);
    let offset = app.scroll.min(max_offset).min(u16::MAX as usize) as u16;

    let para = Paragraph::new(group_lines(app)).scroll((offset, 0));
    frame.render_widget(para, area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let date = Local::now().format(&app.date_format).to_string();

    frame.render_widget(
        Paragraph::new(TITLE).style(app.theme.style(PaletteRole::Title)),
        columns[0],
    );
    frame.render_widget(
        Paragraph::new(date)
            .style(app.theme.style(PaletteRole::Date))
            .alignment(Alignment::Center),
        columns[1],
    );
    frame.render_widget(
        Paragraph::new(app.quit_hint.as_str())
            .style(app.theme.style(PaletteRole::QuitHint))
            .alignment(Alignment::Right),
        columns[2],
    );
}
