use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use efetivo_core::{StatEntry, UnitCard};

use crate::app::App;
use crate::ui::styles;

/// Width of the percentage bar in the stat panels.
const BAR_WIDTH: usize = 12;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    // 1. KPIs (full width)
    // 2. Class | Rank | Role
    // 3. Units
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Percentage(50),
            Constraint::Min(6),
        ])
        .split(area);

    render_kpis(frame, app, main_chunks[0]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
        ])
        .split(main_chunks[1]);

    let summary = &app.data.derived().summary;
    render_stats(frame, " Por classe ", &summary.by_class, middle[0]);
    render_stats(frame, " Por posto/graduação ", &summary.by_rank, middle[1]);
    render_stats(frame, " Por função ", &summary.by_role, middle[2]);

    render_unit_cards(frame, &summary.unit_cards, main_chunks[2]);
}

fn render_kpis(frame: &mut Frame, app: &App, area: Rect) {
    let kpis = app.data.derived().summary.kpis;
    let cell = |label: &'static str, value: usize| {
        vec![
            Span::styled(format!("{label}: "), styles::muted_style()),
            Span::styled(format!("{value:<8}"), styles::title_style()),
        ]
    };

    let mut spans = vec![Span::raw(" ")];
    spans.extend(cell("Efetivo total", kpis.total));
    spans.extend(cell("Oficiais", kpis.officers));
    spans.extend(cell("Praças", kpis.others));
    spans.extend(cell("Locais", kpis.units));

    let block = Block::default()
        .title(" Painel ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(vec![Line::from(""), Line::from(spans)]).block(block), area);
}

fn bar(percentage: f64) -> String {
    let filled = ((percentage / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn render_stats(frame: &mut Frame, title: &str, entries: &[StatEntry], area: Rect) {
    let label_width = entries
        .iter()
        .map(|e| e.label.chars().count())
        .max()
        .unwrap_or(0)
        .min(18);

    let mut lines: Vec<Line> = entries
        .iter()
        .map(|e| {
            let label = if e.label.is_empty() { "-" } else { e.label.as_str() };
            Line::from(vec![
                Span::styled(
                    format!("{:<width$} ", efetivo_core::utils::truncate_string(label, 18), width = label_width),
                    styles::list_item_style(),
                ),
                Span::styled(bar(e.percentage), styles::highlight_style()),
                Span::styled(format!(" {:>4} ({:.1}%)", e.count, e.percentage), styles::muted_style()),
            ])
        })
        .collect();

    if lines.is_empty() {
        lines.push(Line::from(Span::styled("Sem dados", styles::muted_style())));
    }

    let block = Block::default()
        .title(title.to_string())
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_unit_cards(frame: &mut Frame, cards: &[UnitCard], area: Rect) {
    let mut lines = vec![];

    for card in cards {
        let mut spans = vec![
            Span::styled(format!("{:<16}", card.unit), styles::highlight_style()),
            Span::styled(format!("{:>4}  ", card.total), styles::title_style()),
        ];
        for (class, count) in &card.classes {
            spans.push(Span::styled(format!("{class}: {count}  "), styles::muted_style()));
        }
        lines.push(Line::from(spans));
    }

    if lines.is_empty() {
        lines.push(Line::from(Span::styled("Nenhum local cadastrado", styles::muted_style())));
    }

    let block = Block::default()
        .title(" Por local ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
