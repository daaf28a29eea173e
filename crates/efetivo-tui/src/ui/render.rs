use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use efetivo_core::utils::age_display;
use efetivo_core::View;

use crate::app::{App, Mode};

use super::styles;
use super::tabs::{dashboard, ddqod, orgchart, roster};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    match app.mode {
        Mode::ShowingHelp => render_help_overlay(frame),
        Mode::ConfirmingQuit => render_quit_overlay(frame),
        Mode::ConfirmingDelete => render_delete_overlay(frame, app),
        _ => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  Efetivo";
    let help_hint = "[?] Help";
    let info = &app.data.ddqod().info;
    let description = if info.description.is_empty() {
        String::new()
    } else {
        format!(" | {}", info.description)
    };

    let used = title.chars().count() + description.chars().count() + help_hint.len() + 4;
    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::styled(description, styles::muted_style()),
        Span::raw(" ".repeat((area.width as usize).saturating_sub(used))),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let current = app.current_view();

    let mut spans = vec![Span::raw(" ")];
    for (i, view) in View::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = format!("[{}] {}", i + 1, view.title());
        if *view == current {
            spans.push(Span::styled(label, styles::tab_style(true)));
        } else {
            spans.push(Span::styled(label, styles::muted_style()));
        }
    }

    // Active roster filters on the right
    if current == View::Roster && !app.filter.is_empty() {
        let mut parts = Vec::new();
        if !app.filter.search.is_empty() {
            parts.push(format!("\"{}\"", app.filter.search));
        }
        for value in [&app.filter.unit, &app.filter.class, &app.filter.role] {
            if !value.is_empty() {
                parts.push(value.clone());
            }
        }
        let text = format!("Filtros: {} ", parts.join(" · "));
        let main_width: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let padding = (area.width as usize).saturating_sub(main_width + text.chars().count() + 1);
        spans.push(Span::raw(" ".repeat(padding)));
        spans.push(Span::styled(text, styles::search_style()));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_view() {
        View::Dashboard => dashboard::render(frame, app, area),
        View::Roster => roster::render(frame, app, area),
        View::OrgChart => orgchart::render(frame, app, area),
        View::Ddqod => ddqod::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[/]search | [q]uit";

    let left_text = if app.mode == Mode::Searching {
        format!(" Buscar: {}▌ ", app.filter.search)
    } else if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else {
        match app.data.last_saved() {
            Some(at) => format!(" Saved {} ", age_display(at, Utc::now())),
            None => " Not saved yet ".to_string(),
        }
    };

    let (durability, durability_style) = if app.durable {
        (" ● salvo ", styles::success_style())
    } else {
        (" ● não salvo ", styles::error_style())
    };

    let right_text = format!(" {} ", shortcuts);
    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(durability.chars().count())
        .saturating_sub(right_text.len());

    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(durability, durability_style),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 30, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  Efetivo", styles::title_style())),
        Line::from(Span::styled(
            format!("  version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1-4", "Switch views"),
        help_line("←/→", "Previous/next view"),
        help_line("j/k ↑/↓", "Move selection"),
        help_line("n/p", "Next/previous page"),
        help_line("Esc", "Clear search"),
        Line::from(""),
        Line::from(Span::styled(" Roster", styles::highlight_style())),
        help_line("/", "Search"),
        help_line("s", "Cycle sort column"),
        help_line("r", "Reverse sort"),
        help_line("u/c/f", "Cycle unit/class/role filter"),
        help_line("x", "Clear filters"),
        help_line("d", "Delete selected person"),
        Line::from(""),
        Line::from(Span::styled(" Export", styles::highlight_style())),
        help_line("e", "Filtered roster as CSV"),
        help_line("b", "Full backup (JSON)"),
        help_line("D", "DDQOD bundle (JSON)"),
        Line::from(""),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(help_text).block(block);

    frame.render_widget(paragraph, area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn confirm_lines(question: String) -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(Span::styled(question, styles::highlight_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to confirm, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ]
}

fn render_confirm(frame: &mut Frame, lines: Vec<Line<'static>>) {
    let area = centered_rect_fixed(52, 7, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    render_confirm(frame, confirm_lines("   Are you sure you want to quit?".to_string()));
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let name = app
        .selected_person()
        .map(|(_, p)| p.display_name())
        .unwrap_or_default();
    render_confirm(frame, confirm_lines(format!("   Remover {}?", name)));
}
