use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

/// Render the org-chart: unit tree on the left, role-grouped members of the
/// selected unit on the right
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    render_tree(frame, app, chunks[0]);
    render_unit_details(frame, app, chunks[1]);
}

fn render_tree(frame: &mut Frame, app: &App, area: Rect) {
    let chart = &app.data.derived().org_chart;
    let rows = app.org_rows();

    let mut items: Vec<ListItem> = rows
        .iter()
        .map(|row| {
            let branch = if row.depth == 0 { "" } else { "└─ " };
            ListItem::new(Line::from(vec![
                Span::raw(format!("{}{}", "   ".repeat(row.depth.saturating_sub(1)), branch)),
                Span::styled(row.node.name.clone(), styles::list_item_style()),
                Span::styled(format!(" ({})", row.node.count), styles::muted_style()),
            ]))
        })
        .collect();

    if chart.has_cycles() {
        items.push(ListItem::new(Line::from(Span::styled(
            format!("⚠ Ciclo na hierarquia: {}", chart.cycle_members.join(", ")),
            styles::error_style(),
        ))));
    }
    if chart.unassigned > 0 {
        items.push(ListItem::new(Line::from(Span::styled(
            format!("{} sem local cadastrado", chart.unassigned),
            styles::muted_style(),
        ))));
    }

    let list = List::new(items)
        .block(
            Block::default()
                .title(" Organograma ")
                .title_style(styles::title_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .highlight_style(styles::selected_style());

    let mut state = ListState::default();
    if !rows.is_empty() {
        state.select(Some(app.org_selection));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_unit_details(frame: &mut Frame, app: &App, area: Rect) {
    let unit = app.selected_unit();
    let mut lines = vec![];

    match unit.as_deref() {
        Some(name) => {
            let sections = app.data.unit_details(name);
            if sections.is_empty() {
                lines.push(Line::from(Span::styled("Nenhum militar neste local", styles::muted_style())));
            }
            for section in sections {
                let role = if section.role.is_empty() { "Sem função" } else { section.role.as_str() };
                lines.push(Line::from(vec![
                    Span::styled(role.to_string(), styles::role_style(section.color.as_deref())),
                    Span::styled(format!(" ({})", section.persons.len()), styles::muted_style()),
                ]));
                for person in section.persons {
                    lines.push(Line::from(vec![
                        Span::raw("  "),
                        Span::styled(person.display_name(), styles::list_item_style()),
                        Span::styled(format!("  {}", person.id), styles::muted_style()),
                    ]));
                }
                lines.push(Line::from(""));
            }
        }
        None => lines.push(Line::from(Span::styled("Nenhum local cadastrado", styles::muted_style()))),
    }

    let title = format!(" {} ", unit.as_deref().unwrap_or("Local"));
    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
