use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use efetivo_core::{PageButton, Person, SortColumn};

use crate::app::App;
use crate::ui::styles;

/// Render the roster view: filtered table on the left, person detail on the right
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
        .split(area);

    render_table(frame, app, chunks[0]);
    render_detail(frame, app, chunks[1]);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let query = app.query();
    let page = query.page(app.page, app.page_size());

    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let header_cells: Vec<Cell> = SortColumn::ALL
        .iter()
        .map(|col| Cell::from(format!("{}{}", col.header(), app.sort.indicator(*col))))
        .collect();

    let header = Row::new(header_cells)
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = page
        .rows
        .iter()
        .enumerate()
        .map(|(i, (_, person))| {
            let style = if i == app.roster_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let role_color = app.data.taxonomy().role(&person.role).map(|r| r.color.as_str());
            Row::new(vec![
                Cell::from(person.id.clone()),
                Cell::from(person.rank.clone()),
                Cell::from(person.name.clone()),
                Cell::from(person.unit.clone()),
                Cell::from(Span::styled(person.role.clone(), styles::role_style(role_color))),
                Cell::from(person.class.clone()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(12), // Id
        Constraint::Length(9),  // Rank
        Constraint::Fill(3),    // Name
        Constraint::Fill(1),    // Unit
        Constraint::Fill(1),    // Role
        Constraint::Length(7),  // Class
    ];

    let title = format!(" Efetivo - {} ", query.results_label());

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !page.rows.is_empty() {
        state.select(Some(app.roster_selection));
    }

    frame.render_stateful_widget(table, outer[0], &mut state);

    let mut spans = vec![Span::styled(
        if page.has_previous() { " ‹ [p] " } else { "       " },
        styles::muted_style(),
    )];
    for button in page.buttons() {
        match button {
            PageButton::Page { number, current: true } => {
                spans.push(Span::styled(format!("[{number}] "), styles::tab_style(true)));
            }
            PageButton::Page { number, .. } => {
                spans.push(Span::styled(format!("{number} "), styles::muted_style()));
            }
            PageButton::Ellipsis => spans.push(Span::styled("... ", styles::muted_style())),
        }
    }
    if page.has_next() {
        spans.push(Span::styled("[n] › ", styles::muted_style()));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), outer[1]);
}

fn detail_line<'a>(label: &'static str, value: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{label:<10}"), styles::muted_style()),
        Span::raw(if value.is_empty() { "-" } else { value }),
    ])
}

fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let selected = app.selected_person();

    let content = match selected {
        Some((_, person)) => detail_lines(app, person),
        None => vec![Line::from(Span::styled("Nenhum registro selecionado", styles::muted_style()))],
    };

    let block = Block::default()
        .title(" Detalhes ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(content).block(block), area);
}

fn detail_lines<'a>(app: &App, person: &'a Person) -> Vec<Line<'a>> {
    let mut lines = vec![
        Line::from(Span::styled(person.display_name(), styles::title_style())),
        Line::from(""),
        detail_line("Número:", &person.id),
        detail_line("Posto:", &person.rank),
        detail_line("Local:", &person.unit),
        detail_line("Função:", &person.role),
        detail_line("Classe:", &person.class),
    ];

    if person.is_unassigned() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Vaga sem número", styles::highlight_style())));
    }

    let chain = app.data.taxonomy().ancestors_of(&person.unit);
    if !chain.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Subordinação", styles::highlight_style())));
        for (depth, unit) in chain.iter().rev().enumerate() {
            lines.push(Line::from(Span::raw(format!("{}{}", "  ".repeat(depth + 1), unit))));
        }
        lines.push(Line::from(Span::styled(
            format!("{}{}", "  ".repeat(chain.len() + 1), person.unit),
            styles::title_style(),
        )));
    }

    lines
}
