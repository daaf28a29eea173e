use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use efetivo_core::{GroupReconciliation, StaffingStatus, StaffingTotals};

use crate::app::App;
use crate::ui::styles;

/// Render the DDQOD view: groups on the left, category lines of the selected
/// group on the right, grand totals at the bottom
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(report) = app.data.derived().reconciliation.as_ref() else {
        let block = Block::default()
            .title(" DDQOD ")
            .borders(Borders::ALL)
            .border_style(styles::border_style(true));
        frame.render_widget(
            Paragraph::new(Span::styled("Sem dados", styles::muted_style())).block(block),
            area,
        );
        return;
    };

    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(3)])
        .split(area);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(outer[0]);

    render_groups(frame, app, &report.groups, chunks[0]);
    render_lines(frame, report.groups.get(app.ddqod_selection), chunks[1]);
    render_grand_total(frame, &report.totals, outer[1]);
}

fn totals_spans(totals: &StaffingTotals) -> Vec<Span<'static>> {
    vec![
        Span::styled(format!("{}/{} ", totals.actual, totals.predicted), styles::list_item_style()),
        Span::styled(format!("-{} ", totals.deficit), styles::staffing_style(StaffingStatus::Deficit)),
        Span::styled(format!("+{} ", totals.surplus), styles::staffing_style(StaffingStatus::Surplus)),
        Span::styled(format!("{}%", totals.percentage()), styles::muted_style()),
    ]
}

fn render_groups(frame: &mut Frame, app: &App, groups: &[GroupReconciliation], area: Rect) {
    let rows: Vec<Row> = groups
        .iter()
        .enumerate()
        .map(|(i, group)| {
            let style = if i == app.ddqod_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            Row::new(vec![
                Cell::from(group.name.clone()),
                Cell::from(Line::from(totals_spans(&group.totals))),
            ])
            .style(style)
        })
        .collect();

    let header = Row::new(vec![Cell::from("Grupo"), Cell::from("Exist./Prev.")])
        .style(styles::title_style());

    let table = Table::new(rows, [Constraint::Fill(1), Constraint::Length(22)])
        .header(header)
        .block(
            Block::default()
                .title(" Grupos ")
                .title_style(styles::title_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !groups.is_empty() {
        state.select(Some(app.ddqod_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_lines(frame: &mut Frame, group: Option<&GroupReconciliation>, area: Rect) {
    let Some(group) = group else {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(styles::border_style(false));
        frame.render_widget(
            Paragraph::new(Span::styled("Nenhum grupo", styles::muted_style())).block(block),
            area,
        );
        return;
    };

    let header = Row::new(vec!["Categoria", "Existente", "Previsto", "Dif.", "Situação", "%"])
        .style(styles::title_style());

    let rows: Vec<Row> = group
        .lines
        .iter()
        .map(|line| {
            let status_style = styles::staffing_style(line.status);
            Row::new(vec![
                Cell::from(line.category.clone()),
                Cell::from(format!("{:>5}", line.actual)),
                Cell::from(format!("{:>5}", line.predicted)),
                Cell::from(Span::styled(format!("{:>+5}", line.diff), status_style)),
                Cell::from(Span::styled(line.status.label(), status_style)),
                Cell::from(format!("{:>3}%", line.percentage)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(1),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(6),
        Constraint::Length(10),
        Constraint::Length(5),
    ];

    let title = format!(" {} ({}) ", group.name, group.units.join(", "));
    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(title)
            .title_style(styles::title_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(false)),
    );
    frame.render_widget(table, area);
}

fn render_grand_total(frame: &mut Frame, totals: &StaffingTotals, area: Rect) {
    let mut spans = vec![Span::styled(" Total geral: ", styles::highlight_style())];
    spans.extend(totals_spans(totals));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}
