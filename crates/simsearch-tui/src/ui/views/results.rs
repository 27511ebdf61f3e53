use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::{App, AppState};
use crate::ui::styles;
use crate::utils::truncate;

/// Max characters shown in the Tags cell
const TAGS_CELL_WIDTH: usize = 40;

/// Render the results table - one row per SIM, alternating shading
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.state, AppState::Normal);

    let title = match app.last_query {
        Some(ref query) => format!(" SIMs ({}) - {} ", app.sims.len(), query),
        None => " SIMs ".to_string(),
    };

    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    if app.sims.is_empty() {
        let message = if app.searching {
            "Loading SIMs..."
        } else if app.last_query.is_some() {
            "No SIMs matched"
        } else {
            "Press / to search"
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(
            format!(" {}", message),
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let header_cells = [
        "Name",
        "SIM ID",
        "Primary IMSI",
        "Status",
        "Speed Class",
        "Type",
        "Online",
        "Tags",
    ]
    .into_iter()
    .map(Cell::from);

    let header = Row::new(header_cells)
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = app
        .sims
        .iter()
        .enumerate()
        .map(|(i, sim)| {
            Row::new(vec![
                Cell::from(sim.display_name().to_string()),
                Cell::from(sim.sim_id.clone()),
                Cell::from(sim.primary_imsi.clone()),
                Cell::from(sim.status.clone()),
                Cell::from(sim.speed_class.clone()),
                Cell::from(sim.sim_type.clone()),
                Cell::from(Span::styled(
                    sim.online_str(),
                    styles::online_style(sim.is_online()),
                )),
                Cell::from(truncate(&sim.tags.summary(), TAGS_CELL_WIDTH)),
            ])
            .style(styles::row_style(i))
        })
        .collect();

    let widths = [
        Constraint::Fill(2),    // Name
        Constraint::Length(20), // SIM ID
        Constraint::Length(16), // Primary IMSI
        Constraint::Length(10), // Status
        Constraint::Length(12), // Speed Class
        Constraint::Length(6),  // Type
        Constraint::Length(7),  // Online
        Constraint::Fill(3),    // Tags
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.selection));

    frame.render_stateful_widget(table, area, &mut state);
}
