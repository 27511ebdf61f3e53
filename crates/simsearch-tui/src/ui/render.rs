use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use simsearch_core::{Coverage, SimFilter};

use crate::app::{App, AppState, LoginFocus};

use super::styles;
use super::views::{detail, results};

const LOGO: [&str; 3] = [
    "   ╔═╗╦╔╦╗  ╔═╗╔═╗╔═╗╦═╗╔═╗╦ ╦",
    "   ╚═╗║║║║  ╚═╗║╣ ╠═╣╠╦╝║  ╠═╣",
    "   ╚═╝╩╩ ╩  ╚═╝╚═╝╩ ╩╩╚═╚═╝╩ ╩",
];

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),      // Title bar
            Constraint::Length(3),      // Search form
            Constraint::Min(8),         // Results
            Constraint::Percentage(35), // Detail panel
            Constraint::Length(1),      // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_search_form(frame, app, chunks[1]);
    results::render(frame, app, chunks[2]);
    detail::render(frame, app, chunks[3]);
    render_status_bar(frame, app, chunks[4]);

    // Render overlays
    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }

    if matches!(app.state, AppState::LoggingIn) {
        render_login_overlay(frame, app);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, _app: &App, area: Rect) {
    let title = "  SIM Search";
    let help_hint = "[?] Help";
    let title_len = title.len();

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title_len as u16 + help_hint.len() as u16 + 4)
                as usize,
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_search_form(frame: &mut Frame, app: &App, area: Rect) {
    let editing = matches!(app.state, AppState::EditingSearch);

    let mut spans = vec![Span::raw(" ")];
    for filter in SimFilter::ALL {
        let style = if filter == app.search_filter {
            styles::selected_style().fg(styles::PRIMARY)
        } else {
            styles::muted_style()
        };
        spans.push(Span::styled(format!(" {} ", filter.label()), style));
    }

    spans.push(Span::styled("  ▸ ", styles::muted_style()));
    let cursor = if editing { "▌" } else { "" };
    spans.push(Span::styled(
        format!("{}{}", app.search_value, cursor),
        styles::search_style(),
    ));

    if let Some(ref error) = app.search_error {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(error.clone(), styles::error_style()));
    }

    let title = if editing {
        " Search - [←/→] filter [Enter] search [Esc] cancel "
    } else {
        " Search - [/] edit "
    };

    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(editing));

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[/]search | [L]ogout | [q]uit";

    let left_text = match app.status_message {
        Some(ref msg) => format!(" {} ", msg),
        None => " Ready ".to_string(),
    };

    let session = app
        .api
        .as_ref()
        .and_then(|api| api.credentials())
        .map(|creds| {
            format!(
                "{} | signed in {}m ago | ",
                creds.coverage(),
                creds.minutes_since_login()
            )
        })
        .unwrap_or_default();

    let right_text = format!(" {}{} ", session, shortcuts);

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());

    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn logo_lines() -> Vec<Line<'static>> {
    LOGO.iter()
        .map(|line| Line::from(Span::styled(*line, styles::title_style())))
        .collect()
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 24, frame.area());

    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let mut help_text = logo_lines();
    help_text.push(Line::from(Span::styled(
        format!("              version {}", version),
        styles::muted_style(),
    )));
    help_text.push(Line::from(""));
    help_text.push(Line::from(Span::styled(" Search", styles::highlight_style())));
    help_text.push(help_line("/", "Edit search value"));
    help_text.push(help_line("←/→", "Change filter"));
    help_text.push(help_line("Enter", "Run search (while editing)"));
    help_text.push(help_line("Esc", "Stop editing"));
    help_text.push(Line::from(""));
    help_text.push(Line::from(Span::styled(" Results", styles::highlight_style())));
    help_text.push(help_line("↑/↓ j/k", "Move selection"));
    help_text.push(help_line("PgUp/PgDn", "Move by page"));
    help_text.push(help_line("Enter", "Refresh selected SIM"));
    help_text.push(help_line("r", "Re-run last search"));
    help_text.push(Line::from(""));
    help_text.push(Line::from(Span::styled(" Session", styles::highlight_style())));
    help_text.push(help_line("L", "Log out"));
    help_text.push(help_line("q", "Quit"));
    help_text.push(Line::from(""));
    help_text.push(Line::from(vec![
        Span::styled("       Press ", styles::muted_style()),
        Span::styled("?", styles::help_key_style()),
        Span::styled(" or ", styles::muted_style()),
        Span::styled("Esc", styles::help_key_style()),
        Span::styled(" to close", styles::muted_style()),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

/// Style and cursor for a login form row
fn focus_style(focused: bool) -> (Style, &'static str) {
    if focused {
        (styles::selected_style(), "▌")
    } else {
        (styles::list_item_style(), "")
    }
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let height = if app.login_error.is_some() { 15 } else { 13 };
    let area = centered_rect_fixed(56, height, frame.area());

    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.push(Line::from(""));

    let (style, cursor) = focus_style(app.login_focus == LoginFocus::AuthKeyId);
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled("Auth Key ID: [", styles::muted_style()),
        Span::styled(format!("{:<30}{}", tail(&app.login_auth_key_id, 30), cursor), style),
        Span::styled("]", styles::muted_style()),
    ]));

    let (style, cursor) = focus_style(app.login_focus == LoginFocus::AuthKey);
    let masked: String = "*".repeat(app.login_auth_key.chars().count().min(30));
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled("Auth Key:    [", styles::muted_style()),
        Span::styled(format!("{:<30}{}", masked, cursor), style),
        Span::styled("]", styles::muted_style()),
    ]));

    let coverage_focused = app.login_focus == LoginFocus::Coverage;
    let mut coverage_spans = vec![
        Span::raw("  "),
        Span::styled("Coverage:     ", styles::muted_style()),
    ];
    for coverage in [Coverage::Global, Coverage::Japan] {
        let marker = if coverage == app.login_coverage { "(•)" } else { "( )" };
        let style = if coverage == app.login_coverage && coverage_focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        coverage_spans.push(Span::styled(
            format!("{} {}  ", marker, coverage.display_name()),
            style,
        ));
    }
    lines.push(Line::from(coverage_spans));

    let button_focused = app.login_focus == LoginFocus::Button;
    let (button_style, _) = focus_style(button_focused);
    let label = if button_focused { " ▶ Login ◀ " } else { "   Login   " };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("                     ["),
        Span::styled(label, button_style),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .title(" Sign in to Soracom ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Last `max` characters of `s`, so the cursor end of a long id stays visible
fn tail(s: &str, max: usize) -> String {
    let count = s.chars().count();
    s.chars().skip(count.saturating_sub(max)).collect()
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 9, frame.area());

    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "   Are you sure you want to quit?",
        styles::highlight_style(),
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("   Press ", styles::muted_style()),
        Span::styled("[Y]", styles::help_key_style()),
        Span::styled(" to quit, ", styles::muted_style()),
        Span::styled("[N]", styles::help_key_style()),
        Span::styled(" to cancel", styles::muted_style()),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
