use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use simsearch_core::Sim;

use crate::app::App;
use crate::ui::styles;

/// Label column width, including trailing padding
const LABEL_WIDTH: usize = 14;

/// Render the detail panel for the selected SIM
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.detail_loading {
        " Details (refreshing...) ".to_string()
    } else {
        " Details - [Enter] refresh ".to_string()
    };

    let content = match app.selected_sim() {
        Some(sim) => sim_lines(sim),
        None => vec![Line::from(Span::styled(
            " No SIM selected",
            styles::muted_style(),
        ))],
    };

    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn field<'a>(label: &'a str, value: impl Into<String>) -> Line<'a> {
    let value = value.into();
    let value = if value.is_empty() { "-".to_string() } else { value };
    Line::from(vec![
        Span::styled(format!("{:<width$}", label, width = LABEL_WIDTH), styles::muted_style()),
        Span::raw(value),
    ])
}

fn sim_lines(sim: &Sim) -> Vec<Line<'_>> {
    let mut lines = vec![
        Line::from(Span::styled(sim.display_name(), styles::title_style())),
        field("SIM ID:", sim.sim_id.as_str()),
        field("Primary IMSI:", sim.primary_imsi.as_str()),
        field("Status:", sim.status.as_str()),
        field("Speed Class:", sim.speed_class.as_str()),
        field("Type:", sim.sim_type.as_str()),
        Line::from(vec![
            Span::styled(format!("{:<width$}", "Session:", width = LABEL_WIDTH), styles::muted_style()),
            Span::styled(sim.online_str(), styles::online_style(sim.is_online())),
        ]),
        field("IP Address:", sim.ip_address().unwrap_or_default()),
    ];

    if let Some(profile) = sim.primary_profile() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Profile", styles::highlight_style())));
        lines.push(field("ICCID:", profile.iccid.as_str()));
        lines.push(field("OTA:", if profile.ota_supported { "supported" } else { "no" }));
        for subscriber in profile.subscribers.values() {
            lines.push(field(
                "Subscriber:",
                format!(
                    "{} {} ({}, {})",
                    subscriber.imsi,
                    subscriber.subscription,
                    subscriber.status,
                    subscriber.capabilities.display()
                ),
            ));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Tags ({})", sim.tags.len()),
        styles::highlight_style(),
    )));
    for (key, value) in sim.tags.iter() {
        lines.push(Line::from(vec![
            Span::styled(format!("  {}: ", key), styles::muted_style()),
            Span::raw(value),
        ]));
    }

    lines
}
