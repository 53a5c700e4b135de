use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Row, Table, Wrap},
};

use crate::app::{App, ChatRole, DashboardStats, InputMode, SaveStatus, Screen, is_secret_field};
use crate::api::Workflow;

/// Parse a line of text and convert **bold** and `code` markdown to styled
/// spans. Full markdown rendering is out of scope; this covers what the
/// agent actually emits most.
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.char_indices().peekable();
    let mut current_text = String::new();

    while let Some((_, c)) = chars.next() {
        if c == '*' && chars.peek().map(|(_, c)| *c) == Some('*') {
            // Consume the second *
            chars.next();

            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;

            while let Some((_, c)) = chars.next() {
                if c == '*' && chars.peek().map(|(_, c)| *c) == Some('*') {
                    chars.next(); // consume second *
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else if c == '`' {
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            let mut code_text = String::new();
            let mut found_close = false;
            for (_, c) in chars.by_ref() {
                if c == '`' {
                    found_close = true;
                    break;
                }
                code_text.push(c);
            }

            if found_close && !code_text.is_empty() {
                spans.push(Span::styled(code_text, Style::default().fg(Color::Yellow)));
            } else {
                current_text.push('`');
                current_text.push_str(&code_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    // Sidebar view switcher on the left, active view on the right
    let [sidebar_area, view_area] =
        Layout::horizontal([Constraint::Length(18), Constraint::Min(0)]).areas(body_area);

    render_sidebar(app, frame, sidebar_area);

    match app.screen {
        Screen::Chat => render_chat_screen(app, frame, view_area),
        Screen::Workflows => render_workflows_screen(app, frame, view_area),
        Screen::Config => render_config_screen(app, frame, view_area),
    }

    render_footer(app, frame, footer_area);

    if app.detail_open {
        render_workflow_detail(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Flowdeck ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!(" {} ", app.client.base_url()),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_sidebar(app: &App, frame: &mut Frame, area: Rect) {
    let entries = [
        (Screen::Chat, "1  Agent"),
        (Screen::Workflows, "2  Workflows"),
        (Screen::Config, "3  Configuration"),
    ];

    let items: Vec<ListItem> = entries
        .iter()
        .map(|(screen, label)| {
            let style = if *screen == app.screen {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            ListItem::new(Line::from(Span::styled(format!(" {}", label), style)))
        })
        .collect();

    let sidebar = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(sidebar, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.screen {
        Screen::Chat => " AGENT ",
        Screen::Workflows => " WORKFLOWS ",
        Screen::Config => " CONFIG ",
    };

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match (app.screen, app.input_mode) {
        (Screen::Chat, InputMode::Normal) => vec![
            Span::styled(" i ", key_style),
            Span::styled(" type ", label_style),
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" G ", key_style),
            Span::styled(" bottom ", label_style),
            Span::styled(" 1/2/3 ", key_style),
            Span::styled(" view ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
        (Screen::Chat, InputMode::Editing) => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
        ],
        (Screen::Workflows, _) => {
            if app.detail_open {
                vec![
                    Span::styled(" Esc ", key_style),
                    Span::styled(" close ", label_style),
                ]
            } else {
                vec![
                    Span::styled(" j/k ", key_style),
                    Span::styled(" nav ", label_style),
                    Span::styled(" Enter ", key_style),
                    Span::styled(" detail ", label_style),
                    Span::styled(" r ", key_style),
                    Span::styled(" reload ", label_style),
                    Span::styled(" 1/2/3 ", key_style),
                    Span::styled(" view ", label_style),
                    Span::styled(" q ", key_style),
                    Span::styled(" quit ", label_style),
                ]
            }
        }
        (Screen::Config, InputMode::Normal) => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" nav ", label_style),
            Span::styled(" Enter ", key_style),
            Span::styled(" edit ", label_style),
            Span::styled(" s ", key_style),
            Span::styled(" save ", label_style),
            Span::styled(" v ", key_style),
            Span::styled(
                if app.show_secrets { " hide keys " } else { " show keys " },
                label_style,
            ),
            Span::styled(" r ", key_style),
            Span::styled(" reload ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
        (Screen::Config, InputMode::Editing) => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" apply ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" cancel ", label_style),
        ],
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_area_height = chat_area.height.saturating_sub(2);
    app.chat_area_width = chat_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" n8n AI Agent ");

    let mut lines: Vec<Line> = Vec::new();

    for msg in &app.messages {
        // Empty streaming messages are hidden; the status block stands in
        if msg.streaming && msg.content.is_empty() {
            continue;
        }
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.push(Line::from(line.to_string()));
                }
                lines.push(Line::default());
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled(
                    "Agent:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.push(parse_markdown_line(line));
                }
                if msg.streaming {
                    lines.push(Line::from(Span::styled(
                        "\u{258c}",
                        Style::default().fg(Color::Yellow),
                    )));
                }
                lines.push(Line::default());
            }
        }
    }

    if app.status_block_visible() {
        lines.push(Line::from(Span::styled(
            "Agent:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        let status_text = app
            .status_display()
            .unwrap_or_else(|| "Processing...".to_string());
        lines.push(Line::from(Span::styled(
            format!("{}{}", status_text, dots),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, chat_area);

    // Input box at the bottom
    let input_border_color = if app.input_mode == InputMode::Editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let input_title = if app.chat_in_flight {
        " Waiting for reply... "
    } else {
        " Ask anything about your n8n workflows "
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(input_title);

    // Horizontal scroll keeps the cursor visible in long input
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.chat_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .chat_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, input_area);

    if app.input_mode == InputMode::Editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }
}

fn render_workflows_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [stats_area, table_area] =
        Layout::vertical([Constraint::Length(4), Constraint::Min(0)]).areas(area);

    render_dashboard_stats(&app.dashboard_stats(), frame, stats_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" All Workflows ");

    if app.workflows_loading {
        let placeholder = Paragraph::new("Loading workflows...")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, table_area);
        return;
    }

    if let Some(err) = &app.workflows_error {
        let message = Paragraph::new(format!("Failed to load workflows:\n{}", err))
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(message, table_area);
        return;
    }

    if app.workflows.is_empty() {
        let placeholder = Paragraph::new("No workflows found.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, table_area);
        return;
    }

    let header = Row::new(vec!["Name", "Status", "Nodes", "Last Modified"]).style(
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = app
        .workflows
        .iter()
        .map(|workflow| {
            let (status_text, status_color) = if workflow.active {
                ("Active", Color::Green)
            } else {
                ("Inactive", Color::DarkGray)
            };
            Row::new(vec![
                Span::raw(workflow.name.clone()),
                Span::styled(status_text, Style::default().fg(status_color)),
                Span::raw(workflow.nodes.len().to_string()),
                Span::raw(format_updated_at(workflow.updated_at.as_deref())),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(10),
            Constraint::Length(7),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(block)
    .highlight_style(
        Style::default()
            .bg(Color::Cyan)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

    frame.render_stateful_widget(table, table_area, &mut app.workflows_state);
}

fn render_dashboard_stats(stats: &DashboardStats, frame: &mut Frame, area: Rect) {
    let cells: [(&str, String, Color); 4] = [
        ("Total Workflows", stats.total.to_string(), Color::Cyan),
        ("Active Now", stats.active.to_string(), Color::Green),
        ("Total Nodes", stats.total_nodes.to_string(), Color::Blue),
        (
            "Monthly Usage",
            format!("${:.2}", stats.monthly_usage),
            Color::Magenta,
        ),
    ];

    let areas = Layout::horizontal([
        Constraint::Ratio(1, 4),
        Constraint::Ratio(1, 4),
        Constraint::Ratio(1, 4),
        Constraint::Ratio(1, 4),
    ])
    .split(area);

    for ((label, value, color), cell_area) in cells.into_iter().zip(areas.iter()) {
        let stat = Paragraph::new(Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(format!(" {} ", label)),
        );
        frame.render_widget(stat, *cell_area);
    }
}

fn render_workflow_detail(app: &App, frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Workflow ");

    if app.detail_loading {
        let placeholder = Paragraph::new("Loading workflow...")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, popup_area);
        return;
    }

    if let Some(err) = &app.detail_error {
        let message = Paragraph::new(format!("Failed to load workflow:\n{}", err))
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(message, popup_area);
        return;
    }

    let Some(workflow) = &app.workflow_detail else {
        return;
    };

    let mut lines: Vec<Line> = vec![
        Line::from(vec![
            Span::styled("Name: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                workflow.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Id: ", Style::default().fg(Color::DarkGray)),
            Span::raw(workflow.id.clone()),
        ]),
        Line::from(vec![
            Span::styled("Status: ", Style::default().fg(Color::DarkGray)),
            if workflow.active {
                Span::styled("Active", Style::default().fg(Color::Green))
            } else {
                Span::styled("Inactive", Style::default().fg(Color::DarkGray))
            },
        ]),
        Line::from(vec![
            Span::styled("Updated: ", Style::default().fg(Color::DarkGray)),
            Span::raw(format_updated_at(workflow.updated_at.as_deref())),
        ]),
        Line::default(),
        Line::from(Span::styled(
            format!("Nodes ({}):", workflow.nodes.len()),
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];

    for node in &workflow.nodes {
        lines.push(Line::from(vec![
            Span::raw(format!("  {} ", node.name)),
            Span::styled(
                format!("({})", node.node_type),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }

    let detail = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .block(block);
    frame.render_widget(detail, popup_area);
}

fn render_config_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [form_area, message_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);

    let save_badge = match app.save_status {
        SaveStatus::Idle => String::new(),
        SaveStatus::Saving => " Saving... ".to_string(),
        SaveStatus::Saved => " Saved ".to_string(),
    };
    let title = format!(" System Configuration {}", save_badge);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title);

    if app.settings_loading {
        let placeholder = Paragraph::new("Loading settings...")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, form_area);
        return;
    }

    let editing_idx = if app.input_mode == InputMode::Editing {
        app.settings_state.selected()
    } else {
        None
    };

    let items: Vec<ListItem> = app
        .settings_fields
        .iter()
        .enumerate()
        .map(|(i, (key, value))| {
            let shown = if editing_idx == Some(i) {
                format!("{}\u{258c}", app.settings_input)
            } else if is_secret_field(key) && !app.show_secrets && !value.is_empty() {
                "\u{2022}".repeat(value.chars().count().min(24))
            } else if value.is_empty() {
                "(not set)".to_string()
            } else {
                value.clone()
            };
            let value_style = if editing_idx == Some(i) {
                Style::default().fg(Color::Yellow)
            } else if value.is_empty() {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!(" {:<16} ", key), Style::default().fg(Color::Cyan)),
                Span::styled(shown, value_style),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, form_area, &mut app.settings_state);

    if let Some(err) = &app.settings_error {
        let message = Paragraph::new(format!(" {}", err)).style(Style::default().fg(Color::Red));
        frame.render_widget(message, message_area);
    }
}

fn format_updated_at(raw: Option<&str>) -> String {
    raw.and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Centered popup rect, sized as a percentage of the containing area.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let [_, vertical, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);
    let [_, horizontal, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(vertical);
    horizontal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_updated_at() {
        assert_eq!(
            format_updated_at(Some("2025-11-02T09:30:00.000Z")),
            "2025-11-02"
        );
        assert_eq!(format_updated_at(Some("yesterday")), "-");
        assert_eq!(format_updated_at(None), "-");
    }

    #[test]
    fn test_markdown_bold_and_code() {
        let line = parse_markdown_line("use **three** `nodes` here");
        assert_eq!(line.spans.len(), 5);
        assert_eq!(line.spans[1].content, "three");
        assert_eq!(line.spans[3].content, "nodes");
    }

    #[test]
    fn test_markdown_unclosed_marker_is_literal() {
        let line = parse_markdown_line("a **dangling");
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "a **dangling");
    }
}
