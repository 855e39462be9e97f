use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use cinegraph_core::{ConversationEntry, DashboardState, DashboardStats, EntryRole, ToolCall};
use crate::app::{App, InputMode, STARTER_QUESTIONS, Screen, ServiceHealth};

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("**") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("**") else {
            break;
        };

        if open > 0 {
            spans.push(Span::raw(rest[..open].to_string()));
        }
        let bold = &after_open[..close];
        if bold.is_empty() {
            spans.push(Span::raw("****"));
        } else {
            spans.push(Span::styled(
                bold.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        }
        rest = &after_open[close + 2..];
    }

    // No closing **, or plain text after the last bold run
    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    Line::from(spans)
}

/// Tool name with its argument, shortened so one call stays on one line
fn tool_label(call: &ToolCall) -> String {
    const MAX_INPUT: usize = 40;
    match call.input.as_deref() {
        Some(input) if input.chars().count() > MAX_INPUT => {
            let short: String = input.chars().take(MAX_INPUT - 1).collect();
            format!("{}({short}…)", call.tool_name)
        }
        Some(input) => format!("{}({input})", call.tool_name),
        None => call.tool_name.clone(),
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

    match app.screen {
        Screen::Assistant => render_assistant_screen(app, frame, body_area),
        Screen::DataHub => render_data_hub_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let tab = |label: &'static str, active: bool| {
        if active {
            Span::styled(format!(" {label} "), Style::default().bg(Color::Blue).fg(Color::White).bold())
        } else {
            Span::styled(format!(" {label} "), Style::default().fg(Color::Gray))
        }
    };

    let (health_text, health_color) = match app.health {
        ServiceHealth::Checking => ("● checking", Color::DarkGray),
        ServiceHealth::Online => ("● service online", Color::Green),
        ServiceHealth::Degraded => ("● service degraded", Color::Yellow),
        ServiceHealth::Offline => ("● service offline", Color::Red),
    };

    let title = Line::from(vec![
        Span::styled(" Movie Assistant ", Style::default().fg(Color::Cyan).bold()),
        tab("Assistant", app.screen == Screen::Assistant),
        tab("Data Hub", app.screen == Screen::DataHub),
        Span::raw("  "),
        Span::styled(health_text, Style::default().fg(health_color)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.screen {
        Screen::Assistant => " ASSISTANT ",
        Screen::DataHub => " DATA HUB ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let hint = |key: &'static str, label: &'static str| {
        [
            Span::styled(format!(" {key} "), key_style),
            Span::styled(format!(" {label} "), label_style),
        ]
    };

    let hints: Vec<Span> = match (app.screen, app.input_mode) {
        (Screen::Assistant, InputMode::Editing) => [
            hint("Enter", "send"),
            hint("Esc", "stop typing"),
            hint("Tab", "data hub"),
        ]
        .concat(),
        (Screen::Assistant, InputMode::Normal) => {
            let mut hints = [hint("i", "type"), hint("j/k", "scroll"), hint("G", "latest")].concat();
            if app.session.log().is_empty() {
                hints.extend(hint("1-4", "suggestion"));
            }
            hints.extend([hint("Tab", "data hub"), hint("q", "quit")].concat());
            hints
        }
        (Screen::DataHub, _) => [hint("r", "refresh"), hint("Tab", "assistant"), hint("q", "quit")].concat(),
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

fn entry_lines(entry: &ConversationEntry) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = Vec::new();

    match entry.role() {
        EntryRole::User => {
            lines.push(Line::from(Span::styled(
                "You:",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(entry.content().to_string()));
        }
        EntryRole::Assistant => {
            lines.push(Line::from(Span::styled(
                "Assistant:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            for line in entry.content().lines() {
                lines.push(parse_markdown_line(line));
            }

            let meta_style = Style::default().fg(Color::DarkGray);
            if !entry.tool_calls().is_empty() {
                let tools: Vec<String> = entry.tool_calls().iter().map(tool_label).collect();
                lines.push(Line::from(Span::styled(format!("  tools: {}", tools.join(" · ")), meta_style)));
            }
            for step in entry.reasoning() {
                lines.push(Line::from(Span::styled(
                    format!("  › {step}"),
                    meta_style.add_modifier(Modifier::ITALIC),
                )));
            }

            let mut stats = Vec::new();
            if let Some(secs) = entry.execution_time_secs() {
                stats.push(format!("{secs:.2}s"));
            }
            if let Some(count) = entry.context_used() {
                stats.push(format!("{count} context"));
            }
            if !stats.is_empty() {
                lines.push(Line::from(Span::styled(format!("  {}", stats.join(" · ")), meta_style)));
            }
        }
        EntryRole::Error => {
            lines.push(Line::from(Span::styled(
                "Error:",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                entry.content().to_string(),
                Style::default().fg(Color::Red),
            )));
        }
    }

    lines.push(Line::default());
    lines
}

fn render_assistant_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    let inner_width = chat_area.width.saturating_sub(2);
    app.chat_height = chat_area.height.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" {} ", app.api_base_url));

    let lines: Vec<Line> = if app.session.log().is_empty() && !app.session.is_loading() {
        let mut lines = vec![
            Line::from(Span::styled("Cinema Intelligence", Style::default().fg(Color::Cyan).bold())),
            Line::from(Span::styled(
                "Ask about plots, actors, or graph connections in the movie universe.",
                Style::default().fg(Color::DarkGray),
            )),
            Line::default(),
        ];
        for (i, question) in STARTER_QUESTIONS.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(format!(" {} ", i + 1), Style::default().bg(Color::DarkGray).fg(Color::White)),
                Span::raw(format!(" {question}")),
            ]));
        }
        lines
    } else {
        let mut lines: Vec<Line> = app.session.log().iter().flat_map(entry_lines).collect();

        if app.session.is_loading() {
            lines.push(Line::from(Span::styled(
                "Assistant:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }
        lines
    };

    let chat = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });

    // Clamp scrolling to the wrapped content; follow the newest entry unless the user scrolled up
    let total = u16::try_from(chat.line_count(inner_width)).unwrap_or(u16::MAX);
    let max_scroll = total.saturating_sub(app.chat_height);
    if app.follow_tail || app.chat_scroll >= max_scroll {
        app.chat_scroll = max_scroll;
        app.follow_tail = true;
    }

    let chat = chat.block(chat_block).scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    render_input(app, frame, input_area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };
    let title = if app.session.is_loading() {
        Line::from(" Ask (waiting for the current answer) ")
    } else if let Some(banner) = app.session.error_banner() {
        Line::from(vec![
            Span::raw(" Ask "),
            Span::styled(format!("· {banner} "), Style::default().fg(Color::Red)),
        ])
    } else {
        Line::from(" Ask ")
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scroll keeps the cursor inside the box
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.query_cursor;
    let scroll_offset = if inner_width > 0 && cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app.query_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_data_hub_screen(app: &App, frame: &mut Frame, area: Rect) {
    let state = app.dashboard.as_ref().map(|d| *d.state()).unwrap_or(DashboardState::Loading);

    match state {
        DashboardState::Loading => {
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            let text = Paragraph::new(format!("Querying knowledge graph{dots}"))
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(" Data Hub "));
            frame.render_widget(text, area);
        }
        DashboardState::Failed => {
            let text = Paragraph::new(vec![
                Line::from(Span::styled("Sync Interrupted", Style::default().fg(Color::Red).bold())),
                Line::default(),
                Line::from("The movie database is currently unavailable."),
                Line::from(Span::styled("Press r to try again.", Style::default().fg(Color::DarkGray))),
            ])
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" Data Hub "));
            frame.render_widget(text, area);
        }
        DashboardState::Ready(stats) => render_stats(&stats, frame, area),
    }
}

fn render_stats(stats: &DashboardStats, frame: &mut Frame, area: Rect) {
    let [tiles_area, note_area] = Layout::vertical([
        Constraint::Length(5),
        Constraint::Min(0),
    ])
    .areas(area);

    let tiles = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(tiles_area);
    let metrics = [
        ("Movies", stats.movie_count, Color::Blue),
        ("Entities", stats.entity_count, Color::Magenta),
        ("Genres", stats.genre_count, Color::Green),
        ("Connections", stats.relationship_count, Color::Yellow),
    ];

    for ((label, value, color), tile) in metrics.into_iter().zip(tiles.iter()) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(format!(" {label} "));
        let text = Paragraph::new(Line::from(Span::styled(
            value.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(block);
        frame.render_widget(text, *tile);
    }

    let note = Paragraph::new(
        "Every connection is a semantic or professional link between movies, people and genres.",
    )
    .style(Style::default().fg(Color::DarkGray))
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::TOP).title(" Graph Network "));
    frame.render_widget(note, note_area);
}
