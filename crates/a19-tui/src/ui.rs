use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Tabs,
        Wrap,
    },
};
use a19_core::{export, ChatRole, GeneratedArtifact, STARTER_PROMPTS};
use crate::app::{App, InputMode, Screen, SourceTab};

const LOGO: [&str; 5] = [
    "    _    _  ___  ",
    "   / \\  / |/ _ \\ ",
    "  / _ \\ | | (_) |",
    " / ___ \\| |\\__, |",
    "/_/   \\_\\_|  /_/ ",
];

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            chars.next();

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;
            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                if !current_text.is_empty() {
                    spans.push(Span::raw(std::mem::take(&mut current_text)));
                }
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // Unclosed, keep it literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
                if found_close {
                    current_text.push_str("**");
                }
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

    if app.screen == Screen::Splash {
        render_splash(app, frame, area);
        return;
    }

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    // Chat on the left, generated site on the right
    let [chat_column, artifact_area] = Layout::horizontal([
        Constraint::Percentage(40),
        Constraint::Percentage(60),
    ])
    .areas(body_area);

    render_chat_column(app, frame, chat_column);
    render_artifact(app, frame, artifact_area);

    render_footer(app, frame, footer_area);

    if app.input_mode == InputMode::Attaching {
        render_attach_input(app, frame, area);
    }
}

fn render_splash(app: &App, frame: &mut Frame, area: Rect) {
    frame.render_widget(Clear, area);

    let mut lines: Vec<Line> = LOGO
        .iter()
        .map(|row| Line::from(Span::styled(*row, Style::default().fg(Color::Cyan).bold())))
        .collect();
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Describe a website. Get a website.",
        Style::default().fg(Color::White),
    )));
    lines.push(Line::default());

    // Progress dots fill up until the splash closes itself
    let filled = app.splash_ticks as usize;
    let empty = (crate::app::SPLASH_TICKS as usize).saturating_sub(filled);
    lines.push(Line::from(Span::styled(
        format!("{}{}", "●".repeat(filled), "○".repeat(empty)),
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::from(Span::styled(
        "press any key",
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )));

    let height = lines.len() as u16;
    let [_, middle, _] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(height),
        Constraint::Min(0),
    ])
    .areas(area);

    let splash = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(splash, middle);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" A19 ", Style::default().fg(Color::Cyan).bold()),
        Span::styled("website generator ", Style::default().fg(Color::White)),
        Span::styled(format!("[{}]", app.model), Style::default().fg(Color::Black)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Black),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
        InputMode::Attaching => Style::default().bg(Color::Magenta).fg(Color::White),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " PROMPT ",
        InputMode::Attaching => " ATTACH ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];

    if let Some(status) = &app.status {
        spans.push(Span::styled(status.clone(), Style::default().fg(Color::Green)));
    } else {
        let hints: &[(&str, &str)] = match app.input_mode {
            InputMode::Normal => {
                if app.show_welcome() {
                    &[
                        (" 1-4 ", " starter "),
                        (" i ", " prompt "),
                        (" a ", " attach "),
                        (" m ", " model "),
                        (" q ", " quit "),
                    ]
                } else {
                    &[
                        (" i ", " prompt "),
                        (" a ", " attach "),
                        (" x ", " detach "),
                        (" Tab ", " tab "),
                        (" j/k ", " scroll "),
                        (" c ", " copy "),
                        (" s ", " save zip "),
                        (" o ", " open "),
                        (" q ", " quit "),
                    ]
                }
            }
            InputMode::Editing => &[(" Enter ", " send "), (" Esc ", " normal "), (" Tab ", " tab ")],
            InputMode::Attaching => &[(" Enter ", " attach "), (" Esc ", " cancel ")],
        };
        for (key, label) in hints {
            spans.push(Span::styled(*key, key_style));
            spans.push(Span::styled(*label, label_style));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_chat_column(app: &mut App, frame: &mut Frame, area: Rect) {
    let banner_height = if app.conversation.last_error().is_some() { 3 } else { 0 };

    let [chat_area, banner_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(banner_height),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store areas for mouse hit-testing and scroll calculations
    app.chat_area = Some(chat_area);
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    if app.show_welcome() {
        render_welcome(frame, chat_area);
    } else {
        render_chat(app, frame, chat_area);
    }

    if let Some(error) = app.conversation.last_error() {
        let banner = Paragraph::new(Span::styled(
            error.to_string(),
            Style::default().fg(Color::White),
        ))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" Error "),
        )
        .style(Style::default().bg(Color::Red))
        .wrap(Wrap { trim: true });
        frame.render_widget(banner, banner_area);
    }

    render_prompt_input(app, frame, input_area);
}

fn render_welcome(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Welcome ");

    let mut lines = vec![
        Line::from(Span::styled(
            "What would you like to build?",
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from(Span::styled(
            "Describe a site, attach a sketch or a brief, or pick a starter:",
            Style::default().fg(Color::DarkGray),
        )),
        Line::default(),
    ];

    for (i, starter) in STARTER_PROMPTS.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(
                format!(" {} ", i + 1),
                Style::default().bg(Color::DarkGray).fg(Color::White),
            ),
            Span::styled(format!(" {}", starter.title), Style::default().bold()),
        ]));
        lines.push(Line::from(Span::styled(
            format!("    {}", starter.prompt),
            Style::default().fg(Color::DarkGray),
        )));
        lines.push(Line::default());
    }

    let welcome = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(welcome, area);
}

fn render_chat(app: &App, frame: &mut Frame, area: Rect) {
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Chat ");

    let mut lines: Vec<Line> = Vec::new();

    for turn in app.conversation.turns() {
        match turn.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                // Attached text files bring their own line breaks
                for line in turn.text.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            ChatRole::Model => {
                lines.push(Line::from(Span::styled(
                    "A19:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                for line in turn.text.lines() {
                    lines.push(parse_markdown_line(line));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.is_loading() {
        lines.push(Line::from(Span::styled(
            "A19:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Generating{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_prompt_input(app: &App, frame: &mut Frame, area: Rect) {
    let border_color = if app.input_mode == InputMode::Editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let title = match app.conversation.attachment() {
        Some(attachment) => format!(" Prompt [{} | x to remove] ", attachment.name()),
        None => " Prompt ".to_string(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.prompt_cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if app.prompt_input.is_empty() && app.input_mode != InputMode::Editing {
        Paragraph::new(Span::styled(
            "Describe the website you want...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let visible_text: String = app
            .prompt_input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(input.block(block), area);

    // Show cursor when editing
    if app.input_mode == InputMode::Editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_artifact(app: &mut App, frame: &mut Frame, area: Rect) {
    let [tabs_area, code_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(area);

    let tabs = Tabs::new(SourceTab::ALL.iter().map(|t| t.title()))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Website "),
        )
        .select(app.active_tab.index())
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .divider("|");
    frame.render_widget(tabs, tabs_area);

    app.code_area = Some(code_area);
    app.code_height = code_area.height.saturating_sub(2);

    let Some(artifact) = app.conversation.artifact() else {
        let placeholder = Paragraph::new(vec![
            Line::default(),
            Line::from(Span::styled(
                "Your website will appear here.",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
        frame.render_widget(placeholder, code_area);
        return;
    };

    match app.active_tab.source(artifact) {
        None => render_preview_summary(artifact, &app.export_dir, frame, code_area),
        Some(source) => {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(format!(" {} ", app.active_tab.title()));

            let lines = if source.is_empty() {
                vec![Line::from(Span::styled(
                    "(empty)",
                    Style::default().fg(Color::DarkGray),
                ))]
            } else {
                app.highlighter.lines(source, app.active_tab.extension()).to_vec()
            };
            let total_lines = lines.len();

            let code = Paragraph::new(lines)
                .block(block)
                .scroll((app.code_scroll, 0));
            frame.render_widget(code, code_area);

            if total_lines > app.code_height as usize {
                let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                    .begin_symbol(Some("^"))
                    .end_symbol(Some("v"));
                let mut scrollbar_state =
                    ScrollbarState::new(total_lines).position(app.code_scroll as usize);
                frame.render_stateful_widget(
                    scrollbar,
                    code_area.inner(Margin { vertical: 1, horizontal: 0 }),
                    &mut scrollbar_state,
                );
            }
        }
    }
}

/// A terminal cannot render the page, so summarize it and point at the browser
fn render_preview_summary(
    artifact: &GeneratedArtifact,
    export_dir: &std::path::Path,
    frame: &mut Frame,
    area: Rect,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Preview ");

    let label = Style::default().fg(Color::DarkGray);
    let mut lines = vec![Line::from(Span::styled(
        "Latest version",
        Style::default().fg(Color::Cyan).bold(),
    ))];
    lines.push(Line::default());

    for (name, content) in export::bundle_entries(artifact) {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<12}", name), label),
            Span::raw(format!("{} lines", content.lines().count())),
        ]));
    }
    lines.push(Line::default());

    for line in artifact.explanation.lines() {
        lines.push(parse_markdown_line(line));
    }
    lines.push(Line::default());

    lines.push(Line::from(vec![
        Span::styled(" o ", Style::default().bg(Color::DarkGray).fg(Color::White)),
        Span::raw(" open in browser  "),
        Span::styled(" s ", Style::default().bg(Color::DarkGray).fg(Color::White)),
        Span::raw(format!(" save {} to {}", export::ARCHIVE_NAME, export_dir.display())),
    ]));

    let summary = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(summary, area);
}

fn render_attach_input(app: &App, frame: &mut Frame, area: Rect) {
    let width = area.width.saturating_sub(10).min(70);
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + area.height / 2 - 3.min(area.height / 2),
        width,
        height: 5.min(area.height),
    };

    frame.render_widget(Clear, popup);

    let inner_width = width.saturating_sub(2) as usize;
    let count = app.attach_input.chars().count();
    let skip = count.saturating_sub(inner_width.saturating_sub(1));
    let visible: String = app.attach_input.chars().skip(skip).collect();

    let text = vec![
        Line::from(Span::styled(
            "Image or .txt file path:",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(visible.clone(), Style::default().fg(Color::Cyan))),
    ];

    let dialog = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta))
            .title(" Attach file "),
    );
    frame.render_widget(dialog, popup);

    let cursor_x = visible.chars().count() as u16;
    frame.set_cursor_position((popup.x + 1 + cursor_x, popup.y + 2));
}
