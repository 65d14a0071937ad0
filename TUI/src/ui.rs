use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{suggestions, App};
use crate::config::COMMANDS;
use crate::content;
use crate::model::{ChatSession, Message, Mode, Role};
use crate::theme::{mode_color, palette, Palette};
use crate::ui_state::Focus;

fn tab_label(mode: Mode) -> &'static str {
    match mode {
        Mode::Chat => "Chat",
        Mode::Image => "Image Gen",
        Mode::Math => "Math",
        Mode::Code => "Code",
    }
}

fn badge_label(mode: Mode) -> &'static str {
    match mode {
        Mode::Chat => "AI Chat",
        Mode::Image => "Image Gen",
        Mode::Math => "Math Solver",
        Mode::Code => "Code AI",
    }
}

fn mode_card(mode: Mode) -> (&'static str, &'static str) {
    match mode {
        Mode::Chat => ("General Chat", "Conversational AI for any topic"),
        Mode::Image => ("Image Generation", "Create stunning visuals from text"),
        Mode::Math => ("Math Solver", "Solve equations step-by-step"),
        Mode::Code => ("Programming", "Code generation & debugging"),
    }
}

fn input_placeholder(mode: Mode) -> &'static str {
    match mode {
        Mode::Chat => "Ask NexusAI anything...",
        Mode::Image => "Describe the image you want to generate...",
        Mode::Math => "Enter a math problem or equation to solve...",
        Mode::Code => "Describe the code you need or paste a snippet to analyze...",
    }
}

fn mode_glyph(mode: Mode) -> &'static str {
    match mode {
        Mode::Chat => "◆",
        Mode::Image => "▲",
        Mode::Math => "∑",
        Mode::Code => "»",
    }
}

/// Flattens `text` to one line and cuts it to at most `max` columns, marking the cut with "…".
fn truncate_to_width(text: &str, max: usize) -> String {
    let text = text.replace('\n', " ");
    if text.width() <= max {
        return text;
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Row offset for `Paragraph::scroll`, saturating at the widget's u16 limit.
fn scroll_rows(rows: usize) -> u16 {
    u16::try_from(rows).unwrap_or(u16::MAX)
}

pub fn draw(frame: &mut Frame, app: &App) {
    let state = app.state();
    let colors = palette(state.is_dark);

    let bg = Block::default().style(Style::default().bg(colors.bg));
    frame.render_widget(bg, frame.area());

    let area = frame.area();
    let padded = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    };

    let main_area = if state.sidebar_open {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(app.config.sidebar_width), // Sidebar
                Constraint::Length(1),                        // Gap
                Constraint::Min(40),                          // Chat area
            ])
            .split(padded);
        draw_sidebar(frame, app, colors, chunks[0]);
        chunks[2]
    } else {
        padded
    };

    draw_main(frame, app, colors, main_area);

    if app.showing_command_popup() {
        draw_command_popup(frame, app, colors, main_area);
    }

    if app.ui.show_help {
        draw_help(frame, colors, area);
    }
}

fn draw_sidebar(frame: &mut Frame, app: &App, colors: &Palette, area: Rect) {
    let state = app.state();
    let focused = app.ui.focus == Focus::Sidebar;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(if focused { colors.primary } else { colors.border }))
        .style(Style::default().bg(colors.panel));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Logo
            Constraint::Length(2), // New chat
            Constraint::Min(3),    // Sessions
            Constraint::Length(2), // Footer
        ])
        .split(inner);

    let logo = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(" ✦ ", Style::default().fg(colors.primary)),
            Span::styled("NexusAI", Style::default().fg(colors.text).add_modifier(Modifier::BOLD)),
        ]),
        Line::from(Span::styled("   Intelligent Assistant", Style::default().fg(colors.muted))),
    ]);
    frame.render_widget(logo, chunks[0]);

    let new_chat = Paragraph::new(Line::from(vec![
        Span::styled(
            " + New Chat ",
            Style::default().fg(colors.bg).bg(colors.primary).add_modifier(Modifier::BOLD),
        ),
        Span::styled("  ^N", Style::default().fg(colors.muted)),
    ]));
    frame.render_widget(new_chat, chunks[1]);

    draw_session_list(frame, app, colors, chunks[2], &state.sessions);

    let footer = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(" U ", Style::default().fg(colors.bg).bg(colors.user_bubble)),
            Span::styled(" User", Style::default().fg(colors.text)),
        ]),
        Line::from(Span::styled("    Free Plan", Style::default().fg(colors.muted))),
    ]);
    frame.render_widget(footer, chunks[3]);
}

fn draw_session_list(frame: &mut Frame, app: &App, colors: &Palette, area: Rect, sessions: &[ChatSession]) {
    if sessions.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No chats yet.", Style::default().fg(colors.muted))),
            Line::from(Span::styled(
                "Start a new conversation!",
                Style::default().fg(colors.muted),
            )),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        frame.render_widget(empty, area);
        return;
    }

    let active = app.state().active_session_id;
    let focused = app.ui.focus == Focus::Sidebar;
    let title_width = (area.width as usize).saturating_sub(5);

    let mut lines = vec![Line::from(Span::styled(
        " RECENT",
        Style::default().fg(colors.muted).add_modifier(Modifier::BOLD),
    ))];

    for (idx, session) in sessions.iter().enumerate() {
        let is_active = active == Some(session.id);
        let under_cursor = focused && idx == app.ui.sidebar_cursor;

        let mut style = if is_active {
            Style::default().fg(colors.text).bg(colors.highlight_bg)
        } else {
            Style::default().fg(colors.text_secondary)
        };
        if under_cursor {
            style = style.add_modifier(Modifier::BOLD);
        }

        lines.push(Line::from(vec![
            Span::styled(if under_cursor { "›" } else { " " }, Style::default().fg(colors.primary)),
            Span::styled(
                format!("{} ", mode_glyph(session.mode)),
                Style::default().fg(mode_color(session.mode)),
            ),
            Span::styled(truncate_to_width(&session.title, title_width), style),
        ]));
    }

    // Keep the cursor row on screen (row 0 is the heading)
    let visible = area.height as usize;
    let cursor_row = app.ui.sidebar_cursor + 1;
    let top = (cursor_row + 1).saturating_sub(visible);

    let list = Paragraph::new(lines).scroll((scroll_rows(top), 0));
    frame.render_widget(list, area);
}

fn draw_main(frame: &mut Frame, app: &App, colors: &Palette, area: Rect) {
    // Input grows with content (min 3, max 10 rows)
    let input = input_paragraph(app, colors);
    let input_rows = input.line_count(area.width.saturating_sub(2));
    let input_height = scroll_rows(input_rows).saturating_add(2).clamp(3, 10);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),            // Header
            Constraint::Min(5),               // Messages / welcome
            Constraint::Length(input_height), // Input (dynamic)
            Constraint::Length(1),            // Status / hints
        ])
        .split(area);

    draw_header(frame, app, colors, chunks[0]);
    if app.showing_welcome() {
        draw_welcome(frame, app, colors, chunks[1]);
    } else if let Some(session) = app.active_session() {
        draw_messages(frame, app, colors, chunks[1], session);
    }
    draw_input(frame, app, colors, chunks[2], input, input_rows);
    draw_status_line(frame, app, colors, chunks[3]);
}

fn draw_header(frame: &mut Frame, app: &App, colors: &Palette, area: Rect) {
    let state = app.state();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(colors.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut spans = vec![Span::styled(" ☰  ", Style::default().fg(colors.muted))];
    for mode in Mode::ALL {
        let label = format!(" {} {} ", mode_glyph(mode), tab_label(mode));
        let style = if mode == state.current_mode {
            Style::default()
                .fg(mode_color(mode))
                .bg(colors.highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors.muted)
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), inner);

    let theme = if state.is_dark { "☾ dark " } else { "☀ light " };
    let indicator = Paragraph::new(Span::styled(theme, Style::default().fg(colors.text_secondary)))
        .alignment(Alignment::Right);
    frame.render_widget(indicator, inner);
}

fn draw_welcome(frame: &mut Frame, app: &App, colors: &Palette, area: Rect) {
    let current = app.state().current_mode;

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "✦ Powered by Advanced AI Models",
            Style::default().fg(colors.primary),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "N E X U S A I",
            Style::default().fg(colors.text).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Your all-in-one intelligent assistant",
            Style::default().fg(colors.text_secondary),
        )),
        Line::from(Span::styled(
            "Lightning Fast · Private & Secure · Multilingual",
            Style::default().fg(colors.muted),
        )),
        Line::from(""),
    ];

    for mode in Mode::ALL {
        let (title, description) = mode_card(mode);
        let active = mode == current;
        let marker = if active { "▸ " } else { "  " };
        let title_style = if active {
            Style::default().fg(mode_color(mode)).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors.text)
        };
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(mode_color(mode))),
            Span::styled(format!("{} ", mode_glyph(mode)), Style::default().fg(mode_color(mode))),
            Span::styled(format!("{:<18}", title), title_style),
            Span::styled(description, Style::default().fg(colors.muted)),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "TRY ASKING...",
        Style::default().fg(colors.muted).add_modifier(Modifier::BOLD),
    )));

    let prompts = suggestions(current);
    let selected = app.ui.suggestion_cursor.min(prompts.len() - 1);
    for (idx, prompt) in prompts.iter().enumerate() {
        let is_selected = idx == selected;
        let style = if is_selected {
            Style::default().fg(colors.text).bg(colors.highlight_bg)
        } else {
            Style::default().fg(colors.text_secondary)
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" {} ", prompt), style),
            Span::styled(
                if is_selected { " → Enter" } else { "" },
                Style::default().fg(colors.primary),
            ),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Tab switches mode · ↑↓ pick a suggestion",
        Style::default().fg(colors.muted).add_modifier(Modifier::ITALIC),
    )));

    let welcome = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false });
    frame.render_widget(welcome, area);
}

fn typing_dots(anim_frame: usize) -> &'static str {
    match (anim_frame / 15) % 3 {
        0 => "● ○ ○",
        1 => "○ ● ○",
        _ => "○ ○ ●",
    }
}

fn message_lines(msg: &Message, colors: &Palette, width: usize, anim_frame: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let time = msg.timestamp.with_timezone(&Local).format("%H:%M").to_string();

    let mut header = match msg.role {
        Role::User => vec![Span::styled(
            "You",
            Style::default().fg(colors.user_bubble).add_modifier(Modifier::BOLD),
        )],
        Role::Assistant => vec![Span::styled(
            "NexusAI",
            Style::default().fg(colors.text).add_modifier(Modifier::BOLD),
        )],
    };
    if msg.role == Role::Assistant && !msg.is_typing {
        header.push(Span::raw(" "));
        header.push(Span::styled(
            format!("[{}]", badge_label(msg.mode)),
            Style::default().fg(mode_color(msg.mode)),
        ));
    }
    header.push(Span::styled(format!("  {}", time), Style::default().fg(colors.muted)));
    lines.push(Line::from(header));

    let indent = || Span::raw("  ");
    if msg.is_typing {
        lines.push(Line::from(vec![
            indent(),
            Span::styled(typing_dots(anim_frame), Style::default().fg(colors.primary)),
        ]));
    } else if msg.role == Role::User {
        for text_line in msg.content.lines() {
            lines.push(Line::from(vec![
                indent(),
                Span::styled(text_line.to_string(), Style::default().fg(colors.text)),
            ]));
        }
    } else {
        let segments = content::split_segments(&msg.content);
        for line in content::render_segments(&segments, colors, width.saturating_sub(2)) {
            let mut spans = vec![indent()];
            spans.extend(line.spans);
            lines.push(Line::from(spans));
        }
    }

    lines.push(Line::from(""));
    lines
}

fn draw_messages(frame: &mut Frame, app: &App, colors: &Palette, area: Rect, session: &ChatSession) {
    let title = truncate_to_width(&session.title, (area.width as usize).saturating_sub(6));
    let block = Block::default()
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(colors.text).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(colors.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let padded = Rect {
        x: inner.x + 1,
        y: inner.y,
        width: inner.width.saturating_sub(2),
        height: inner.height,
    };

    let width = padded.width as usize;
    let lines: Vec<Line> = session
        .messages
        .iter()
        .flat_map(|m| message_lines(m, colors, width, app.animation_frame))
        .collect();

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    let total_lines = paragraph.line_count(padded.width);
    let visible_height = padded.height as usize;

    // Scroll from the bottom; offset 0 pins the newest message
    let max_scroll = total_lines.saturating_sub(visible_height);
    let clamped_offset = app.ui.scroll_offset.min(max_scroll);
    let scroll_pos = max_scroll.saturating_sub(clamped_offset);

    frame.render_widget(paragraph.scroll((scroll_rows(scroll_pos), 0)), padded);

    if max_scroll > 0 && clamped_offset > 0 {
        let indicator = Paragraph::new(format!("▼ {} ", clamped_offset))
            .alignment(Alignment::Right)
            .style(Style::default().fg(colors.primary));
        let indicator_area = Rect {
            x: area.x,
            y: area.y + area.height.saturating_sub(1),
            width: area.width.saturating_sub(1),
            height: 1,
        };
        frame.render_widget(indicator, indicator_area);
    }
}

/// Input text, one line per `\n`, with the prompt on the first and the cursor on the last.
fn input_paragraph(app: &App, colors: &Palette) -> Paragraph<'static> {
    let mode = app.state().current_mode;
    let prompt = Style::default().fg(mode_color(mode));
    let text = Style::default().fg(colors.text);
    let cursor = if app.animation_frame % 30 < 15 { "|" } else { " " };

    if app.ui.input.is_empty() {
        let line = Line::from(vec![
            Span::styled(" > ", prompt),
            Span::styled(cursor, text),
            Span::styled(input_placeholder(mode), Style::default().fg(colors.muted)),
        ]);
        return Paragraph::new(line).wrap(Wrap { trim: false });
    }

    let rows: Vec<&str> = app.ui.input.split('\n').collect();
    let last = rows.len() - 1;
    let lines: Vec<Line<'static>> = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let lead = if idx == 0 { " > " } else { "   " };
            let mut content = row.to_string();
            if idx == last {
                content.push_str(cursor);
            }
            Line::from(vec![Span::styled(lead, prompt), Span::styled(content, text)])
        })
        .collect();

    Paragraph::new(lines).wrap(Wrap { trim: false })
}

fn draw_input(frame: &mut Frame, app: &App, colors: &Palette, area: Rect, input: Paragraph<'static>, rows: usize) {
    let mode = app.state().current_mode;

    // Pulse in the mode colour while focused
    let border_color = if app.ui.focus == Focus::Input {
        let glow = (app.animation_frame as f64 / 90.0).sin() * 0.3 + 0.7;
        match mode_color(mode) {
            ratatui::style::Color::Rgb(r, g, b) => ratatui::style::Color::Rgb(
                (r as f64 * glow) as u8,
                (g as f64 * glow) as u8,
                (b as f64 * glow) as u8,
            ),
            other => other,
        }
    } else {
        colors.border
    };

    let counter = format!(" {}/{} ", app.ui.input.chars().count(), app.config.input_max_chars);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color))
        .title_bottom(Line::from(Span::styled(counter, Style::default().fg(colors.muted))).right_aligned());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Keep the cursor row visible once the text outgrows the box
    let hidden = rows.saturating_sub(inner.height as usize);
    frame.render_widget(input.scroll((scroll_rows(hidden), 0)), inner);
}

fn draw_status_line(frame: &mut Frame, app: &App, colors: &Palette, area: Rect) {
    let key = Style::default().fg(colors.primary).add_modifier(Modifier::BOLD);
    let text = Style::default().fg(colors.muted);
    let pending = app.store.pending_replies();

    let line = if let Some(status) = &app.ui.status_message {
        Line::from(Span::styled(status.clone(), Style::default().fg(colors.warning)))
    } else if pending > 0 {
        let label = if pending == 1 {
            "1 reply on the way  ".to_string()
        } else {
            format!("{} replies on the way  ", pending)
        };
        Line::from(vec![
            Span::styled(label, text),
            Span::styled("/stop", key),
            Span::styled(" cancel this chat's reply", text),
        ])
    } else {
        Line::from(vec![
            Span::styled("Enter", key),
            Span::styled(" send  ", text),
            Span::styled("Alt+Enter", key),
            Span::styled(" newline  ", text),
            Span::styled("Tab", key),
            Span::styled(" mode  ", text),
            Span::styled("⇧Tab", key),
            Span::styled(" focus  ", text),
            Span::styled("^B", key),
            Span::styled(" sidebar  ", text),
            Span::styled("^T", key),
            Span::styled(" theme  ", text),
            Span::styled("/", key),
            Span::styled(" cmds", text),
        ])
    };
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_command_popup(frame: &mut Frame, app: &App, colors: &Palette, chat_area: Rect) {
    let filtered = app.get_filtered_commands();

    if filtered.is_empty() {
        return;
    }

    // +1 for the "your input" option, +2 for borders
    let popup_height = (filtered.len() + 3) as u16;
    let popup_width = 48.min(chat_area.width.saturating_sub(4));
    let popup_area = Rect {
        x: chat_area.x + 2,
        y: chat_area.y + chat_area.height.saturating_sub(popup_height + 4),
        width: popup_width,
        height: popup_height.min(chat_area.height),
    };

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(Span::styled(" Commands ", Style::default().fg(colors.primary).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(colors.primary))
        .style(Style::default().bg(colors.panel));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let mut lines: Vec<Line> = Vec::new();

    // First option: current typed input (selected when command_selection is None)
    let input_selected = app.ui.command_selection.is_none();
    let input_style = if input_selected {
        Style::default().fg(colors.text).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(colors.text_secondary)
    };
    let indicator = if input_selected { ">" } else { " " };
    lines.push(Line::from(vec![
        Span::styled(format!("{} {} ", indicator, &app.ui.input), input_style),
        Span::styled("(your input)", Style::default().fg(colors.muted).add_modifier(Modifier::ITALIC)),
    ]));

    for (i, (cmd, desc)) in filtered.iter().enumerate() {
        let is_selected = app.ui.command_selection == Some(i);
        let style = if is_selected {
            Style::default().fg(colors.text).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors.text_secondary)
        };
        let indicator = if is_selected { ">" } else { " " };

        lines.push(Line::from(vec![
            Span::styled(format!("{} {} ", indicator, cmd), style),
            Span::styled(format!("- {}", desc), Style::default().fg(colors.muted)),
        ]));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_help(frame: &mut Frame, colors: &Palette, area: Rect) {
    let keys: &[(&str, &str)] = &[
        ("Enter", "Send message / pick suggestion"),
        ("Alt+Enter", "New line in the message"),
        ("Tab", "Next mode (completes a command)"),
        ("Shift+Tab", "Focus sessions / input"),
        ("↑ ↓", "Scroll, navigate, pick"),
        ("Ctrl+N", "New chat"),
        ("Ctrl+B", "Toggle sidebar"),
        ("Ctrl+T", "Toggle theme"),
        ("Esc", "Close / clear input / quit"),
    ];

    let height = (keys.len() + COMMANDS.len() + 5) as u16;
    let width = 56.min(area.width.saturating_sub(4));
    let popup = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height: height.min(area.height),
    };
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .title(Span::styled(" Help ", Style::default().fg(colors.primary).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(colors.primary))
        .style(Style::default().bg(colors.panel));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let key_style = Style::default().fg(colors.primary).add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(colors.text_secondary);

    let mut lines = Vec::new();
    for (key, desc) in keys {
        lines.push(Line::from(vec![
            Span::styled(format!(" {:<11}", key), key_style),
            Span::styled(*desc, desc_style),
        ]));
    }
    lines.push(Line::from(""));
    for (cmd, desc) in COMMANDS {
        lines.push(Line::from(vec![
            Span::styled(format!(" {:<11}", cmd), key_style),
            Span::styled(*desc, desc_style),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " Esc to close",
        Style::default().fg(colors.muted).add_modifier(Modifier::ITALIC),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
}
