//! Message content splitting and rendering.
//!
//! Assistant replies are "Markdown-ish": fenced code blocks are pulled out and
//! drawn as framed blocks, `**bold**` spans are shown bold with the markers
//! removed, and everything else is printed as written.

use std::sync::LazyLock;

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use regex::Regex;

use crate::theme::Palette;

static FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("valid fence regex"));
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid bold regex"));

/// A run of prose text.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub strong: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Prose(Vec<Run>),
    Code { language: Option<String>, code: String },
}

/// Splits message content into prose and fenced code blocks.
///
/// An opening fence without a closing one is left as prose.
pub fn split_segments(content: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for fence in FENCE.find_iter(content) {
        if fence.start() > last {
            segments.push(Segment::Prose(parse_runs(&content[last..fence.start()])));
        }
        segments.push(parse_code_block(fence.as_str()));
        last = fence.end();
    }

    if last < content.len() {
        segments.push(Segment::Prose(parse_runs(&content[last..])));
    }

    segments
}

fn parse_code_block(block: &str) -> Segment {
    let lines: Vec<&str> = block.split('\n').collect();
    let language = lines[0].replace("```", "").trim().to_string();
    let code = if lines.len() > 2 {
        lines[1..lines.len() - 1].join("\n")
    } else {
        String::new()
    };

    Segment::Code {
        language: if language.is_empty() { None } else { Some(language) },
        code,
    }
}

fn parse_runs(text: &str) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut last = 0;

    for caps in BOLD.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            runs.push(Run {
                text: text[last..whole.start()].to_string(),
                strong: false,
            });
        }
        runs.push(Run {
            text: inner.as_str().to_string(),
            strong: true,
        });
        last = whole.end();
    }

    if last < text.len() {
        runs.push(Run {
            text: text[last..].to_string(),
            strong: false,
        });
    }

    runs
}

/// Renders segments as styled lines; `width` sizes the code block frame.
pub fn render_segments(segments: &[Segment], palette: &Palette, width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let frame = Style::default().fg(palette.border_accent);

    for segment in segments {
        match segment {
            Segment::Prose(runs) => {
                let mut current: Vec<Span<'static>> = Vec::new();
                for run in runs {
                    let style = if run.strong {
                        Style::default().fg(palette.text).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(palette.text_secondary)
                    };
                    let mut parts = run.text.split('\n');
                    if let Some(first) = parts.next() {
                        if !first.is_empty() {
                            current.push(Span::styled(first.to_string(), style));
                        }
                    }
                    for part in parts {
                        lines.push(Line::from(std::mem::take(&mut current)));
                        if !part.is_empty() {
                            current.push(Span::styled(part.to_string(), style));
                        }
                    }
                }
                if !current.is_empty() {
                    lines.push(Line::from(current));
                }
            }
            Segment::Code { language, code } => {
                let label = language.as_deref().unwrap_or("code");
                let fill = width.saturating_sub(label.chars().count() + 14);
                lines.push(Line::from(vec![
                    Span::styled("┌─ ", frame),
                    Span::styled(label.to_string(), Style::default().fg(palette.muted)),
                    Span::styled(format!(" {}", "─".repeat(fill)), frame),
                    Span::styled(" NexusAI ─┐", frame),
                ]));
                for code_line in code.lines() {
                    lines.push(Line::from(vec![
                        Span::styled("│ ", frame),
                        Span::styled(
                            code_line.to_string(),
                            Style::default().fg(palette.code_fg).bg(palette.code_bg),
                        ),
                    ]));
                }
                lines.push(Line::from(Span::styled(
                    format!("└{}┘", "─".repeat(width.saturating_sub(2))),
                    frame,
                )));
            }
        }
    }

    lines
}
