//! Drawing of the chat screen: transcript pane, gateway panel, and the two
//! input fields.
//!
//! Transcript lines are pre-wrapped to the pane width before rendering, so
//! scroll math and the rendered output always agree on row counts; ratatui's
//! built-in wrapping is not used for the transcript.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::core::app::App;
use crate::ui::chat_loop::{ChatViewState, Focus};
use crate::ui::markdown::{render_markdown_lines, render_plain_lines};

const TYPING_INDICATOR: &str = "Bot is typing...";

/// Flatten the transcript (and the typing indicator while busy) into styled
/// lines for the scrollable pane.
pub fn build_transcript_lines(app: &App, markdown_enabled: bool) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for message in app.transcript.iter() {
        if message.is_user() {
            lines.push(Line::from(vec![
                Span::styled(
                    "You: ",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(message.text.clone(), Style::default().fg(Color::Cyan)),
            ]));
        } else if message.is_error() {
            lines.push(Line::from(Span::styled(
                message.text.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Bot: ",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )));
            let body = if markdown_enabled {
                render_markdown_lines(&message.text)
            } else {
                render_plain_lines(&message.text)
            };
            lines.extend(body);
        }
        lines.push(Line::from(""));
    }

    if app.input.busy {
        lines.push(Line::from(Span::styled(
            TYPING_INDICATOR,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

/// Pre-wrap styled lines to the pane width. Wrapping is word-based; a token
/// wider than the pane is broken mid-token, and whitespace at a break is
/// dropped rather than carried onto the next row.
pub fn wrap_lines(lines: &[Line<'static>], width: u16) -> Vec<Line<'static>> {
    let width = width as usize;
    if width == 0 {
        return lines.to_vec();
    }

    let mut wrapped = Vec::with_capacity(lines.len());
    for line in lines {
        wrap_line(line, width, &mut wrapped);
    }
    wrapped
}

fn wrap_line(line: &Line<'static>, width: usize, out: &mut Vec<Line<'static>>) {
    let chars: Vec<(char, Style)> = line
        .spans
        .iter()
        .flat_map(|span| span.content.chars().map(move |c| (c, span.style)))
        .collect();
    if chars.is_empty() {
        out.push(Line::from(""));
        return;
    }

    let rows_before = out.len();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_width = 0usize;

    let mut i = 0;
    while i < chars.len() {
        let is_space = chars[i].0.is_whitespace();
        let mut j = i;
        while j < chars.len() && chars[j].0.is_whitespace() == is_space {
            j += 1;
        }
        let run = &chars[i..j];
        let run_width: usize = run.iter().map(|(c, _)| c.width().unwrap_or(0)).sum();

        if is_space {
            if current_width + run_width <= width {
                push_run(&mut current, run);
                current_width += run_width;
            } else if current_width > 0 {
                flush_row(&mut current, out);
                current_width = 0;
            }
        } else if run_width <= width {
            if current_width > 0 && current_width + run_width > width {
                flush_row(&mut current, out);
                current_width = 0;
            }
            push_run(&mut current, run);
            current_width += run_width;
        } else {
            for &(c, style) in run {
                let char_width = c.width().unwrap_or(0);
                if current_width > 0 && current_width + char_width > width {
                    flush_row(&mut current, out);
                    current_width = 0;
                }
                push_run(&mut current, &[(c, style)]);
                current_width += char_width;
            }
        }
        i = j;
    }

    if !current.is_empty() {
        flush_row(&mut current, out);
    } else if out.len() == rows_before {
        out.push(Line::from(""));
    }
}

/// Emit a wrapped row, dropping invisible trailing whitespace.
fn flush_row(current: &mut Vec<Span<'static>>, out: &mut Vec<Line<'static>>) {
    while let Some(last) = current.last_mut() {
        let trimmed_len = last.content.trim_end().len();
        if trimmed_len == last.content.len() {
            break;
        }
        if trimmed_len == 0 {
            current.pop();
        } else {
            last.content.to_mut().truncate(trimmed_len);
            break;
        }
    }
    out.push(Line::from(std::mem::take(current)));
}

fn push_run(spans: &mut Vec<Span<'static>>, run: &[(char, Style)]) {
    for &(c, style) in run {
        match spans.last_mut() {
            Some(last) if last.style == style => last.content.to_mut().push(c),
            _ => spans.push(Span::styled(c.to_string(), style)),
        }
    }
}

/// Post-wrap row count of the transcript pane at the given width. The scroll
/// handlers use this so their bounds match what [`render`] draws.
pub fn transcript_row_count(app: &App, markdown_enabled: bool, width: u16) -> usize {
    wrap_lines(&build_transcript_lines(app, markdown_enabled), width).len()
}

pub fn max_scroll_offset(total_rows: usize, viewport_height: u16) -> u16 {
    total_rows
        .saturating_sub(viewport_height as usize)
        .min(u16::MAX as usize) as u16
}

pub fn render(f: &mut Frame, app: &App, view: &ChatViewState) {
    let gateway_height = if app.gateway.info().is_known() { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(gateway_height),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_transcript(f, app, view, chunks[0]);
    if gateway_height > 0 {
        render_gateway_panel(f, app, chunks[1]);
    }
    render_username_field(f, app, view, chunks[2]);
    render_draft_field(f, app, view, chunks[3]);
}

fn render_transcript(f: &mut Frame, app: &App, view: &ChatViewState, area: Rect) {
    let lines = wrap_lines(&build_transcript_lines(app, view.markdown_enabled), area.width);
    let viewport_height = area.height.saturating_sub(1);
    let max_offset = max_scroll_offset(lines.len(), viewport_height);
    let offset = if view.auto_scroll {
        max_offset
    } else {
        view.scroll_offset.min(max_offset)
    };

    let transcript = Paragraph::new(lines)
        .block(Block::default().title("Chat - Chatelet"))
        .scroll((offset, 0));
    f.render_widget(transcript, area);
}

fn render_gateway_panel(f: &mut Frame, app: &App, area: Rect) {
    let info = app.gateway.info();
    let value_style = if app.highlight.is_active() {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };

    let mut spans = Vec::new();
    if let Some(model) = &info.model {
        spans.push(Span::raw("Model: "));
        spans.push(Span::styled(model.clone(), value_style));
    }
    if let Some(provider) = &info.provider {
        if !spans.is_empty() {
            spans.push(Span::raw("   "));
        }
        spans.push(Span::raw("Provider: "));
        spans.push(Span::styled(provider.clone(), value_style));
    }

    let panel = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("AI Gateway"));
    f.render_widget(panel, area);
}

fn field_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

fn render_username_field(f: &mut Frame, app: &App, view: &ChatViewState, area: Rect) {
    let focused = view.focus == Focus::Username;
    let field = Paragraph::new(app.input.username.as_str())
        .style(field_style(focused))
        .block(Block::default().borders(Borders::ALL).title("Username"));
    f.render_widget(field, area);

    if focused {
        set_field_cursor(f, area, &app.input.username);
    }
}

fn render_draft_field(f: &mut Frame, app: &App, view: &ChatViewState, area: Rect) {
    let focused = view.focus == Focus::Draft;
    let title = if app.input.busy {
        "Message (waiting for reply...)"
    } else if app.can_submit() {
        "Message (Enter to send, Esc to clear)"
    } else {
        "Message (fill in username and message)"
    };

    let field = Paragraph::new(app.input.draft.as_str())
        .style(field_style(focused))
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(field, area);

    if focused {
        set_field_cursor(f, area, &app.input.draft);
    }
}

fn set_field_cursor(f: &mut Frame, area: Rect, contents: &str) {
    f.set_cursor_position((field_cursor_x(area, contents), area.y + 1));
}

/// Cursor column for a bordered single-line field, clamped to stay inside
/// the box when the contents are wider than the field.
fn field_cursor_x(area: Rect, contents: &str) -> u16 {
    let width = contents.width().min(u16::MAX as usize) as u16;
    (area.x + 1)
        .saturating_add(width)
        .min((area.x + area.width).saturating_sub(2))
}
