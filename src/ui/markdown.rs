//! Markdown-to-lines transform for transcript text.
//!
//! Message text is treated as potentially structured markup: bot replies are
//! run through pulldown-cmark and flattened into styled [`Line`]s for the
//! transcript pane. This covers the inline subset a chat reply realistically
//! uses (paragraphs, emphasis, inline and fenced code, lists, headings);
//! anything else falls through as plain text.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Render message text without interpreting markup, one line per text line.
pub fn render_plain_lines(text: &str) -> Vec<Line<'static>> {
    text.lines()
        .map(|line| Line::from(line.to_string()))
        .collect()
}

/// Render message text as markdown, flattened into styled lines.
pub fn render_markdown_lines(text: &str) -> Vec<Line<'static>> {
    let parser = Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH);

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut bold = 0usize;
    let mut italic = 0usize;
    let mut strike = 0usize;
    let mut in_code_block = false;
    // One entry per open list; `Some` carries the next ordered-list number.
    let mut lists: Vec<Option<u64>> = Vec::new();

    let flush = |lines: &mut Vec<Line<'static>>, current: &mut Vec<Span<'static>>| {
        if !current.is_empty() {
            lines.push(Line::from(std::mem::take(current)));
        }
    };
    let blank = |lines: &mut Vec<Line<'static>>| {
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
    };

    for event in parser {
        match event {
            Event::Start(Tag::Paragraph) => {}
            Event::End(TagEnd::Paragraph) => {
                flush(&mut lines, &mut current);
                if lists.is_empty() {
                    blank(&mut lines);
                }
            }
            Event::Start(Tag::Heading { .. }) => bold += 1,
            Event::End(TagEnd::Heading(_)) => {
                bold = bold.saturating_sub(1);
                flush(&mut lines, &mut current);
                blank(&mut lines);
            }
            Event::Start(Tag::Strong) => bold += 1,
            Event::End(TagEnd::Strong) => bold = bold.saturating_sub(1),
            Event::Start(Tag::Emphasis) => italic += 1,
            Event::End(TagEnd::Emphasis) => italic = italic.saturating_sub(1),
            Event::Start(Tag::Strikethrough) => strike += 1,
            Event::End(TagEnd::Strikethrough) => strike = strike.saturating_sub(1),
            Event::Start(Tag::CodeBlock(_)) => {
                flush(&mut lines, &mut current);
                in_code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => {
                flush(&mut lines, &mut current);
                in_code_block = false;
                blank(&mut lines);
            }
            Event::Start(Tag::List(start)) => lists.push(start),
            Event::End(TagEnd::List(_)) => {
                lists.pop();
                if lists.is_empty() {
                    blank(&mut lines);
                }
            }
            Event::Start(Tag::Item) => {
                let indent = "  ".repeat(lists.len().saturating_sub(1));
                let marker = match lists.last_mut() {
                    Some(Some(number)) => {
                        let marker = format!("{indent}{number}. ");
                        *number += 1;
                        marker
                    }
                    _ => format!("{indent}- "),
                };
                current.push(Span::raw(marker));
            }
            Event::End(TagEnd::Item) => flush(&mut lines, &mut current),
            Event::Text(text) => {
                if in_code_block {
                    for code_line in text.lines() {
                        lines.push(Line::from(Span::styled(
                            code_line.to_string(),
                            code_style(),
                        )));
                    }
                } else {
                    current.push(Span::styled(
                        text.to_string(),
                        inline_style(bold, italic, strike),
                    ));
                }
            }
            Event::Code(code) => {
                current.push(Span::styled(code.to_string(), code_style()));
            }
            Event::SoftBreak => current.push(Span::raw(" ")),
            Event::HardBreak => flush(&mut lines, &mut current),
            Event::Rule => {
                flush(&mut lines, &mut current);
                lines.push(Line::from("────────"));
                blank(&mut lines);
            }
            _ => {}
        }
    }

    flush(&mut lines, &mut current);
    while lines.last().is_some_and(|line| line.width() == 0) {
        lines.pop();
    }
    lines
}

fn inline_style(bold: usize, italic: usize, strike: usize) -> Style {
    let mut style = Style::default();
    if bold > 0 {
        style = style.add_modifier(Modifier::BOLD);
    }
    if italic > 0 {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if strike > 0 {
        style = style.add_modifier(Modifier::CROSSED_OUT);
    }
    style
}

fn code_style() -> Style {
    Style::default().fg(Color::Yellow)
}
