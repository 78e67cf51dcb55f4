use crate::message::{Message, Role};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use std::collections::VecDeque;
use unicode_width::UnicodeWidthStr;

/// Turns the transcript into styled display lines and estimates how they
/// wrap, so scroll offsets can be computed without rendering.
pub struct ScrollCalculator;

impl ScrollCalculator {
    pub fn build_display_lines(messages: &VecDeque<Message>) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        for msg in messages {
            Self::add_message_lines(&mut lines, msg);
        }

        lines
    }

    fn add_message_lines(lines: &mut Vec<Line<'static>>, msg: &Message) {
        match msg.role {
            Role::User => {
                lines.push(Line::from(vec![
                    Span::styled(
                        "You: ",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(msg.content.clone(), Style::default().fg(Color::Cyan)),
                ]));
                lines.push(Line::from(""));
            }
            Role::App => {
                lines.push(Line::from(Span::styled(
                    msg.content.clone(),
                    Style::default().fg(Color::DarkGray),
                )));
                lines.push(Line::from(""));
            }
            Role::Assistant => {
                if msg.content.is_empty() {
                    return;
                }
                for content_line in msg.content.lines() {
                    if content_line.trim().is_empty() {
                        lines.push(Line::from(""));
                    } else {
                        lines.push(Line::from(Span::styled(
                            content_line.to_string(),
                            Style::default().fg(Color::White),
                        )));
                    }
                }
                lines.push(Line::from(""));
            }
        }
    }

    /// Estimate how many terminal rows the lines occupy at the given width,
    /// mirroring ratatui's `Wrap { trim: true }` word wrapping.
    pub fn calculate_wrapped_line_count(lines: &[Line], terminal_width: u16) -> u16 {
        let mut total = 0u16;

        for line in lines {
            let text = line.to_string();
            let trimmed = text.trim();
            if trimmed.is_empty() || terminal_width == 0 {
                total = total.saturating_add(1);
            } else {
                total = total.saturating_add(Self::word_wrapped_rows(trimmed, terminal_width));
            }
        }

        total
    }

    fn word_wrapped_rows(text: &str, terminal_width: u16) -> u16 {
        let width = terminal_width as usize;
        let mut current = 0usize;
        let mut rows = 1u16;

        for word in text.split_whitespace() {
            let word_width = UnicodeWidthStr::width(word);

            if current > 0 && current + 1 + word_width > width {
                rows = rows.saturating_add(1);
                current = word_width;
            } else {
                if current > 0 {
                    current += 1;
                }
                current += word_width;
            }
        }

        rows
    }

    /// Offset that puts the newest transcript line at the bottom edge.
    pub fn calculate_scroll_to_bottom(
        messages: &VecDeque<Message>,
        terminal_width: u16,
        available_height: u16,
    ) -> u16 {
        let lines = Self::build_display_lines(messages);
        let total = Self::calculate_wrapped_line_count(&lines, terminal_width);
        total.saturating_sub(available_height)
    }

    pub fn calculate_max_scroll_offset(
        messages: &VecDeque<Message>,
        terminal_width: u16,
        available_height: u16,
    ) -> u16 {
        Self::calculate_scroll_to_bottom(messages, terminal_width, available_height)
    }
}
