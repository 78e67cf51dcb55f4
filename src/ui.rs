use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, FormField, View};
use crate::scroll::ScrollCalculator;

pub fn render(f: &mut Frame, app: &App) {
    match app.view {
        View::Register => render_auth(f, app, "User Registration", "register"),
        View::Login => render_auth(f, app, "Login", "log in"),
        View::Chat => render_chat(f, app),
    }
}

fn render_auth(f: &mut Frame, app: &App, title: &str, action: &str) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(48),
            Constraint::Min(1),
        ])
        .split(f.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .margin(1)
        .split(columns[1]);

    let heading = Paragraph::new(Line::from(Span::styled(
        title.to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    f.render_widget(heading, chunks[0]);

    let masked = "*".repeat(app.form.password.chars().count());
    render_field(
        f,
        chunks[1],
        "Username",
        &app.form.username,
        app.form.focus == FormField::Username,
    );
    render_field(
        f,
        chunks[2],
        "Password",
        &masked,
        app.form.focus == FormField::Password,
    );

    let feedback = if let Some(error) = &app.form.error {
        Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red)))
    } else if let Some(notice) = &app.form.notice {
        Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from("")
    };
    f.render_widget(
        Paragraph::new(feedback).alignment(Alignment::Center),
        chunks[3],
    );

    let hint = format!("Tab switches fields, Enter to {action}, Ctrl+C to quit");
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            hint,
            Style::default().fg(Color::DarkGray),
        )))
        .alignment(Alignment::Center),
        chunks[4],
    );

    let (field_area, value) = match app.form.focus {
        FormField::Username => (chunks[1], app.form.username.as_str()),
        FormField::Password => (chunks[2], masked.as_str()),
    };
    let cursor_x = field_area.x + 1 + UnicodeWidthStr::width(value) as u16;
    let cursor_x = cursor_x.min(field_area.x + field_area.width.saturating_sub(2));
    f.set_cursor_position((cursor_x, field_area.y + 1));
}

fn render_field(f: &mut Frame, area: Rect, title: &str, value: &str, focused: bool) {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let field = Paragraph::new(value).style(style).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(style)
            .title(title),
    );
    f.render_widget(field, area);
}

fn render_chat(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(f.area());

    let lines = app.build_display_lines();

    // Account for the title row above the transcript.
    let available_height = chunks[0].height.saturating_sub(1);
    let total_wrapped_lines = ScrollCalculator::calculate_wrapped_line_count(&lines, chunks[0].width);
    let max_offset = total_wrapped_lines.saturating_sub(available_height);
    let scroll_offset = if app.auto_scroll {
        max_offset
    } else {
        app.scroll_offset.min(max_offset)
    };

    let title = format!(
        "parley v{} ({})",
        env!("CARGO_PKG_VERSION"),
        app.chat.model()
    );
    let messages_paragraph = Paragraph::new(lines)
        .block(Block::default().title(title))
        .wrap(Wrap { trim: true })
        .scroll((scroll_offset, 0));
    f.render_widget(messages_paragraph, chunks[0]);

    let input = Paragraph::new(app.input.as_str())
        .style(Style::default().fg(Color::Cyan))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Reset))
                .title("Type your message (Enter to send, Ctrl+C to quit)"),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(input, chunks[1]);

    let cursor_x = chunks[1].x + 1 + UnicodeWidthStr::width(app.input.as_str()) as u16;
    let cursor_x = cursor_x.min(chunks[1].x + chunks[1].width.saturating_sub(2));
    f.set_cursor_position((cursor_x, chunks[1].y + 1));
}
