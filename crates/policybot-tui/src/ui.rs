use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use policybot_core::panel::{SummaryState, LOADING_SUMMARY};
use policybot_core::{QueryProtocol, Role, Turn};

use crate::app::{App, FocusPane, InputMode};

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c != '*' || chars.peek() != Some(&'*') {
            current_text.push(c);
            continue;
        }
        chars.next();

        if !current_text.is_empty() {
            spans.push(Span::raw(std::mem::take(&mut current_text)));
        }

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
            spans.push(Span::styled(
                bold_text,
                Style::default().add_modifier(Modifier::BOLD),
            ));
        } else {
            // unterminated, keep the markers
            current_text.push_str("**");
            current_text.push_str(&bold_text);
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

/// Word-wrap a styled line into rows of at most `width` columns.
///
/// Runs of whitespace collapse to one space; a word wider than the row is
/// split across rows. Every returned line is exactly one screen row, so the
/// row count of a transcript is the length of the wrapped list.
fn wrap_line(line: &Line<'static>, width: usize) -> Vec<Line<'static>> {
    let width = width.max(1);

    // A word may span several styles, e.g. "**bold**," then a comma
    let mut words: Vec<Vec<Span<'static>>> = Vec::new();
    let mut word: Vec<Span<'static>> = Vec::new();
    for span in &line.spans {
        let mut fragment = String::new();
        for c in span.content.chars() {
            if c.is_whitespace() {
                if !fragment.is_empty() {
                    word.push(Span::styled(std::mem::take(&mut fragment), span.style));
                }
                if !word.is_empty() {
                    words.push(std::mem::take(&mut word));
                }
            } else {
                fragment.push(c);
            }
        }
        if !fragment.is_empty() {
            word.push(Span::styled(fragment, span.style));
        }
    }
    if !word.is_empty() {
        words.push(word);
    }

    let mut rows: Vec<Vec<Span<'static>>> = Vec::new();
    let mut row: Vec<Span<'static>> = Vec::new();
    let mut row_width = 0;
    for word in words {
        let word_width: usize = word.iter().map(Span::width).sum();

        if row_width > 0 && row_width + 1 + word_width <= width {
            row.push(Span::raw(" "));
            row.extend(word);
            row_width += 1 + word_width;
            continue;
        }
        if row_width > 0 {
            rows.push(std::mem::take(&mut row));
            row_width = 0;
        }
        if word_width <= width {
            row = word;
            row_width = word_width;
            continue;
        }

        // Hard-split an overlong word, one char at a time
        for span in word {
            for c in span.content.chars() {
                let char_width = Span::raw(c.to_string()).width();
                if row_width > 0 && row_width + char_width > width {
                    rows.push(std::mem::take(&mut row));
                    row_width = 0;
                }
                row.push(Span::styled(c.to_string(), span.style));
                row_width += char_width;
            }
        }
    }
    if !row.is_empty() || rows.is_empty() {
        rows.push(row);
    }

    rows.into_iter()
        .map(|spans| Line::from(spans).style(line.style))
        .collect()
}

fn border_color(focused: bool) -> Color {
    if focused {
        Color::Cyan
    } else {
        Color::DarkGray
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    )
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    app.terminal_width = area.width;

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let sources_width = app.sources_pane.width(area.width);
    let panel_width = if app.panel.is_open() {
        app.panel.pane().width(area.width)
    } else {
        0
    };
    let [sources_area, chat_area, panel_area] = Layout::horizontal([
        Constraint::Length(sources_width),
        Constraint::Min(0),
        Constraint::Length(panel_width),
    ])
    .areas(body_area);

    app.sources_area = Some(sources_area);
    app.chat_area = Some(chat_area);
    app.panel_area = if panel_width > 0 { Some(panel_area) } else { None };

    render_sources(app, frame, sources_area);
    render_chat(app, frame, chat_area);
    if panel_width > 0 {
        render_panel(app, frame, panel_area);
    }

    render_footer(app, frame, footer_area);

    // Render popups (in order of priority)
    if app.pending_delete.is_some() {
        render_delete_confirm(app, frame, area);
    } else if app.show_upload_input {
        render_upload_input(app, frame, area);
    } else if app.show_model_picker {
        render_model_picker(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::styled(
        " PolicyBot ",
        Style::default().fg(Color::Cyan).bold(),
    )];

    if app.access.is_admin {
        let model = app.models.selected().unwrap_or("default");
        spans.push(Span::styled(
            format!("[{}] ", model),
            Style::default().fg(Color::Yellow),
        ));
    }
    spans.push(Span::styled(
        format!("{} checked ", app.documents.checked_count()),
        Style::default().fg(Color::Gray),
    ));
    spans.push(Span::styled(
        format!("v{}", env!("CARGO_PKG_VERSION")),
        Style::default().fg(Color::Gray),
    ));

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " ASK ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let hint = |key: &'static str, label: &'static str| {
        [
            Span::styled(format!(" {} ", key), key_style),
            Span::styled(format!(" {} ", label), label_style),
        ]
    };

    let mut hints: Vec<Span> = Vec::new();
    match app.input_mode {
        InputMode::Editing => {
            hints.extend(hint("Enter", "send"));
            hints.extend(hint("Esc", "stop typing"));
        }
        InputMode::Normal => {
            match app.focus {
                FocusPane::Sources => {
                    hints.extend(hint("Space", "check"));
                    hints.extend(hint("A", "all"));
                    hints.extend(hint("Enter", "open"));
                    hints.extend(hint("d", "delete"));
                    hints.extend(hint("c", "collapse"));
                }
                FocusPane::Chat => {
                    hints.extend(hint("j/k", "scroll"));
                    hints.extend(hint("G", "latest"));
                }
                FocusPane::Panel => {
                    hints.extend(hint("s", "summary"));
                    hints.extend(hint("x", "close"));
                }
            }
            hints.extend(hint("Tab", "focus"));
            hints.extend(hint("i", "ask"));
            hints.extend(hint("u", "upload"));
            hints.extend(hint(
                "p",
                match app.protocol {
                    QueryProtocol::Streaming => "streaming",
                    QueryProtocol::SingleShot => "single-shot",
                },
            ));
            if app.access.can_pick_model() {
                hints.extend(hint("m", "model"));
            }
            hints.extend(hint("q", "quit"));
        }
    }

    let mut spans = vec![
        Span::styled(mode_text, mode_style),
        Span::styled(" ", label_style),
    ];
    spans.extend(hints);
    if let Some(status) = app.status_line() {
        spans.push(Span::styled(
            format!(" {} ", status),
            Style::default().fg(Color::Yellow),
        ));
    }

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_sources(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Sources;
    let collapsed = app.sources_pane.is_collapsed();
    let marker = app.documents.selection_state().marker();

    let title = if collapsed {
        marker.to_string()
    } else {
        format!(" {} Sources ({}) ", marker, app.documents.len())
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(focused)))
        .title(title);

    if app.documents.is_empty() {
        let text = if collapsed { "" } else { "No documents.\nPress 'u' to upload a PDF." };
        let placeholder = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let items: Vec<ListItem> = app
        .documents
        .documents()
        .iter()
        .map(|doc| {
            let checked = app.documents.is_checked(&doc.name);
            let check = if checked { "[x]" } else { "[ ]" };
            let style = if checked {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            let active = app.panel.is_open() && app.panel.active() == Some(doc.name.as_str());
            let name_style = if active {
                Style::default().add_modifier(Modifier::UNDERLINED)
            } else {
                Style::default()
            };
            if collapsed {
                ListItem::new(Line::from(Span::styled(check, style)))
            } else {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{} ", check), style),
                    Span::styled(doc.name.clone(), name_style),
                ]))
            }
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(if collapsed { "" } else { "> " });

    frame.render_stateful_widget(list, area, &mut app.documents_state);
}

fn role_label(role: Role) -> Line<'static> {
    match role {
        Role::User => Line::from(Span::styled(
            "You:",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Role::Assistant => Line::from(Span::styled(
            "PolicyBot:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
    }
}

fn turn_lines(turn: &Turn, thinking: Option<u8>, lines: &mut Vec<Line<'static>>) {
    lines.push(role_label(turn.role));

    match (turn.role, thinking) {
        (Role::Assistant, Some(frame)) if turn.text.is_empty() => {
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat(usize::from(frame) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }
        (Role::Assistant, _) => lines.extend(turn.text.lines().map(parse_markdown_line)),
        (Role::User, _) => lines.extend(turn.text.lines().map(|l| Line::from(l.to_string()))),
    }

    if !turn.citations.is_empty() {
        lines.push(Line::from(Span::styled(
            "Sources:",
            Style::default().fg(Color::Magenta),
        )));
        for (i, citation) in turn.citations.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(format!(" [{}] ", i + 1), Style::default().fg(Color::Magenta)),
                Span::raw(citation.display_title()),
            ]));
        }
    }
    lines.push(Line::default());
}

fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let conversation = &app.conversation;
    let mut lines: Vec<Line<'static>> = Vec::new();

    if conversation.is_empty() {
        let summary = app
            .sources_summary
            .as_ref()
            .map(SummaryState::text)
            .unwrap_or(LOADING_SUMMARY);
        for line in summary.lines() {
            lines.push(parse_markdown_line(line).style(Style::default().fg(Color::DarkGray)));
        }
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Check the documents to search, then press 'i' to ask a question.",
            Style::default().fg(Color::DarkGray),
        )));
        return lines;
    }

    let last = conversation.turns().len() - 1;
    for (i, turn) in conversation.turns().iter().enumerate() {
        let thinking = (i == last && conversation.is_in_flight()).then_some(app.animation_frame);
        turn_lines(turn, thinking, &mut lines);
    }

    if !conversation.suggestions().is_empty() {
        lines.push(Line::from(Span::styled(
            "Suggested follow-ups:",
            Style::default().fg(Color::Green),
        )));
        for (i, suggestion) in conversation.suggestions().iter().take(9).enumerate() {
            lines.push(Line::from(vec![
                Span::styled(format!(" {} ", i + 1), Style::default().fg(Color::Green).bold()),
                Span::raw(suggestion.clone()),
            ]));
        }
    }
    lines
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let warning_height = if app.conversation.warning().is_some() { 1 } else { 0 };
    let [transcript_area, warning_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(warning_height),
        Constraint::Length(3),
    ])
    .areas(area);

    let inner_width = usize::from(transcript_area.width.saturating_sub(2));
    app.chat_height = transcript_area.height.saturating_sub(2);

    let lines: Vec<Line<'static>> = transcript_lines(app)
        .iter()
        .flat_map(|line| wrap_line(line, inner_width))
        .collect();
    let total_rows = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let max_scroll = total_rows.saturating_sub(app.chat_height);

    // Pin to the newest turn whenever the transcript changed
    let revision = app.conversation.revision();
    if app.pinned_revision != Some(revision) {
        app.chat_scroll = max_scroll;
        app.pinned_revision = Some(revision);
    }
    app.chat_scroll = app.chat_scroll.min(max_scroll);

    let focused = app.focus == FocusPane::Chat;
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(focused)))
        .title(" Chat ");

    // Already wrapped, so one line is one row
    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, transcript_area);

    if let Some(warning) = app.conversation.warning() {
        let warning = Paragraph::new(format!(" {}", warning)).style(Style::default().fg(Color::Red));
        frame.render_widget(warning, warning_area);
    }

    let editing = app.input_mode == InputMode::Editing;
    let input_title = if app.conversation.is_in_flight() {
        " Ask (waiting for answer) "
    } else {
        " Ask "
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing { Color::Yellow } else { Color::DarkGray }))
        .title(input_title);

    // Horizontal scrolling keeps the cursor inside the box
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.query_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .query_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, input_area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }
}

fn render_panel(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Panel;
    let title = app
        .panel
        .active()
        .map(|name| format!(" {} ", name))
        .unwrap_or_else(|| " Document ".to_string());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(focused)))
        .title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let summary = app.panel.summary();
    let collapsed = summary.map(|view| view.collapsed).unwrap_or(true);
    let summary_height = if collapsed {
        Constraint::Length(1)
    } else {
        Constraint::Min(0)
    };
    let [summary_area, preview_area] =
        Layout::vertical([summary_height, Constraint::Length(3)]).areas(inner);

    let arrow = if collapsed { "▸" } else { "▾" };
    let mut lines = vec![Line::from(Span::styled(
        format!("{} Summary", arrow),
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    ))];
    if let Some(view) = summary.filter(|view| !view.collapsed) {
        let style = match view.state {
            SummaryState::Loaded(_) => Style::default(),
            _ => Style::default().fg(Color::DarkGray),
        };
        lines.extend(
            view.state
                .text()
                .lines()
                .map(|line| parse_markdown_line(line).patch_style(style)),
        );
    }
    let summary = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(summary, summary_area);

    let preview = Paragraph::new("PDF preview is not available in the terminal.")
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::TOP).title(" Preview "));
    frame.render_widget(preview, preview_area);
}

fn render_upload_input(app: &App, frame: &mut Frame, area: Rect) {
    let popup_area = centered(area, 60, 5);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Upload PDF (Enter to upload, Esc to cancel) ");
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let instructions = Paragraph::new("Path to a PDF file:").style(Style::default().fg(Color::DarkGray));
    frame.render_widget(instructions, Rect::new(inner.x, inner.y, inner.width, 1));

    let input_area = Rect::new(inner.x, inner.y + 1, inner.width, 1);
    let width = usize::from(input_area.width);
    let len = app.upload_input.chars().count();
    let skip = len.saturating_sub(width.saturating_sub(1));
    let visible: String = app.upload_input.chars().skip(skip).collect();
    let cursor_x = visible.chars().count() as u16;
    frame.render_widget(
        Paragraph::new(visible).style(Style::default().fg(Color::Cyan)),
        input_area,
    );
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));
}

fn render_delete_confirm(app: &App, frame: &mut Frame, area: Rect) {
    let name = app.pending_delete.as_deref().unwrap_or_default();
    let popup_area = centered(area, 50, 5);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Delete document ");
    let text = vec![
        Line::from(format!("Delete {}?", name)),
        Line::from(Span::styled(
            "y to delete, n to keep",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let confirm = Paragraph::new(text).wrap(Wrap { trim: true }).block(block);
    frame.render_widget(confirm, popup_area);
}

fn render_model_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let rows = app.models.supported().len().max(1) as u16;
    let popup_area = centered(area, 40, rows + 2);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Select Model (Enter to select, Esc to cancel) ");

    if app.models.is_empty() {
        let empty = Paragraph::new("No models reported by the backend.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, popup_area);
        return;
    }

    let selected = app.models.selected().map(str::to_string);
    let default = app.models.default_model().map(str::to_string);
    let items: Vec<ListItem> = app
        .models
        .supported()
        .iter()
        .map(|model| {
            let style = if Some(model) == selected.as_ref() {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let suffix = if Some(model) == default.as_ref() { " (default)" } else { "" };
            ListItem::new(format!(" {}{} ", model, suffix)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.model_picker_state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::BackendEvent;
    use policybot_core::{AccessContext, Config, QueryDelta};
    use ratatui::{backend::TestBackend, Terminal};
    use tokio::sync::mpsc;

    fn app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        let config = Config {
            backend_url: "http://127.0.0.1:9".to_string(),
            ..Config::default()
        };
        App::new(&config, AccessContext::default(), tx)
    }

    fn screen(app: &mut App) -> String {
        screen_sized(app, 120, 30)
    }

    fn screen_sized(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(usize::from(buffer.area.width))
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_markdown_bold() {
        let line = parse_markdown_line("a **b** c");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "b");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));

        let line = parse_markdown_line("no **close");
        assert_eq!(line.spans.len(), 2);
        assert_eq!(line.spans[1].content, "**close");
    }

    fn row_text(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn test_wrap_line_breaks_at_words() {
        let rows = wrap_line(&Line::from("the quick brown fox"), 10);
        let rows: Vec<String> = rows.iter().map(row_text).collect();
        assert_eq!(rows, vec!["the quick", "brown fox"]);

        assert_eq!(wrap_line(&Line::default(), 10).len(), 1);
    }

    #[test]
    fn test_wrap_line_splits_overlong_word_and_keeps_style() {
        let line = parse_markdown_line("see **abcdefghij** now");
        let rows = wrap_line(&line, 4);
        let text: Vec<String> = rows.iter().map(row_text).collect();
        assert_eq!(text, vec!["see", "abcd", "efgh", "ij", "now"]);
        assert!(rows[1].spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert!(rows.iter().all(|row| row.width() <= 4));
    }

    #[test]
    fn test_long_answer_is_pinned_to_its_last_words() {
        let mut app = app();
        let pending = app
            .conversation
            .begin_query("Summarise everything", &["a.pdf".to_string()], None)
            .unwrap();
        let mut words: Vec<String> = (0..39).map(|i| format!("{:02}{}", i, "x".repeat(32))).collect();
        words.push("FINALTOKEN".to_string());
        app.conversation.apply(
            pending.assistant_turn,
            QueryDelta::Complete {
                text: words.join(" "),
                citations: Vec::new(),
            },
        );

        let text = screen_sized(&mut app, 100, 20);
        assert!(text.contains("FINALTOKEN"));
        assert!(text.contains(&format!("38{}", "x".repeat(32))));
        assert!(!text.contains(&format!("00{}", "x".repeat(32))));

        // scrolling past the end stays on the last row
        app.scroll_chat_down(100);
        assert!(screen_sized(&mut app, 100, 20).contains("FINALTOKEN"));
    }

    #[test]
    fn test_empty_transcript_shows_sources_summary() {
        let mut app = app();
        app.apply_backend(BackendEvent::SourcesSummary(Ok("Two HR policies.".into())));
        assert!(screen(&mut app).contains("Two HR policies."));

        app.apply_backend(BackendEvent::SourcesSummary(Err("503".into())));
        assert!(screen(&mut app).contains("No summary available."));
    }

    #[test]
    fn test_documents_render_with_markers() {
        let mut app = app();
        app.apply_backend(BackendEvent::DocumentsLoaded(Ok(vec!["travel.pdf".into()])));
        let text = screen(&mut app);
        assert!(text.contains("[x] Sources (1)"));
        assert!(text.contains("[x] travel.pdf"));
    }

    #[test]
    fn test_warning_is_rendered() {
        let mut app = app();
        app.apply_backend(BackendEvent::DocumentsLoaded(Ok(vec![])));
        app.query_input = "hi".into();
        app.submit_query();
        assert!(screen(&mut app).contains("Please select at least one PDF"));
    }
}
