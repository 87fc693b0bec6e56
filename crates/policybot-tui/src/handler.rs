use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, DragTarget, FocusPane, InputMode};
use crate::tui::AppEvent;

const RESIZE_STEP: i16 = 2;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(width) => app.terminal_width = width,
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Backend(event) => app.apply_backend(event),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // Popups take every key while open
    if app.pending_delete.is_some() {
        handle_delete_confirm(app, key);
        return;
    }
    if app.show_upload_input {
        handle_upload_input(app, key);
        return;
    }
    if app.show_model_picker {
        handle_model_picker(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_query_editing(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Tab => app.cycle_focus(),

        // Ask
        KeyCode::Char('i') | KeyCode::Char('a') => {
            app.focus = FocusPane::Chat;
            app.input_mode = InputMode::Editing;
        }

        KeyCode::Char('u') if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.open_upload_input()
        }
        KeyCode::Char('m') => app.open_model_picker(),
        KeyCode::Char('p') => app.toggle_protocol(),

        // Suggested follow-ups
        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            app.use_suggestion(index);
        }

        _ => match app.focus {
            FocusPane::Sources => handle_sources_keys(app, key),
            FocusPane::Chat => handle_chat_keys(app, key),
            FocusPane::Panel => handle_panel_keys(app, key),
        },
    }
}

fn handle_sources_keys(app: &mut App, key: KeyEvent) {
    let width = app.terminal_width;
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.sources_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.sources_nav_up(),
        KeyCode::Char(' ') => app.toggle_selected_document(),
        KeyCode::Char('A') => app.documents.select_all_toggle(),
        KeyCode::Enter | KeyCode::Char('l') => app.open_selected_document(),
        KeyCode::Char('d') => app.request_delete(),
        KeyCode::Char('c') => app.sources_pane.toggle_collapsed(),
        KeyCode::Char('>') => {
            app.sources_pane.nudge(RESIZE_STEP, width);
        }
        KeyCode::Char('<') => {
            app.sources_pane.nudge(-RESIZE_STEP, width);
        }
        _ => {}
    }
}

fn handle_chat_keys(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.input_mode = InputMode::Editing,
        KeyCode::Char('j') | KeyCode::Down => app.scroll_chat_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_chat_up(1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let half_page = app.chat_height / 2;
            app.scroll_chat_down(half_page);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let half_page = app.chat_height / 2;
            app.scroll_chat_up(half_page);
        }
        KeyCode::Char('g') => app.chat_scroll = 0,
        KeyCode::Char('G') => app.follow_transcript(),
        _ => {}
    }
}

fn handle_panel_keys(app: &mut App, key: KeyEvent) {
    let width = app.terminal_width;
    match key.code {
        KeyCode::Char('s') => app.panel.toggle_collapsed(),
        KeyCode::Esc | KeyCode::Char('x') => app.close_panel(),
        // The panel sits on the right, so '<' widens it
        KeyCode::Char('<') => {
            app.panel.pane_mut().nudge(RESIZE_STEP, width);
        }
        KeyCode::Char('>') => {
            app.panel.pane_mut().nudge(-RESIZE_STEP, width);
        }
        _ => {}
    }
}

fn handle_query_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => app.submit_query(),
        KeyCode::Backspace => {
            if app.query_cursor > 0 {
                app.query_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.query_input, app.query_cursor);
                app.query_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.query_input.chars().count();
            if app.query_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.query_input, app.query_cursor);
                app.query_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.query_cursor = app.query_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.query_input.chars().count();
            app.query_cursor = (app.query_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.query_cursor = 0;
        }
        KeyCode::End => {
            app.query_cursor = app.query_input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.query_input, app.query_cursor);
            app.query_input.insert(byte_pos, c);
            app.query_cursor += 1;
        }
        _ => {}
    }
}

fn handle_upload_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.show_upload_input = false;
            app.upload_input.clear();
        }
        KeyCode::Enter => app.begin_upload(),
        KeyCode::Backspace => {
            app.upload_input.pop();
        }
        KeyCode::Char(c) => app.upload_input.push(c),
        _ => {}
    }
}

fn handle_delete_confirm(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => app.confirm_delete(),
        KeyCode::Char('n') | KeyCode::Esc => app.pending_delete = None,
        _ => {}
    }
}

fn handle_model_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.show_model_picker = false,
        KeyCode::Char('j') | KeyCode::Down => app.model_picker_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.model_picker_nav_up(),
        KeyCode::Enter => app.select_model(),
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

/// Which resizable border sits under the pointer, if any.
fn border_at(app: &App, x: u16, y: u16) -> Option<DragTarget> {
    if let Some(area) = app.sources_area {
        let edge = area.x + area.width.saturating_sub(1);
        if x == edge && y >= area.y && y < area.y + area.height {
            return Some(DragTarget::Sources);
        }
    }
    if let Some(area) = app.panel_area {
        if x == area.x && y >= area.y && y < area.y + area.height {
            return Some(DragTarget::Panel);
        }
    }
    None
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;
    let width = app.terminal_width;

    let in_sources = app.sources_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_chat = app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(target) = border_at(app, x, y) {
                match target {
                    DragTarget::Sources => app.sources_pane.begin_drag(x),
                    DragTarget::Panel => app.panel.pane_mut().begin_drag(x),
                }
                app.dragging = Some(target);
            } else if in_sources {
                app.focus = FocusPane::Sources;
                if let Some(area) = app.sources_area {
                    // first row is inside the top border
                    let row = y.saturating_sub(area.y + 1) as usize + app.documents_state.offset();
                    if y > area.y && row < app.documents.len() {
                        app.documents_state.select(Some(row));
                    }
                }
            } else if in_chat {
                app.focus = FocusPane::Chat;
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => match app.dragging {
            Some(DragTarget::Sources) => {
                app.sources_pane.drag_to(x, width);
            }
            Some(DragTarget::Panel) => {
                app.panel.pane_mut().drag_to(x, width);
            }
            None => {}
        },
        MouseEventKind::Up(MouseButton::Left) => app.end_drag(),
        MouseEventKind::ScrollDown => {
            if in_sources {
                app.sources_nav_down();
            } else if in_chat {
                app.scroll_chat_down(3);
            }
        }
        MouseEventKind::ScrollUp => {
            if in_sources {
                app.sources_nav_up();
            } else if in_chat {
                app.scroll_chat_up(3);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::BackendEvent;
    use crossterm::event::KeyEventState;
    use policybot_core::{AccessContext, Config};
    use tokio::sync::mpsc;

    fn app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        let config = Config {
            backend_url: "http://127.0.0.1:9".to_string(),
            ..Config::default()
        };
        let mut app = App::new(&config, AccessContext::default(), tx);
        app.config_path = None;
        app.terminal_width = 150;
        app.apply_backend(BackendEvent::DocumentsLoaded(Ok(vec![
            "a.pdf".to_string(),
            "b.pdf".to_string(),
        ])));
        app
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: crossterm::event::KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> AppEvent {
        AppEvent::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn test_char_to_byte_index_handles_multibyte() {
        assert_eq!(char_to_byte_index("héllo", 2), 3);
        assert_eq!(char_to_byte_index("abc", 10), 3);
    }

    #[tokio::test]
    async fn test_space_toggles_highlighted_document() {
        let mut app = app();
        handle_event(&mut app, key(KeyCode::Char(' '))).unwrap();
        assert!(!app.documents.is_checked("a.pdf"));
        handle_event(&mut app, key(KeyCode::Char(' '))).unwrap();
        assert!(app.documents.is_checked("a.pdf"));
    }

    #[tokio::test]
    async fn test_editing_inserts_at_cursor() {
        let mut app = app();
        handle_event(&mut app, key(KeyCode::Char('i'))).unwrap();
        for c in "hllo".chars() {
            handle_event(&mut app, key(KeyCode::Char(c))).unwrap();
        }
        handle_event(&mut app, key(KeyCode::Home)).unwrap();
        handle_event(&mut app, key(KeyCode::Right)).unwrap();
        handle_event(&mut app, key(KeyCode::Char('e'))).unwrap();
        assert_eq!(app.query_input, "hello");
        assert_eq!(app.query_cursor, 2);
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let mut app = app();
        handle_event(&mut app, key(KeyCode::Char('d'))).unwrap();
        assert_eq!(app.pending_delete.as_deref(), Some("a.pdf"));

        // other keys are swallowed by the popup
        handle_event(&mut app, key(KeyCode::Char('q'))).unwrap();
        assert!(!app.should_quit);

        handle_event(&mut app, key(KeyCode::Esc)).unwrap();
        assert_eq!(app.pending_delete, None);
        assert!(app.documents.contains("a.pdf"));
    }

    #[tokio::test]
    async fn test_dragging_sources_border_collapses_pane() {
        let mut app = app();
        app.sources_area = Some(Rect::new(0, 1, 32, 30));

        handle_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 31, 5)).unwrap();
        assert_eq!(app.dragging, Some(DragTarget::Sources));
        handle_event(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 10, 5)).unwrap();
        handle_event(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 10, 5)).unwrap();

        assert_eq!(app.dragging, None);
        assert!(app.sources_pane.is_collapsed());
    }

    #[tokio::test]
    async fn test_click_selects_document_row() {
        let mut app = app();
        app.sources_area = Some(Rect::new(0, 1, 32, 30));
        handle_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 5, 3)).unwrap();
        assert_eq!(app.selected_document(), Some("b.pdf"));
        assert_eq!(app.focus, FocusPane::Sources);
    }
}
