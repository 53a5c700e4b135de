use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, InputMode, Screen};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

fn insert_char(text: &mut String, cursor: &mut usize, c: char) {
    let idx = char_to_byte_index(text, *cursor);
    text.insert(idx, c);
    *cursor += 1;
}

fn delete_char_before(text: &mut String, cursor: &mut usize) {
    if *cursor > 0 {
        let idx = char_to_byte_index(text, *cursor - 1);
        text.remove(idx);
        *cursor -= 1;
    }
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(),
        AppEvent::Chat(chat_event) => app.on_chat_event(chat_event),
        AppEvent::Status(status_event) => app.on_status(status_event),
        AppEvent::WorkflowsLoaded(result) => app.on_workflows_loaded(result),
        AppEvent::WorkflowDetail(result) => app.on_workflow_detail(result),
        AppEvent::SettingsLoaded(result) => app.on_settings_loaded(result),
        AppEvent::SettingsSaved(result) => app.on_settings_saved(result),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    // Screen switching mirrors the original sidebar
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('1') => {
            app.set_screen(Screen::Chat);
            return;
        }
        KeyCode::Char('2') => {
            app.set_screen(Screen::Workflows);
            return;
        }
        KeyCode::Char('3') => {
            app.set_screen(Screen::Config);
            return;
        }
        KeyCode::Tab => {
            let next = match app.screen {
                Screen::Chat => Screen::Workflows,
                Screen::Workflows => Screen::Config,
                Screen::Config => Screen::Chat,
            };
            app.set_screen(next);
            return;
        }
        _ => {}
    }

    match app.screen {
        Screen::Chat => handle_chat_normal(app, key),
        Screen::Workflows => handle_workflows_normal(app, key),
        Screen::Config => handle_config_normal(app, key),
    }
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('i') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Char('j') | KeyCode::Down => app.chat_scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.chat_scroll_up(),
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),
        _ => {}
    }
}

fn handle_workflows_normal(app: &mut App, key: KeyEvent) {
    if app.detail_open {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => app.close_workflow_detail(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.workflows_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.workflows_nav_up(),
        KeyCode::Char('r') => app.reload_workflows(),
        KeyCode::Enter => app.open_workflow_detail(),
        _ => {}
    }
}

fn handle_config_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.settings_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.settings_nav_up(),
        KeyCode::Char('i') | KeyCode::Enter => app.begin_edit_setting(),
        KeyCode::Char('v') => app.show_secrets = !app.show_secrets,
        KeyCode::Char('s') => app.save_settings(),
        KeyCode::Char('r') => app.reload_settings(),
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match app.screen {
        Screen::Chat => handle_chat_editing(app, key),
        Screen::Config => handle_config_editing(app, key),
        // Workflows has no editable input
        Screen::Workflows => app.input_mode = InputMode::Normal,
    }
}

fn handle_chat_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => app.send_chat(),
        KeyCode::Backspace => {
            let mut cursor = app.chat_cursor;
            delete_char_before(&mut app.chat_input, &mut cursor);
            app.chat_cursor = cursor;
        }
        KeyCode::Left => app.chat_cursor = app.chat_cursor.saturating_sub(1),
        KeyCode::Right => {
            app.chat_cursor = (app.chat_cursor + 1).min(app.chat_input.chars().count());
        }
        KeyCode::Char(c) => {
            let mut cursor = app.chat_cursor;
            insert_char(&mut app.chat_input, &mut cursor, c);
            app.chat_cursor = cursor;
        }
        _ => {}
    }
}

fn handle_config_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_edit_setting(),
        KeyCode::Enter => app.commit_edit_setting(),
        KeyCode::Backspace => {
            let mut cursor = app.settings_cursor;
            delete_char_before(&mut app.settings_input, &mut cursor);
            app.settings_cursor = cursor;
        }
        KeyCode::Left => app.settings_cursor = app.settings_cursor.saturating_sub(1),
        KeyCode::Right => {
            app.settings_cursor = (app.settings_cursor + 1).min(app.settings_input.chars().count());
        }
        KeyCode::Char(c) => {
            let mut cursor = app.settings_cursor;
            insert_char(&mut app.settings_input, &mut cursor, c);
            app.settings_cursor = cursor;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_to_byte_index_handles_multibyte() {
        let s = "caf\u{e9}s";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 3), 3);
        assert_eq!(char_to_byte_index(s, 4), 5); // past the two-byte é
        assert_eq!(char_to_byte_index(s, 99), s.len());
    }

    #[test]
    fn test_insert_and_delete_at_cursor() {
        let mut text = "ab".to_string();
        let mut cursor = 1;
        insert_char(&mut text, &mut cursor, '\u{e9}');
        assert_eq!(text, "a\u{e9}b");
        assert_eq!(cursor, 2);

        delete_char_before(&mut text, &mut cursor);
        assert_eq!(text, "ab");
        assert_eq!(cursor, 1);
    }
}
