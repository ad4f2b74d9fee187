use std::path::Path;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use tracing::{debug, warn};
use a19_core::{export, Config};
use crate::app::{App, InputMode, Screen, SourceTab};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key)?,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => handle_paste(app, &text),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick(),
    }
    // Pick up a finished request whatever woke us
    app.poll_generation().await;
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }

    if app.screen == Screen::Splash {
        app.dismiss_splash();
        return Ok(());
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
        InputMode::Attaching => handle_attaching_mode(app, key),
    }

    Ok(())
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    // Feedback lasts until the next command
    app.status = None;

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Enter => app.input_mode = InputMode::Editing,
        KeyCode::Char('a') => {
            app.attach_input.clear();
            app.input_mode = InputMode::Attaching;
        }
        KeyCode::Char('x') => app.cancel_attachment(),
        KeyCode::Char('m') => {
            if let Some(model) = app.cycle_model().map(str::to_string) {
                if let Err(e) = Config::save_model(&model) {
                    warn!(error = %e, "could not persist model choice");
                }
            }
        }

        // Starter prompts only while the welcome page is up
        KeyCode::Char(c @ '1'..='4') if app.show_welcome() => {
            if let Some(n) = c.to_digit(10) {
                app.use_starter(n as usize);
            }
        }

        // Artifact
        KeyCode::Tab => app.next_tab(),
        KeyCode::BackTab => app.prev_tab(),
        KeyCode::Char('c') => copy_current(app),
        KeyCode::Char('s') => app.save_archive(),
        KeyCode::Char('o') => open_preview(app),

        // Scrolling: code pane with j/k, chat with J/K
        KeyCode::Char('j') | KeyCode::Down => app.scroll_code_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_code_up(1),
        KeyCode::PageDown => app.scroll_code_down(app.code_height.max(1)),
        KeyCode::PageUp => app.scroll_code_up(app.code_height.max(1)),
        KeyCode::Char('J') => app.scroll_chat_down(1),
        KeyCode::Char('K') => app.scroll_chat_up(1),
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => app.submit_prompt(),
        KeyCode::Tab => app.next_tab(),
        KeyCode::BackTab => app.prev_tab(),
        _ => edit_line(&mut app.prompt_input, &mut app.prompt_cursor, key),
    }
}

fn handle_attaching_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.attach_input.clear();
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Enter => app.attach_from_input(),
        KeyCode::Backspace => {
            app.attach_input.pop();
        }
        KeyCode::Char(c) => app.attach_input.push(c),
        _ => {}
    }
}

/// Cursor-aware single line editing
fn edit_line(input: &mut String, cursor: &mut usize, key: KeyEvent) {
    let char_count = input.chars().count();
    match key.code {
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(input, *cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            if *cursor < char_count {
                let byte_pos = char_to_byte_index(input, *cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Left => *cursor = cursor.saturating_sub(1),
        KeyCode::Right => *cursor = (*cursor + 1).min(char_count),
        KeyCode::Home => *cursor = 0,
        KeyCode::End => *cursor = char_count,
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            input.clear();
            *cursor = 0;
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(input, *cursor);
            input.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => {}
    }
}

fn handle_paste(app: &mut App, text: &str) {
    match app.input_mode {
        InputMode::Attaching => app.attach_input.push_str(text.trim()),
        _ => {
            if app.screen == Screen::Splash {
                app.dismiss_splash();
            }
            app.input_mode = InputMode::Editing;
            // Newlines would otherwise be lost on a single line input
            let text = text.replace("\r\n", "\n").replace(['\r', '\n'], " ");
            let byte_pos = char_to_byte_index(&app.prompt_input, app.prompt_cursor);
            app.prompt_input.insert_str(byte_pos, &text);
            app.prompt_cursor += text.chars().count();
        }
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    // Scroll whichever pane the pointer is over
    let in_chat = app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_code = app.code_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if in_chat {
                app.scroll_chat_down(3);
            } else if in_code {
                app.scroll_code_down(3);
            }
        }
        MouseEventKind::ScrollUp => {
            if in_chat {
                app.scroll_chat_up(3);
            } else if in_code {
                app.scroll_code_up(3);
            }
        }
        _ => {}
    }
}

fn copy_current(app: &mut App) {
    let Some(artifact) = app.conversation.artifact() else {
        app.status = Some("Nothing to copy yet".to_string());
        return;
    };

    // The preview tab copies the whole assembled page
    let text = match app.active_tab.source(artifact) {
        Some(source) => source.to_string(),
        None => export::preview_document(artifact),
    };

    app.status = Some(if copy_to_clipboard(&text) {
        format!("Copied {}", app.active_tab.title())
    } else {
        "No clipboard tool found (pbcopy, wl-copy or xclip)".to_string()
    });
}

fn open_preview(app: &mut App) {
    if app.conversation.artifact().is_none() {
        app.status = Some("Nothing to preview yet".to_string());
        return;
    }
    if let Some(path) = app.write_preview() {
        show_preview(app, &path, open_in_browser);
    }
}

/// Hand the written preview to `launch` and report where it went
fn show_preview(app: &mut App, path: &Path, launch: impl FnOnce(&str) -> bool) {
    app.status = Some(if launch(&path.display().to_string()) {
        format!("Opened {}", path.display())
    } else {
        format!("Preview written to {}", path.display())
    });
    app.active_tab = SourceTab::Preview;
}

fn copy_to_clipboard(text: &str) -> bool {
    use std::io::Write;
    use std::process::{Command, Stdio};

    let candidates: [(&str, &[&str]); 3] = [
        ("pbcopy", &[]),
        ("wl-copy", &[]),
        ("xclip", &["-selection", "clipboard"]),
    ];

    for (program, args) in candidates {
        if let Ok(mut child) = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            if let Some(mut stdin) = child.stdin.take() {
                let _ = stdin.write_all(text.as_bytes());
            }
            return child.wait().map(|s| s.success()).unwrap_or(false);
        }
        debug!(program, "clipboard tool unavailable");
    }
    false
}

fn open_in_browser(target: &str) -> bool {
    match webbrowser::open(target) {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "could not launch browser");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn main_app() -> App {
        let config = Config {
            api_key: Some("test-key".to_string()),
            model: None,
            endpoint: Some("http://127.0.0.1:9".to_string()),
            export_dir: None,
        };
        let mut app = App::new(&config);
        app.dismiss_splash();
        app
    }

    #[test]
    fn test_edit_line_utf8() {
        let mut input = String::new();
        let mut cursor = 0;
        for c in "héllo".chars() {
            edit_line(&mut input, &mut cursor, key(KeyCode::Char(c)));
        }
        edit_line(&mut input, &mut cursor, key(KeyCode::Left));
        edit_line(&mut input, &mut cursor, key(KeyCode::Backspace));
        assert_eq!(input, "hélo");
        assert_eq!(cursor, 3);

        edit_line(&mut input, &mut cursor, key(KeyCode::Home));
        edit_line(&mut input, &mut cursor, key(KeyCode::Delete));
        assert_eq!(input, "élo");
    }

    #[test]
    fn test_any_key_dismisses_splash() {
        let config = Config::new();
        let mut app = App::new(&config);
        handle_key(&mut app, key(KeyCode::Char('q'))).unwrap();
        assert_eq!(app.screen, Screen::Main);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut app = main_app();
        handle_key(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)).unwrap();
        assert!(app.should_quit);
    }

    #[test]
    fn test_starter_keys_fill_prompt() {
        let mut app = main_app();
        app.input_mode = InputMode::Normal;
        handle_key(&mut app, key(KeyCode::Char('2'))).unwrap();
        assert_eq!(app.prompt_input, a19_core::STARTER_PROMPTS[1].prompt);
        assert_eq!(app.input_mode, InputMode::Editing);
    }

    #[test]
    fn test_attach_mode_roundtrip() {
        let mut app = main_app();
        app.input_mode = InputMode::Normal;
        handle_key(&mut app, key(KeyCode::Char('a'))).unwrap();
        assert_eq!(app.input_mode, InputMode::Attaching);

        handle_key(&mut app, key(KeyCode::Char('x'))).unwrap();
        assert_eq!(app.attach_input, "x");
        handle_key(&mut app, key(KeyCode::Esc)).unwrap();
        assert!(app.attach_input.is_empty());
        assert_eq!(app.input_mode, InputMode::Editing);
    }

    #[test]
    fn test_paste_flattens_newlines() {
        let mut app = main_app();
        handle_paste(&mut app, "a landing page\nwith a hero");
        assert_eq!(app.prompt_input, "a landing page with a hero");
        assert_eq!(app.prompt_cursor, app.prompt_input.chars().count());
    }

    #[test]
    fn test_copy_without_artifact() {
        let mut app = main_app();
        copy_current(&mut app);
        assert_eq!(app.status.as_deref(), Some("Nothing to copy yet"));
    }

    #[test]
    fn test_show_preview_reports_launch() {
        let mut app = main_app();
        app.active_tab = SourceTab::Css;
        let path = Path::new("/tmp/a19/preview.html");

        let mut launched = None;
        show_preview(&mut app, path, |target| {
            launched = Some(target.to_string());
            true
        });
        assert_eq!(launched.as_deref(), Some("/tmp/a19/preview.html"));
        assert_eq!(app.status.as_deref(), Some("Opened /tmp/a19/preview.html"));
        assert_eq!(app.active_tab, SourceTab::Preview);

        show_preview(&mut app, path, |_| false);
        assert_eq!(app.status.as_deref(), Some("Preview written to /tmp/a19/preview.html"));
    }

    #[test]
    fn test_open_preview_without_artifact() {
        let mut app = main_app();
        open_preview(&mut app);
        assert_eq!(app.status.as_deref(), Some("Nothing to preview yet"));
    }

    #[test]
    fn test_point_in_rect() {
        let rect = Rect::new(2, 2, 4, 4);
        assert!(point_in_rect(2, 2, rect));
        assert!(!point_in_rect(6, 2, rect));
    }
}
