//! Keyboard input handling for the TUI.
//!
//! Translates key events into `App` changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use efetivo_core::View;

use crate::app::{next_view, prev_view, App, FilterField, Mode};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.mode {
        Mode::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.mode = Mode::Normal;
            }
            return Ok(false);
        }
        Mode::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.mode = Mode::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.mode = Mode::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        Mode::ConfirmingDelete => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_delete(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.mode = Mode::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        Mode::Searching => {
            handle_search_input(app, key);
            return Ok(false);
        }
        Mode::Quitting => return Ok(true),
        Mode::Normal => {}
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => app.mode = Mode::ConfirmingQuit,
        KeyCode::Char('?') => app.mode = Mode::ShowingHelp,
        KeyCode::Char(c @ '1'..='4') => {
            let index = c as usize - '1' as usize;
            if let Some(view) = View::from_index(index) {
                app.set_view(view);
            }
        }
        KeyCode::Left => app.set_view(prev_view(app.current_view())),
        KeyCode::Right => app.set_view(next_view(app.current_view())),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Char('e') => app.export_csv(),
        KeyCode::Char('b') => app.export_backup(),
        KeyCode::Char('D') => app.export_ddqod(),
        KeyCode::Char('/') => {
            app.set_view(View::Roster);
            app.mode = Mode::Searching;
        }
        KeyCode::Esc => {
            app.filter.search.clear();
            app.status_message = None;
            app.clamp_roster();
        }
        _ => {
            if app.current_view() == View::Roster {
                handle_roster_input(app, key);
            }
        }
    }

    Ok(false)
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.mode = Mode::Normal;
            app.filter.search.clear();
            app.clamp_roster();
        }
        KeyCode::Enter => {
            // Keep search query active
            app.mode = Mode::Normal;
        }
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Char(c) => app.push_search_char(c),
        _ => {}
    }
}

fn handle_roster_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('n') | KeyCode::PageDown => app.next_page(),
        KeyCode::Char('p') | KeyCode::PageUp => app.prev_page(),
        KeyCode::Char('s') => app.cycle_sort_column(),
        KeyCode::Char('r') => app.reverse_sort(),
        KeyCode::Char('u') => app.cycle_filter(FilterField::Unit),
        KeyCode::Char('c') => app.cycle_filter(FilterField::Class),
        KeyCode::Char('f') => app.cycle_filter(FilterField::Role),
        KeyCode::Char('x') => app.clear_filters(),
        KeyCode::Char('d') => app.request_delete(),
        _ => {}
    }
}
