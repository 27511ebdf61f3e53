//! Keyboard input handling for the TUI.
//!
//! Translates key events into `App` state changes. Returns `Ok(true)`
//! when the application should exit.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{
    can_add_auth_key_char, can_add_auth_key_id_char, can_add_search_char, App, AppState,
    LoginFocus, PAGE_SCROLL_SIZE,
};

pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle login overlay
    if matches!(app.state, AppState::LoggingIn) {
        return handle_login_input(app, key).await;
    }

    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    if matches!(app.state, AppState::EditingSearch) {
        handle_search_input(app, key);
        return Ok(false);
    }

    // Results view
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Char('L') => {
            app.logout(None);
        }
        KeyCode::Char('/') => {
            app.state = AppState::EditingSearch;
            app.search_error = None;
        }
        KeyCode::Char('r') => {
            app.rerun_last_search();
        }
        KeyCode::Left => app.cycle_filter(false),
        KeyCode::Right => app.cycle_filter(true),
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(1),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(1),
        KeyCode::PageUp => app.select_prev(PAGE_SCROLL_SIZE),
        KeyCode::PageDown => app.select_next(PAGE_SCROLL_SIZE),
        KeyCode::Home => app.selection = 0,
        KeyCode::End => app.select_next(app.sims.len()),
        KeyCode::Enter => app.refresh_selected(),
        _ => {}
    }

    Ok(false)
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
        }
        KeyCode::Enter => {
            app.submit_search();
            if app.state == AppState::EditingSearch && app.search_error.is_none() {
                app.state = AppState::Normal;
            }
        }
        KeyCode::Left => app.cycle_filter(false),
        KeyCode::Right | KeyCode::Tab => app.cycle_filter(true),
        KeyCode::BackTab => app.cycle_filter(false),
        KeyCode::Backspace => {
            app.search_value.pop();
            app.search_error = None;
        }
        KeyCode::Char(c) => {
            if can_add_search_char(app.search_value.chars().count(), c) {
                app.search_value.push(c);
                app.search_error = None;
            }
        }
        _ => {}
    }
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = app.login_focus.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = app.login_focus.prev();
        }
        KeyCode::Left | KeyCode::Right if app.login_focus == LoginFocus::Coverage => {
            app.login_coverage = app.login_coverage.toggle();
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::AuthKeyId | LoginFocus::AuthKey | LoginFocus::Coverage => {
                app.login_focus = app.login_focus.next();
            }
            LoginFocus::Button => {
                // On failure login_error is set and the form stays up
                let _ = app.attempt_login().await;
            }
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::AuthKeyId => {
                app.login_auth_key_id.pop();
            }
            LoginFocus::AuthKey => {
                app.login_auth_key.pop();
            }
            LoginFocus::Coverage | LoginFocus::Button => {}
        },
        KeyCode::Char(' ') if app.login_focus == LoginFocus::Coverage => {
            app.login_coverage = app.login_coverage.toggle();
        }
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::AuthKeyId => {
                if can_add_auth_key_id_char(app.login_auth_key_id.chars().count(), c) {
                    app.login_auth_key_id.push(c);
                }
            }
            LoginFocus::AuthKey => {
                if can_add_auth_key_char(app.login_auth_key.chars().count(), c) {
                    app.login_auth_key.push(c);
                }
            }
            LoginFocus::Coverage | LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}
