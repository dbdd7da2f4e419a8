// ============================================================================
// Event handling
// ============================================================================
// Polls the terminal for key presses and turns the absence of input into
// regular ticks so the main loop keeps redrawing.
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind};

/// Application events.
#[derive(Debug, Clone)]
pub enum Event {
    /// Key pressed.
    Key(KeyEvent),

    /// Regular tick (animations, status line aging).
    Tick,

    /// Something went wrong while reading input.
    Error,
}

/// Stateless reader over crossterm's event queue.
pub struct EventHandler;

impl EventHandler {
    pub fn new() -> Self {
        Self
    }

    /// Reads the next event, waiting at most 250ms.
    ///
    /// Some platforms report Press and Release separately; only Press is
    /// forwarded so a tap never counts twice.
    pub fn next(&self) -> Result<Event> {
        if event::poll(Duration::from_millis(250))? {
            match event::read()? {
                CrosstermEvent::Key(key) => {
                    if key.kind == KeyEventKind::Press {
                        Ok(Event::Key(key))
                    } else {
                        Ok(Event::Tick)
                    }
                }

                // Resize, mouse and the rest are ignored for now.
                _ => Ok(Event::Tick),
            }
        } else {
            Ok(Event::Tick)
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Key predicates
// ============================================================================

/// 'q' (quit, with confirmation).
pub fn is_quit_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'))
    } else {
        false
    }
}

pub fn is_escape_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Esc)
    } else {
        false
    }
}

pub fn is_enter_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Enter)
    } else {
        false
    }
}

/// Up arrow or 'k'.
pub fn is_up_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(
            key.code,
            KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K')
        )
    } else {
        false
    }
}

/// Down arrow or 'j'.
pub fn is_down_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(
            key.code,
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J')
        )
    } else {
        false
    }
}

/// 's' (search for a ticker).
pub fn is_search_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('s') | KeyCode::Char('S'))
    } else {
        false
    }
}

/// 'a' (add the current ticker to the watchlist).
pub fn is_add_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('a') | KeyCode::Char('A'))
    } else {
        false
    }
}

/// 'd' (delete the selected watchlist row, with confirmation).
pub fn is_delete_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('d') | KeyCode::Char('D'))
    } else {
        false
    }
}

/// 'g' (cycle the watchlist group filter).
pub fn is_group_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('g') | KeyCode::Char('G'))
    } else {
        false
    }
}

/// 'r' (refresh watchlist prices).
pub fn is_refresh_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('r') | KeyCode::Char('R'))
    } else {
        false
    }
}

/// 'c' (open the chart screen).
pub fn is_chart_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
    } else {
        false
    }
}

/// 'f' (open the financials screen).
pub fn is_financials_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('f') | KeyCode::Char('F'))
    } else {
        false
    }
}

/// 'l' (next interval).
pub fn is_next_interval_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('l'))
    } else {
        false
    }
}

/// 'h' (previous interval).
pub fn is_previous_interval_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('h'))
    } else {
        false
    }
}

/// ']' (wider range).
pub fn is_next_range_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char(']'))
    } else {
        false
    }
}

/// '[' (narrower range).
pub fn is_previous_range_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('['))
    } else {
        false
    }
}

/// 'm' (record a trade marker).
pub fn is_marker_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('m') | KeyCode::Char('M'))
    } else {
        false
    }
}

/// 'p' (toggle annual/quarterly financials).
pub fn is_scope_toggle_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('p') | KeyCode::Char('P'))
    } else {
        false
    }
}

pub fn is_backspace_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Backspace)
    } else {
        false
    }
}

/// Characters accepted in the input buffer. Covers tickers (`BRK-B`,
/// `2222.SR`), group names and trade lines (`2024-03-01 450 buy`).
pub fn is_input_char_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char(c) if c.is_alphanumeric() || c == '-' || c == '.' || c == ' ')
    } else {
        false
    }
}

/// Extracts the character from a key event, if it is one.
pub fn get_char_from_event(event: &Event) -> Option<char> {
    if let Event::Key(key) = event {
        if let KeyCode::Char(c) = key.code {
            return Some(c);
        }
    }
    None
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, event::KeyModifiers::empty()))
    }

    #[test]
    fn test_is_quit_event() {
        assert!(is_quit_event(&key(KeyCode::Char('q'))));
        assert!(is_quit_event(&key(KeyCode::Char('Q'))));
        assert!(!is_quit_event(&key(KeyCode::Char('a'))));
        assert!(!is_quit_event(&Event::Tick));
    }

    #[test]
    fn test_vim_navigation_keys() {
        assert!(is_up_event(&key(KeyCode::Up)));
        assert!(is_up_event(&key(KeyCode::Char('k'))));
        assert!(is_down_event(&key(KeyCode::Down)));
        assert!(is_down_event(&key(KeyCode::Char('j'))));
        assert!(!is_up_event(&key(KeyCode::Char('j'))));
    }

    #[test]
    fn test_range_bracket_keys() {
        assert!(is_next_range_event(&key(KeyCode::Char(']'))));
        assert!(is_previous_range_event(&key(KeyCode::Char('['))));
        assert!(!is_next_range_event(&key(KeyCode::Char('['))));
    }

    #[test]
    fn test_input_char_filter() {
        assert!(is_input_char_event(&key(KeyCode::Char('n'))));
        assert!(is_input_char_event(&key(KeyCode::Char('-'))));
        assert!(is_input_char_event(&key(KeyCode::Char('.'))));
        assert!(is_input_char_event(&key(KeyCode::Char(' '))));
        assert!(!is_input_char_event(&key(KeyCode::Char('!'))));
        assert_eq!(get_char_from_event(&key(KeyCode::Char('x'))), Some('x'));
        assert_eq!(get_char_from_event(&key(KeyCode::Enter)), None);
    }
}
