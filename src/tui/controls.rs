//! Keyboard input handling for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::runtime::App;

/// Maps a key event to an application action.
///
/// Guards on [`KeyEventKind::Press`] to avoid double-fire on some terminals.
pub fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit = true,
        KeyCode::Char(' ') => app.toggle_pause(),
        KeyCode::Char('+' | '=') | KeyCode::Right => app.speed_up(),
        KeyCode::Char('-') | KeyCode::Left => app.speed_down(),
        KeyCode::Char('1') => app.switch_preset("baseline"),
        KeyCode::Char('2') => app.switch_preset("heatwave"),
        KeyCode::Char('3') => app.switch_preset("datacenter_boom"),
        KeyCode::Char('4') => app.switch_preset("evening_peak"),
        KeyCode::Char('h') => app.toggle_heatwave(),
        KeyCode::Char('w') => app.toggle_dc_load(),
        KeyCode::Char('g') => app.toggle_growth(),
        KeyCode::Char('r') => app.restart(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ParamKey;

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn space_toggles_playback() {
        let mut app = App::new("baseline");
        press(&mut app, KeyCode::Char(' '));
        assert!(!app.is_playing());
    }

    #[test]
    fn h_toggles_heatwave() {
        let mut app = App::new("baseline");
        press(&mut app, KeyCode::Char('h'));
        assert!(app.sim.scenarios().is_active(ParamKey::WxTemp));
    }

    #[test]
    fn q_quits() {
        let mut app = App::new("baseline");
        press(&mut app, KeyCode::Char('q'));
        assert!(app.quit);
    }
}
