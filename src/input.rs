//! Input snapshots and terminal key tracking
//!
//! The engine consumes one [`InputSnapshot`] of held keys per tick and derives
//! key edges itself. [`KeyTracker`] turns crossterm key events into those
//! snapshots. It doesn't rely on key release events, which are unreliable
//! on Linux terminals.

use crate::settings::Settings;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};

/// Time after which we consider a key released if no repeat was received
const KEY_TIMEOUT: Duration = Duration::from_millis(150);

/// The six controls the engine reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Left,
    Right,
    Down,
    Rotate,
    HardDrop,
    Hold,
}

impl Control {
    pub fn all() -> [Control; 6] {
        [
            Control::Left,
            Control::Right,
            Control::Down,
            Control::Rotate,
            Control::HardDrop,
            Control::Hold,
        ]
    }

    fn index(self) -> usize {
        match self {
            Control::Left => 0,
            Control::Right => 1,
            Control::Down => 2,
            Control::Rotate => 3,
            Control::HardDrop => 4,
            Control::Hold => 5,
        }
    }
}

/// Which controls are held down during one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputSnapshot {
    pub left: bool,
    pub right: bool,
    pub down: bool,
    pub rotate: bool,
    pub hard_drop: bool,
    pub hold: bool,
}

impl InputSnapshot {
    pub fn with(mut self, control: Control) -> Self {
        self.set(control, true);
        self
    }

    pub fn set(&mut self, control: Control, held: bool) {
        match control {
            Control::Left => self.left = held,
            Control::Right => self.right = held,
            Control::Down => self.down = held,
            Control::Rotate => self.rotate = held,
            Control::HardDrop => self.hard_drop = held,
            Control::Hold => self.hold = held,
        }
    }

    pub fn is_held(&self, control: Control) -> bool {
        match control {
            Control::Left => self.left,
            Control::Right => self.right,
            Control::Down => self.down,
            Control::Rotate => self.rotate,
            Control::HardDrop => self.hard_drop,
            Control::Hold => self.hold,
        }
    }
}

/// Held levels plus first-frame edges for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputFrame {
    pub held: InputSnapshot,
    pub pressed: InputSnapshot,
}

impl InputFrame {
    pub fn between(previous: InputSnapshot, current: InputSnapshot) -> Self {
        let mut pressed = InputSnapshot::default();
        for control in Control::all() {
            pressed.set(
                control,
                current.is_held(control) && !previous.is_held(control),
            );
        }
        Self {
            held: current,
            pressed,
        }
    }
}

/// Commands handled outside the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Restart,
}

/// Key bindings configuration - supports multiple keys per control
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub move_left: Vec<KeyCode>,
    pub move_right: Vec<KeyCode>,
    pub soft_drop: Vec<KeyCode>,
    pub rotate: Vec<KeyCode>,
    pub hard_drop: Vec<KeyCode>,
    pub hold: Vec<KeyCode>,
    pub restart: Vec<KeyCode>,
    pub quit: Vec<KeyCode>,
}

impl KeyBindings {
    /// Parse a key string into KeyCode
    fn parse_key(s: &str) -> Option<KeyCode> {
        let lower = s.to_lowercase();
        let code = match lower.as_str() {
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "space" => KeyCode::Char(' '),
            "enter" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "esc" | "escape" => KeyCode::Esc,
            "shift" => KeyCode::Modifier(crossterm::event::ModifierKeyCode::LeftShift),
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => {
                        tracing::warn!("ignoring unknown key binding {:?}", s);
                        return None;
                    }
                }
            }
        };
        Some(code)
    }

    /// Parse a list of key strings into KeyCodes
    fn parse_keys(keys: &[String]) -> Vec<KeyCode> {
        keys.iter().filter_map(|s| Self::parse_key(s)).collect()
    }

    /// Create keybindings from settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            move_left: Self::parse_keys(&settings.keys.move_left),
            move_right: Self::parse_keys(&settings.keys.move_right),
            soft_drop: Self::parse_keys(&settings.keys.soft_drop),
            rotate: Self::parse_keys(&settings.keys.rotate),
            hard_drop: Self::parse_keys(&settings.keys.hard_drop),
            hold: Self::parse_keys(&settings.keys.hold),
            restart: Self::parse_keys(&settings.keys.restart),
            quit: Self::parse_keys(&settings.keys.quit),
        }
    }

    fn control_for(&self, code: KeyCode) -> Option<Control> {
        if self.move_left.contains(&code) {
            Some(Control::Left)
        } else if self.move_right.contains(&code) {
            Some(Control::Right)
        } else if self.soft_drop.contains(&code) {
            Some(Control::Down)
        } else if self.rotate.contains(&code) {
            Some(Control::Rotate)
        } else if self.hard_drop.contains(&code) {
            Some(Control::HardDrop)
        } else if self.hold.contains(&code) {
            Some(Control::Hold)
        } else {
            None
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Tracks which controls are held, from press/repeat/release events
pub struct KeyTracker {
    bindings: KeyBindings,
    last_seen: [Option<Instant>; 6],
    timeout: Duration,
}

impl KeyTracker {
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            last_seen: [None; 6],
            timeout: KEY_TIMEOUT,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(KeyBindings::from_settings(settings))
    }

    /// Handle a key press or repeat. Returns a command for keys the engine doesn't read.
    pub fn key_down(&mut self, key: KeyEvent, now: Instant) -> Option<Command> {
        // Ctrl+C always quits
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Command::Quit);
        }

        let code = normalize_key(key.code);
        if let Some(control) = self.bindings.control_for(code) {
            self.last_seen[control.index()] = Some(now);
            // Opposite directions cancel each other
            match control {
                Control::Left => self.last_seen[Control::Right.index()] = None,
                Control::Right => self.last_seen[Control::Left.index()] = None,
                _ => {}
            }
            None
        } else if self.bindings.quit.contains(&code) {
            Some(Command::Quit)
        } else if self.bindings.restart.contains(&code) {
            Some(Command::Restart)
        } else {
            None
        }
    }

    /// Handle a key release event (may never arrive on some terminals)
    pub fn key_up(&mut self, key: KeyEvent) {
        let code = normalize_key(key.code);
        if let Some(control) = self.bindings.control_for(code) {
            self.last_seen[control.index()] = None;
        }
    }

    /// Held controls as of `now`, expiring keys not seen recently
    pub fn snapshot(&mut self, now: Instant) -> InputSnapshot {
        let mut snapshot = InputSnapshot::default();
        for control in Control::all() {
            let slot = &mut self.last_seen[control.index()];
            if let Some(seen) = *slot {
                if now.duration_since(seen) > self.timeout {
                    *slot = None;
                } else {
                    snapshot.set(control, true);
                }
            }
        }
        snapshot
    }

    /// Forget all held keys
    pub fn clear(&mut self) {
        self.last_seen = [None; 6];
    }
}

/// Normalize key codes for consistent handling
fn normalize_key(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_edges_only_on_first_frame() {
        let held = InputSnapshot::default().with(Control::Rotate);
        let first = InputFrame::between(InputSnapshot::default(), held);
        assert!(first.pressed.rotate);
        let second = InputFrame::between(held, held);
        assert!(second.held.rotate);
        assert!(!second.pressed.rotate);
    }

    #[test]
    fn test_tracker_maps_default_bindings() {
        let mut tracker = KeyTracker::new(KeyBindings::default());
        let now = Instant::now();
        assert_eq!(tracker.key_down(press(KeyCode::Left), now), None);
        assert_eq!(tracker.key_down(press(KeyCode::Char('C')), now), None);
        let snapshot = tracker.snapshot(now);
        assert!(snapshot.left);
        assert!(snapshot.hold);
        assert!(!snapshot.right);
    }

    #[test]
    fn test_tracker_commands() {
        let mut tracker = KeyTracker::new(KeyBindings::default());
        let now = Instant::now();
        assert_eq!(tracker.key_down(press(KeyCode::Char('q')), now), Some(Command::Quit));
        assert_eq!(tracker.key_down(press(KeyCode::Char('r')), now), Some(Command::Restart));
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(tracker.key_down(ctrl_c, now), Some(Command::Quit));
    }

    #[test]
    fn test_keys_expire_without_repeats() {
        let mut tracker = KeyTracker::new(KeyBindings::default());
        let start = Instant::now();
        tracker.key_down(press(KeyCode::Down), start);
        assert!(tracker.snapshot(start + Duration::from_millis(50)).down);
        assert!(!tracker.snapshot(start + Duration::from_millis(500)).down);
    }

    #[test]
    fn test_release_and_opposite_direction() {
        let mut tracker = KeyTracker::new(KeyBindings::default());
        let now = Instant::now();
        tracker.key_down(press(KeyCode::Left), now);
        tracker.key_down(press(KeyCode::Right), now);
        let snapshot = tracker.snapshot(now);
        assert!(snapshot.right);
        assert!(!snapshot.left);

        tracker.key_up(press(KeyCode::Right));
        assert!(!tracker.snapshot(now).right);
    }
}
