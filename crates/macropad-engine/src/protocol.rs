//! Line protocol spoken with the keypad.
//!
//! Every line is ASCII and newline-terminated:
//! - inbound `<key><0|1>`: key pressed (`0`) or released (`1`)
//! - outbound `<key><0|1>`: LED off (`0`) or on (`1`)
//! - outbound `<key with first 'K' -> 'P'>-<0..255>`: progress bar value

use std::borrow::Cow;

use crate::message::LedState;

/// Direction of a key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Key went down.
    Pressed,
    /// Key came up.
    Released,
}

/// One decoded inbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Key identifier (the line minus its last character).
    pub key: String,
    /// Press or release.
    pub transition: Transition,
}

impl KeyEvent {
    /// Decode a line with its terminator already stripped.
    ///
    /// Returns `None` for an empty line, a line with no key identifier, or a
    /// line whose last character is neither `0` nor `1`.
    pub fn parse(line: &str) -> Option<Self> {
        let (idx, last) = line.char_indices().last()?;
        let transition = match last {
            '0' => Transition::Pressed,
            '1' => Transition::Released,
            _ => return None,
        };
        let key = &line[..idx];
        if key.is_empty() {
            return None;
        }
        Some(Self {
            key: key.to_string(),
            transition,
        })
    }

    /// Encode as an inbound line, including the newline.
    pub fn encode(&self) -> String {
        let c = match self.transition {
            Transition::Pressed => '0',
            Transition::Released => '1',
        };
        format!("{}{}\n", self.key, c)
    }
}

/// Encode an LED status line, or `None` when the state is unchanged.
pub fn encode_status(name: &str, state: LedState) -> Option<String> {
    match state {
        LedState::On => Some(format!("{name}1\n")),
        LedState::Off => Some(format!("{name}0\n")),
        LedState::Unchanged => None,
    }
}

/// Name of the progress bar paired with key `name`: the first `K` becomes `P`.
pub fn progress_name(name: &str) -> Cow<'_, str> {
    if name.contains('K') {
        Cow::Owned(name.replacen('K', "P", 1))
    } else {
        Cow::Borrowed(name)
    }
}

/// Encode a progress line.
pub fn encode_progress(name: &str, progress: u8) -> String {
    format!("{}-{}\n", progress_name(name), progress)
}
