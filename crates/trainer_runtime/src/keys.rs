//! Key tokens, canonical key-sets, and raw host key-event normalization.
//!
//! Every key combination the trainer sees is reduced to a [`KeySet`]: an ordered,
//! duplicate-free set of [`KeyToken`] values. Two presses of the same chord always normalize to
//! equal sets regardless of the order modifiers were reported in or the case of the primary key,
//! which is what lets the shortcut engine match by plain set equality.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Key names hosts report for presses that carry no usable key identity.
const IGNORED_KEY_NAMES: [&str; 3] = ["", "Unidentified", "Dead"];

/// One member of a canonical key-set.
///
/// Variant order is significant: derived [`Ord`] places modifiers first (`Control`, `Alt`,
/// `Shift`, `Meta`), which fixes the display order of a [`KeySet`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyToken {
    /// Control modifier.
    Control,
    /// Alt / Option modifier.
    Alt,
    /// Shift modifier.
    Shift,
    /// Meta / Windows / Command modifier.
    Meta,
    /// A single printable character, lower-cased.
    Char(char),
    /// Function key `F1` through `F12`.
    Function(u8),
    /// Tab key.
    Tab,
    /// Escape key.
    Escape,
    /// Enter / Return key.
    Enter,
    /// Space bar.
    Space,
    /// Backspace key.
    Backspace,
    /// Delete key.
    Delete,
    /// Up arrow.
    ArrowUp,
    /// Down arrow.
    ArrowDown,
    /// Left arrow.
    ArrowLeft,
    /// Right arrow.
    ArrowRight,
    /// Home key.
    Home,
    /// End key.
    End,
    /// Page Up key.
    PageUp,
    /// Page Down key.
    PageDown,
    /// Any other host key name, passed through verbatim.
    Named(String),
}

impl KeyToken {
    /// Returns whether this token is one of the four modifier tokens.
    pub fn is_modifier(&self) -> bool {
        matches!(self, Self::Control | Self::Alt | Self::Shift | Self::Meta)
    }

    /// Maps a host key identifier (or a catalog key name) to its token.
    ///
    /// Returns `None` for identifiers that carry no key identity (`""`, `Unidentified`, `Dead`).
    pub fn from_key_name(raw: &str) -> Option<Self> {
        if IGNORED_KEY_NAMES.contains(&raw) {
            return None;
        }
        if raw == " " {
            return Some(Self::Space);
        }

        let mut chars = raw.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            return Some(Self::Char(ch.to_lowercase().next().unwrap_or(ch)));
        }

        let lowered = raw.trim().to_ascii_lowercase();
        let token = match lowered.as_str() {
            "meta" | "os" | "super" | "win" | "cmd" | "command" => Self::Meta,
            "control" | "ctrl" => Self::Control,
            "alt" | "option" => Self::Alt,
            "shift" => Self::Shift,
            "plus" => Self::Char('+'),
            "tab" => Self::Tab,
            "escape" | "esc" => Self::Escape,
            "enter" | "return" => Self::Enter,
            "space" | "spacebar" => Self::Space,
            "backspace" => Self::Backspace,
            "delete" | "del" => Self::Delete,
            "arrowup" | "up" => Self::ArrowUp,
            "arrowdown" | "down" => Self::ArrowDown,
            "arrowleft" | "left" => Self::ArrowLeft,
            "arrowright" | "right" => Self::ArrowRight,
            "home" => Self::Home,
            "end" => Self::End,
            "pageup" => Self::PageUp,
            "pagedown" => Self::PageDown,
            other => match function_key_number(other) {
                Some(number) => Self::Function(number),
                None => Self::Named(raw.trim().to_string()),
            },
        };
        Some(token)
    }
}

fn function_key_number(lowered: &str) -> Option<u8> {
    let number = lowered.strip_prefix('f')?.parse::<u8>().ok()?;
    (1..=12).contains(&number).then_some(number)
}

impl fmt::Display for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Control => f.write_str("Ctrl"),
            Self::Alt => f.write_str("Alt"),
            Self::Shift => f.write_str("Shift"),
            Self::Meta => f.write_str("Meta"),
            Self::Char('+') => f.write_str("Plus"),
            Self::Char(ch) => {
                // Only upper-case when it maps back to the same char (`ß` would become `SS`).
                let mut upper = ch.to_uppercase();
                match (upper.next(), upper.next()) {
                    (Some(single), None) if single.to_lowercase().eq(std::iter::once(*ch)) => {
                        write!(f, "{single}")
                    }
                    _ => write!(f, "{ch}"),
                }
            }
            Self::Function(number) => write!(f, "F{number}"),
            Self::Tab => f.write_str("Tab"),
            Self::Escape => f.write_str("Esc"),
            Self::Enter => f.write_str("Enter"),
            Self::Space => f.write_str("Space"),
            Self::Backspace => f.write_str("Backspace"),
            Self::Delete => f.write_str("Delete"),
            Self::ArrowUp => f.write_str("Up"),
            Self::ArrowDown => f.write_str("Down"),
            Self::ArrowLeft => f.write_str("Left"),
            Self::ArrowRight => f.write_str("Right"),
            Self::Home => f.write_str("Home"),
            Self::End => f.write_str("End"),
            Self::PageUp => f.write_str("PageUp"),
            Self::PageDown => f.write_str("PageDown"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Errors produced when parsing a textual key combination such as `Meta+D`.
pub enum KeyParseError {
    /// The combination text was empty.
    #[error("key combination is empty")]
    Empty,
    /// A `+`-separated segment was blank (for example `Ctrl++Alt`).
    #[error("key combination `{0}` contains a blank segment")]
    BlankSegment(String),
}

/// Canonical, order-independent key combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeySet(BTreeSet<KeyToken>);

impl KeySet {
    /// Builds a key-set from any collection of tokens; duplicates collapse.
    pub fn new(tokens: impl IntoIterator<Item = KeyToken>) -> Self {
        Self(tokens.into_iter().collect())
    }

    /// Iterates tokens in canonical order (modifiers first).
    pub fn tokens(&self) -> impl Iterator<Item = &KeyToken> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, token: &KeyToken) -> bool {
        self.0.contains(token)
    }

    /// Returns whether every token is a modifier (the first half of a chord still being typed).
    pub fn is_modifier_only(&self) -> bool {
        !self.0.is_empty() && self.0.iter().all(KeyToken::is_modifier)
    }

    /// Returns the human-readable combo, e.g. `Ctrl + Shift + Esc`.
    pub fn display_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, token) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(" + ")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

impl FromStr for KeySet {
    type Err = KeyParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(KeyParseError::Empty);
        }

        let mut segments: Vec<&str> = trimmed.split('+').map(str::trim).collect();
        let mut tokens = BTreeSet::new();

        // A trailing `++` (or a bare `+`) names the plus key itself.
        let len = segments.len();
        if len >= 2 && segments[len - 1].is_empty() && segments[len - 2].is_empty() {
            segments.truncate(len - 2);
            tokens.insert(KeyToken::Char('+'));
        }

        for segment in segments {
            match KeyToken::from_key_name(segment) {
                Some(token) => {
                    tokens.insert(token);
                }
                None => return Err(KeyParseError::BlankSegment(trimmed.to_string())),
            }
        }
        Ok(Self(tokens))
    }
}

impl TryFrom<String> for KeySet {
    type Error = KeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeySet> for String {
    fn from(value: KeySet) -> Self {
        value.to_string()
    }
}

/// Raw key-press as reported by the host environment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawKeyEvent {
    /// Host key identifier (`"d"`, `"D"`, `"F4"`, `"Tab"`, `"Meta"`, ...).
    pub key: String,
    pub meta: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl RawKeyEvent {
    /// Creates an event for `key` with no modifiers held.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }
}

/// Converts a raw key-press into its canonical [`KeySet`].
///
/// Pure and deterministic: modifier flags map to fixed tokens, single printable characters are
/// lower-cased, and function/named keys pass through as their own token.
pub fn normalize_key_event(event: &RawKeyEvent) -> KeySet {
    let mut tokens = BTreeSet::new();
    if event.ctrl {
        tokens.insert(KeyToken::Control);
    }
    if event.alt {
        tokens.insert(KeyToken::Alt);
    }
    if event.shift {
        tokens.insert(KeyToken::Shift);
    }
    if event.meta {
        tokens.insert(KeyToken::Meta);
    }
    if let Some(token) = KeyToken::from_key_name(&event.key) {
        tokens.insert(token);
    }
    KeySet(tokens)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn set(text: &str) -> KeySet {
        text.parse().expect("parse key set")
    }

    #[test]
    fn letters_normalize_case_insensitively() {
        let upper = normalize_key_event(&RawKeyEvent::new("D").with_meta());
        let lower = normalize_key_event(&RawKeyEvent::new("d").with_meta());
        assert_eq!(upper, lower);
        assert_eq!(upper, KeySet::new([KeyToken::Meta, KeyToken::Char('d')]));
    }

    #[test]
    fn modifier_flags_and_key_order_do_not_matter() {
        let a = normalize_key_event(&RawKeyEvent::new("Escape").with_shift().with_ctrl());
        let b = set("Shift + Ctrl + Esc");
        assert_eq!(a, b);
        assert_eq!(a.display_string(), "Ctrl + Shift + Esc");
    }

    #[test]
    fn function_and_named_keys_pass_through() {
        assert_eq!(KeyToken::from_key_name("F4"), Some(KeyToken::Function(4)));
        assert_eq!(KeyToken::from_key_name("F12"), Some(KeyToken::Function(12)));
        assert_eq!(
            KeyToken::from_key_name("F13"),
            Some(KeyToken::Named("F13".to_string()))
        );
        assert_eq!(KeyToken::from_key_name("Tab"), Some(KeyToken::Tab));
        assert_eq!(KeyToken::from_key_name("ArrowUp"), Some(KeyToken::ArrowUp));
        assert_eq!(KeyToken::from_key_name(" "), Some(KeyToken::Space));
        assert_eq!(
            KeyToken::from_key_name("PrintScreen"),
            Some(KeyToken::Named("PrintScreen".to_string()))
        );
    }

    #[test]
    fn lone_modifier_press_is_modifier_only() {
        let keys = normalize_key_event(&RawKeyEvent::new("Meta").with_meta());
        assert_eq!(keys, KeySet::new([KeyToken::Meta]));
        assert!(keys.is_modifier_only());
        assert!(!set("Meta+D").is_modifier_only());
    }

    #[test]
    fn unidentified_keys_contribute_no_token() {
        let keys = normalize_key_event(&RawKeyEvent::new("Unidentified").with_alt());
        assert_eq!(keys, KeySet::new([KeyToken::Alt]));
        assert!(normalize_key_event(&RawKeyEvent::new("")).is_empty());
    }

    #[test]
    fn parse_handles_plus_key_and_rejects_blank_segments() {
        assert_eq!(
            set("Ctrl++"),
            KeySet::new([KeyToken::Control, KeyToken::Char('+')])
        );
        assert_eq!(set("Ctrl + +").display_string(), "Ctrl + Plus");
        assert_eq!(set("ctrl+plus"), set("Ctrl++"));
        assert_eq!("".parse::<KeySet>(), Err(KeyParseError::Empty));
        assert!(matches!(
            "Ctrl++Alt".parse::<KeySet>(),
            Err(KeyParseError::BlankSegment(_))
        ));
    }

    #[test]
    fn display_string_parses_back_to_same_set() {
        let original = set("Meta+Shift+ArrowLeft");
        assert_eq!(original.display_string(), "Shift + Meta + Left");
        assert_eq!(set(&original.display_string()), original);
    }

    #[test]
    fn serde_string_form_round_trips_plus_and_non_ascii_keys() {
        let cases = [
            KeySet::new([KeyToken::Control, KeyToken::Char('+'), KeyToken::Char('a')]),
            KeySet::new([KeyToken::Char('ß')]),
            KeySet::new([KeyToken::Alt, KeyToken::Char('é')]),
            KeySet::new([KeyToken::Control, KeyToken::Shift, KeyToken::Escape]),
            KeySet::new([KeyToken::Alt, KeyToken::Function(4)]),
        ];
        for keys in cases {
            let json = serde_json::to_string(&keys).expect("serialize");
            let back: KeySet = serde_json::from_str(&json).expect("deserialize");
            assert_eq!(back, keys, "round trip through {json}");
        }
        assert_eq!(
            KeySet::new([KeyToken::Control, KeyToken::Char('+'), KeyToken::Char('a')])
                .display_string(),
            "Ctrl + Plus + A"
        );
        assert_eq!(KeySet::new([KeyToken::Char('ß')]).display_string(), "ß");
    }
}
