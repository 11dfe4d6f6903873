//! Key label registry
//!
//! The registry is the only authority on which keys can be recorded and
//! played back. Codes are Linux input event codes (`linux/input-event-codes.h`).
//! Add a key by adding an entry to [`STANDARD_KEYS`].

use std::collections::BTreeMap;

/// Linux key codes for the standard alphabet
pub mod key_codes {
    pub const ESC: u16 = 1;
    pub const KEY_1: u16 = 2;
    pub const KEY_2: u16 = 3;
    pub const KEY_3: u16 = 4;
    pub const KEY_4: u16 = 5;
    pub const KEY_5: u16 = 6;
    pub const KEY_6: u16 = 7;
    pub const KEY_7: u16 = 8;
    pub const KEY_8: u16 = 9;
    pub const KEY_9: u16 = 10;
    pub const KEY_0: u16 = 11;
    pub const Q: u16 = 16;
    pub const W: u16 = 17;
    pub const E: u16 = 18;
    pub const R: u16 = 19;
    pub const T: u16 = 20;
    pub const Y: u16 = 21;
    pub const U: u16 = 22;
    pub const I: u16 = 23;
    pub const O: u16 = 24;
    pub const P: u16 = 25;
    pub const LEFTCTRL: u16 = 29;
    pub const A: u16 = 30;
    pub const S: u16 = 31;
    pub const D: u16 = 32;
    pub const F: u16 = 33;
    pub const G: u16 = 34;
    pub const H: u16 = 35;
    pub const J: u16 = 36;
    pub const K: u16 = 37;
    pub const L: u16 = 38;
    pub const LEFTSHIFT: u16 = 42;
    pub const Z: u16 = 44;
    pub const X: u16 = 45;
    pub const C: u16 = 46;
    pub const V: u16 = 47;
    pub const B: u16 = 48;
    pub const N: u16 = 49;
    pub const M: u16 = 50;
    pub const UP: u16 = 103;
    pub const LEFT: u16 = 105;
    pub const RIGHT: u16 = 106;
    pub const DOWN: u16 = 108;
}

use key_codes::*;

/// Built-in (code, label) table
pub const STANDARD_KEYS: &[(u16, &str)] = &[
    (KEY_0, "0"),
    (KEY_1, "1"),
    (KEY_2, "2"),
    (KEY_3, "3"),
    (KEY_4, "4"),
    (KEY_5, "5"),
    (KEY_6, "6"),
    (KEY_7, "7"),
    (KEY_8, "8"),
    (KEY_9, "9"),
    (A, "A"),
    (B, "B"),
    (C, "C"),
    (D, "D"),
    (E, "E"),
    (F, "F"),
    (G, "G"),
    (H, "H"),
    (I, "I"),
    (J, "J"),
    (K, "K"),
    (L, "L"),
    (M, "M"),
    (N, "N"),
    (O, "O"),
    (P, "P"),
    (Q, "Q"),
    (R, "R"),
    (S, "S"),
    (T, "T"),
    (U, "U"),
    (V, "V"),
    (W, "W"),
    (X, "X"),
    (Y, "Y"),
    (Z, "Z"),
    (UP, "UP"),
    (DOWN, "DOWN"),
    (LEFT, "LEFT"),
    (RIGHT, "RIGHT"),
    (ESC, "ESC"),
    (LEFTCTRL, "LEFTCTRL"),
    (LEFTSHIFT, "LEFTSHIFT"),
];

/// Immutable bidirectional label/code mapping
///
/// Built once at startup and shared by reference. The label map is derived
/// from the code map, so the two can never disagree.
#[derive(Debug, Clone)]
pub struct KeyRegistry {
    labels: BTreeMap<u16, String>,
    codes: BTreeMap<String, u16>,
}

impl KeyRegistry {
    /// Registry over [`STANDARD_KEYS`]
    pub fn standard() -> Self {
        Self::from_entries(STANDARD_KEYS.iter().map(|&(code, label)| (code, label)))
    }

    /// Later entries win when a code or label repeats.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (u16, &'a str)>) -> Self {
        let mut labels = BTreeMap::new();
        for (code, label) in entries {
            labels.retain(|_, l: &mut String| l.as_str() != label);
            labels.insert(code, label.to_string());
        }
        let codes = labels.iter().map(|(c, l)| (l.clone(), *c)).collect();
        Self { labels, codes }
    }

    pub fn label_of(&self, code: u16) -> Option<&str> {
        self.labels.get(&code).map(String::as_str)
    }

    pub fn code_of(&self, label: &str) -> Option<u16> {
        self.codes.get(label).copied()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.codes.contains_key(label)
    }

    /// Every registered code, ascending
    pub fn codes(&self) -> impl Iterator<Item = u16> + '_ {
        self.labels.keys().copied()
    }

    /// Every registered label, ordered by code
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.labels.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for KeyRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
