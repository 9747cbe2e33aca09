//! Piezo buzzer codec.
//!
//! The buzzer firmware plays one fixed tone per command byte. Notes cover a
//! chromatic range from C3 to F5; a disjoint set of bytes triggers canned
//! alert sounds.

/// A single buzzer command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    pub command: u8,
}

/// One row of the pitch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEntry {
    /// Menu label: solfège, pitch class and MIDI number, e.g. `"도 C(60)"`.
    pub label: &'static str,
    /// Scientific pitch, e.g. `"C4"`.
    pub pitch: &'static str,
    pub midi: u8,
    pub command: u8,
}

impl NoteEntry {
    const fn new(label: &'static str, pitch: &'static str, midi: u8, command: u8) -> Self {
        Self {
            label,
            pitch,
            midi,
            command,
        }
    }
}

/// Command sent when a note name is not in the table: middle C.
pub const FALLBACK_COMMAND: u8 = 13;

pub const PITCHES: [NoteEntry; 30] = [
    NoteEntry::new("도 C(48)", "C3", 48, 1),
    NoteEntry::new("도# C#(49)", "C#3", 49, 2),
    NoteEntry::new("레 D(50)", "D3", 50, 3),
    NoteEntry::new("레# D#(51)", "D#3", 51, 4),
    NoteEntry::new("미 E(52)", "E3", 52, 5),
    NoteEntry::new("파 F(53)", "F3", 53, 6),
    NoteEntry::new("파# F#(54)", "F#3", 54, 7),
    NoteEntry::new("솔 G(55)", "G3", 55, 8),
    NoteEntry::new("솔# G#(56)", "G#3", 56, 9),
    NoteEntry::new("라 A(57)", "A3", 57, 10),
    NoteEntry::new("라# A#(58)", "A#3", 58, 11),
    NoteEntry::new("시 B(59)", "B3", 59, 12),
    NoteEntry::new("도 C(60)", "C4", 60, 13),
    NoteEntry::new("도# C#(61)", "C#4", 61, 14),
    NoteEntry::new("레 D(62)", "D4", 62, 15),
    NoteEntry::new("레# D#(63)", "D#4", 63, 16),
    NoteEntry::new("미 E(64)", "E4", 64, 17),
    NoteEntry::new("파 F(65)", "F4", 65, 18),
    NoteEntry::new("파# F#(66)", "F#4", 66, 19),
    NoteEntry::new("솔 G(67)", "G4", 67, 20),
    NoteEntry::new("솔# G#(68)", "G#4", 68, 21),
    NoteEntry::new("라 A(69)", "A4", 69, 22),
    NoteEntry::new("라# A#(70)", "A#4", 70, 23),
    NoteEntry::new("시 B(71)", "B4", 71, 24),
    NoteEntry::new("도 C(72)", "C5", 72, 25),
    NoteEntry::new("도# C#(73)", "C#5", 73, 26),
    NoteEntry::new("레 D(74)", "D5", 74, 27),
    NoteEntry::new("레# D#(75)", "D#5", 75, 28),
    NoteEntry::new("미 E(76)", "E5", 76, 29),
    NoteEntry::new("파 F(77)", "F5", 77, 30),
];

/// Canned alert sounds, keyed by menu name.
pub const ALERTS: [(&str, u8); 6] = [
    ("beep", 101),
    ("warning", 102),
    ("error", 103),
    ("success", 104),
    ("power on", 105),
    ("power off", 106),
];

impl Note {
    /// Look up a note by menu label (`"도 C(60)"`) or pitch (`"C4"`).
    ///
    /// Unknown names fall back to [`FALLBACK_COMMAND`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self::lookup(name).unwrap_or(Self {
            command: FALLBACK_COMMAND,
        })
    }

    /// Strict lookup used where the caller wants to know about misses.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        let name = name.trim();
        PITCHES
            .iter()
            .find(|entry| entry.label == name || entry.pitch.eq_ignore_ascii_case(name))
            .map(|entry| Self {
                command: entry.command,
            })
    }

    /// Look up an alert sound by name, case-insensitively.
    #[must_use]
    pub fn alert(name: &str) -> Option<Self> {
        let name = name.trim();
        ALERTS
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, command)| Self { command: *command })
    }

    #[must_use]
    pub fn to_bytes(self) -> [u8; 1] {
        [self.command]
    }
}
