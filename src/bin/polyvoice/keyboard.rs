//! Computer keyboard to MIDI pitch, two rows laid out like a piano.

/// Semitone offsets from the current octave's C.
const KEYMAP: [(char, u8); 17] = [
    ('a', 0),
    ('w', 1),
    ('s', 2),
    ('e', 3),
    ('d', 4),
    ('f', 5),
    ('t', 6),
    ('g', 7),
    ('y', 8),
    ('h', 9),
    ('u', 10),
    ('j', 11),
    ('k', 12),
    ('o', 13),
    ('l', 14),
    ('p', 15),
    (';', 16),
];

const MIN_OCTAVE: i8 = 1;
const MAX_OCTAVE: i8 = 7;

#[derive(Debug, Clone, Copy)]
pub struct KeyboardMap {
    octave: i8,
}

impl KeyboardMap {
    pub fn new() -> Self {
        Self { octave: 4 }
    }

    pub fn octave(&self) -> i8 {
        self.octave
    }

    pub fn octave_down(&mut self) {
        self.octave = (self.octave - 1).max(MIN_OCTAVE);
    }

    pub fn octave_up(&mut self) {
        self.octave = (self.octave + 1).min(MAX_OCTAVE);
    }

    pub fn pitch(&self, key: char) -> Option<u8> {
        let key = key.to_ascii_lowercase();
        let (_, offset) = KEYMAP.iter().find(|(k, _)| *k == key)?;
        let c = (self.octave as i16 + 1) * 12;
        u8::try_from(c + *offset as i16).ok().filter(|p| *p < 128)
    }
}

impl Default for KeyboardMap {
    fn default() -> Self {
        Self::new()
    }
}
