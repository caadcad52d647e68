//! Pitched note parsing and ordering
//!
//! Notes are written in scientific notation (`C4`, `F#3`, case-insensitive,
//! octaves 0-8). `B` and `H` both denote the note below C. Ordering is by
//! MIDI code.

use std::fmt;

use crate::error::{Result, SolfaError};

/// A single pitched note. Comparison is by MIDI code, so enharmonic
/// spellings (`E#4` and `F4`) are equal.
#[derive(Debug, Clone, Copy)]
pub struct Note {
    letter: char,
    sharp: bool,
    octave: u8,
    midi: u8,
}

impl Note {
    /// Parse a note from scientific notation, e.g. `C4` or `f#3`.
    pub fn parse(token: &str) -> Result<Self> {
        let err = || SolfaError::ParseNote {
            token: token.to_string(),
        };

        let mut chars = token.chars();
        let letter = chars.next().ok_or_else(err)?.to_ascii_uppercase();
        if !('A'..='H').contains(&letter) {
            return Err(err());
        }
        // H is the European spelling of B
        let letter = if letter == 'H' { 'B' } else { letter };

        let mut rest = chars.next().ok_or_else(err)?;
        let sharp = rest == '#';
        if sharp {
            rest = chars.next().ok_or_else(err)?;
        }

        let octave = rest.to_digit(10).ok_or_else(err)? as u8;
        if octave > 8 || chars.next().is_some() {
            return Err(err());
        }

        Ok(Self {
            letter,
            sharp,
            octave,
            midi: Self::midi_code(letter, octave, sharp),
        })
    }

    fn semitone(letter: char) -> u8 {
        match letter {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            _ => 11, // B
        }
    }

    fn midi_code(letter: char, octave: u8, sharp: bool) -> u8 {
        (octave + 1) * 12 + Self::semitone(letter) + u8::from(sharp)
    }

    pub fn letter(&self) -> char {
        self.letter
    }

    pub fn sharp(&self) -> bool {
        self.sharp
    }

    pub fn octave(&self) -> u8 {
        self.octave
    }

    pub fn midi(&self) -> u8 {
        self.midi
    }

    /// Audio file-name atom: `c4`, `cs4` (sharp spelled `s`).
    pub fn file_atom(&self) -> String {
        format!(
            "{}{}{}",
            self.letter.to_ascii_lowercase(),
            if self.sharp { "s" } else { "" },
            self.octave
        )
    }
}

impl PartialEq for Note {
    fn eq(&self, other: &Self) -> bool {
        self.midi == other.midi
    }
}

impl Eq for Note {}

impl PartialOrd for Note {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Note {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.midi.cmp(&other.midi)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.letter,
            if self.sharp { "#" } else { "" },
            self.octave
        )
    }
}
