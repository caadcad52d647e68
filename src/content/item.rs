//! Immutable practice items
//!
//! A [`ContentItem`] is a 2- or 3-note interval/chord with harmonic and
//! positional metadata. Items are created once at load time and shared
//! read-only across all sessions; nothing here is mutated after construction.

use std::fmt;

use crate::content::note::Note;

/// Placement of the root (tonic) note within a voiced chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TonicPosition {
    #[default]
    Unknown,
    Bottom,
    Middle,
    Top,
}

impl TonicPosition {
    /// Ordinal used for button payloads: bottom = 0, middle = 1, top = 2.
    pub fn ordinal(&self) -> Option<i64> {
        match self {
            TonicPosition::Unknown => None,
            TonicPosition::Bottom => Some(0),
            TonicPosition::Middle => Some(1),
            TonicPosition::Top => Some(2),
        }
    }

    pub fn from_ordinal(value: i64) -> Self {
        match value {
            0 => TonicPosition::Bottom,
            1 => TonicPosition::Middle,
            2 => TonicPosition::Top,
            _ => TonicPosition::Unknown,
        }
    }

    pub(crate) fn parse(cell: &str) -> Self {
        match cell.trim().to_ascii_lowercase().as_str() {
            "bottom" | "low" => TonicPosition::Bottom,
            "middle" | "mid" => TonicPosition::Middle,
            "top" | "high" => TonicPosition::Top,
            _ => TonicPosition::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TonicPosition::Unknown => "",
            TonicPosition::Bottom => "At the bottom",
            TonicPosition::Middle => "In the middle",
            TonicPosition::Top => "At the top",
        }
    }
}

/// Chord inversion (triads only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Inversion {
    #[default]
    Unknown,
    Root,
    First,
    Second,
}

impl Inversion {
    pub(crate) fn parse(cell: &str) -> Self {
        match cell.trim().to_ascii_lowercase().as_str() {
            "root" | "0" => Inversion::Root,
            "first" | "1" => Inversion::First,
            "second" | "2" => Inversion::Second,
            _ => Inversion::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Inversion::Unknown => "",
            Inversion::Root => "root position",
            Inversion::First => "first inversion",
            Inversion::Second => "second inversion",
        }
    }
}

/// Construction input for [`ContentItem`]. Plain data; the loader fills it
/// from a table row and tests fill it directly.
#[derive(Debug, Clone, Default)]
pub struct ItemSpec {
    pub id: String,
    /// Simultaneous chord voicing (true) vs sequential arpeggio/melody.
    pub simultaneous: bool,
    /// Up to three note cells in presentation order; `None` marks an
    /// omitted slot (intervals cut from a triad).
    pub cells: Vec<Option<Note>>,
    /// Id of the originating triad (intervals only).
    pub base_chord: String,
    /// Chord label, e.g. `T5` / `D6` / `S5`. First letter carries the
    /// harmonic function.
    pub chord_label: Option<String>,
    /// Interval label, e.g. `minor third`.
    pub interval_label: Option<String>,
    pub tonality_major: bool,
    pub chord_major: bool,
    pub tonic_position: TonicPosition,
    pub inversion: Inversion,
    /// TTS override for the display name.
    pub speech_name: Option<String>,
}

/// An immutable practice unit: an ordered sequence of 2-3 pitched notes
/// plus filter metadata.
#[derive(Debug, Clone)]
pub struct ContentItem {
    id: String,
    notes: Vec<Note>,
    ascending: bool,
    missing_note: Option<usize>,
    base_chord: String,
    simultaneous: bool,
    tonality_major: bool,
    chord_major: bool,
    is_tonic: bool,
    is_dominant: bool,
    is_subdominant: bool,
    tonic_position: TonicPosition,
    inversion: Inversion,
    name: String,
    speech_name: Option<String>,
}

impl ContentItem {
    pub fn new(spec: ItemSpec) -> Self {
        let mut notes = Vec::new();
        let mut missing_note = None;
        let mut ascending = true;
        let mut prev: Option<Note> = None;

        for (i, cell) in spec.cells.iter().enumerate() {
            match cell {
                Some(note) => {
                    if let Some(p) = prev {
                        ascending = ascending && p < *note;
                    }
                    prev = Some(*note);
                    notes.push(*note);
                }
                None => missing_note = Some(i),
            }
        }

        let is_triad = notes.len() == 3;
        let name = if is_triad {
            spec.chord_label.clone().unwrap_or_default()
        } else {
            spec.interval_label.clone().unwrap_or_default()
        };

        // Harmonic function from the first letter of the chord label.
        let (is_tonic, is_dominant, is_subdominant) = if is_triad {
            match name.chars().next().map(|c| c.to_ascii_uppercase()) {
                Some('T') => (true, false, false),
                Some('D') => (false, true, false),
                Some('S') => (false, false, true),
                _ => (false, false, false),
            }
        } else {
            (false, false, false)
        };

        Self {
            id: spec.id,
            notes,
            ascending,
            missing_note,
            base_chord: spec.base_chord,
            simultaneous: spec.simultaneous,
            tonality_major: spec.tonality_major,
            chord_major: spec.chord_major,
            is_tonic,
            is_dominant,
            is_subdominant,
            tonic_position: spec.tonic_position,
            inversion: spec.inversion,
            name,
            speech_name: spec.speech_name,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn is_interval(&self) -> bool {
        self.notes.len() == 2
    }

    pub fn is_triad(&self) -> bool {
        self.notes.len() == 3
    }

    pub fn is_ascending(&self) -> bool {
        self.ascending
    }

    pub fn missing_note(&self) -> Option<usize> {
        self.missing_note
    }

    pub fn base_chord(&self) -> &str {
        &self.base_chord
    }

    pub fn is_simultaneous(&self) -> bool {
        self.simultaneous
    }

    pub fn is_tonality_major(&self) -> bool {
        self.tonality_major
    }

    pub fn is_chord_major(&self) -> bool {
        self.chord_major
    }

    pub fn is_tonic(&self) -> bool {
        self.is_tonic
    }

    pub fn is_dominant(&self) -> bool {
        self.is_dominant
    }

    pub fn is_subdominant(&self) -> bool {
        self.is_subdominant
    }

    pub fn tonic_position(&self) -> TonicPosition {
        self.tonic_position
    }

    pub fn inversion(&self) -> Inversion {
        self.inversion
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name for the speech channel; falls back to the display name.
    pub fn speech_name(&self) -> &str {
        match &self.speech_name {
            Some(s) if !s.is_empty() => s,
            _ => &self.name,
        }
    }

    pub(crate) fn set_speech_name(&mut self, value: Option<String>) {
        self.speech_name = value;
    }

    /// Audio-asset key for this item as voiced: note atoms joined by `_`,
    /// suffixed `_ver` for simultaneous voicings.
    pub fn file_key(&self) -> String {
        let mut key = self.file_key_arpeggio();
        if self.simultaneous {
            key.push_str("_ver");
        }
        key
    }

    /// Audio-asset key for the sequential (arpeggiated) rendering,
    /// regardless of how the item itself is voiced.
    pub fn file_key_arpeggio(&self) -> String {
        let atoms: Vec<String> = self.notes.iter().map(Note::file_atom).collect();
        atoms.join("_")
    }
}

impl fmt::Display for ContentItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for note in &self.notes {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{note}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(s: &str) -> Option<Note> {
        Some(Note::parse(s).unwrap())
    }

    #[test]
    fn interval_with_missing_slot() {
        let item = ContentItem::new(ItemSpec {
            id: "i1".into(),
            cells: vec![note("C4"), None, note("G4")],
            interval_label: Some("perfect fifth".into()),
            base_chord: "c1".into(),
            ..Default::default()
        });

        assert!(item.is_interval());
        assert!(!item.is_triad());
        assert!(item.is_ascending());
        assert_eq!(item.missing_note(), Some(1));
        assert_eq!(item.name(), "perfect fifth");
        assert_eq!(item.file_key(), "c4_g4");
    }

    #[test]
    fn triad_harmonic_function_from_label() {
        let item = ContentItem::new(ItemSpec {
            id: "t1".into(),
            simultaneous: true,
            cells: vec![note("C4"), note("E4"), note("G4")],
            chord_label: Some("T5".into()),
            tonic_position: TonicPosition::Bottom,
            ..Default::default()
        });

        assert!(item.is_triad() && item.is_tonic());
        assert!(!item.is_dominant() && !item.is_subdominant());
        assert_eq!(item.file_key(), "c4_e4_g4_ver");
        assert_eq!(item.file_key_arpeggio(), "c4_e4_g4");
    }

    #[test]
    fn default_spec_has_unknown_placements() {
        let spec = ItemSpec::default();
        assert_eq!(spec.tonic_position, TonicPosition::Unknown);
        assert_eq!(spec.inversion, Inversion::Unknown);
    }

    #[test]
    fn descending_detected() {
        let item = ContentItem::new(ItemSpec {
            id: "i2".into(),
            cells: vec![note("G4"), note("C4")],
            ..Default::default()
        });
        assert!(!item.is_ascending());
    }

    #[test]
    fn speech_name_falls_back() {
        let mut item = ContentItem::new(ItemSpec {
            id: "i3".into(),
            cells: vec![note("C4"), note("E4")],
            interval_label: Some("major third".into()),
            ..Default::default()
        });
        assert_eq!(item.speech_name(), "major third");
        item.set_speech_name(Some("m+ajor th+ird".into()));
        assert_eq!(item.speech_name(), "m+ajor th+ird");
    }
}
