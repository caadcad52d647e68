//! Loaded-once content store
//!
//! Consumes a semicolon-delimited table of practice items plus an optional
//! table of speech-name overrides, and emits an immutable snapshot shared
//! read-only across all sessions. No locking is needed: the store is never
//! mutated after [`ContentStore::load`] returns.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::{info, warn};

use crate::content::item::{ContentItem, Inversion, ItemSpec, TonicPosition};
use crate::content::note::Note;
use crate::error::{Result, SolfaError};

/// Column separator of the content tables.
pub const SEP: char = ';';

/// Widest interval expected in the pool, in semitones (a major sixth).
const MAX_INTERVAL_SEMITONES: i16 = 9;

/// Immutable collection of practice items.
#[derive(Debug, Default)]
pub struct ContentStore {
    items: Vec<Arc<ContentItem>>,
}

impl ContentStore {
    /// Build a store directly from items (tests, embedded data).
    pub fn from_items(items: Vec<ContentItem>) -> Self {
        Self {
            items: items.into_iter().map(Arc::new).collect(),
        }
    }

    /// Load the item table and, when given, the speech-name override table.
    ///
    /// Override rows are keyed by lower-cased display name and map it to a
    /// TTS-friendly spelling.
    pub fn load(items_path: &Path, speech_names_path: Option<&Path>) -> Result<Self> {
        let overrides = match speech_names_path {
            Some(path) if path.is_file() => Self::load_speech_names(path)?,
            _ => HashMap::new(),
        };

        info!("Loading content table {}", items_path.display());
        let text = fs::read_to_string(items_path).map_err(|e| SolfaError::DataLoad {
            path: items_path.display().to_string(),
            source: Box::new(e),
        })?;

        let mut items = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            // header
            if line_no == 0 || line.trim().is_empty() {
                continue;
            }

            let mut item = Self::parse_row(line_no + 1, line)?;
            if let Some(tts) = overrides.get(&item.name().to_lowercase()) {
                item.set_speech_name(Some(tts.clone()));
            }

            if item.is_interval() {
                let span = i16::from(item.notes()[0].midi()) - i16::from(item.notes()[1].midi());
                if span.abs() > MAX_INTERVAL_SEMITONES {
                    warn!(
                        "Suspicious interval of {:.1} tones: {} ({})",
                        f32::from(span.abs()) / 2.0,
                        item,
                        item.id()
                    );
                }
            }

            items.push(Arc::new(item));
        }

        info!("Content table loaded, {} items", items.len());
        Ok(Self { items })
    }

    fn load_speech_names(path: &Path) -> Result<HashMap<String, String>> {
        info!("Loading speech-name table {}", path.display());
        let text = fs::read_to_string(path).map_err(|e| SolfaError::DataLoad {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;

        let mut map = HashMap::new();
        for line in text.lines().skip(1) {
            if line.trim().is_empty() {
                continue;
            }
            if let Some((name, tts)) = line.split_once(SEP) {
                if !tts.trim().is_empty() {
                    map.insert(name.trim().to_lowercase(), tts.trim().to_string());
                }
            }
        }

        info!("Speech-name table loaded, {} entries", map.len());
        Ok(map)
    }

    /// Columns: id; vertical; note_1; note_2; note_3; base_chord; chord;
    /// interval; tonality_maj; chord_maj; tonic_position; inversion.
    /// A blank note cell marks an omitted slot.
    fn parse_row(line: usize, row: &str) -> Result<ContentItem> {
        let cols: Vec<&str> = row.split(SEP).map(str::trim).collect();
        if cols.len() < 12 {
            return Err(SolfaError::ParseRow {
                line,
                reason: format!("expected 12 columns, got {}", cols.len()),
            });
        }

        let mut cells = Vec::with_capacity(3);
        for cell in &cols[2..5] {
            if cell.is_empty() {
                cells.push(None);
            } else {
                cells.push(Some(Note::parse(cell).map_err(|e| SolfaError::ParseRow {
                    line,
                    reason: e.to_string(),
                })?));
            }
        }

        let non_empty = |s: &str| {
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        };

        Ok(ContentItem::new(ItemSpec {
            id: cols[0].to_string(),
            simultaneous: parse_flag(cols[1]),
            cells,
            base_chord: cols[5].to_string(),
            chord_label: non_empty(cols[6]),
            interval_label: non_empty(cols[7]),
            tonality_major: parse_flag(cols[8]),
            chord_major: parse_flag(cols[9]),
            tonic_position: TonicPosition::parse(cols[10]),
            inversion: Inversion::parse(cols[11]),
            speech_name: None,
        }))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> &Arc<ContentItem> {
        &self.items[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ContentItem>> {
        self.items.iter()
    }

    /// Items matching a predicate, in table order.
    pub fn iter_matching<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a Arc<ContentItem>>
    where
        P: Fn(&ContentItem) -> bool + 'a,
    {
        self.items.iter().filter(move |item| predicate(item))
    }
}

fn parse_flag(cell: &str) -> bool {
    matches!(cell.to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TABLE: &str = "\
id;vertical;note_1;note_2;note_3;base_chord;chord;interval;tonality_maj;chord_maj;tonic_position;inversion
c1;0;C4;E4;G4;;T5;;1;1;bottom;root
i1;0;C4;;G4;c1;;perfect fifth;1;0;;
i2;0;G4;C4;;;;descending fourth;0;0;;
";

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[test]
    fn loads_table_with_blank_cells() {
        let file = write_temp(TABLE);
        let store = ContentStore::load(file.path(), None).unwrap();
        assert_eq!(store.len(), 3);

        let triad = store.get(0);
        assert!(triad.is_triad() && triad.is_tonic());
        assert_eq!(triad.tonic_position(), TonicPosition::Bottom);

        let interval = store.get(1);
        assert!(interval.is_interval());
        assert_eq!(interval.missing_note(), Some(1));
        assert_eq!(interval.base_chord(), "c1");

        assert_eq!(store.iter_matching(|i| i.is_interval()).count(), 2);
    }

    #[test]
    fn speech_name_overrides_apply() {
        let items = write_temp(TABLE);
        let tts = write_temp("text;tts\nperfect fifth;p+erfect f+ifth\n");

        let store = ContentStore::load(items.path(), Some(tts.path())).unwrap();
        assert_eq!(store.get(1).speech_name(), "p+erfect f+ifth");
        assert_eq!(store.get(2).speech_name(), "descending fourth");
    }

    #[test]
    fn short_row_is_rejected() {
        let items = write_temp("id;vertical\nx;1\n");
        assert!(ContentStore::load(items.path(), None).is_err());
    }
}
