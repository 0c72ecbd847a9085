use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::error::MappingError;

/// Card attributes a CSV column can feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Front,
    Back,
    Deck,
    Tags,
    Notes,
}

impl Field {
    /// Inference priority order.
    pub const ALL: [Field; 5] = [Field::Front, Field::Back, Field::Deck, Field::Tags, Field::Notes];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Front => "front",
            Field::Back => "back",
            Field::Deck => "deck",
            Field::Tags => "tags",
            Field::Notes => "notes",
        }
    }

    pub fn is_required(self) -> bool {
        matches!(self, Field::Front | Field::Back)
    }

    /// Normalized header names recognised for this field.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::Front => &["front", "question", "prompt", "term", "word", "q", "card_front"],
            Field::Back => &["back", "answer", "definition", "meaning", "a", "card_back"],
            Field::Deck => &["deck", "deck_name", "collection", "folder", "category"],
            Field::Tags => &["tags", "tag", "labels", "topics"],
            Field::Notes => &["notes", "note", "hint", "hints", "extra", "explanation"],
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|f| f.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("unknown field '{s}' (expected front, back, deck, tags or notes)"))
    }
}

/// Which column (by index) feeds each field. `None` means the field is not imported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FieldMapping {
    pub front: Option<usize>,
    pub back: Option<usize>,
    pub deck: Option<usize>,
    pub tags: Option<usize>,
    pub notes: Option<usize>,
}

impl FieldMapping {
    pub fn get(&self, field: Field) -> Option<usize> {
        match field {
            Field::Front => self.front,
            Field::Back => self.back,
            Field::Deck => self.deck,
            Field::Tags => self.tags,
            Field::Notes => self.notes,
        }
    }

    pub fn set(&mut self, field: Field, column: Option<usize>) {
        let slot = match field {
            Field::Front => &mut self.front,
            Field::Back => &mut self.back,
            Field::Deck => &mut self.deck,
            Field::Tags => &mut self.tags,
            Field::Notes => &mut self.notes,
        };
        *slot = column;
    }

    /// Check the mapping against a table with `columns` columns and return the
    /// front and back column indices.
    pub fn check(&self, columns: usize) -> Result<(usize, usize), MappingError> {
        let (Some(front), Some(back)) = (self.front, self.back) else {
            return Err(MappingError::MissingRequired);
        };
        if front == back {
            return Err(MappingError::SameColumn);
        }
        for field in Field::ALL {
            if let Some(index) = self.get(field) {
                if index >= columns {
                    return Err(MappingError::ColumnOutOfRange {
                        field,
                        index,
                        columns,
                    });
                }
            }
        }
        Ok((front, back))
    }
}

/// Lowercase, join whitespace runs with `_` and drop anything that is not an
/// ASCII word character.
pub fn normalize_header(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Guess a mapping from header names.
///
/// Each field takes the first header whose normalized name is one of its
/// aliases. Front and back fall back to columns 0 and 1 when no header
/// matches and those columns exist.
pub fn infer(headers: &[String]) -> FieldMapping {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();

    let mut mapping = FieldMapping::default();
    for field in Field::ALL {
        let found = normalized
            .iter()
            .position(|h| field.aliases().contains(&h.as_str()));
        mapping.set(field, found);
    }

    if mapping.front.is_none() && !headers.is_empty() {
        mapping.front = Some(0);
    }
    if mapping.back.is_none() && headers.len() > 1 {
        mapping.back = Some(1);
    }

    debug!(?mapping, "inferred column mapping");
    mapping
}
