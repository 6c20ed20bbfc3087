use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::question::Question;

/// A titled group of questions shown as one screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Section {
    pub title: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Top-level schema document: an ordered list of sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormSchema {
    pub sections: Vec<Section>,
}

impl FormSchema {
    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.sections.len().saturating_sub(1)
    }

    /// Iterates every question in declaration order across all sections.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.sections
            .iter()
            .flat_map(|section| section.questions.iter())
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions().find(|question| question.id == id)
    }
}
