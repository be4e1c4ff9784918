//! Paper records: the entities held by the [`PaperStore`](crate::PaperStore).
//!
//! A [`PaperRecord`] is created empty or from parsed [`CanonicalMetadata`], edited
//! in place, and refreshed by derived-field writers. Every mutating method sets
//! `updated_at`; callers editing public fields directly should call
//! [`PaperRecord::touch`] before handing the record back to the store.

use crate::derived::DerivedField;
use crate::utils::{non_blank, parse_year, split_pages};
use crate::{CanonicalMetadata, PaperError, Result};
use chrono::{DateTime, Utc};
use nanoid::nanoid;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language a paper is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ja,
    En,
}

impl Language {
    pub fn as_tag(&self) -> &'static str {
        match self {
            Language::Ja => "ja",
            Language::En => "en",
        }
    }
}

impl FromStr for Language {
    type Err = PaperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ja" => Ok(Language::Ja),
            "en" => Ok(Language::En),
            _ => Err(PaperError::UnknownLanguage(s.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Reading status of a paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperStatus {
    #[default]
    Draft,
    Reviewing,
    Ready,
    Archived,
}

impl PaperStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaperStatus::Draft => "draft",
            PaperStatus::Reviewing => "reviewing",
            PaperStatus::Ready => "ready",
            PaperStatus::Archived => "archived",
        }
    }
}

impl FromStr for PaperStatus {
    type Err = PaperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(PaperStatus::Draft),
            "reviewing" => Ok(PaperStatus::Reviewing),
            "ready" => Ok(PaperStatus::Ready),
            "archived" => Ok(PaperStatus::Archived),
            _ => Err(PaperError::UnknownStatus(s.to_string())),
        }
    }
}

impl fmt::Display for PaperStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A section of a paper, owned by exactly one [`PaperRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Section {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: String::new(),
            summary: None,
        }
    }
}

/// Start and end page, as edited in separate form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl PageRange {
    /// Split a `pages` value such as `"100-110"` or `"100--110"`.
    pub fn parse(pages: &str) -> Self {
        let (start, end) = split_pages(pages);
        Self { start, end }
    }

    /// Join back into a `pages` value: `start-end`, or whichever part is present.
    pub fn to_pages(&self) -> Option<String> {
        let start = self.start.as_deref().and_then(non_blank);
        let end = self.end.as_deref().and_then(non_blank);
        match (start, end) {
            (Some(start), Some(end)) => Some(format!("{start}-{end}")),
            (start, end) => start.or(end),
        }
    }
}

/// A paper in the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperRecord {
    id: String,
    pub title: String,
    pub language: Language,
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub tags: Vec<String>,
    pub status: PaperStatus,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_abstract: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_summary: Option<String>,
    pub sections: Vec<Section>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PaperRecord {
    /// Creates an empty draft with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: String::new(),
            language: Language::default(),
            authors: Vec::new(),
            venue: None,
            volume: None,
            issue: None,
            pages: None,
            year: None,
            tags: Vec::new(),
            status: PaperStatus::default(),
            abstract_text: String::new(),
            translated_abstract: None,
            overall_summary: None,
            sections: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates an empty draft with a freshly generated identifier.
    pub fn with_generated_id() -> Self {
        Self::new(format!("paper-{}", nanoid!()))
    }

    /// Creates a record populated from parsed citation metadata.
    ///
    /// # Errors
    ///
    /// Returns [`PaperError::InvalidFieldValue`] if the metadata's year is not a number.
    pub fn from_metadata(id: impl Into<String>, metadata: &CanonicalMetadata) -> Result<Self> {
        let mut record = Self::new(id);
        record.merge_metadata(metadata)?;
        Ok(record)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Marks the record as modified now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at);
    }

    /// Copies every field present in `metadata` onto this record.
    ///
    /// Authors and keywords replace the record's authors and tags only when
    /// non-empty. Nothing is changed if the call fails.
    ///
    /// # Errors
    ///
    /// Returns [`PaperError::InvalidFieldValue`] if the metadata's year is not a number.
    pub fn apply_metadata(&mut self, metadata: &CanonicalMetadata) -> Result<()> {
        self.merge_metadata(metadata)?;
        self.touch();
        Ok(())
    }

    fn merge_metadata(&mut self, metadata: &CanonicalMetadata) -> Result<()> {
        let year = metadata.year.as_deref().map(parse_year).transpose()?;

        if let Some(title) = &metadata.title {
            self.title.clone_from(title);
        }
        if !metadata.authors.is_empty() {
            self.authors.clone_from(&metadata.authors);
        }
        if metadata.venue.is_some() {
            self.venue.clone_from(&metadata.venue);
        }
        if metadata.volume.is_some() {
            self.volume.clone_from(&metadata.volume);
        }
        if metadata.issue.is_some() {
            self.issue.clone_from(&metadata.issue);
        }
        if let Some(pages) = &metadata.pages {
            self.set_page_range(PageRange::parse(pages));
        }
        if year.is_some() {
            self.year = year;
        }
        if let Some(abstract_text) = &metadata.abstract_text {
            self.abstract_text.clone_from(abstract_text);
        }
        if !metadata.keywords.is_empty() {
            self.tags.clone_from(&metadata.keywords);
        }
        Ok(())
    }

    /// The `pages` value split for editing.
    pub fn page_range(&self) -> PageRange {
        self.pages.as_deref().map(PageRange::parse).unwrap_or_default()
    }

    pub fn set_page_range(&mut self, range: PageRange) {
        self.pages = range.to_pages();
    }

    /// Appends an empty section titled `Section n` and returns it.
    pub fn add_section(&mut self) -> &mut Section {
        let title = format!("Section {}", self.sections.len() + 1);
        self.sections
            .push(Section::new(format!("section-{}", nanoid!()), title));
        self.touch();
        let last = self.sections.len() - 1;
        &mut self.sections[last]
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Mutable access to a section. Marks the record as modified when found.
    pub fn section_mut(&mut self, id: &str) -> Option<&mut Section> {
        let pos = self.sections.iter().position(|s| s.id == id)?;
        self.touch();
        Some(&mut self.sections[pos])
    }

    pub fn remove_section(&mut self, id: &str) -> Option<Section> {
        let pos = self.sections.iter().position(|s| s.id == id)?;
        self.touch();
        Some(self.sections.remove(pos))
    }

    /// Writes a value produced by a translation or summary collaborator.
    ///
    /// Blank text clears the field.
    ///
    /// # Errors
    ///
    /// Returns [`PaperError::SectionNotFound`] for a summary of an unknown section.
    pub fn apply_derived(&mut self, field: DerivedField) -> Result<()> {
        match field {
            DerivedField::TranslatedAbstract(text) => self.translated_abstract = non_blank(&text),
            DerivedField::OverallSummary(text) => self.overall_summary = non_blank(&text),
            DerivedField::SectionSummary {
                section_id,
                summary,
            } => {
                let section = self
                    .sections
                    .iter_mut()
                    .find(|s| s.id == section_id)
                    .ok_or(PaperError::SectionNotFound(section_id))?;
                section.summary = non_blank(&summary);
            }
        }
        self.touch();
        Ok(())
    }
}
