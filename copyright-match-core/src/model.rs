//! Core data model: [`Publication`], [`MatchResult`], and the small
//! supporting types shared across the rest of the crate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A source-scoped identifier. Wrapping the bare string prevents an ID
/// minted by one corpus from being compared against another by
/// accident.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicationId(pub String);

impl fmt::Display for PublicationId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PublicationId {
    fn from(s: &str) -> Self {
        PublicationId(s.to_string())
    }
}

impl From<String> for PublicationId {
    fn from(s: String) -> Self {
        PublicationId(s)
    }
}

/// Which of the three record streams a [`Publication`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceTag {
    Input,
    Registration,
    Renewal,
}

/// US / non-US / unknown classification for a record's country code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CountryClass {
    Us,
    NonUs,
    Unknown,
}

/// One of the five languages the normalizer and stemmer understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessingLanguage {
    Eng,
    Fre,
    Ger,
    Spa,
    Ita,
}

impl ProcessingLanguage {
    pub fn code(&self) -> &'static str {
        match self {
            ProcessingLanguage::Eng => "eng",
            ProcessingLanguage::Fre => "fre",
            ProcessingLanguage::Ger => "ger",
            ProcessingLanguage::Spa => "spa",
            ProcessingLanguage::Ita => "ita",
        }
    }
}

/// Normalized forms of a Publication's text fields, computed once at
/// ingestion and cached for the life of the record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizedForms {
    pub title: String,
    pub title_tokens: Vec<String>,
    pub author: String,
    pub publisher: String,
}

/// The universal bibliographic record: an input record to classify,
/// or a reference record from the registration or renewal corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publication {
    pub id: PublicationId,
    pub source: SourceTag,

    pub title: String,
    pub part_number: Option<String>,
    pub part_name: Option<String>,
    pub author: String,
    pub main_author: Option<String>,
    pub publisher: Option<String>,
    pub place: Option<String>,
    pub pub_date: Option<String>,
    pub year: Option<i32>,
    pub full_text: Option<String>,

    pub country_code: Option<String>,
    pub country_class: CountryClass,
    pub language_tag: Option<String>,
    pub processing_language: ProcessingLanguage,

    pub lccn: Option<String>,

    pub normalized: NormalizedForms,
}

impl Publication {
    /// True if this record carries enough publisher evidence for the
    /// score combiner to treat publisher as a "present" field (§4.8):
    /// either a non-empty publisher string, or (for renewals) a
    /// non-empty full_text blob to search.
    pub fn has_publisher_evidence(&self) -> bool {
        self.publisher.as_deref().is_some_and(|p| !p.is_empty())
            || self.full_text.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Per-field similarity scores plus bookkeeping flags attached to an
/// input Publication when a candidate reference record is selected as
/// its best match in a given corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub reference_id: PublicationId,
    pub matched_title: String,
    pub matched_author: String,
    pub matched_publisher: Option<String>,
    pub reference_year: Option<i32>,
    pub year_difference: Option<i32>,

    pub title_score: f64,
    pub author_score: f64,
    pub publisher_score: f64,
    pub combined_score: f64,

    pub has_generic_title: bool,
    pub derived_work_penalty_applied: bool,
    pub matched_via_lccn: bool,

    pub reason_codes: Vec<String>,
}

/// The final copyright-status label, derived mechanically from match
/// outcomes, country, and year (§4.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CopyrightStatus {
    PdPreThreshold,
    PdUsNoRenewal,
    PdUsRegNoRenewal,
    InCopyright,
    UndeterminedUsNoData,
    UndeterminedCountryUnknown,
    ResearchRequired,
}

impl fmt::Display for CopyrightStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            CopyrightStatus::PdPreThreshold => "PD_pre_threshold",
            CopyrightStatus::PdUsNoRenewal => "PD_us_no_renewal",
            CopyrightStatus::PdUsRegNoRenewal => "PD_us_reg_no_renewal",
            CopyrightStatus::InCopyright => "in_copyright",
            CopyrightStatus::UndeterminedUsNoData => "undetermined_us_no_data",
            CopyrightStatus::UndeterminedCountryUnknown => "undetermined_country_unknown",
            CopyrightStatus::ResearchRequired => "research_required",
        };
        write!(f, "{s}")
    }
}

/// The outcome for a single input Publication: its matches (if any) in
/// each reference corpus, and the derived status label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzedRecord {
    pub input: Publication,
    pub registration_match: Option<MatchResult>,
    pub renewal_match: Option<MatchResult>,
    pub status: CopyrightStatus,
    pub error: Option<String>,
}

/// Aggregate counters assembled by the batch driver and reported by
/// the CLI at the end of a run (§7's "final summary").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub total_input: u64,
    pub records_analyzed: u64,
    pub records_skipped: u64,
    pub registration_matches: u64,
    pub renewal_matches: u64,
    pub errors: u64,
    pub elapsed_ms: u64,
}
