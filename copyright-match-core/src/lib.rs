#![forbid(unsafe_code)]

//! Matching engine for determining the likely U.S. copyright status of
//! a bibliographic record: text normalization, an inverted index over
//! registration and renewal corpora, fuzzy field scoring, adaptive
//! score combination, and a parallel batch driver, wrapped around the
//! pure status classifier.

pub use self::model::{
    AnalyzedRecord, CopyrightStatus, CountryClass, MatchResult, NormalizedForms, Publication,
    PublicationId, ProcessingLanguage, RunStats, SourceTag,
};
pub use self::error::{MatchError, Result};
pub use self::config::Config;

pub mod cache;
pub mod combiner;
pub mod config;
pub mod derived_work;
pub mod driver;
pub mod error;
pub mod generic_title;
pub mod index;
pub mod lang;
pub mod lccn;
pub mod matcher;
pub mod model;
pub mod similarity;
pub mod status;
pub mod text;
