//! Export collaborators (§6): write analyzed records to CSV or JSON.

use std::path::Path;

use serde::Serialize;

use copyright_match_core::error::{MatchError, Result};
use copyright_match_core::model::AnalyzedRecord;

#[derive(Serialize)]
struct CsvRow {
    source_id: String,
    title: String,
    author: String,
    year: String,
    country_class: String,
    status: String,
    registration_matched_id: String,
    registration_combined_score: String,
    renewal_matched_id: String,
    renewal_combined_score: String,
    error: String,
}

fn to_row(record: &AnalyzedRecord) -> CsvRow {
    CsvRow {
        source_id: record.input.id.0.clone(),
        title: record.input.title.clone(),
        author: record.input.author.clone(),
        year: record.input.year.map(|y| y.to_string()).unwrap_or_default(),
        country_class: format!("{:?}", record.input.country_class),
        status: record.status.to_string(),
        registration_matched_id: record
            .registration_match
            .as_ref()
            .map(|m| m.reference_id.0.clone())
            .unwrap_or_default(),
        registration_combined_score: record
            .registration_match
            .as_ref()
            .map(|m| m.combined_score.to_string())
            .unwrap_or_default(),
        renewal_matched_id: record.renewal_match.as_ref().map(|m| m.reference_id.0.clone()).unwrap_or_default(),
        renewal_combined_score: record
            .renewal_match
            .as_ref()
            .map(|m| m.combined_score.to_string())
            .unwrap_or_default(),
        error: record.error.clone().unwrap_or_default(),
    }
}

/// Write one row per analyzed record, in order, to a CSV file.
pub fn write_csv(path: impl AsRef<Path>, records: &[AnalyzedRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())
        .map_err(|e| MatchError::Message(format!("cannot open CSV output: {e}")))?;

    for record in records {
        writer
            .serialize(to_row(record))
            .map_err(|e| MatchError::Message(format!("cannot write CSV row: {e}")))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the full analyzed record set as a JSON array, preserving
/// every field a CSV row would flatten away (scores, reason codes).
pub fn write_json(path: impl AsRef<Path>, records: &[AnalyzedRecord]) -> Result<()> {
    let text = serde_json::to_string_pretty(records)?;
    std::fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use copyright_match_core::model::{CopyrightStatus, CountryClass, NormalizedForms, ProcessingLanguage, Publication, PublicationId, SourceTag};

    fn sample() -> AnalyzedRecord {
        AnalyzedRecord {
            input: Publication {
                id: PublicationId::from("x1"),
                source: SourceTag::Input,
                title: "Example Title".to_string(),
                part_number: None,
                part_name: None,
                author: "Doe, Jane".to_string(),
                main_author: None,
                publisher: None,
                place: None,
                pub_date: None,
                year: Some(1950),
                full_text: None,
                country_code: None,
                country_class: CountryClass::Us,
                language_tag: None,
                processing_language: ProcessingLanguage::Eng,
                lccn: None,
                normalized: NormalizedForms::default(),
            },
            registration_match: None,
            renewal_match: None,
            status: CopyrightStatus::UndeterminedUsNoData,
            error: None,
        }
    }

    #[test]
    fn writes_csv_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&path, &[sample()]).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Example Title"));
    }

    #[test]
    fn writes_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&path, &[sample()]).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with('['));
        assert!(contents.contains("Example Title"));
    }
}
