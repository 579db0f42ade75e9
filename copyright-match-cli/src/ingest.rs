//! Ingestion collaborators (§6): turn MARC-shaped XML and delimited
//! reference corpora into [`Publication`] records.
//!
//! Grounded in `marctk::xml::XmlRecordIterator`/`Record::from_xml_file`
//! for the MARC side, and in `csv::ReaderBuilder` (tab-delimited, per
//! `kcls`'s own `student-importer` use of the `csv` crate) for the two
//! reference corpora.
//!
//! A malformed XML record or a malformed TSV row is never fatal to the
//! run (§7 "Ingestion errors"): it is logged and skipped, and ingestion
//! continues with the next record.

use std::path::Path;

use log::warn;
use marctk::Record;

use copyright_match_core::lang::{resolve_country, resolve_language};
use copyright_match_core::model::{
    CountryClass, NormalizedForms, Publication, PublicationId, SourceTag,
};

/// Pull a 4-digit year out of free-text `pub_date`, preferring the
/// first plausible 19xx/20xx run.
fn extract_year(text: &str) -> Option<i32> {
    let digits: Vec<char> = text.chars().collect();
    for window_start in 0..digits.len() {
        if window_start + 4 > digits.len() {
            break;
        }
        let candidate: String = digits[window_start..window_start + 4].iter().collect();
        if candidate.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(year) = candidate.parse::<i32>() {
                if (1500..=2100).contains(&year) {
                    return Some(year);
                }
            }
        }
    }
    None
}

fn marc_record_to_publication(record: &Record, source_id: String) -> Option<Publication> {
    let title_245a = record.get_field_values("245", "a").join(" ");
    let title_245b = record.get_field_values("245", "b").join(" ");
    let title = format!("{title_245a} {title_245b}").trim().to_string();
    if title.is_empty() {
        return None;
    }

    let part_number = record.get_field_values("245", "n").first().map(|s| s.to_string());
    let part_name = record.get_field_values("245", "p").first().map(|s| s.to_string());

    let author = record.get_field_values("245", "c").join(" ");
    let main_author = record
        .get_fields("100")
        .into_iter()
        .chain(record.get_fields("110"))
        .chain(record.get_fields("111"))
        .next()
        .map(|f| f.subfields().iter().map(|sf| sf.content()).collect::<Vec<_>>().join(" "));

    let publisher = record.get_field_values("264", "b").first().or_else(|| record.get_field_values("260", "b").first()).map(|s| s.trim_end_matches([',', '.']).to_string());
    let place = record.get_field_values("264", "a").first().or_else(|| record.get_field_values("260", "a").first()).map(|s| s.trim_end_matches([':', ' ']).to_string());
    let pub_date = record.get_field_values("264", "c").first().or_else(|| record.get_field_values("260", "c").first()).map(|s| s.to_string());

    let lccn = record.get_field_values("010", "a").first().map(|s| s.trim().to_string());

    let control_008 = record.get_control_fields("008").first().map(|cf| cf.content().to_string()).unwrap_or_default();
    let (country_code, country_class) = resolve_country(&control_008);

    let language_code = if control_008.chars().count() >= 38 {
        control_008.chars().skip(35).take(3).collect::<String>()
    } else {
        String::new()
    };
    let (processing_language, _) = resolve_language(&language_code);

    let year = pub_date.as_deref().and_then(extract_year).or_else(|| {
        if control_008.len() >= 11 {
            extract_year(&control_008[7..11])
        } else {
            None
        }
    });

    Some(Publication {
        id: PublicationId::from(source_id),
        source: SourceTag::Input,
        title,
        part_number,
        part_name,
        author,
        main_author,
        publisher,
        place,
        pub_date,
        year,
        full_text: None,
        country_code,
        country_class,
        language_tag: if language_code.is_empty() { None } else { Some(language_code) },
        processing_language,
        lccn,
        normalized: NormalizedForms::default(),
    })
}

/// Read a MARC XML file as a stream of input Publications. Records
/// with no usable title, or that fail to parse, are logged and
/// skipped rather than aborting the run.
pub fn read_marc_xml_input(path: impl AsRef<Path>) -> Vec<Publication> {
    let path = path.as_ref();
    let iterator = match Record::from_xml_file(&path.to_string_lossy()) {
        Ok(iter) => iter,
        Err(e) => {
            warn!("cannot read MARC XML input {}: {e}", path.display());
            return Vec::new();
        }
    };

    let mut out = Vec::new();
    for (i, record_result) in iterator.enumerate() {
        match record_result {
            Ok(record) => match marc_record_to_publication(&record, format!("input-{i}")) {
                Some(publication) => out.push(publication),
                None => warn!("skipping record {i}: no usable title"),
            },
            Err(e) => warn!("skipping malformed MARC XML record {i}: {e}"),
        }
    }
    out
}

fn read_tsv(path: &Path) -> Vec<std::collections::HashMap<String, String>> {
    let mut reader = match csv::ReaderBuilder::new().delimiter(b'\t').from_path(path) {
        Ok(r) => r,
        Err(e) => {
            warn!("cannot open reference corpus {}: {e}", path.display());
            return Vec::new();
        }
    };

    let headers = match reader.headers() {
        Ok(h) => h.clone(),
        Err(e) => {
            warn!("cannot read header row of {}: {e}", path.display());
            return Vec::new();
        }
    };

    let mut rows = Vec::new();
    for (i, record_result) in reader.records().enumerate() {
        match record_result {
            Ok(record) => {
                let row: std::collections::HashMap<String, String> = headers
                    .iter()
                    .zip(record.iter())
                    .map(|(h, v)| (h.to_string(), v.to_string()))
                    .collect();
                rows.push(row);
            }
            Err(e) => warn!("skipping malformed row {i} in {}: {e}", path.display()),
        }
    }
    rows
}

/// Read the registration corpus: tab-delimited, with a header row
/// naming at least `source_id`, `title`, `author`, `publisher`,
/// `place`, `lccn`, `pub_date`. An optional `volume` column is
/// concatenated onto `title` (§6: "title with optional volume text
/// concatenated").
pub fn read_registration_tsv(path: impl AsRef<Path>) -> Vec<Publication> {
    read_tsv(path.as_ref())
        .into_iter()
        .filter_map(|row| {
            let base_title = row.get("title").cloned().unwrap_or_default();
            let title = match row.get("volume") {
                Some(vol) if !vol.is_empty() => format!("{base_title} {vol}"),
                _ => base_title,
            };
            if title.trim().is_empty() {
                return None;
            }

            let pub_date = row.get("pub_date").cloned();
            let year = pub_date.as_deref().and_then(extract_year);

            Some(Publication {
                id: PublicationId::from(row.get("source_id").cloned().unwrap_or_default()),
                source: SourceTag::Registration,
                title,
                part_number: None,
                part_name: None,
                author: row.get("author").cloned().unwrap_or_default(),
                main_author: None,
                publisher: row.get("publisher").cloned().filter(|s| !s.is_empty()),
                place: row.get("place").cloned().filter(|s| !s.is_empty()),
                pub_date,
                year,
                full_text: None,
                country_code: None,
                country_class: CountryClass::Unknown,
                language_tag: None,
                processing_language: copyright_match_core::model::ProcessingLanguage::Eng,
                lccn: row.get("lccn").cloned().filter(|s| !s.is_empty()),
                normalized: NormalizedForms::default(),
            })
        })
        .collect()
}

/// Read the renewal corpus: tab-delimited, with a header row naming at
/// least `source_id`, `title`, `author`, `pub_date`, `full_text`. An
/// optional `volume` column exists but is never concatenated into
/// title for renewals (§6).
pub fn read_renewal_tsv(path: impl AsRef<Path>) -> Vec<Publication> {
    read_tsv(path.as_ref())
        .into_iter()
        .filter_map(|row| {
            let title = row.get("title").cloned().unwrap_or_default();
            if title.trim().is_empty() {
                return None;
            }

            let pub_date = row.get("pub_date").cloned();
            let year = pub_date.as_deref().and_then(extract_year);

            Some(Publication {
                id: PublicationId::from(row.get("source_id").cloned().unwrap_or_default()),
                source: SourceTag::Renewal,
                title,
                part_number: None,
                part_name: None,
                author: row.get("author").cloned().unwrap_or_default(),
                main_author: None,
                publisher: None,
                place: None,
                pub_date,
                year,
                full_text: row.get("full_text").cloned().filter(|s| !s.is_empty()),
                country_code: None,
                country_class: CountryClass::Unknown,
                language_tag: None,
                processing_language: copyright_match_core::model::ProcessingLanguage::Eng,
                lccn: None,
                normalized: NormalizedForms::default(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn extracts_year_from_free_text() {
        assert_eq!(extract_year("c1950."), Some(1950));
        assert_eq!(extract_year("copyright 2001 by the author"), Some(2001));
        assert_eq!(extract_year("no year here"), None);
    }

    #[test]
    fn reads_marc_xml_input_record() {
        let xml = r#"<collection>
            <record xmlns="http://www.loc.gov/MARC21/slim">
                <controlfield tag="008">000000s1892    nyu                 eng  </controlfield>
                <datafield tag="245" ind1="1" ind2="0">
                    <subfield code="a">The adventures of Sherlock Holmes</subfield>
                    <subfield code="c">by Arthur Conan Doyle.</subfield>
                </datafield>
                <datafield tag="100" ind1="1" ind2=" ">
                    <subfield code="a">Doyle, Arthur Conan.</subfield>
                </datafield>
                <datafield tag="260" ind1=" " ind2=" ">
                    <subfield code="a">New York :</subfield>
                    <subfield code="b">Harper,</subfield>
                    <subfield code="c">1892.</subfield>
                </datafield>
            </record>
        </collection>"#;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{xml}").unwrap();

        let publications = read_marc_xml_input(file.path());
        assert_eq!(publications.len(), 1);
        assert!(publications[0].title.contains("Sherlock Holmes"));
        assert_eq!(publications[0].year, Some(1892));
    }

    #[test]
    fn reads_registration_tsv_with_volume_concatenation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "source_id\ttitle\tvolume\tauthor\tpublisher\tplace\tlccn\tpub_date").unwrap();
        writeln!(file, "R1\tCollected Works\tv.2\tSmith, Jane\tExample House\tBoston\tn50-123\t1950").unwrap();
        file.flush().unwrap();

        let publications = read_registration_tsv(file.path());
        assert_eq!(publications.len(), 1);
        assert_eq!(publications[0].title, "Collected Works v.2");
        assert_eq!(publications[0].year, Some(1950));
    }

    #[test]
    fn reads_renewal_tsv_without_volume_concatenation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "source_id\ttitle\tauthor\tpub_date\tfull_text").unwrap();
        writeln!(file, "REN1\tCollected Works\tSmith, Jane\t1950\tRenewed by Example House, Boston").unwrap();
        file.flush().unwrap();

        let publications = read_renewal_tsv(file.path());
        assert_eq!(publications.len(), 1);
        assert_eq!(publications[0].title, "Collected Works");
        assert!(publications[0].full_text.as_deref().unwrap().contains("Example House"));
    }
}
