use criterion::{criterion_group, criterion_main, Criterion};

use copyright_match_core::config::Wordlists;
use copyright_match_core::index::{generate_title_keys, Index, Query};
use copyright_match_core::model::{
    CountryClass, NormalizedForms, ProcessingLanguage, Publication, PublicationId, SourceTag,
};
use copyright_match_core::text::TextNormalizer;

fn build_index(normalizer: &TextNormalizer, size: usize) -> (Index, Vec<Publication>) {
    let mut index = Index::new();
    let mut publications = Vec::with_capacity(size);

    for i in 0..size {
        let publication = Publication {
            id: PublicationId::from(format!("ref-{i}")),
            source: SourceTag::Registration,
            title: format!("The Collected Works of Author Number {i}"),
            part_number: None,
            part_name: None,
            author: format!("Author, Number {i}"),
            main_author: None,
            publisher: Some("Example Publishing House".to_string()),
            place: None,
            pub_date: None,
            year: Some(1900 + (i % 80) as i32),
            full_text: None,
            country_code: None,
            country_class: CountryClass::Us,
            language_tag: None,
            processing_language: ProcessingLanguage::Eng,
            lccn: None,
            normalized: NormalizedForms::default(),
        };
        index.add_publication(i as u32, &publication, normalizer);
        publications.push(publication);
    }

    (index, publications)
}

pub fn index_lookup_benchmark(c: &mut Criterion) {
    let normalizer = TextNormalizer::new(&Wordlists::embedded().unwrap()).unwrap();
    let (index, _publications) = build_index(&normalizer, 10_000);

    let title_keys = generate_title_keys("The Collected Works of Author Number 4242", ProcessingLanguage::Eng, &normalizer);
    let query = Query {
        title_keys,
        author_keys: vec!["author".to_string(), "number".to_string()],
        publisher_keys: vec!["example".to_string(), "publishing".to_string()],
        year: Some(1942),
        lccn: None,
    };

    c.bench_function("index_candidates_10k", |b| {
        b.iter(|| {
            let candidates = index.candidates(&query, 1);
            assert!(!candidates.is_empty());
        })
    });
}

criterion_group!(benches, index_lookup_benchmark);
criterion_main!(benches);
