//! `copyright-match`: a single CLI surface over `copyright-match-core`,
//! in the flag-parsing style of the pack's `marc-converter` and
//! `eg-parallel-ingest` binaries (`getopts::Options`, a static
//! `HELP_TEXT` constant, a `--help` flag printing it on demand).

mod export;
mod ingest;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use log::{error, info};

use copyright_match_core::cache::{self, ArtifactKind, Cache};
use copyright_match_core::config::{Config, OutputFormat};
use copyright_match_core::driver::BatchDriver;
use copyright_match_core::generic_title;
use copyright_match_core::index::Index;
use copyright_match_core::model::Publication;
use copyright_match_core::text::TextNormalizer;

const HELP_TEXT: &str = r#"
Determines the likely U.S. copyright status of bibliographic records
against registration and renewal reference corpora.

Usage:

    copyright-match --input records.xml --registration reg.tsv --renewal ren.tsv

Options:

    --config PATH           TOML configuration file (defaults compiled in)
    --input PATH             MARC XML input file (required)
    --registration PATH      Registration reference corpus, TSV (required)
    --renewal PATH           Renewal reference corpus, TSV (required)
    --output PATH            Output file path (default: results.csv)
    --format FORMAT          csv or json (default: csv)
    --us-only                Skip matching for records classified non-US
    --score-everything        Bypass threshold gates, score every candidate
    --ground-truth            Ground-truth analysis mode
    --cache-dir PATH         On-disk cache directory
    --force-refresh           Ignore any cached indices/corpora
    --disable-cache           Do not read or write the on-disk cache
    --clear-cache             Delete the cache directory and exit
    --max-workers N           Override the worker pool size
    -v, --verbose             Enable debug logging
    -h, --help                Show this help text
"#;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let mut opts = getopts::Options::new();

    opts.optopt("", "config", "", "PATH");
    opts.optopt("", "input", "", "PATH");
    opts.optopt("", "registration", "", "PATH");
    opts.optopt("", "renewal", "", "PATH");
    opts.optopt("", "output", "", "PATH");
    opts.optopt("", "format", "", "FORMAT");
    opts.optopt("", "cache-dir", "", "PATH");
    opts.optopt("", "max-workers", "", "N");
    opts.optflag("", "us-only", "");
    opts.optflag("", "score-everything", "");
    opts.optflag("", "ground-truth", "");
    opts.optflag("", "force-refresh", "");
    opts.optflag("", "disable-cache", "");
    opts.optflag("", "clear-cache", "");
    opts.optflag("v", "verbose", "");
    opts.optflag("h", "help", "");

    let params = match opts.parse(&args[1..]) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{e}\n{HELP_TEXT}");
            return ExitCode::FAILURE;
        }
    };

    if params.opt_present("help") {
        println!("{HELP_TEXT}");
        return ExitCode::SUCCESS;
    }

    if params.opt_present("verbose") {
        env_logger::Builder::from_default_env().filter_level(log::LevelFilter::Debug).init();
    } else {
        env_logger::init();
    }

    let mut config = match params.opt_str("config") {
        Some(path) => match Config::load(&path) {
            Ok(c) => c,
            Err(e) => {
                error!("configuration error: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => match Config::default_config() {
            Ok(c) => c,
            Err(e) => {
                error!("configuration error: {e}");
                return ExitCode::FAILURE;
            }
        },
    };

    config.analysis.us_only = config.analysis.us_only || params.opt_present("us-only");
    config.analysis.score_everything = config.analysis.score_everything || params.opt_present("score-everything");
    config.analysis.ground_truth_mode = config.analysis.ground_truth_mode || params.opt_present("ground-truth");
    config.cache.force_refresh = config.cache.force_refresh || params.opt_present("force-refresh");
    config.cache.disable_cache = config.cache.disable_cache || params.opt_present("disable-cache");
    if let Some(dir) = params.opt_str("cache-dir") {
        config.cache.cache_dir = PathBuf::from(dir);
    }
    if let Some(n) = params.opt_str("max-workers") {
        match n.parse::<usize>() {
            Ok(n) => config.processing.max_workers = Some(n),
            Err(_) => {
                error!("--max-workers must be a positive integer");
                return ExitCode::FAILURE;
            }
        }
    }
    if let Some(path) = params.opt_str("output") {
        config.output.output_path = PathBuf::from(path);
    }
    if let Some(format) = params.opt_str("format") {
        config.output.formats = match format.as_str() {
            "json" => vec![OutputFormat::Json],
            "csv" => vec![OutputFormat::Csv],
            other => {
                error!("unsupported --format {other}; expected csv or json");
                return ExitCode::FAILURE;
            }
        };
    }

    let cache = Cache::new(&config.cache);

    if params.opt_present("clear-cache") {
        if let Err(e) = cache.clear_all() {
            error!("cannot clear cache: {e}");
            return ExitCode::FAILURE;
        }
        info!("cache cleared at {}", config.cache.cache_dir.display());
        return ExitCode::SUCCESS;
    }

    let (Some(input_path), Some(registration_path), Some(renewal_path)) =
        (params.opt_str("input"), params.opt_str("registration"), params.opt_str("renewal"))
    else {
        eprintln!("--input, --registration, and --renewal are all required\n{HELP_TEXT}");
        return ExitCode::FAILURE;
    };

    run(config, &cache, &input_path, &registration_path, &renewal_path)
}

fn run(config: Config, cache: &Cache, input_path: &str, registration_path: &str, renewal_path: &str) -> ExitCode {
    let normalizer = match TextNormalizer::new(&config.wordlists) {
        Ok(n) => Arc::new(n),
        Err(e) => {
            error!("cannot build text normalizer: {e}");
            return ExitCode::FAILURE;
        }
    };

    let config_fp = cache::config_fingerprint(&format!("{:?}", config.scoring.lccn_floor));

    let registration: Vec<Publication> = load_corpus(
        cache,
        ArtifactKind::ParsedRegistration,
        registration_path,
        &config_fp,
        || ingest::read_registration_tsv(registration_path),
    );
    let renewal: Vec<Publication> = load_corpus(cache, ArtifactKind::ParsedRenewal, renewal_path, &config_fp, || {
        ingest::read_renewal_tsv(renewal_path)
    });

    info!("loaded {} registration records, {} renewal records", registration.len(), renewal.len());

    let mut generic_titles = generic_title::from_patterns(&config.generic_title, &config.wordlists.generic_title_patterns);
    for publication in registration.iter().chain(renewal.iter()) {
        generic_titles.add_title(&publication.title);
    }

    let mut registration_index = Index::new();
    for (i, publication) in registration.iter().enumerate() {
        registration_index.add_publication(i as u32, publication, &normalizer);
    }
    let mut renewal_index = Index::new();
    for (i, publication) in renewal.iter().enumerate() {
        renewal_index.add_publication(i as u32, publication, &normalizer);
    }

    let inputs = ingest::read_marc_xml_input(input_path);
    info!("loaded {} input records from {input_path}", inputs.len());

    let driver = BatchDriver::new(
        Arc::new(config.clone()),
        normalizer,
        Arc::new(registration),
        Arc::new(registration_index),
        Arc::new(renewal),
        Arc::new(renewal_index),
        generic_titles,
    );

    let cancel = AtomicBool::new(false);
    let (results, stats) = driver.run(inputs, &cancel);

    info!(
        "run complete: {} input, {} analyzed, {} skipped, {} registration matches, {} renewal matches, {} errors, {}ms",
        stats.total_input,
        stats.records_analyzed,
        stats.records_skipped,
        stats.registration_matches,
        stats.renewal_matches,
        stats.errors,
        stats.elapsed_ms,
    );

    for format in &config.output.formats {
        let result = match format {
            OutputFormat::Csv => export::write_csv(&config.output.output_path, &results),
            OutputFormat::Json => export::write_json(&config.output.output_path, &results),
            OutputFormat::Xlsx | OutputFormat::Html => {
                error!("{format:?} output is not implemented by this CLI");
                continue;
            }
        };
        if let Err(e) = result {
            error!("cannot write output: {e}");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}

fn load_corpus(
    cache: &Cache,
    kind: ArtifactKind,
    path: &str,
    config_fingerprint: &str,
    load: impl FnOnce() -> Vec<Publication>,
) -> Vec<Publication> {
    let sources = vec![PathBuf::from(path)];
    if let Some(cached) = cache.load::<Vec<Publication>>(kind, path, &sources, config_fingerprint) {
        return cached;
    }
    let parsed = load();
    cache.store(kind, path, &sources, config_fingerprint, &parsed);
    parsed
}
