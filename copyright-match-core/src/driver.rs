//! Batch driver (§4.10): run every input [`Publication`] through the
//! matching engine across both reference corpora, in parallel.
//!
//! Modeled directly on the teacher's own
//! `evergreen/src/bin/eg-parallel-ingest.rs`: a `ThreadPool` drains a
//! work list in fixed-size batches, each batch is moved into
//! `pool.execute`, and `pool.join()` is called periodically once the
//! queue grows past a multiple of the batch size so cloned closure
//! state doesn't pile up in memory ahead of the workers. Results come
//! back over an `mpsc` channel tagged with their batch index so the
//! driver can restore input order without needing the batches to
//! finish in order.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use sysinfo::{Pid, System};
use threadpool::ThreadPool;

use crate::config::Config;
use crate::generic_title::GenericTitleDetector;
use crate::index::Index;
use crate::matcher::MatchingEngine;
use crate::model::{AnalyzedRecord, CountryClass, Publication, RunStats};
use crate::status;
use crate::text::TextNormalizer;

/// The read-only handles one batch driver run needs, shared across
/// worker threads without copying (§4.10's "reference corpora and
/// indices are read-only and shared").
pub struct BatchDriver {
    config: Arc<Config>,
    normalizer: Arc<TextNormalizer>,
    registration: Arc<Vec<Publication>>,
    registration_index: Arc<Index>,
    renewal: Arc<Vec<Publication>>,
    renewal_index: Arc<Index>,
    generic_titles: GenericTitleDetector,
}

impl BatchDriver {
    pub fn new(
        config: Arc<Config>,
        normalizer: Arc<TextNormalizer>,
        registration: Arc<Vec<Publication>>,
        registration_index: Arc<Index>,
        renewal: Arc<Vec<Publication>>,
        renewal_index: Arc<Index>,
        generic_titles: GenericTitleDetector,
    ) -> Self {
        BatchDriver {
            config,
            normalizer,
            registration,
            registration_index,
            renewal,
            renewal_index,
            generic_titles,
        }
    }

    /// Run every input record through the matching engine, using
    /// `cancel` as a cooperative stop signal checked at batch
    /// boundaries: a run already in flight always finishes its current
    /// batches, it just stops dispatching new ones.
    ///
    /// In streaming mode (`config.processing.streaming_mode`), each
    /// worker spills its finished batch to `temp_dir` instead of
    /// handing the records back over the channel, so the driver never
    /// holds more than one batch's worth of results in memory at a
    /// time during the final merge — the original's "chunks spilled to
    /// a temp directory and merged at the end" (§4.10).
    pub fn run(&self, mut inputs: Vec<Publication>, cancel: &AtomicBool) -> (Vec<AnalyzedRecord>, RunStats) {
        let started = Instant::now();
        let total_input = inputs.len() as u64;

        let batch_size = self.config.processing.batch_size.max(1);
        let worker_count = self.config.worker_count();
        let streaming = self.config.processing.streaming_mode;
        let temp_dir = self.config.processing.temp_dir.clone();
        let run_id = std::process::id();
        let pool = ThreadPool::new(worker_count);
        let (tx, rx) = mpsc::channel::<(usize, ChunkPayload)>();

        let mut memory_monitor = MemoryMonitor::new(
            Duration::from_secs(self.config.processing.memory_check_interval_secs.max(1)),
            self.config.processing.memory_warning_threshold_gb,
        );

        info!(
            "batch driver starting: {total_input} records, {worker_count} workers, batch size {batch_size}, streaming={streaming}"
        );

        let mut chunk_index = 0usize;
        let mut dispatched = 0usize;

        while !inputs.is_empty() {
            if cancel.load(Ordering::Relaxed) {
                warn!("batch driver cancelled after dispatching {dispatched} records");
                break;
            }

            let end = inputs.len().min(batch_size);
            let batch: Vec<Publication> = inputs.drain(0..end).collect();
            dispatched += batch.len();

            let config = Arc::clone(&self.config);
            let normalizer = Arc::clone(&self.normalizer);
            let registration = Arc::clone(&self.registration);
            let registration_index = Arc::clone(&self.registration_index);
            let renewal = Arc::clone(&self.renewal);
            let renewal_index = Arc::clone(&self.renewal_index);
            let mut generic_titles = self.generic_titles.clone();
            let tx = tx.clone();
            let index = chunk_index;
            let chunk_temp_dir = temp_dir.clone();

            pool.execute(move || {
                let engine = MatchingEngine::new(&normalizer, &config);
                let results: Vec<AnalyzedRecord> = batch
                    .into_iter()
                    .map(|input| {
                        analyze_one(&engine, &config, &input, &registration, &registration_index, &renewal, &renewal_index, &mut generic_titles)
                    })
                    .collect();

                let payload = if streaming {
                    match spill_chunk(&chunk_temp_dir, run_id, index, &results) {
                        Ok(path) => ChunkPayload::Spilled(path),
                        Err(e) => {
                            warn!("batch {index}: failed to spill to {}: {e}, keeping in memory", chunk_temp_dir.display());
                            ChunkPayload::InMemory(results)
                        }
                    }
                } else {
                    ChunkPayload::InMemory(results)
                };

                // Ignore a disconnected receiver: the main thread only
                // drops it after every chunk has been drained.
                let _ = tx.send((index, payload));
            });

            chunk_index += 1;

            if pool.queued_count() > batch_size * 2 {
                pool.join();
            }

            memory_monitor.check_if_due();
        }

        drop(tx);
        pool.join();

        let mut chunks: Vec<Option<ChunkPayload>> = (0..chunk_index).map(|_| None).collect();
        for (index, payload) in rx.iter() {
            chunks[index] = Some(payload);
        }

        let mut out = Vec::with_capacity(dispatched);
        for chunk in chunks.into_iter().flatten() {
            match chunk {
                ChunkPayload::InMemory(results) => out.extend(results),
                ChunkPayload::Spilled(path) => {
                    match load_spilled_chunk(&path) {
                        Ok(results) => out.extend(results),
                        Err(e) => warn!("failed to read spilled batch {}: {e}", path.display()),
                    }
                    let _ = fs::remove_file(&path);
                }
            }
        }

        memory_monitor.check_if_due();
        let stats = summarize(total_input, &out, started);
        debug!("batch driver finished: {stats:?}");
        (out, stats)
    }
}

/// A finished batch, either held in memory or already written to disk
/// (streaming mode).
enum ChunkPayload {
    InMemory(Vec<AnalyzedRecord>),
    Spilled(PathBuf),
}

fn spill_chunk(
    temp_dir: &Path,
    run_id: u32,
    chunk_index: usize,
    results: &[AnalyzedRecord],
) -> Result<PathBuf, String> {
    fs::create_dir_all(temp_dir).map_err(|e| e.to_string())?;
    let path = temp_dir.join(format!("copyright-match-chunk-{run_id}-{chunk_index:08}.json"));
    let file = fs::File::create(&path).map_err(|e| e.to_string())?;
    serde_json::to_writer(file, results).map_err(|e| e.to_string())?;
    Ok(path)
}

fn load_spilled_chunk(path: &Path) -> Result<Vec<AnalyzedRecord>, String> {
    let file = fs::File::open(path).map_err(|e| e.to_string())?;
    serde_json::from_reader(file).map_err(|e| e.to_string())
}

/// Samples process RSS at a configurable interval and logs a warning
/// when it crosses a threshold (§4.10), standing in for the original's
/// `psutil`-based `MemoryMonitor` with `sysinfo`.
struct MemoryMonitor {
    system: System,
    pid: Pid,
    last_check: Instant,
    check_interval: Duration,
    warning_threshold_gb: f64,
    peak_gb: f64,
}

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

impl MemoryMonitor {
    fn new(check_interval: Duration, warning_threshold_gb: f64) -> Self {
        MemoryMonitor {
            system: System::new(),
            pid: Pid::from_u32(std::process::id()),
            last_check: Instant::now(),
            check_interval,
            warning_threshold_gb,
            peak_gb: 0.0,
        }
    }

    fn check_if_due(&mut self) {
        if self.last_check.elapsed() < self.check_interval {
            return;
        }
        self.last_check = Instant::now();
        self.system.refresh_all();
        let Some(process) = self.system.process(self.pid) else { return };

        let current_gb = process.memory() as f64 / BYTES_PER_GB;
        self.peak_gb = self.peak_gb.max(current_gb);
        debug!("memory usage: {current_gb:.2}GB process, peak {:.2}GB", self.peak_gb);

        if current_gb > self.warning_threshold_gb {
            warn!(
                "high memory usage detected: {current_gb:.2}GB exceeds configured threshold {:.2}GB; consider enabling streaming_mode",
                self.warning_threshold_gb
            );
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn analyze_one(
    engine: &MatchingEngine<'_>,
    config: &Config,
    input: &Publication,
    registration: &[Publication],
    registration_index: &Index,
    renewal: &[Publication],
    renewal_index: &Index,
    generic_titles: &mut GenericTitleDetector,
) -> AnalyzedRecord {
    if input.title.is_empty() {
        return AnalyzedRecord {
            input: input.clone(),
            registration_match: None,
            renewal_match: None,
            status: status::classify(None, None, input.country_class, input.year, config),
            error: Some("record has no title; skipped".to_string()),
        };
    }

    if config.analysis.us_only && input.country_class != CountryClass::Us {
        return AnalyzedRecord {
            input: input.clone(),
            registration_match: None,
            renewal_match: None,
            status: status::classify(None, None, input.country_class, input.year, config),
            error: None,
        };
    }

    let registration_match = engine.find_best(input, registration, registration_index, generic_titles);
    let renewal_match = engine.find_best(input, renewal, renewal_index, generic_titles);
    let status = status::classify(registration_match.as_ref(), renewal_match.as_ref(), input.country_class, input.year, config);

    AnalyzedRecord {
        input: input.clone(),
        registration_match,
        renewal_match,
        status,
        error: None,
    }
}

fn summarize(total_input: u64, results: &[AnalyzedRecord], started: Instant) -> RunStats {
    let mut stats = RunStats {
        total_input,
        elapsed_ms: started.elapsed().as_millis() as u64,
        ..RunStats::default()
    };

    for record in results {
        if record.error.is_some() {
            stats.records_skipped += 1;
            continue;
        }
        stats.records_analyzed += 1;
        if record.registration_match.is_some() {
            stats.registration_matches += 1;
        }
        if record.renewal_match.is_some() {
            stats.renewal_matches += 1;
        }
    }
    stats.errors = total_input.saturating_sub(stats.records_analyzed + stats.records_skipped);

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::generic_title::from_patterns;
    use crate::model::{CountryClass, NormalizedForms, ProcessingLanguage, PublicationId, SourceTag};
    use crate::text::TextNormalizer;

    fn make_pub(id: &str, title: &str, year: i32) -> Publication {
        Publication {
            id: PublicationId::from(id),
            source: SourceTag::Input,
            title: title.to_string(),
            part_number: None,
            part_name: None,
            author: "Doyle, Arthur Conan".to_string(),
            main_author: None,
            publisher: None,
            place: None,
            pub_date: None,
            year: Some(year),
            full_text: None,
            country_code: Some("xxu".to_string()),
            country_class: CountryClass::Us,
            language_tag: None,
            processing_language: ProcessingLanguage::Eng,
            lccn: None,
            normalized: NormalizedForms::default(),
        }
    }

    fn driver_with(mut config: Config) -> (BatchDriver, Vec<Publication>) {
        config.processing.batch_size = 1;
        let config = Arc::new(config);
        let normalizer = Arc::new(TextNormalizer::new(&config.wordlists).unwrap());

        let registration = vec![make_pub("r1", "Sherlock Holmes", 1892)];
        let mut registration_index = Index::new();
        registration_index.add_publication(0, &registration[0], &normalizer);

        let inputs = vec![
            make_pub("i1", "Sherlock Holmes", 1892),
            make_pub("i2", "A Completely Unrelated Work", 1950),
        ];

        let detector = from_patterns(&config.generic_title, &config.wordlists.generic_title_patterns);

        let driver = BatchDriver::new(
            Arc::clone(&config),
            Arc::clone(&normalizer),
            Arc::new(registration),
            Arc::new(registration_index),
            Arc::new(Vec::new()),
            Arc::new(Index::new()),
            detector,
        );
        (driver, inputs)
    }

    fn driver() -> (BatchDriver, Vec<Publication>) {
        driver_with(Config::default_config().unwrap())
    }

    #[test]
    fn run_preserves_input_order_and_produces_stats() {
        let (driver, inputs) = driver();
        let cancel = AtomicBool::new(false);
        let (results, stats) = driver.run(inputs, &cancel);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].input.id.0, "i1");
        assert_eq!(results[1].input.id.0, "i2");
        assert_eq!(stats.total_input, 2);
        assert_eq!(stats.records_analyzed, 2);
        assert_eq!(stats.registration_matches, 1);
    }

    #[test]
    fn cancellation_before_dispatch_yields_empty_run() {
        let (driver, inputs) = driver();
        let cancel = AtomicBool::new(true);
        let (results, stats) = driver.run(inputs, &cancel);

        assert!(results.is_empty());
        assert_eq!(stats.records_analyzed, 0);
    }

    #[test]
    fn streaming_mode_round_trips_and_cleans_up_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default_config().unwrap();
        config.processing.streaming_mode = true;
        config.processing.temp_dir = temp_dir.path().to_path_buf();

        let (driver, inputs) = driver_with(config);
        let cancel = AtomicBool::new(false);
        let (results, stats) = driver.run(inputs, &cancel);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].input.id.0, "i1");
        assert_eq!(results[1].input.id.0, "i2");
        assert_eq!(stats.records_analyzed, 2);

        let leftover: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert!(leftover.is_empty(), "spilled chunk files should be removed after merge");
    }
}
