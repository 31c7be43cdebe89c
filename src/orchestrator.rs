use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::{CrossSectionAccumulator, TranscriptOutcome, longitudinal};
use crate::corpus::CorpusService;
use crate::error::AggregateError;
use crate::metrics::{AnalysisKind, ExtractConfig};
use crate::models::{CrossSectionParameter, GapReason, QuerySpec, ResultsTable, TranscriptMeta};
use crate::normalize::normalize_turns;
use crate::sampling::{DEFAULT_MAX_SAMPLE, SamplingController};

/// Individuals of the Flusberg corpus followed longitudinally
pub const DEFAULT_INDIVIDUALS: [&str; 6] = ["Brett", "Jack", "Mark", "Rick", "Roger", "Stuart"];

/// Ages in months compared cross-sectionally
pub const DEFAULT_AGES: [u32; 16] = [
    40, 45, 48, 55, 60, 66, 68, 72, 81, 84, 89, 91, 96, 104, 108, 116,
];

/// Configuration for a metrics run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Base query; each individual's name is appended to its corpus paths
    pub longitudinal_query: QuerySpec,
    /// Base query that cross-section parameters are applied to
    pub cross_section_query: QuerySpec,
    pub individuals: Vec<String>,
    pub ages: Vec<u32>,
    pub analyses: Vec<AnalysisKind>,
    /// Maximum transcripts per cross-sectional group
    pub max_sample: usize,
    pub extract: ExtractConfig,
    /// Seed for transcript sampling; entropy when unset
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            longitudinal_query: QuerySpec::flusberg_default(),
            cross_section_query: QuerySpec::childes_default(),
            individuals: DEFAULT_INDIVIDUALS.iter().map(|s| s.to_string()).collect(),
            ages: DEFAULT_AGES.to_vec(),
            analyses: vec![
                AnalysisKind::MeanLength,
                AnalysisKind::Ttr,
                AnalysisKind::EchoedUtterances,
            ],
            max_sample: DEFAULT_MAX_SAMPLE,
            extract: ExtractConfig::default(),
            seed: None,
        }
    }
}

/// A transcript or group that produced no metrics
#[derive(Debug, Clone, Serialize)]
pub struct Gap {
    /// Individual name or cross-section parameter
    pub group: String,
    pub transcript: Option<String>,
    pub analysis: Option<AnalysisKind>,
    pub reason: GapReason,
}

/// Results of one (analysis, group)
#[derive(Debug, Clone)]
pub struct NamedTable {
    /// Sheet name used on export
    pub sheet: String,
    pub analysis: AnalysisKind,
    pub table: ResultsTable,
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: String,
    pub tables: Vec<NamedTable>,
    pub gaps: Vec<Gap>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: chrono::Utc::now().to_rfc3339(),
            tables: Vec::new(),
            gaps: Vec::new(),
        }
    }

    pub fn table(&self, sheet: &str) -> Option<&ResultsTable> {
        self.tables.iter().find(|t| t.sheet == sheet).map(|t| &t.table)
    }

    /// (sheet name, table) pairs ready for export
    pub fn sheets(&self) -> impl Iterator<Item = (String, &ResultsTable)> {
        self.tables.iter().map(|t| (t.sheet.clone(), &t.table))
    }
}

/// Drives querying, sampling, extraction and aggregation over a corpus
pub struct Orchestrator<C> {
    corpus: C,
    config: RunConfig,
    rng: StdRng,
}

impl<C: CorpusService> Orchestrator<C> {
    pub fn new(corpus: C, config: RunConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { corpus, config, rng }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Fetch, normalize and run every analysis on one transcript.
    ///
    /// Failures become gaps for this transcript only.
    async fn process_transcript(
        &self,
        transcript: &TranscriptMeta,
    ) -> Vec<(AnalysisKind, TranscriptOutcome)> {
        let analyses = &self.config.analyses;

        let raw = match self.corpus.utterances(transcript).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!("Failed to fetch {}: {}", transcript.path_string(), err);
                let reason = GapReason::FetchFailed(err.to_string());
                return analyses.iter().map(|&k| (k, Err(reason.clone()))).collect();
            }
        };

        let turns = normalize_turns(raw);
        debug!("{}: {} normalized turns", transcript.id, turns.len());

        analyses
            .iter()
            .map(|&kind| {
                let outcome = kind
                    .extract(&turns, &self.config.extract)
                    .map_err(|err| GapReason::NoData(err.to_string()));
                (kind, outcome)
            })
            .collect()
    }

    /// One table per (individual, analysis): a row per transcript plus `average`
    pub async fn run_longitudinal(&mut self) -> RunReport {
        let mut report = RunReport::new();
        let individuals = self.config.individuals.clone();

        for name in &individuals {
            let query = self.config.longitudinal_query.for_individual(name);
            let transcripts = match self.corpus.transcripts(&query).await {
                Ok(transcripts) => transcripts,
                Err(err) => {
                    warn!("Transcript query for {} failed: {}", name, err);
                    report.gaps.push(Gap {
                        group: name.clone(),
                        transcript: None,
                        analysis: None,
                        reason: GapReason::FetchFailed(err.to_string()),
                    });
                    Vec::new()
                }
            };
            info!("{}: {} transcripts", name, transcripts.len());

            let mut outcomes: BTreeMap<AnalysisKind, Vec<(String, TranscriptOutcome)>> = self
                .config
                .analyses
                .iter()
                .map(|&k| (k, Vec::new()))
                .collect();

            for transcript in &transcripts {
                for (kind, outcome) in self.process_transcript(transcript).await {
                    if let Err(reason) = &outcome {
                        report.gaps.push(Gap {
                            group: name.clone(),
                            transcript: Some(transcript.id.clone()),
                            analysis: Some(kind),
                            reason: reason.clone(),
                        });
                    }
                    outcomes
                        .entry(kind)
                        .or_default()
                        .push((transcript.id.clone(), outcome));
                }
            }

            for kind in self.config.analyses.iter().copied() {
                let table = longitudinal(outcomes.remove(&kind).unwrap_or_default());
                report.tables.push(NamedTable {
                    sheet: format!("{}_{}", name, kind),
                    analysis: kind,
                    table,
                });
            }
        }

        report
    }

    /// Cross-sectional run over the configured ages
    pub async fn run_cross_section_by_age(&mut self) -> RunReport {
        let parameters: Vec<CrossSectionParameter> = self
            .config
            .ages
            .iter()
            .map(|&age| CrossSectionParameter::Age(age))
            .collect();
        self.run_cross_section(&parameters).await
    }

    /// One table per analysis; a row per parameter value holding the averaged
    /// bundle of a bounded sample of that group's transcripts
    pub async fn run_cross_section(&mut self, parameters: &[CrossSectionParameter]) -> RunReport {
        let mut report = RunReport::new();
        let sampler = SamplingController::new(self.config.max_sample);
        let mut tables: BTreeMap<AnalysisKind, ResultsTable> = self
            .config
            .analyses
            .iter()
            .map(|&k| (k, ResultsTable::new()))
            .collect();

        for parameter in parameters {
            let mut query = self.config.cross_section_query.clone();
            parameter.apply(&mut query);
            let label = parameter.label();

            let population = match self.corpus.transcripts(&query).await {
                Ok(population) => population,
                Err(err) => {
                    warn!("Transcript query for {} failed: {}", parameter, err);
                    let reason = GapReason::FetchFailed(err.to_string());
                    report.gaps.push(Gap {
                        group: parameter.to_string(),
                        transcript: None,
                        analysis: None,
                        reason: reason.clone(),
                    });
                    for table in tables.values_mut() {
                        table.push_gap(label.clone(), reason.clone());
                    }
                    continue;
                }
            };

            let sample = sampler.select(population, &mut self.rng);
            if sample.is_empty() {
                warn!("No transcripts for {}", parameter);
                report.gaps.push(Gap {
                    group: parameter.to_string(),
                    transcript: None,
                    analysis: None,
                    reason: GapReason::EmptyPopulation,
                });
                for table in tables.values_mut() {
                    table.push_gap(label.clone(), GapReason::EmptyPopulation);
                }
                continue;
            }

            let mut accumulators: BTreeMap<AnalysisKind, CrossSectionAccumulator> = BTreeMap::new();
            for transcript in &sample {
                for (kind, outcome) in self.process_transcript(transcript).await {
                    match outcome {
                        Ok(bundle) => accumulators.entry(kind).or_default().add(&bundle),
                        Err(reason) => report.gaps.push(Gap {
                            group: parameter.to_string(),
                            transcript: Some(transcript.id.clone()),
                            analysis: Some(kind),
                            reason,
                        }),
                    }
                }
            }

            for (kind, table) in tables.iter_mut() {
                let combined = accumulators
                    .get(kind)
                    .map(|acc| acc.finish(true))
                    .unwrap_or(Err(AggregateError::EmptyPopulation));
                match combined {
                    Ok(bundle) => {
                        info!(
                            "{}: {} with {} (n={}): {:?}",
                            kind,
                            query.group_type.join(","),
                            parameter,
                            accumulators.get(kind).map(|a| a.count()).unwrap_or(0),
                            bundle
                        );
                        table.push_metrics(label.clone(), bundle);
                    }
                    Err(_) => table.push_gap(
                        label.clone(),
                        GapReason::NoData("no sampled transcript produced metrics".to_string()),
                    ),
                }
            }
        }

        for (kind, table) in tables {
            report.tables.push(NamedTable {
                sheet: kind.name().to_string(),
                analysis: kind,
                table,
            });
        }
        report
    }
}
