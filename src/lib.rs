pub mod aggregate;
pub mod corpus;
pub mod error;
pub mod io;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod sampling;

pub use aggregate::{CrossSectionAccumulator, cross_section, longitudinal};
pub use corpus::{CorpusConfig, CorpusService, LocalCorpus, TalkBankClient};
pub use error::{AggregateError, CorpusError, MetricError};
pub use io::{
    Workbook, export_tables, parse_chat, read_chat_file, utterance_lines, write_mor_file,
};
pub use metrics::{
    AnalysisKind, EchoAnalyzer, ExtractConfig, MeanLengthConfig, echoed_utterances, mean_length,
    repeated_vocab, type_token_ratio,
};
pub use models::{
    CrossSectionParameter, GapReason, MetricBundle, NormalizedTurn, QuerySpec, ResultsTable,
    SpeakerRole, TranscriptMeta, Turn,
};
pub use normalize::normalize_turns;
pub use orchestrator::{Orchestrator, RunConfig, RunReport};
pub use sampling::SamplingController;
