use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use convmetrics::{
    AnalysisKind, CorpusConfig, CorpusService, ExtractConfig, LocalCorpus, MeanLengthConfig,
    Orchestrator, RunConfig, RunReport, TalkBankClient, export_tables, normalize_turns,
    read_chat_file, repeated_vocab, utterance_lines, write_mor_file,
};

#[derive(Parser)]
#[command(name = "convmetrics")]
#[command(author, version, about = "Conversational-development metrics for child-caregiver transcripts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RunArgs {
    /// Read CHAT files from this directory instead of querying TALKBANK_DB_URL
    #[arg(long)]
    local_dir: Option<PathBuf>,

    /// Analyses to run (meanlength, ttr, echoed_utterances, repeated_vocab)
    #[arg(long, value_delimiter = ',', default_values_t = [AnalysisKind::MeanLength, AnalysisKind::Ttr, AnalysisKind::EchoedUtterances])]
    analyses: Vec<AnalysisKind>,

    /// Count morphemes instead of words for mean lengths
    #[arg(long)]
    morpheme: bool,

    /// Skip mean length of turn
    #[arg(long)]
    no_mlt: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Per-individual metrics over time, with an average row
    Longitudinal {
        #[command(flatten)]
        run: RunArgs,

        /// Individuals (sub-directories of the corpus) to follow
        #[arg(long, value_delimiter = ',')]
        individuals: Vec<String>,

        /// Workbook to create or append to
        #[arg(short, long, default_value = "autism.json")]
        output: PathBuf,
    },

    /// Metrics averaged over sampled transcripts, grouped by age
    CrossSection {
        #[command(flatten)]
        run: RunArgs,

        /// Ages in months
        #[arg(long, value_delimiter = ',')]
        ages: Vec<u32>,

        /// Maximum transcripts sampled per age
        #[arg(long, default_value = "100")]
        max_sample: usize,

        /// Seed for reproducible sampling
        #[arg(long)]
        seed: Option<u64>,

        /// Directory for the per-group workbook
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Print metrics for a single CHAT file
    Analyze {
        /// Input transcript (.cha)
        #[arg(short, long)]
        input: PathBuf,

        /// Count morphemes instead of words
        #[arg(long)]
        morpheme: bool,

        /// Also print the normalized utterance lines
        #[arg(long)]
        lines: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Write the %mor tiers of CHAT files to sibling .mor files
    Mor {
        /// Input transcripts (.cha)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Longitudinal {
            run,
            individuals,
            output,
        } => {
            setup_logging(run.verbose);
            let mut config = run_config(&run);
            if !individuals.is_empty() {
                config.individuals = individuals;
            }
            match &run.local_dir {
                Some(dir) => longitudinal(LocalCorpus::from_dir(dir)?, config, &output).await,
                None => {
                    let client = TalkBankClient::new(CorpusConfig::from_env()?);
                    longitudinal(client, config, &output).await
                }
            }
        }
        Commands::CrossSection {
            run,
            ages,
            max_sample,
            seed,
            output_dir,
        } => {
            setup_logging(run.verbose);
            let mut config = run_config(&run);
            if !ages.is_empty() {
                config.ages = ages;
            }
            config.max_sample = max_sample;
            config.seed = seed;
            match &run.local_dir {
                Some(dir) => cross_section(LocalCorpus::from_dir(dir)?, config, &output_dir).await,
                None => {
                    let client = TalkBankClient::new(CorpusConfig::from_env()?);
                    cross_section(client, config, &output_dir).await
                }
            }
        }
        Commands::Analyze {
            input,
            morpheme,
            lines,
            verbose,
        } => {
            setup_logging(verbose);
            analyze_transcript(&input, morpheme, lines)
        }
        Commands::Mor { inputs } => {
            setup_logging(false);
            for input in &inputs {
                let out = write_mor_file(input)
                    .with_context(|| format!("Failed to extract morphemes from {:?}", input))?;
                info!("Wrote {:?}", out);
            }
            Ok(())
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn run_config(run: &RunArgs) -> RunConfig {
    RunConfig {
        analyses: run.analyses.clone(),
        extract: ExtractConfig {
            mean_length: MeanLengthConfig {
                mlt: !run.no_mlt,
                morpheme: run.morpheme,
            },
            split_morphemes: run.morpheme,
        },
        ..Default::default()
    }
}

async fn longitudinal<C: CorpusService>(corpus: C, config: RunConfig, output: &Path) -> Result<()> {
    info!("Longitudinal run over {} individuals", config.individuals.len());
    let mut orchestrator = Orchestrator::new(corpus, config);
    let report = orchestrator.run_longitudinal().await;
    finish(&report, output)
}

async fn cross_section<C: CorpusService>(corpus: C, config: RunConfig, output_dir: &Path) -> Result<()> {
    info!("Cross-sectional run over {} ages", config.ages.len());
    let group = config.cross_section_query.group_type.join("_").to_lowercase();
    let output = output_dir.join(format!("{}.json", if group.is_empty() { "all" } else { group.as_str() }));

    let mut orchestrator = Orchestrator::new(corpus, config);
    let report = orchestrator.run_cross_section_by_age().await;
    finish(&report, &output)
}

fn finish(report: &RunReport, output: &Path) -> Result<()> {
    for gap in &report.gaps {
        warn!(
            "Gap in {} ({}{}): {}",
            gap.group,
            gap.transcript.as_deref().unwrap_or("whole group"),
            gap.analysis.map(|a| format!(", {}", a)).unwrap_or_default(),
            gap.reason
        );
    }

    let names = export_tables(output, &report.run_id, report.sheets())
        .with_context(|| format!("Failed to export results to {:?}", output))?;
    info!(
        "Run {}: {} sheets written to {:?}, {} gaps",
        report.run_id,
        names.len(),
        output,
        report.gaps.len()
    );
    Ok(())
}

fn analyze_transcript(input: &Path, morpheme: bool, lines: bool) -> Result<()> {
    info!("Analyzing transcript from {:?}", input);
    let chat = read_chat_file(input).context("Failed to parse input transcript")?;
    let turns = normalize_turns(chat.turns);

    println!("Transcript Analysis");
    println!("==================");
    println!("Turns (after dedup): {}", turns.len());
    if let Some(age) = chat.age_months {
        println!("Target child age: {} months", age);
    }
    println!();

    if lines {
        for line in utterance_lines(&turns) {
            println!("{}", line);
        }
        println!();
    }

    let config = ExtractConfig {
        mean_length: MeanLengthConfig { mlt: true, morpheme },
        split_morphemes: morpheme,
    };
    for kind in AnalysisKind::ALL {
        println!("{}", kind);
        println!("{}", "-".repeat(kind.name().len()));
        match kind.extract(&turns, &config) {
            Ok(bundle) => {
                for (key, value) in bundle.iter() {
                    println!("{}: {:.3}", key, value);
                }
            }
            Err(err) => println!("undefined ({})", err),
        }
        println!();
    }

    let vocab = repeated_vocab(&turns, morpheme);
    println!(
        "Vocabulary: {} words, {} used independently",
        vocab.total_vocab, vocab.independent_vocab
    );
    let least_independent: Vec<&str> = vocab.words().rev().take(10).collect();
    if !least_independent.is_empty() {
        println!("Most echoed: {}", least_independent.join(", "));
    }

    Ok(())
}
