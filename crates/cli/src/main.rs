use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use wordsense_engine::{BuildConfig, BuildOutput, BuildPipeline, BuildReport, CancelFlag};
use wordsense_lexicon::{
    relations_from_lexeme, CanonicalSense, JsonlReader, LexemeReader, LinkedEntry, ReadStats,
    RelationReader, ResolvedRelation, SenseId,
};
use wordsense_store::SenseStore;

mod output;
mod progress;

use output::WrittenFiles;
use progress::ProgressObserver;

#[derive(Parser)]
#[command(name = "wordsense")]
#[command(about = "Build word-sense stores and resolve lexical relations", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize lexemes, index their senses and resolve relations
    Build(BuildArgs),

    /// Show the senses and relations of a word from a saved snapshot
    Inspect(InspectArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// Lexeme JSONL, one entry per line
    #[arg(long)]
    lexemes: PathBuf,

    /// Relation JSONL, one relation per line
    #[arg(long, conflicts_with = "relations_from_entries")]
    relations: Option<PathBuf>,

    /// Derive relations from the linkage lists of the lexeme file
    #[arg(long)]
    relations_from_entries: bool,

    /// Build configuration (TOML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    out: PathBuf,

    /// Worker threads (overrides config and WORDSENSE_WORKERS)
    #[arg(long)]
    workers: Option<usize>,

    #[arg(long)]
    max_lexemes: Option<usize>,

    #[arg(long)]
    max_relations: Option<usize>,

    /// Relations per staged commit
    #[arg(long)]
    batch_size: Option<usize>,

    #[arg(long)]
    ambiguity_tolerance: Option<f32>,

    /// BM25 k1
    #[arg(long)]
    k1: Option<f32>,

    /// BM25 b
    #[arg(long)]
    b: Option<f32>,
}

impl BuildArgs {
    fn load_config(&self) -> Result<BuildConfig> {
        let mut config = match &self.config {
            Some(path) => BuildConfig::from_file(path)
                .with_context(|| format!("Invalid build config {}", path.display()))?,
            None => BuildConfig::default(),
        };
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(max) = self.max_lexemes {
            config.normalizer.max_lexemes = Some(max);
        }
        if let Some(max) = self.max_relations {
            config.resolver.max_relations = Some(max);
        }
        if let Some(batch_size) = self.batch_size {
            config.resolver.batch_size = batch_size;
        }
        if let Some(tolerance) = self.ambiguity_tolerance {
            config.resolver.config.ambiguity_tolerance = tolerance;
        }
        if let Some(k1) = self.k1 {
            config.index.params.k1 = k1;
        }
        if let Some(b) = self.b {
            config.index.params.b = b;
        }
        Ok(config)
    }
}

#[derive(Args)]
struct InspectArgs {
    /// Snapshot written by `build`
    #[arg(long)]
    snapshot: PathBuf,

    /// Word to look up
    word: String,

    /// Restrict to the sense with this exact definition
    #[arg(long)]
    definition: Option<String>,
}

#[derive(Serialize)]
struct BuildSummary {
    build: BuildReport,
    lexemes: ReadStats,
    relations: Option<ReadStats>,
    outputs: WrittenFiles,
}

#[derive(Serialize)]
struct WordView<'a> {
    word: &'a str,
    senses: Vec<&'a CanonicalSense>,
    relations_from: Vec<&'a ResolvedRelation>,
    relations_to: Vec<&'a ResolvedRelation>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Build(args) => run_build(args, cli.quiet).await?,
        Commands::Inspect(args) => run_inspect(args).await?,
    }

    Ok(())
}

async fn run_build(args: BuildArgs, quiet: bool) -> Result<()> {
    let config = args.load_config()?;
    let pipeline = BuildPipeline::new(config).context("Invalid build configuration")?;

    let cancel = pipeline.cancel_flag();
    tokio::spawn(cancel_on_interrupt(cancel));

    let out_dir = args.out.clone();
    let (output, lexemes, relations) =
        tokio::task::spawn_blocking(move || build_blocking(&pipeline, &args, quiet))
            .await
            .context("Build task panicked")??;

    let outputs = output::write_outputs(&out_dir, &output).await?;
    let summary = BuildSummary {
        build: output.report,
        lexemes,
        relations,
        outputs,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn cancel_on_interrupt(cancel: CancelFlag) {
    if tokio::signal::ctrl_c().await.is_ok() {
        log::warn!("Interrupt received; stopping after the current batch");
        cancel.cancel();
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Failed to open {}", path.display()))
}

fn build_blocking(
    pipeline: &BuildPipeline,
    args: &BuildArgs,
    quiet: bool,
) -> Result<(BuildOutput, ReadStats, Option<ReadStats>)> {
    let progress = ProgressObserver::new(quiet);
    let mut lexemes = LexemeReader::new(open(&args.lexemes)?);

    let (output, relations) = match (&args.relations, args.relations_from_entries) {
        (Some(path), _) => {
            let mut relations = RelationReader::new(open(path)?);
            let output = pipeline.run(lexemes.by_ref(), relations.by_ref(), &progress)?;
            let stats = relations
                .finish()
                .with_context(|| format!("Failed to read {}", path.display()))?;
            (output, Some(stats))
        }
        (None, true) => {
            let mut entries = JsonlReader::<_, LinkedEntry>::new(open(&args.lexemes)?);
            let output = pipeline.run(
                lexemes.by_ref(),
                entries.by_ref().flat_map(|entry| relations_from_lexeme(&entry)),
                &progress,
            )?;
            let stats = entries
                .finish()
                .with_context(|| format!("Failed to read {}", args.lexemes.display()))?;
            (output, Some(stats))
        }
        (None, false) => {
            log::info!("No relation source given; building senses only");
            let output = pipeline.run(lexemes.by_ref(), std::iter::empty(), &progress)?;
            (output, None)
        }
    };
    progress.finish();

    let lexeme_stats = lexemes
        .finish()
        .with_context(|| format!("Failed to read {}", args.lexemes.display()))?;
    if lexeme_stats.skipped > 0 {
        log::warn!(
            "Skipped {} malformed lexeme lines (first: {:?})",
            lexeme_stats.skipped,
            lexeme_stats.skipped_lines
        );
    }
    Ok((output, lexeme_stats, relations))
}

async fn run_inspect(args: InspectArgs) -> Result<()> {
    let store = SenseStore::load(&args.snapshot)
        .await
        .with_context(|| format!("Failed to load snapshot {}", args.snapshot.display()))?;

    let ids: Vec<SenseId> = match &args.definition {
        Some(definition) => store
            .find_sense(&args.word, definition)
            .into_iter()
            .collect(),
        None => store.senses_for_word(&args.word).to_vec(),
    };
    let view = WordView {
        word: &args.word,
        senses: ids.iter().filter_map(|&id| store.sense(id)).collect(),
        relations_from: store.relations_from(&args.word).collect(),
        relations_to: ids
            .iter()
            .flat_map(|&id| store.relations_to_sense(id))
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
