//! Similarity CLI
//!
//! Distances, scores, suggestions and the cross-language fixture corpus from
//! the command line.

use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rsfulmen::config::FulmenConfig;
use rsfulmen::similarity::fixtures::FixtureCorpus;
use rsfulmen::similarity::{
    distance, normalize, score, substring_match, suggest, Algorithm, JaroWinklerOptions, NormalizationPreset,
    NormalizeOptions, ScoreOptions,
};
use rsfulmen::telemetry::{self, RecordingEmitter};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fulmen-similarity")]
#[command(about = "String similarity, normalization and suggestion tools")]
struct Cli {
    /// Print telemetry counters recorded during the command
    #[arg(long, global = true)]
    telemetry: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit distance between two strings
    Distance {
        a: String,
        b: String,
        #[arg(short, long, default_value = "levenshtein")]
        algorithm: Algorithm,
    },

    /// Similarity score in [0, 1]
    Score {
        a: String,
        b: String,
        #[arg(short, long, default_value = "levenshtein")]
        algorithm: Algorithm,
        /// Jaro–Winkler prefix scale
        #[arg(long)]
        prefix_scale: Option<f64>,
        /// Jaro–Winkler maximum prefix length
        #[arg(long)]
        max_prefix: Option<usize>,
    },

    /// Longest common substring of NEEDLE within HAYSTACK
    Substring {
        needle: String,
        haystack: String,
    },

    /// Rank candidates by similarity to the input
    Suggest {
        input: String,
        #[arg(required = true)]
        candidates: Vec<String>,
        #[arg(long)]
        min_score: Option<f64>,
        #[arg(long)]
        max: Option<usize>,
        #[arg(short, long)]
        algorithm: Option<Algorithm>,
        /// Compare raw strings
        #[arg(long)]
        no_normalize: bool,
    },

    /// Normalize a string
    Normalize {
        value: String,
        #[arg(long)]
        strip_accents: bool,
        #[arg(long)]
        locale: Option<String>,
        /// Apply a named preset instead of the options above
        #[arg(long, conflicts_with_all = ["strip_accents", "locale"])]
        preset: Option<NormalizationPreset>,
    },

    /// Run the fixture corpus
    Fixtures {
        /// Corpus file; the embedded corpus when omitted
        path: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let recorder = cli.telemetry.then(|| {
        let recorder = Arc::new(RecordingEmitter::default());
        telemetry::enable(recorder.clone());
        recorder
    });

    let outcome = run(cli.command);

    if let Some(recorder) = recorder {
        telemetry::disable();
        for record in recorder.records() {
            eprintln!("counter {} += {} {:?}", record.name, record.value, record.tags);
        }
    }

    match outcome {
        Ok(true) => {}
        Ok(false) => exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            exit(2);
        }
    }
}

fn run(command: Commands) -> Result<bool, Box<dyn std::error::Error>> {
    match command {
        Commands::Distance { a, b, algorithm } => {
            println!("{}", distance(&a, &b, algorithm)?);
            Ok(true)
        }

        Commands::Score {
            a,
            b,
            algorithm,
            prefix_scale,
            max_prefix,
        } => {
            let defaults = JaroWinklerOptions::default();
            let options = ScoreOptions {
                jaro_winkler: JaroWinklerOptions {
                    prefix_scale: prefix_scale.unwrap_or(defaults.prefix_scale),
                    max_prefix: max_prefix.unwrap_or(defaults.max_prefix),
                },
            };
            println!("{:.6}", score(&a, &b, algorithm, Some(&options)));
            Ok(true)
        }

        Commands::Substring { needle, haystack } => {
            let (range, score) = substring_match(&needle, &haystack);
            if range.valid {
                println!(
                    "[{}, {}) {:?} score={:.6}",
                    range.start,
                    range.end,
                    range.slice(&haystack).unwrap_or_default(),
                    score
                );
            } else {
                println!("no common substring");
            }
            Ok(true)
        }

        Commands::Suggest {
            input,
            candidates,
            min_score,
            max,
            algorithm,
            no_normalize,
        } => {
            let config = FulmenConfig::load()?;
            let mut options = config.similarity.suggest_options();
            if let Some(min_score) = min_score {
                options.min_score = min_score;
            }
            if let Some(max) = max {
                options.max_suggestions = max;
            }
            if let Some(algorithm) = algorithm {
                options.algorithm = algorithm;
            }
            options.normalize &= !no_normalize;

            let suggestions = suggest(&input, &candidates, &options);
            if suggestions.is_empty() {
                println!("no suggestions");
            }
            for s in &suggestions {
                println!("{:.4}  {}", s.score, s.value);
            }
            Ok(true)
        }

        Commands::Normalize {
            value,
            strip_accents,
            locale,
            preset,
        } => {
            let normalized = match preset {
                Some(preset) => preset.apply(&value),
                None => normalize(&value, &NormalizeOptions { strip_accents, locale }),
            };
            println!("{}", normalized);
            Ok(true)
        }

        Commands::Fixtures { path } => {
            let corpus = match path {
                Some(path) => FixtureCorpus::load(path)?,
                None => FixtureCorpus::embedded()?,
            };
            let report = corpus.run();
            for failure in &report.failures {
                println!("❌ [{}] {}: {}", failure.category, failure.description, failure.detail);
            }
            println!();
            println!(
                "{} fixtures v{}: {}/{} passed",
                if report.is_clean() { "✅" } else { "❌" },
                report.version,
                report.passed,
                report.total
            );
            Ok(report.is_clean())
        }
    }
}
