use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::info;

use lyricist::{
    clean_records, load_model, read_records, save_model, split_into_lines, CorpusBuilder,
    GridSearch, Predictor, Settings,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON settings file; defaults are used for anything it leaves out
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Select hyperparameters by cross-validation and save the winning model
    Train {
        /// CSV table with title, artist and lyrics columns
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Where to write the model
        #[arg(short, long)]
        model: Option<PathBuf>,
        #[arg(long)]
        folds: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Guess the artist of lyric lines; starts an interactive prompt when no lines are given
    Predict {
        #[arg(short, long)]
        model: Option<PathBuf>,
        lines: Vec<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };

    match args.command {
        Command::Train {
            data,
            model,
            folds,
            seed,
        } => {
            let mut settings = settings;
            if let Some(data) = data {
                settings.data_file = data;
            }
            if let Some(folds) = folds {
                settings.search.folds = folds;
            }
            if let Some(seed) = seed {
                settings.search.seed = seed;
            }
            let model_path = model.unwrap_or_else(|| settings.model_path());
            train(&settings, &model_path)
        }
        Command::Predict { model, lines } => {
            let model_path = model.unwrap_or_else(|| settings.model_path());
            predict(&settings, &model_path, &lines)
        }
    }
}

fn train(settings: &Settings, model_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    info!("Importing lyrics from {:?}", settings.data_file);
    let mut records = read_records(&settings.data_file)?;

    if settings.stages.split_lines {
        info!("Converting lyrics to lines");
        records = split_into_lines(&records);
    }
    if settings.stages.clean_records {
        info!("Cleaning records");
        records = clean_records(records, &settings.artists);
    }
    if !settings.stages.train_model {
        info!("Skip training model");
        return Ok(());
    }

    info!("Preparing corpus and labels");
    let corpus = CorpusBuilder::from_records(&records)?;
    info!("Preprocessing {} documents", corpus.len());
    let corpus = corpus.normalized(&settings.normalizer()?);

    let outcome = GridSearch::new(settings.search.clone()).fit(&corpus)?;
    println!("time taken: {:.2} sec", outcome.elapsed.as_secs_f64());
    println!("Best parameters: {}", outcome.best_hyperparameters);
    println!("Best score: {:.6}", outcome.best_score);
    println!("Score on entire dataset: {:.6}", outcome.train_score);

    save_model(&outcome.classifier, model_path)?;
    println!("Model saved as {}.", model_path.display());
    Ok(())
}

fn predict(
    settings: &Settings,
    model_path: &Path,
    lines: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let predictor = Predictor::new(load_model(model_path)?).with_normalizer(settings.normalizer()?);

    if lines.is_empty() {
        let stdin = io::stdin();
        let count = predictor.run_interactive(stdin.lock(), io::stdout())?;
        info!("Predicted {} lines", count);
        return Ok(());
    }

    for result in predictor.predict(lines) {
        println!("{}\n", result);
    }
    Ok(())
}
