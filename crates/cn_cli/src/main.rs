use std::str::FromStr;
use std::time::Duration;

use clap::Parser;
use cn_core::{Dataset, Error};
use cn_fetch::assembler::{DEFAULT_BATCH_SIZE, DEFAULT_DATASET_PATH};
use cn_fetch::{create_source, init_logging, DatasetAssembler, FetchConfig};
use cn_inference::{compute_metrics, Average};
use cn_storage::{create_sink, CsvStorage};
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total = Duration::ZERO;
        let mut current_number = String::new();
        let mut chars = s.chars().peekable();
        let mut has_value = false;

        while let Some(c) = chars.next() {
            if c.is_ascii_digit() {
                current_number.push(c);
                continue;
            }
            if c.is_whitespace() {
                continue;
            }
            let num = current_number
                .parse::<u64>()
                .map_err(|_| format!("Invalid character in duration: {}", c))?;
            total += match c {
                'm' if chars.peek() == Some(&'s') => {
                    chars.next();
                    Duration::from_millis(num)
                }
                's' => Duration::from_secs(num),
                'm' => Duration::from_secs(num * 60),
                'h' => Duration::from_secs(num * 3600),
                _ => return Err(format!("Invalid duration unit: {}", c)),
            };
            current_number.clear();
            has_value = true;
        }

        // A trailing bare number is seconds
        if !current_number.is_empty() {
            let num = current_number
                .parse::<u64>()
                .map_err(|_| "Invalid number in duration".to_string())?;
            total += Duration::from_secs(num);
            has_value = true;
        }

        if !has_value {
            return Err("Duration must include a number".to_string());
        }

        Ok(HumanDuration(total))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Crypto news sentiment dataset collector", long_about = None)]
pub struct Cli {
    #[arg(
        long,
        default_value = "csv",
        help = "Where datasets are written. Available backends: csv (default), memory"
    )]
    storage: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Fetch recent articles and save them as a sentiment dataset
    Fetch {
        #[arg(long, env = "COINDESK_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        #[arg(long, default_value = "coindesk")]
        source: String,
        #[arg(long, default_value_t = 7)]
        days_back: u32,
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
        #[arg(long, default_value_t = 10)]
        max_articles: usize,
        #[arg(long, default_value = DEFAULT_DATASET_PATH)]
        output: String,
        /// Pause between page requests (e.g. 1s, 500ms)
        #[arg(long, default_value = "1s")]
        delay: HumanDuration,
        #[arg(long, default_value = "EN")]
        language: String,
    },
    /// Score the sentiment model against the labels of a saved dataset
    Evaluate {
        #[arg(long, default_value = DEFAULT_DATASET_PATH)]
        input: String,
        #[arg(long, default_value = "lexicon")]
        model: String,
        #[arg(long, default_value_t = 16)]
        batch_size: usize,
        #[arg(long, default_value = "weighted")]
        average: Average,
    },
}

fn log_distribution(dataset: &Dataset) {
    let mut counts: Vec<_> = dataset.sentiment_distribution().into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    info!("Sentiment distribution in dataset:");
    for (sentiment, count) in counts {
        info!(
            "  {}: {} articles ({:.1}%)",
            sentiment,
            count,
            count as f64 / dataset.len() as f64 * 100.0
        );
    }
}

async fn fetch(storage: &str, command: Commands) -> anyhow::Result<()> {
    let Commands::Fetch {
        api_key,
        source,
        days_back,
        batch_size,
        max_articles,
        output,
        delay,
        language,
    } = command
    else {
        unreachable!("fetch called with another command");
    };

    let Some(api_key) = api_key.filter(|key| !key.trim().is_empty()) else {
        let message = "API key is required to fetch articles. \
                       Please set the COINDESK_API_KEY environment variable.";
        error!("{}", message);
        return Err(Error::MissingCredential(message.to_string()).into());
    };

    info!("🦗 Starting {} article fetcher for sentiment analysis dataset...", source);
    let source = create_source(&source, &api_key)?;
    let sink = create_sink(storage)?;
    let config = FetchConfig {
        courtesy_delay: delay.0,
        language,
        ..FetchConfig::default()
    };
    let assembler = DatasetAssembler::new(source, sink, config)
        .with_output(output)
        .with_batch_size(batch_size);

    match assembler.build(days_back, max_articles).await? {
        Some(dataset) => {
            info!("✨ Successfully created dataset with {} articles", dataset.len());
            log_distribution(&dataset);
            Ok(())
        }
        None => {
            error!("Failed to create dataset");
            Err(Error::NoArticlesCollected.into())
        }
    }
}

async fn evaluate(
    input: &str,
    model: String,
    batch_size: usize,
    average: Average,
) -> anyhow::Result<()> {
    let dataset = CsvStorage::load(input)?;
    let (texts, labels) = dataset.labeled_texts();
    if texts.is_empty() {
        return Err(Error::Evaluation(format!("{} has no labelled articles", input)).into());
    }

    let config = cn_inference::Config {
        model_name: model,
        batch_size,
        average,
    };
    let predictor = config.predictor()?;
    info!(
        "🧠 Classifying {} articles with {} (batch size {})",
        texts.len(),
        predictor.model_name(),
        batch_size
    );

    let predicted = predictor.predict_labels(&texts).await?;
    let metrics = compute_metrics(&predicted, &labels, average)?;

    info!("📈 Evaluation ({} average):", average);
    info!("  accuracy:  {:.4}", metrics.accuracy);
    info!("  precision: {:.4}", metrics.precision);
    info!("  recall:    {:.4}", metrics.recall);
    info!("  f1:        {:.4}", metrics.f1);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        command @ Commands::Fetch { .. } => fetch(&cli.storage, command).await,
        Commands::Evaluate {
            input,
            model,
            batch_size,
            average,
        } => evaluate(&input, model, batch_size, average).await,
    }
}
