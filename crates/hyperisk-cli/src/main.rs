mod display;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use hyperisk_ai::{ModelRegistry, OpenAiConfig, OpenAiRecommender};
use hyperisk_core::{PatientInput, derive_features, features_to_batch};
use hyperisk_service::{AssessLimits, Assessor};

#[derive(Debug, Parser)]
#[command(
    name = "hyperisk",
    version,
    about = "Hypertension risk assessment with pre-trained classifiers and LLM recommendations"
)]
struct Cli {
    /// Directory holding the classifier artifacts
    #[arg(long, env = "HYPERISK_MODELS_DIR", default_value = "models", global = true)]
    models_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the assessment API over HTTP
    Serve(ServeArgs),

    /// Assess one patient and print the result card
    Assess(AssessArgs),

    /// List the loaded models in prediction order
    Models,

    /// Print the derived feature vector for one patient
    Features(PatientArgs),
}

#[derive(Debug, Args)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "HYPERISK_BIND", default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    #[command(flatten)]
    recommender: RecommenderArgs,
}

#[derive(Debug, Args)]
struct AssessArgs {
    #[command(flatten)]
    patient: PatientArgs,

    #[command(flatten)]
    recommender: RecommenderArgs,
}

#[derive(Debug, Args)]
struct PatientArgs {
    /// Weight in kilograms
    #[arg(long)]
    weight: f64,

    /// Height in metres
    #[arg(long)]
    height: f64,

    /// Total physical activity score
    #[arg(long)]
    activity: f64,

    /// Arterial tension reading
    #[arg(long)]
    tension: f64,

    /// Age in years
    #[arg(long)]
    age: u32,
}

impl From<&PatientArgs> for PatientInput {
    fn from(args: &PatientArgs) -> Self {
        PatientInput::new(
            args.weight,
            args.height,
            args.activity,
            args.tension,
            args.age,
        )
    }
}

#[derive(Debug, Args)]
struct RecommenderArgs {
    /// API key for the chat-completion service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com")]
    openai_base_url: String,

    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o")]
    openai_model: String,

    /// Token cap for each recommendation
    #[arg(long, env = "HYPERISK_MAX_TOKENS", default_value_t = 300)]
    max_tokens: u32,

    /// Retries after a transient failure (429, 5xx, timeout)
    #[arg(long, env = "HYPERISK_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Time limit for one HTTP attempt to the chat service, in seconds
    #[arg(
        long,
        env = "HYPERISK_REQUEST_TIMEOUT_SECS",
        default_value_t = 8,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    request_timeout_secs: u64,

    /// Per-recommendation time limit in seconds, 0 to disable
    #[arg(long, env = "HYPERISK_RECOMMENDATION_TIMEOUT_SECS", default_value_t = 30)]
    recommendation_timeout_secs: u64,

    /// Whole-assessment time limit in seconds, 0 to disable
    #[arg(long, env = "HYPERISK_DEADLINE_SECS", default_value_t = 60)]
    deadline_secs: u64,
}

impl RecommenderArgs {
    fn recommender(&self) -> anyhow::Result<OpenAiRecommender> {
        OpenAiRecommender::new(OpenAiConfig {
            api_key: self.openai_api_key.clone(),
            base_url: self.openai_base_url.clone(),
            model: self.openai_model.clone(),
            max_tokens: self.max_tokens,
            max_retries: self.max_retries,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        })
        .context("building chat-completions client")
    }

    fn limits(&self) -> AssessLimits {
        let secs = |s: u64| (s > 0).then(|| Duration::from_secs(s));
        AssessLimits {
            recommendation_timeout: secs(self.recommendation_timeout_secs),
            deadline: secs(self.deadline_secs),
        }
    }

    fn assessor(&self, registry: ModelRegistry) -> anyhow::Result<Assessor> {
        let recommender = Arc::new(self.recommender()?);
        Ok(Assessor::new(Arc::new(registry), recommender).with_limits(self.limits()))
    }
}

fn load_registry(dir: &Path) -> anyhow::Result<ModelRegistry> {
    let registry = ModelRegistry::load(dir)
        .with_context(|| format!("loading models from {}", dir.display()))?;
    if registry.is_empty() {
        tracing::warn!(dir = %dir.display(), "no model artifacts found");
    }
    Ok(registry)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!("hyperisk v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Serve(args) => {
            let registry = load_registry(&cli.models_dir)?;
            let assessor = Arc::new(args.recommender.assessor(registry)?);
            hyperisk_service::serve(args.bind, assessor)
                .await
                .with_context(|| format!("serving on {}", args.bind))?;
        }
        Command::Assess(args) => {
            let patient = PatientInput::from(&args.patient);
            let features = derive_features(&patient)?;
            let registry = load_registry(&cli.models_dir)?;
            let assessment = args.recommender.assessor(registry)?.assess(patient).await?;
            let batch = features_to_batch(&[features])?;
            print!(
                "{}",
                display::AssessmentCard {
                    assessment: &assessment,
                    features: &batch,
                }
            );
        }
        Command::Models => {
            let registry = load_registry(&cli.models_dir)?;
            if registry.is_empty() {
                println!("No models loaded from {}", cli.models_dir.display());
            }
            for name in registry.list_models() {
                println!("{name}");
            }
        }
        Command::Features(args) => {
            let features = derive_features(&PatientInput::from(&args))?;
            let batch = features_to_batch(&[features])?;
            arrow::util::pretty::print_batches(&[batch])?;
        }
    }

    Ok(())
}
