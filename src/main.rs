use anyhow::{Context, Result};
use clap::Parser;
use rand::{Rng, SeedableRng};
use std::io::Write;

use ai_story_shorts::api::cohere::CohereClient;
use ai_story_shorts::api::elevenlabs::ElevenLabsClient;
use ai_story_shorts::config::Config;
use ai_story_shorts::credentials::{mask_key, CredentialStore, STORE_FILE};
use ai_story_shorts::generator::{self, GenerationRequest};
use ai_story_shorts::init;
use ai_story_shorts::prompts;
use ai_story_shorts::story::{RunStore, SCRIPTS_DIR};

#[derive(Parser, Debug)]
#[command(name = "ai-story-shorts")]
#[command(about = "Automated short-form story video generator", long_about = None)]
struct Args {
    /// Genre for non-interactive generation (e.g. horror, inspiring)
    #[arg(long)]
    genre: Option<String>,

    /// Generate this many videos and exit
    #[arg(long)]
    count: Option<usize>,

    /// Continue an existing run by id and exit
    #[arg(long = "continue", value_name = "RUN_ID")]
    continue_id: Option<String>,
}

struct App {
    cfg: Config,
    creds: CredentialStore,
    runs: RunStore,
    text_model: CohereClient,
    speech: ElevenLabsClient,
}

impl App {
    async fn new() -> Result<Self> {
        let cfg = Config::load("config.json").await?;
        let creds = CredentialStore::load(STORE_FILE).await?;
        let runs = RunStore::new(SCRIPTS_DIR);

        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        let text_model = CohereClient::new(client.clone(), cfg.cohere_model.clone());
        let speech = ElevenLabsClient::new(client);

        Ok(Self {
            cfg,
            creds,
            runs,
            text_model,
            speech,
        })
    }

    async fn single(&mut self, genre: Option<String>, continue_id: Option<String>) {
        if !generator::check_api_keys(&self.creds) {
            return;
        }
        let request = GenerationRequest {
            genre,
            continuation_of: continue_id,
        };
        generator::generate_video(
            &self.cfg,
            &mut self.creds,
            &self.runs,
            &self.text_model,
            &self.speech,
            &request,
        )
        .await;
    }

    async fn batch(&mut self, count: usize, genre: Option<String>) {
        generator::generate_batch(
            &self.cfg,
            &mut self.creds,
            &self.runs,
            &self.text_model,
            &self.speech,
            count,
            genre,
        )
        .await;
    }

    async fn list_runs(&self) {
        match self.runs.list().await {
            Ok(runs) if runs.is_empty() => println!("No scripts found!"),
            Ok(runs) => {
                println!("\nAvailable scripts:");
                println!("{}", "-".repeat(50));
                for (i, run) in runs.iter().enumerate() {
                    println!("{}. {}", i + 1, run.title);
                    println!(
                        "   Genre: {} | Date: {} | ID: {}",
                        run.genre, run.date, run.video_id
                    );
                }
            }
            Err(err) => println!("Error listing scripts: {}", err),
        }
    }

    async fn continue_story(&mut self) {
        let runs = match self.runs.list().await {
            Ok(runs) if !runs.is_empty() => runs,
            Ok(_) => {
                println!("No scripts found!");
                return;
            }
            Err(err) => {
                println!("Error listing scripts: {}", err);
                return;
            }
        };

        self.list_runs().await;
        let choice = prompt("\nEnter script number to continue (or 0 to cancel): ");
        let Ok(choice) = choice.parse::<usize>() else {
            println!("Please enter a valid number!");
            return;
        };
        if choice == 0 {
            return;
        }
        let Some(selected) = runs.get(choice - 1) else {
            println!("Invalid choice!");
            return;
        };

        println!("\nContinuing story: {}", selected.title);
        let id = selected.video_id.clone();
        self.single(None, Some(id)).await;
    }
}

fn prompt(message: &str) -> String {
    print!("{}", message);
    let _ = std::io::stdout().flush();
    let mut line = String::new();
    if std::io::stdin().read_line(&mut line).is_err() {
        return String::new();
    }
    line.trim().to_string()
}

fn pick_genre() -> Option<String> {
    println!("\nAvailable genres:");
    for (i, genre) in prompts::GENRES.iter().enumerate() {
        println!("{}. {}", i + 1, genre);
    }

    let choice = prompt(&format!(
        "\nSelect genre (1-{}) or 0 for random: ",
        prompts::GENRES.len()
    ));
    let Ok(choice) = choice.parse::<usize>() else {
        println!("Please enter a valid number!");
        return None;
    };

    if choice == 0 {
        let seed = chrono::Utc::now().timestamp() as u64;
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let genre = prompts::GENRES[rng.gen_range(0..prompts::GENRES.len())];
        return Some(genre.to_string());
    }

    match prompts::GENRES.get(choice - 1) {
        Some(genre) => Some(genre.to_string()),
        None => {
            println!("Invalid choice!");
            None
        }
    }
}

async fn setup_keys(app: &mut App) {
    loop {
        println!("\nKey setup:");
        println!("1. Add Cohere API key");
        println!("2. Add ElevenLabs API key");
        println!("3. List all API keys");
        println!("4. Remove API key");
        println!("5. Switch AI provider");
        println!("6. Back");

        match prompt("\nEnter your choice (1-6): ").as_str() {
            "1" => {
                let key = prompt("Enter Cohere API key: ");
                if key.is_empty() {
                    println!("Invalid key");
                } else if app.creds.cohere_keys.add(key) {
                    save_creds(app).await;
                    println!("Cohere API key added successfully!");
                } else {
                    println!("Cohere API key already exists!");
                }
            }
            "2" => {
                let key = prompt("Enter ElevenLabs API key: ");
                if key.is_empty() {
                    println!("Invalid key");
                } else if app.creds.elevenlabs_keys.add(key) {
                    save_creds(app).await;
                    println!("ElevenLabs API key added successfully!");
                } else {
                    println!("ElevenLabs API key already exists!");
                }
            }
            "3" => list_keys(app),
            "4" => {
                list_keys(app);
                let provider = prompt("Enter provider (cohere/elevenlabs): ").to_lowercase();
                let ring = match provider.as_str() {
                    "cohere" => &mut app.creds.cohere_keys,
                    "elevenlabs" => &mut app.creds.elevenlabs_keys,
                    _ => {
                        println!("Invalid provider");
                        continue;
                    }
                };
                let Ok(index) = prompt("Enter key index (0-based): ").parse::<usize>() else {
                    println!("Invalid index");
                    continue;
                };
                match ring.remove(index) {
                    Some(removed) => {
                        save_creds(app).await;
                        println!("Removed {} key: {}", provider, mask_key(&removed));
                    }
                    None => println!("Invalid key index"),
                }
            }
            "5" => {
                app.creds.switch_provider();
                save_creds(app).await;
                println!("Switched to {}", app.creds.preferred_ai_provider);
            }
            "6" => break,
            _ => println!("Invalid choice"),
        }
    }
}

fn list_keys(app: &App) {
    println!("\nStored API keys:");
    println!("{}", "-".repeat(40));

    if app.creds.cohere_keys.is_empty() {
        println!("No Cohere keys stored");
    } else {
        println!("Cohere keys ({}):", app.creds.cohere_keys.len());
        for (i, key) in app.creds.cohere_keys.keys().iter().enumerate() {
            println!("  {}. {}", i + 1, mask_key(key));
        }
    }

    if app.creds.elevenlabs_keys.is_empty() {
        println!("No ElevenLabs keys stored");
    } else {
        println!("ElevenLabs keys ({}):", app.creds.elevenlabs_keys.len());
        for (i, key) in app.creds.elevenlabs_keys.keys().iter().enumerate() {
            println!("  {}. {}", i + 1, mask_key(key));
        }
    }

    println!("\nPreferred AI provider: {}", app.creds.preferred_ai_provider);
}

async fn save_creds(app: &App) {
    if let Err(err) = app.creds.save().await {
        println!("Error saving API keys: {}", err);
    }
}

async fn interactive_menu(app: &mut App) {
    println!("AI Story Shorts Generator");
    println!("{}", "=".repeat(40));

    loop {
        println!("\nOptions:");
        println!("1. Generate single video");
        println!("2. Generate batch videos");
        println!("3. Continue existing story");
        println!("4. Setup API keys");
        println!("5. List available scripts");
        println!("6. Exit");

        match prompt("\nEnter your choice (1-6): ").as_str() {
            "1" => {
                if let Some(genre) = pick_genre() {
                    app.single(Some(genre), None).await;
                }
            }
            "2" => {
                let max = app.cfg.max_batch;
                let Ok(count) = prompt(&format!(
                    "Enter number of videos to generate (1-{}): ",
                    max
                ))
                .parse::<usize>() else {
                    println!("Please enter a valid number!");
                    continue;
                };
                if count < 1 || count > max {
                    println!("Please enter a number between 1 and {}!", max);
                    continue;
                }
                if let Some(genre) = pick_genre() {
                    app.batch(count, Some(genre)).await;
                }
            }
            "3" => app.continue_story().await,
            "4" => setup_keys(app).await,
            "5" => app.list_runs().await,
            "6" => {
                println!("Goodbye!");
                break;
            }
            _ => println!("Invalid choice!"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    init::ensure_directories().await?;
    if !init::check_ffmpeg().await {
        eprintln!("[WARNING] FFmpeg not found in PATH. Please install FFmpeg.");
    }

    let args = Args::parse();
    let mut app = App::new().await?;

    if let Some(continue_id) = args.continue_id {
        app.single(None, Some(continue_id)).await;
        return Ok(());
    }
    if let Some(count) = args.count {
        app.batch(count, args.genre).await;
        return Ok(());
    }
    if args.genre.is_some() {
        app.single(args.genre, None).await;
        return Ok(());
    }

    interactive_menu(&mut app).await;
    Ok(())
}
