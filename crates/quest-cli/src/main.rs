use anyhow::Result;
use clap::{Parser, Subcommand};
use quest_core::{Error, Persona};
use quest_local::search::WebSearchProvider;
use quest_local::store_fs::StoreFile;
use quest_local::{completion::OpenAiCompletionClient, crawler, PageFetcher};
use std::io::Write;
use std::path::PathBuf;

mod credential;
mod session;

use session::{Session, SessionConfig};

#[derive(Parser, Debug)]
#[command(name = "quest")]
#[command(about = "Search-augmented assistant chat (interactive CLI)", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive assistant session.
    Chat(ChatCmd),
    /// One-shot crawl for a query; prints the findings.
    Search(SearchCmd),
    /// Diagnose configuration/launch issues (json; no secrets).
    Doctor(DoctorCmd),
    /// Print version info.
    Version,
}

#[derive(clap::Args, Debug)]
struct ChatCmd {
    /// Assistant persona. Allowed: strictly-factual, factual, neutral, creative, very-creative
    #[arg(long, default_value = "neutral")]
    persona: String,
    /// Data directory (default: QUEST_DATA_DIR, else the platform data dir).
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Hard ceiling on prompt plus completion tokens.
    #[arg(long, default_value_t = 4000)]
    max_total_tokens: usize,
    /// How many pages a crawl keeps fetching until they contributed snippets.
    #[arg(long, default_value_t = 3)]
    pages: usize,
    /// Sampling temperature for the completion call.
    #[arg(long, default_value_t = 1.0)]
    temperature: f64,
    /// Cap on finding texts included in the prompt block.
    #[arg(long, default_value_t = 6)]
    max_findings: usize,
    /// Persist crawl batches from a detached background task.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    background_save: bool,
}

#[derive(clap::Args, Debug)]
struct SearchCmd {
    query: String,
    /// How many pages to keep fetching until they contributed snippets.
    #[arg(long, default_value_t = 3)]
    pages: usize,
    /// Data directory (default: QUEST_DATA_DIR, else the platform data dir).
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct DoctorCmd {
    /// Data directory (default: QUEST_DATA_DIR, else the platform data dir).
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn resolve_data_dir(flag: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = flag {
        return dir;
    }
    if let Ok(dir) = std::env::var("QUEST_DATA_DIR") {
        let dir = dir.trim();
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("quest")
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Chat(cmd) => run_chat(cmd).await,
        Commands::Search(cmd) => run_search_once(cmd).await,
        Commands::Doctor(cmd) => run_doctor(cmd),
        Commands::Version => {
            println!("quest {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Map domain failures to the warnings the session shows; none of these end
/// the interactive loop.
fn print_warning(err: &Error) {
    match err {
        Error::RateLimited => println!(
            "⚠️  The search engine is rate limiting this IP (HTTP 429). If you are using a VPN try disabling it, or search again later."
        ),
        Error::Search(e) => println!(
            "⚠️  There was a problem with your internet while searching: {e}"
        ),
        Error::DuplicateQuery(_) => println!("This query is cached in your history already."),
        Error::BudgetExceeded { needed, max } => println!(
            "⚠️  The conversation and findings no longer fit the token ceiling ({needed} needed, {max} allowed). Start a new session or raise --max-total-tokens."
        ),
        other => println!("⚠️  {other}"),
    }
}

fn read_line(prompt: &str) -> Option<String> {
    print!("{prompt}");
    std::io::stdout().flush().ok()?;
    let mut line = String::new();
    match std::io::stdin().read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line.trim_end_matches(['\n', '\r']).to_string()),
        Err(_) => None,
    }
}

fn print_help() {
    println!("Commands:");
    println!("  /search <query>   crawl the web for the query and cache the findings");
    println!("  /findings         show the latest findings and their sources");
    println!("  /persona <name>   switch persona (resets the conversation)");
    println!("  /history          show the conversation so far");
    println!("  /quit             leave");
    println!("Anything else is a chat message.");
}

fn print_findings(session: &Session) {
    match session.latest_query() {
        None => println!("No search has been run this session."),
        Some(query) => {
            println!("# {query}");
            for finding in session.latest_findings() {
                println!("{}", quest_core::conversation::escape_markdown_literal(finding));
            }
            println!("Sources:");
            for source in session.latest_sources() {
                println!("  {source}");
            }
        }
    }
}

async fn handle_search(session: &mut Session, query: &str) {
    match session.run_search(query).await {
        Ok(report) => {
            println!(
                "{} pages contributed {} new snippets ({} cached in total).",
                report.pages_contributing, report.new_records, report.total_records
            );
            if report.findings.is_empty() {
                println!("Nothing useful was extracted; chat will proceed without findings.");
            } else {
                println!("Findings are ready; ask away.");
            }
        }
        Err(Error::DuplicateQuery(query)) => {
            print_warning(&Error::DuplicateQuery(query.clone()));
            let findings = session.recall_query(&query);
            if !findings.is_empty() {
                println!("Loaded {} cached findings for the prompt.", findings.len());
            }
        }
        Err(e) => print_warning(&e),
    }
}

async fn run_chat(cmd: ChatCmd) -> Result<()> {
    let Some(persona) = Persona::parse(&cmd.persona) else {
        anyhow::bail!(
            "unknown persona {:?}; allowed: strictly-factual, factual, neutral, creative, very-creative",
            cmd.persona
        );
    };
    let data_dir = resolve_data_dir(cmd.data_dir);

    let api_key = match credential::load_api_key(&data_dir) {
        Some(key) => key,
        None => credential::capture_api_key(&data_dir)?,
    };

    let client = quest_local::default_client()?;
    let search = WebSearchProvider::from_env(client.clone());
    let fetcher = PageFetcher::new(client.clone());
    let completion = OpenAiCompletionClient::from_env(client, api_key)?;

    let mut config = SessionConfig::new(persona, data_dir);
    config.max_total_tokens = cmd.max_total_tokens;
    config.target_pages = cmd.pages;
    config.temperature = cmd.temperature;
    config.max_prompt_findings = cmd.max_findings;
    config.background_save = cmd.background_save;

    let mut session = Session::open(
        config,
        Box::new(search),
        Box::new(fetcher),
        Box::new(completion),
    );

    println!(
        "quest {} | persona {}, {} snippets cached",
        env!("CARGO_PKG_VERSION"),
        session.persona().name(),
        session.store().len()
    );
    println!("Type a message to chat, /search <query> to look something up, /help for commands.");

    loop {
        let Some(line) = read_line("you> ") else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix('/') {
            let (command, arg) = match rest.split_once(' ') {
                Some((c, a)) => (c, a.trim()),
                None => (rest, ""),
            };
            match command {
                "quit" | "exit" => break,
                "help" => print_help(),
                "history" => {
                    for turn in session.render_conversation() {
                        println!("{turn}");
                        println!("---");
                    }
                }
                "findings" => print_findings(&session),
                "persona" => match Persona::parse(arg) {
                    Some(p) => {
                        if session.set_persona(p) {
                            println!("Persona set to {}; conversation reset.", p.name());
                        } else {
                            println!("Persona is already {}.", p.name());
                        }
                    }
                    None => println!(
                        "⚠️  Unknown persona {arg:?}. Allowed: strictly-factual, factual, neutral, creative, very-creative"
                    ),
                },
                "search" => {
                    if arg.is_empty() {
                        println!("⚠️  Usage: /search <query>");
                    } else {
                        handle_search(&mut session, arg).await;
                    }
                }
                _ => println!("⚠️  Unknown command /{command}. /help lists commands."),
            }
            continue;
        }

        match session.chat(line).await {
            Ok(answer) => println!("🖥️Assistant: {}", answer.trim()),
            Err(e) => print_warning(&e),
        }
    }

    Ok(())
}

async fn run_search_once(cmd: SearchCmd) -> Result<()> {
    let data_dir = resolve_data_dir(cmd.data_dir);
    let client = quest_local::default_client()?;
    let search = WebSearchProvider::from_env(client.clone());
    let fetcher = PageFetcher::new(client);

    let store_file = StoreFile::in_dir(&data_dir);
    let mut store = store_file.load();

    match crawler::crawl(&search, &fetcher, &store, &cmd.query, cmd.pages).await {
        Ok(outcome) => {
            let new_records = store.merge(outcome.records);
            store_file.save(&store)?;
            println!(
                "{} pages contributed {} new snippets ({} cached in total).",
                outcome.pages_contributing,
                new_records,
                store.len()
            );
            for record in store.findings_for(&cmd.query) {
                println!("[{}] {}", record.link, record.text);
            }
            Ok(())
        }
        Err(Error::DuplicateQuery(query)) => {
            println!("This query is cached in your history already.");
            for record in store.findings_for(&query) {
                println!("[{}] {}", record.link, record.text);
            }
            Ok(())
        }
        Err(e) => {
            print_warning(&e);
            std::process::exit(1);
        }
    }
}

fn run_doctor(cmd: DoctorCmd) -> Result<()> {
    let data_dir = resolve_data_dir(cmd.data_dir);
    let store_file = StoreFile::in_dir(&data_dir);
    let store_exists = store_file.path().exists();
    let records = if store_exists {
        Some(store_file.load().len())
    } else {
        None
    };

    let report = serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "data_dir": data_dir.display().to_string(),
        "store_path": store_file.path().display().to_string(),
        "store_exists": store_exists,
        "records": records,
        "has_api_key": credential::load_api_key(&data_dir).is_some(),
        "search_endpoint": WebSearchProvider::from_env(reqwest_placeholder_client()).endpoint().to_string(),
        "openai_base_url": std::env::var("QUEST_OPENAI_BASE_URL").ok(),
        "openai_model": std::env::var("QUEST_OPENAI_MODEL").ok(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Doctor only needs the provider's resolved endpoint, never a request.
fn reqwest_placeholder_client() -> reqwest::Client {
    reqwest::Client::new()
}
