use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use cardsearch_cache::QueryCache;
use cardsearch_core::config::{Config, Settings};
use cardsearch_core::{EntityType, HierarchyMode, ScopeConfig, SearchResult, Strategy};
use cardsearch_engine::{Autofill, Dispatcher, QueryState, SessionCallbacks, SessionConfig, SessionHandle, SessionSnapshot, TokioScheduler};
use cardsearch_exec::HttpSearchApi;

#[derive(Parser)]
#[command(name = "cardsearch", about = "Search sets, set products, cards and products")]
struct Cli {
    /// Directory holding config.toml (defaults to APP_CONFIG_DIR or the working directory).
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one search and print `type<TAB>id<TAB>displayName` per result.
    Search {
        query: String,
        #[arg(long, value_delimiter = ',')]
        types: Vec<EntityType>,
        #[arg(long)]
        strategy: Option<Strategy>,
        #[arg(long)]
        limit: Option<usize>,
        /// Extra backend filter, repeatable.
        #[arg(long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },
    /// Interactive parent/child browsing driven by stdin.
    Browse {
        #[arg(long)]
        mode: Option<HierarchyMode>,
    },
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

fn load_settings(config_dir: Option<PathBuf>) -> anyhow::Result<Settings> {
    let config = match config_dir {
        Some(dir) => {
            let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
            Config::load_from(&dir, &env_name)?
        }
        None => Config::load()?,
    };
    config.settings()
}

fn dispatcher(settings: &Settings) -> Arc<Dispatcher> {
    let api = Arc::new(HttpSearchApi::from_settings(&settings.api));
    Arc::new(Dispatcher::with_cache(api, QueryCache::from_settings(&settings.cache)))
}

async fn search(
    settings: &Settings,
    query: &str,
    types: Vec<EntityType>,
    strategy: Option<Strategy>,
    limit: Option<usize>,
    filters: Vec<(String, String)>,
) -> anyhow::Result<()> {
    let strategy = strategy.unwrap_or(settings.search.strategy);
    if strategy == Strategy::Hierarchical {
        bail!("use `cardsearch browse` for hierarchical search");
    }
    let min_length = match strategy {
        Strategy::Autocomplete => settings.autocomplete.min_length,
        _ => settings.search.min_length,
    };
    if !searchable(query, min_length) {
        tracing::debug!(query, min_length, "query below minimum length; not searching");
        return Ok(());
    }
    let types = if types.is_empty() { settings.search.types.clone() } else { types };
    let mut scope = ScopeConfig::new(types).with_limit(limit.unwrap_or(settings.search.limit));
    scope.filters.extend(filters);

    let aggregate = dispatcher(settings).dispatch(strategy, query, &scope, None).await;
    for r in &aggregate.results {
        println!("{}\t{}\t{}", r.kind, r.id, r.display_name);
    }
    if let Some(error) = aggregate.error() {
        if aggregate.is_total_failure() {
            bail!(error);
        }
        eprintln!("warning: {error}");
    }
    Ok(())
}

fn searchable(query: &str, min_length: usize) -> bool {
    QueryState { raw: query.to_string(), debounced: query.to_string(), min_length }.is_searchable()
}

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Query(String),
    Pick(usize),
    Refetch,
    Clear,
    Reset,
    Quit,
    Unknown(String),
}

fn parse_input(line: &str) -> Input {
    let Some(cmd) = line.strip_prefix(':') else {
        return Input::Query(line.to_string());
    };
    let mut parts = cmd.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("pick"), Some(n)) => n.parse().map_or_else(|_| Input::Unknown(line.to_string()), Input::Pick),
        (Some("refetch"), None) => Input::Refetch,
        (Some("clear"), None) => Input::Clear,
        (Some("reset"), None) => Input::Reset,
        (Some("quit" | "q"), None) => Input::Quit,
        _ => Input::Unknown(line.to_string()),
    }
}

fn print_snapshot(snap: &SessionSnapshot) {
    if let Some(parent) = snap.hierarchy.as_ref().and_then(|h| h.parent_selected.as_ref()) {
        println!("parent: {} {} ({})", parent.kind, parent.display_name, parent.id);
    }
    if let Some(children) = snap.hierarchy.as_ref().map(|h| &h.child_results).filter(|c| !c.is_empty()) {
        let picked: Vec<&str> = children.iter().map(|c| c.display_name.as_str()).collect();
        println!("picked: {}", picked.join(", "));
    }
    println!("query: {:?}", snap.query);
    for (i, r) in snap.results.iter().enumerate() {
        println!("{:>3}. {}\t{}\t{}", i + 1, r.kind, r.id, r.display_name);
    }
    if let Some(error) = &snap.error {
        println!("error: {error}");
    }
}

async fn browse(settings: &Settings, mode: Option<HierarchyMode>) -> anyhow::Result<()> {
    let Some(mode) = mode.or(settings.search.hierarchy) else {
        bail!("no hierarchy mode; pass --mode or set search.hierarchy");
    };
    let config = SessionConfig::hierarchical(mode)
        .with_min_length(settings.search.min_length)
        .with_debounce(Duration::from_millis(settings.search.debounce_ms))
        .with_limit(settings.search.limit);
    let debounce = config.debounce;
    let patience = debounce + Duration::from_millis(settings.api.timeout_ms);

    let callbacks = SessionCallbacks::default().on_autofill(|fill: &Autofill| {
        if let Ok(fields) = serde_json::to_string(fill.fields()) {
            println!("autofill: {fields}");
        }
    });
    let session = SessionHandle::spawn(config, dispatcher(settings), Arc::new(TokioScheduler), callbacks);
    println!("browsing {mode}; type to search, :pick <n>, :refetch, :clear, :reset, :quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let mut wait = Duration::from_millis(10);
        match parse_input(line.trim_end()) {
            Input::Quit => break,
            Input::Query(q) => {
                session.set_query(q);
                wait += debounce;
            }
            Input::Pick(n) => match pick(&session.snapshot().results, n) {
                Some(result) => session.select_result(result),
                None => {
                    eprintln!("no result #{n}");
                    continue;
                }
            },
            Input::Refetch => session.refetch(),
            Input::Clear => session.clear_results(),
            Input::Reset => session.reset(),
            Input::Unknown(raw) => {
                eprintln!("unknown command: {raw}");
                continue;
            }
        }
        tokio::time::sleep(wait).await;
        if tokio::time::timeout(patience, session.wait_for(|s| !s.loading)).await.is_err() {
            tracing::warn!("search still running after {patience:?}");
        }
        print_snapshot(&session.snapshot());
    }
    session.shutdown().await;
    Ok(())
}

fn pick(results: &[SearchResult], n: usize) -> Option<SearchResult> { results.get(n.checked_sub(1)?).cloned() }

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config_dir).map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;

    match cli.command {
        Command::Search { query, types, strategy, limit, filters } => {
            search(&settings, &query, types, strategy, limit, filters).await
        }
        Command::Browse { mode } => browse(&settings, mode).await,
    }
}
