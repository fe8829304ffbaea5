//! ai-query — 多厂商 AI 查询编排器的命令行入口
//!
//! Usage:
//!   ai-query ask [--provider <id>|auto] [--context <text>] [--system <text>] <message...>
//!   ai-query status                                  Show per-backend rate windows
//!   ai-query version | help

use ai_query_orchestrator::{
    OrchestratorConfig, ProviderPreference, QueryOrchestrator, QueryOrchestratorBuilder,
    QueryRequest,
};
use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    match args[1].as_str() {
        "ask" => cmd_ask(&args[2..]).await,
        "status" => cmd_status(&args[2..]).await,
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!(
        r#"ai-query — 多厂商 AI 查询编排器

USAGE:
    ai-query <COMMAND> [OPTIONS]

COMMANDS:
    ask [OPTIONS] <message...>  Answer a query and print the response as JSON
        --provider <id|auto>    perplexity, openai, gemini, anthropic or auto (default)
        --context <text>        Extra context for the backend
        --system <text>         System prompt
        --config <file>         YAML settings file
    status [--config <file>]    Show per-backend rate-limit windows
    version                     Show version information
    help                        Show this help message

ENVIRONMENT:
    PERPLEXITY_API_KEY, OPENAI_API_KEY, GEMINI_API_KEY, ANTHROPIC_API_KEY
    AI_QUERY_*                  Orchestrator settings (see OrchestratorConfig)
    RUST_LOG                    Log filter (default: info)"#
    );
}

fn cmd_version() {
    println!("ai-query {}", env!("CARGO_PKG_VERSION"));
}

#[derive(Debug, Default)]
struct AskArgs {
    provider: ProviderPreference,
    context: Option<String>,
    system: Option<String>,
    config: Option<String>,
    message: Vec<String>,
}

fn parse_ask(args: &[String]) -> anyhow::Result<AskArgs> {
    let mut parsed = AskArgs::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .with_context(|| format!("{flag} requires a value"))
        };
        match arg.as_str() {
            "--provider" => {
                parsed.provider = ProviderPreference::try_from(value("--provider")?)?;
            }
            "--context" => parsed.context = Some(value("--context")?),
            "--system" => parsed.system = Some(value("--system")?),
            "--config" => parsed.config = Some(value("--config")?),
            _ => parsed.message.push(arg.clone()),
        }
    }
    Ok(parsed)
}

fn config_flag(args: &[String]) -> Option<&str> {
    args.iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn load_config(path: Option<&str>) -> anyhow::Result<OrchestratorConfig> {
    match path {
        Some(p) => {
            let doc = std::fs::read_to_string(p)
                .with_context(|| format!("cannot read config file {p}"))?;
            Ok(OrchestratorConfig::from_yaml_str(&doc)?)
        }
        None => Ok(OrchestratorConfig::from_env()?),
    }
}

async fn build(config: OrchestratorConfig) -> anyhow::Result<QueryOrchestrator> {
    let orchestrator = QueryOrchestratorBuilder::new()
        .config(config)
        .http_adapters()?
        .build()
        .await?;
    Ok(orchestrator)
}

async fn cmd_ask(args: &[String]) -> anyhow::Result<()> {
    let ask = parse_ask(args)?;
    if ask.message.is_empty() {
        bail!("ask requires a message");
    }

    let mut request = QueryRequest::new(ask.message.join(" ")).with_preference(ask.provider);
    if let Some(ctx) = ask.context {
        request = request.with_context(ctx);
    }
    if let Some(sys) = ask.system {
        request = request.with_system_prompt(sys);
    }

    let orchestrator = build(load_config(ask.config.as_deref())?).await?;
    let result = orchestrator.query(request).await;
    orchestrator.dispose();

    let response = result?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn cmd_status(args: &[String]) -> anyhow::Result<()> {
    let orchestrator = build(load_config(config_flag(args))?).await?;
    let status = orchestrator.provider_status().await;
    orchestrator.dispose();

    println!("{:<12} {:>6} {:>6}  {}", "BACKEND", "USED", "LIMIT", "AVAILABLE");
    for s in status {
        let limit = s
            .limit
            .map(|l| l.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<12} {:>6} {:>6}  {}",
            s.backend.id(),
            s.requests_used_in_window,
            limit,
            if s.available_now { "yes" } else { "no" }
        );
    }
    Ok(())
}
