//! Alicia CLI: send one message through the runtime from the command line
//!
//! Usage:
//!   alicia-cli ask <message> [--provider <id>] [--model <name>] [--skill <name>]...
//!   alicia-cli tools [--workspace <path>]          Show the resolved tool set
//!   alicia-cli help                                Show usage

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;

use alicia_runtime::tooling::ToolingConfigResolver;
use alicia_runtime::{
    Assistant, AssistantRequest, ContinuationMode, InMemoryRuntimeSettings, LocalAssistant,
    ProviderId, ResponsesAssistant, RoutedAssistant, RuntimeSettings, ToolSetBuilder,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    match args[1].as_str() {
        "ask" => cmd_ask(&args[2..]).await,
        "tools" => cmd_tools(&args[2..]),
        "version" | "--version" | "-V" => {
            println!("alicia-cli {}", env!("CARGO_PKG_VERSION"));
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
        r#"alicia-cli - Alicia runtime command line

USAGE:
    alicia-cli <COMMAND> [OPTIONS]

COMMANDS:
    ask <message>               Answer one message
        --provider <id>         local | openai (default: local)
        --model <name>          Model name (default: gpt-5 for openai)
        --skill <name>          Enable a local skill (repeatable)
        --workspace <path>      Workspace root for skills and persona (default: current dir)
        --full-transcript       Resend the whole transcript on continuations
    tools [--workspace <path>]  Show the tool set resolved from the environment
    version                     Show version information
    help                        Show this help message

ENVIRONMENT:
    OPENAI_API_KEY              API key for the openai provider
    ALICIA_OPENAI_*             Tooling and client configuration
    ALICIA_<LAYER>_PATH         Persona layer file (IDENTITY, SOUL, VOICE, MODES)
    RUST_LOG                    Log filter (default: info)"#
    );
}

#[derive(Debug, Default)]
struct AskOptions {
    message: Vec<String>,
    provider: Option<String>,
    model: Option<String>,
    skills: Vec<String>,
    workspace: Option<PathBuf>,
    full_transcript: bool,
}

fn parse_ask(args: &[String]) -> anyhow::Result<AskOptions> {
    let mut opts = AskOptions::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--provider" => opts.provider = Some(value_of(&mut iter, arg)?),
            "--model" => opts.model = Some(value_of(&mut iter, arg)?),
            "--skill" => opts.skills.push(value_of(&mut iter, arg)?),
            "--workspace" => opts.workspace = Some(PathBuf::from(value_of(&mut iter, arg)?)),
            "--full-transcript" => opts.full_transcript = true,
            _ => opts.message.push(arg.clone()),
        }
    }
    Ok(opts)
}

fn value_of<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> anyhow::Result<String> {
    match iter.next() {
        Some(v) => Ok(v.clone()),
        None => bail!("{flag} requires a value"),
    }
}

fn workspace_or_cwd(workspace: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match workspace {
        Some(path) => Ok(path),
        None => std::env::current_dir().context("cannot read the current directory"),
    }
}

async fn cmd_ask(args: &[String]) -> anyhow::Result<()> {
    let opts = parse_ask(args)?;
    let message = opts.message.join(" ");
    if message.trim().is_empty() {
        bail!("ask requires a message");
    }

    let provider: ProviderId = opts.provider.as_deref().unwrap_or("local").parse()?;
    let model = match (&opts.model, provider) {
        (Some(model), _) => model.clone(),
        (None, ProviderId::Local) => RuntimeSettings::default().model,
        (None, _) => "gpt-5".to_string(),
    };
    let settings = Arc::new(InMemoryRuntimeSettings::new(
        RuntimeSettings::new(provider, model).with_enabled_skills(opts.skills),
    ));

    let local: Arc<dyn Assistant> = Arc::new(LocalAssistant::new(settings.clone()));
    let mut router = RoutedAssistant::new(settings.clone(), local);
    if provider == ProviderId::OpenAi {
        let mode = if opts.full_transcript {
            ContinuationMode::FullTranscript
        } else {
            ContinuationMode::PreviousResponseId
        };
        let responses = ResponsesAssistant::builder()
            .settings(settings.clone())
            .workspace_root(workspace_or_cwd(opts.workspace)?)
            .continuation_mode(mode)
            .build()
            .context("failed to configure the Responses assistant")?;
        router = router.route(ProviderId::OpenAi, Arc::new(responses));
    }

    let outcome = router
        .respond(&AssistantRequest::new(uuid::Uuid::new_v4().to_string(), message))
        .await?;

    println!("{}", outcome.text);
    eprintln!();
    for (key, value) in outcome.metadata.to_map() {
        eprintln!("  {key}: {value}");
    }
    Ok(())
}

fn cmd_tools(args: &[String]) -> anyhow::Result<()> {
    let mut workspace = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--workspace" {
            workspace = Some(PathBuf::from(value_of(&mut iter, arg)?));
        }
    }

    let config = ToolingConfigResolver::new(workspace_or_cwd(workspace)?).resolve();
    let tool_set = ToolSetBuilder::new().build(&config, &config.enabled_skill_names);

    println!("Tools ({}):", tool_set.len());
    for name in &tool_set.tool_names {
        println!("  ✓ {name}");
    }
    if !tool_set.warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &tool_set.warnings {
            println!("  ⚠ {warning}");
        }
    }
    for hint in &tool_set.system_hints {
        println!("\n{hint}");
    }
    Ok(())
}
