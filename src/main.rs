use anyhow::{anyhow, Result};
use bat::PrettyPrinter;
use clap::{Args, Parser, Subcommand};
use cliclack::{input, spinner};
use console::style;
use dotenv::dotenv;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use gpt_dialog::agent::{Agent, AgentConfig};
use gpt_dialog::debate::{DebateOptions, WindowBound};
use gpt_dialog::group::{Group, ModeratorOverrides};
use gpt_dialog::prompts::{BOTS_SYSTEM_MESSAGE, CONTROL_SYSTEM_MESSAGE};
use gpt_dialog::providers::base::{Provider, Usage};
use gpt_dialog::providers::configs::base::ProviderConfig;
use gpt_dialog::providers::configs::openai::OpenAiProviderConfig;
use gpt_dialog::providers::openai::OpenAiProvider;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// OpenAI API Key (can also be set via OPENAI_API_KEY environment variable)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// API host (can also be set via OPENAI_API_HOST environment variable)
    #[arg(long, global = true)]
    host: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Let a group of agents debate a question and have a moderator conclude
    Debate(DebateArgs),
    /// Talk to a single agent
    Chat(ChatArgs),
}

#[derive(Args)]
struct DebateArgs {
    /// Question to debate; prompted for when missing
    #[arg(short, long)]
    question: Option<String>,

    /// Number of debating agents
    #[arg(short, long, default_value_t = 2)]
    bots: usize,

    /// Rounds in which every agent speaks once
    #[arg(short, long, default_value_t = 1)]
    iterations: usize,

    /// Model to use
    #[arg(short, long, default_value = "gpt-3.5-turbo")]
    model: String,

    /// Model for the moderator, defaults to --model
    #[arg(long)]
    moderator_model: Option<String>,

    /// System message every agent starts with
    #[arg(long, default_value = BOTS_SYSTEM_MESSAGE)]
    bot_system: String,

    /// Extra system message appended to every agent's before the question
    #[arg(long)]
    shared_system: Option<String>,

    /// System message for the moderator
    #[arg(long)]
    moderator_system: Option<String>,

    /// Window size after the first round: members, members-minus-one or a number
    #[arg(long, default_value_t = WindowBound::MembersMinusOne)]
    window: WindowBound,

    /// Reuse the moderator and its history for the conclusion instead of
    /// rebuilding it; --moderator-model is ignored when set
    #[arg(long)]
    keep_moderator: bool,

    /// Ask a single agent first, without debate, for comparison
    #[arg(long)]
    control: bool,

    /// Do not log each turn as it is produced
    #[arg(long)]
    quiet: bool,

    /// Print the transcript and conclusion as JSON
    #[arg(long)]
    json: bool,
}

impl DebateArgs {
    fn remove_cache(&self) -> bool {
        !self.keep_moderator
    }
}

#[derive(Args)]
struct ChatArgs {
    /// Model to use
    #[arg(short, long, default_value = "gpt-3.5-turbo")]
    model: String,

    /// Name shown for the agent
    #[arg(short, long, default_value = "assistant")]
    name: String,

    /// System message for the agent
    #[arg(short, long)]
    system: Option<String>,

    /// Maximum number of exchanges
    #[arg(long, default_value_t = 10000)]
    max_chats: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Ok(path) = dotenv() {
        debug!("Loaded environment from {:?}", path);
    }

    let cli = Cli::parse();

    let mut config = OpenAiProviderConfig::from_env()?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if cli.api_key.is_some() {
        config.api_key = cli.api_key;
    }
    let provider: Arc<dyn Provider> = Arc::new(OpenAiProvider::new(config)?);

    match cli.command {
        Command::Debate(args) => debate(provider, args),
        Command::Chat(args) => chat(provider, args),
    }
}

fn debate(provider: Arc<dyn Provider>, args: DebateArgs) -> Result<()> {
    let question = match args.question.clone() {
        Some(question) => question,
        None => input("What do you want to debate?").interact()?,
    };

    let control = if args.control {
        let mut bot = Agent::new(
            AgentConfig::new("control", &args.model)
                .with_system_message(Some(CONTROL_SYSTEM_MESSAGE)),
            provider.clone(),
        );
        let answer = with_spinner(!args.json, "asking the control agent", || bot.chat(&question))?;
        if !args.json {
            println!("{}", style("Control").bold());
            render(&answer)?;
        }
        Some(answer)
    } else {
        None
    };

    let mut group = Group::create_bots(
        provider,
        args.bots,
        &args.model,
        Some(&args.bot_system),
        args.moderator_system.as_deref(),
        None,
    );
    let options = DebateOptions {
        iterations: args.iterations,
        verbose: !args.quiet,
        window: args.window,
    };
    info!(
        bots = args.bots,
        iterations = args.iterations,
        window = %args.window,
        "starting debate"
    );

    let transcript = group.launch_debate(&question, args.shared_system.as_deref(), &options)?;

    let overrides = ModeratorOverrides {
        model: args.moderator_model.clone(),
        ..ModeratorOverrides::default()
    };
    let conclusion = with_spinner(!args.json, "awaiting conclusion", || {
        group.get_conclusion(&question, transcript.clone(), overrides, args.remove_cache())
    })?;

    let mut usage = group.moderator().usage().clone();
    for bot in group.members() {
        usage.add(bot.usage());
    }
    log_usage(&usage);

    if args.json {
        let output = json!({
            "question": question,
            "control": control,
            "transcript": transcript,
            "conclusion": conclusion,
            "usage": usage,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", style("Moderator").bold());
        render(&conclusion)?;
    }
    Ok(())
}

fn chat(provider: Arc<dyn Provider>, args: ChatArgs) -> Result<()> {
    let mut agent = Agent::new(
        AgentConfig::new(&args.name, &args.model).with_system_message(args.system.as_deref()),
        provider,
    );

    println!(
        "gpt-dialog chat {}",
        style("- type \"exit\" to end the session").dim()
    );
    println!("\n");

    for _ in 0..args.max_chats {
        let message_text: String = input("You:").placeholder("").interact()?;

        if message_text.trim().eq_ignore_ascii_case("exit") {
            break;
        }

        let reply = with_spinner(true, "awaiting reply", || agent.chat(&message_text))?;

        println!("{}", style(format!("Assistant {}:", agent.name())).bold());
        render(&reply)?;
        println!("\n");
    }

    log_usage(agent.usage());
    Ok(())
}

fn with_spinner<T>(enabled: bool, message: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    if !enabled {
        return f();
    }
    let spin = spinner();
    spin.start(message);
    let result = f();
    spin.stop("");
    result
}

fn log_usage(usage: &Usage) {
    info!(
        input_tokens = ?usage.input_tokens,
        output_tokens = ?usage.output_tokens,
        total_tokens = ?usage.total_tokens,
        "token usage"
    );
}

fn render(content: &str) -> Result<()> {
    PrettyPrinter::new()
        .input_from_bytes(content.as_bytes())
        .language("markdown")
        .print()
        .map_err(|e| anyhow!("failed to render reply: {}", e))?;
    Ok(())
}
