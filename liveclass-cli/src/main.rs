use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::*;
use dialoguer::Select;
use liveclass_core::{ChatMessage, ConnectionStatus, Notice, NoticeLevel, Role, SessionHandle};
use liveclass_session::{
    HttpRelay, LiveSession, NoticeStream, RtcConnector, SessionConfig, SessionController,
    SessionPhase, SessionSnapshot, SyntheticCapture,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "liveclass")]
#[command(about = "Join a two-party live class from the terminal")]
struct Cli {
    /// Base URL of the signaling relay.
    #[arg(long, default_value = "http://localhost:8000")]
    relay: String,

    /// Live class id shared by both participants.
    #[arg(short, long)]
    session: String,

    /// Asked interactively when omitted.
    #[arg(short, long, value_enum)]
    role: Option<RoleArg>,

    /// TOML file with session settings.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the relay poll interval.
    #[arg(long)]
    poll_ms: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Educator,
    Student,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Educator => Role::Initiator,
            RoleArg::Student => Role::Responder,
        }
    }
}

const HELP: &str = "/video  toggle camera\n/audio  toggle microphone\n/screen toggle screen share\n/status show session state\n/quit   leave the class\nanything else is sent as chat";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,liveclass_session=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let role = match cli.role {
        Some(arg) => arg.into(),
        None => pick_role()?,
    };

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(ms) = cli.poll_ms {
        config = config.with_poll_interval(Duration::from_millis(ms));
    }

    let relay = HttpRelay::new(cli.relay.clone()).context("Failed to build relay client")?;

    println!(
        "{} {} as {}",
        "🚀 Joining live class".green().bold(),
        cli.session.bold(),
        role.display_name().cyan()
    );
    println!("   📡 Relay: {}", relay.base_url());
    println!(
        "   ⏳ Waiting for the {}",
        role.peer().display_name().to_lowercase()
    );

    let (controller, notices) = LiveSession::start(
        config,
        SessionHandle::new(cli.session),
        role,
        Arc::new(relay),
        Arc::new(RtcConnector::default()),
        Arc::new(SyntheticCapture::new(role.to_string())),
    );

    tokio::spawn(print_notices(notices));
    tokio::spawn(print_updates(controller.subscribe(), role));

    println!("{}", "Type /help for commands.".dimmed());

    let finished = wait_finished(controller.subscribe());
    tokio::pin!(finished);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,

            _ = &mut finished => {
                println!("{}", "Session ended.".yellow());
                break;
            }

            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                if !run_command(&controller, line.trim()).await {
                    break;
                }
            }
        }
    }

    controller.close().await.context("Failed to close session")?;
    println!("{}", "👋 Left the live class".green());
    Ok(())
}

fn pick_role() -> Result<Role> {
    let roles = [Role::Initiator, Role::Responder];
    let names: Vec<&str> = roles.iter().map(|r| r.display_name()).collect();
    let picked = Select::new()
        .with_prompt("Join as")
        .items(&names)
        .default(0)
        .interact()
        .context("Failed to read role")?;
    Ok(roles[picked])
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("Invalid config {}", path.display()))
}

/// Returns false when the user asked to leave.
async fn run_command(controller: &SessionController, line: &str) -> bool {
    match line {
        "" => {}
        "/quit" | "/exit" => return false,
        "/help" => println!("{}", HELP.dimmed()),
        "/status" => print_status(&controller.snapshot()),
        "/video" => {
            if let Err(e) = controller.toggle_video().await {
                eprintln!("{} {}", "✗".red(), e);
            }
        }
        "/audio" => {
            if let Err(e) = controller.toggle_audio().await {
                eprintln!("{} {}", "✗".red(), e);
            }
        }
        // Failures are also reported as notices.
        "/screen" => {
            if let Err(e) = controller.toggle_screen_share().await {
                tracing::debug!("Screen share toggle failed: {}", e);
            }
        }
        text => {
            if let Err(e) = controller.send_chat(text).await {
                tracing::debug!("Chat send failed: {}", e);
            }
        }
    }
    true
}

async fn print_notices(mut notices: NoticeStream) {
    while let Some(notice) = notices.recv().await {
        println!("{}", paint(notice));
    }
}

fn paint(notice: Notice) -> ColoredString {
    let text = notice.message();
    match notice.level() {
        NoticeLevel::Success => format!("✅ {text}").green(),
        NoticeLevel::Info => format!("ℹ️  {text}").cyan(),
        NoticeLevel::Warning => format!("⚠️  {text}").yellow(),
        NoticeLevel::Error => format!("❌ {text}").red().bold(),
    }
}

/// Prints status changes and chat lines from the other side.
async fn print_updates(mut rx: watch::Receiver<SessionSnapshot>, role: Role) {
    let mut status = rx.borrow().status;
    let mut seen = rx.borrow().messages.len();

    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow_and_update().clone();
        if snapshot.status != status {
            status = snapshot.status;
            println!("   status: {}", paint_status(status));
        }
        for message in snapshot.messages.iter().skip(seen) {
            if message.sender != role {
                print_message(message);
            }
        }
        seen = snapshot.messages.len();
    }
}

fn print_message(message: &ChatMessage) {
    println!(
        "{} {} {}",
        message.timestamp.format("%H:%M:%S").to_string().dimmed(),
        format!("{}:", message.sender.display_name()).magenta().bold(),
        message.text
    );
}

fn paint_status(status: ConnectionStatus) -> ColoredString {
    let text = status.to_string();
    match status {
        ConnectionStatus::Connecting => text.yellow(),
        ConnectionStatus::Connected => text.green(),
        ConnectionStatus::Disconnected => text.yellow().bold(),
        ConnectionStatus::Failed => text.red().bold(),
    }
}

fn print_status(snapshot: &SessionSnapshot) {
    let flag = |on: bool| if on { "on".green() } else { "off".red() };
    println!("   phase:   {}", snapshot.phase);
    println!("   status:  {}", paint_status(snapshot.status));
    println!("   camera:  {}", flag(snapshot.video_enabled));
    println!("   mic:     {}", flag(snapshot.audio_enabled));
    println!("   screen:  {}", flag(snapshot.screen_sharing));
    println!("   chat:    {}", flag(snapshot.chat_open));
    println!("   remote:  {} track(s)", snapshot.remote_tracks.len());
}

async fn wait_finished(mut rx: watch::Receiver<SessionSnapshot>) {
    loop {
        if matches!(
            rx.borrow_and_update().phase,
            SessionPhase::Failed | SessionPhase::Closed
        ) {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}
