use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use ticktock_cli::commands::{self, Action};
use ticktock_cli::logging;
use ticktock_cli::readline;
use ticktock_cli::CliContext;
use ticktock_core::{LifecycleEvent, TimeUnit};

#[tokio::main]
async fn main() -> Result<(), String> {
    logging::init();
    let ctx = CliContext::new();

    loop {
        let line = readline().await?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &ctx).await {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                write!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    ctx.cancel_all().await;
    Ok(())
}

#[derive(Parser)]
#[command(version, about = "periodic interval playground")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fire once after N ticks
    Timeout { seconds: i64 },
    /// Count down to zero
    Down {
        from: i64,
        #[arg(short, long)]
        period: Option<u64>,
    },
    /// Count up from zero
    Up {
        end: i64,
        #[arg(short, long)]
        period: Option<u64>,
    },
    /// Tick forever; not bound to the session lifecycle
    Poll {
        #[arg(short, long)]
        period: Option<u64>,
    },
    /// Load an interval definition from a TOML file
    Load {
        name: String,
        #[arg(short, long)]
        path: PathBuf,
    },
    Start { name: String },
    Stop { name: String },
    Cancel { name: String },
    Pause { name: String },
    Resume { name: String },
    Reset { name: String },
    Switch { name: String },
    List,
    /// Emit a lifecycle event to every bound interval
    Emit {
        #[arg(value_parser = commands::parse_event)]
        event: LifecycleEvent,
    },
    Destroy,
    Config,
    Set {
        #[arg(short, long)]
        period: Option<u64>,
        #[arg(short, long, value_parser = commands::parse_unit)]
        unit: Option<TimeUnit>,
        #[arg(short, long, value_parser = commands::parse_event)]
        life_event: Option<LifecycleEvent>,
    },
    Exit,
}

async fn respond(line: &str, ctx: &CliContext) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "ticktock".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match &cli.command {
        Some(Commands::Timeout { seconds }) => commands::time_out(ctx, *seconds).await,
        Some(Commands::Down { from, period }) => commands::countdown(ctx, *from, *period).await,
        Some(Commands::Up { end, period }) => commands::count_up(ctx, *end, *period).await,
        Some(Commands::Poll { period }) => commands::poll(ctx, *period).await,
        Some(Commands::Load { name, path }) => commands::load(ctx, name, path).await,
        Some(Commands::Start { name }) => commands::control(ctx, name, Action::Start).await,
        Some(Commands::Stop { name }) => commands::control(ctx, name, Action::Stop).await,
        Some(Commands::Cancel { name }) => commands::control(ctx, name, Action::Cancel).await,
        Some(Commands::Pause { name }) => commands::control(ctx, name, Action::Pause).await,
        Some(Commands::Resume { name }) => commands::control(ctx, name, Action::Resume).await,
        Some(Commands::Reset { name }) => commands::control(ctx, name, Action::Reset).await,
        Some(Commands::Switch { name }) => commands::control(ctx, name, Action::Switch).await,
        Some(Commands::List) => commands::list(ctx).await,
        Some(Commands::Emit { event }) => commands::emit(ctx, *event),
        Some(Commands::Destroy) => commands::destroy(ctx),
        Some(Commands::Config) => commands::show_config(ctx).await,
        Some(Commands::Set {
            period,
            unit,
            life_event,
        }) => commands::update_config(ctx, *period, *unit, *life_event).await,
        Some(Commands::Exit) => {
            commands::exit();
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}
