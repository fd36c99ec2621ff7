use clap::{Parser, Subcommand};
use simple_carousel::{config, output, render, runtime::Runtime, script::Script};
use std::path::{Path, PathBuf};

/// Shared flags for commands that run a script.
#[derive(clap::Args, Clone)]
struct RunArgs {
    /// Interaction script (.toml, or JSON for any other extension)
    script: PathBuf,

    /// Stop at this time in ms instead of the last event
    #[arg(long)]
    until: Option<u64>,
}

fn version_string() -> &'static str {
    let hash = env!("GIT_HASH");
    if hash.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        // Leaked once at startup, called exactly once
        Box::leak(format!("{}@{hash}", env!("CARGO_PKG_VERSION")).into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "simple-carousel")]
#[command(about = "Replay carousel and lightbox interactions deterministically")]
#[command(long_about = "\
Replay carousel and lightbox interactions deterministically

A script describes a page and a timeline of user events. The replayer builds
the page, initializes every carousel, gallery lightbox and lazy image on it,
then plays the events against a virtual clock: transition locks, autoplay
intervals, fade-outs and resize debounces all run in simulated time.

Script structure (TOML; any other extension is read as JSON):

  [page]
  title = \"Shop\"
  viewport = { width = 1280, height = 800 }

  [[page.carousels]]                # <div class=product-carousel>
  id = \"products\"
  dots = true
  data = { rotate-interval = \"3000\" }
  slides = [{ title = \"Lamp\" }, { title = \"Chair\" }]

  [[page.galleries]]                # click an image to open the lightbox
  id = \"team\"
  images = [{ src = \"ana.jpg\", alt = \"Ana\" }]

  [[events]]
  at = 1200                         # ms since page load
  event = { type = \"key-down\", key = \"ArrowRight\" }

Run 'simple-carousel gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Controller config (missing file = stock defaults)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Log controller decisions to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play a script and print the state after every event
    Replay(RunArgs),
    /// Play a script and write the final page as HTML
    Render {
        #[command(flatten)]
        run: RunArgs,

        /// Output HTML file (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Validate a script without playing it
    Check {
        /// Interaction script
        script: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Replay(run) => {
            let site_config = config::load_config(&cli.config)?;
            let script = Script::load(&run.script)?;
            let rt = Runtime::replay(&script, &site_config, run.until, |step, rt| {
                output::print_step(step, rt);
            });
            output::print_state(&rt);
        }
        Command::Render { run, output: out } => {
            let site_config = config::load_config(&cli.config)?;
            let script = Script::load(&run.script)?;
            let rt = Runtime::replay(&script, &site_config, run.until, |_, _| {});
            let html = render::render_document(rt.document()).into_string();
            match out {
                Some(path) => {
                    write_snapshot(&html, &path)?;
                    output::print_render_output(&rt, &path);
                }
                None => println!("{html}"),
            }
        }
        Command::Check { script } => {
            config::load_config(&cli.config)?;
            println!("==> Checking {}", script.display());
            let script = Script::load(&script)?;
            output::print_check_output(&script);
            println!("==> Script is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Logs go to stderr so replay output on stdout stays clean.
fn init_tracing(verbose: bool) {
    let default = if verbose { "simple_carousel=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn write_snapshot(html: &str, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
}
