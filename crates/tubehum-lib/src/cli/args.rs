use crate::download::OutputFormat;
use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;

#[derive(Debug, Clone)]
pub enum Command {
    Download {
        config_path: Option<String>,
        url: String,
        output_dir: Option<String>,
        format: OutputFormat,
        quality: Option<u32>,
        workers: Option<usize>,
        accelerator: bool,
        cookies_from_browser: Option<String>,
        item_timeout_secs: Option<u64>,
        summary_path: Option<String>,
    },
    Probe {
        config_path: Option<String>,
        url: String,
    },
}

pub struct Args {
    pub command: Command,
    pub log_level: Level,
}

#[derive(Debug, Parser)]
#[command(
    name = "tubehum",
    version,
    about = "Download single videos or whole playlists as MP3 audio or MP4 video, several items at a time"
)]
struct Cli {
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Sets the level of verbosity",
        action = ArgAction::Count,
        global = true
    )]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Resolve a URL and download every item it refers to
    Download {
        #[arg(value_name = "URL", help = "Video or playlist URL")]
        url: String,

        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "Sets a custom config file"
        )]
        config: Option<String>,

        #[arg(
            short = 'o',
            long = "output-dir",
            value_name = "DIR",
            help = "Overrides the base directory destination directories are created in"
        )]
        output_dir: Option<String>,

        #[arg(
            short = 'f',
            long = "format",
            value_enum,
            default_value_t = OutputFormat::Audio,
            help = "Output format"
        )]
        format: OutputFormat,

        #[arg(
            short = 'q',
            long = "quality",
            value_name = "N",
            help = "Audio bitrate in kbps (128, 192, 256, 320) or maximum video height in pixels"
        )]
        quality: Option<u32>,

        #[arg(
            short = 'w',
            long = "workers",
            value_name = "N",
            help = "Maximum number of items downloaded at once"
        )]
        workers: Option<usize>,

        #[arg(
            long = "accelerator",
            help = "Hand downloads to aria2c when it is installed"
        )]
        accelerator: bool,

        #[arg(
            long = "cookies-from-browser",
            value_name = "NAME",
            help = "Browser whose cookies are used when access is denied"
        )]
        cookies_from_browser: Option<String>,

        #[arg(
            long = "item-timeout",
            value_name = "SECS",
            help = "Gives up on a single item after this many seconds"
        )]
        item_timeout: Option<u64>,

        #[arg(
            long = "summary",
            value_name = "FILE",
            help = "Writes a JSON summary of the run to FILE"
        )]
        summary: Option<String>,
    },

    /// Resolve a URL and print what would be downloaded as JSON
    Probe {
        #[arg(value_name = "URL", help = "Video or playlist URL")]
        url: String,

        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "Sets a custom config file"
        )]
        config: Option<String>,
    },
}

impl From<CliCommand> for Command {
    fn from(command: CliCommand) -> Self {
        match command {
            CliCommand::Download {
                url,
                config,
                output_dir,
                format,
                quality,
                workers,
                accelerator,
                cookies_from_browser,
                item_timeout,
                summary,
            } => Command::Download {
                config_path: config,
                url,
                output_dir,
                format,
                quality,
                workers,
                accelerator,
                cookies_from_browser,
                item_timeout_secs: item_timeout,
                summary_path: summary,
            },
            CliCommand::Probe { url, config } => Command::Probe {
                config_path: config,
                url,
            },
        }
    }
}

pub fn parse_args() -> Args {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    Args {
        command: cli.command.into(),
        log_level,
    }
}
