use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use offline_dict::app::{App, ProgressSink};
use offline_dict::config::{ConfigLoader, ResolvedConfig, resolve_dataset_url};
use offline_dict::domain::SearchResult;
use offline_dict::error::DictError;
use offline_dict::history::HistoryLedger;
use offline_dict::output::{JsonOutput, OutputMode, StderrProgress, TextOutput};
use offline_dict::store::FileStore;
use offline_dict::transfer::{DatasetClient, DatasetSource, FileDatasetClient, HttpDatasetClient};

#[derive(Parser)]
#[command(name = "odict")]
#[command(about = "Offline dictionary: exact word lookup against a downloaded WordNet database")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    /// Dataset URL; overrides base_url/dataset_path from the config file
    #[arg(long, global = true)]
    url: Option<String>,

    /// Load the dataset from a local file instead of over HTTP (wins over --url)
    #[arg(long, global = true)]
    dataset_file: Option<String>,

    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Look up a single word")]
    Define(DefineArgs),
    #[command(about = "Load the dictionary once and read queries from stdin")]
    Shell,
    #[command(about = "Show or manage recent searches")]
    History(HistoryArgs),
}

#[derive(Args)]
struct DefineArgs {
    word: String,
}

#[derive(Args)]
struct HistoryArgs {
    #[command(subcommand)]
    command: Option<HistoryCommand>,
}

#[derive(Subcommand)]
enum HistoryCommand {
    #[command(about = "List recent searches, newest first")]
    List,
    #[command(about = "Forget all recent searches")]
    Clear,
    #[command(about = "Repeat the N-th most recent search")]
    Rerun { index: usize },
}

enum DatasetSourceClient {
    Http(HttpDatasetClient),
    File(FileDatasetClient),
}

impl DatasetClient for DatasetSourceClient {
    fn open(&self) -> Result<DatasetSource, DictError> {
        match self {
            DatasetSourceClient::Http(client) => client.open(),
            DatasetSourceClient::File(client) => client.open(),
        }
    }

    fn describe(&self) -> String {
        match self {
            DatasetSourceClient::Http(client) => client.describe(),
            DatasetSourceClient::File(client) => client.describe(),
        }
    }
}

type Session = App<DatasetSourceClient, FileStore>;

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<DictError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &DictError) -> u8 {
    match error {
        DictError::BlankQuery => 2,
        DictError::TransferFailed(_) | DictError::TransferStatus { .. } => 3,
        DictError::DatasetCorrupt(_) => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let client = build_client(&cli, &config)?;
    let ledger = Arc::new(HistoryLedger::new(FileStore::new(config.data_dir.clone())));
    let mut app = App::new(client, ledger);

    match cli.command {
        Commands::Define(args) => {
            if args.word.trim().is_empty() {
                return Err(DictError::BlankQuery.into());
            }
            load(&mut app, output_mode)?;
            if let Some(result) = app.search(&args.word)? {
                print_search(&result, output_mode)?;
            }
            app.close()?;
            Ok(())
        }
        Commands::Shell => {
            load(&mut app, output_mode)?;
            run_shell(&app, output_mode)?;
            app.close()?;
            Ok(())
        }
        Commands::History(args) => run_history(args, &mut app, output_mode),
    }
}

fn build_client(cli: &Cli, config: &ResolvedConfig) -> miette::Result<DatasetSourceClient> {
    if let Some(path) = &cli.dataset_file {
        return Ok(DatasetSourceClient::File(FileDatasetClient::new(path.as_str())));
    }
    let url = match &cli.url {
        Some(url) => resolve_dataset_url(url, "")?,
        None => config.dataset_url.clone(),
    };
    Ok(DatasetSourceClient::Http(HttpDatasetClient::new(
        url,
        config.timeout,
    )?))
}

fn load(app: &mut Session, output_mode: OutputMode) -> miette::Result<()> {
    let sink: Box<dyn ProgressSink> = match output_mode {
        OutputMode::Text => Box::new(StderrProgress::new()),
        OutputMode::Json => Box::new(JsonOutput),
    };
    app.load(sink.as_ref())?;
    Ok(())
}

fn print_search(result: &SearchResult, output_mode: OutputMode) -> miette::Result<()> {
    match output_mode {
        OutputMode::Text => TextOutput::print_search(result),
        OutputMode::Json => JsonOutput::print_search(result).into_diagnostic()?,
    }
    Ok(())
}

fn run_history(
    args: HistoryArgs,
    app: &mut Session,
    output_mode: OutputMode,
) -> miette::Result<()> {
    match args.command.unwrap_or(HistoryCommand::List) {
        HistoryCommand::List => {
            let entries = app.history().read_all();
            match output_mode {
                OutputMode::Text => TextOutput::print_history(&entries),
                OutputMode::Json => JsonOutput::print_history(&entries).into_diagnostic()?,
            }
            Ok(())
        }
        HistoryCommand::Clear => {
            app.history().clear();
            if matches!(output_mode, OutputMode::Text) {
                println!("Search history cleared");
            }
            Ok(())
        }
        HistoryCommand::Rerun { index } => {
            let entries = app.history().read_all();
            let entry = index
                .checked_sub(1)
                .and_then(|position| entries.get(position))
                .ok_or_else(|| miette::Report::msg(format!("no history entry #{index}")))?;
            load(app, output_mode)?;
            if let Some(result) = app.rerun(entry)? {
                print_search(&result, output_mode)?;
            }
            Ok(())
        }
    }
}

fn run_shell(app: &Session, output_mode: OutputMode) -> miette::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        if matches!(output_mode, OutputMode::Text) {
            write!(stdout, "> ").into_diagnostic()?;
            stdout.flush().into_diagnostic()?;
        }
        let mut line = String::new();
        if stdin.lock().read_line(&mut line).into_diagnostic()? == 0 {
            return Ok(());
        }
        let input = line.trim_end_matches(['\r', '\n']);

        let outcome = match input.trim() {
            ":quit" | ":q" => return Ok(()),
            ":history" => {
                let entries = app.history().read_all();
                match output_mode {
                    OutputMode::Text => TextOutput::print_history(&entries),
                    OutputMode::Json => JsonOutput::print_history(&entries).into_diagnostic()?,
                }
                continue;
            }
            ":clear" => {
                app.history().clear();
                continue;
            }
            command if command.starts_with(':') => {
                let entries = app.history().read_all();
                let picked = command[1..]
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| index.checked_sub(1))
                    .and_then(|position| entries.get(position));
                match picked {
                    Some(entry) => app.rerun(entry),
                    None => {
                        eprintln!("unknown command: {command}");
                        continue;
                    }
                }
            }
            _ => app.search(input),
        };

        match outcome {
            Ok(Some(result)) => print_search(&result, output_mode)?,
            Ok(None) => {}
            Err(err) => eprintln!("Search error: {err}"),
        }
    }
}
