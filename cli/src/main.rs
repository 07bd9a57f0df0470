use clap::{Parser, Subcommand};
use config::{Settings, load_env_file};
use docchat::{
    CredentialProvider, FileSelection, HttpBackend, Session, StaticToken, TerminalRenderer,
    UploadOutcome,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

mod logging;
mod repl;

#[derive(Parser, Debug)]
#[command(author, version, about = "Upload documents and ask questions about them", long_about = None)]
struct Args {
    /// Base URL of the document chat server
    #[arg(long, env = "DOCCHAT_SERVER")]
    server: Option<String>,

    /// Save --server as the default for later runs
    #[arg(long, requires = "server")]
    remember: bool,

    /// Use this CSRF token instead of the one set by the server
    #[arg(long, env = "DOCCHAT_CSRF_TOKEN")]
    csrf_token: Option<String>,

    /// Verbose tracing on stderr
    #[arg(long, short)]
    tracing: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload files for ingestion, one after another
    Upload { files: Vec<PathBuf> },
    /// Ask a question about the uploaded documents
    Ask { question: Vec<String> },
    /// Remove an uploaded document
    Delete { doc_id: String },
    /// Interactive session
    Chat,
}

async fn connect(args: &Args, settings: &Settings) -> anyhow::Result<Session> {
    let server = args
        .server
        .as_deref()
        .unwrap_or_else(|| settings.server_url_or_default());
    let backend = HttpBackend::new(server)?;

    let credentials: Arc<dyn CredentialProvider> = match &args.csrf_token {
        Some(token) => Arc::new(StaticToken(token.clone())),
        None => {
            // Without the page load there is no csrftoken cookie; the server
            // will then reject mutating requests and say so in the transcript.
            if let Err(e) = backend.open_session().await {
                tracing::warn!("Could not open session at {}: {}", backend.base_url(), e);
            }
            Arc::new(backend.credentials())
        }
    };

    Ok(Session::new(
        Arc::new(backend),
        credentials,
        Arc::new(TerminalRenderer::new(std::io::stdout())),
    ))
}

async fn run(args: Args, mut settings: Settings) -> anyhow::Result<ExitCode> {
    let session = connect(&args, &settings).await?;

    // Only a server URL that parsed in `connect` is worth keeping.
    if let (true, Some(server)) = (args.remember, &args.server) {
        settings.remember_server(server.clone());
        settings.save()?;
        tracing::info!("Default server set to {}", server);
    }

    match args.command {
        Commands::Upload { files } => {
            let mut selection = FileSelection::from_paths(files);
            match session.uploads.upload_all(&mut selection).await {
                Ok(reports) => {
                    for line in repl::doc_id_lines(&reports) {
                        println!("  {}", line);
                    }
                    let failed = reports
                        .iter()
                        .filter(|r| matches!(r.outcome, UploadOutcome::Failed(_)))
                        .count();
                    Ok(if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
                }
                Err(notice) => {
                    eprintln!("! {}", notice);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Ask { question } => {
            let mut input = question.join(" ");
            Ok(match session.asks.ask(&mut input).await {
                Some(docchat::AskOutcome::Failed(_)) => ExitCode::FAILURE,
                _ => ExitCode::SUCCESS,
            })
        }
        Commands::Delete { doc_id } => Ok(match session.uploads.remove_document(&doc_id).await {
            Some(docchat::DeleteOutcome::Failed(_)) => ExitCode::FAILURE,
            _ => ExitCode::SUCCESS,
        }),
        Commands::Chat => {
            repl::run_chat(session).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    load_env_file();
    let args = Args::parse();
    let settings = Settings::load();

    let _log_guard = logging::init_logging(args.tracing, settings.log_filter.as_deref());

    match run(args, settings).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
