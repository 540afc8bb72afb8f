use clap::{Parser, Subcommand, ValueEnum};
use drive_reorganizer::{
    init_tracing, CredentialKind, CredentialManager, DriveStore, GeminiGateway, RemoteStore,
    ReorgConfig, ReorgError, ReorgSession, ReviewState, Sensitivity, SnippetProvider,
};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "drive-reorganizer")]
#[command(about = "Classify the files in a Drive folder and reorganize them", long_about = None)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Drive folder whose files should be reorganized
    #[arg(required = true)]
    folder_id: Option<String>,

    /// Approve every suggestion and apply it to Drive
    #[arg(long)]
    apply: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Save a credential to the OS keychain; the secret is read from stdin
    StoreCredential { kind: Kind },
    /// Remove a credential from the OS keychain
    DeleteCredential { kind: Kind },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Classifier,
    Drive,
}

impl From<Kind> for CredentialKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Classifier => CredentialKind::Classifier,
            Kind::Drive => CredentialKind::Drive,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Config loads .env, which may also carry RUST_LOG
    let config = ReorgConfig::from_env();
    init_tracing();

    let result = match (cli.command, config) {
        (Some(command), _) => manage_credential(command),
        (None, Ok(config)) => run(cli.folder_id, cli.apply, config).await,
        (None, Err(e)) => Err(e),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Reorganization failed");
            eprintln!("error: {}", e);
            if e.requires_reauth() {
                eprintln!("The credential was rejected. Refresh it and try again.");
            }
            ExitCode::FAILURE
        }
    }
}

fn manage_credential(command: Command) -> Result<ExitCode, ReorgError> {
    match command {
        Command::StoreCredential { kind } => {
            let mut secret = String::new();
            std::io::stdin()
                .read_line(&mut secret)
                .map_err(|e| ReorgError::Credential(format!("Failed to read credential: {}", e)))?;
            CredentialManager::store(kind.into(), secret.trim())?;
            println!("Stored the {} credential.", CredentialKind::from(kind).provider());
        }
        Command::DeleteCredential { kind } => {
            CredentialManager::delete(kind.into())?;
            println!("Removed the {} credential.", CredentialKind::from(kind).provider());
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn run(
    folder_id: Option<String>,
    apply: bool,
    config: ReorgConfig,
) -> Result<ExitCode, ReorgError> {
    let folder_id = folder_id
        .ok_or_else(|| ReorgError::Config("A folder id is required".to_string()))?;
    let classifier_key = CredentialManager::resolve(CredentialKind::Classifier)?;
    let drive_token = CredentialManager::resolve(CredentialKind::Drive)?;

    let store: Arc<dyn RemoteStore> = Arc::new(DriveStore::from_config(&config, drive_token));
    let gateway = Arc::new(GeminiGateway::from_config(&config)?);

    let descriptors = SnippetProvider::new(Arc::clone(&store))
        .with_snippet_chars(config.snippet_chars)
        .collect(&folder_id)
        .await?;

    let mut session = ReorgSession::from_config(&config, gateway, store);
    session.select(descriptors);
    session.analyze(&classifier_key).await?;
    print_suggestions(session.review());

    if !apply {
        println!("\n{}", session.summary());
        println!("Dry run. Pass --apply to approve everything and sync.");
        return Ok(ExitCode::SUCCESS);
    }

    let approved = session.approve_all();
    println!("\nApplying {} suggestion(s)...", approved.len());
    session.set_progress_callback(Some(Box::new(|current: usize, total: usize| {
        eprint!("\rSynced {}/{}", current, total);
    })));

    let report = session.sync().await;
    if !approved.is_empty() {
        eprintln!();
    }
    println!("{}", report.summary);
    for error in &report.errors {
        println!("  failed {}", error);
    }
    if report.reauth_required {
        eprintln!("The Drive credential was rejected. Refresh it, then re-approve the failed files.");
    }

    Ok(if report.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_suggestions(review: &ReviewState) {
    let threshold = review.review_threshold();
    for record in review.records() {
        let Some(analysis) = &record.analysis else {
            println!("{}  (no suggestion)", record.descriptor.name);
            continue;
        };

        let destination = if analysis.suggested_path.trim().is_empty() {
            analysis.suggested_name.clone()
        } else {
            format!("{}/{}", analysis.suggested_path.trim_matches('/'), analysis.suggested_name)
        };

        let mut flags = vec![
            analysis.category.to_string(),
            format!("{:.0}%", analysis.confidence * 100.0),
        ];
        if analysis.should_archive {
            flags.push("archive".to_string());
        }
        if analysis.sensitivity != Sensitivity::Normal {
            flags.push(analysis.sensitivity.as_str().to_string());
        }
        if record.needs_manual_review(threshold) {
            flags.push("review".to_string());
        }

        println!(
            "{}  ->  {}  [{}]",
            record.descriptor.name,
            destination,
            flags.join(", ")
        );
    }
}
