//! Annotation archive tool
//!
//! Exports projects and documents from a local workspace into portable
//! archives and imports them back as new records.
//!
//! Usage:
//!   annot --workspace ./ws new-project "Contracts"
//!   annot --workspace ./ws add-file --project 1 scan.pdf
//!   annot --workspace ./ws export-project 1 --out ./backups --password secret
//!   annot --workspace ./other import-project ./backups/Contracts.annproj --password secret

use annot_archive::{
    save_archive, ArchiveConfig, ArchiveError, ArchiveImporter, ExportedArchive, FixedPathSink,
};
use annot_blobstore::MemoryBlobStore;
use annot_cli::LocalWorkspace;
use annot_types::{DocumentId, ProjectId};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "annot")]
#[command(about = "Export and import annotation project archives")]
struct Args {
    /// Workspace directory
    #[arg(short, long, env = "ANNOT_WORKSPACE", default_value = ".")]
    workspace: PathBuf,

    /// Archive settings (TOML)
    #[arg(short, long, env = "ANNOT_CONFIG")]
    config: Option<PathBuf>,

    /// Password for sealing exports and opening sealed imports
    #[arg(short, long, env = "ANNOT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show what an archive contains
    Inspect { archive: PathBuf },
    #[command(flatten)]
    Workspace(WorkspaceCommand),
}

/// Commands that operate on an opened workspace.
#[derive(Subcommand, Debug)]
enum WorkspaceCommand {
    /// Create an empty project
    NewProject { name: String },
    /// Copy a file into a project
    AddFile {
        #[arg(long)]
        project: i64,
        path: PathBuf,
    },
    /// List projects and documents
    List,
    /// Export a project with all its documents
    ExportProject {
        id: i64,
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// Export selected documents as one project archive
    ExportBatch {
        #[arg(long)]
        name: String,
        #[arg(required = true)]
        documents: Vec<i64>,
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// Export one document with its labels and rules
    ExportDocument {
        id: i64,
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// Export a project's labels
    ExportLabels {
        project: i64,
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// Export a project's rules
    ExportRules {
        project: i64,
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// Import a project archive as a new project
    ImportProject { archive: PathBuf },
    /// Import a document archive into a project
    ImportDocument {
        archive: PathBuf,
        #[arg(long)]
        project: i64,
    },
    /// Merge a labels archive into a project
    ImportLabels {
        archive: PathBuf,
        #[arg(long)]
        project: i64,
    },
    /// Merge a rules archive into a project
    ImportRules {
        archive: PathBuf,
        #[arg(long)]
        project: i64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ArchiveError>() {
                Some(ArchiveError::PasswordRequired) => {
                    eprintln!(
                        "error: archive is password protected; pass --password or set ANNOT_PASSWORD"
                    );
                }
                Some(err) if err.is_password_error() => {
                    eprintln!("error: wrong password or corrupted archive");
                }
                Some(err) if err.is_invalid_file() => {
                    eprintln!("error: invalid or incompatible file: {err}");
                }
                _ => eprintln!("error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => ArchiveConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ArchiveConfig::default(),
    };
    let password = args.password.as_deref();

    match args.command {
        Command::Inspect { archive } => inspect(&archive, password).await,
        Command::Workspace(command) => {
            let mut ws = LocalWorkspace::open(&args.workspace)?;
            run_in_workspace(&mut ws, command, &config, password).await
        }
    }
}

async fn run_in_workspace(
    ws: &mut LocalWorkspace,
    command: WorkspaceCommand,
    config: &ArchiveConfig,
    password: Option<&str>,
) -> Result<()> {
    match command {
        WorkspaceCommand::NewProject { name } => {
            let project = ws.create_project(&name)?;
            ws.save()?;
            println!("Created project {} \"{}\"", project.id, project.name);
        }
        WorkspaceCommand::AddFile { project, path } => {
            let document = ws.add_file(ProjectId(project), &path).await?;
            ws.save()?;
            println!("Added document {} \"{}\"", document.id, document.name);
        }
        WorkspaceCommand::List => list(ws),
        WorkspaceCommand::ExportProject { id, out } => {
            let archive = ws.export_project(ProjectId(id), config, password).await?;
            write_out(&archive, &out).await?;
        }
        WorkspaceCommand::ExportBatch {
            name,
            documents,
            out,
        } => {
            let ids: Vec<DocumentId> = documents.into_iter().map(DocumentId).collect();
            let archive = ws.export_batch(&name, &ids, config, password).await?;
            write_out(&archive, &out).await?;
        }
        WorkspaceCommand::ExportDocument { id, out } => {
            let archive = ws.export_document(DocumentId(id), config, password).await?;
            write_out(&archive, &out).await?;
        }
        WorkspaceCommand::ExportLabels { project, out } => {
            let archive = ws.export_labels(ProjectId(project), config, password).await?;
            write_out(&archive, &out).await?;
        }
        WorkspaceCommand::ExportRules { project, out } => {
            let archive = ws.export_rules(ProjectId(project), config, password).await?;
            write_out(&archive, &out).await?;
        }
        WorkspaceCommand::ImportProject { archive } => {
            let bytes = read_archive(&archive).await?;
            let imported = ws.import_project(&bytes, password).await?;
            ws.save()?;
            println!(
                "Imported project {} \"{}\" with {} documents",
                imported.project.id,
                imported.project.name,
                imported.documents.len()
            );
            for (from, to) in &imported.report.renamed {
                println!("  renamed \"{from}\" -> \"{to}\"");
            }
            if !imported.report.is_complete() {
                warn!(
                    missing_originals = imported.report.missing_originals.len(),
                    missing_annotated = imported.report.missing_annotated.len(),
                    failed_writes = imported.report.failed_writes.len(),
                    "Some files could not be restored"
                );
            }
        }
        WorkspaceCommand::ImportDocument { archive, project } => {
            let bytes = read_archive(&archive).await?;
            let merged = ws
                .import_document(&bytes, password, ProjectId(project))
                .await?;
            ws.save()?;
            println!(
                "Imported document {} \"{}\" ({} new labels, {} new rules)",
                merged.document.id, merged.document.name, merged.labels_added, merged.rules_added
            );
        }
        WorkspaceCommand::ImportLabels { archive, project } => {
            let bytes = read_archive(&archive).await?;
            let added = ws.import_labels(&bytes, password, ProjectId(project))?;
            ws.save()?;
            println!("Merged {added} new labels");
        }
        WorkspaceCommand::ImportRules { archive, project } => {
            let bytes = read_archive(&archive).await?;
            let added = ws.import_rules(&bytes, password, ProjectId(project))?;
            ws.save()?;
            println!("Merged {added} new rules");
        }
    }
    Ok(())
}

async fn read_archive(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

async fn write_out(archive: &ExportedArchive, out: &Path) -> Result<()> {
    let mut sink = FixedPathSink::new(out);
    let Some(path) = save_archive(archive, &mut sink).await? else {
        return Ok(());
    };
    println!("Wrote {}", path.display());
    if !archive.report.is_complete() {
        warn!(
            missing_originals = archive.report.missing_originals.len(),
            missing_annotated = archive.report.missing_annotated.len(),
            "Some files were not included"
        );
    }
    Ok(())
}

async fn inspect(path: &Path, password: Option<&str>) -> Result<()> {
    let bytes = read_archive(path).await?;
    // Inspection never touches storage.
    let store = MemoryBlobStore::new();
    let summary = ArchiveImporter::new(&store).inspect(&bytes, password)?;
    info!(path = %path.display(), sealed = summary.sealed, "Archive inspected");

    match summary.kind {
        Some(kind) => println!("{} ({})", kind.description(), kind.extension()),
        None => println!("Unrecognized archive layout"),
    }
    println!("Sealed: {}", if summary.sealed { "yes" } else { "no" });
    for (entry, size) in &summary.entries {
        println!("  {size:>10}  {entry}");
    }
    Ok(())
}

fn list(ws: &LocalWorkspace) {
    let catalog = ws.catalog();
    if catalog.projects.is_empty() {
        println!("No projects in {}", ws.root().display());
        return;
    }
    for project in &catalog.projects {
        println!(
            "{:>4}  {}  ({} labels, {} rules)",
            project.id,
            project.name,
            project.labels.len(),
            project.rules.len()
        );
        for document in ws.documents_of(project.id) {
            println!("      {:>4}  {}  [{}]", document.id, document.name, document.status);
        }
    }
}
