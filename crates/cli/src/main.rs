use clap::{Parser, Subcommand};
use clinrel_core::{
    dates::format_date, records_from_json, CandidateSets, ClinicalRecord, RecordInput, RecordKind,
    RelatedRecords, RelationPolicy, RelationService,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "clinrel")]
#[command(about = "Clinical record relation engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the records related to an anchor
    Related {
        /// Path to the anchor record (JSON object)
        #[arg(long)]
        anchor: PathBuf,
        /// Record kind of the anchor (e.g. appointment, imaging)
        #[arg(long)]
        kind: String,
        /// Imaging collection (JSON array)
        #[arg(long)]
        imaging: Option<PathBuf>,
        /// Medication collection (JSON array)
        #[arg(long)]
        medications: Option<PathBuf>,
        /// Intervention collection (JSON array)
        #[arg(long)]
        interventions: Option<PathBuf>,
        /// Lab result collection (JSON array)
        #[arg(long)]
        labs: Option<PathBuf>,
        /// Appointment collection (JSON array)
        #[arg(long)]
        appointments: Option<PathBuf>,
        /// Attachment collection (JSON array)
        #[arg(long)]
        attachments: Option<PathBuf>,
        /// Relation policy YAML override
        #[arg(long)]
        policy: Option<PathBuf>,
        /// Print the bundle as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the computed window for one relation
    Window {
        /// Path to the anchor record (JSON object)
        #[arg(long)]
        anchor: PathBuf,
        /// Record kind of the anchor
        #[arg(long)]
        kind: String,
        /// Record kind of the related collection
        #[arg(long)]
        related: String,
        /// Relation policy YAML override
        #[arg(long)]
        policy: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("clinrel=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Related {
            anchor,
            kind,
            imaging,
            medications,
            interventions,
            labs,
            appointments,
            attachments,
            policy,
            json,
        } => {
            let service = RelationService::new(load_policy(policy.as_deref())?);
            let anchor = load_anchor(&anchor, &kind)?;

            let mut candidates = CandidateSets::new();
            let collections = [
                (RecordKind::Imaging, imaging),
                (RecordKind::Medication, medications),
                (RecordKind::Intervention, interventions),
                (RecordKind::LabResult, labs),
                (RecordKind::Appointment, appointments),
                (RecordKind::Attachment, attachments),
            ];
            for (collection_kind, path) in collections {
                if let Some(path) = path {
                    candidates.insert(collection_kind, load_collection(&path, collection_kind)?);
                }
            }

            let bundle = service.related(&anchor, &candidates);

            if json {
                println!("{}", serde_json::to_string_pretty(&bundle)?);
            } else {
                if bundle.is_empty() {
                    println!("No relations defined for {} anchors.", anchor.kind);
                }
                for (related_kind, related) in bundle.iter() {
                    match related {
                        RelatedRecords::Pending => {
                            println!("{}: pending (collection not supplied)", related_kind);
                        }
                        RelatedRecords::Ready { records } => {
                            println!("{}: {} record(s)", related_kind, records.len());
                            for record in records {
                                println!(
                                    "  {}  {}  ({})",
                                    format_date(record.start_date),
                                    record.title.as_deref().unwrap_or("<untitled>"),
                                    record.id
                                );
                            }
                        }
                    }
                }
            }
        }
        Commands::Window {
            anchor,
            kind,
            related,
            policy,
        } => {
            let service = RelationService::new(load_policy(policy.as_deref())?);
            let anchor = load_anchor(&anchor, &kind)?;
            let related: RecordKind = related.parse()?;

            let rule = service
                .policy()
                .rules_for(anchor.kind)
                .find(|rule| rule.related == related);

            match rule {
                None => {
                    println!("No {} -> {} relation in the policy.", anchor.kind, related);
                }
                Some(rule) => match rule.mode.window_for(&anchor) {
                    None => println!(
                        "No window: anchor has no usable date or the relation's gate is closed."
                    ),
                    Some(window) => println!(
                        "{} -> {}: [{} .. {}]",
                        anchor.kind,
                        related,
                        format_date(Some(window.start)),
                        match window.end {
                            Some(end) => format_date(Some(end)),
                            None => "open".to_string(),
                        }
                    ),
                },
            }
        }
    }

    Ok(())
}

/// Loads the relation policy, defaulting to the built-in table.
fn load_policy(path: Option<&Path>) -> Result<RelationPolicy, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(RelationPolicy::from_yaml_file(path)?),
        None => Ok(RelationPolicy::default()),
    }
}

/// Loads the anchor record from a JSON object file.
fn load_anchor(path: &Path, kind: &str) -> Result<ClinicalRecord, Box<dyn std::error::Error>> {
    let kind: RecordKind = kind.parse()?;
    let contents = std::fs::read_to_string(path)?;
    let input: RecordInput = serde_json::from_str(&contents)?;
    Ok(ClinicalRecord::from_input(kind, input))
}

/// Loads one candidate collection from a JSON array file.
fn load_collection(
    path: &Path,
    kind: RecordKind,
) -> Result<Vec<ClinicalRecord>, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(records_from_json(kind, &contents)?)
}
