use std::{collections::HashMap, fs, path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    documents::AttachmentUpload,
    repository::CaseRepository,
    session::Session,
    status::Viewer,
    workflow::{AdminWorkflow, ClaimantWorkflow, GpWorkflow, QaDecision, QaWorkflow},
    ApiGateway, DiscussionClient, DocumentClient,
};
use shared::{
    domain::{CaseId, DocumentId, Role, UserId},
    protocol::{GpDecision, RegisterRequest},
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "caseport", about = "Command-line client for the caseport backend")]
struct Cli {
    /// Overrides the server url from caseport.toml / CASEPORT_SERVER_URL.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long, env = "CASEPORT_EMAIL")]
    email: Option<String>,
    #[arg(long, env = "CASEPORT_PASSWORD")]
    password: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account with the given role.
    Register {
        username: String,
        email: String,
        password: String,
        #[arg(value_enum)]
        role: CliRole,
    },
    /// Show the identity and role behind the current credentials.
    Whoami,
    /// List the cases visible to the current role, with display statuses.
    Cases,
    /// Create a case, optionally attaching documents.
    CreateCase {
        description: String,
        #[arg(long)]
        date_of_birth: NaiveDate,
        #[arg(long = "file")]
        files: Vec<PathBuf>,
    },
    /// Upload one document to an existing case.
    Upload { case_id: i64, file: PathBuf },
    /// Download a document to a local file.
    Download {
        case_id: i64,
        file_id: i64,
        #[arg(long, default_value = "download.bin")]
        out: PathBuf,
    },
    /// Show a case's discussion thread.
    Messages { case_id: i64 },
    /// Append a message to a case's discussion thread.
    Post { case_id: i64, content: String },
    /// Admin: assign a case to a GP.
    Assign {
        case_id: i64,
        #[arg(long)]
        gp_id: i64,
        #[arg(long)]
        specialty: String,
        #[arg(long)]
        sla_days: i64,
    },
    /// GP: submit the final decision on an assigned case.
    Decide {
        case_id: i64,
        #[arg(value_enum)]
        decision: CliDecision,
        comment: String,
    },
    /// QA: submit audit feedback on a pool case.
    Feedback {
        case_id: i64,
        #[arg(value_enum)]
        decision: CliAudit,
        comment: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliRole {
    Claimant,
    Gp,
    Qa,
    Admin,
}

impl From<CliRole> for Role {
    fn from(role: CliRole) -> Self {
        match role {
            CliRole::Claimant => Role::Claimant,
            CliRole::Gp => Role::Gp,
            CliRole::Qa => Role::Qa,
            CliRole::Admin => Role::Admin,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDecision {
    Approve,
    Deny,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliAudit {
    Good,
    Rework,
}

#[derive(Debug)]
struct Settings {
    server_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".into(),
        }
    }
}

fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("caseport.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("server_url") {
                settings.server_url = v.clone();
            }
        }
    }

    if let Ok(v) = std::env::var("CASEPORT_SERVER_URL") {
        settings.server_url = v;
    }

    settings
}

fn guess_mime(path: &PathBuf) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf".to_string()),
        "jpg" | "jpeg" => Some("image/jpeg".to_string()),
        "png" => Some("image/png".to_string()),
        _ => None,
    }
}

fn read_attachment(path: &PathBuf) -> Result<AttachmentUpload> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read '{}'", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("'{}' has no usable file name", path.display()))?
        .to_string();
    Ok(AttachmentUpload {
        mime_type: guess_mime(path),
        filename,
        bytes,
    })
}

async fn sign_in(cli: &Cli, gateway: &ApiGateway) -> Result<Role> {
    let email = cli
        .email
        .as_deref()
        .ok_or_else(|| anyhow!("--email (or CASEPORT_EMAIL) is required"))?;
    let password = cli
        .password
        .as_deref()
        .ok_or_else(|| anyhow!("--password (or CASEPORT_PASSWORD) is required"))?;
    let user = gateway.sign_in(email, password).await?;
    let role = gateway
        .session()
        .role()
        .await
        .ok_or_else(|| anyhow!("token carries no usable role claim"))?;
    info!(user_id = user.id.0, role = %role, "signed in");
    Ok(role)
}

fn print_cases(repository: &CaseRepository) {
    for case in repository.cases() {
        let gp = case
            .assigned_gp
            .as_deref()
            .map(|name| format!("  GP: {name}"))
            .unwrap_or_default();
        let summary = case.record.description.lines().next().unwrap_or_default();
        println!(
            "Case #{:<6} {:<16}{}  {}",
            case.id().0,
            case.display_status,
            gp,
            summary
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let settings = load_settings();
    let server_url = cli
        .server_url
        .clone()
        .unwrap_or(settings.server_url);
    let session = Session::new();
    let gateway = Arc::new(ApiGateway::new(&server_url, Arc::clone(&session))?);

    match &cli.command {
        Command::Register {
            username,
            email,
            password,
            role,
        } => {
            let user = gateway
                .register(&RegisterRequest {
                    username: username.clone(),
                    email: email.clone(),
                    password: password.clone(),
                    role: (*role).into(),
                })
                .await?;
            println!("registered user #{} ({})", user.id.0, user.display_name());
        }
        Command::Whoami => {
            let role = sign_in(&cli, &gateway).await?;
            let user = gateway.current_user().await?;
            println!("{} (role: {role})", user.display_name());
        }
        Command::Cases => {
            let role = sign_in(&cli, &gateway).await?;
            let mut repository =
                CaseRepository::new(Arc::clone(&gateway), Viewer::from(role));
            match role {
                Role::Claimant => repository.load_mine().await?,
                Role::Gp => repository.load_assigned().await?,
                Role::Qa => repository.load_pool().await?,
                Role::Admin => {
                    repository.load_gp_roster().await?;
                    repository.load_all().await?;
                }
            }
            print_cases(&repository);
        }
        Command::CreateCase {
            description,
            date_of_birth,
            files,
        } => {
            sign_in(&cli, &gateway).await?;
            let attachments = files
                .iter()
                .map(read_attachment)
                .collect::<Result<Vec<_>>>()?;
            let mut workflow = ClaimantWorkflow::new(
                CaseRepository::new(Arc::clone(&gateway), Viewer::Claimant),
                DocumentClient::new(Arc::clone(&gateway)),
                DiscussionClient::new(Arc::clone(&gateway)),
            );
            let submission = workflow
                .submit_case(description, *date_of_birth, attachments)
                .await?;
            println!("created case #{}", submission.case.id.0);
            for failure in &submission.failed_uploads {
                eprintln!("warning: {} was not uploaded: {}", failure.filename, failure.error);
            }
        }
        Command::Upload { case_id, file } => {
            sign_in(&cli, &gateway).await?;
            let documents = DocumentClient::new(Arc::clone(&gateway));
            let record = documents
                .upload(CaseId(*case_id), read_attachment(file)?)
                .await?;
            println!("uploaded document #{} ({})", record.id.0, record.filename);
        }
        Command::Download {
            case_id,
            file_id,
            out,
        } => {
            sign_in(&cli, &gateway).await?;
            let documents = DocumentClient::new(Arc::clone(&gateway));
            let bytes = documents
                .download(CaseId(*case_id), DocumentId(*file_id))
                .await?;
            fs::write(out, &bytes)
                .with_context(|| format!("failed to write '{}'", out.display()))?;
            println!("saved {} bytes to {}", bytes.len(), out.display());
        }
        Command::Messages { case_id } => {
            sign_in(&cli, &gateway).await?;
            let discussion = DiscussionClient::new(Arc::clone(&gateway));
            for message in discussion.thread(CaseId(*case_id)).await? {
                let sender = message.sender_username.as_deref().unwrap_or("unknown");
                let role = message.sender_role.as_deref().unwrap_or("-");
                println!("[{sender} ({role})] {}", message.content);
            }
        }
        Command::Post { case_id, content } => {
            sign_in(&cli, &gateway).await?;
            let discussion = DiscussionClient::new(Arc::clone(&gateway));
            let thread = discussion
                .post_and_refresh(CaseId(*case_id), content)
                .await?;
            println!("posted; thread now has {} messages", thread.len());
        }
        Command::Assign {
            case_id,
            gp_id,
            specialty,
            sla_days,
        } => {
            sign_in(&cli, &gateway).await?;
            let mut workflow = AdminWorkflow::new(
                CaseRepository::new(Arc::clone(&gateway), Viewer::Admin),
                DocumentClient::new(Arc::clone(&gateway)),
            );
            workflow.refresh().await?;
            workflow.select_case(CaseId(*case_id)).await?;
            workflow.set_review_comment("assigned via caseport cli");
            workflow.approve_review()?;
            workflow.set_specialty(specialty.clone());
            workflow.set_gp(UserId(*gp_id));
            workflow.set_sla_days(*sla_days);
            workflow.assign().await?;
            println!("case #{case_id} assigned to GP #{gp_id}");
        }
        Command::Decide {
            case_id,
            decision,
            comment,
        } => {
            sign_in(&cli, &gateway).await?;
            let mut workflow = GpWorkflow::new(
                CaseRepository::new(Arc::clone(&gateway), Viewer::Gp),
                DocumentClient::new(Arc::clone(&gateway)),
                DiscussionClient::new(Arc::clone(&gateway)),
            );
            workflow.refresh().await?;
            workflow.open_case(CaseId(*case_id)).await?;
            workflow.set_decision(match decision {
                CliDecision::Approve => GpDecision::Approve,
                CliDecision::Deny => GpDecision::Deny,
            });
            workflow.set_decision_comment(comment.clone());
            workflow.submit_decision().await?;
            println!("decision recorded for case #{case_id}");
        }
        Command::Feedback {
            case_id,
            decision,
            comment,
        } => {
            sign_in(&cli, &gateway).await?;
            let mut workflow = QaWorkflow::new(
                CaseRepository::new(Arc::clone(&gateway), Viewer::Qa),
                DocumentClient::new(Arc::clone(&gateway)),
            );
            workflow.refresh().await?;
            workflow.toggle_case(CaseId(*case_id)).await?;
            workflow.toggle_commenting()?;
            workflow.set_decision(match decision {
                CliAudit::Good => QaDecision::Good,
                CliAudit::Rework => QaDecision::Rework,
            });
            workflow.set_comment(comment.clone());
            workflow.submit().await?;
            println!("feedback recorded for case #{case_id}");
        }
    }

    Ok(())
}
