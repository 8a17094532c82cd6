//! Advisory portal admin CLI
//!
//! Operator commands against the Postgres-backed workflow layer.
//!
//! # Usage
//!
//! ```bash
//! # Apply schema migrations
//! portal_admin migrate
//!
//! # Editorial and moderation gates (run as an admin actor)
//! portal_admin --actor-id $ADMIN_ID publish-post <post-id>
//! portal_admin --actor-id $ADMIN_ID approve-review <review-id>
//!
//! # Read-only stats
//! portal_admin lead-stats <owner-id>
//! portal_admin -o json rating <professional-id>
//! ```

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use uuid::Uuid;

use advisory_portal::config::PortalConfig;
use advisory_portal::database::DatabaseManager;
use advisory_portal::types::Post;
use advisory_portal::{telemetry, with_configured_media, ActorContext};

#[derive(Parser)]
#[command(name = "portal_admin")]
#[command(version = "0.1.0")]
#[command(about = "Admin CLI for the advisory portal workflow layer")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Admin account the gate commands act as
    #[arg(long, global = true, env = "PORTAL_ADMIN_ID")]
    actor_id: Option<Uuid>,

    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "pretty", value_enum)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply embedded schema migrations
    Migrate,

    /// Pipeline counts for one professional's leads
    LeadStats { owner_id: Uuid },

    /// Approved-review rating for one professional
    Rating { professional_id: Uuid },

    /// Publish a post (sets published_at on first publish)
    PublishPost { post_id: Uuid },

    /// Take a post off the site, back to approved
    UnpublishPost { post_id: Uuid },

    /// Approve a pending review
    ApproveReview { review_id: Uuid },

    /// Reject a review (also unfeatures it)
    RejectReview { review_id: Uuid },
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init_tracing();
    let cli = Cli::parse();
    let format = cli.format;

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "error": e.to_string() }));
            } else {
                eprintln!("{}: {:#}", "error".red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = PortalConfig::from_env()?;
    let db = DatabaseManager::new(config.database.clone()).await?;

    let service = with_configured_media(db.workflow_service(), &config)?;
    let admin = || -> anyhow::Result<ActorContext> {
        let id = cli
            .actor_id
            .ok_or_else(|| anyhow::anyhow!("--actor-id (or PORTAL_ADMIN_ID) is required for this command"))?;
        Ok(ActorContext::admin(id))
    };

    match cli.command {
        Commands::Migrate => {
            db.test_connection().await?;
            db.run_migrations().await?;
            emit(cli.format, "migrations applied", &serde_json::json!({ "migrated": true }));
        }
        Commands::LeadStats { owner_id } => {
            let ctx = ActorContext::professional(owner_id);
            let stats = service.lead_stats(&ctx, owner_id).await?;
            let line = format!(
                "total {}  new {}  active {}  won {}  lost {}",
                stats.total, stats.new, stats.active, stats.closed_won, stats.closed_lost
            );
            emit(cli.format, &line, &stats);
        }
        Commands::Rating { professional_id } => {
            let summary = service
                .rating_summary(&ActorContext::anonymous(), professional_id)
                .await?;
            let line = format!("{:.2} from {} approved reviews", summary.average, summary.count);
            emit(cli.format, &line, &summary);
        }
        Commands::PublishPost { post_id } => {
            let post = service.publish_post(&admin()?, post_id).await?;
            emit(cli.format, &post_line(&post), &post);
        }
        Commands::UnpublishPost { post_id } => {
            let post = service.unpublish_post(&admin()?, post_id).await?;
            emit(cli.format, &post_line(&post), &post);
        }
        Commands::ApproveReview { review_id } => {
            let review = service.approve_review(&admin()?, review_id).await?;
            let line = format!("review {} is {}", review.review_id, review.status.as_str());
            emit(cli.format, &line, &review);
        }
        Commands::RejectReview { review_id } => {
            let review = service.reject_review(&admin()?, review_id).await?;
            let line = format!("review {} is {}", review.review_id, review.status.as_str());
            emit(cli.format, &line, &review);
        }
    }

    db.close().await;
    Ok(())
}

fn post_line(post: &Post) -> String {
    format!("{} ({}) is {}", post.title, post.slug, post.status.as_str())
}

fn emit<T: Serialize>(format: OutputFormat, line: &str, value: &T) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("{}: {}", "error".red().bold(), e),
        },
        OutputFormat::Pretty => println!("{} {}", "✓".green(), line),
    }
}
