//! CLI administration tool for tinylink.
//!
//! Inspects and manages links directly against the database, without going
//! through the HTTP API or its rate limits.
//!
//! # Usage
//!
//! ```bash
//! # List live links (add --all to include deleted ones)
//! cargo run --bin admin -- links list
//!
//! # Show usage for one link
//! cargo run --bin admin -- links stats aZ3kP9
//!
//! # Soft-delete a link and evict it from the cache
//! cargo run --bin admin -- links delete aZ3kP9
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server; see `tinylink::config`.

use tinylink::application::services::LinkService;
use tinylink::config::{self, Config};
use tinylink::domain::entities::Link;
use tinylink::infrastructure::persistence::PgLinkRepository;
use tinylink::server::{connect_cache, connect_database};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing tinylink.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and manage links
    Links {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum LinkAction {
    /// List links, newest first
    List {
        /// Include soft-deleted links
        #[arg(short, long)]
        all: bool,
    },

    /// Show usage statistics for a link
    Stats {
        code: String,
    },

    /// Soft-delete a link
    Delete {
        code: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env().context("Invalid configuration")?;
    let pool = connect_database(&config).await?;

    match cli.command {
        Commands::Links { action } => handle_link_action(action, &config, pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

async fn handle_link_action(action: LinkAction, config: &Config, pool: PgPool) -> Result<()> {
    let cache = connect_cache(config).await;
    let repository = Arc::new(PgLinkRepository::new(Arc::new(pool)));
    let service = LinkService::new(repository, cache, config.link_settings());

    match action {
        LinkAction::List { all } => list_links(&service, all).await,
        LinkAction::Stats { code } => show_stats(&service, config, &code).await,
        LinkAction::Delete { code, yes } => delete_link(&service, &code, yes).await,
    }
}

async fn list_links(service: &LinkService<PgLinkRepository>, include_deleted: bool) -> Result<()> {
    println!("{}", "🔗 Links".bright_blue().bold());
    println!();

    let links = service.list_links(include_deleted).await?;

    if links.is_empty() {
        println!("{}", "  No links found".yellow());
        println!();
        return Ok(());
    }

    let now = Utc::now();
    for link in &links {
        println!(
            "  {:<10} {:>7} {:<17} {:<8} {}",
            link.code.cyan(),
            link.usage_count.to_string().bright_white(),
            link.created_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            status_label(link, now),
            link.original_url
        );
    }

    println!();
    println!("  Total: {}", links.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

async fn show_stats(
    service: &LinkService<PgLinkRepository>,
    config: &Config,
    code: &str,
) -> Result<()> {
    let stats = service.get_stats(code).await?;

    println!("{}", "📊 Link statistics".bright_blue().bold());
    println!();
    println!(
        "  Short URL:   {}",
        service.get_short_url(&config.base_url, &stats.code).cyan()
    );
    println!("  Original:    {}", stats.original_url);
    println!(
        "  Uses:        {}",
        stats.usage_count.to_string().bright_green().bold()
    );
    println!(
        "  Created:     {}",
        stats.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let expires = stats.expires_at.format("%Y-%m-%d %H:%M:%S UTC").to_string();
    if Utc::now() > stats.expires_at {
        println!("  Expires:     {} {}", expires, "(expired)".red());
    } else {
        println!("  Expires:     {expires}");
    }
    println!();

    Ok(())
}

async fn delete_link(
    service: &LinkService<PgLinkRepository>,
    code: &str,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "🗑  Delete link".bright_blue().bold());
    println!();

    let stats = service.get_stats(code).await?;

    println!("  Code:     {}", stats.code.cyan());
    println!("  Original: {}", stats.original_url);
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete this link?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    service.delete_link(code).await?;

    println!("{}", "✅ Link deleted".green().bold());
    println!();

    Ok(())
}

async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;
            let (live, deleted): (i64, i64) = sqlx::query_as(
                "SELECT COUNT(*) FILTER (WHERE deleted_at IS NULL), \
                        COUNT(*) FILTER (WHERE deleted_at IS NOT NULL) \
                 FROM links",
            )
            .fetch_one(pool)
            .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Links:      {} live, {} deleted", live, deleted);
            println!();
        }
    }

    Ok(())
}

fn status_label(link: &Link, now: chrono::DateTime<Utc>) -> ColoredString {
    if link.is_deleted() {
        "DELETED".red()
    } else if link.is_expired_at(now) {
        "EXPIRED".yellow()
    } else {
        "ACTIVE".green()
    }
}
