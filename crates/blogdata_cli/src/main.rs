//! blogdata CLI
//!
//! Command-line access to a post database through the repository layer.
//! Results are printed to stdout as JSON; logs go to stderr or `--log-dir`.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;
use serde_json::json;

use blogdata_core::db::PathConnectionProvider;
use blogdata_core::{default_log_level, init_logging, LogTarget, Post, PostRepository};

#[derive(Parser)]
#[command(name = "blogdata")]
#[command(about = "Store and query blog posts in SQLite", long_about = None)]
struct Cli {
    /// SQLite database file (created and migrated on first use)
    #[arg(long, global = true, env = "BLOGDATA_DB", default_value = "blogdata.db")]
    db: PathBuf,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, global = true, env = "BLOGDATA_LOG_LEVEL")]
    log_level: Option<String>,

    /// Write rotating log files into this absolute directory instead of stderr
    #[arg(long, global = true, env = "BLOGDATA_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save the sample post, then list everything and look it up by slug
    Demo,

    /// List all posts
    List,

    /// Show one post by id
    Get {
        id: String,
    },

    /// Show the post with the given slug
    FindSlug {
        slug: String,
    },

    /// Delete a post by id
    Delete {
        id: String,

        /// Only delete while the stored version still equals this value
        #[arg(long)]
        version: Option<i64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    let target = match &cli.log_dir {
        Some(dir) => LogTarget::Directory(dir.clone()),
        None => LogTarget::Stderr,
    };
    init_logging(&level, target).map_err(|message| anyhow!(message))?;

    let provider = PathConnectionProvider::open(&cli.db)
        .with_context(|| format!("failed to open database {}", cli.db.display()))?;
    let repo = PostRepository::new(provider);

    let output = run(&repo, cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run(
    repo: &PostRepository<PathConnectionProvider>,
    command: Commands,
) -> Result<serde_json::Value> {
    match command {
        Commands::Demo => {
            let saved = match repo.find_by_id(SAMPLE_ID.to_string())? {
                Some(existing) => existing,
                None => repo.save(sample_post()?)?,
            };
            info!("event=cli_demo module=cli status=ok id={}", saved.id);
            let all = repo.find_all()?;
            let by_slug = repo.find_by_slug(&saved.slug)?;
            Ok(json!({
                "saved": saved,
                "all": all,
                "bySlug": by_slug,
            }))
        }
        Commands::List => Ok(serde_json::to_value(repo.find_all()?)?),
        Commands::Get { id } => {
            let post = repo
                .find_by_id(id.clone())?
                .ok_or_else(|| anyhow!("no post with id `{id}`"))?;
            Ok(serde_json::to_value(post)?)
        }
        Commands::FindSlug { slug } => {
            let post = repo
                .find_by_slug(&slug)?
                .ok_or_else(|| anyhow!("no post with slug `{slug}`"))?;
            Ok(serde_json::to_value(post)?)
        }
        Commands::Delete { id, version } => {
            let deleted = match version {
                Some(version) => {
                    repo.delete_versioned(id.clone(), version)?;
                    1
                }
                None => repo.delete_by_id(id.clone())?,
            };
            Ok(json!({ "id": id, "deleted": deleted }))
        }
    }
}

const SAMPLE_ID: &str = "1234";

fn sample_post() -> Result<Post> {
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).context("invalid sample date")?;
    Ok(Post::with_id(
        SAMPLE_ID,
        "Hello, World!",
        "hello-world",
        date,
        10,
        Some("Spring Boot".to_string()),
    )?)
}

#[cfg(test)]
mod tests {
    use super::{run, sample_post, Commands};
    use blogdata_core::db::PathConnectionProvider;
    use blogdata_core::PostRepository;

    fn repo_in(dir: &tempfile::TempDir) -> PostRepository<PathConnectionProvider> {
        PostRepository::new(PathConnectionProvider::open(dir.path().join("cli.db")).unwrap())
    }

    #[test]
    fn demo_saves_sample_once() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_in(&dir);

        let first = run(&repo, Commands::Demo).unwrap();
        assert_eq!(first["saved"]["id"], "1234");
        assert_eq!(first["saved"]["version"], 0);
        assert_eq!(first["bySlug"]["slug"], "hello-world");

        run(&repo, Commands::Demo).unwrap();
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn delete_reports_affected_rows() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_in(&dir);
        repo.save(sample_post().unwrap()).unwrap();

        let removed = run(
            &repo,
            Commands::Delete {
                id: "1234".to_string(),
                version: None,
            },
        )
        .unwrap();
        assert_eq!(removed["deleted"], 1);

        let again = run(
            &repo,
            Commands::Delete {
                id: "1234".to_string(),
                version: None,
            },
        )
        .unwrap();
        assert_eq!(again["deleted"], 0);
    }

    #[test]
    fn get_missing_post_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_in(&dir);

        let err = run(
            &repo,
            Commands::Get {
                id: "missing".to_string(),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing"));
    }
}
