use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use campus::api::ApiClient;
use campus::app::{BlogList, PostDetail};
use campus::config::{Overrides, Settings};
use campus::images::ImageResolver;
use campus::logging::{self, LogConfig};
use campus::render;
use campus::storage::{FileStore, KeyValueStore, MemoryStore};
use campus::visitor;

/// campus - read and discuss FUTO Campus Media posts from the terminal
#[derive(Parser)]
#[command(name = "campus")]
#[command(about = "Terminal client for the FUTO Campus Media blog")]
#[command(version)]
struct Cli {
    /// API URL to connect to
    #[arg(long, short, env = "CAMPUS_API_URL")]
    server: Option<String>,

    /// Directory holding the local store and log
    #[arg(long, env = "CAMPUS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Settings file (defaults to campus.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short)]
    verbose: bool,

    /// Keep likes and visitor id in memory only
    #[arg(long)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List recent posts
    Posts,
    /// Show a post with its comments
    Show { slug: String },
    /// Comment on a post, or reply to a comment
    Comment {
        slug: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long)]
        content: String,
        /// Comment id to reply to
        #[arg(long)]
        reply_to: Option<i64>,
    },
    /// Like or unlike a post
    Like { slug: String },
    /// Like or unlike a comment (stored locally)
    LikeComment { slug: String, id: i64 },
    /// Print this machine's visitor id
    Visitor,
}

// Load environment variables from .env file
fn load_env() {
    let _ = dotenv::dotenv();
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env must be loaded before clap reads env-backed flags
    load_env();
    let cli = Cli::parse();

    let settings = Settings::load(&Overrides {
        api_url: cli.server.clone(),
        data_dir: cli.data_dir.clone(),
        settings_file: cli.config.clone(),
    })
    .context("Failed to load settings")?;
    let data_dir = settings.ensure_data_dir()?;

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    logging::init_logging(&log_config.with_log_file(data_dir.join("campus_debug.log")))?;
    log::info!("Using API at {}", settings.api_url());

    let store: Box<dyn KeyValueStore> = if cli.ephemeral {
        Box::new(MemoryStore::new())
    } else {
        Box::new(FileStore::open(&data_dir))
    };

    let api = ApiClient::new(settings.api_url());
    let images = ImageResolver::from_api_url(settings.api_url());

    match cli.command {
        Command::Posts => {
            let list = BlogList::load(&api).await;
            print_lines(render::render_blog_list(&list, &images));
        }
        Command::Show { slug } => {
            let detail = load_detail(&api, slug, store).await;
            print_lines(render::render_post_detail(&detail, &images));
        }
        Command::Comment {
            slug,
            name,
            email,
            content,
            reply_to,
        } => {
            let mut detail = load_detail(&api, slug, store).await;
            let id = match reply_to {
                Some(parent_id) => {
                    if !detail.open_reply_form(parent_id) {
                        bail!("Comment {} not found on this post", parent_id);
                    }
                    if let Some(draft) = detail.tree.draft_mut(parent_id) {
                        draft.name = name;
                        draft.email = email;
                        draft.content.push_str(&content);
                    }
                    detail.submit_reply(&api, parent_id).await?
                }
                None => {
                    detail.form.name = name;
                    detail.form.email = email;
                    detail.form.content = content;
                    detail.submit_comment(&api).await?
                }
            };
            println!("Posted comment #{}", id);
            print_lines(render::render_thread(&detail.tree));
        }
        Command::Like { slug } => {
            let mut detail = load_detail(&api, slug, store).await;
            let visitor_id = visitor::visitor_id(detail.store_mut());
            if detail.toggle_post_like(&api, &visitor_id).await {
                let verb = if detail.is_liked { "Liked" } else { "Unliked" };
                println!("{} · {} likes", verb, detail.likes_count);
            } else {
                bail!("Could not update the like, try again later");
            }
        }
        Command::LikeComment { slug, id } => {
            let mut detail = load_detail(&api, slug, store).await;
            if !detail.tree.contains(id) {
                bail!("Comment {} not found on this post", id);
            }
            let toggle = detail
                .toggle_comment_like(id)
                .context("Failed to save like locally")?;
            let verb = if toggle.liked { "Liked" } else { "Unliked" };
            println!("{} comment #{} · {} likes", verb, id, toggle.count);
        }
        Command::Visitor => {
            let mut store = store;
            println!("{}", visitor::visitor_id(store.as_mut()));
        }
    }

    Ok(())
}

async fn load_detail(api: &ApiClient, slug: String, store: Box<dyn KeyValueStore>) -> PostDetail {
    let mut detail = PostDetail::new(slug, store);
    detail.load(api).await;
    detail
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}
