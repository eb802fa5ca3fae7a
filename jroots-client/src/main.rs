use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use env_logger::{Builder, Target};
use jroots_client::{AppContext, ClientConfig, ImageUpload};
use jroots_model::prelude::*;
use log::LevelFilter;

#[derive(Debug, Parser)]
#[command(name = "jroots", about = "Search and manage the jroots archive")]
struct Cli {
    /// Archive server, e.g. https://jroots.example
    #[arg(long, global = true, env = "JROOTS_API")]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Full-text search over archive records
    Search {
        query: String,
        #[arg(long, default_value_t = 0)]
        page: usize,
        #[arg(long, default_value_t = PageRequest::DEFAULT_PAGE_SIZE)]
        page_size: usize,
    },
    /// Log in with an account email
    Login { email: String, password: String },
    /// Log in as administrator
    AdminLogin { username: String, password: String },
    /// Create an account
    Register {
        username: String,
        email: String,
        password: String,
        #[arg(long)]
        telegram: Option<String>,
        #[arg(long)]
        captcha_token: Option<String>,
    },
    /// Confirm an email verification token
    Verify { token: String },
    /// Forget the stored token
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Download an image, revalidating against the cache
    Image {
        id: ImageId,
        #[arg(long)]
        out: PathBuf,
    },
    /// List image sources
    Sources,
    /// List admin events
    Events,
    /// Mark an admin event resolved
    ResolveEvent { id: EventId },
    /// Create a record, optionally uploading its scan
    CreateObject {
        #[arg(long)]
        text: String,
        #[arg(long)]
        image_path: String,
        #[arg(long)]
        image_key: String,
        #[arg(long)]
        source: Option<ImageSourceId>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Delete a record
    DeleteObject { id: ObjectId },
}

fn init_logger() {
    Builder::new()
        .target(Target::Stderr)
        .filter_level(LevelFilter::Warn)
        .filter_module("jroots_client", LevelFilter::Info)
        .init();
}

fn render_pages(pages: &[PageItem], current: usize) -> String {
    pages
        .iter()
        .map(|item| match item {
            PageItem::Page(p) if *p == current => format!("[{}]", p + 1),
            PageItem::Page(p) => (p + 1).to_string(),
            PageItem::Ellipsis => "…".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn upload_from_path(path: &PathBuf) -> Result<ImageUpload> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image")
        .to_string();
    let content_type = match path.extension().and_then(|e| e.to_str()) {
        Some("png") => Some("image/png".to_string()),
        Some("jpg" | "jpeg") => Some("image/jpeg".to_string()),
        Some("tif" | "tiff") => Some("image/tiff".to_string()),
        _ => None,
    };
    Ok(ImageUpload {
        file_name,
        bytes,
        content_type,
    })
}

async fn run(app: &AppContext, command: Command) -> Result<()> {
    let api = app.api();
    match command {
        Command::Search {
            query,
            page,
            page_size,
        } => {
            let request = PageRequest::new(page, page_size)?;
            let results = api.search(&query, request).await?;
            for item in &results.items {
                let score = item
                    .similarity_score
                    .map(|s| format!(" ({s:.2})"))
                    .unwrap_or_default();
                println!("#{}{}: {}", item.id, score, item.text_content);
                if let Some(image) = &item.image {
                    println!("    image {} [{}] {}", image.id, image.image_key, image.image_path);
                }
            }
            let pages = pagination_window(page, results.page_count(page_size), DEFAULT_PAGE_DELTA);
            println!("{} results  {}", results.total, render_pages(&pages, page));
        }
        Command::Login { email, password } => {
            let user = app.session().login(&email, &password).await?;
            println!("Logged in as {}", user.email);
        }
        Command::AdminLogin { username, password } => {
            let user = app.session().admin_login(&username, &password).await?;
            println!("Logged in as admin {}", user.email);
        }
        Command::Register {
            username,
            email,
            password,
            telegram,
            captcha_token,
        } => {
            let telegram_username = telegram
                .as_deref()
                .filter(|t| !t.is_empty())
                .map(normalize_telegram_username)
                .transpose()?;
            let response = api
                .register(&RegisterRequest {
                    username,
                    email,
                    password,
                    telegram_username,
                    captcha_token,
                })
                .await?;
            println!(
                "{}",
                response
                    .message
                    .unwrap_or_else(|| "Registration succeeded.".to_string())
            );
        }
        Command::Verify { token } => {
            if api.verify_email(&token).await? {
                println!("Email verified");
            } else {
                bail!("verification link is invalid or expired");
            }
        }
        Command::Logout => {
            app.session().logout().await?;
            println!("Logged out");
        }
        Command::Whoami => match app.session().current_user().await? {
            Some(user) => println!(
                "{} <{}>{}",
                user.username.as_deref().unwrap_or("-"),
                user.email,
                if user.is_verified { "" } else { " (unverified)" }
            ),
            None => println!("Not logged in"),
        },
        Command::Image { id, out } => {
            let images = app.images();
            let first = images
                .fetch_image(id)
                .await
                .with_context(|| format!("image {id} unavailable"))?;
            // A second fetch revalidates with If-None-Match.
            let current = images.fetch_image(id).await.unwrap_or(first);
            let bytes = current
                .bytes()
                .context("image was released before it could be written")?;
            std::fs::write(&out, bytes).with_context(|| format!("writing {}", out.display()))?;
            let stats = images.stats();
            println!(
                "Wrote {} bytes to {} ({} fresh, {} not modified)",
                bytes.len(),
                out.display(),
                stats.fresh,
                stats.not_modified
            );
        }
        Command::Sources => {
            for source in api.list_image_sources().await? {
                println!(
                    "{}\t{}\t{}",
                    source.id,
                    source.source_name,
                    source.description.unwrap_or_default()
                );
            }
        }
        Command::Events => {
            for event in api.list_events().await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    event.id,
                    event.created_at.format("%Y-%m-%d %H:%M"),
                    if event.is_resolved { "resolved" } else { "open" },
                    event.message
                );
            }
        }
        Command::ResolveEvent { id } => {
            api.resolve_event(id).await?;
            println!("Event {id} resolved");
        }
        Command::CreateObject {
            text,
            image_path,
            image_key,
            source,
            file,
        } => {
            let upload = file.as_ref().map(upload_from_path).transpose()?;
            let form = ObjectForm {
                text_content: text,
                image_path,
                image_key,
                image_source_id: source,
                image_file_sha512: None,
            };
            let created = api.create_object(&form, upload).await?;
            println!("Created record {}", created.id);
        }
        Command::DeleteObject { id } => {
            api.delete_object(id).await?;
            println!("Deleted record {id}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        init_logger();
    } else {
        env_logger::init();
    }

    let cli = Cli::parse();
    let mut config = ClientConfig::load();
    if let Some(server) = cli.server {
        config.server_url = server;
    }

    let app = AppContext::new(config).context("failed to initialize client")?;
    app.start().await?;

    let result = run(&app, cli.command).await;
    app.shutdown();
    result
}
