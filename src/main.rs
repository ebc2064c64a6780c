use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mindview::config::{self, MindviewConfig};
use mindview::gateway::filters::{LlmCallFilters, Page};
use mindview::gateway::{Gateway, HttpGateway};
use mindview::output::{json as json_out, table};
use mindview::playback::PlaybackLinkCache;
use mindview::tasks::TaskCoordinator;
use mindview::view::{AuthorPage, ItemView};

#[derive(Parser)]
#[command(name = "mindview", version, about = "Browse authors, summaries and transcripts in a content-analysis knowledge base")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Knowledge-base service URL (default: config file, then http://localhost:8000)
    #[arg(long, global = true, env = "MINDVIEW_URL")]
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List authors
    Authors,

    /// Show an author: status rollup, reports and videos
    Author {
        /// Author ID
        id: String,
    },

    /// List an author's videos
    Videos {
        /// Author ID
        author_id: String,
    },

    /// Show a video: status, summary, transcript and playback link
    Video {
        /// Video ID (internal or platform id)
        id: String,
    },

    /// Fetch a fresh playback link for a video
    Play {
        /// Video ID
        id: String,
    },

    /// Set or clear an author's type tag
    SetAuthorType {
        /// Author ID
        id: String,

        /// New type; omit to clear
        author_type: Option<String>,
    },

    /// Set or clear a video's content type tag
    SetVideoType {
        /// Video ID
        id: String,

        /// New type; omit to clear
        content_type: Option<String>,
    },

    /// Regenerate an author's report
    RegenerateReport {
        /// Author ID
        author_id: String,
    },

    /// Re-run summarization for one video
    Resummarize {
        /// Video ID
        id: String,

        /// Also summarize fallback-quality transcripts
        #[arg(long)]
        include_fallback: bool,
    },

    /// Re-run summarization for an author's videos
    ResummarizeAuthor {
        /// Author ID
        author_id: String,

        /// Also summarize fallback-quality transcripts
        #[arg(long, conflicts_with = "pending_only")]
        include_fallback: bool,

        /// Only videos whose summary is still pending
        #[arg(long)]
        pending_only: bool,
    },

    /// Re-run speech recognition for one video
    Reprocess {
        /// Video ID
        id: String,
    },

    /// Re-run speech recognition for an author's videos
    ReprocessAuthor {
        /// Author ID
        author_id: String,
    },

    /// Ingest an author's catalog by platform id or profile URL
    Ingest {
        /// Platform author id or profile URL
        target: String,

        /// Maximum videos to ingest
        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// Ask a question against the knowledge base
    Ask {
        /// Question text
        query: String,

        /// Restrict to one author
        #[arg(long)]
        author: Option<String>,
    },

    /// Browse the LLM call log
    LlmCalls {
        /// Filter by task type
        #[arg(long)]
        task_type: Option<String>,

        /// Filter by content type
        #[arg(long)]
        content_type: Option<String>,

        /// Filter by prompt profile key
        #[arg(long)]
        profile_key: Option<String>,

        /// Filter by call status
        #[arg(long)]
        status: Option<String>,

        /// Filter by model name
        #[arg(long)]
        model: Option<String>,

        /// Calls on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,

        /// Calls on or before this date (YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,

        /// Page size
        #[arg(long, default_value = "50")]
        limit: usize,

        /// Rows to skip
        #[arg(long, default_value = "0")]
        offset: usize,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default config file (never overwrites)
    Init,

    /// Show the effective configuration
    Show,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json_output = cli.json;

    let file_config = MindviewConfig::load()?;
    let settings = file_config.resolve(cli.base_url.as_deref());

    let gateway = HttpGateway::new(&settings).context("Failed to create HTTP client")?;
    let tasks = TaskCoordinator::new(&gateway);

    match cli.command {
        Commands::Authors => {
            let authors = gateway
                .list_authors()
                .await
                .context("Failed to list authors")?;
            if json_output {
                json_out::print_json(&authors)?;
            } else {
                table::print_author_list(&authors);
            }
        }

        Commands::Author { id } => {
            let page = AuthorPage::load(&gateway, &id).await;
            if json_output {
                json_out::print_json(&page)?;
            } else {
                table::print_author_page(&page);
            }
        }

        Commands::Videos { author_id } => {
            let items = gateway
                .list_author_items(&author_id)
                .await
                .with_context(|| format!("Failed to list videos of author {author_id}"))?;
            if json_output {
                json_out::print_json(&items)?;
            } else {
                table::print_item_list(&items);
            }
        }

        Commands::Video { id } => {
            let view = ItemView::new();
            let page = view
                .open(&gateway, &id)
                .await
                .with_context(|| format!("Failed to load video {id}"))?
                .with_context(|| format!("Video {id} was superseded while loading"))?;
            if json_output {
                json_out::print_json(&page)?;
            } else {
                table::print_item_page(&page);
            }
            view.close();
        }

        Commands::Play { id } => {
            let mut cache = PlaybackLinkCache::new();
            let link = cache.fetch(&gateway, &id).await.cloned();
            if json_output {
                json_out::print_json(&serde_json::json!({ "video_id": id, "playback": link }))?;
            } else {
                match link {
                    Some(link) => {
                        println!("{}", link.url);
                        println!("  expires {}", link.expires_at.format("%Y-%m-%d %H:%M:%S UTC"));
                    }
                    None => println!("No playback available for {id}."),
                }
            }
            cache.teardown();
        }

        Commands::SetAuthorType { id, author_type } => {
            let detail = tasks
                .set_author_type(&id, author_type.as_deref())
                .await
                .with_context(|| format!("Failed to update type of author {id}"))?;
            if json_output {
                json_out::print_json(&detail)?;
            } else {
                println!(
                    "Author {}: type {}",
                    detail.author.name,
                    detail.author.author_type.as_deref().unwrap_or("(cleared)")
                );
            }
        }

        Commands::SetVideoType { id, content_type } => {
            let detail = tasks
                .set_content_type(&id, content_type.as_deref())
                .await
                .with_context(|| format!("Failed to update type of video {id}"))?;
            if json_output {
                json_out::print_json(&detail)?;
            } else {
                println!(
                    "Video {}: type {}",
                    detail.item.title,
                    detail.item.content_type.as_deref().unwrap_or("(cleared)")
                );
            }
        }

        Commands::RegenerateReport { author_id } => {
            let ack = tasks
                .regenerate_report(&author_id)
                .await
                .context("Failed to queue report regeneration")?;
            print_ack(json_output, &format!("report regeneration for author {author_id}"), &ack)?;
        }

        Commands::Resummarize { id, include_fallback } => {
            let ack = tasks
                .resummarize_item(&id, include_fallback)
                .await
                .context("Failed to queue resummarization")?;
            print_ack(json_output, &format!("resummarization of video {id}"), &ack)?;
        }

        Commands::ResummarizeAuthor {
            author_id,
            include_fallback,
            pending_only,
        } => {
            let ack = if pending_only {
                tasks.resummarize_pending(&author_id).await
            } else {
                tasks.resummarize_all(&author_id, include_fallback).await
            }
            .context("Failed to queue resummarization")?;
            print_ack(json_output, &format!("resummarization of author {author_id}"), &ack)?;
        }

        Commands::Reprocess { id } => {
            let ack = tasks
                .reprocess_item(&id)
                .await
                .context("Failed to queue transcript reprocessing")?;
            print_ack(json_output, &format!("transcript reprocessing of video {id}"), &ack)?;
        }

        Commands::ReprocessAuthor { author_id } => {
            let ack = tasks
                .reprocess_author(&author_id)
                .await
                .context("Failed to queue transcript reprocessing")?;
            print_ack(json_output, &format!("transcript reprocessing of author {author_id}"), &ack)?;
        }

        Commands::Ingest { target, limit } => {
            let ack = tasks
                .ingest(&target, limit)
                .await
                .with_context(|| format!("Failed to queue ingest of {target}"))?;
            print_ack(json_output, &format!("ingest of {target}"), &ack)?;
        }

        Commands::Ask { query, author } => {
            let answer = gateway
                .ask(&query, author.as_deref())
                .await
                .context("Question failed")?;
            if json_output {
                json_out::print_json(&answer)?;
            } else {
                table::print_chat(&answer);
            }
        }

        Commands::LlmCalls {
            task_type,
            content_type,
            profile_key,
            status,
            model,
            since,
            until,
            limit,
            offset,
        } => {
            let filters = LlmCallFilters {
                task_type,
                content_type,
                profile_key,
                status,
                model,
                since,
                until,
            };
            let page = Page::new(limit, offset);
            let calls = gateway
                .list_llm_calls(&filters, page)
                .await
                .context("Failed to list LLM calls")?;
            if json_output {
                json_out::print_json(&serde_json::json!({
                    "total": calls.total,
                    "limit": page.limit,
                    "offset": page.offset,
                    "items": calls.items,
                }))?;
            } else {
                table::print_llm_calls(&calls, page.offset);
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Init => {
                let path = config::config_path()?;
                if config::init_config()? {
                    println!("Created {}", path.display());
                } else {
                    println!("Config already exists: {}", path.display());
                }
            }
            ConfigAction::Show => {
                if json_output {
                    json_out::print_json(&settings)?;
                } else {
                    println!("Config file: {}", config::config_path()?.display());
                    println!("{}", settings.display());
                }
            }
        },
    }

    Ok(())
}

fn print_ack(json_output: bool, what: &str, ack: &mindview::models::TaskAck) -> Result<()> {
    if json_output {
        json_out::print_json(ack)?;
    } else {
        table::print_ack(what, ack);
    }
    Ok(())
}
