// CLI Interface
//
// *La Console* (The Console) - Command-line front end for logging in, listing and archiving recommendations

use crate::auth::{self, guard, AuthStore, RouteDecision};
use crate::config::{ClientConfig, DEFAULT_CONFIG_FILE};
use crate::dashboard::Notification;
use crate::errors::{format_error, LeRecoError};
use crate::filter::{FilterPanel, FilterState};
use crate::gateway::{ApiClient, RecommendationApi};
use crate::list::{Footer, ListView};
use crate::logging::init_logging;
use crate::query::RecommendationFeed;
use crate::storage::FileStorage;
use crate::types::Credentials;
use anyhow::{anyhow, Result as AnyhowResult};
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Directory under the home directory holding config and persisted state
const APP_DIR: &str = ".lereco";

/// LeReco - Security Recommendation Triage
#[derive(Parser, Debug)]
#[command(name = "lereco")]
#[command(author = "LeReco Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Browse, filter and archive security recommendations", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(global = true, long = "config", short = 'c')]
    pub config_path: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(global = true, long = "verbose", short = 'v')]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Log in and persist the session token
    Login {
        /// Username
        #[arg(long = "username", short = 'u')]
        username: String,

        /// Password
        #[arg(long = "password", short = 'p')]
        password: String,
    },

    /// Clear the persisted session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// List recommendations
    List {
        /// Free-text search
        #[arg(long = "search", short = 's')]
        search: Option<String>,

        /// Facet tag filter, repeatable; all tags must match
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,

        /// Show the archived view instead of the active one
        #[arg(long = "archived")]
        archived: bool,

        /// Number of pages to fetch
        #[arg(long = "pages", default_value = "1", conflicts_with = "all")]
        pages: usize,

        /// Fetch every page
        #[arg(long = "all")]
        all: bool,

        /// Print the list view as JSON
        #[arg(long = "json")]
        json: bool,
    },

    /// Archive a recommendation
    Archive {
        /// Recommendation id
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Restore an archived recommendation
    Unarchive {
        /// Recommendation id
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Print built-in defaults instead
        #[arg(long = "defaults")]
        defaults: bool,
    },

    /// Run the in-memory stub API for local development
    #[cfg(feature = "stub-server")]
    ServeStub {
        /// Host address to bind to
        #[arg(long = "host", default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(long = "port", default_value = "47270")]
        port: u16,
    },
}

/// Resolved runtime context shared by the commands
struct Session {
    config: ClientConfig,
    auth: AuthStore,
}

impl Cli {
    /// Run the CLI
    pub async fn run(self) -> AnyhowResult<()> {
        let config_path = self.config_path.unwrap_or_else(default_config_path);
        let config = ClientConfig::load(&config_path)
            .map_err(|e| anyhow!(format_error(&e)))?
            .with_env();

        init_logging(&config.logging.level, self.verbose);
        config.validate().map_err(|e| anyhow!(format_error(&e)))?;

        let storage_dir = config.storage.dir.clone().unwrap_or_else(default_app_dir);
        let session = Session {
            config,
            auth: AuthStore::new(Arc::new(FileStorage::new(storage_dir))),
        };

        let result = match self.command {
            Commands::Login { username, password } => {
                cmd_login_impl(&session, Credentials::new(username, password)).await
            }
            Commands::Logout => cmd_logout_impl(&session),
            Commands::Whoami => cmd_whoami_impl(&session),
            Commands::List {
                search,
                tags,
                archived,
                pages,
                all,
                json,
            } => {
                let filters = list_filters(search, &tags, archived);
                let pages = if all { None } else { Some(pages.max(1)) };
                cmd_list_impl(&session, filters, pages, json).await
            }
            Commands::Archive { id } => cmd_set_archived_impl(&session, &id, true).await,
            Commands::Unarchive { id } => cmd_set_archived_impl(&session, &id, false).await,
            Commands::Config { defaults } => cmd_config_impl(&session.config, defaults),
            #[cfg(feature = "stub-server")]
            Commands::ServeStub { host, port } => cmd_serve_stub_impl(&host, port).await,
        };

        result.map_err(|e| anyhow!(format_error(&e)))
    }
}

/// Filter state for a one-shot listing; the search is committed immediately
pub fn list_filters(search: Option<String>, tags: &[String], archived: bool) -> FilterState {
    let mut filters = FilterState::new();
    if let Some(search) = search {
        filters.set_search_input(search.clone());
        filters.commit_search(search);
    }
    for tag in tags {
        if !filters.is_selected(tag) {
            filters.toggle_tag(tag);
        }
    }
    if archived {
        filters.toggle_archive_view();
    }
    filters
}

/// `~/.lereco`, or `.lereco` in the working directory when there is no home
pub fn default_app_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(APP_DIR))
}

/// `~/.lereco/config.toml`
pub fn default_config_path() -> PathBuf {
    default_app_dir().join(DEFAULT_CONFIG_FILE)
}

fn api_client(session: &Session) -> crate::Result<ApiClient> {
    ApiClient::new(&session.config, Arc::new(session.auth.clone()))
}

/// Login command implementation
async fn cmd_login_impl(session: &Session, credentials: Credentials) -> crate::Result<()> {
    let api = api_client(session)?;
    let auth = auth::login(&api, &session.auth, &credentials).await?;
    println!("✓ Logged in as {} <{}>", auth.user.name, auth.user.email);
    Ok(())
}

/// Logout command implementation
fn cmd_logout_impl(session: &Session) -> crate::Result<()> {
    auth::logout(&session.auth)?;
    println!("✓ Logged out");
    Ok(())
}

/// Whoami command implementation
fn cmd_whoami_impl(session: &Session) -> crate::Result<()> {
    let state = session.auth.state();
    match (state.is_authenticated, state.user) {
        (true, Some(user)) => println!("{} <{}> (id {})", user.name, user.email, user.id),
        _ => println!("Not logged in"),
    }
    Ok(())
}

/// List command implementation
async fn cmd_list_impl(
    session: &Session,
    filters: FilterState,
    pages: Option<usize>,
    json: bool,
) -> crate::Result<()> {
    if let RouteDecision::RedirectToLogin = guard(&session.auth) {
        return Err(LeRecoError::Unauthenticated);
    }

    let feed = RecommendationFeed::new(
        api_client(session)?,
        session.config.api.page_limit,
        session.config.cache.capacity,
    );
    feed.select(filters.query_key()).await?;
    let fetched = fetch_pages(&feed, pages).await?;
    info!("Fetched {} page(s)", fetched);

    let view = ListView::render(&feed.engine(), session.config.ui.skeleton_count);
    if json {
        let out = serde_json::to_string_pretty(&view).map_err(|e| {
            LeRecoError::render_error(format!("Failed to encode list view: {}", e))
        })?;
        println!("{}", out);
        return Ok(());
    }

    print_filter_panel(FilterPanel::build(feed.engine().available_tags(), &filters).as_ref());
    print_list_view(&view);
    Ok(())
}

/// Follow next cursors until `pages` pages are loaded, or every page when
/// `None`. A cursor the server already handed out ends the walk.
async fn fetch_pages<A: RecommendationApi>(
    feed: &RecommendationFeed<A>,
    pages: Option<usize>,
) -> crate::Result<usize> {
    let mut seen = HashSet::new();
    let mut fetched = 1;
    while pages.map_or(true, |limit| fetched < limit) {
        let Some(cursor) = next_cursor(feed) else {
            break;
        };
        if !seen.insert(cursor.clone()) {
            warn!("Server repeated cursor {:?}; stopping pagination", cursor);
            break;
        }
        if !feed.load_more().await? {
            break;
        }
        fetched += 1;
    }
    Ok(fetched)
}

fn next_cursor<A: RecommendationApi>(feed: &RecommendationFeed<A>) -> Option<String> {
    let engine = feed.engine();
    let cursor = engine.result_set()?.next_cursor()?.to_string();
    Some(cursor)
}

fn print_filter_panel(panel: Option<&FilterPanel>) {
    let Some(panel) = panel else {
        return;
    };
    for group in &panel.groups {
        let values: Vec<String> = group
            .options
            .iter()
            .map(|o| {
                if o.selected {
                    format!("[{}]", o.value)
                } else {
                    o.value.clone()
                }
            })
            .collect();
        println!("{}: {}", group.title, values.join(", "));
    }
    println!();
}

fn print_list_view(view: &ListView) {
    match view {
        ListView::Skeletons { .. } => println!("Loading..."),
        ListView::Failed { message } => println!("✗ {}", message),
        ListView::Empty { message } => println!("{}", message),
        ListView::Items { cards, footer } => {
            for (i, card) in cards.iter().enumerate() {
                println!("{}. [{}] {} ({})", i + 1, card.class, card.title, card.id);
                println!("   {}", card.description);
                let mut badges: Vec<&str> = card.providers.iter().map(String::as_str).collect();
                badges.extend(card.frameworks.iter().map(String::as_str));
                println!("   Score: {:.1}  Tags: {}", card.score, badges.join(", "));
                println!();
            }
            match footer {
                Footer::Sentinel { error: None } => {
                    println!("More results available (use --pages or --all)")
                }
                Footer::Sentinel { error: Some(message) } => {
                    println!("✗ Next page failed: {}", message)
                }
                Footer::LoadingSkeleton | Footer::End => {}
            }
        }
    }
}

/// Archive and unarchive command implementation
async fn cmd_set_archived_impl(session: &Session, id: &str, archived: bool) -> crate::Result<()> {
    if let RouteDecision::RedirectToLogin = guard(&session.auth) {
        return Err(LeRecoError::Unauthenticated);
    }

    let api = api_client(session)?;
    let note = match api.set_archived(id, archived).await {
        Ok(response) if response.success => Notification::updated(archived),
        Ok(_) => Notification::failed(),
        Err(e) => {
            eprintln!("{}", format_error(&e));
            Notification::failed()
        }
    };

    println!("{}: {}", note.title, note.description);
    if note.destructive {
        return Err(LeRecoError::validation_error(format!(
            "Recommendation {} was not updated",
            id
        )));
    }
    Ok(())
}

/// Config command implementation
fn cmd_config_impl(config: &ClientConfig, defaults: bool) -> crate::Result<()> {
    let shown = if defaults {
        ClientConfig::default()
    } else {
        config.clone()
    };
    let out = toml::to_string_pretty(&shown).map_err(|e| {
        LeRecoError::config_error(format!("Failed to serialize configuration: {}", e), None)
    })?;
    print!("{}", out);
    Ok(())
}

/// Serve-stub command implementation
#[cfg(feature = "stub-server")]
async fn cmd_serve_stub_impl(host: &str, port: u16) -> crate::Result<()> {
    use crate::server::{StubServer, StubStore};

    let server = StubServer::bind(host, port, StubStore::seeded()).await?;
    let account = server.store().account().clone();

    println!("\nLeReco Stub API\n");
    println!("Server starting on {}\n", server.url());
    println!("Available endpoints:");
    println!("  POST /login");
    println!("  GET  /recommendations");
    println!("  POST /recommendations/:id/archive");
    println!("  POST /recommendations/:id/unarchive");
    println!("  GET  /health");
    println!("\nDemo credentials: {} / {}", account.username, account.password);
    println!("\nPress Ctrl+C to stop the server\n");

    server.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::RecommendationParams;
    use crate::query::QueryKey;
    use crate::test_support::{page, recommendation, FakeApi};
    use crate::types::{ArchiveResponse, AuthResponse, Page};
    use std::cell::Cell;

    /// Answers every list call with the same next cursor
    #[derive(Default)]
    struct RepeatingCursor {
        fetches: Cell<usize>,
    }

    impl RecommendationApi for RepeatingCursor {
        async fn authenticate(&self, _: &Credentials) -> crate::Result<AuthResponse> {
            Err(LeRecoError::auth_error("Unauthorized"))
        }

        async fn fetch_recommendations(&self, _: &RecommendationParams) -> crate::Result<Page> {
            let n = self.fetches.get();
            self.fetches.set(n + 1);
            let id = format!("r{}", n);
            Ok(page(&[id.as_str()], Some("same")))
        }

        async fn set_archived(&self, _: &str, _: bool) -> crate::Result<ArchiveResponse> {
            Ok(ArchiveResponse { success: false })
        }
    }

    #[tokio::test]
    async fn test_fetch_all_stops_on_repeated_cursor() {
        let feed = RecommendationFeed::new(RepeatingCursor::default(), 1, 4);
        feed.select(QueryKey::default()).await.expect("select");

        let fetched = fetch_pages(&feed, None).await.expect("pages");
        assert_eq!(fetched, 2);
        assert_eq!(feed.api().fetches.get(), 2);
    }

    #[tokio::test]
    async fn test_fetch_all_walks_to_the_end() {
        let items = (0..5)
            .map(|i| recommendation(&format!("r{}", i)))
            .collect();
        let feed = RecommendationFeed::new(FakeApi::with_items(items), 2, 4);
        feed.select(QueryKey::default()).await.expect("select");

        assert_eq!(fetch_pages(&feed, None).await.expect("pages"), 3);
        assert_eq!(feed.engine().items().len(), 5);
    }

    #[tokio::test]
    async fn test_fetch_stops_at_page_limit() {
        let items = (0..5)
            .map(|i| recommendation(&format!("r{}", i)))
            .collect();
        let feed = RecommendationFeed::new(FakeApi::with_items(items), 2, 4);
        feed.select(QueryKey::default()).await.expect("select");

        assert_eq!(fetch_pages(&feed, Some(2)).await.expect("pages"), 2);
        assert_eq!(feed.engine().items().len(), 4);
    }
}
