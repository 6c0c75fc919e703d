// # booklist - interactive book list
//
// Thin terminal front end over booklist-core:
// 1. Reading configuration from environment variables
// 2. Building the table store through the registry
// 3. Mounting the book list screen
// 4. Forwarding typed commands and re-rendering the list on change
//
// ## Configuration
//
// ### Store
// - `BOOKLIST_STORE_TYPE`: Type of table store (memory, file, rest)
// - `BOOKLIST_STORE_PATH`: Path to the table file (for file)
// - `BOOKLIST_STORE_URL`: Project URL (for rest)
// - `BOOKLIST_STORE_API_KEY`: Project API key (for rest)
// - `BOOKLIST_STORE_SCHEMA`: Schema profile (for rest, optional)
//
// ### Table
// - `BOOKLIST_TABLE`: Table name (default: books)
//
// ### Logging
// - `BOOKLIST_LOG_LEVEL`: trace, debug, info, warn, error (default: warn)
//
// Logs go to stderr; stdout carries only the rendered list and help.
//
// ## Example
//
// ```bash
// export BOOKLIST_STORE_TYPE=rest
// export BOOKLIST_STORE_URL=https://project.example.co
// export BOOKLIST_STORE_API_KEY=your_anon_key
//
// booklist
// ```

mod command;
mod render;

use std::env;
use std::io::Write;
use std::process::ExitCode;

use anyhow::Result;
use booklist_core::{BookListApp, BooklistConfig, StoreConfig, StoreRegistry, SyncEvent};
use booklist_core::{Book, TableConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::{LinesStream, WatchStream};
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

use command::{Command, Field, HELP};
use render::render_list;

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum BooklistExitCode {
    /// Normal exit
    Clean = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<BooklistExitCode> for ExitCode {
    fn from(code: BooklistExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    store_type: String,
    store_path: Option<String>,
    store_url: Option<String>,
    store_api_key: Option<String>,
    store_schema: Option<String>,
    table: String,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        Self {
            store_type: env::var("BOOKLIST_STORE_TYPE").unwrap_or_else(|_| "memory".to_string()),
            store_path: env::var("BOOKLIST_STORE_PATH").ok(),
            store_url: env::var("BOOKLIST_STORE_URL").ok(),
            store_api_key: env::var("BOOKLIST_STORE_API_KEY").ok(),
            store_schema: env::var("BOOKLIST_STORE_SCHEMA").ok(),
            table: env::var("BOOKLIST_TABLE").unwrap_or_else(|_| "books".to_string()),
            log_level: env::var("BOOKLIST_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string()),
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        match self.store_type.as_str() {
            "memory" => {}
            "file" => {
                if self.store_path.as_ref().is_none_or(|p| p.is_empty()) {
                    anyhow::bail!(
                        "BOOKLIST_STORE_PATH is required when BOOKLIST_STORE_TYPE=file. \
                        Set it via: export BOOKLIST_STORE_PATH=~/.local/share/booklist/books.json"
                    );
                }
            }
            "rest" => {
                if !cfg!(feature = "rest") {
                    anyhow::bail!(
                        "BOOKLIST_STORE_TYPE=rest needs a build with the `rest` feature"
                    );
                }

                if self.store_url.as_ref().is_none_or(|u| u.is_empty()) {
                    anyhow::bail!("BOOKLIST_STORE_URL is required when BOOKLIST_STORE_TYPE=rest");
                }

                let key = self.store_api_key.as_deref().unwrap_or_default();
                if key.is_empty() {
                    anyhow::bail!(
                        "BOOKLIST_STORE_API_KEY is required when BOOKLIST_STORE_TYPE=rest. \
                        Set it via: export BOOKLIST_STORE_API_KEY=your_key"
                    );
                }

                // Check for obvious placeholder keys (common mistake)
                let key_lower = key.to_lowercase();
                if key_lower.contains("your_key")
                    || key_lower.contains("your_anon_key")
                    || key_lower.contains("replace_me")
                {
                    anyhow::bail!(
                        "BOOKLIST_STORE_API_KEY appears to be a placeholder. \
                        Use the API key of your project."
                    );
                }
            }
            other => anyhow::bail!(
                "BOOKLIST_STORE_TYPE '{}' is not supported. \
                Supported types: memory, file, rest",
                other
            ),
        }

        if self.table.is_empty() {
            anyhow::bail!("BOOKLIST_TABLE cannot be empty");
        }

        self.level()?;

        // Same checks the registry runs before building the store
        self.booklist_config().validate()?;
        Ok(())
    }

    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "BOOKLIST_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Core configuration for the validated settings
    fn booklist_config(&self) -> BooklistConfig {
        let store = match self.store_type.as_str() {
            "file" => StoreConfig::File {
                path: self.store_path.clone().unwrap_or_default(),
            },
            "rest" => StoreConfig::Rest {
                url: self.store_url.clone().unwrap_or_default(),
                api_key: self.store_api_key.clone().unwrap_or_default(),
                schema: self.store_schema.clone(),
            },
            _ => StoreConfig::Memory,
        };

        BooklistConfig {
            store,
            table: TableConfig {
                name: self.table.clone(),
                ..TableConfig::default()
            },
            ..BooklistConfig::default()
        }
    }
}

fn main() -> ExitCode {
    let config = Config::from_env();

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return BooklistExitCode::ConfigError.into();
    }

    let log_level = config.level().unwrap_or(Level::WARN);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return BooklistExitCode::ConfigError.into();
    }

    info!(store = %config.store_type, table = %config.table, "Starting booklist");

    // One thread: store calls suspend the command loop, nothing runs in parallel
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return BooklistExitCode::RuntimeError.into();
        }
    };

    let (app, events) = match open_app(&config.booklist_config()) {
        Ok(opened) => opened,
        Err(e) => {
            error!("Failed to open the book list: {:#}", e);
            return BooklistExitCode::ConfigError.into();
        }
    };

    let result = rt.block_on(async {
        match run(app, events).await {
            Ok(()) => BooklistExitCode::Clean,
            Err(e) => {
                error!("booklist error: {:#}", e);
                BooklistExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Build the store through the registry and the screen on top of it
fn open_app(config: &BooklistConfig) -> Result<(BookListApp, mpsc::Receiver<SyncEvent>)> {
    let registry = StoreRegistry::with_builtin();

    #[cfg(feature = "rest")]
    booklist_store_rest::register(&registry);

    let store = registry.create_store(&config.store)?;
    Ok(BookListApp::new(store, config)?)
}

/// Run the interactive loop until `quit` or end of input
async fn run(app: BookListApp, events: mpsc::Receiver<SyncEvent>) -> Result<()> {
    let event_logger = tokio::spawn(log_events(events));
    let renderer = tokio::spawn(render_on_change(
        app.list().cell().changes(),
        std::io::stdout(),
    ));

    app.mount().await;
    println!("{}", HELP);

    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    while let Some(line) = lines.next().await {
        let line = line?;
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        if command == Command::Quit {
            break;
        }
        dispatch(&app, command).await;
    }

    // Dropping the screen closes the list cell and the event channel;
    // both tasks finish once they have drained what is pending.
    drop(app);
    let _ = renderer.await;
    let _ = event_logger.await;

    info!("booklist stopped");
    Ok(())
}

/// Forward one command to the screen
async fn dispatch(app: &BookListApp, command: Command) {
    match command {
        Command::Add { name, author } => {
            app.set_name(name);
            app.set_author(author);
            app.save().await;
        }
        Command::Name(name) => app.set_name(name),
        Command::Author(author) => app.set_author(author),
        Command::Save => {
            app.save().await;
        }
        Command::List => print!("{}", render_list(&app.books())),
        Command::Edit {
            index,
            field,
            value,
        } => {
            let Some(book) = nth_book(app, index) else {
                return;
            };
            match field {
                Field::Name => app.edit_name(&book, value),
                Field::Author => app.edit_author(&book, value),
            }
        }
        Command::Update => app.commit_edit().await,
        Command::Delete(index) => {
            if let Some(book) = nth_book(app, index) {
                app.delete(&book.id).await;
            }
        }
        Command::Reload => {
            app.reload().await;
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
}

/// The book shown at 1-based `index`
fn nth_book(app: &BookListApp, index: usize) -> Option<Book> {
    let book = index
        .checked_sub(1)
        .and_then(|i| app.books().into_iter().nth(i));
    if book.is_none() {
        println!("no book at position {}", index);
    }
    book
}

/// Write the list every time it is replaced or grows
///
/// Returns the writer once the list cell is gone or the writer fails.
async fn render_on_change<W: Write>(mut changes: WatchStream<Vec<Book>>, mut out: W) -> W {
    while let Some(books) = changes.next().await {
        let written = out
            .write_all(render_list(&books).as_bytes())
            .and_then(|()| out.flush());
        if written.is_err() {
            break;
        }
    }
    out
}

async fn log_events(mut events: mpsc::Receiver<SyncEvent>) {
    while let Some(event) = events.recv().await {
        debug!(?event, "sync event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(store_type: &str) -> Config {
        Config {
            store_type: store_type.to_string(),
            store_path: None,
            store_url: None,
            store_api_key: None,
            store_schema: None,
            table: "books".to_string(),
            log_level: "warn".to_string(),
        }
    }

    #[test]
    fn test_memory_needs_nothing() {
        assert!(config("memory").validate().is_ok());
        assert!(matches!(
            config("memory").booklist_config().store,
            StoreConfig::Memory
        ));
    }

    #[test]
    fn test_file_requires_path() {
        let mut cfg = config("file");
        assert!(cfg.validate().is_err());

        cfg.store_path = Some("/tmp/books.json".into());
        assert!(cfg.validate().is_ok());
    }

    #[cfg(feature = "rest")]
    #[test]
    fn test_rest_requires_url_and_real_key() {
        let mut cfg = config("rest");
        cfg.store_url = Some("https://project.example.co".into());
        assert!(cfg.validate().is_err());

        cfg.store_api_key = Some("your_anon_key".into());
        assert!(cfg.validate().is_err());

        cfg.store_api_key = Some("eyJhbGciOiJIUzI1NiJ9.anon".into());
        assert!(cfg.validate().is_ok());

        let core = cfg.booklist_config();
        assert_eq!(core.store.type_name(), "rest");
        assert!(core.validate().is_ok());
    }

    #[test]
    fn test_unknown_store_and_level() {
        assert!(config("sqlite").validate().is_err());

        let mut cfg = config("memory");
        cfg.log_level = "loud".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_table_name_flows_into_core_config() {
        let mut cfg = config("memory");
        cfg.table = "reading_list".into();
        let core = cfg.booklist_config();
        assert_eq!(core.table.name, "reading_list");
        assert_eq!(core.table.order_column, "created_at");
    }

    #[cfg(feature = "rest")]
    #[test]
    fn test_rest_url_without_scheme_is_a_config_error() {
        let mut cfg = config("rest");
        cfg.store_url = Some("project.example.co".into());
        cfg.store_api_key = Some("eyJhbGciOiJIUzI1NiJ9.anon".into());

        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("HTTP or HTTPS"));
    }

    #[cfg(not(feature = "rest"))]
    #[test]
    fn test_rest_needs_the_feature() {
        let mut cfg = config("rest");
        cfg.store_url = Some("https://project.example.co".into());
        cfg.store_api_key = Some("eyJhbGciOiJIUzI1NiJ9.anon".into());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_open_app_rejects_invalid_store() {
        let config = BooklistConfig {
            store: StoreConfig::File {
                path: String::new(),
            },
            ..BooklistConfig::default()
        };
        assert!(open_app(&config).is_err());
    }

    async fn memory_app() -> BookListApp {
        let (app, _events) = open_app(&config("memory").booklist_config()).unwrap();
        app.mount().await;
        app
    }

    fn names(app: &BookListApp) -> Vec<String> {
        app.books().into_iter().map(|b| b.name).collect()
    }

    #[tokio::test]
    async fn test_dispatch_add_edit_update_delete() {
        let app = memory_app().await;

        dispatch(&app, Command::parse("add Dune | Herbert").unwrap().unwrap()).await;
        dispatch(&app, Command::parse("add Emma | Austen").unwrap().unwrap()).await;
        assert_eq!(names(&app), ["Emma", "Dune"]);

        dispatch(&app, Command::parse("edit 2 name Dune Messiah").unwrap().unwrap()).await;
        dispatch(&app, Command::Update).await;
        assert_eq!(names(&app), ["Emma", "Dune"], "update does not touch the list");

        dispatch(&app, Command::Reload).await;
        assert_eq!(names(&app), ["Emma", "Dune Messiah"]);

        dispatch(&app, Command::Delete(1)).await;
        assert_eq!(names(&app), ["Dune Messiah"]);
    }

    #[tokio::test]
    async fn test_dispatch_save_skips_empty_author() {
        let app = memory_app().await;

        dispatch(&app, Command::Name("Dune".into())).await;
        dispatch(&app, Command::Save).await;

        assert!(app.books().is_empty());
        assert_eq!(app.form().name.get(), "Dune");
    }

    #[tokio::test]
    async fn test_out_of_range_positions_are_ignored() {
        let app = memory_app().await;
        dispatch(&app, Command::parse("add Dune | Herbert").unwrap().unwrap()).await;

        assert!(nth_book(&app, 0).is_none());
        assert!(nth_book(&app, 2).is_none());
        assert_eq!(nth_book(&app, 1).map(|b| b.name).as_deref(), Some("Dune"));

        dispatch(&app, Command::Delete(2)).await;
        dispatch(&app, Command::parse("edit 3 author Nobody").unwrap().unwrap()).await;
        assert_eq!(names(&app), ["Dune"]);
        assert!(app.form().edit.get().is_none());
    }

    #[tokio::test]
    async fn test_last_change_is_rendered_before_shutdown() {
        let app = memory_app().await;
        let renderer = tokio::spawn(render_on_change(
            app.list().cell().changes(),
            Vec::new(),
        ));

        dispatch(&app, Command::parse("add Dune | Herbert").unwrap().unwrap()).await;
        drop(app);

        let out = String::from_utf8(renderer.await.unwrap()).unwrap();
        assert!(out.ends_with("1. Dune - Herbert\n"), "got {out:?}");
    }
}
