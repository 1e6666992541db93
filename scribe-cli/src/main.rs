//! Scribe CLI - auto-saves a Markdown draft to a remote endpoint while you edit it

mod watcher;

use anyhow::{bail, Context, Result};
use clap::{Arg, Command};
use scribe_autosave::{EditorSession, FieldStore, SaveOutcome};
use scribe_core::{Config, WidgetKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn, Level};

use watcher::DocumentWatcher;

/// Quiet period before a burst of file writes counts as one edit
const WATCH_DEBOUNCE: Duration = Duration::from_millis(200);

/// CLI arguments structure
#[derive(Debug, Clone)]
pub struct Args {
    pub file: PathBuf,
    pub url: Option<String>,
    pub interval_ms: Option<u64>,
    pub title: Option<String>,
    pub published: bool,
    pub widget: Option<String>,
    pub config_file: Option<PathBuf>,
    pub dev_mode: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse() -> Self {
        Self::from_matches(Self::command().get_matches())
    }

    fn command() -> Command {
        Command::new("scribe")
            .version("0.1.0")
            .about("Auto-save Markdown drafts to a remote endpoint while you edit them")
            .long_about(
                "Scribe opens a Markdown file as an editing session, watches it for changes \
                and periodically posts the draft to an auto-save endpoint as JSON. Published \
                documents are never auto-saved.",
            )
            .arg(
                Arg::new("file")
                    .help("Markdown file to edit (.md or .markdown)")
                    .required(true)
                    .index(1)
                    .value_parser(clap::value_parser!(PathBuf)),
            )
            .arg(
                Arg::new("url")
                    .short('u')
                    .long("url")
                    .help("Auto-save endpoint; auto-save is disabled without one")
                    .value_parser(clap::value_parser!(String)),
            )
            .arg(
                Arg::new("interval-ms")
                    .short('i')
                    .long("interval-ms")
                    .help("Milliseconds between auto-save attempts (default 30000)")
                    .value_parser(clap::value_parser!(u64)),
            )
            .arg(
                Arg::new("title")
                    .short('t')
                    .long("title")
                    .help("Draft title (defaults to the first heading or the file name)")
                    .value_parser(clap::value_parser!(String)),
            )
            .arg(
                Arg::new("published")
                    .long("published")
                    .help("Treat the document as published; nothing is auto-saved")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("widget")
                    .short('w')
                    .long("widget")
                    .help("Editing widget whose status indicator is used")
                    .value_parser(["easymde", "tinymde"]),
            )
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .help("Path to configuration file (JSON format)")
                    .value_parser(clap::value_parser!(PathBuf)),
            )
            .arg(
                Arg::new("dev-mode")
                    .long("dev-mode")
                    .help("Enable debug logging with targets and line numbers")
                    .action(clap::ArgAction::SetTrue),
            )
            .after_help(
                "EXAMPLES:\n    \
                scribe post.md --url https://blog.example/admin/post/7/autosave\n    \
                scribe post.md -u http://localhost:8080/autosave -i 5000 --title \"Notes\"\n    \
                scribe --config scribe.json post.md",
            )
    }

    fn from_matches(matches: clap::ArgMatches) -> Self {
        Self {
            file: matches
                .get_one::<PathBuf>("file")
                .cloned()
                .unwrap_or_default(),
            url: matches.get_one::<String>("url").cloned(),
            interval_ms: matches.get_one::<u64>("interval-ms").copied(),
            title: matches.get_one::<String>("title").cloned(),
            published: matches.get_flag("published"),
            widget: matches.get_one::<String>("widget").cloned(),
            config_file: matches.get_one::<PathBuf>("config").cloned(),
            dev_mode: matches.get_flag("dev-mode"),
        }
    }

    /// Check that the file argument names a readable Markdown file
    pub fn validate(&self) -> Result<()> {
        if !self.file.exists() {
            bail!("Markdown file not found: {}", self.file.display());
        }

        if self.file.is_dir() {
            bail!(
                "Path is a directory, not a file: {}\n\nExample: scribe {}/post.md",
                self.file.display(),
                self.file.display()
            );
        }

        let extension = self
            .file
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase());
        match extension.as_deref() {
            Some("md") | Some("markdown") => Ok(()),
            _ => bail!(
                "File must be a markdown file (.md or .markdown): {}",
                self.file.display()
            ),
        }
    }

    /// Load configuration, then apply environment and CLI overrides
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config_file {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => match default_config_path().filter(|path| path.exists()) {
                Some(path) => Config::from_file(&path)
                    .with_context(|| format!("Failed to load {}", path.display()))?,
                None => Config::new(),
            },
        };

        config.apply_environment_overrides(&Config::environment_overrides())?;
        self.apply_overrides(&mut config)?;
        config.validate()?;

        Ok(config)
    }

    fn apply_overrides(&self, config: &mut Config) -> Result<()> {
        if let Some(url) = &self.url {
            config.editor.auto_save_url = Some(url.clone());
        }
        if let Some(interval_ms) = self.interval_ms {
            config.editor.auto_save_interval_ms = interval_ms;
        }
        if let Some(widget) = &self.widget {
            config.editor.widget = widget.parse::<WidgetKind>()?;
        }
        Ok(())
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("scribe").join("config.json"))
}

/// Title for a draft: the first level-one heading, else the file stem
fn document_title(content: &str, path: &Path) -> String {
    content
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("# "))
        .map(|heading| heading.trim().to_string())
        .filter(|heading| !heading.is_empty())
        .unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
}

fn init_logging(dev_mode: bool, configured_level: &str) {
    // `Config::validate` has already rejected unknown levels.
    let log_level = if dev_mode {
        Level::DEBUG
    } else {
        configured_level.parse().unwrap_or(Level::INFO)
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(dev_mode)
        .with_line_number(dev_mode)
        .with_file(dev_mode);

    if dev_mode {
        subscriber.with_ansi(true).pretty().init();
        info!("Development mode enabled");
    } else {
        subscriber.with_ansi(true).init();
    }
}

async fn run(args: Args, config: Config) -> Result<()> {
    let content = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Cannot read {}", args.file.display()))?;
    let title = args
        .title
        .clone()
        .unwrap_or_else(|| document_title(&content, &args.file));

    let editor_config = config.editor.clone();
    let fields = Arc::new(FieldStore::with_fields([
        (editor_config.content_field.clone(), content),
        (editor_config.title_field.clone(), title.clone()),
        (editor_config.draft_field.clone(), (!args.published).to_string()),
    ]));

    let mut session = EditorSession::builder(editor_config, fields).build().await?;
    let mut watcher = DocumentWatcher::new(&args.file, WATCH_DEBOUNCE)
        .with_context(|| format!("Cannot watch {}", args.file.display()))?;

    println!("Scribe");
    println!("File:   {}", args.file.display());
    println!("Title:  {}", title);
    match &config.editor.auto_save_url {
        Some(url) if !args.published => println!(
            "Saving: {} every {} ms",
            url, config.editor.auto_save_interval_ms
        ),
        Some(_) => println!("Saving: off (published document)"),
        None => println!("Saving: off (no --url)"),
    }
    println!("\nPress Ctrl+C to stop.\n");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    error!("Failed to listen for shutdown signal: {}", e);
                }
                info!("Shutdown signal received");
                break;
            }
            changed = watcher.next_change() => {
                if !changed {
                    warn!("File watcher stopped; shutting down");
                    break;
                }
                match tokio::fs::read_to_string(watcher.target_path()).await {
                    Ok(text) => {
                        debug!("{} changed on disk", args.file.display());
                        if let Err(e) = session.apply_edit(text).await {
                            warn!("Failed to apply edit: {}", e);
                        }
                    }
                    Err(e) => warn!("Cannot read {}: {}", args.file.display(), e),
                }
            }
        }
    }

    // No tick may run alongside the final flush.
    session.stop_auto_save().await;
    match session.save_now().await {
        Some(SaveOutcome::Failed { error, .. }) => warn!("Final auto-save failed: {}", error),
        Some(outcome) => debug!("Final auto-save: {:?}", outcome),
        None => {}
    }
    session.teardown().await?;

    println!("Scribe stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Err(e) = args.validate() {
        eprintln!("Invalid arguments:\n{:#}", e);
        std::process::exit(1);
    }

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(args.dev_mode, &config.logging.level);
    info!("Starting scribe for {}", args.file.display());

    run(args, config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::from_matches(Args::command().get_matches_from(argv))
    }

    #[test]
    fn test_parse_arguments() {
        let args = parse(&[
            "scribe",
            "post.md",
            "--url",
            "http://localhost:8080/autosave",
            "-i",
            "5000",
            "--published",
            "--widget",
            "tinymde",
        ]);

        assert_eq!(args.file, PathBuf::from("post.md"));
        assert_eq!(args.url.as_deref(), Some("http://localhost:8080/autosave"));
        assert_eq!(args.interval_ms, Some(5000));
        assert!(args.published);
        assert_eq!(args.widget.as_deref(), Some("tinymde"));
        assert!(!args.dev_mode);
    }

    #[test]
    fn test_cli_overrides_config() {
        let args = parse(&[
            "scribe",
            "post.md",
            "--url",
            "https://blog.example/autosave",
            "--interval-ms",
            "1500",
            "--widget",
            "tinymde",
        ]);
        let mut config = Config::new();
        args.apply_overrides(&mut config).unwrap();

        assert_eq!(
            config.editor.auto_save_url.as_deref(),
            Some("https://blog.example/autosave")
        );
        assert_eq!(config.editor.auto_save_interval_ms, 1500);
        assert_eq!(config.editor.widget, WidgetKind::TinyMde);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("notes.txt");
        std::fs::write(&text, "hello").unwrap();
        let markdown = dir.path().join("notes.md");
        std::fs::write(&markdown, "# Notes").unwrap();

        let args = parse(&["scribe", text.to_str().unwrap()]);
        assert!(args.validate().is_err());

        let args = parse(&["scribe", markdown.to_str().unwrap()]);
        assert!(args.validate().is_ok());

        let args = parse(&["scribe", dir.path().to_str().unwrap()]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("scribe.json");
        let mut config = Config::new();
        config.editor.auto_save_interval_ms = 10_000;
        config.save_to_file(&config_path).unwrap();

        let args = parse(&["scribe", "post.md", "--config", config_path.to_str().unwrap()]);
        let mut loaded = Config::from_file(args.config_file.as_deref().unwrap()).unwrap();
        args.apply_overrides(&mut loaded).unwrap();

        assert_eq!(loaded.editor.auto_save_interval_ms, 10_000);
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("scribe.json");
        std::fs::write(&config_path, r#"{ "logging": { "level": "chatty" } }"#).unwrap();

        let args = parse(&["scribe", "post.md", "--config", config_path.to_str().unwrap()]);
        let err = args.load_config().unwrap_err();
        assert!(format!("{:#}", err).contains("chatty"));
    }

    #[test]
    fn test_document_title() {
        let path = Path::new("drafts/weekly-notes.md");

        assert_eq!(document_title("intro\n# Weekly notes \nbody", path), "Weekly notes");
        assert_eq!(document_title("## Only a subheading", path), "weekly-notes");
        assert_eq!(document_title("#\n", path), "weekly-notes");
    }
}
