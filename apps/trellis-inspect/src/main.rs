//! Inspects scheme projects from the command line and prints JSON.

use clap::Parser;
use clap::Subcommand;
use indexmap::IndexMap;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tr_core::TrellisError;
use tr_core::TrellisResult;
use tr_project::Project;
use tr_registry::ContainerKind;
use tr_registry::PropertyType;
use tr_registry::Registry;
use tr_registry::WidgetCategory;
use tr_storage::FsStorage;
use tr_storage::StorageConfig;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "TRELLIS_LOG";

#[derive(Debug, Parser)]
#[command(name = "trellis-inspect")]
#[command(about = "Inspect UI scheme projects: windows, widget properties and markup")]
#[command(version)]
struct Cli {
    /// Directory the osjs:// namespace is mounted at (defaults to
    /// $TRELLIS_STORAGE_DIR or the working directory).
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    /// Zero-based index of the window to inspect.
    #[arg(long, global = true, default_value_t = 0)]
    window: usize,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the window names of a project's scheme
    Fragments { project: String },
    /// Resolve the property set of a widget
    Properties {
        project: String,
        /// Registered widget tag, e.g. gui-button
        tag: String,
        /// Element path relative to the window; the window itself if omitted
        #[arg(long)]
        path: Option<String>,
    },
    /// Print the serialized scheme markup
    Markup {
        project: String,
        /// Element path relative to the window; the whole scheme if omitted
        #[arg(long)]
        path: Option<String>,
    },
    /// List the builtin widget catalogue
    Widgets,
}

#[derive(Debug, Serialize)]
struct WidgetSummary<'a> {
    tag: &'a str,
    category: WidgetCategory,
    container: &'a ContainerKind,
    icon: Option<&'a str>,
    special: bool,
    #[serde(rename = "hasInnerLabel")]
    has_inner_label: bool,
    types: IndexMap<String, PropertyType>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let mut stdout = std::io::stdout().lock();
    match run(&cli, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn setup_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli, out: &mut dyn Write) -> TrellisResult<()> {
    match &cli.command {
        Command::Fragments { project } => {
            let project = open(cli, project)?;
            print_json(out, project.fragments())
        }
        Command::Properties { project, tag, path } => {
            let Some(descriptor) = Registry::builtin().lookup(tag) else {
                return Err(TrellisError::new(
                    "cli.unknown_widget",
                    format!("`{tag}` is not a registered widget"),
                ));
            };
            let project = open(cli, project)?;
            let properties = project.element_properties(path.as_deref(), tag, descriptor);
            print_json(out, &properties)
        }
        Command::Markup { project, path } => {
            let project = open(cli, project)?;
            let markup = match path {
                None => project.markup(),
                Some(path) => project.element_markup(path).ok_or_else(|| {
                    TrellisError::new(
                        "cli.element_not_found",
                        format!("`{path}` matches no element in window {}", cli.window),
                    )
                })?,
            };
            print_line(out, &markup)
        }
        Command::Widgets => {
            let widgets: Vec<_> = Registry::builtin()
                .entries()
                .map(|entry| WidgetSummary {
                    tag: &entry.tag,
                    category: entry.category,
                    container: &entry.descriptor.container,
                    icon: entry.descriptor.icon.as_deref(),
                    special: entry.descriptor.special,
                    has_inner_label: entry.descriptor.has_inner_label,
                    types: entry.descriptor.effective_property_types(),
                })
                .collect();
            print_json(out, &widgets)
        }
    }
}

fn open(cli: &Cli, name: &str) -> TrellisResult<Project> {
    let mut config = StorageConfig::default();
    if let Some(dir) = &cli.storage_dir {
        config.root = dir.clone();
    }
    tracing::debug!(root = %config.root.display(), project = name, "opening project");

    let storage = FsStorage::new(config);
    let mut project = Project::new(name);
    project.load(&storage)?;
    project.set_current_window(cli.window);
    Ok(project)
}

fn print_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> TrellisResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|error| TrellisError::new("cli.output_failed", error.to_string()))?;
    print_line(out, &text)
}

fn print_line(out: &mut dyn Write, text: &str) -> TrellisResult<()> {
    writeln!(out, "{text}")
        .map_err(|error| TrellisError::new("cli.output_failed", error.to_string()))
}
