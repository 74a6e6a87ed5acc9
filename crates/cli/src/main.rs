//! mergeview command-line front end.
//!
//! Drives a merge viewer controller against files on disk: shows the
//! comparison, optionally merges or copies between sides, and resolves the
//! resulting edits with the configured save policy when the comparison is
//! closed. Also generates and validates configuration files.

mod files;
mod style;
mod terminal;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mergeview_core::config::{SavePolicy, ViewerConfig};
use mergeview_core::container::WatchRegistry;
use mergeview_core::controller::{MergeViewerController, SwitchOutcome};
use mergeview_core::input::{CompareInput, DiffNode};
use mergeview_core::listeners::ViewerEvent;
use mergeview_core::merge::TextMerger;
use mergeview_core::provider::NodeContentProvider;
use mergeview_core::renderer::Renderer;
use mergeview_core::side::{CopyDirection, Side};

use crate::files::{ComparePaths, FileContentProvider};
use crate::terminal::{ConsoleNotifier, DialoguerConfirmer, TerminalRenderer};

const DEFAULT_CONFIG_PATH: &str = "./mergeview.toml";

const DEFAULT_CONFIG_TOML: &str = r#"# mergeview configuration

[viewer]
# How edits are resolved when a comparison is closed:
# "confirm", "silent_flush" or "always_flush".
save_policy = "confirm"
ancestor_visible = false
ignore_ancestor = false
mirrored = false
left_editable = true
right_editable = true

[messages]
save_title = "Save Resource"
save_message = "The comparison has been modified. Save changes?"
resource_changed_title = "Resource Changed"
resource_changed_message = "The resource being compared was changed outside the viewer. Save your changes before they are replaced?"

[logging]
level = "warn"
"#;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// mergeview command-line front end.
#[derive(Parser, Debug)]
#[command(
    name = "mergeview",
    version,
    about = "Compare and merge files with save-before-close semantics"
)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate {
        /// Print a machine-readable report.
        #[arg(long)]
        json: bool,
    },

    /// Compare two files, optionally against a common ancestor.
    Compare(CompareArgs),
}

#[derive(clap::Args, Debug)]
struct CompareArgs {
    /// Left file.
    left: PathBuf,

    /// Right file.
    right: PathBuf,

    /// Common ancestor for a three-way comparison.
    #[arg(short, long)]
    ancestor: Option<PathBuf>,

    /// Merge non-conflicting changes from both sides into the left file.
    #[arg(long, requires = "ancestor", conflicts_with = "mirror")]
    merge: bool,

    /// Copy one side over the other.
    #[arg(long, value_enum)]
    copy: Option<CopyArg>,

    /// Show the right file on the left and vice versa.
    #[arg(long)]
    mirror: bool,

    /// Save without asking.
    #[arg(short, long)]
    yes: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CopyArg {
    LeftToRight,
    RightToLeft,
}

impl From<CopyArg> for CopyDirection {
    fn from(arg: CopyArg) -> Self {
        match arg {
            CopyArg::LeftToRight => CopyDirection::LeftToRight,
            CopyArg::RightToLeft => CopyDirection::RightToLeft,
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", style::error(&format!("{:#}", e)));
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { output } => {
            init_logging("warn");
            cmd_init(&output)
        }
        Commands::Validate { json } => {
            init_logging("warn");
            let path = cli
                .config
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
            cmd_validate(&path, json)
        }
        Commands::Compare(args) => {
            let config = load_config(cli.config.as_deref())?;
            init_logging(&config.logging.level);
            cmd_compare(config, args)
        }
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn load_config(path: Option<&Path>) -> Result<ViewerConfig> {
    match path {
        Some(path) => {
            ViewerConfig::load_and_resolve(path).context("failed to load configuration file")
        }
        None => {
            let mut config = ViewerConfig::default();
            config
                .apply_env_overrides()
                .context("failed to apply environment overrides")?;
            config.validate().context("invalid default configuration")?;
            Ok(config)
        }
    }
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_init(output: &Path) -> Result<()> {
    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, DEFAULT_CONFIG_TOML).context("failed to write config file")?;

    println!(
        "{}",
        style::success(&format!(
            "Default configuration written to {}",
            output.display()
        ))
    );
    println!();
    println!("Next steps:");
    println!("  1. Pick a save policy and prompt texts");
    println!(
        "  2. Validate with: mergeview validate --config {}",
        output.display()
    );
    println!(
        "  3. Compare files: mergeview compare --config {} LEFT RIGHT",
        output.display()
    );

    Ok(())
}

fn cmd_validate(config_path: &Path, json: bool) -> Result<()> {
    let mut config =
        ViewerConfig::load_from_file(config_path).context("failed to parse configuration")?;
    let result = config
        .apply_env_overrides()
        .and_then(|()| config.validate());

    if json {
        let report = serde_json::json!({
            "path": config_path.display().to_string(),
            "valid": result.is_ok(),
            "error": result.as_ref().err().map(|e| e.to_string()),
            "config": config,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to encode report")?
        );
        return result.context("configuration validation failed");
    }

    println!("Validating configuration: {}", config_path.display());
    println!();
    println!("  [OK] TOML structure is valid");
    match &result {
        Ok(()) => println!("  [OK] All fields are valid"),
        Err(e) => {
            println!("  [FAIL] Validation error: {}", e);
            anyhow::bail!("configuration validation failed");
        }
    }

    println!();
    println!("Configuration summary:");
    println!("  Save policy     : {}", config.viewer.save_policy);
    println!("  Ancestor pane   : {}", on_off(config.viewer.ancestor_visible));
    println!("  Ignore ancestor : {}", on_off(config.viewer.ignore_ancestor));
    println!("  Mirrored        : {}", on_off(config.viewer.mirrored));
    println!(
        "  Editable sides  : left {}, right {}",
        on_off(config.viewer.left_editable),
        on_off(config.viewer.right_editable)
    );
    println!("  Log level       : {}", config.logging.level);
    println!();
    println!("Configuration is valid.");

    Ok(())
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn cmd_compare(mut config: ViewerConfig, args: CompareArgs) -> Result<()> {
    if args.yes {
        config.viewer.save_policy = SavePolicy::SilentFlush;
    }
    if args.merge && config.viewer.mirrored {
        anyhow::bail!("--merge writes the left file and cannot be used with a mirrored viewer");
    }

    let paths = ComparePaths {
        ancestor: args.ancestor.clone(),
        left: args.left.clone(),
        right: args.right.clone(),
    };
    let node = Arc::new(paths.load()?);
    let provider = Arc::new(FileContentProvider::new(
        paths,
        NodeContentProvider::from_settings(&config.viewer),
    ));
    let registry = Arc::new(WatchRegistry::<DiffNode>::new());

    let mut controller = MergeViewerController::<DiffNode, _>::new(
        config,
        provider,
        registry,
        TerminalRenderer::new(),
        Box::new(DialoguerConfirmer),
    )
    .context("invalid viewer configuration")?
    .with_notifier(Box::new(ConsoleNotifier));

    controller.add_listener(Arc::new(|event: &ViewerEvent| {
        debug!(
            property = event.property(),
            value = event.new_value(),
            "viewer event"
        );
    }));

    println!("{}", style::header(&node.name()));
    let _ = controller.bind(Some(node))?;

    if args.mirror {
        let _ = controller.set_mirrored(!controller.is_mirrored())?;
    }

    if args.merge {
        merge_into_left(&mut controller)?;
    }

    if let Some(copy) = args.copy {
        if !controller.copy(copy.into()) {
            println!("{}", style::warn("copy target is read-only, nothing copied"));
        }
    }

    if !controller.is_dirty() {
        controller.dispose();
        return Ok(());
    }

    // Closing the comparison resolves the pending edits.
    let outcome = controller.bind(None).context("failed to save changes")?;
    if outcome == SwitchOutcome::Cancelled {
        println!("{}", style::warn("changes were not saved"));
    } else {
        println!("{}", style::success("comparison closed"));
    }
    controller.dispose();
    Ok(())
}

fn merge_into_left(
    controller: &mut MergeViewerController<DiffNode, TerminalRenderer>,
) -> Result<()> {
    let renderer = controller.renderer();
    let ancestor = renderer
        .ancestor()
        .map(<[u8]>::to_vec)
        .context("the ancestor has no content")?;
    let left = renderer.contents(Side::Left).unwrap_or_default();
    let right = renderer.contents(Side::Right).unwrap_or_default();

    let result = TextMerger::merge_bytes(&ancestor, &left, &right)
        .context("cannot merge binary content")?;
    if result.has_conflicts {
        println!(
            "{}",
            style::warn(&format!(
                "{} conflict(s) left in the left side",
                result.conflicts.len()
            ))
        );
    } else {
        println!("{}", style::success("merged without conflicts"));
    }

    if result.content.as_bytes() != left.as_slice() {
        controller.apply_edit(Side::Left, result.content.into_bytes());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_merge_rejects_mirror() {
        let parsed = Cli::try_parse_from([
            "mergeview", "compare", "--merge", "--mirror", "-a", "base.txt", "l.txt", "r.txt",
        ]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from([
            "mergeview", "compare", "--merge", "-a", "base.txt", "l.txt", "r.txt",
        ])
        .unwrap();
        assert!(matches!(parsed.command, Commands::Compare(CompareArgs { merge: true, .. })));
    }

    #[test]
    fn test_default_template_is_valid() {
        let config = ViewerConfig::from_toml(DEFAULT_CONFIG_TOML).unwrap();
        config.validate().unwrap();
        assert_eq!(config.viewer.save_policy, SavePolicy::Confirm);
        assert_eq!(config.messages.save_title, "Save Resource");
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mergeview.toml");

        cmd_init(&path).unwrap();
        assert!(ViewerConfig::load_from_file(&path).is_ok());
        assert!(cmd_init(&path).is_err());
    }

    #[test]
    fn test_compare_merge_saves_left() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("base.txt");
        let left = dir.path().join("left.txt");
        let right = dir.path().join("right.txt");
        std::fs::write(&base, "a\nb\nc\nd\ne\nf\n").unwrap();
        std::fs::write(&left, "A\nb\nc\nd\ne\nf\n").unwrap();
        std::fs::write(&right, "a\nb\nc\nd\ne\nF\n").unwrap();

        let args = CompareArgs {
            left: left.clone(),
            right: right.clone(),
            ancestor: Some(base),
            merge: true,
            copy: None,
            mirror: false,
            yes: true,
        };
        cmd_compare(ViewerConfig::default(), args).unwrap();

        assert_eq!(
            std::fs::read_to_string(&left).unwrap(),
            "A\nb\nc\nd\ne\nF\n"
        );
        assert_eq!(
            std::fs::read_to_string(&right).unwrap(),
            "a\nb\nc\nd\ne\nF\n"
        );
    }

    #[test]
    fn test_compare_merge_refuses_mirrored_config() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("base.txt");
        let left = dir.path().join("left.txt");
        let right = dir.path().join("right.txt");
        std::fs::write(&base, "a\n").unwrap();
        std::fs::write(&left, "b\n").unwrap();
        std::fs::write(&right, "a\n").unwrap();

        let mut config = ViewerConfig::default();
        config.viewer.mirrored = true;
        let args = CompareArgs {
            left: left.clone(),
            right: right.clone(),
            ancestor: Some(base),
            merge: true,
            copy: None,
            mirror: false,
            yes: true,
        };
        let err = cmd_compare(config, args).unwrap_err();
        assert!(err.to_string().contains("mirrored"));
        assert_eq!(std::fs::read_to_string(&right).unwrap(), "a\n");
    }

    #[test]
    fn test_compare_copy_respects_read_only() {
        let dir = TempDir::new().unwrap();
        let left = dir.path().join("left.txt");
        let right = dir.path().join("right.txt");
        std::fs::write(&left, "left\n").unwrap();
        std::fs::write(&right, "right\n").unwrap();

        let mut config = ViewerConfig::default();
        config.viewer.right_editable = false;
        let args = CompareArgs {
            left: left.clone(),
            right: right.clone(),
            ancestor: None,
            merge: false,
            copy: Some(CopyArg::LeftToRight),
            mirror: false,
            yes: true,
        };
        cmd_compare(config, args).unwrap();
        assert_eq!(std::fs::read_to_string(&right).unwrap(), "right\n");

        let args = CompareArgs {
            left: left.clone(),
            right: right.clone(),
            ancestor: None,
            merge: false,
            copy: Some(CopyArg::RightToLeft),
            mirror: false,
            yes: true,
        };
        cmd_compare(ViewerConfig::default(), args).unwrap();
        assert_eq!(std::fs::read_to_string(&left).unwrap(), "right\n");
    }
}
