//! CLI argument definitions using clap derive

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Rendr - server-side rendering for React components
///
/// Bundles components with esbuild, renders them in a JavaScript runtime
/// and caches the builds per file until a source file changes.
#[derive(Parser, Debug)]
#[command(name = "rendr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "RENDR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local rendr.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,

    /// Override the configured frontend directory
    #[arg(long, global = true, value_name = "DIR")]
    pub frontend_dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a component to a full HTML document
    Render(RenderArgs),

    /// Build the standalone client script for a component
    Client(ClientArgs),

    /// Render a component and re-render whenever its sources change
    Dev(DevArgs),

    /// Check that the bundler and JavaScript runtime are available
    Status,

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Options shared by every command that renders a component
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Component file, relative to the frontend directory
    pub file: PathBuf,

    /// Route identifier (defaults to the file path)
    #[arg(long)]
    pub route: Option<String>,

    /// Props as a JSON document
    #[arg(short, long, value_name = "JSON")]
    pub props: Option<String>,
}

/// Arguments for the render command
#[derive(Parser, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Document title
    #[arg(short, long, default_value = "")]
    pub title: String,

    /// Meta tag (KEY=VALUE, can be repeated)
    #[arg(short, long = "meta", value_name = "KEY=VALUE")]
    pub meta: Vec<String>,

    /// Request path for server-side routing
    #[arg(short, long)]
    pub location: Option<String>,

    /// Write the document to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the client command
#[derive(Parser, Debug)]
pub struct ClientArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Write the script to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the dev command
#[derive(Parser, Debug)]
pub struct DevArgs {
    #[command(flatten)]
    pub render: RenderArgs,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,

        /// Write a project-local rendr.toml in the current directory
        #[arg(long)]
        local: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_render_flags() {
        let cli = Cli::try_parse_from([
            "rendr",
            "render",
            "pages/Home.tsx",
            "--props",
            r#"{"name":"Ann"}"#,
            "--meta",
            "description=Landing",
            "-m",
            "og:title=Home",
            "--location",
            "/home",
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Render(args) => {
                assert_eq!(args.target.file, PathBuf::from("pages/Home.tsx"));
                assert_eq!(args.target.props.as_deref(), Some(r#"{"name":"Ann"}"#));
                assert_eq!(args.meta.len(), 2);
                assert_eq!(args.location.as_deref(), Some("/home"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_global_frontend_dir_after_subcommand() {
        let cli = Cli::try_parse_from(["rendr", "status", "--frontend-dir", "web"]).unwrap();
        assert_eq!(cli.frontend_dir, Some(PathBuf::from("web")));
        assert!(matches!(cli.command, Commands::Status));
    }
}
