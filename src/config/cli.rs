use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the mailcraft binary.
#[derive(Debug, Parser)]
#[command(name = "mailcraft", version, about = "Email template editor backend")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "MAILCRAFT_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the editor HTTP service.
    Serve(Box<ServeArgs>),
    /// Render a layout with a saved section configuration into an HTML file.
    Render(RenderArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct LayoutOverride {
    /// Override the layout template path.
    #[arg(long = "layout-path", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub layout_path: Option<PathBuf>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub layout: LayoutOverride,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the origin allowed to call the API from a browser (`*` for any).
    #[arg(long = "server-cors-origin", value_name = "ORIGIN")]
    pub cors_origin: Option<String>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the uploads directory.
    #[arg(long = "uploads-directory", value_name = "PATH")]
    pub uploads_directory: Option<PathBuf>,

    /// Override the maximum request size for uploads in bytes.
    #[arg(long = "uploads-max-request-bytes", value_name = "BYTES")]
    pub uploads_max_request_bytes: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub layout: LayoutOverride,

    /// JSON file holding the sections, either a bare array or `{ "sections": [...] }`.
    #[arg(long = "config", value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub config: PathBuf,

    /// Where to write the rendered document.
    #[arg(
        long = "output",
        value_name = "FILE",
        value_hint = ValueHint::FilePath,
        default_value = "email-template.html"
    )]
    pub output: PathBuf,
}
