use std::{path::Path, process, sync::Arc};

use mailcraft::{
    application::{
        error::AppError,
        ports::LayoutSource,
        render::{RenderService, Substitutions},
    },
    config,
    domain::sections::SectionConfig,
    infra::{
        config_sink::LoggingConfigSink,
        error::InfraError,
        http::{self, EditorState},
        layout::FileLayoutSource,
        telemetry,
        uploads::UploadStorage,
    },
};
use serde::Deserialize;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Render(args) => run_render(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let upload_storage = Arc::new(
        UploadStorage::new(settings.uploads.directory.clone())
            .map_err(|err| AppError::from(InfraError::Io(err)))?,
    );
    let upload_limit_bytes = usize::try_from(settings.uploads.max_request_bytes.get())
        .map_err(|_| InfraError::configuration("upload limit exceeds usize"))?;

    let state = EditorState {
        layouts: Arc::new(FileLayoutSource::new(settings.layout.path.clone())),
        sink: Arc::new(LoggingConfigSink::new()),
        renderer: Arc::new(RenderService::new()),
        upload_storage,
        upload_limit_bytes,
    };
    let router = http::build_router(state, settings.server.cors_origin.clone());

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "mailcraft::serve",
        addr = %settings.server.addr,
        cors_origin = settings.server.cors_origin.header_value(),
        layout = %settings.layout.path.display(),
        uploads = %settings.uploads.directory.display(),
        "Server running"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(target = "mailcraft::serve", "Shutting down");
}

/// Accepts both a bare section array and the body sent to `/uploadEmailConfig`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ConfigFile {
    Sections(SectionConfig),
    Saved { sections: SectionConfig },
}

impl From<ConfigFile> for SectionConfig {
    fn from(file: ConfigFile) -> Self {
        match file {
            ConfigFile::Sections(sections) | ConfigFile::Saved { sections } => sections,
        }
    }
}

async fn run_render(settings: config::Settings, args: config::RenderArgs) -> Result<(), AppError> {
    let sections = read_config_file(&args.config).await?;
    let layout = FileLayoutSource::new(settings.layout.path.clone())
        .load_layout()
        .await?;

    let substitutions = Substitutions::from(&sections);
    let rendered = RenderService::new().render(Some(&layout), Some(&substitutions))?;

    tokio::fs::write(&args.output, rendered.as_bytes())
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "mailcraft::render",
        layout = %settings.layout.path.display(),
        sections = sections.len(),
        output = %args.output.display(),
        bytes = rendered.len(),
        "Rendered email template"
    );
    Ok(())
}

async fn read_config_file(path: &Path) -> Result<SectionConfig, AppError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let file: ConfigFile = serde_json::from_str(&raw).map_err(|err| {
        AppError::validation(format!(
            "`{}` is not a section configuration: {err}",
            path.display()
        ))
    })?;
    Ok(file.into())
}
