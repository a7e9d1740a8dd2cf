use anyhow::{Context, Result};
use axum::{Extension, Json, Router, routing::post};
use clap::{
    Arg, ArgAction, ColorChoice, Command,
    builder::{
        ValueParser,
        styling::{AnsiColor, Effects, Styles},
    },
};
use s3form::{FormValues, Settings, Wrapper};
use std::{fs, net::SocketAddr, path::PathBuf, sync::Arc};
use tokio_util::sync::CancellationToken;

fn validator_is_file() -> ValueParser {
    ValueParser::from(move |s: &str| -> std::result::Result<PathBuf, String> {
        match fs::metadata(s) {
            Ok(metadata) if metadata.is_file() => Ok(PathBuf::from(s)),
            _ => Err(format!("Invalid file path or file does not exist: '{s}'")),
        }
    })
}

fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("s3form")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("config")
                .help("YAML configuration file")
                .long("config")
                .short('c')
                .env("S3FORM_CONFIG")
                .required(true)
                .num_args(1)
                .value_parser(validator_is_file())
                .value_name("config.yml"),
        )
        .arg(
            Arg::new("listen")
                .help("Address to listen on")
                .long("listen")
                .short('l')
                .env("S3FORM_LISTEN")
                .default_value("127.0.0.1:8080")
                .num_args(1)
                .value_parser(clap::value_parser!(SocketAddr)),
        )
        .arg(
            Arg::new("verbose")
                .help("Verbosity level")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count),
        )
}

async fn upload(form: FormValues) -> Json<FormValues> {
    Json(form)
}

// cancel in-flight uploads, then let axum drain the connections
async fn shutdown(token: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("unable to listen for shutdown signal: {e}");
    }

    log::info!("shutting down");

    token.cancel();
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = new().get_matches();

    let verbosity_level = match matches.get_one::<u8>("verbose").copied().unwrap_or(0) {
        0 => log::LevelFilter::Off,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };

    env_logger::Builder::new()
        .filter_level(verbosity_level)
        .init();

    let config_path = matches
        .get_one::<PathBuf>("config")
        .context("missing --config")?;

    log::info!("config path: {}", config_path.display());

    let config = Settings::new(config_path)?.into_config();

    let wrapper = Arc::new(Wrapper::new(config).await?);

    let token = CancellationToken::new();

    let app = wrapper
        .wrap(Router::new().route("/upload", post(upload)))
        .layer(Extension(token.clone()));

    let addr = matches
        .get_one::<SocketAddr>("listen")
        .copied()
        .context("missing --listen")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("unable to listen on {addr}"))?;

    log::info!("listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown(token))
        .await
        .context("server error")?;

    Ok(())
}
