mod cli;
mod commands;
mod context;
mod error;
mod output;
mod progress;

use clap::{CommandFactory, Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use vcloud_config::{ProfileStore, Settings, default_profiles_path};

use crate::cli::{Cli, ColorMode, Command, GlobalOpts, OutputFormat};
use crate::context::CommandContext;
use crate::error::CliError;
use crate::output::Renderer;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Completions need neither a profile store nor settings
    if let Command::Completions(args) = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(args.shell, &mut cmd, "vcd", &mut std::io::stdout());
        return;
    }

    let store = ProfileStore::load(
        cli.global
            .profiles_file
            .clone()
            .unwrap_or_else(default_profiles_path),
    );

    let debug_profile = cli
        .global
        .profile
        .as_deref()
        .map_or_else(|| store.active_profile(), |name| store.profile(name))
        .is_some_and(|p| p.debug);
    init_tracing(cli.global.verbose, debug_profile);

    if let Some(reason) = store.recovered_from() {
        warn!(path = %store.path().display(), %reason, "profile store unreadable, starting empty");
    }

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(err) => {
            let renderer = fallback_renderer(&cli.global);
            let code = finish(&renderer, err.into());
            std::process::exit(code);
        }
    };

    let renderer = Renderer::new(
        resolve_output(&cli.global, &settings),
        resolve_color(&cli.global, &settings),
        cli.global.quiet,
    );

    let cancel = CancellationToken::new();
    spawn_interrupt_listener(cancel.clone());

    let mut ctx = CommandContext {
        global: cli.global,
        settings,
        store,
        renderer,
        cancel,
    };

    debug!(command = ?cli.command, "dispatching command");
    if let Err(err) = commands::dispatch(cli.command, &mut ctx).await {
        let code = finish(&ctx.renderer, err);
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, profile_debug: bool) {
    let filter = match verbosity {
        0 if profile_debug => "debug",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // Diagnostics go to stderr so stdout stays a clean document
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Trip the shared token on Ctrl-C; in-flight calls and monitors observe it.
fn spawn_interrupt_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received");
            cancel.cancel();
        }
    });
}

fn resolve_output(global: &GlobalOpts, settings: &Settings) -> OutputFormat {
    global.output.unwrap_or_else(|| {
        OutputFormat::from_str(&settings.output, true).unwrap_or_else(|_| {
            warn!(output = %settings.output, "unknown output format in settings, using table");
            OutputFormat::Table
        })
    })
}

fn resolve_color(global: &GlobalOpts, settings: &Settings) -> ColorMode {
    global.color.unwrap_or_else(|| {
        ColorMode::from_str(&settings.color, true).unwrap_or_else(|_| {
            warn!(color = %settings.color, "unknown color mode in settings, using auto");
            ColorMode::Auto
        })
    })
}

/// Renderer for errors raised before settings are available.
fn fallback_renderer(global: &GlobalOpts) -> Renderer {
    Renderer::new(
        global.output.unwrap_or(OutputFormat::Table),
        global.color.unwrap_or(ColorMode::Auto),
        global.quiet,
    )
}

fn finish(renderer: &Renderer, err: CliError) -> i32 {
    let code = err.exit_code();
    renderer.report_error(err);
    code
}
