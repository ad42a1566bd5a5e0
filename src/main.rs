//! CLI entry point for geowatch.

use std::io;

use clap::{CommandFactory, Parser};
use color_eyre::eyre::{Result, WrapErr};
use tracing::{info, warn};

use geowatch::cli::Cli;
use geowatch::config::GeowatchConfig;
use geowatch::debugger::SessionDebugger;
use geowatch::drawing::{DrawFailure, VertexPlotter};
use geowatch::logging::init_logging;
use geowatch::panel::{Panel, PanelUpdate, Trigger};
use geowatch::raster::{ImageSink, PpmFileSink};
use geowatch::render::RenderOutcome;
use geowatch::report::WatchReport;
use geowatch::selection::selection_rect;
use geowatch::tui;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "geowatch", &mut io::stdout());
        return Ok(());
    }

    let config = GeowatchConfig::layered(cli.config.as_deref(), &cli.to_config_overrides())
        .wrap_err("Failed to load configuration")?;

    if let Some(path) = &cli.save_config {
        config
            .save(path)
            .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
        eprintln!("Wrote configuration to {}", path.display());
    }

    let _guard = init_logging(
        config.logging.file.as_deref(),
        Some(config.logging.level.as_str()),
    );
    info!(version = env!("CARGO_PKG_VERSION"), "geowatch starting");

    if cli.interactive {
        return tui::run(&config, &cli.watch);
    }

    render_once(&cli, &config)
}

/// Keep the failures of the most recent render pass.
fn track_failures(update: PanelUpdate, failures: &mut Vec<DrawFailure>) {
    match update.render {
        Some(RenderOutcome::Drawn { failures: f, .. }) => *failures = f,
        Some(RenderOutcome::Placeholder) => failures.clear(),
        Some(RenderOutcome::Deferred) | None => {}
    }
}

/// Commit the watches, apply zooms, print the report and write the image.
fn render_once(cli: &Cli, config: &GeowatchConfig) -> Result<()> {
    let theme = config.resolve_theme().wrap_err("Failed to build theme")?;
    let debugger = match &config.session.path {
        Some(path) => SessionDebugger::load(path)
            .wrap_err_with(|| format!("Failed to load session {}", path.display()))?,
        None => {
            warn!("No session given; every expression will be unresolved");
            SessionDebugger::default()
        }
    };

    let mut panel = Panel::new(
        debugger,
        VertexPlotter::new(),
        theme,
        config.panel_settings(),
    );
    let mut failures = Vec::new();

    track_failures(panel.handle(Trigger::EnterBreak)?, &mut failures);
    track_failures(
        panel.handle(Trigger::Resize {
            width: config.display.width,
            height: config.display.height,
        })?,
        &mut failures,
    );

    for text in &cli.watch {
        let index = panel.rows().len() - 1;
        let update = panel.handle(Trigger::RowCommitted {
            index,
            text: text.clone(),
        })?;
        track_failures(update, &mut failures);
    }

    let display = panel.display();
    for selection in &cli.zoom {
        let update = panel.handle(Trigger::Zoom {
            selection: *selection,
            display,
        })?;
        track_failures(update, &mut failures);
    }
    for drag in &cli.drag {
        match selection_rect(drag.origin, drag.pointer, display) {
            Some(selection) => {
                let update = panel.handle(Trigger::Zoom { selection, display })?;
                track_failures(update, &mut failures);
            }
            None => eprintln!(
                "Ignoring drag from ({}, {}) to ({}, {}): empty selection",
                drag.origin.x, drag.origin.y, drag.pointer.x, drag.pointer.y
            ),
        }
    }

    let report = WatchReport::new(&panel, failures);
    print!(
        "{}",
        report
            .render(cli.format)
            .wrap_err("Failed to format report")?
    );

    if let Some(path) = &cli.output {
        PpmFileSink::new(path)
            .copy_image(panel.image())
            .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
        eprintln!("Wrote image to {}", path.display());
    }

    Ok(())
}
