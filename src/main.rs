//! Feeling of Computing website CLI: build, watch and serve the site.

mod build;
mod cli;
mod config;
mod logger;
mod page;
mod serve;
mod utils;
mod watch;

use anyhow::{Context, Result};
use build::build_site;
use clap::Parser;
use cli::{Cli, Task, help_text};
use colored::Colorize;
use config::SiteConfig;
use serve::{Reloader, Server};
use std::thread;
use watch::watch_blocking;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let task = match cli.task() {
        Ok(task) => task,
        Err(name) => {
            eprintln!("{}", format!("Unknown task: {name}").red());
            return Ok(());
        }
    };

    if task == Task::Help {
        print!("{}", help_text());
        return Ok(());
    }

    // Watcher threads outlive the server loop until the process exits
    let config: &'static SiteConfig = Box::leak(Box::new(SiteConfig::load(&cli)?));

    match task {
        Task::Build => {
            config.validate()?;
            build_site(config)?;
            Ok(())
        }
        Task::Watch => {
            config.validate()?;
            watch_site(config, None)
        }
        Task::Serve => serve_site(config, false),
        Task::Start => {
            if let Err(err) = config.validate().and_then(|()| build_site(config)) {
                log!("build"; "{err:#}");
            }
            serve_site(config, config.serve.watch)
        }
        Task::Help => Ok(()),
    }
}

/// Rebuild on every settled change, reloading connected pages after each
/// successful build.
fn watch_site(config: &SiteConfig, reloader: Option<Reloader>) -> Result<()> {
    watch_blocking(&config.watched_paths(), config.watch.interval(), |_| {
        rebuild_and_reload(config, reloader.as_ref());
    })
}

/// One watcher step. Pages are reloaded only when the build succeeded;
/// a failed build is logged and leaves them on the previous output.
fn rebuild_and_reload(config: &SiteConfig, reloader: Option<&Reloader>) -> bool {
    match build_site(config) {
        Ok(_) => {
            if let Some(reloader) = reloader {
                reloader.reload();
            }
            true
        }
        Err(err) => {
            log!("watch"; "build failed: {err:#}");
            false
        }
    }
}

/// Serve the output directory until Ctrl+C, optionally with the watcher.
fn serve_site(config: &'static SiteConfig, watch: bool) -> Result<()> {
    let server = Server::start(&config.build.output, &config.serve)?;

    let shutdown = server.shutdown_handle();
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        shutdown.shutdown();
    })
    .context("Failed to set Ctrl+C handler")?;

    if watch {
        let reloader = server.reloader();
        thread::spawn(move || {
            if let Err(err) = watch_site(config, Some(reloader)) {
                log!("watch"; "{err:#}");
            }
        });
    }

    server.run();
    Ok(())
}
