//! Sharp editor host
//!
//! Loads the managed runtime, watches the script directory and hot reloads
//! the user assembly until Ctrl-C. Type `compile` (or `c`) and Enter to
//! force a rebuild.
//!
//! Run with: cargo run -p sharp_editor -- editor.toml
//!       or: SHARP_EDITOR_CONFIG=editor.toml sharp-editor

use sharp_editor::{EditorConfig, EditorModule};
use sharp_runtime::DylibAssemblyLoader;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = EditorConfig::from_environment();
    config.print_summary();
    let tick_interval = config.hot_reload.tick_interval();

    let editor = EditorModule::from_config(config, DylibAssemblyLoader);
    editor.startup();

    if let Err(e) = editor.runtime().initialize() {
        log::error!("Failed to initialize managed runtime: {}", e);
        std::process::exit(1);
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        shutdown_flag.store(true, Ordering::Relaxed);
    }) {
        log::warn!("Failed to set signal handler: {}", e);
    }

    let compile_requested = Arc::new(AtomicBool::new(false));
    spawn_command_reader(compile_requested.clone());

    while !shutdown.load(Ordering::Relaxed) {
        if compile_requested.swap(false, Ordering::Relaxed) {
            if let Some(outcome) = editor.compile() {
                log::info!("Compile {}", outcome);
            }
        }

        editor.tick();
        std::thread::sleep(tick_interval);
    }

    editor.shutdown();
    editor.runtime().shutdown();
    log::info!("Editor stopped");
}

/// Read console commands on a background thread
fn spawn_command_reader(compile_requested: Arc<AtomicBool>) {
    let spawned = std::thread::Builder::new()
        .name("editor-console".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                match line.trim() {
                    "c" | "compile" => compile_requested.store(true, Ordering::Relaxed),
                    "" => {}
                    other => log::warn!("Unknown command: {}", other),
                }
            }
        });

    if let Err(e) = spawned {
        log::warn!("Console commands unavailable: {}", e);
    }
}
