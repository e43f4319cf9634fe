mod app;
mod theme;

use app::InfinitiveApp;
use eframe::egui;
use infinitive::assistant::CannedResponder;
use infinitive::config::{self, Config};
use infinitive::event;
use infinitive::store::JsonFileStore;
use infinitive::Workspace;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(err) => (Config::default(), Some(err)),
    };
    init_tracing(&config);
    if let Some(err) = config_error {
        warn!(error = %err, "using default configuration");
    }
    info!(
        config = %config::config_path().display(),
        data_dir = %config.data_dir.display(),
        "starting"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("infinitive-runtime")
        .build()?;

    let (tx, rx) = event::channel();
    let store = Arc::new(JsonFileStore::new(config.data_dir.clone()));
    let workspace = Workspace::new(
        runtime.handle().clone(),
        store,
        Arc::new(CannedResponder::default()),
        tx,
        config.save_debounce(),
    );

    let app = InfinitiveApp::new(rx, workspace, runtime.handle().clone(), config);
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1440.0, 860.0])
            .with_min_inner_size([1024.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Infinitive",
        native_options,
        Box::new(move |_creation_context| Ok(Box::new(app))),
    )?;

    Ok(())
}
