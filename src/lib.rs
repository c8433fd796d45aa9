mod client;
mod error;
mod history;
mod models;
mod pipeline;
mod presenter;
mod progress;
mod settings;
mod storage;

use std::sync::Arc;

use log::info;
use tauri::{Emitter, Manager, State};

use client::HttpRecognitionClient;
use history::HistoryStore;
use pipeline::{
    commands::{
        clear_history, export_result, get_history, get_masked_image, get_pipeline_state,
        present_current_result, recognize_document, select_history_entry,
    },
    PipelineController, ProgressListener, ProgressUpdate,
};
use settings::{ApiSettings, SettingsStore};
use storage::FileKvStore;

pub(crate) struct AppState {
    pub(crate) pipeline: PipelineController,
    pub(crate) history: Arc<HistoryStore>,
    pub(crate) client: Arc<HttpRecognitionClient>,
    pub(crate) settings: Arc<SettingsStore>,
}

#[tauri::command]
fn get_api_settings(state: State<AppState>) -> Result<ApiSettings, String> {
    Ok(state.settings.api())
}

#[tauri::command]
fn set_api_settings(
    settings: ApiSettings,
    state: State<AppState>,
    app_handle: tauri::AppHandle,
) -> Result<(), String> {
    state
        .settings
        .update_api(settings.clone())
        .map_err(|e| e.to_string())?;

    app_handle
        .emit("api-settings-updated", &settings)
        .map_err(|e| e.to_string())?;

    Ok(())
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("DocuScan starting up...");

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;
                std::fs::create_dir_all(&app_data_dir)?;

                let store = Arc::new(FileKvStore::new(app_data_dir.join("storage"))?);
                let history = Arc::new(HistoryStore::load(store));

                let settings = Arc::new(SettingsStore::new(app_data_dir.join("settings.json"))?);
                let client = Arc::new(HttpRecognitionClient::new(settings.clone()));

                let progress_handle = app.handle().clone();
                let on_progress: ProgressListener = Arc::new(move |update: ProgressUpdate| {
                    let _ = progress_handle.emit("recognition-progress", &update);
                });

                let pipeline =
                    PipelineController::new(client.clone(), history.clone(), on_progress);

                app.manage(AppState {
                    pipeline,
                    history,
                    client,
                    settings,
                });

                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .invoke_handler(tauri::generate_handler![
            recognize_document,
            get_pipeline_state,
            get_history,
            clear_history,
            select_history_entry,
            present_current_result,
            export_result,
            get_masked_image,
            get_api_settings,
            set_api_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
