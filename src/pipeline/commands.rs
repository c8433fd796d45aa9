use std::path::Path;

use base64::Engine;
use tauri::State;

use crate::{
    models::ResultRecord,
    pipeline::{PipelineController, PipelineSnapshot},
    presenter::{present, PresentedField},
    AppState,
};

fn controller_from_state(state: &State<'_, AppState>) -> PipelineController {
    state.pipeline.clone()
}

#[tauri::command]
pub async fn recognize_document(
    state: State<'_, AppState>,
    path: String,
) -> Result<ResultRecord, String> {
    let controller = controller_from_state(&state);

    let file_name = Path::new(&path)
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| format!("Invalid file path: {path}"))?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|err| format!("Failed to read {path}: {err}"))?;

    controller
        .handle_upload(&file_name, bytes)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_pipeline_state(state: State<'_, AppState>) -> Result<PipelineSnapshot, String> {
    let controller = controller_from_state(&state);
    Ok(controller.snapshot().await)
}

#[tauri::command]
pub async fn get_history(state: State<'_, AppState>) -> Result<Vec<ResultRecord>, String> {
    Ok(state.history.list())
}

#[tauri::command]
pub async fn clear_history(state: State<'_, AppState>) -> Result<(), String> {
    state.history.clear().map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn select_history_entry(
    state: State<'_, AppState>,
    index: usize,
) -> Result<ResultRecord, String> {
    let record = state
        .history
        .list()
        .get(index)
        .cloned()
        .ok_or_else(|| format!("No history entry at index {index}"))?;

    let controller = controller_from_state(&state);
    controller.select_result(record.clone()).await;
    Ok(record)
}

#[tauri::command]
pub async fn present_current_result(
    state: State<'_, AppState>,
) -> Result<Vec<PresentedField>, String> {
    let controller = controller_from_state(&state);
    let record = controller
        .current_result()
        .await
        .ok_or_else(|| "No result to present".to_string())?;
    Ok(present(&record))
}

/// Writes the currently displayed result to `{directory}/result_{epoch-millis}.json`
/// and returns the full path.
#[tauri::command]
pub async fn export_result(
    state: State<'_, AppState>,
    directory: String,
) -> Result<String, String> {
    let controller = controller_from_state(&state);
    let record = controller
        .current_result()
        .await
        .ok_or_else(|| "No result to export".to_string())?;

    let serialized = serde_json::to_string_pretty(&record).map_err(|e| e.to_string())?;
    let file_name = format!("result_{}.json", chrono::Utc::now().timestamp_millis());
    let path = Path::new(&directory).join(file_name);
    tokio::fs::write(&path, serialized)
        .await
        .map_err(|err| format!("Failed to write {}: {err}", path.display()))?;

    Ok(path.display().to_string())
}

/// Fetches the privacy-masked rendition of the source image, base64-encoded
/// for direct rendering in the frontend.
#[tauri::command]
pub async fn get_masked_image(
    state: State<'_, AppState>,
    masked_ref: String,
) -> Result<String, String> {
    let bytes = state
        .client
        .fetch_masked_image(&masked_ref)
        .await
        .map_err(|e| e.to_string())?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}
