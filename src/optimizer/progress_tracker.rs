//! # Progress Tracking Module
//!
//! Tracker thread-safe condiviso dai worker del batch.
//! Gestisce sia output JSON che progress bar tradizionale.

use crate::{
    error::OptimizeError,
    json_output::JsonMessage,
    optimizer::task_optimizer::FileOutcome,
    progress::{OptimizationStats, ProgressManager},
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::error;

/// Tracker progress unificato
#[derive(Clone)]
pub struct ProgressTracker {
    pub total_files: usize,
    stats: Arc<Mutex<OptimizationStats>>,
    progress_manager: ProgressManager,
    json_output: bool,
}

impl ProgressTracker {
    /// Crea un nuovo tracker
    pub fn new(total_files: usize, json_output: bool) -> Self {
        let progress_manager = if json_output {
            ProgressManager::hidden()
        } else {
            ProgressManager::new(total_files as u64)
        };

        Self {
            total_files,
            stats: Arc::new(Mutex::new(OptimizationStats::new())),
            progress_manager,
            json_output,
        }
    }

    /// Registra il completamento di un file ed emette gli eventi
    pub async fn handle_file_completion(
        &self,
        file_path: &Path,
        result: &Result<FileOutcome, OptimizeError>,
    ) {
        let file_name = file_path.file_name().unwrap_or_default().to_string_lossy();

        match result {
            Ok(outcome) if outcome.skipped => {
                self.stats.lock().await.add_skipped();
                if self.json_output {
                    file_complete_message(file_path, Some(outcome), None).emit();
                }
                self.progress_manager
                    .update(&format!("[SKIP] {}: output exists", file_name));
            }
            Ok(outcome) => {
                self.stats
                    .lock()
                    .await
                    .add_optimized(outcome.original_size, outcome.optimized_size);
                if self.json_output {
                    file_complete_message(file_path, Some(outcome), None).emit();
                }
                self.progress_manager.update(&format!(
                    "[OK] {}: {:.1}% saved",
                    file_name,
                    outcome.reduction_percent()
                ));
            }
            Err(e) => {
                self.stats.lock().await.add_error();
                error!("[!] {}: {}", file_path.display(), e);
                if self.json_output {
                    file_complete_message(file_path, None, Some(e.to_string())).emit();
                }
                self.progress_manager
                    .update(&format!("[ERROR] {}: error", file_name));
            }
        }
    }

    /// Finalizza progress bar
    pub fn finish(&self, summary: &str) {
        self.progress_manager.finish(summary);
    }

    /// Ottieni statistiche per report finale
    pub async fn get_stats(&self) -> OptimizationStats {
        self.stats.lock().await.clone()
    }
}

fn file_complete_message(
    file_path: &Path,
    outcome: Option<&FileOutcome>,
    error: Option<String>,
) -> JsonMessage {
    JsonMessage::FileComplete {
        path: file_path.to_path_buf(),
        output_path: outcome.map(|o| o.output_path.clone()),
        original_size: outcome.map(|o| o.original_size).unwrap_or(0),
        optimized_size: outcome.map(|o| o.optimized_size).unwrap_or(0),
        width: outcome.and_then(|o| o.final_dimensions).map(|(w, _)| w),
        height: outcome.and_then(|o| o.final_dimensions).map(|(_, h)| h),
        reduction_percent: outcome.map(|o| o.reduction_percent()).unwrap_or(0.0),
        skipped: outcome.map(|o| o.skipped).unwrap_or(false),
        error,
    }
}
