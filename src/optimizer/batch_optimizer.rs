//! # Batch Optimizer Main Orchestrator
//!
//! Orchestratore principale: modalità file singolo e modalità directory.
//!
//! ## Flusso di esecuzione (directory):
//! 1. **Discovery**: trova le immagini supportate (solo primo livello o ricorsivo)
//! 2. **Dependency check**: se ci sono SVG serve un rasterizzatore, altrimenti errore fatale
//! 3. **Parallel processing**: un task per file, limitati da un semaforo di `workers` permessi
//! 4. **Statistics**: errori loggati e contati, il batch continua
//! 5. **Reporting**: riepilogo finale con byte prima/dopo e riduzione percentuale

use crate::{
    config::Config,
    error::OptimizeError,
    file_manager::FileManager,
    image_processor::ImageProcessor,
    json_output::{JsonConfig, JsonMessage},
    optimizer::{
        path_resolver::PathResolver,
        progress_tracker::ProgressTracker,
        task_optimizer::{FileOutcome, TaskOptimizer},
    },
    progress::OptimizationStats,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// Orchestratore principale
pub struct BatchOptimizer {
    config: Config,
    task_optimizer: TaskOptimizer,
    supports_vector: bool,
}

impl BatchOptimizer {
    /// Crea nuova istanza dell'ottimizzatore
    pub fn new(config: Config, processor: ImageProcessor) -> Result<Self> {
        config.validate()?;
        let request = config.request()?;
        let supports_vector = processor.supports_vector();
        let task_optimizer = TaskOptimizer::new(config.clone(), request, processor);

        Ok(Self {
            config,
            task_optimizer,
            supports_vector,
        })
    }

    /// Ottimizza un singolo file. Qualunque errore è fatale.
    pub async fn run_single(&self, input_path: &Path, output_path: &Path) -> Result<FileOutcome> {
        if !input_path.is_file() {
            return Err(OptimizeError::InputNotFound(input_path.to_path_buf()).into());
        }

        let output_path = PathResolver::get_single_output_path(output_path, &self.config);
        if !self.config.json_output {
            info!("Optimizing: {}", input_path.display());
            info!(
                "Target: {}px wide, {}% quality {}",
                self.config.max_width,
                self.config.quality,
                self.config.output_format.name()
            );
        }

        let result = self
            .task_optimizer
            .process_single_file(input_path, &output_path)
            .await;

        if self.config.json_output {
            let tracker = ProgressTracker::new(1, true);
            tracker.handle_file_completion(input_path, &result).await;
        }

        let outcome = result.with_context(|| format!("Failed to optimize {}", input_path.display()))?;
        if !self.config.json_output && !self.config.dry_run {
            info!("Success! Saved to: {}", outcome.output_path.display());
        }
        Ok(outcome)
    }

    /// Ottimizza tutte le immagini supportate di una directory
    pub async fn run_directory(&self, input_dir: &Path, output_dir: &Path) -> Result<OptimizationStats> {
        let start_time = std::time::Instant::now();

        if !input_dir.is_dir() {
            return Err(OptimizeError::InputNotFound(input_dir.to_path_buf()).into());
        }

        let files = FileManager::find_image_files(input_dir, self.config.recursive)?;
        self.emit_start_message(input_dir, output_dir, &files);
        self.check_dependencies(&files)?;

        if files.is_empty() {
            if self.config.json_output {
                JsonMessage::complete(&OptimizationStats::new(), start_time.elapsed().as_secs_f64()).emit();
            } else {
                warn!("No supported images found in {}", input_dir.display());
            }
            return Ok(OptimizationStats::new());
        }

        if !self.config.dry_run {
            tokio::fs::create_dir_all(output_dir)
                .await
                .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;
        }

        let progress_tracker = ProgressTracker::new(files.len(), self.config.json_output);
        let stats = self
            .process_files_concurrently(input_dir, output_dir, files, progress_tracker.clone())
            .await?;

        progress_tracker.finish(&stats.format_summary());
        self.print_final_stats(&stats, start_time.elapsed().as_secs_f64());

        Ok(stats)
    }

    /// Invia messaggio di inizio
    fn emit_start_message(&self, input_dir: &Path, output_dir: &Path, files: &[PathBuf]) {
        if self.config.json_output {
            JsonMessage::Start {
                input: input_dir.to_path_buf(),
                output: output_dir.to_path_buf(),
                total_files: files.len(),
                config: JsonConfig::from(&self.config),
            }
            .emit();
            return;
        }

        info!("Input:  {}", input_dir.display());
        info!("Output: {}", output_dir.display());
        info!(
            "Target: {}px wide, {}% quality {} ({:?} resampling)",
            self.config.max_width,
            self.config.quality,
            self.config.output_format.name(),
            self.config.resize_algorithm
        );
        if self.config.dry_run {
            info!("Dry run mode: No files will be written");
        }
        if self.config.skip_existing {
            info!("Skip mode: Will skip files where output already exists");
        }
        info!("Found {} images to optimize", files.len());
    }

    /// Controlla che le capacità richieste dai file siano disponibili
    fn check_dependencies(&self, files: &[PathBuf]) -> Result<()> {
        if self.supports_vector {
            return Ok(());
        }

        let vectors: Vec<_> = files.iter().filter(|f| FileManager::is_vector(f)).collect();
        if let Some(first) = vectors.first() {
            error!(
                "{} SVG file(s) found (e.g. {}) but vector rasterization is not available",
                vectors.len(),
                first.display()
            );
            return Err(OptimizeError::VectorRasterizationUnavailable.into());
        }
        Ok(())
    }

    /// Processa i file in parallelo con un numero limitato di worker
    async fn process_files_concurrently(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        files: Vec<PathBuf>,
        progress_tracker: ProgressTracker,
    ) -> Result<OptimizationStats> {
        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        let mut tasks = Vec::with_capacity(files.len());

        let output_paths =
            PathResolver::get_batch_output_paths(&files, input_dir, output_dir, &self.config);

        for (file_path, output_path) in files.into_iter().zip(output_paths) {
            let permit = semaphore.clone().acquire_owned().await?;
            let task_optimizer = self.task_optimizer.clone();
            let progress = progress_tracker.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = permit;
                let result = task_optimizer
                    .process_single_file(&file_path, &output_path)
                    .await;
                progress.handle_file_completion(&file_path, &result).await;
            }));
        }

        for task in tasks {
            if let Err(e) = task.await {
                error!("Optimization task panicked: {}", e);
            }
        }

        let mut stats = progress_tracker.get_stats().await;
        // a panicked task never reported back
        let unreported = progress_tracker.total_files.saturating_sub(stats.files_processed);
        for _ in 0..unreported {
            stats.add_error();
        }
        Ok(stats)
    }

    /// Stampa statistiche finali
    fn print_final_stats(&self, stats: &OptimizationStats, duration: f64) {
        if self.config.json_output {
            JsonMessage::complete(stats, duration).emit();
            return;
        }

        info!("=== Optimization Complete ===");
        info!("Processed: {}/{} images", stats.files_optimized, stats.files_processed);
        info!("Skipped: {}", stats.files_skipped);
        info!("Errors: {}", stats.errors);
        info!("Total original size: {}", FileManager::format_size(stats.total_original_size));
        info!("Total optimized size: {}", FileManager::format_size(stats.total_optimized_size));
        info!(
            "Total savings: {} ({:.1}%)",
            FileManager::format_size(stats.total_bytes_saved()),
            stats.overall_reduction_percent()
        );
        info!("Duration: {:.2}s", duration);
    }
}
