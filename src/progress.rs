//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e le statistiche di ottimizzazione.
//!
//! ## Componenti principali:
//! - `ProgressManager`: Progress bar `indicatif` per la modalità batch
//! - `OptimizationStats`: Statistiche cumulative del batch
//!
//! ## Statistiche tracciate:
//! - **files_processed**: Totale file elaborati (ottimizzati + saltati + errori)
//! - **files_optimized**: File ottimizzati con successo
//! - **files_skipped**: File saltati (output già esistente)
//! - **errors**: Numero di errori
//! - **total_original_size** / **total_optimized_size**: Byte prima e dopo
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:12] [=======================>----------------] 42/70 (60%) [OK] hero.png: 81.3% saved
//! ```

use crate::file_manager::FileManager;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Manages progress reporting for batch optimization
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Progress manager that draws nothing (JSON mode, tests)
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// Statistics tracker for optimization results
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OptimizationStats {
    pub files_processed: usize,
    pub files_optimized: usize,
    pub files_skipped: usize,
    pub errors: usize,
    pub total_original_size: u64,
    pub total_optimized_size: u64,
}

impl OptimizationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_optimized(&mut self, original_size: u64, new_size: u64) {
        self.files_processed += 1;
        self.files_optimized += 1;
        self.total_original_size += original_size;
        self.total_optimized_size += new_size;
    }

    pub fn add_skipped(&mut self) {
        self.files_processed += 1;
        self.files_skipped += 1;
    }

    pub fn add_error(&mut self) {
        self.files_processed += 1;
        self.errors += 1;
    }

    /// Bytes saved; negative savings count as zero
    pub fn total_bytes_saved(&self) -> u64 {
        self.total_original_size
            .saturating_sub(self.total_optimized_size)
    }

    pub fn overall_reduction_percent(&self) -> f64 {
        FileManager::calculate_reduction(self.total_original_size, self.total_optimized_size)
    }

    pub fn is_success(&self) -> bool {
        self.errors == 0
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} files | Optimized: {} | Skipped: {} | Errors: {} | {} → {} ({:.1}% saved)",
            self.files_processed,
            self.files_optimized,
            self.files_skipped,
            self.errors,
            FileManager::format_size(self.total_original_size),
            FileManager::format_size(self.total_optimized_size),
            self.overall_reduction_percent()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_accumulate() {
        let mut stats = OptimizationStats::new();
        stats.add_optimized(1000, 250);
        stats.add_optimized(3000, 750);
        stats.add_skipped();
        stats.add_error();

        assert_eq!(stats.files_processed, 4);
        assert_eq!(stats.files_optimized, 2);
        assert_eq!(stats.files_skipped, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.total_original_size, 4000);
        assert_eq!(stats.total_optimized_size, 1000);
        assert_eq!(stats.total_bytes_saved(), 3000);
        assert_eq!(stats.overall_reduction_percent(), 75.0);
        assert!(!stats.is_success());
    }

    #[test]
    fn test_summary_mentions_counts() {
        let mut stats = OptimizationStats::new();
        stats.add_optimized(2048, 1024);
        let summary = stats.format_summary();
        assert!(summary.contains("Processed: 1 files"));
        assert!(summary.contains("2.00 KB → 1.00 KB"));
        assert!(summary.contains("50.0% saved"));
    }

    #[test]
    fn test_growth_is_not_savings() {
        let mut stats = OptimizationStats::new();
        stats.add_optimized(100, 150);
        assert_eq!(stats.total_bytes_saved(), 0);
        assert!(stats.overall_reduction_percent() < 0.0);
    }
}
