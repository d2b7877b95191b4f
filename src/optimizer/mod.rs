//! # Optimizer Module
//!
//! Modulo che separa le responsabilità del driver batch in sottomoduli:
//! - `batch_optimizer`: Orchestratore principale (file singolo / directory)
//! - `task_optimizer`: Worker per singoli file
//! - `progress_tracker`: Gestione progress unificata
//! - `path_resolver`: Logica di calcolo path centralizzata

pub mod batch_optimizer;
pub mod task_optimizer;
pub mod progress_tracker;
pub mod path_resolver;

pub use batch_optimizer::BatchOptimizer;
pub use task_optimizer::{FileOutcome, TaskOptimizer};
pub use progress_tracker::ProgressTracker;
pub use path_resolver::PathResolver;
