//! Progress callbacks for long-running loads and validation runs. The CLI
//! hooks these up to progress bars; everything else ignores them.

pub trait ProgressHandler: Send + Sync {
    fn set_total_files(&self, _count: usize) {}
    fn on_start_file_load(&self, _file: &str) {}
    fn on_finish_file_load(&self, _file: &str) {}
    fn set_total_validators(&self, _count: usize) {}
    fn on_start_validator(&self, _validator_name: &str) {}
    fn on_finish_validator(&self, _validator_name: &str) {}
}

/// Handler that ignores every event.
#[derive(Debug, Default)]
pub struct SilentProgress;

impl ProgressHandler for SilentProgress {}
