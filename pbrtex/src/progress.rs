//! Progress reporting for long-running stages.

use crate::material::TextureRole;

/// Progress of one output stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// The output being encoded.
    pub stage: TextureRole,
    /// Images encoded so far.
    pub completed: usize,
    /// Images the stage will encode.
    pub total: usize,
}

impl Progress {
    pub fn new(stage: TextureRole, completed: usize, total: usize) -> Self {
        Self {
            stage,
            completed,
            total,
        }
    }

    /// Completion in percent, 100 for an empty stage.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.completed as f64 * 100.0 / self.total as f64
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

/// Callback invoked after every encoded image.
pub type ProgressCallback = Box<dyn Fn(&Progress) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        let progress = Progress::new(TextureRole::Prefilter, 3, 12);
        assert_eq!(progress.percent(), 25.0);
        assert!(!progress.is_complete());
    }

    #[test]
    fn test_empty_stage_is_complete() {
        let progress = Progress::new(TextureRole::Irradiance, 0, 0);
        assert_eq!(progress.percent(), 100.0);
        assert!(progress.is_complete());
    }
}
