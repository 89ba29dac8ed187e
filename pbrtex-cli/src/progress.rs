//! Terminal progress bars, one per output stage.

use std::sync::{Arc, Mutex};

use indicatif::{ProgressBar, ProgressStyle};
use pbrtex::{Progress, ProgressCallback, TextureRole};

const TEMPLATE: &str = "{msg:>16} [{bar:40.cyan/blue}] {pos}/{len} images";

/// Shows a bar for the stage currently being encoded.
///
/// A progress event for a different stage finishes the current bar and
/// starts a new one.
#[derive(Default)]
pub struct StageProgress {
    current: Mutex<Option<(TextureRole, ProgressBar)>>,
}

impl StageProgress {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Callback to hand to `CompilerSettings::with_progress`.
    pub fn callback(self: &Arc<Self>) -> ProgressCallback {
        let this = Arc::clone(self);
        Box::new(move |progress: &Progress| this.update(progress))
    }

    fn update(&self, progress: &Progress) {
        let Ok(mut current) = self.current.lock() else {
            return;
        };

        let same_stage = matches!(&*current, Some((role, _)) if *role == progress.stage);
        if !same_stage {
            if let Some((_, bar)) = current.take() {
                bar.finish();
            }
            *current = Some((progress.stage, new_bar(progress)));
        }

        if let Some((_, bar)) = current.as_ref() {
            bar.set_position(progress.completed as u64);
            if progress.is_complete() {
                bar.finish();
            }
        }
    }

    /// Finish any bar still on screen.
    pub fn finish(&self) {
        if let Ok(mut current) = self.current.lock() {
            if let Some((_, bar)) = current.take() {
                bar.finish();
            }
        }
    }
}

fn new_bar(progress: &Progress) -> ProgressBar {
    let bar = ProgressBar::new(progress.total as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    bar.set_message(progress.stage.name());
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(progress: &StageProgress) -> Option<(TextureRole, u64)> {
        let current = progress.current.lock().unwrap();
        current.as_ref().map(|(role, bar)| (*role, bar.position()))
    }

    #[test]
    fn test_bar_follows_stage() {
        let progress = StageProgress::new();
        let callback = progress.callback();

        callback(&Progress::new(TextureRole::Environment, 1, 18));
        assert_eq!(position(&progress), Some((TextureRole::Environment, 1)));

        callback(&Progress::new(TextureRole::Environment, 5, 18));
        assert_eq!(position(&progress), Some((TextureRole::Environment, 5)));

        callback(&Progress::new(TextureRole::Irradiance, 1, 6));
        assert_eq!(position(&progress), Some((TextureRole::Irradiance, 1)));

        progress.finish();
        assert_eq!(position(&progress), None);
    }
}
