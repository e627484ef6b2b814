//! Progress reporting for sequential execution

use indicatif::{ProgressBar, ProgressStyle};

/// Receives one step per completed chunk
pub trait Progress {
    /// `None` means the number of chunks is not known in advance
    fn start(&mut self, total: Option<u64>);
    fn step(&mut self);
    fn finish(&mut self);
}

/// Reports nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Progress for Silent {
    fn start(&mut self, _total: Option<u64>) {}
    fn step(&mut self) {}
    fn finish(&mut self) {}
}

/// Progress bar on stderr
#[derive(Default)]
pub struct Bar {
    bar: Option<ProgressBar>,
}

impl Bar {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Progress for Bar {
    fn start(&mut self, total: Option<u64>) {
        let bar = match total {
            Some(len) => {
                let bar = ProgressBar::new(len);
                bar.set_style(
                    ProgressStyle::default_bar()
                        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("█▓▒░ "),
                );
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.green} [{elapsed_precise}] {pos} chunks")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                bar
            }
        };
        self.bar = Some(bar);
    }

    fn step(&mut self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

/// Progress reporter for the configured toggle
pub fn reporter(enabled: bool) -> Box<dyn Progress> {
    if enabled {
        Box::new(Bar::new())
    } else {
        Box::new(Silent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_counts_steps() {
        let mut bar = Bar::new();
        bar.start(Some(3));
        bar.step();
        bar.step();
        assert_eq!(bar.bar.as_ref().map(|b| b.position()), Some(2));
        bar.finish();
        assert!(bar.bar.is_none());
    }

    #[test]
    fn silent_accepts_everything() {
        let mut p = reporter(false);
        p.start(None);
        p.step();
        p.finish();
    }
}
