//! Background model loading
//!
//! Loads run on a spawned thread so large meshes do not stall the UI. Each
//! request bumps a generation counter; completions carrying an older
//! generation are stale (the user asked for something newer mid-load) and
//! are logged and dropped.

use std::sync::mpsc::{Receiver, Sender, channel};

use viewer_core::{LoadError, LoadOptions, RobotModel, load_robot};

/// A finished load, tagged with the generation that requested it
struct LoadOutcome {
    generation: u64,
    source: String,
    result: Result<RobotModel, LoadError>,
}

/// A completed, current-generation load
pub struct LoadResult {
    pub source: String,
    pub result: Result<RobotModel, LoadError>,
}

/// Asynchronous model loader with stale-result rejection
pub struct ModelLoader {
    tx: Sender<LoadOutcome>,
    rx: Receiver<LoadOutcome>,
    generation: u64,
    loading: bool,
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelLoader {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self {
            tx,
            rx,
            generation: 0,
            loading: false,
        }
    }

    /// True while the most recent request has not completed
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Start loading the given path or URL, superseding any load in flight
    pub fn request(&mut self, source: String, options: LoadOptions) {
        self.generation += 1;
        self.loading = true;
        let generation = self.generation;
        let tx = self.tx.clone();

        tracing::info!("Loading model from {source}");
        std::thread::spawn(move || {
            let result = load_robot(&source, &options);
            // The receiver only goes away on shutdown
            let _ = tx.send(LoadOutcome {
                generation,
                source,
                result,
            });
        });
    }

    /// Collect the finished load for the current generation, if any
    pub fn poll(&mut self) -> Option<LoadResult> {
        while let Ok(outcome) = self.rx.try_recv() {
            if let Some(result) = self.accept(outcome) {
                return Some(result);
            }
        }
        None
    }

    fn accept(&mut self, outcome: LoadOutcome) -> Option<LoadResult> {
        if outcome.generation != self.generation {
            tracing::debug!(
                "Discarding stale load of '{}' (generation {} < {})",
                outcome.source,
                outcome.generation,
                self.generation
            );
            return None;
        }
        self.loading = false;
        Some(LoadResult {
            source: outcome.source,
            result: outcome.result,
        })
    }
}
