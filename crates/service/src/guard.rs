use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard};

use annotate::AnalysisEngine;
use anyhow::{Context, Result};
use tracing::{error, info};

/// Builds a fresh engine; called once at startup and on every reload.
pub type EngineLoader<E> = Box<dyn Fn() -> Result<E> + Send + Sync>;

/// Owns the single analysis engine.
///
/// Conversion work takes shared access; replacing the engine takes exclusive
/// access, which waits for every shared holder to release and blocks new ones
/// until the replacement is in place.
pub struct AnalysisGuard<E> {
    engine: RwLock<E>,
    // Readable while a reload holds or waits for the engine lock
    engine_name: Mutex<String>,
    loader: EngineLoader<E>,
    processed: AtomicUsize,
    reloads: AtomicUsize,
    reload_after: Option<usize>,
}

impl<E: AnalysisEngine> AnalysisGuard<E> {
    /// Load the initial engine. `reload_after` enables periodic reloads once
    /// that many documents have been processed.
    pub fn new(loader: EngineLoader<E>, reload_after: Option<usize>) -> Result<Self> {
        let engine = loader().context("Failed to load analysis engine")?;
        info!(engine = engine.name(), ?reload_after, "Analysis engine loaded");

        Ok(Self {
            engine_name: Mutex::new(engine.name().to_string()),
            engine: RwLock::new(engine),
            loader,
            processed: AtomicUsize::new(0),
            reloads: AtomicUsize::new(0),
            reload_after,
        })
    }

    /// Shared access; released when the returned guard is dropped.
    pub fn read(&self) -> RwLockReadGuard<'_, E> {
        // Shared holders never mutate the engine, so a poisoned lock still
        // guards a usable instance
        self.engine.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_processed(&self, documents: usize) -> usize {
        self.processed.fetch_add(documents, Ordering::SeqCst) + documents
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::SeqCst)
    }

    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }

    /// Name of the loaded engine. Never touches the engine lock, so it
    /// answers immediately even while a reload is pending.
    pub fn engine_name(&self) -> String {
        self.engine_name
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn reload_due(&self) -> bool {
        self.reload_after
            .is_some_and(|threshold| self.processed() >= threshold)
    }

    /// Reload the engine if the processed counter crossed the threshold.
    ///
    /// The condition is checked again under exclusive access: when several
    /// callers cross the threshold together only the first one reloads.
    pub fn reload_if_due(&self) -> bool {
        if !self.reload_due() {
            return false;
        }

        let mut engine = self.engine.write().unwrap_or_else(PoisonError::into_inner);
        if !self.reload_due() {
            return false;
        }

        info!(processed = self.processed(), "Reloading analysis engine");
        self.replace(&mut engine);
        true
    }

    /// Unconditionally replace the engine.
    #[cfg(test)]
    fn reload(&self) -> Result<()> {
        let mut engine = self.engine.write().unwrap_or_else(PoisonError::into_inner);
        *engine = (self.loader)().context("Failed to reload analysis engine")?;
        self.set_engine_name(&engine);
        self.processed.store(0, Ordering::SeqCst);
        self.reloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn replace(&self, engine: &mut E) {
        match (self.loader)() {
            Ok(fresh) => {
                *engine = fresh;
                self.set_engine_name(engine);
                self.reloads.fetch_add(1, Ordering::SeqCst);
            }
            Err(e) => {
                // Keep serving with the current engine; try again next interval
                error!(error = %e, "Engine reload failed");
            }
        }
        self.processed.store(0, Ordering::SeqCst);
    }

    fn set_engine_name(&self, engine: &E) {
        *self.engine_name.lock().unwrap_or_else(PoisonError::into_inner) = engine.name().to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annotate::Analysis;
    use std::sync::atomic::AtomicBool;
    use std::sync::{Arc, Barrier, mpsc};
    use std::thread;
    use std::time::Duration;

    /// Engine tagged with the generation that created it.
    struct Generation(usize);

    impl AnalysisEngine for Generation {
        fn analyze(&self, _text: &str) -> Result<Analysis> {
            Ok(Analysis::default())
        }
    }

    fn counting_loader() -> (EngineLoader<Generation>, Arc<AtomicUsize>) {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let loader: EngineLoader<Generation> =
            Box::new(move || Ok(Generation(counter.fetch_add(1, Ordering::SeqCst))));
        (loader, loads)
    }

    #[test]
    fn test_reload_disabled_by_default() {
        let (loader, loads) = counting_loader();
        let guard = AnalysisGuard::new(loader, None).unwrap();

        guard.record_processed(1_000_000);
        assert!(!guard.reload_if_due());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reload_at_threshold() {
        let (loader, loads) = counting_loader();
        let guard = AnalysisGuard::new(loader, Some(10)).unwrap();

        guard.record_processed(9);
        assert!(!guard.reload_if_due());

        guard.record_processed(1);
        assert!(guard.reload_if_due());
        assert_eq!(guard.processed(), 0);
        assert_eq!(guard.reloads(), 1);
        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert_eq!(guard.read().0, 1);
    }

    #[test]
    fn test_concurrent_threshold_crossing_reloads_once() {
        let (loader, loads) = counting_loader();
        let guard = Arc::new(AnalysisGuard::new(loader, Some(4)).unwrap());
        guard.record_processed(4);

        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = Arc::clone(&guard);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    guard.reload_if_due()
                })
            })
            .collect();

        let reloaded = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&r| r)
            .count();
        assert_eq!(reloaded, 1);
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failed_reload_keeps_engine() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let loader: EngineLoader<Generation> = Box::new(move || {
            match counter.fetch_add(1, Ordering::SeqCst) {
                0 => Ok(Generation(0)),
                _ => anyhow::bail!("out of memory"),
            }
        });
        let guard = AnalysisGuard::new(loader, Some(1)).unwrap();

        guard.record_processed(1);
        assert!(guard.reload_if_due());
        assert_eq!(guard.read().0, 0);
        assert_eq!(guard.reloads(), 0);
        assert_eq!(guard.processed(), 0);
        assert!(guard.reload().is_err());
    }

    #[test]
    fn test_startup_failure() {
        let loader: EngineLoader<Generation> =
            Box::new(|| -> Result<Generation> { anyhow::bail!("model missing") });
        assert!(AnalysisGuard::new(loader, None).is_err());
    }

    #[test]
    fn test_concurrent_readers() {
        let (loader, _) = counting_loader();
        let guard = Arc::new(AnalysisGuard::new(loader, None).unwrap());

        // All readers hold shared access at the same time
        let barrier = Arc::new(Barrier::new(6));
        let handles: Vec<_> = (0..6)
            .map(|_| {
                let guard = Arc::clone(&guard);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let engine = guard.read();
                    barrier.wait();
                    engine.0
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 0);
        }
    }

    #[test]
    fn test_reload_waits_for_readers() {
        let (loader, _) = counting_loader();
        let guard = Arc::new(AnalysisGuard::new(loader, None).unwrap());
        let reloaded = Arc::new(AtomicBool::new(false));

        let reader = guard.read();
        let (started_tx, started_rx) = mpsc::channel();
        let writer = {
            let guard = Arc::clone(&guard);
            let reloaded = Arc::clone(&reloaded);
            thread::spawn(move || {
                started_tx.send(()).unwrap();
                guard.reload().unwrap();
                reloaded.store(true, Ordering::SeqCst);
            })
        };

        started_rx.recv().unwrap();
        thread::sleep(Duration::from_millis(50));
        assert!(!reloaded.load(Ordering::SeqCst));
        assert_eq!(reader.0, 0);
        drop(reader);

        writer.join().unwrap();
        assert!(reloaded.load(Ordering::SeqCst));
        assert_eq!(guard.read().0, 1);
    }

    #[test]
    fn test_engine_name_while_reload_pending() {
        let (loader, _) = counting_loader();
        let guard = Arc::new(AnalysisGuard::new(loader, None).unwrap());

        // A reader holds the engine and a reload queues behind it
        let reader = guard.read();
        let writer = {
            let guard = Arc::clone(&guard);
            thread::spawn(move || guard.reload().unwrap())
        };
        thread::sleep(Duration::from_millis(50));

        let (name_tx, name_rx) = mpsc::channel();
        let lookup = {
            let guard = Arc::clone(&guard);
            thread::spawn(move || name_tx.send(guard.engine_name()).unwrap())
        };
        assert_eq!(
            name_rx.recv_timeout(Duration::from_secs(2)).as_deref(),
            Ok("engine")
        );
        assert_eq!(guard.reloads(), 0);

        drop(reader);
        writer.join().unwrap();
        lookup.join().unwrap();
        assert_eq!(guard.reloads(), 1);
        assert_eq!(guard.engine_name(), "engine");
    }
}
