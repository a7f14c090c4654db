//! File system watcher for live rebuilds.
//!
//! Bursts of change events are collapsed into a single action call once
//! the watched trees have been quiet for the debounce interval.
//!
//! ```text
//! notify events ──► Debouncer ──(quiet for 50ms)──► action(changed paths)
//!                     ▲    │
//!                     └────┘ each event pushes the deadline back
//! ```
//!
//! The action runs on the watcher loop itself, so rebuilds never overlap.
//! Events that arrive while it runs are queued and settle into at most
//! one follow-up call.

use crate::{log, utils::path::is_hidden};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    sync::mpsc::{Receiver, RecvTimeoutError, channel},
    time::{Duration, Instant},
};

/// How long to block when nothing is pending.
const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

// =============================================================================
// Debounce State
// =============================================================================

/// Collects changed paths until events stop arriving.
struct Debouncer {
    interval: Duration,
    roots: Vec<PathBuf>,
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
}

impl Debouncer {
    fn new(interval: Duration, roots: &[PathBuf]) -> Self {
        Self {
            interval,
            roots: roots.to_vec(),
            pending: FxHashSet::default(),
            last_event: None,
        }
    }

    /// Record an event. Hidden paths are dropped; an event with nothing
    /// left does not move the deadline.
    fn add(&mut self, event: Event) {
        let mut seen = false;
        for path in event.paths {
            if !self.is_hidden(&path) {
                seen = true;
                self.pending.insert(path);
            }
        }
        if seen {
            self.last_event = Some(Instant::now());
        }
    }

    /// Hidden relative to the watched root it lives under.
    fn is_hidden(&self, path: &Path) -> bool {
        let rel = self
            .roots
            .iter()
            .find_map(|root| path.strip_prefix(root).ok())
            .unwrap_or(path);
        is_hidden(rel)
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty() && self.last_event.is_some_and(|t| t.elapsed() >= self.interval)
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        let mut paths: Vec<_> = self.pending.drain().collect();
        paths.sort();
        paths
    }

    /// Time left until the pending burst settles.
    fn timeout(&self) -> Duration {
        match self.last_event {
            Some(t) if !self.pending.is_empty() => self.interval.saturating_sub(t.elapsed()),
            _ => IDLE_TIMEOUT,
        }
    }
}

/// Create, modify and remove count as changes; access does not.
const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
    )
}

// =============================================================================
// Event Loop
// =============================================================================

/// Drive `action` from a stream of watcher events until the sender hangs up.
///
/// A burst still pending at hang-up is flushed before returning.
pub fn debounce_loop<F>(
    rx: Receiver<notify::Result<Event>>,
    roots: &[PathBuf],
    interval: Duration,
    mut action: F,
) where
    F: FnMut(&[PathBuf]),
{
    let mut debouncer = Debouncer::new(interval, roots);

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) => debouncer.add(event),
            Ok(Err(err)) => log!("watch"; "Watching {} failed: {err}", display_roots(roots)),
            Err(RecvTimeoutError::Timeout) if debouncer.ready() => action(&debouncer.take()),
            Err(RecvTimeoutError::Disconnected) => {
                if !debouncer.pending.is_empty() {
                    action(&debouncer.take());
                }
                break;
            }
            // Irrelevant events, timeouts with nothing settled
            _ => {}
        }
    }
}

/// Watch `roots` recursively and call `action` once per settled burst.
///
/// Blocks for the life of the watcher. Roots that do not exist are
/// skipped; if none can be watched the failure is logged and this returns.
pub fn watch_blocking<F>(roots: &[PathBuf], interval: Duration, action: F) -> Result<()>
where
    F: FnMut(&[PathBuf]),
{
    let (tx, rx) = channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;

    let mut watched = Vec::new();
    for root in roots.iter().filter(|root| root.exists()) {
        match watcher.watch(root, RecursiveMode::Recursive) {
            Ok(()) => watched.push(root.clone()),
            Err(err) => log!("watch"; "Watching {} failed: {err}", root.display()),
        }
    }

    if watched.is_empty() {
        log!("watch"; "Watching {} failed: nothing to watch", display_roots(roots));
        return Ok(());
    }

    log!("watch"; "watching {}", display_roots(&watched));
    debounce_loop(rx, &watched, interval, action);
    Ok(())
}

/// `[a, b]` list of directory names for log display.
fn display_roots(roots: &[PathBuf]) -> String {
    let names: Vec<_> = roots
        .iter()
        .map(|root| {
            root.file_name()
                .unwrap_or(root.as_os_str())
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    format!("[{}]", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind};
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
            mpsc::Sender,
        },
        thread,
    };

    const INTERVAL: Duration = Duration::from_millis(50);

    fn modify(path: &str) -> notify::Result<Event> {
        Ok(Event::new(EventKind::Modify(ModifyKind::Any)).add_path(PathBuf::from(path)))
    }

    /// Run a debounce loop on a thread, counting calls and collecting paths.
    fn spawn_loop(
        roots: Vec<PathBuf>,
    ) -> (
        Sender<notify::Result<Event>>,
        Arc<AtomicUsize>,
        thread::JoinHandle<Vec<Vec<PathBuf>>>,
    ) {
        let (tx, rx) = channel();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handle = thread::spawn(move || {
            let mut batches = Vec::new();
            debounce_loop(rx, &roots, INTERVAL, |paths| {
                counter.fetch_add(1, Ordering::SeqCst);
                batches.push(paths.to_vec());
            });
            batches
        });
        (tx, calls, handle)
    }

    #[test]
    fn test_burst_triggers_once() {
        let (tx, calls, handle) = spawn_loop(vec![]);
        for i in 0..10 {
            tx.send(modify(&format!("/site/content/{i}.md"))).unwrap();
        }
        drop(tx);

        let batches = handle.join().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(batches[0].len(), 10);
    }

    #[test]
    fn test_separated_events_trigger_separately() {
        let (tx, calls, handle) = spawn_loop(vec![]);
        for i in 0..3 {
            tx.send(modify(&format!("/site/content/{i}.md"))).unwrap();
            thread::sleep(INTERVAL * 5);
        }
        drop(tx);

        handle.join().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_duplicate_paths_collapse() {
        let (tx, _calls, handle) = spawn_loop(vec![]);
        for _ in 0..5 {
            tx.send(modify("/site/content/a.md")).unwrap();
            tx.send(modify("/site/assets/b.css")).unwrap();
        }
        drop(tx);

        let batches = handle.join().unwrap();
        assert_eq!(
            batches,
            vec![vec![
                PathBuf::from("/site/assets/b.css"),
                PathBuf::from("/site/content/a.md"),
            ]]
        );
    }

    #[test]
    fn test_hidden_paths_ignored() {
        let (tx, calls, handle) = spawn_loop(vec![PathBuf::from("/home/me/.sites/blog/content")]);
        tx.send(modify("/home/me/.sites/blog/content/.draft.md.swp")).unwrap();
        tx.send(modify("/home/me/.sites/blog/content/.git/index")).unwrap();
        drop(tx);

        handle.join().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_hidden_check_is_relative_to_root() {
        let root = PathBuf::from("/home/me/.sites/blog/content");
        let (tx, calls, handle) = spawn_loop(vec![root]);
        tx.send(modify("/home/me/.sites/blog/content/post.md")).unwrap();
        drop(tx);

        handle.join().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_access_events_ignored() {
        let (tx, calls, handle) = spawn_loop(vec![]);
        tx.send(Ok(Event::new(EventKind::Access(AccessKind::Any)).add_path("/site/a.md".into())))
            .unwrap();
        tx.send(Ok(Event::new(EventKind::Create(CreateKind::File)).add_path("/site/b.md".into())))
            .unwrap();
        drop(tx);

        let batches = handle.join().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(batches[0], vec![PathBuf::from("/site/b.md")]);
    }

    #[test]
    fn test_watcher_errors_do_not_stop_the_loop() {
        let (tx, calls, handle) = spawn_loop(vec![]);
        tx.send(Err(notify::Error::generic("root removed"))).unwrap();
        tx.send(modify("/site/content/a.md")).unwrap();
        drop(tx);

        handle.join().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_display_roots() {
        let roots = [PathBuf::from("/site/assets"), PathBuf::from("/site/content")];
        assert_eq!(display_roots(&roots), "[assets, content]");
    }

    #[test]
    fn test_watch_blocking_without_roots_returns() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        watch_blocking(&[missing], INTERVAL, |_| panic!("no events expected")).unwrap();
    }
}
