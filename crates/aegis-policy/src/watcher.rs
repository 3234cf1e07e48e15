// watcher.rs — Filesystem watcher driving policy hot-reload.
//
// notify delivers events on its own callback thread; we bridge them into
// a std channel and run the reload loop on a dedicated thread so the
// async gateway never blocks on policy I/O. Editors commonly emit a
// create/write/rename burst per save, so events landing within a short
// window collapse into a single reload.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info, warn};

use crate::error::PolicyError;
use crate::store::PolicyStore;

/// Window within which a burst of filesystem events collapses to one reload.
const COALESCE_WINDOW: Duration = Duration::from_millis(50);

/// Watches the store's policy directory and reloads on mutation events.
///
/// Dropping the watcher detaches the backend, which closes the event
/// channel and ends the reload loop.
pub struct PolicyWatcher {
    watcher: Option<RecommendedWatcher>,
    thread: Option<thread::JoinHandle<()>>,
}

impl PolicyWatcher {
    /// Attach a watcher to the store's directory and start the reload loop.
    pub fn spawn(store: Arc<PolicyStore>) -> Result<Self, PolicyError> {
        let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
        let mut watcher = notify::recommended_watcher(move |event| {
            // A send failure means the loop is gone; nothing left to notify.
            let _ = tx.send(event);
        })?;
        watcher.watch(store.dir(), RecursiveMode::NonRecursive)?;
        info!(dir = %store.dir().display(), "watching policy directory");

        let thread = thread::spawn(move || reload_loop(store, rx));
        Ok(Self {
            watcher: Some(watcher),
            thread: Some(thread),
        })
    }
}

impl Drop for PolicyWatcher {
    fn drop(&mut self) {
        // Drop the backend first so the channel disconnects and the
        // reload loop can exit before we join it.
        self.watcher.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Receive events until the channel closes. Only channel closure ends
/// the loop; watcher backend errors and failed reloads are logged and
/// survived.
fn reload_loop(store: Arc<PolicyStore>, rx: Receiver<notify::Result<Event>>) {
    loop {
        match rx.recv() {
            Ok(event) => {
                if !triggers_reload(&event) {
                    continue;
                }
                // Drain the rest of the burst before reloading once.
                loop {
                    match rx.recv_timeout(COALESCE_WINDOW) {
                        Ok(_) => continue,
                        Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                            break
                        }
                    }
                }
                if let Err(err) = store.reload() {
                    error!(error = %err, "policy reload failed, keeping previous model");
                }
            }
            Err(_) => {
                debug!("watch channel closed, stopping policy watcher");
                return;
            }
        }
    }
}

/// Whether an event (or backend error) should trigger a reload.
/// Create, write, rename, and remove all do, so stale entries drop out.
fn triggers_reload(event: &notify::Result<Event>) -> bool {
    match event {
        Ok(event) => matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ),
        Err(err) => {
            warn!(error = %err, "file watcher error");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Instant;
    use tempfile::tempdir;

    const POLICY: &str = "\
version: 1
agents:
  - id: bot
    allow:
      - tool: files
        actions: [read]
";

    /// Poll the store until `predicate` holds or the deadline passes.
    fn wait_for(store: &PolicyStore, predicate: impl Fn(&PolicyStore) -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if predicate(store) {
                return true;
            }
            thread::sleep(Duration::from_millis(25));
        }
        predicate(store)
    }

    #[test]
    fn reloads_when_a_policy_file_is_written() {
        let dir = tempdir().unwrap();
        let store = Arc::new(PolicyStore::open(dir.path()).unwrap());
        assert!(store.snapshot().is_empty());

        let _watcher = PolicyWatcher::spawn(store.clone()).unwrap();
        fs::write(dir.path().join("team.yaml"), POLICY).unwrap();

        assert!(
            wait_for(&store, |s| s.snapshot().len() == 1),
            "watcher never picked up the new policy file"
        );
    }

    #[test]
    fn reloads_when_a_policy_file_is_removed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("team.yaml");
        fs::write(&path, POLICY).unwrap();

        let store = Arc::new(PolicyStore::open(dir.path()).unwrap());
        assert_eq!(store.snapshot().len(), 1);

        let _watcher = PolicyWatcher::spawn(store.clone()).unwrap();
        fs::remove_file(&path).unwrap();

        assert!(
            wait_for(&store, |s| s.snapshot().is_empty()),
            "watcher never dropped the removed policy file"
        );
    }

    #[test]
    fn drop_stops_the_watcher_thread() {
        let dir = tempdir().unwrap();
        let store = Arc::new(PolicyStore::open(dir.path()).unwrap());
        let watcher = PolicyWatcher::spawn(store).unwrap();
        // Drop must not deadlock waiting for the reload loop.
        drop(watcher);
    }
}
