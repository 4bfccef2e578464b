//! In process stand in used where no native engine exists.
//!
//! Platforms without an engine still get the full lifecycle contract:
//! a dedicated owning thread, the bounded work queue, the routing
//! registry and the closed latch all behave exactly as they do behind
//! a real engine, the native calls are just recorded instead of made.
//! Blocking behaviour follows the reflective contract, so `run` and
//! `hibernate` park until destroy fires the latch.

use std::sync::atomic::{AtomicBool, AtomicIsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex};
use std::thread::{self, JoinHandle};

use tracing::debug;

use webnest_core::config::ResolvedConfig;
use webnest_core::error::{Error, Result};
use webnest_core::types::{BackendKind, Size, SizeHint, Visibility};

use crate::dispatch::{work_queue, DispatchDrain, DispatchQueue};
use crate::lifecycle::Lifecycle;
use crate::registry::Registry;
use crate::signal::{completion_signal, ClosedLatch, CompletionSignal};

static REGISTRY: LazyLock<Registry<HeadlessShared>> = LazyLock::new(Registry::new);
static NEXT_HANDLE: AtomicIsize = AtomicIsize::new(1);

/// State shared between the owning thread and callers.
struct HeadlessShared {
    handle: AtomicIsize,
    queue: DispatchQueue,
    closed: ClosedLatch,
    done: AtomicBool,
    applied: Mutex<Applied>,
}

/// Operations the stand in engine has carried out, oldest first.
/// Only tests read the record back.
#[derive(Default)]
#[cfg_attr(not(test), allow(dead_code))]
struct Applied {
    navigations: Vec<String>,
    titles: Vec<String>,
    sizes: Vec<(Size, SizeHint)>,
    visibilities: Vec<Visibility>,
    hibernations: usize,
    resumes: usize,
    destroyed: bool,
}

pub(crate) struct HeadlessHost {
    shared: Arc<HeadlessShared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl HeadlessHost {
    pub(crate) fn create(config: &ResolvedConfig, _lifecycle: Arc<Lifecycle>) -> Result<Self> {
        let handle = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);
        let (queue, drain) = work_queue();
        let shared = Arc::new(HeadlessShared {
            handle: AtomicIsize::new(handle),
            queue,
            closed: ClosedLatch::new(),
            done: AtomicBool::new(false),
            applied: Mutex::new(Applied::default()),
        });
        REGISTRY.insert(handle, &shared);

        let (signal, ready) = completion_signal();
        let thread = {
            let shared = shared.clone();
            let visibility = config.visibility;
            thread::Builder::new()
                .name(format!("webnest-host-{handle}"))
                .spawn(move || owning_thread(shared, drain, visibility, signal))
                .map_err(|e| {
                    REGISTRY.remove(handle);
                    Error::construction_aborted(e.to_string())
                })?
        };

        match ready.wait() {
            Some(Ok(())) => Ok(Self {
                shared,
                thread: Mutex::new(Some(thread)),
            }),
            Some(Err(err)) => {
                REGISTRY.remove(handle);
                let _ = thread.join();
                Err(err)
            }
            None => {
                REGISTRY.remove(handle);
                let _ = thread.join();
                Err(Error::construction_aborted(
                    "owning thread exited during startup",
                ))
            }
        }
    }

    pub(crate) fn kind(&self) -> BackendKind {
        BackendKind::Headless
    }

    pub(crate) fn window(&self) -> usize {
        self.shared.handle.load(Ordering::Acquire) as usize
    }

    pub(crate) fn run(&self) -> Result<()> {
        self.shared.closed.wait();
        Ok(())
    }

    pub(crate) fn navigate(&self, url: &str) -> Result<()> {
        let shared = self.shared.clone();
        let url = url.to_owned();
        self.shared.queue.post(move || {
            debug!(%url, "navigate");
            shared.applied.lock().unwrap().navigations.push(url);
        });
        Ok(())
    }

    pub(crate) fn set_title(&self, title: &str) -> Result<()> {
        let shared = self.shared.clone();
        let title = title.to_owned();
        self.shared.queue.post(move || {
            shared.applied.lock().unwrap().titles.push(title);
        });
        Ok(())
    }

    pub(crate) fn set_size(&self, size: Size, hint: SizeHint) -> Result<()> {
        let shared = self.shared.clone();
        self.shared.queue.post(move || {
            shared.applied.lock().unwrap().sizes.push((size, hint));
        });
        Ok(())
    }

    pub(crate) fn set_visibility(&self, visibility: Visibility) -> Result<()> {
        let shared = self.shared.clone();
        self.shared.queue.post(move || {
            shared.applied.lock().unwrap().visibilities.push(visibility);
        });
        Ok(())
    }

    pub(crate) fn hibernate(&self) -> Result<()> {
        let shared = self.shared.clone();
        self.shared.queue.post(move || {
            shared.applied.lock().unwrap().hibernations += 1;
        });
        self.shared.closed.wait();
        Ok(())
    }

    pub(crate) fn resume(&self) -> Result<()> {
        let shared = self.shared.clone();
        self.shared.queue.post(move || {
            shared.applied.lock().unwrap().resumes += 1;
        });
        Ok(())
    }

    pub(crate) fn terminate(&self) -> Result<()> {
        self.destroy()
    }

    pub(crate) fn destroy(&self) -> Result<()> {
        let shared = self.shared.clone();
        let handle = shared.handle.load(Ordering::Acquire);
        // Routing stops before the handle is invalidated.
        REGISTRY.remove(handle);
        self.shared.queue.post(move || {
            debug!(handle, "teardown");
            shared.applied.lock().unwrap().destroyed = true;
            shared.handle.store(0, Ordering::Release);
            shared.done.store(true, Ordering::Release);
            shared.closed.fire();
        });
        if let Some(thread) = self.thread.lock().unwrap().take() {
            let _ = thread.join();
        }
        Ok(())
    }

    /// Waits until every item enqueued so far has run.
    #[cfg(test)]
    pub(crate) fn barrier(&self) {
        let (signal, wait) = completion_signal();
        self.shared.queue.post(move || signal.complete(()));
        let _ = wait.wait();
    }

    #[cfg(test)]
    pub(crate) fn is_registered(&self) -> bool {
        REGISTRY
            .get(self.shared.handle.load(Ordering::Acquire))
            .is_some()
    }

    #[cfg(test)]
    pub(crate) fn navigations(&self) -> Vec<String> {
        self.shared.applied.lock().unwrap().navigations.clone()
    }

    #[cfg(test)]
    pub(crate) fn titles(&self) -> Vec<String> {
        self.shared.applied.lock().unwrap().titles.clone()
    }

    #[cfg(test)]
    pub(crate) fn sizes(&self) -> Vec<(Size, SizeHint)> {
        self.shared.applied.lock().unwrap().sizes.clone()
    }

    #[cfg(test)]
    pub(crate) fn visibilities(&self) -> Vec<Visibility> {
        self.shared.applied.lock().unwrap().visibilities.clone()
    }

    #[cfg(test)]
    pub(crate) fn destroy_applied(&self) -> bool {
        self.shared.applied.lock().unwrap().destroyed
    }

    #[cfg(test)]
    pub(crate) fn hibernation_count(&self) -> usize {
        self.shared.applied.lock().unwrap().hibernations
    }

    #[cfg(test)]
    pub(crate) fn resume_count(&self) -> usize {
        self.shared.applied.lock().unwrap().resumes
    }
}

fn owning_thread(
    shared: Arc<HeadlessShared>,
    drain: DispatchDrain,
    visibility: Visibility,
    ready: CompletionSignal<Result<()>>,
) {
    debug!(
        handle = shared.handle.load(Ordering::Acquire),
        visibility = visibility.as_str(),
        "owning thread started"
    );
    shared.applied.lock().unwrap().visibilities.push(visibility);
    ready.complete(Ok(()));

    while !shared.done.load(Ordering::Acquire) {
        match drain.recv() {
            Some(item) => item(),
            None => break,
        }
    }
    debug!("owning thread exit");
}
