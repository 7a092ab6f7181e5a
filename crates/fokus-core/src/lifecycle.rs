//! App lifecycle observation.
//!
//! Platforms report richer states (active, inactive, background, ...). The
//! timer only cares about the active <-> background edges, so
//! [`LifecycleMonitor`] collapses raw states into [`LifecycleEvent`]s and
//! fans them out to subscribers. A [`Subscription`] unsubscribes when dropped.

use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde::{Deserialize, Serialize};

/// The two edges the timer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleEvent {
    Foreground,
    Background,
}

/// Raw platform app state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformState {
    Active,
    Inactive,
    Background,
    Unknown,
}

impl FromStr for PlatformState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "active" | "foreground" => PlatformState::Active,
            "inactive" => PlatformState::Inactive,
            "background" => PlatformState::Background,
            _ => PlatformState::Unknown,
        })
    }
}

/// Tracks the last settled side and reports only real edges.
#[derive(Debug, Clone)]
pub struct EdgeDetector {
    in_foreground: bool,
}

impl Default for EdgeDetector {
    fn default() -> Self {
        // Apps start in the foreground.
        Self {
            in_foreground: true,
        }
    }
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, state: PlatformState) -> Option<LifecycleEvent> {
        match state {
            PlatformState::Active if !self.in_foreground => {
                self.in_foreground = true;
                Some(LifecycleEvent::Foreground)
            }
            PlatformState::Background if self.in_foreground => {
                self.in_foreground = false;
                Some(LifecycleEvent::Background)
            }
            _ => None,
        }
    }
}

type Callback = Box<dyn FnMut(LifecycleEvent) + Send>;

struct Inner {
    edges: EdgeDetector,
    next_id: u64,
    subscribers: Vec<(u64, Callback)>,
}

/// Observer registry for lifecycle edges.
///
/// Callbacks run synchronously inside [`LifecycleMonitor::notify`] and must
/// not subscribe or unsubscribe from within the callback.
#[derive(Clone)]
pub struct LifecycleMonitor {
    inner: Arc<Mutex<Inner>>,
}

impl Default for LifecycleMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleMonitor {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                edges: EdgeDetector::new(),
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(LifecycleEvent) + Send + 'static,
    {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, Box::new(callback)));
        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Feed a raw platform state. Returns the edge delivered, if any.
    pub fn notify(&self, state: PlatformState) -> Option<LifecycleEvent> {
        let mut inner = self.lock();
        let event = inner.edges.observe(state)?;
        tracing::debug!(?state, ?event, "lifecycle edge");
        for (_, callback) in inner.subscribers.iter_mut() {
            callback(event);
        }
        Some(event)
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}

/// Handle returned by [`LifecycleMonitor::subscribe`].
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    inner: Weak<Mutex<Inner>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            let mut inner = inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            inner.subscribers.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn intermediate_states_are_ignored() {
        let mut edges = EdgeDetector::new();
        assert_eq!(edges.observe(PlatformState::Inactive), None);
        assert_eq!(
            edges.observe(PlatformState::Background),
            Some(LifecycleEvent::Background)
        );
        assert_eq!(edges.observe(PlatformState::Background), None);
        assert_eq!(edges.observe(PlatformState::Inactive), None);
        assert_eq!(
            edges.observe(PlatformState::Active),
            Some(LifecycleEvent::Foreground)
        );
        assert_eq!(edges.observe(PlatformState::Active), None);
    }

    #[test]
    fn parses_platform_names() {
        assert_eq!("active".parse::<PlatformState>().unwrap(), PlatformState::Active);
        assert_eq!(
            "Background".parse::<PlatformState>().unwrap(),
            PlatformState::Background
        );
        assert_eq!("extension".parse::<PlatformState>().unwrap(), PlatformState::Unknown);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let monitor = LifecycleMonitor::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        let sub = monitor.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(monitor.subscriber_count(), 1);

        monitor.notify(PlatformState::Background);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        drop(sub);
        assert_eq!(monitor.subscriber_count(), 0);

        monitor.notify(PlatformState::Active);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscription_outliving_monitor_is_harmless() {
        let monitor = LifecycleMonitor::new();
        let sub = monitor.subscribe(|_| {});
        drop(monitor);
        sub.unsubscribe();
    }
}
