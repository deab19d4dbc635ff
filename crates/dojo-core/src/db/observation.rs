//! Hot, replaying views over the cached record set.

use std::sync::Arc;

use futures::Stream;
use tokio::sync::watch;

use crate::models::Record;

/// Shared snapshot published by the cache after every committed write.
pub(crate) type SnapshotReceiver = watch::Receiver<Arc<Vec<Record>>>;

type Projection<T> = Arc<dyn Fn(&[Record]) -> T + Send + Sync>;

/// A projection of the cache that yields its latest value on demand and
/// every distinct value after that.
///
/// Each observation owns its own receiver, so dropping one never affects
/// the others.
pub struct Observation<T> {
    rx: SnapshotReceiver,
    project: Projection<T>,
    last: Option<T>,
}

impl<T> Observation<T>
where
    T: Clone + PartialEq,
{
    pub(crate) fn new(
        rx: SnapshotReceiver,
        project: impl Fn(&[Record]) -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            rx,
            project: Arc::new(project),
            last: None,
        }
    }

    /// Latest known value. Marks it as seen.
    pub fn latest(&mut self) -> T {
        let value = (self.project)(&self.rx.borrow_and_update());
        self.last = Some(value.clone());
        value
    }

    /// Wait for the next value that differs from the last one seen.
    ///
    /// Returns `None` once the cache has been dropped.
    pub async fn changed(&mut self) -> Option<T> {
        loop {
            self.rx.changed().await.ok()?;
            let value = (self.project)(&self.rx.borrow_and_update());
            if self.last.as_ref() != Some(&value) {
                self.last = Some(value.clone());
                return Some(value);
            }
        }
    }

    /// Stream that starts with the latest value, then follows updates.
    pub fn into_stream(self) -> impl Stream<Item = T> {
        futures::stream::unfold((self, true), |(mut observation, first)| async move {
            let value = if first {
                observation.latest()
            } else {
                observation.changed().await?
            };
            Some((value, (observation, false)))
        })
    }
}

impl<T> Clone for Observation<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
            project: Arc::clone(&self.project),
            last: None,
        }
    }
}
