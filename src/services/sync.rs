use futures::future::LocalBoxFuture;
use std::cell::RefCell;
use std::rc::Rc;
use yew::Callback;

use crate::models::{error::AppError, power::PowerStationsResponse};
use crate::services::api::PreviewSink;
use crate::state::store::{Store, Subscription};
use crate::utils::console;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SkipReason {
    /// There is no preview datapoint to send.
    NoPreview,
    /// The execution context cannot make network calls.
    Offline,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SyncOutcome {
    Skipped(SkipReason),
    /// Same timestamp as the last datapoint sent.
    Unchanged,
    Sent,
    Failed(AppError),
}

/// Mirrors the preview datapoint to the local server.
///
/// A datapoint is sent when its timestamp differs from the last one sent. The
/// timestamp is recorded before the request is made and stays recorded even if
/// the request fails.
pub struct ServerSync<S> {
    sink: S,
    last_sent: RefCell<Option<String>>,
}

impl<S: PreviewSink + 'static> ServerSync<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            last_sent: RefCell::new(None),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Timestamp of the last datapoint handed to the sink.
    pub fn last_sent_timestamp(&self) -> Option<String> {
        self.last_sent.borrow().clone()
    }

    pub async fn on_preview(&self, preview: Option<&PowerStationsResponse>) -> SyncOutcome {
        let Some(preview) = preview else {
            return SyncOutcome::Skipped(SkipReason::NoPreview);
        };
        if !self.sink.can_push() {
            return SyncOutcome::Skipped(SkipReason::Offline);
        }
        if self.last_sent.borrow().as_deref() == Some(preview.timestamp.as_str()) {
            return SyncOutcome::Unchanged;
        }

        self.last_sent.replace(Some(preview.timestamp.clone()));

        match self.sink.push_preview(preview).await {
            Ok(()) => SyncOutcome::Sent,
            Err(e) => {
                console::warn(&format!(
                    "Failed to sync preview {} to server: {e}",
                    preview.timestamp
                ));
                SyncOutcome::Failed(e)
            }
        }
    }

    /// Syncs every value `preview` takes, starting with the current one.
    pub fn bind<F>(
        this: &Rc<Self>,
        preview: &Store<Option<PowerStationsResponse>>,
        spawn: F,
    ) -> Subscription
    where
        F: Fn(LocalBoxFuture<'static, ()>) + 'static,
    {
        let sync = Rc::downgrade(this);
        preview.subscribe(Callback::from(
            move |value: Rc<Option<PowerStationsResponse>>| {
                let Some(sync) = sync.upgrade() else {
                    return;
                };
                spawn(Box::pin(async move {
                    sync.on_preview((*value).as_ref()).await;
                }));
            },
        ))
    }
}
