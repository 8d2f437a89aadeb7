// EventLoopBridge - Coordinates between the tokio runtime and the Slint event loop
//
// Slint owns the main thread; sessions, provider calls and the state
// subscription run elsewhere. The bridge funnels UI mutations from those
// threads onto the event loop and spawns async work from Slint callbacks.

use slint::{ComponentHandle, Weak};
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Queued UI mutations. Quiz traffic is a few updates per second, so this is
/// only reached if the event loop has stalled.
const UI_UPDATE_CAPACITY: usize = 256;

type UiUpdate<T> = Box<dyn FnOnce(&T) + Send>;

/// Cloneable link between background work and the window.
///
/// # Example
/// ```ignore
/// let bridge = EventLoopBridge::new(&ui, runtime.handle().clone());
///
/// bridge.spawn(async move {
///     let score = do_work().await;
///     bridge_clone.update_ui(move |ui| ui.set_final_score(score as i32));
/// });
/// ```
pub struct EventLoopBridge<T: ComponentHandle> {
    tokio_handle: tokio::runtime::Handle,
    ui_update_tx: mpsc::Sender<UiUpdate<T>>,
}

// Manual Clone implementation to avoid requiring T: Clone
impl<T: ComponentHandle> Clone for EventLoopBridge<T> {
    fn clone(&self) -> Self {
        Self {
            tokio_handle: self.tokio_handle.clone(),
            ui_update_tx: self.ui_update_tx.clone(),
        }
    }
}

impl<T: ComponentHandle + 'static> EventLoopBridge<T> {
    /// Create the bridge and its forwarding thread.
    ///
    /// The thread exits when every clone of the bridge is dropped or the event
    /// loop stops accepting work.
    pub fn new(ui: &T, tokio_handle: tokio::runtime::Handle) -> Self {
        let forward_weak: Weak<T> = ui.as_weak();
        let (ui_update_tx, mut ui_update_rx) = mpsc::channel::<UiUpdate<T>>(UI_UPDATE_CAPACITY);

        let spawned = std::thread::Builder::new()
            .name("bevuihoc-ui-bridge".to_string())
            .spawn(move || {
                tracing::debug!("EventLoopBridge handler thread started");

                while let Some(update_fn) = ui_update_rx.blocking_recv() {
                    let result = forward_weak.upgrade_in_event_loop(move |ui| update_fn(&ui));

                    if let Err(e) = result {
                        tracing::warn!("Failed to queue UI update to event loop: {:?}", e);
                        break;
                    }
                }

                tracing::debug!("EventLoopBridge handler thread terminated");
            });
        if let Err(e) = spawned {
            tracing::error!("Failed to start UI bridge thread: {}", e);
        }

        Self {
            tokio_handle,
            ui_update_tx,
        }
    }

    /// Schedule a UI mutation from any thread.
    pub fn update_ui<F>(&self, update: F)
    where
        F: FnOnce(&T) + Send + 'static,
    {
        match self.ui_update_tx.try_send(Box::new(update)) {
            Ok(_) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("UI update channel full - dropping update");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("UI bridge has stopped - dropping update");
            }
        }
    }

    /// Run a future on the tokio runtime.
    pub fn spawn<Fut>(&self, future: Fut) -> JoinHandle<()>
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.tokio_handle.spawn(future)
    }

    /// Runtime handle, for code that spawns through `tokio::spawn`.
    pub fn runtime(&self) -> &tokio::runtime::Handle {
        &self.tokio_handle
    }
}
