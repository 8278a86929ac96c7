//! QR extraction controller
//!
//! Only the latest selection's result is applied.

use crate::decoder::QrDecoder;
use crate::error::DecodeError;
use crate::notify::{Notification, Notifier, NullNotifier};
use crate::types::{DecodeResult, ExtractionState, SelectedFile};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Loads the raw bytes of a selected file
pub trait ImageLoader: Send + Sync + 'static {
    fn load(&self, file: &SelectedFile) -> impl Future<Output = Result<Vec<u8>, DecodeError>> + Send;
}

type ContentCallback = Box<dyn Fn(Option<&str>) + Send + Sync>;
type StatusCallback = Box<dyn Fn(&ExtractionState) + Send + Sync>;
type HandlerReadyCallback<L> = Box<dyn FnOnce(FileHandler<L>)>;

/// How one selection's extraction resolved
#[derive(Debug)]
pub enum ExtractionOutcome {
    Extracted(String),
    NotFound,
    Failed(DecodeError),
    /// A newer selection or a clear happened first; the result was dropped
    Superseded,
    /// The selection was emptied
    Cleared,
}

struct Shared {
    state: ExtractionState,
    generation: u64,
}

struct Inner<L> {
    loader: L,
    decoder: QrDecoder,
    notifier: Arc<dyn Notifier>,
    on_content_change: Option<ContentCallback>,
    on_status_change: Option<StatusCallback>,
    /// Held from the state swap until its callbacks and notification are done
    publishing: Mutex<()>,
    shared: Mutex<Shared>,
}

pub struct ExtractionController<L> {
    inner: Arc<Inner<L>>,
}

impl<L> Clone for ExtractionController<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

pub struct ExtractionControllerBuilder<L> {
    loader: L,
    decoder: QrDecoder,
    notifier: Arc<dyn Notifier>,
    on_content_change: Option<ContentCallback>,
    on_status_change: Option<StatusCallback>,
    on_file_handler_ready: Option<HandlerReadyCallback<L>>,
}

impl<L: ImageLoader> ExtractionControllerBuilder<L> {
    pub fn decoder(mut self, decoder: QrDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn on_content_change(mut self, f: impl Fn(Option<&str>) + Send + Sync + 'static) -> Self {
        self.on_content_change = Some(Box::new(f));
        self
    }

    pub fn on_status_change(mut self, f: impl Fn(&ExtractionState) + Send + Sync + 'static) -> Self {
        self.on_status_change = Some(Box::new(f));
        self
    }

    /// Called once from `build()` with the handler to wire to the file input
    pub fn on_file_handler_ready(mut self, f: impl FnOnce(FileHandler<L>) + 'static) -> Self {
        self.on_file_handler_ready = Some(Box::new(f));
        self
    }

    pub fn build(self) -> ExtractionController<L> {
        let controller = ExtractionController {
            inner: Arc::new(Inner {
                loader: self.loader,
                decoder: self.decoder,
                notifier: self.notifier,
                on_content_change: self.on_content_change,
                on_status_change: self.on_status_change,
                publishing: Mutex::new(()),
                shared: Mutex::new(Shared {
                    state: ExtractionState::default(),
                    generation: 0,
                }),
            }),
        };
        if let Some(ready) = self.on_file_handler_ready {
            ready(controller.handler());
        }
        controller
    }
}

impl<L: ImageLoader> ExtractionController<L> {
    pub fn builder(loader: L) -> ExtractionControllerBuilder<L> {
        ExtractionControllerBuilder {
            loader,
            decoder: QrDecoder::new(),
            notifier: Arc::new(NullNotifier),
            on_content_change: None,
            on_status_change: None,
            on_file_handler_ready: None,
        }
    }

    pub fn handler(&self) -> FileHandler<L> {
        FileHandler {
            controller: self.clone(),
        }
    }

    pub fn state(&self) -> ExtractionState {
        self.lock().state.clone()
    }

    /// Applies the new selection's state before returning; the future does the decode
    pub fn on_file_selected(
        &self,
        file: Option<SelectedFile>,
    ) -> impl Future<Output = ExtractionOutcome> + Send + 'static {
        let started = match file {
            None => {
                self.reset();
                None
            }
            Some(file) => Some((self.begin(&file), file)),
        };

        let this = self.clone();
        async move {
            let Some((generation, file)) = started else {
                return ExtractionOutcome::Cleared;
            };
            let result = match this.inner.loader.load(&file).await {
                Ok(bytes) => this.inner.decoder.decode_bytes(&bytes),
                Err(e) => Err(e),
            };
            this.finish(generation, &file.name, result)
        }
    }

    /// Idempotent
    pub fn clear(&self) {
        self.reset();
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.inner.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Callbacks must not select or clear from inside a publish
    fn lock_publishing(&self) -> MutexGuard<'_, ()> {
        self.inner.publishing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, file: &SelectedFile) -> u64 {
        let _publishing = self.lock_publishing();
        let (generation, previous) = {
            let mut shared = self.lock();
            shared.generation += 1;
            let previous = std::mem::replace(&mut shared.state, ExtractionState::extracting());
            (shared.generation, previous)
        };
        debug!(file = %file.name, generation, "QR extraction started");
        self.publish(&previous, &ExtractionState::extracting());
        generation
    }

    fn reset(&self) {
        let _publishing = self.lock_publishing();
        let previous = {
            let mut shared = self.lock();
            shared.generation += 1;
            std::mem::take(&mut shared.state)
        };
        self.publish(&previous, &ExtractionState::default());
    }

    fn finish(
        &self,
        generation: u64,
        file_name: &str,
        result: Result<DecodeResult, DecodeError>,
    ) -> ExtractionOutcome {
        let next = match &result {
            Ok(DecodeResult::Decoded { text }) => ExtractionState::extracted(text.clone()),
            _ => ExtractionState::failed(),
        };

        let _publishing = self.lock_publishing();
        let previous = {
            let mut shared = self.lock();
            if shared.generation != generation {
                debug!(
                    file = %file_name,
                    generation,
                    current = shared.generation,
                    "dropping superseded QR result"
                );
                return ExtractionOutcome::Superseded;
            }
            std::mem::replace(&mut shared.state, next.clone())
        };
        self.publish(&previous, &next);

        match result {
            Ok(DecodeResult::Decoded { text }) => {
                info!(file = %file_name, "QR content extracted");
                self.inner.notifier.notify(
                    Notification::success("QR code extracted")
                        .with_description("The QR content was read from your image."),
                );
                ExtractionOutcome::Extracted(text)
            }
            Ok(DecodeResult::NotFound) => {
                info!(file = %file_name, "no QR code found in image");
                self.inner.notifier.notify(manual_fallback());
                ExtractionOutcome::NotFound
            }
            Err(e) => {
                warn!(file = %file_name, error = %e, "image could not be decoded");
                self.inner.notifier.notify(manual_fallback());
                ExtractionOutcome::Failed(e)
            }
        }
    }

    fn publish(&self, previous: &ExtractionState, next: &ExtractionState) {
        if let Some(on_status_change) = &self.inner.on_status_change {
            on_status_change(next);
        }
        if previous.qr_content != next.qr_content {
            if let Some(on_content_change) = &self.inner.on_content_change {
                on_content_change(next.qr_content.as_deref());
            }
        }
    }
}

fn manual_fallback() -> Notification {
    Notification::warning("Could not read the QR code")
        .with_description("You can still submit. An admin will extract the QR code manually.")
}

/// The file-input change handler published through `on_file_handler_ready`
pub struct FileHandler<L> {
    controller: ExtractionController<L>,
}

impl<L> Clone for FileHandler<L> {
    fn clone(&self) -> Self {
        Self {
            controller: self.controller.clone(),
        }
    }
}

impl<L: ImageLoader> FileHandler<L> {
    pub fn select(
        &self,
        file: Option<SelectedFile>,
    ) -> impl Future<Output = ExtractionOutcome> + Send + 'static {
        self.controller.on_file_selected(file)
    }
}
