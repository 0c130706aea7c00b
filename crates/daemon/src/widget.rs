//! Adapter for the externally hosted Phone.email sign-in widget.
//!
//! The widget is a third-party script that reports completion by calling a
//! listener on the page. The host keeps exactly one listener slot: mounting
//! registers a single-shot channel there and injects the script resource,
//! dropping the [`MountedWidget`] guard removes both.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use phoneauth_core::model::VerificationResult;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::debug;

use crate::lock;

pub const DEFAULT_SCRIPT_URL: &str = "https://www.phone.email/sign_in_button_v1.js";
pub const DEFAULT_CLIENT_ID: &str = "18916899238123945181";
/// Global function name the widget script calls on success.
pub const LISTENER_NAME: &str = "phoneEmailListener";
/// Class of the element the widget script renders its button into.
pub const CONTAINER_CLASS: &str = "pe_signin_button";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WidgetError {
    #[error("a verification widget is already mounted")]
    AlreadyMounted,
    #[error("no verification widget is listening")]
    NoListener,
    #[error("verification result has an empty url")]
    EmptyUrl,
    #[error("verification result url is not http(s): {0}")]
    UnsupportedUrl(String),
    #[error("widget was torn down before verification completed")]
    Cancelled,
    #[error("no verification within {0:?}")]
    TimedOut(Duration),
}

/// Which widget to mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetSpec {
    pub client_id: String,
    pub script_url: String,
}

/// A script the page must embed while a widget is mounted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptResource {
    pub src: String,
    pub async_load: bool,
    /// `data-client-id` of the container the script renders into.
    pub client_id: String,
}

#[derive(Debug, Default)]
struct Slot {
    next_id: u64,
    mounted: Option<Mounted>,
}

#[derive(Debug)]
struct Mounted {
    id: u64,
    spec: WidgetSpec,
    listener: Option<oneshot::Sender<VerificationResult>>,
}

/// Owner of the listener slot and the injected script.
#[derive(Debug, Clone, Default)]
pub struct WidgetHost {
    slot: Arc<Mutex<Slot>>,
}

impl WidgetHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the listener and injects the widget script.
    pub fn mount(&self, spec: WidgetSpec) -> Result<MountedWidget, WidgetError> {
        let mut slot = lock(&self.slot);
        if slot.mounted.is_some() {
            return Err(WidgetError::AlreadyMounted);
        }
        slot.next_id += 1;
        let id = slot.next_id;
        let (tx, rx) = oneshot::channel();
        debug!(id, script = %spec.script_url, "widget mounted");
        slot.mounted = Some(Mounted {
            id,
            spec,
            listener: Some(tx),
        });
        Ok(MountedWidget {
            slot: Arc::clone(&self.slot),
            id,
            rx,
        })
    }

    /// Inbound success event from the external widget.
    pub fn deliver(&self, result: VerificationResult) -> Result<(), WidgetError> {
        if result.url.trim().is_empty() {
            return Err(WidgetError::EmptyUrl);
        }
        // The url ends up as a link on the page.
        let web = reqwest::Url::parse(&result.url)
            .is_ok_and(|u| matches!(u.scheme(), "http" | "https"));
        if !web {
            return Err(WidgetError::UnsupportedUrl(result.url));
        }
        let listener = lock(&self.slot)
            .mounted
            .as_mut()
            .and_then(|m| m.listener.take())
            .ok_or(WidgetError::NoListener)?;
        listener.send(result).map_err(|_| WidgetError::NoListener)
    }

    /// Drops the registered listener so a pending wait resolves as cancelled.
    /// The script itself goes away with the guard.
    pub fn teardown(&self) {
        if let Some(m) = lock(&self.slot).mounted.as_mut() {
            m.listener.take();
        }
    }

    pub fn is_mounted(&self) -> bool {
        lock(&self.slot).mounted.is_some()
    }

    /// Whether a delivered result would currently be accepted.
    pub fn is_listening(&self) -> bool {
        lock(&self.slot)
            .mounted
            .as_ref()
            .is_some_and(|m| m.listener.is_some())
    }

    /// Scripts injected into the page right now.
    pub fn scripts(&self) -> Vec<ScriptResource> {
        lock(&self.slot)
            .mounted
            .iter()
            .map(|m| ScriptResource {
                src: m.spec.script_url.clone(),
                async_load: true,
                client_id: m.spec.client_id.clone(),
            })
            .collect()
    }
}

/// A mounted widget. Dropping it unmounts.
#[derive(Debug)]
pub struct MountedWidget {
    slot: Arc<Mutex<Slot>>,
    id: u64,
    rx: oneshot::Receiver<VerificationResult>,
}

impl MountedWidget {
    /// Waits for the widget's single result, then unmounts.
    ///
    /// `timeout` of `None` waits indefinitely: the widget has no failure
    /// callback of its own.
    pub async fn wait(mut self, timeout: Option<Duration>) -> Result<VerificationResult, WidgetError> {
        let received = match timeout {
            None => (&mut self.rx).await,
            Some(after) => tokio::time::timeout(after, &mut self.rx)
                .await
                .map_err(|_| WidgetError::TimedOut(after))?,
        };
        received.map_err(|_| WidgetError::Cancelled)
    }
}

impl Drop for MountedWidget {
    fn drop(&mut self) {
        let mut slot = lock(&self.slot);
        if slot.mounted.as_ref().is_some_and(|m| m.id == self.id) {
            slot.mounted = None;
            debug!(id = self.id, "widget unmounted");
        }
    }
}
