use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use phoneauth_core::api::GeneratePolicyRequest;
use phoneauth_core::model::{PolicyRequest, VerificationResult};
use phoneauth_core::state::{DemoState, TransitionError};
use phoneauth_core::view::ViewModel;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::DaemonConfig;
use crate::lock;
use crate::textgen::TextService;
use crate::widget::{ScriptResource, WidgetError, WidgetHost, WidgetSpec};

/// Fixed inputs of the demo.
#[derive(Debug, Clone)]
pub struct DemoSettings {
    pub policy_defaults: PolicyRequest,
    pub widget: WidgetSpec,
    /// `None` waits on the widget forever.
    pub verification_timeout: Option<Duration>,
}

impl DemoSettings {
    pub fn from_config(config: &DaemonConfig) -> Self {
        Self {
            policy_defaults: PolicyRequest {
                company_name: config.demo.company_name.clone(),
                website_url: config.demo.website_url.clone(),
            },
            widget: config.widget_spec(),
            verification_timeout: config.widget_timeout(),
        }
    }
}

#[derive(Default)]
struct Tasks {
    widget: Option<JoinHandle<()>>,
    insight: Option<JoinHandle<()>>,
    policy: Option<JoinHandle<()>>,
}

/// Owns the demo state and drives its asynchronous transitions.
///
/// Every asynchronous result is applied under the state lock in one step; the
/// lock is never held across an await.
pub struct DemoService {
    settings: DemoSettings,
    text: TextService,
    widget: WidgetHost,
    state: Mutex<DemoState>,
    tasks: Mutex<Tasks>,
}

impl DemoService {
    pub fn new(settings: DemoSettings, text: TextService) -> Arc<Self> {
        Arc::new(Self {
            settings,
            text,
            widget: WidgetHost::new(),
            state: Mutex::new(DemoState::new()),
            tasks: Mutex::new(Tasks::default()),
        })
    }

    /// Mounts the verification widget. Call once after construction.
    pub fn start(self: &Arc<Self>) -> Result<(), WidgetError> {
        self.mount_widget()
    }

    /// Aborts outstanding work and unmounts the widget. Results that were
    /// still in flight are dropped and their loading flags cleared, as if the
    /// requests had failed.
    pub fn shutdown(&self) {
        self.widget.teardown();
        let (widget, insight, policy) = {
            let mut tasks = lock(&self.tasks);
            (tasks.widget.take(), tasks.insight.take(), tasks.policy.take())
        };
        for handle in [widget, insight, policy].into_iter().flatten() {
            handle.abort();
        }

        let mut state = lock(&self.state);
        if let Some(epoch) = state.epoch() {
            state.complete_insight(epoch, None);
        }
        state.complete_policy(None);
        info!("demo service stopped");
    }

    pub fn settings(&self) -> &DemoSettings {
        &self.settings
    }

    pub fn snapshot(&self) -> DemoState {
        lock(&self.state).clone()
    }

    pub fn view(&self) -> ViewModel {
        ViewModel::from_state(&lock(&self.state))
    }

    /// Scripts the page must embed.
    pub fn scripts(&self) -> Vec<ScriptResource> {
        self.widget.scripts()
    }

    /// Forwards the widget's listener payload.
    pub fn deliver_verification(&self, url: &str) -> Result<(), WidgetError> {
        self.widget.deliver(VerificationResult::new(url))
    }

    /// Verified -> Idle. Drops the insight (and any request for it) and mounts
    /// a fresh widget. Returns false when there was nothing to reset.
    pub fn reset(self: &Arc<Self>) -> Result<bool, WidgetError> {
        let cleared = lock(&self.state).reset();
        if let Some(handle) = lock(&self.tasks).insight.take() {
            handle.abort();
        }
        if !cleared {
            return Ok(false);
        }
        info!("verification reset");
        match self.mount_widget() {
            Ok(()) | Err(WidgetError::AlreadyMounted) => Ok(true),
            Err(e) => Err(e),
        }
    }

    /// Starts a policy generation. Fails while one is outstanding.
    pub fn generate_policy(
        self: &Arc<Self>,
        req: GeneratePolicyRequest,
    ) -> Result<PolicyRequest, TransitionError> {
        let request = self.policy_request(req);
        lock(&self.state).begin_policy()?;
        info!(company = %request.company_name, website = %request.website_url, "policy generation started");

        let weak = Arc::downgrade(self);
        let text = self.text.clone();
        let job = request.clone();
        let handle = tokio::spawn(async move {
            let outcome = match text.generate_policy(&job).await {
                Ok(doc) => Some(doc),
                Err(e) => {
                    warn!(error = %e, "policy generation failed");
                    None
                }
            };
            if let Some(svc) = weak.upgrade() {
                lock(&svc.state).complete_policy(outcome);
            }
        });
        lock(&self.tasks).policy = Some(handle);
        Ok(request)
    }

    fn policy_request(&self, req: GeneratePolicyRequest) -> PolicyRequest {
        let defaults = &self.settings.policy_defaults;
        let pick = |v: Option<String>, default: &String| {
            v.map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| default.clone())
        };
        PolicyRequest {
            company_name: pick(req.company_name, &defaults.company_name),
            website_url: pick(req.website_url, &defaults.website_url),
        }
    }

    fn mount_widget(self: &Arc<Self>) -> Result<(), WidgetError> {
        let mounted = self.widget.mount(self.settings.widget.clone())?;
        let weak = Arc::downgrade(self);
        let timeout = self.settings.verification_timeout;
        let handle = tokio::spawn(async move {
            let outcome = mounted.wait(timeout).await;
            let Some(svc) = weak.upgrade() else {
                return;
            };
            match outcome {
                Ok(result) => svc.on_verified(result),
                Err(WidgetError::TimedOut(after)) => {
                    warn!(?after, "no verification callback; remounting widget");
                    if let Err(e) = svc.mount_widget() {
                        warn!(error = %e, "remount failed");
                    }
                }
                Err(e) => debug!(error = %e, "widget wait ended"),
            }
        });
        lock(&self.tasks).widget = Some(handle);
        Ok(())
    }

    fn on_verified(self: &Arc<Self>, result: VerificationResult) {
        let epoch = match lock(&self.state).verify(result.clone()) {
            Ok(epoch) => epoch,
            Err(e) => {
                warn!(error = %e, "ignoring verification callback");
                return;
            }
        };
        info!(url = %result.url, epoch, "phone verified");

        let weak: Weak<Self> = Arc::downgrade(self);
        let text = self.text.clone();
        let handle = tokio::spawn(async move {
            let outcome = match text.get_insight(&result).await {
                Ok(insight) => Some(insight),
                Err(e) => {
                    warn!(error = %e, "insight generation failed");
                    None
                }
            };
            if let Some(svc) = weak.upgrade() {
                if !lock(&svc.state).complete_insight(epoch, outcome) {
                    debug!(epoch, "discarding stale insight");
                }
            }
        });
        if let Some(old) = lock(&self.tasks).insight.replace(handle) {
            old.abort();
        }
    }
}
