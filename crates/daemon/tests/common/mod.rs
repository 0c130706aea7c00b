#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use phoneauth_core::model::{GenerationConfig, PolicyRequest};
use phoneauth_core::state::DemoState;
use phoneauth_daemon::service::{DemoService, DemoSettings};
use phoneauth_daemon::textgen::{TextBackend, TextGenError, TextService};
use phoneauth_daemon::widget::{WidgetSpec, DEFAULT_CLIENT_ID, DEFAULT_SCRIPT_URL};
use tokio::sync::Semaphore;

pub enum Reply {
    Text(String),
    Fail,
}

/// Backend with scripted replies. Each call blocks on `gate` until released.
pub struct ScriptedBackend {
    calls: Mutex<Vec<(String, GenerationConfig)>>,
    policy_replies: Mutex<VecDeque<Reply>>,
    insight_replies: Mutex<VecDeque<Reply>>,
    gate: Semaphore,
}

impl ScriptedBackend {
    /// Calls complete immediately.
    pub fn open() -> Arc<Self> {
        Self::with_permits(Semaphore::MAX_PERMITS)
    }

    /// Calls wait for [`ScriptedBackend::release`].
    pub fn gated() -> Arc<Self> {
        Self::with_permits(0)
    }

    fn with_permits(permits: usize) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            policy_replies: Mutex::new(VecDeque::new()),
            insight_replies: Mutex::new(VecDeque::new()),
            gate: Semaphore::new(permits),
        })
    }

    pub fn policy_reply(&self, reply: Reply) {
        self.policy_replies.lock().unwrap().push_back(reply);
    }

    pub fn insight_reply(&self, reply: Reply) {
        self.insight_replies.lock().unwrap().push_back(reply);
    }

    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub async fn wait_calls(&self, n: usize) {
        for _ in 0..200 {
            if self.call_count() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {n} backend calls, saw {}", self.call_count());
    }
}

#[async_trait]
impl TextBackend for ScriptedBackend {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, TextGenError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), *config));
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| TextGenError::EmptyResponse)?;
        permit.forget();

        let queue = if prompt.contains("Privacy Policy") {
            &self.policy_replies
        } else {
            &self.insight_replies
        };
        let reply = queue.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Text(t)) => Ok(t),
            Some(Reply::Fail) => Err(TextGenError::Api {
                status: 503,
                body: "scripted failure".into(),
            }),
            None => Ok("default reply".into()),
        }
    }
}

pub fn settings() -> DemoSettings {
    DemoSettings {
        policy_defaults: PolicyRequest {
            company_name: "SecureAuth Pro".into(),
            website_url: "https://secureauth-demo.app".into(),
        },
        widget: WidgetSpec {
            client_id: DEFAULT_CLIENT_ID.into(),
            script_url: DEFAULT_SCRIPT_URL.into(),
        },
        verification_timeout: None,
    }
}

/// Started service over `backend`.
pub fn service(backend: Arc<ScriptedBackend>) -> Arc<DemoService> {
    service_with(settings(), backend)
}

pub fn service_with(settings: DemoSettings, backend: Arc<ScriptedBackend>) -> Arc<DemoService> {
    let svc = DemoService::new(settings, TextService::new(backend));
    svc.start().unwrap();
    svc
}

pub async fn wait_until(
    svc: &DemoService,
    what: &str,
    pred: impl Fn(&DemoState) -> bool,
) -> DemoState {
    for _ in 0..200 {
        let s = svc.snapshot();
        if pred(&s) {
            return s;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}
