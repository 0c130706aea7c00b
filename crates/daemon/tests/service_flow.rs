//! End-to-end flows through the demo service with a scripted backend.

mod common;

use std::time::Duration;

use common::{service, service_with, settings, wait_until, Reply, ScriptedBackend};
use phoneauth_core::api::GeneratePolicyRequest;
use phoneauth_core::prompts::{insight_prompt, policy_prompt};
use phoneauth_core::state::{TransitionError, VerificationTrack};
use phoneauth_core::view::{DemoPanel, InsightPanel, PolicyPanel};
use phoneauth_daemon::widget::WidgetError;

#[tokio::test]
async fn start_mounts_widget() {
    let svc = service(ScriptedBackend::open());
    let scripts = svc.scripts();
    assert_eq!(scripts.len(), 1);
    assert_eq!(
        scripts[0].src,
        "https://www.phone.email/sign_in_button_v1.js"
    );
    assert_eq!(svc.view().demo, DemoPanel::Widget);
}

#[tokio::test]
async fn verification_shows_url_and_fetches_one_insight() {
    let backend = ScriptedBackend::open();
    backend.insight_reply(Reply::Text("OTP-less is safer.".into()));
    let svc = service(backend.clone());

    svc.deliver_verification("https://phone.email/abc").unwrap();
    wait_until(&svc, "insight", |s| s.insight().is_some()).await;

    assert_eq!(
        svc.view().demo,
        DemoPanel::Verified {
            url: "https://phone.email/abc".into(),
            insight: InsightPanel::Text {
                text: "OTP-less is safer.".into()
            },
        }
    );
    assert_eq!(backend.prompts(), vec![insight_prompt("https://phone.email/abc")]);
    // Widget is gone while verified.
    assert!(svc.scripts().is_empty());
    assert_eq!(
        svc.deliver_verification("https://phone.email/other"),
        Err(WidgetError::NoListener)
    );
}

#[tokio::test]
async fn delivered_url_is_shown_verbatim() {
    let svc = service(ScriptedBackend::open());
    let url = " https://phone.email/u/ABC?token=a%20b ";

    svc.deliver_verification(url).unwrap();
    let s = wait_until(&svc, "verified", |s| s.verification_result().is_some()).await;
    assert_eq!(s.verification_result().unwrap().url, url);
    match svc.view().demo {
        DemoPanel::Verified { url: shown, .. } => assert_eq!(shown, url),
        other => panic!("unexpected panel {other:?}"),
    }
}

#[tokio::test]
async fn insight_loading_flag_follows_request() {
    let backend = ScriptedBackend::gated();
    let svc = service(backend.clone());

    svc.deliver_verification("https://phone.email/abc").unwrap();
    let s = wait_until(&svc, "verified", |s| s.verification_result().is_some()).await;
    assert!(s.is_analyzing());
    assert!(svc.view().is_pending());

    backend.release(1);
    let s = wait_until(&svc, "insight settled", |s| !s.is_analyzing()).await;
    assert_eq!(s.insight().unwrap().text, "default reply");
}

#[tokio::test]
async fn insight_failure_degrades_to_empty() {
    let backend = ScriptedBackend::open();
    backend.insight_reply(Reply::Fail);
    let svc = service(backend);

    svc.deliver_verification("https://phone.email/abc").unwrap();
    let s = wait_until(&svc, "insight settled", |s| {
        s.verification_result().is_some() && !s.is_analyzing()
    })
    .await;
    assert!(s.insight().is_none());
    match svc.view().demo {
        DemoPanel::Verified { url, insight } => {
            assert_eq!(url, "https://phone.email/abc");
            assert_eq!(insight, InsightPanel::Empty);
        }
        other => panic!("unexpected panel {other:?}"),
    }
}

#[tokio::test]
async fn reset_clears_and_remounts() {
    let backend = ScriptedBackend::open();
    let svc = service(backend.clone());

    svc.deliver_verification("https://phone.email/abc").unwrap();
    wait_until(&svc, "insight", |s| s.insight().is_some()).await;

    assert!(svc.reset().unwrap());
    let s = svc.snapshot();
    assert_eq!(s.verification, VerificationTrack::Idle);
    assert!(s.insight().is_none());
    assert_eq!(svc.view().demo, DemoPanel::Widget);
    assert_eq!(svc.scripts().len(), 1);

    // Reset while idle changes nothing.
    assert!(!svc.reset().unwrap());

    svc.deliver_verification("https://phone.email/second").unwrap();
    let s = wait_until(&svc, "second insight", |s| s.insight().is_some()).await;
    assert_eq!(s.verification_result().unwrap().url, "https://phone.email/second");
    assert_eq!(backend.call_count(), 2);
}

#[tokio::test]
async fn reset_drops_outstanding_insight() {
    let backend = ScriptedBackend::gated();
    backend.insight_reply(Reply::Text("late".into()));
    let svc = service(backend.clone());

    svc.deliver_verification("https://phone.email/abc").unwrap();
    backend.wait_calls(1).await;
    svc.reset().unwrap();

    backend.release(1);
    tokio::time::sleep(Duration::from_millis(50)).await;
    let s = svc.snapshot();
    assert_eq!(s.verification, VerificationTrack::Idle);
    assert!(s.insight().is_none());
}

#[tokio::test]
async fn policy_scenario_displays_backend_text_verbatim() {
    let backend = ScriptedBackend::open();
    backend.policy_reply(Reply::Text("# Privacy Policy...".into()));
    let svc = service(backend.clone());

    let req = svc
        .generate_policy(GeneratePolicyRequest {
            company_name: Some("Acme".into()),
            website_url: Some("https://acme.example".into()),
        })
        .unwrap();
    assert_eq!(req.company_name, "Acme");

    wait_until(&svc, "policy", |s| !s.is_generating_policy()).await;
    assert_eq!(
        svc.view().policy,
        PolicyPanel::Document {
            text: "# Privacy Policy...".into()
        }
    );
    assert_eq!(backend.prompts(), vec![policy_prompt("Acme", "https://acme.example")]);
}

#[tokio::test]
async fn policy_defaults_come_from_settings() {
    let backend = ScriptedBackend::open();
    let svc = service(backend.clone());
    svc.generate_policy(GeneratePolicyRequest {
        company_name: Some("  ".into()),
        website_url: None,
    })
    .unwrap();
    backend.wait_calls(1).await;
    assert_eq!(
        backend.prompts()[0],
        policy_prompt("SecureAuth Pro", "https://secureauth-demo.app")
    );
}

#[tokio::test]
async fn trigger_disabled_while_policy_outstanding() {
    let backend = ScriptedBackend::gated();
    backend.policy_reply(Reply::Text("v1".into()));
    let svc = service(backend.clone());

    svc.generate_policy(GeneratePolicyRequest::default()).unwrap();
    let view = svc.view();
    assert!(view.policy_button.disabled);
    assert!(view.policy_button.spinning);
    assert_eq!(
        svc.generate_policy(GeneratePolicyRequest::default()),
        Err(TransitionError::PolicyInFlight)
    );

    backend.release(1);
    wait_until(&svc, "policy", |s| !s.is_generating_policy()).await;
    let view = svc.view();
    assert!(!view.policy_button.disabled);
    assert_eq!(view.policy_button.label, "Regenerate Policy");
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn policy_failure_keeps_previous_and_fabricates_nothing() {
    let backend = ScriptedBackend::open();
    backend.policy_reply(Reply::Fail);
    backend.policy_reply(Reply::Text("v1".into()));
    backend.policy_reply(Reply::Fail);
    let svc = service(backend);

    svc.generate_policy(GeneratePolicyRequest::default()).unwrap();
    let s = wait_until(&svc, "first", |s| !s.is_generating_policy()).await;
    assert!(s.policy().is_none());
    assert_eq!(svc.view().policy, PolicyPanel::Placeholder);

    svc.generate_policy(GeneratePolicyRequest::default()).unwrap();
    wait_until(&svc, "second", |s| !s.is_generating_policy()).await;
    svc.generate_policy(GeneratePolicyRequest::default()).unwrap();
    let s = wait_until(&svc, "third", |s| !s.is_generating_policy()).await;
    assert_eq!(s.policy().unwrap().text, "v1");
}

#[tokio::test]
async fn regeneration_with_same_output_is_idempotent() {
    let backend = ScriptedBackend::open();
    backend.policy_reply(Reply::Text("same".into()));
    backend.policy_reply(Reply::Text("same".into()));
    let svc = service(backend);

    svc.generate_policy(GeneratePolicyRequest::default()).unwrap();
    wait_until(&svc, "first", |s| s.policy().is_some() && !s.is_generating_policy()).await;
    let first = svc.view();
    svc.generate_policy(GeneratePolicyRequest::default()).unwrap();
    wait_until(&svc, "second", |s| !s.is_generating_policy()).await;
    assert_eq!(svc.view(), first);
}

#[tokio::test]
async fn widget_timeout_remounts() {
    let mut s = settings();
    s.verification_timeout = Some(Duration::from_millis(30));
    let svc = service_with(s, ScriptedBackend::open());

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(svc.scripts().len(), 1);
    svc.deliver_verification("https://phone.email/late").unwrap();
    let s = wait_until(&svc, "verified", |s| s.verification_result().is_some()).await;
    assert_eq!(s.verification_result().unwrap().url, "https://phone.email/late");
}

#[tokio::test]
async fn shutdown_unmounts_widget_and_drops_results() {
    let backend = ScriptedBackend::gated();
    let svc = service(backend.clone());
    svc.generate_policy(GeneratePolicyRequest::default()).unwrap();
    backend.wait_calls(1).await;

    svc.shutdown();
    for _ in 0..100 {
        if svc.scripts().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(svc.scripts().is_empty());
    assert!(svc.deliver_verification("https://phone.email/abc").is_err());

    // Nothing is left spinning.
    assert!(!svc.snapshot().is_generating_policy());
    assert!(!svc.view().policy_button.disabled);
    assert!(!svc.view().is_pending());

    backend.release(1);
    tokio::time::sleep(Duration::from_millis(30)).await;
    // The aborted request never lands.
    assert!(svc.snapshot().policy().is_none());
}

#[tokio::test]
async fn shutdown_settles_pending_insight_and_keeps_previous_policy() {
    let backend = ScriptedBackend::gated();
    backend.policy_reply(Reply::Text("# Policy v1".into()));
    let svc = service(backend.clone());

    svc.generate_policy(GeneratePolicyRequest::default()).unwrap();
    backend.release(1);
    wait_until(&svc, "first policy", |s| s.policy().is_some()).await;

    svc.generate_policy(GeneratePolicyRequest::default()).unwrap();
    svc.deliver_verification("https://phone.email/abc").unwrap();
    let s = wait_until(&svc, "verified", |s| s.verification_result().is_some()).await;
    assert!(s.is_analyzing() && s.is_generating_policy());

    svc.shutdown();
    let s = svc.snapshot();
    assert!(!s.is_analyzing());
    assert!(!s.is_generating_policy());
    assert_eq!(s.policy().unwrap().text, "# Policy v1");
    assert_eq!(s.verification_result().unwrap().url, "https://phone.email/abc");
}
