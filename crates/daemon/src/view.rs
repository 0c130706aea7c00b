//! Server-side rendering of the demo page.

use std::fmt::Write;

use phoneauth_core::view::{DemoPanel, InsightPanel, PolicyPanel, ViewModel};

use crate::widget::{ScriptResource, CONTAINER_CLASS, LISTENER_NAME};

/// Seconds between reloads while a result is outstanding.
const PENDING_REFRESH_SECS: u32 = 2;
const POLICY_PANEL_ID: &str = "policy-panel";
const PLACEHOLDER_TEXT: &str = "No policy generated yet. Click the button above to start.";

/// Everything the page template needs.
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    pub brand: &'a str,
    pub view: &'a ViewModel,
    pub scripts: &'a [ScriptResource],
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_page(page: &Page<'_>) -> String {
    let brand = escape_html(page.brand);
    let refresh = if page.view.reload_while_pending() {
        format!(r#"<meta http-equiv="refresh" content="{PENDING_REFRESH_SECS}">"#)
    } else {
        String::new()
    };
    let policy_poll = if page.view.poll_policy_in_place() {
        policy_poll_script()
    } else {
        String::new()
    };

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
{refresh}
<title>{brand}</title>
<style>{STYLE}</style>
</head>
<body>
<nav><span class="brand">{brand}</span>
<a href="#demo">Live Demo</a> <a href="#privacy">Privacy Policy</a></nav>
<main>
<section class="hero">
<h1>The Future of Phone Authentication.</h1>
<p>Integrate world-class phone verification in seconds. No more SMS costs, no more passwords.
Just seamless identity verification powered by Phone.email.</p>
<a class="button" href="#demo">Try the Live Demo</a>
{hero_form}
</section>
<section id="demo">
<h2>Experience the One-Tap Verification</h2>
<p>Once you verify, our AI security agent will explain the integrity of the session.</p>
<div class="panel">{demo}</div>
</section>
<section id="privacy">
<h2>Privacy Compliance</h2>
<p>Using third-party verification requires clear documentation.</p>
{policy_form}
<div id="{POLICY_PANEL_ID}">{policy}</div>
</section>
</main>
<footer><span class="brand">{brand}</span>
<p>Integration demo for Phone.email API.</p></footer>
{scripts}
{policy_poll}
</body>
</html>
"##,
        hero_form = policy_form(page.view, "hero"),
        demo = demo_panel(&page.view.demo, page.scripts),
        policy_form = policy_form(page.view, "section"),
        policy = policy_panel(&page.view.policy),
        scripts = widget_scripts(page.scripts),
    )
}

fn demo_panel(panel: &DemoPanel, scripts: &[ScriptResource]) -> String {
    match panel {
        DemoPanel::Widget => {
            let client_id = scripts
                .first()
                .map(|s| escape_html(&s.client_id))
                .unwrap_or_default();
            format!(
                r#"<h3>Secure Phone Verification</h3>
<p>Verify your identity instantly using Phone.email</p>
<div class="{CONTAINER_CLASS}" data-client-id="{client_id}"></div>
<p class="note">End-to-End Encrypted Verification</p>"#
            )
        }
        DemoPanel::Verified { url, insight } => {
            let url = escape_html(url);
            let insight = match insight {
                InsightPanel::Loading => r#"<div class="loading">Analyzing&hellip;</div>"#.to_string(),
                InsightPanel::Text { text } => {
                    format!(r#"<div class="prewrap">{}</div>"#, escape_html(text))
                }
                InsightPanel::Empty => r#"<div class="prewrap"></div>"#.to_string(),
            };
            format!(
                r#"<h3>Verification Successful</h3>
<form method="post" action="/actions/reset"><button type="submit">Reset</button></form>
<p>Auth Payload URL:</p>
<code>{url}</code> <a href="{url}" target="_blank" rel="noreferrer">open</a>
<h4>AI Security Audit</h4>
{insight}"#
            )
        }
    }
}

fn policy_form(view: &ViewModel, class: &str) -> String {
    let button = &view.policy_button;
    let disabled = if button.disabled { " disabled" } else { "" };
    let spinner = if button.spinning {
        r#"<span class="spin">&#8635;</span> "#
    } else {
        ""
    };
    format!(
        r#"<form class="{class}" method="post" action="/actions/policy"><button type="submit"{disabled}>{spinner}{label}</button></form>"#,
        label = escape_html(&button.label),
    )
}

fn policy_panel(panel: &PolicyPanel) -> String {
    match panel {
        PolicyPanel::Placeholder => {
            format!(r#"<div class="placeholder">{PLACEHOLDER_TEXT}</div>"#)
        }
        PolicyPanel::Document { text } => format!(
            r#"<article class="policy"><div class="badge">AI-GENERATED DOCUMENT</div>
<div class="prewrap">{}</div></article>"#,
            escape_html(text)
        ),
    }
}

/// Polls the state API and swaps in the policy panel once it resolves,
/// leaving the rest of the page (and a mounted widget) untouched.
fn policy_poll_script() -> String {
    let interval_ms = PENDING_REFRESH_SECS * 1000;
    format!(
        r#"<script>
(function poll() {{
  setTimeout(function () {{
    fetch("/api/state").then(function (r) {{ return r.json(); }}).then(function (view) {{
      if (view.policy_button.spinning) {{ return poll(); }}
      var panel = document.getElementById("{POLICY_PANEL_ID}");
      panel.textContent = "";
      var body = document.createElement("div");
      if (view.policy.panel === "document") {{
        var article = document.createElement("article");
        article.className = "policy";
        var badge = document.createElement("div");
        badge.className = "badge";
        badge.textContent = "AI-GENERATED DOCUMENT";
        body.className = "prewrap";
        body.textContent = view.policy.text;
        article.appendChild(badge);
        article.appendChild(body);
        panel.appendChild(article);
      }} else {{
        body.className = "placeholder";
        body.textContent = "{PLACEHOLDER_TEXT}";
        panel.appendChild(body);
      }}
      document.querySelectorAll('form[action="/actions/policy"] button').forEach(function (b) {{
        b.disabled = false;
        b.textContent = view.policy_button.label;
      }});
    }}, poll);
  }}, {interval_ms});
}})();
</script>"#
    )
}

/// Listener shim plus the injected widget scripts. Empty when nothing is mounted.
fn widget_scripts(scripts: &[ScriptResource]) -> String {
    if scripts.is_empty() {
        return String::new();
    }
    let mut out = format!(
        r#"<script>
window.{LISTENER_NAME} = function (userObj) {{
  fetch("/api/verification", {{
    method: "POST",
    headers: {{ "Content-Type": "application/json" }},
    body: JSON.stringify({{ user_json_url: userObj.user_json_url }})
  }}).then(function () {{ window.location.reload(); }});
}};
</script>
"#
    );
    for s in scripts {
        let _ = writeln!(
            out,
            r#"<script src="{}"{}></script>"#,
            escape_html(&s.src),
            if s.async_load { " async" } else { "" }
        );
    }
    out
}

const STYLE: &str = "body{margin:0;font-family:system-ui,sans-serif;background:#020617;color:#f1f5f9}\
nav,footer{padding:1rem 2rem;border-color:#1e293b}\
section{max-width:64rem;margin:0 auto;padding:3rem 1rem}\
.brand{font-weight:700}\
.panel,.policy{border:1px solid #334155;border-radius:1rem;padding:2rem}\
.placeholder{border:2px dashed #1e293b;border-radius:1.5rem;padding:4rem;text-align:center;color:#475569}\
.prewrap{white-space:pre-wrap}\
.badge{font-size:10px;font-weight:700;color:#60a5fa}\
button:disabled{opacity:.5}\
a{color:#93c5fd}";

#[cfg(test)]
mod tests {
    use super::*;
    use phoneauth_core::view::PolicyButton;

    fn view(demo: DemoPanel, policy: PolicyPanel, generating: bool) -> ViewModel {
        ViewModel {
            demo,
            policy,
            policy_button: PolicyButton {
                label: "Generate Privacy Policy".into(),
                disabled: generating,
                spinning: generating,
            },
        }
    }

    fn script() -> ScriptResource {
        ScriptResource {
            src: "https://www.phone.email/sign_in_button_v1.js".into(),
            async_load: true,
            client_id: "123".into(),
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<b>"x" & 'y'</b>"#),
            "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn widget_view_embeds_script_and_listener() {
        let v = view(DemoPanel::Widget, PolicyPanel::Placeholder, false);
        let scripts = [script()];
        let html = render_page(&Page {
            brand: "SecureAuth Pro",
            view: &v,
            scripts: &scripts,
        });
        assert!(html.contains(r#"<script src="https://www.phone.email/sign_in_button_v1.js" async></script>"#));
        assert!(html.contains("window.phoneEmailListener"));
        assert!(html.contains(r#"class="pe_signin_button" data-client-id="123""#));
        assert!(html.contains("No policy generated yet"));
        assert!(!html.contains("http-equiv=\"refresh\""));
    }

    #[test]
    fn verified_view_shows_url_without_widget() {
        let v = view(
            DemoPanel::Verified {
                url: "https://phone.email/abc".into(),
                insight: InsightPanel::Text {
                    text: "<safer>".into(),
                },
            },
            PolicyPanel::Placeholder,
            false,
        );
        let html = render_page(&Page {
            brand: "SecureAuth Pro",
            view: &v,
            scripts: &[],
        });
        assert!(html.contains("<code>https://phone.email/abc</code>"));
        assert!(html.contains("&lt;safer&gt;"));
        assert!(!html.contains("pe_signin_button"));
        assert!(!html.contains("phoneEmailListener"));
    }

    #[test]
    fn policy_pending_with_widget_polls_instead_of_reloading() {
        let v = view(DemoPanel::Widget, PolicyPanel::Placeholder, true);
        let scripts = [script()];
        let html = render_page(&Page {
            brand: "SecureAuth Pro",
            view: &v,
            scripts: &scripts,
        });
        assert!(html.contains(r#"class="pe_signin_button""#));
        assert!(html.contains("sign_in_button_v1.js"));
        assert!(!html.contains("http-equiv=\"refresh\""));
        assert!(html.contains(r#"fetch("/api/state")"#));
        assert!(html.contains(r#"<div id="policy-panel">"#));
        assert!(html.contains(r#"<button type="submit" disabled>"#));
    }

    #[test]
    fn settled_page_neither_reloads_nor_polls() {
        let v = view(DemoPanel::Widget, PolicyPanel::Placeholder, false);
        let html = render_page(&Page {
            brand: "B",
            view: &v,
            scripts: &[script()],
        });
        assert!(!html.contains("http-equiv"));
        assert!(!html.contains("/api/state"));
    }

    #[test]
    fn pending_view_refreshes_and_disables_button() {
        let v = view(
            DemoPanel::Verified {
                url: "u".into(),
                insight: InsightPanel::Loading,
            },
            PolicyPanel::Document {
                text: "# Privacy Policy".into(),
            },
            true,
        );
        let html = render_page(&Page {
            brand: "B",
            view: &v,
            scripts: &[],
        });
        assert!(html.contains(r#"<meta http-equiv="refresh" content="2">"#));
        assert!(html.contains(r#"<button type="submit" disabled>"#));
        assert!(html.contains("# Privacy Policy"));
    }
}
