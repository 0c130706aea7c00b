use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use phoneauth_core::api::{AcceptedResponse, GeneratePolicyRequest, ListenerPayload};
use phoneauth_core::view::ViewModel;

#[derive(Parser, Debug)]
#[command(name = "phoneauthctl", about = "Drive a running phoneauth-daemon")]
struct Args {
    /// Daemon base URL.
    #[arg(long, global = true, default_value = "http://127.0.0.1:3000")]
    daemon: String,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print what the page currently shows.
    State,
    /// Act as the widget: report a completed verification.
    Verify {
        #[arg(long)]
        url: String,
    },
    /// Clear the verification and show the widget again.
    Reset,
    /// Generate a privacy policy.
    Policy {
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        website: Option<String>,
        /// Poll until the request resolves and print the result.
        #[arg(long)]
        wait: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let client = reqwest::Client::new();
    let base = args.daemon.trim_end_matches('/');

    match args.cmd {
        Cmd::State => {
            let view = fetch_state(&client, base).await?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Cmd::Verify { url } => {
            let resp: AcceptedResponse = client
                .post(format!("{base}/api/verification"))
                .json(&ListenerPayload { user_json_url: url })
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            println!("{}", serde_json::to_string_pretty(&resp)?);
        }
        Cmd::Reset => {
            let view: ViewModel = client
                .post(format!("{base}/api/verification/reset"))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Cmd::Policy {
            company,
            website,
            wait,
        } => {
            let req = GeneratePolicyRequest {
                company_name: company,
                website_url: website,
            };
            let resp: AcceptedResponse = client
                .post(format!("{base}/api/policy"))
                .json(&req)
                .send()
                .await?
                .error_for_status()
                .context("policy request rejected (one may already be outstanding)")?
                .json()
                .await?;
            if !wait {
                println!("{}", serde_json::to_string_pretty(&resp)?);
                return Ok(());
            }
            loop {
                tokio::time::sleep(Duration::from_millis(500)).await;
                let view = fetch_state(&client, base).await?;
                if !view.policy_button.spinning {
                    println!("{}", serde_json::to_string_pretty(&view.policy)?);
                    break;
                }
            }
        }
    }

    Ok(())
}

async fn fetch_state(client: &reqwest::Client, base: &str) -> anyhow::Result<ViewModel> {
    let view = client
        .get(format!("{base}/api/state"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(view)
}
