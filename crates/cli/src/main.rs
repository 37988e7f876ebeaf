//! `mudae-timing` -- inspect and wait on the bot's reset schedule.
//!
//! Captures the remaining minutes reported by the bot's `$tu` output,
//! prints the persisted timing record, and logs when the next roll and
//! claim resets happen. With `WAIT_FOR` set it also sleeps until that
//! reset (Ctrl-C cancels).
//!
//! # Environment variables
//!
//! | Variable          | Required | Default | Description                              |
//! |-------------------|----------|---------|------------------------------------------|
//! | `ROLL_REMAINING`  | yes      | --      | Minutes until the next roll reset        |
//! | `CLAIM_REMAINING` | yes      | --      | Minutes until the next claim reset       |
//! | `ROLL_PERIOD`     | no       | `60`    | Roll reset period in minutes             |
//! | `CLAIM_PERIOD`    | no       | `180`   | Claim reset period in minutes            |
//! | `WAIT_FOR`        | no       | --      | `roll` or `claim`: sleep until that reset |

use chrono::Utc;
use mudae_claims::sleep_until_reset;
use mudae_core::timing::{DEFAULT_CLAIM_PERIOD, DEFAULT_ROLL_PERIOD};
use mudae_core::{ResetKind, TimingConfig};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mudae_timing=info,mudae_claims=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let roll_remaining = required_minutes("ROLL_REMAINING");
    let claim_remaining = required_minutes("CLAIM_REMAINING");
    let roll_period = optional_minutes("ROLL_PERIOD", DEFAULT_ROLL_PERIOD);
    let claim_period = optional_minutes("CLAIM_PERIOD", DEFAULT_CLAIM_PERIOD);

    let now = Utc::now();
    let config = TimingConfig::new(
        roll_period,
        claim_period,
        roll_remaining,
        claim_remaining,
        now,
    )
    .unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid timing values");
        std::process::exit(1);
    });

    let record = config.to_record();
    match serde_json::to_string(&record) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::warn!(error = %e, "Failed to serialize timing record"),
    }
    match record.to_packed() {
        Ok(packed) => println!("{packed}"),
        Err(e) => tracing::warn!(error = %e, "Timing record does not fit the packed layout"),
    }

    tracing::info!(
        next_roll_min = config.next_reset(ResetKind::Roll, now),
        next_claim_min = config.next_reset(ResetKind::Claim, now),
        "Next resets",
    );

    let Some(kind) = wait_kind() else {
        return;
    };

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    if sleep_until_reset(&config, kind, &cancel).await {
        tracing::info!(?kind, "Reset reached");
    }
}

fn required_minutes(var: &str) -> i64 {
    let raw = std::env::var(var).unwrap_or_else(|_| {
        tracing::error!("{var} environment variable is required");
        std::process::exit(1);
    });
    parse_minutes(&raw).unwrap_or_else(|| {
        tracing::error!("{var} must be a whole number of minutes");
        std::process::exit(1);
    })
}

fn optional_minutes(var: &str, default: u32) -> i64 {
    let Ok(raw) = std::env::var(var) else {
        return i64::from(default);
    };
    parse_minutes(&raw).unwrap_or_else(|| {
        tracing::warn!(value = %raw, default, "{var} is not a whole number of minutes, using default");
        i64::from(default)
    })
}

fn parse_minutes(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

fn wait_kind() -> Option<ResetKind> {
    match std::env::var("WAIT_FOR").ok()?.to_lowercase().as_str() {
        "roll" => Some(ResetKind::Roll),
        "claim" => Some(ResetKind::Claim),
        other => {
            tracing::warn!(value = other, "Ignoring unknown WAIT_FOR value");
            None
        }
    }
}
