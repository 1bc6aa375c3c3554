//! buspolicy-check
//!
//! Loads one or more policy files (composed in order), then reports whether
//! a uid may connect and which rules its compiled policy keeps.
//!
//! Usage: `buspolicy-check <uid> <policy.yaml>...`

use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use buspolicy_core::Result;
use buspolicy_engine::{config, ClientPolicy};

const USAGE: &str = "usage: buspolicy-check <uid> <policy.yaml>...";

fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let mut args = std::env::args().skip(1);
    let Some(uid) = args.next().and_then(|s| s.parse::<u32>().ok()) else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };
    let paths: Vec<String> = args.collect();
    if paths.is_empty() {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    }

    match run(uid, &paths) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!(code = e.code().as_str(), error = %e, "policy check failed");
            ExitCode::from(2)
        }
    }
}

fn run(uid: u32, paths: &[String]) -> Result<bool> {
    let loaded = config::load_policy_files(paths)?;
    let store = &loaded.store;

    tracing::info!(
        files = paths.len(),
        default = store.default_rules().len(),
        mandatory = store.mandatory_rules().len(),
        uid_buckets = store.uid_bucket_count(),
        gid_buckets = store.gid_bucket_count(),
        "policy loaded"
    );

    let allowed = store.allow_user(&loaded.users, uid);
    println!("uid {uid}: {}", if allowed { "may connect" } else { "rejected" });
    if !allowed {
        return Ok(false);
    }

    let policy = ClientPolicy::compile(store, Some(uid), &loaded.users)?;
    for rule in policy.rules() {
        println!("  {rule}");
    }
    Ok(true)
}
