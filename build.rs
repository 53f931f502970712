use std::process::Command;

fn git_short_sha() -> Option<String> {
    if let Ok(sha) = std::env::var("AMBER_MONITOR_GIT_SHA")
        && !sha.trim().is_empty()
    {
        return Some(sha.trim().to_string());
    }
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!sha.is_empty()).then_some(sha)
}

fn main() {
    let package = env!("CARGO_PKG_VERSION");

    // Release builds report the bare package version; anything else gets
    // the commit as build metadata
    let release = std::env::var("AMBER_MONITOR_RELEASE")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let version = match (release, git_short_sha()) {
        (false, Some(sha)) => format!("{}+{}", package, sha),
        _ => package.to_string(),
    };

    // Used in --version and the API User-Agent
    println!("cargo:rustc-env=APP_VERSION={}", version);

    println!("cargo:rerun-if-env-changed=AMBER_MONITOR_RELEASE");
    println!("cargo:rerun-if-env-changed=AMBER_MONITOR_GIT_SHA");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
