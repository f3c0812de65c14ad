use std::env;
use std::process::Command;

/// Stdout of a git command run from the crate directory, if it succeeded.
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    Some(text.trim().to_string())
}

/// Short commit hash, suffixed with `-dirty` when tracked files are modified.
fn commit_label() -> String {
    let Some(hash) = git(&["rev-parse", "--short=7", "HEAD"]) else {
        return "unknown".to_string();
    };
    match git(&["status", "--porcelain", "--untracked-files=no"]) {
        Some(changes) if !changes.is_empty() => format!("{hash}-dirty"),
        _ => hash,
    }
}

fn main() {
    for path in ["../../.git/HEAD", "../../.git/refs/heads", "../../.git/index"] {
        println!("cargo:rerun-if-changed={path}");
    }

    let env_or_unknown = |key: &str| env::var(key).unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=GIT_COMMIT_HASH={}", commit_label());
    println!("cargo:rustc-env=TARGET={}", env_or_unknown("TARGET"));
    println!("cargo:rustc-env=BUILD_PROFILE={}", env_or_unknown("PROFILE"));
}
