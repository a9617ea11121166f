use std::path::Path;
use std::process::Command;

const SHA_VAR: &str = "TWAIN_BUILD_SHA";

fn git(repo: &Path, args: &[&str]) -> Option<String> {
    let out = Command::new("git").arg("-C").arg(repo).args(args).output().ok()?;
    if !out.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&out.stdout).trim().to_string())
}

/// Short commit, with a `-dirty` suffix when tracked files have local edits.
fn describe(repo: &Path) -> Option<String> {
    let sha = git(repo, &["rev-parse", "--short", "HEAD"]).filter(|s| !s.is_empty())?;
    let dirty = git(repo, &["status", "--porcelain", "--untracked-files=no"])
        .is_some_and(|s| !s.is_empty());
    Some(if dirty { format!("{sha}-dirty") } else { sha })
}

fn main() {
    println!("cargo:rerun-if-env-changed={SHA_VAR}");

    // Source tarballs have no .git; packagers pass the revision in instead.
    let sha = match std::env::var(SHA_VAR) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => {
            let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into());
            let repo_root = Path::new(&manifest_dir).join("..");
            println!("cargo:rerun-if-changed={}", repo_root.join(".git/HEAD").display());
            println!("cargo:rerun-if-changed={}", repo_root.join(".git/index").display());
            describe(&repo_root).unwrap_or_else(|| "unknown".to_string())
        }
    };

    println!("cargo:rustc-env={SHA_VAR}={sha}");
}
