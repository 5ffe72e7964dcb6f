use std::{fs, process::Command, time::SystemTime};

fn main() {
  let now = SystemTime::now()
    .duration_since(SystemTime::UNIX_EPOCH)
    .map(|d| d.as_millis())
    .unwrap_or(0);
  println!("cargo:rustc-env=BUILD_TIME={}", now);
  println!("cargo:rerun-if-changed=.git/HEAD");

  let branch = git(&["rev-parse", "--abbrev-ref", "HEAD"]).or_else(branch_from_head);
  let commit = git(&["rev-parse", "--short=7", "HEAD"]);

  println!(
    "cargo:rustc-env=GIT_BRANCH={}",
    branch.as_deref().unwrap_or("unknown")
  );
  println!(
    "cargo:rustc-env=GIT_COMMIT_SHORT={}",
    commit.as_deref().unwrap_or("unknown")
  );
}

fn git(args: &[&str]) -> Option<String> {
  let output = Command::new("git").args(args).output().ok()?;
  if !output.status.success() {
    return None;
  }
  let out = String::from_utf8_lossy(&output.stdout).trim().to_string();
  (!out.is_empty()).then_some(out)
}

// Works without a git binary, e.g. inside minimal build containers.
fn branch_from_head() -> Option<String> {
  let head = fs::read_to_string(".git/HEAD").ok()?;
  let reference = head.strip_prefix("ref: ")?.trim();
  reference.rsplit('/').next().map(str::to_string)
}
