use std::path::Path;
use std::process::Command;

use anyhow::{anyhow, Context, Result};

/// Initialize a minimal git repo fixture with one commit.
pub fn init_git_repo(dir: &Path) -> Result<()> {
    run(dir, &["git", "init"])?;
    run(dir, &["git", "config", "user.email", "prgate@example.com"])?;
    run(dir, &["git", "config", "user.name", "prgate"])?;
    run(dir, &["git", "config", "commit.gpgsign", "false"])?;
    std::fs::write(dir.join("README.md"), "fixture")?;
    run(dir, &["git", "add", "."])?;
    run(dir, &["git", "commit", "-m", "init"])?;
    Ok(())
}

/// Write `file` and commit it on top of HEAD.
pub fn commit_file(dir: &Path, file: &str, contents: &str, message: &str) -> Result<()> {
    std::fs::write(dir.join(file), contents)?;
    run(dir, &["git", "add", file])?;
    run(dir, &["git", "commit", "-m", message])?;
    Ok(())
}

fn run(dir: &Path, args: &[&str]) -> Result<()> {
    let mut cmd = Command::new(args[0]);
    cmd.args(&args[1..]).current_dir(dir);
    let out = cmd.output().with_context(|| format!("run {:?}", args))?;
    if !out.status.success() {
        return Err(anyhow!("command failed: {:?}\nstdout:{}\nstderr:{}",
            args,
            String::from_utf8_lossy(&out.stdout),
            String::from_utf8_lossy(&out.stderr)
        ));
    }
    Ok(())
}
