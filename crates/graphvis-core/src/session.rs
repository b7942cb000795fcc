//! Interactive session launch.
//!
//! The project's `origin` remote tells which hosted project to open; both the
//! HTTPS and the SSH remote forms are recognised.

use crate::command::capture_stdout;
use crate::error::{GraphVisError, Result};
use regex::Regex;
use std::path::Path;
use std::process::{Command, Stdio};

/// Launch URLs for every remote pattern that matches, HTTPS form first.
pub fn session_urls(remote: &str, host: &str) -> Result<Vec<String>> {
    let escaped = regex::escape(host);
    let patterns = [
        format!(r"^https://{escaped}/gitlab/(.*)\.git"),
        format!(r"^git@{escaped}:(.*)\.git"),
    ];

    let mut urls = Vec::new();
    for pattern in &patterns {
        let re = Regex::new(pattern)
            .map_err(|e| GraphVisError::Config(format!("invalid session host pattern: {e}")))?;
        if let Some(project) = re.captures(remote).and_then(|c| c.get(1)) {
            urls.push(format!(
                "https://{host}/projects/{}/sessions/new?autostart=1&branch=master",
                project.as_str()
            ));
        }
    }
    Ok(urls)
}

/// The single URL to open: the first match, with a warning when several match.
pub fn select_session_url(remote: &str, host: &str) -> Result<String> {
    let mut urls = session_urls(remote, host)?;
    match urls.len() {
        0 => Err(GraphVisError::NoSessionUrl(remote.to_string())),
        1 => Ok(urls.remove(0)),
        _ => {
            tracing::warn!(?urls, "using first of many session URLs");
            Ok(urls.remove(0))
        }
    }
}

/// `git remote get-url origin` in `project_dir`.
pub fn git_remote_url(project_dir: &Path) -> Result<String> {
    let out = capture_stdout(
        Command::new("git")
            .arg("-C")
            .arg(project_dir)
            .args(["remote", "get-url", "origin"]),
    )?;
    Ok(out.trim().to_string())
}

/// Open a URL or file in the user's browser.
///
/// `$BROWSER` wins when set; otherwise the platform opener is used.
pub fn open_in_browser(target: &str) -> Result<()> {
    let mut cmd = match std::env::var("BROWSER").ok().filter(|b| !b.trim().is_empty()) {
        Some(browser) => Command::new(browser),
        None if cfg!(target_os = "macos") => Command::new("open"),
        None if cfg!(target_os = "windows") => {
            let mut c = Command::new("cmd");
            c.args(["/C", "start", ""]);
            c
        }
        None => Command::new("xdg-open"),
    };
    cmd.arg(target)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    tracing::debug!(%target, program = ?cmd.get_program(), "opening in browser");
    // the browser may keep running; do not wait for it
    cmd.spawn().map_err(|e| GraphVisError::CommandFailed {
        program: cmd.get_program().to_string_lossy().into_owned(),
        status: "not started".to_string(),
        stderr: e.to_string(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: &str = "renkulab.io";

    #[test]
    fn https_remote() -> Result<()> {
        assert_eq!(
            select_session_url("https://renkulab.io/gitlab/group/proj.git", HOST)?,
            "https://renkulab.io/projects/group/proj/sessions/new?autostart=1&branch=master"
        );
        Ok(())
    }

    #[test]
    fn ssh_remote() -> Result<()> {
        assert_eq!(
            select_session_url("git@renkulab.io:group/sub/proj.git", HOST)?,
            "https://renkulab.io/projects/group/sub/proj/sessions/new?autostart=1&branch=master"
        );
        Ok(())
    }

    #[test]
    fn foreign_remote_has_no_session() {
        let err = select_session_url("https://github.com/group/proj.git", HOST).unwrap_err();
        assert!(matches!(err, GraphVisError::NoSessionUrl(r) if r.contains("github.com")));
    }

    #[test]
    fn host_dots_are_literal() -> Result<()> {
        assert!(session_urls("https://renkulabxio/gitlab/g/p.git", HOST)?.is_empty());
        Ok(())
    }

    #[test]
    fn custom_host() -> Result<()> {
        let urls = session_urls("git@gitlab.example.org:team/p.git", "gitlab.example.org")?;
        assert_eq!(
            urls,
            vec!["https://gitlab.example.org/projects/team/p/sessions/new?autostart=1&branch=master"]
        );
        Ok(())
    }
}
