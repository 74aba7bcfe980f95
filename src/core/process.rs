use biliget_core::fs_paths::{AppPaths, DesktopPaths};

fn enhanced_path() -> Option<String> {
    let bin_dir = DesktopPaths.bin_dir()?;
    let sep = if cfg!(windows) { ";" } else { ":" };
    let current = std::env::var("PATH").unwrap_or_default();
    Some(format!("{}{}{}", bin_dir.display(), sep, current))
}

/// Command with the managed bin directory ahead of the user's `PATH`.
pub fn command<S: AsRef<std::ffi::OsStr>>(program: S) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(program);
    #[cfg(target_os = "windows")]
    cmd.creation_flags(0x08000000);
    if let Some(path) = enhanced_path() {
        cmd.env("PATH", path);
    }
    cmd
}

pub async fn is_available(program: &str) -> bool {
    command(program)
        .arg("-version")
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enhanced_path_keeps_existing_entries() {
        if let Some(path) = enhanced_path() {
            let current = std::env::var("PATH").unwrap_or_default();
            assert!(path.ends_with(&current));
            assert!(path.contains("biliget"));
        }
    }

    #[tokio::test]
    async fn missing_program_is_unavailable() {
        assert!(!is_available("biliget-no-such-encoder-binary").await);
    }
}
