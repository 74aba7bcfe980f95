use std::path::{Path, PathBuf};

pub trait AppPaths: Send + Sync {
    fn config_dir(&self) -> PathBuf;
    fn bin_dir(&self) -> Option<PathBuf>;
}

pub struct DesktopPaths;

impl AppPaths for DesktopPaths {
    fn config_dir(&self) -> PathBuf {
        if let Ok(dir) = std::env::var("BILIGET_CONFIG_DIR") {
            return PathBuf::from(dir);
        }
        dirs::config_dir()
            .map(|d| d.join("biliget"))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn bin_dir(&self) -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("biliget").join("bin"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartPaths {
    pub intermediate: PathBuf,
    pub output: PathBuf,
}

/// `<root>/<video_id>/<name>.<ext>` for both the raw download and the encoded file.
pub fn part_paths(
    root: &Path,
    video_id: &str,
    file_stem: &str,
    intermediate_ext: &str,
    output_ext: &str,
) -> PartPaths {
    let dir = root.join(video_id);
    PartPaths {
        intermediate: dir.join(format!("{}.{}", file_stem, intermediate_ext)),
        output: dir.join(format!("{}.{}", file_stem, output_ext)),
    }
}

pub async fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent).await,
        _ => Ok(()),
    }
}
