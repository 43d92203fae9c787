use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HomeDirError {
    #[error("cannot determine the user home directory (HOME/APPDATA unset)")]
    HomeUnavailable,

    #[error("failed to create home directory '{path}': {source}")]
    Create {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn platform_home() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let var = "APPDATA";
    #[cfg(not(target_os = "windows"))]
    let var = "HOME";

    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Resolve the application home directory.
///
/// - `None` => `<platform home>/<default_subdir>`
/// - `~` or `~/...` => expanded against the platform home
/// - relative paths are made absolute against the current directory
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf, HomeDirError> {
    let resolved = match configured {
        None => platform_home()
            .ok_or(HomeDirError::HomeUnavailable)?
            .join(default_subdir),
        Some(raw) => {
            let raw = raw.trim().to_string();
            if raw == "~" {
                platform_home().ok_or(HomeDirError::HomeUnavailable)?
            } else if let Some(rest) = raw.strip_prefix("~/") {
                platform_home()
                    .ok_or(HomeDirError::HomeUnavailable)?
                    .join(rest)
            } else {
                let p = PathBuf::from(&raw);
                if p.is_absolute() {
                    p
                } else {
                    std::env::current_dir()
                        .map_err(|source| HomeDirError::Create {
                            path: raw.clone(),
                            source,
                        })?
                        .join(p)
                }
            }
        }
    };

    if create {
        std::fs::create_dir_all(&resolved).map_err(|source| HomeDirError::Create {
            path: resolved.to_string_lossy().to_string(),
            source,
        })?;
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn absolute_path_is_kept_and_created() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("nested/home");
        let out = resolve_home_dir(
            Some(target.to_string_lossy().to_string()),
            ".ignored",
            true,
        )
        .unwrap();
        assert_eq!(out, target);
        assert!(out.exists());
    }

    #[test]
    fn relative_path_becomes_absolute() {
        let out = resolve_home_dir(Some("relative/dir".into()), ".ignored", false).unwrap();
        assert!(out.is_absolute());
        assert!(out.ends_with("relative/dir"));
    }
}
