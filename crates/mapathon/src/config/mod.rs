use std::fmt;
use std::path::{Component, Path, PathBuf};

use anyhow::{Result, bail};

pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_PORT: u16 = 5432;
pub const DEFAULT_DB_NAME: &str = "insights";
pub const DEFAULT_DB_USER: &str = "postgres";

#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseCredentials {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: Option<String>,
}

impl Default for DatabaseCredentials {
    fn default() -> Self {
        Self {
            host: DEFAULT_DB_HOST.to_string(),
            port: DEFAULT_DB_PORT,
            dbname: DEFAULT_DB_NAME.to_string(),
            user: DEFAULT_DB_USER.to_string(),
            password: None,
        }
    }
}

impl fmt::Debug for DatabaseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseCredentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl DatabaseCredentials {
    /// `user@host:port/dbname`, safe for logs.
    #[must_use]
    pub fn display_target(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.dbname)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    pub home_dir: PathBuf,
    pub cwd: PathBuf,
}

pub fn resolve_runtime_paths(home_dir: &Path, cwd: &Path) -> Result<RuntimePaths> {
    if !home_dir.is_absolute() {
        bail!("home_dir must be absolute: {}", home_dir.display());
    }
    if !cwd.is_absolute() {
        bail!("cwd must be absolute: {}", cwd.display());
    }

    Ok(RuntimePaths {
        home_dir: normalize_lexical(home_dir),
        cwd: normalize_lexical(cwd),
    })
}

impl RuntimePaths {
    /// Resolves a user-supplied output path: `~` expands to the home dir and
    /// relative paths are anchored at the cwd.
    pub fn resolve_output_path(&self, path: &Path) -> Result<PathBuf> {
        let expanded = expand_tilde(path, &self.home_dir)?;
        let resolved = if expanded.is_absolute() {
            expanded
        } else {
            self.cwd.join(expanded)
        };

        Ok(normalize_lexical(&resolved))
    }
}

fn expand_tilde(path: &Path, home_dir: &Path) -> Result<PathBuf> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => {
            let mut expanded = home_dir.to_path_buf();
            for component in components {
                expanded.push(component.as_os_str());
            }
            Ok(expanded)
        }
        Some(Component::Normal(first))
            if first
                .to_str()
                .is_some_and(|segment| segment.starts_with('~')) =>
        {
            bail!(
                "unsupported home expansion syntax (only `~` and `~/...` are supported): {}",
                path.display()
            )
        }
        _ => Ok(path.to_path_buf()),
    }
}

fn normalize_lexical(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component.as_os_str());
                }
            }
            _ => normalized.push(component.as_os_str()),
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::{DatabaseCredentials, resolve_runtime_paths};
    use std::path::Path;

    #[test]
    fn expands_tilde_output_against_home_dir() {
        let paths = resolve_runtime_paths(Path::new("/home/tester"), Path::new("/work/repo"))
            .expect("paths should resolve");

        let out = paths
            .resolve_output_path(Path::new("~/reports/summary.csv"))
            .expect("tilde path should resolve");
        assert_eq!(out, Path::new("/home/tester/reports/summary.csv"));
    }

    #[test]
    fn resolves_relative_output_against_cwd() {
        let paths = resolve_runtime_paths(Path::new("/home/tester"), Path::new("/work/repo"))
            .expect("paths should resolve");

        let out = paths
            .resolve_output_path(Path::new("./out/../out/detail.csv"))
            .expect("relative path should resolve");
        assert_eq!(out, Path::new("/work/repo/out/detail.csv"));
    }

    #[test]
    fn rejects_non_absolute_cwd() {
        let err = resolve_runtime_paths(Path::new("/home/tester"), Path::new("work/repo"))
            .expect_err("relative cwd must fail");

        assert!(
            err.to_string().contains("cwd must be absolute"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn rejects_tilde_username_syntax() {
        let paths = resolve_runtime_paths(Path::new("/home/tester"), Path::new("/work/repo"))
            .expect("paths should resolve");

        let err = paths
            .resolve_output_path(Path::new("~someone/out.csv"))
            .expect_err("~username syntax must fail");
        assert!(
            err.to_string()
                .contains("unsupported home expansion syntax"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn debug_output_redacts_password() {
        let credentials = DatabaseCredentials {
            password: Some("hunter2".to_string()),
            ..DatabaseCredentials::default()
        };

        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
        assert_eq!(
            credentials.display_target(),
            "postgres@localhost:5432/insights"
        );
    }
}
