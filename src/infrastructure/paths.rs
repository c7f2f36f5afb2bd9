//! Data directory resolution and tilde expansion.
//!
//! The product store, the session file and the trace file all live in one data
//! directory, resolved in this order:
//!
//! 1. `GESTLY_DATA_DIR`
//! 2. `$XDG_DATA_HOME/gestly`
//! 3. `~/.local/share/gestly`
//!
//! Without a home directory the fallback is `./.gestly`.

use std::path::PathBuf;

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "GESTLY_DATA_DIR";

/// Returns the default data directory from the process environment.
///
/// # Examples
///
/// ```no_run
/// use gestly::infrastructure::get_data_dir;
///
/// let data_dir = get_data_dir();
/// println!("products live in {}", data_dir.join("products.json").display());
/// ```
#[must_use]
pub fn get_data_dir() -> PathBuf {
    resolve_data_dir(|key| std::env::var(key).ok())
}

/// Resolves the data directory using `lookup` for environment variables.
///
/// Empty values count as unset.
pub fn resolve_data_dir(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(dir) = var(DATA_DIR_ENV) {
        return PathBuf::from(expand_tilde_with(&dir, var("HOME").as_deref()));
    }
    if let Some(xdg) = var("XDG_DATA_HOME") {
        return PathBuf::from(xdg).join("gestly");
    }
    var("HOME").map_or_else(
        || PathBuf::from(".gestly"),
        |home| PathBuf::from(home).join(".local").join("share").join("gestly"),
    )
}

/// Expands a leading `~` to `$HOME`.
///
/// Paths are returned unchanged when `HOME` is unset.
#[must_use]
pub fn expand_tilde(path: &str) -> String {
    expand_tilde_with(path, std::env::var("HOME").ok().as_deref())
}

fn expand_tilde_with(path: &str, home: Option<&str>) -> String {
    let Some(home) = home else {
        return path.to_string();
    };

    if path == "~" {
        home.to_string()
    } else if let Some(rest) = path.strip_prefix("~/") {
        format!("{}/{rest}", home.trim_end_matches('/'))
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn explicit_override_wins() {
        let dir = resolve_data_dir(env(&[
            ("GESTLY_DATA_DIR", "~/shop"),
            ("XDG_DATA_HOME", "/xdg"),
            ("HOME", "/home/ana"),
        ]));
        assert_eq!(dir, PathBuf::from("/home/ana/shop"));
    }

    #[test]
    fn xdg_then_home() {
        assert_eq!(
            resolve_data_dir(env(&[("XDG_DATA_HOME", "/xdg"), ("HOME", "/home/ana")])),
            PathBuf::from("/xdg/gestly")
        );
        assert_eq!(
            resolve_data_dir(env(&[("XDG_DATA_HOME", " "), ("HOME", "/home/ana")])),
            PathBuf::from("/home/ana/.local/share/gestly")
        );
        assert_eq!(resolve_data_dir(env(&[])), PathBuf::from(".gestly"));
    }

    #[test]
    fn tilde_expansion() {
        assert_eq!(expand_tilde_with("~/data", Some("/home/ana/")), "/home/ana/data");
        assert_eq!(expand_tilde_with("~", Some("/home/ana")), "/home/ana");
        assert_eq!(expand_tilde_with("/abs/~", Some("/home/ana")), "/abs/~");
        assert_eq!(expand_tilde_with("~/data", None), "~/data");
    }
}
