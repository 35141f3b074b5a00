use std::path::PathBuf;

use dirs_next::home_dir;

/// Expand a leading `~` to the current user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let p = path.trim();
    if p == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = p.strip_prefix("~/") {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    PathBuf::from(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_home_prefix() {
        temp_env::with_var("HOME", Some("/tmp/focus-home"), || {
            assert_eq!(expand_tilde("~/scripts"), PathBuf::from("/tmp/focus-home/scripts"));
            assert_eq!(expand_tilde("~"), PathBuf::from("/tmp/focus-home"));
        });
    }

    #[test]
    fn leaves_other_paths_alone() {
        assert_eq!(expand_tilde(" /opt/scripts "), PathBuf::from("/opt/scripts"));
        assert_eq!(expand_tilde("relative/~/dir"), PathBuf::from("relative/~/dir"));
    }
}
