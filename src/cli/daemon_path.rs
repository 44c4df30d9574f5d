use std::path::PathBuf;

/// Path of the reminder daemon, which is installed next to the CLI.
pub fn to_daemon_path(mut path: PathBuf) -> PathBuf {
    path.set_file_name("checklist-daemon");
    #[cfg(windows)]
    {
        path.set_extension("exe");
    }
    path
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::to_daemon_path;

    #[test]
    fn test_daemon_lives_next_to_cli() {
        let daemon = to_daemon_path(PathBuf::from("/usr/local/bin/checklist"));
        assert_eq!(daemon.parent(), Some(PathBuf::from("/usr/local/bin").as_path()));
        assert!(daemon
            .file_stem()
            .is_some_and(|name| name == "checklist-daemon"));
    }
}
