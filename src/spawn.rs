//! Detached process spawning.
//!
//! Spawned programs are fire-and-forget: the core never waits on them and
//! detaches them into their own session so they survive if the window
//! manager exits.

use std::process::Command;

/// Split a configured command string into argv, expanding a leading tilde.
pub fn split_command(command: &str) -> Vec<String> {
    let expanded = shellexpand::tilde(command);
    expanded.split_whitespace().map(String::from).collect()
}

/// Spawn argv detached. Failures are logged, never propagated.
pub fn spawn(argv: &[String]) {
    let Some((program, args)) = argv.split_first() else {
        log::warn!("Ignoring empty spawn request");
        return;
    };
    log::info!("Spawning '{}'", argv.join(" "));

    let mut cmd = Command::new(program);
    cmd.args(args);

    // Detach into a new session so apps survive if the WM exits
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        unsafe {
            cmd.pre_exec(|| {
                libc::setsid();
                Ok(())
            });
        }
    }

    if let Err(e) = cmd.spawn() {
        log::error!("Failed to spawn '{}': {}", program, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_command_whitespace() {
        assert_eq!(split_command("emacsclient -c"), vec!["emacsclient", "-c"]);
        assert_eq!(split_command("kitty"), vec!["kitty"]);
        assert!(split_command("   ").is_empty());
    }

    #[test]
    fn test_split_command_expands_tilde() {
        let argv = split_command("~/bin/launcher --fast");
        assert_eq!(argv.len(), 2);
        assert!(!argv[0].starts_with('~'));
        assert!(argv[0].ends_with("/bin/launcher"));
        assert_eq!(argv[1], "--fast");
    }
}
