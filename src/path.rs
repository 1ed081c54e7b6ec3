// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path information for external files that need to be
//! interacted with, or managed in some way.

use std::path::PathBuf;

/// Determine default absolute path to the settings file.
///
/// Uses XDG Base Directory path `$XDG_CONFIG_HOME/helmboot/config.toml` as
/// the default absolute path. Does not check if the path returned actually
/// exists.
///
/// # Errors
///
/// - Return [`PathError::NoWayHome`] if home directory path cannot be
///   determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_settings_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("helmboot").join("config.toml"))
        .ok_or(PathError::NoWayHome)
}

/// Expand `~` and environment variables in a user supplied path.
///
/// # Errors
///
/// - Return [`PathError::ShellExpansion`] if a referenced variable is not
///   set.
pub fn expand_path(path: impl AsRef<str>) -> Result<PathBuf> {
    Ok(shellexpand::full(path.as_ref())?.into_owned().into())
}

/// Path resolution error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum PathError {
    /// No way to determine user's home directory.
    #[error("cannot determine absolute path to user's home directory")]
    NoWayHome,

    /// Failed to perform shell expansion on path.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

/// Friendly result alias :3
pub type Result<T, E = PathError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test(env = [("XDG_CONFIG_HOME", "/home/blah/.config")])]
    fn settings_path_follows_xdg() -> anyhow::Result<()> {
        let result = default_settings_path()?;
        assert_eq!(result, PathBuf::from("/home/blah/.config/helmboot/config.toml"));

        Ok(())
    }

    #[sealed_test(env = [("BOOT_DIR", "/home/blah/boot")])]
    fn expand_variables_in_path() -> anyhow::Result<()> {
        let result = expand_path("$BOOT_DIR/cluster")?;
        assert_eq!(result, PathBuf::from("/home/blah/boot/cluster"));

        Ok(())
    }

    #[sealed_test]
    fn unset_variable_fails_expansion() {
        std::env::remove_var("HELMBOOT_UNSET_DIR");
        let result = expand_path("$HELMBOOT_UNSET_DIR/cluster");
        assert!(matches!(result, Err(PathError::ShellExpansion(_))));
    }
}
