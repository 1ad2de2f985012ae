// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use path_clean::clean;
use std::path::{Path, PathBuf};

pub type FindInParent = fn(&Path, &str) -> Option<PathBuf>;

pub fn find_in_parent(path: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = PathBuf::from(path);

    loop {
        let file_path = current.join(filename);
        if file_path.exists() {
            return Some(file_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Work out which config file to read. `None` means no file was given or found and only
/// defaults and environment apply.
pub fn resolve_config_path<P: Into<PathBuf>>(
    find_in_parent: FindInParent,
    cwd: P,
    default_filename: &str,
    cli_file: Option<P>,
) -> Option<PathBuf> {
    let cwd = cwd.into();

    if let Some(cli_file) = cli_file.map(Into::into) {
        // config is passed in and is absolute
        if cli_file.is_absolute() {
            return Some(cli_file);
        }

        // config is passed in and is relative
        return Some(clean(cwd.join(cli_file)));
    }

    // search from cwd
    find_in_parent(&cwd, default_filename)
}
