// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use std::{fs, path::Path};

/// Read a yaml file and substitute `$VAR` / `${VAR}` references from the environment.
pub fn load_yaml_with_env(file_path: &Path) -> Result<String> {
    let content = fs::read_to_string(file_path)?;
    Ok(shellexpand::env(&content)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn expands_environment_variables() {
        Jail::expect_with(|jail| {
            jail.set_env("CAMPAIGN_SEED", "99");
            jail.create_file("veil.config.yaml", "fhe:\n  seed: ${CAMPAIGN_SEED}\n")?;
            let yaml = load_yaml_with_env(&jail.directory().join("veil.config.yaml"))
                .map_err(|e| e.to_string())?;
            assert_eq!(yaml, "fhe:\n  seed: 99\n");
            Ok(())
        });
    }

    #[test]
    fn missing_variables_are_errors() {
        Jail::expect_with(|jail| {
            jail.create_file("veil.config.yaml", "name: ${VEIL_TEST_UNSET_VARIABLE}\n")?;
            assert!(load_yaml_with_env(&jail.directory().join("veil.config.yaml")).is_err());
            Ok(())
        });
    }
}
