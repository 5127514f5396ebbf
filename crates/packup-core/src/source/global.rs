//! Global source reader - packages from the system-wide npm install tree.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::exec::{ExecMode, RunOptions, exec_command, run_command};
use crate::manager::UpdateOptions;
use crate::registry::RegistryCache;
use crate::types::{PackageListResult, PackageRow, Source, UpdateOutcome};
use crate::version::extract_version_from_output;

/// npm governs itself through the dedicated self-update path, not the bulk
/// list.
const IGNORED_PACKAGES: &[&str] = &["npm"];

const GLOBAL_LIST_COMMAND: &str = "npm ls -g --depth=0 --json";

#[derive(Debug, Default, Deserialize)]
struct NpmListOutput {
    #[serde(default)]
    dependencies: BTreeMap<String, NpmListDependency>,
}

#[derive(Debug, Default, Deserialize)]
struct NpmListDependency {
    version: Option<String>,
}

/// Enumerate globally installed packages and hydrate their latest versions.
pub async fn read_global_packages(registry: &RegistryCache) -> PackageListResult {
    let result = match exec_command(GLOBAL_LIST_COMMAND, None).await {
        Ok(result) => result,
        Err(err) => {
            return PackageListResult::failed(format!("Failed to read global packages: {err}"));
        }
    };

    // npm reports problems on stderr while still emitting usable JSON; take
    // whichever stream carried the payload.
    let payload = if result.stdout.trim().is_empty() {
        result.stderr
    } else {
        result.stdout
    };
    if payload.trim().is_empty() {
        return PackageListResult::failed("Failed to read global packages.");
    }

    let (mut rows, mut errors) = parse_global_rows(&payload);
    super::hydrate_latest(&mut rows, &mut errors, registry).await;

    PackageListResult {
        packages: rows,
        errors,
    }
}

fn parse_global_rows(payload: &str) -> (Vec<PackageRow>, Vec<String>) {
    let mut rows = Vec::new();
    let mut errors = Vec::new();

    match serde_json::from_str::<NpmListOutput>(payload) {
        Ok(parsed) => {
            for (name, data) in parsed.dependencies {
                if IGNORED_PACKAGES.contains(&name.as_str()) {
                    continue;
                }
                let version = data.version.unwrap_or_else(|| "?".to_string());
                rows.push(PackageRow::new(name, Source::Global, version));
            }
        }
        Err(err) => errors.push(format!("Unable to parse npm output: {err}")),
    }

    (rows, errors)
}

/// Install the latest release of a global package.
///
/// Spawn failure and non-zero exit both become a failed outcome; the batch
/// caller decides what happens next.
pub async fn update_global_package(
    name: &str,
    registry: &RegistryCache,
    opts: &UpdateOptions,
) -> UpdateOutcome {
    let args = vec![
        "install".to_string(),
        "-g".to_string(),
        format!("{name}@latest"),
    ];

    let result = match run_command(
        "npm",
        &args,
        RunOptions {
            cwd: Some(&opts.cwd),
            mode: opts.mode,
            log: Some(&opts.log),
            ..RunOptions::default()
        },
    )
    .await
    {
        Ok(result) => result,
        Err(err) => return UpdateOutcome::failure(name, err.to_string()),
    };

    if result.code != 0 {
        let message = if result.stderr.trim().is_empty() {
            format!("npm install exited with code {}", result.code)
        } else {
            result.stderr
        };
        return UpdateOutcome::failure(name, message);
    }

    let version = extract_version_from_output(name, &result.stdout)
        .or_else(|| extract_version_from_output(name, &result.stderr));
    let version = match version {
        Some(version) => Some(version),
        None if opts.mode == ExecMode::Execute => registry.latest_version(name).await,
        None => None,
    };

    UpdateOutcome::success(name, version)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST_PAYLOAD: &str = r#"{
        "dependencies": {
            "npm": { "version": "10.5.0" },
            "typescript": { "version": "5.3.3" },
            "corrupted": {}
        }
    }"#;

    #[test]
    fn parse_excludes_npm_and_defaults_missing_versions() {
        let (rows, errors) = parse_global_rows(LIST_PAYLOAD);
        assert!(errors.is_empty());

        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["corrupted", "typescript"]);

        assert_eq!(rows[0].version, "?");
        assert_eq!(rows[1].version, "5.3.3");
        assert!(rows.iter().all(|r| r.source == Source::Global));
    }

    #[test]
    fn parse_failure_accumulates_an_error() {
        let (rows, errors) = parse_global_rows("npm ERR! something broke");
        assert!(rows.is_empty());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Unable to parse npm output"));
    }

    #[test]
    fn parse_tolerates_missing_dependencies_key() {
        let (rows, errors) = parse_global_rows("{}");
        assert!(rows.is_empty());
        assert!(errors.is_empty());
    }
}
