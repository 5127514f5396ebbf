//! Local source reader - project manifest, lockfile, and installed tree.
//!
//! The manifest is authoritative for which packages exist; the installed tree
//! under `node_modules` is authoritative for versions, with the lockfile as a
//! best-effort fallback when a package is not installed.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::exec::{RunOptions, run_command};
use crate::manager::UpdateOptions;
use crate::registry::RegistryCache;
use crate::types::{PackageListResult, PackageRow, Source, UpdateOutcome};
use crate::version::extract_version_from_output;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageManifest {
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    optional_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    workspaces: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct PackageLock {
    #[serde(default)]
    packages: HashMap<String, LockEntry>,
    #[serde(default)]
    dependencies: HashMap<String, LockEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct LockEntry {
    version: Option<String>,
}

#[derive(Debug)]
struct DependencyEntry {
    name: String,
    spec: Option<String>,
    dev: bool,
}

/// True when the project root carries a `package.json`.
pub async fn has_package_manifest(root: &Path) -> bool {
    tokio::fs::try_exists(root.join("package.json"))
        .await
        .unwrap_or(false)
}

/// Enumerate manifest-declared dependencies and hydrate their latest
/// versions.
///
/// Only an unreadable or unparseable manifest fails the whole read; lockfile
/// problems and per-package lookup failures stay row-scoped.
pub async fn read_local_packages(root: &Path, registry: &RegistryCache) -> PackageListResult {
    let manifest_path = root.join("package.json");
    let contents = match tokio::fs::read_to_string(&manifest_path).await {
        Ok(contents) => contents,
        Err(err) => {
            return PackageListResult::failed(format!(
                "Cannot read package.json at {}: {err}",
                manifest_path.display()
            ));
        }
    };
    let manifest: PackageManifest = match serde_json::from_str(&contents) {
        Ok(manifest) => manifest,
        Err(err) => {
            return PackageListResult::failed(format!(
                "Cannot read package.json at {}: {err}",
                manifest_path.display()
            ));
        }
    };

    let mut errors = Vec::new();
    if manifest.workspaces.is_some() {
        errors.push("Workspaces detected - workspace awareness is not implemented yet.".to_string());
    }

    let lockfile = read_package_lock(root).await;
    let entries = collect_dependencies(&manifest);

    let mut rows = Vec::with_capacity(entries.len());
    for entry in entries {
        let installed = read_installed_version(root, &entry.name).await;
        let lock_version = if installed.is_some() {
            None
        } else {
            lockfile_version(lockfile.as_ref(), &entry.name)
        };
        let missing = installed.is_none();
        let version = installed
            .clone()
            .or_else(|| lock_version.clone())
            .unwrap_or_else(|| "missing".to_string());
        let status_message = if missing {
            match (&lock_version, &entry.spec) {
                (Some(lock), _) => Some(format!("lockfile {lock}")),
                (None, Some(spec)) => Some(format!("wanted {spec}")),
                (None, None) => None,
            }
        } else {
            None
        };

        let mut row = PackageRow::new(entry.name, Source::Local, version);
        row.dev = entry.dev;
        row.missing = missing;
        row.installed_version = installed;
        row.requested_version = entry.spec;
        row.status_message = status_message;
        rows.push(row);
    }

    super::hydrate_latest(&mut rows, &mut errors, registry).await;

    PackageListResult {
        packages: rows,
        errors,
    }
}

/// Install the latest release of a local dependency, preserving its dev/prod
/// classification.
pub async fn update_local_package(
    row: &PackageRow,
    registry: &RegistryCache,
    opts: &UpdateOptions,
) -> UpdateOutcome {
    let mut args = vec!["install".to_string(), format!("{}@latest", row.name)];
    args.push(if row.dev {
        "--save-dev".to_string()
    } else {
        "--save-prod".to_string()
    });

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
        Err(err) => return UpdateOutcome::failure(&row.name, err.to_string()),
    };

    if result.code != 0 {
        let message = if result.stderr.trim().is_empty() {
            format!("npm install exited with code {}", result.code)
        } else {
            result.stderr
        };
        return UpdateOutcome::failure(&row.name, message);
    }

    let combined = format!("{}\n{}", result.stdout, result.stderr);
    let version = match extract_version_from_output(&row.name, &combined) {
        Some(version) => Some(version),
        None if opts.mode == crate::exec::ExecMode::Execute => {
            registry.latest_version(&row.name).await
        }
        None => None,
    };

    UpdateOutcome::success(&row.name, version)
}

/// Merge the three dependency groups into one entry per name, sorted.
///
/// A name in multiple groups is dev only if every group it appears in is dev,
/// and the first non-empty declared spec wins.
fn collect_dependencies(manifest: &PackageManifest) -> Vec<DependencyEntry> {
    let mut merged: BTreeMap<String, DependencyEntry> = BTreeMap::new();

    let mut assign = |deps: &BTreeMap<String, String>, is_dev: bool| {
        for (name, spec) in deps {
            let spec = if spec.is_empty() {
                None
            } else {
                Some(spec.clone())
            };
            match merged.get_mut(name.as_str()) {
                Some(existing) => {
                    existing.dev = existing.dev && is_dev;
                    if existing.spec.is_none() {
                        existing.spec = spec;
                    }
                }
                None => {
                    merged.insert(
                        name.clone(),
                        DependencyEntry {
                            name: name.clone(),
                            spec,
                            dev: is_dev,
                        },
                    );
                }
            }
        }
    };

    assign(&manifest.dependencies, false);
    assign(&manifest.dev_dependencies, true);
    assign(&manifest.optional_dependencies, false);

    merged.into_values().collect()
}

async fn read_package_lock(root: &Path) -> Option<PackageLock> {
    let contents = tokio::fs::read_to_string(root.join("package-lock.json"))
        .await
        .ok()?;
    serde_json::from_str(&contents).ok()
}

fn lockfile_version(lockfile: Option<&PackageLock>, name: &str) -> Option<String> {
    let lockfile = lockfile?;
    // npm v7+ records under `packages`, older lockfiles under `dependencies`.
    if let Some(entry) = lockfile.packages.get(&format!("node_modules/{name}")) {
        if let Some(version) = &entry.version {
            return Some(version.clone());
        }
    }
    lockfile
        .dependencies
        .get(name)
        .and_then(|entry| entry.version.clone())
}

async fn read_installed_version(root: &Path, name: &str) -> Option<String> {
    let mut path = root.join("node_modules");
    for segment in name.split('/') {
        path.push(segment);
    }
    path.push("package.json");

    let contents = tokio::fs::read_to_string(&path).await.ok()?;
    let data: serde_json::Value = serde_json::from_str(&contents).ok()?;
    data.get("version")?.as_str().map(String::from)
}
