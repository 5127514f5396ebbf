//! Toolchain version report: installed node/npm versions next to the
//! published LTS releases.

use std::sync::Arc;

use crate::exec::exec_command;
use crate::registry::{RELEASE_INDEX_TTL, RegistryCache};
use crate::version::normalize;

/// Node.js release index, one JSON object per published release.
pub const NODE_DIST_INDEX: &str = "https://nodejs.org/dist/index.json";

const UNKNOWN: &str = "?";

/// Snapshot of the local and published toolchain versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versions {
    /// `node -v`, normalized; `"?"` when the probe fails.
    pub node_current: String,
    /// `npm -v`, normalized; `"?"` when the probe fails.
    pub npm_current: String,
    /// Newest LTS line from the Node dist index.
    pub node_lts: Option<String>,
    /// npm's `lts` dist-tag, falling back to `latest`.
    pub npm_lts: Option<String>,
}

/// Collect all four versions concurrently. Individual probe failures
/// degrade to `"?"` or `None` rather than failing the report.
pub async fn get_versions(registry: &Arc<RegistryCache>) -> Versions {
    let (node_current, npm_current, node_lts, npm_lts) = tokio::join!(
        tool_version("node -v"),
        tool_version("npm -v"),
        node_latest_lts(registry, NODE_DIST_INDEX),
        npm_lts_version(registry),
    );

    Versions {
        node_current,
        npm_current,
        node_lts,
        npm_lts,
    }
}

/// Run a `tool -v` style command and normalize its first output line.
async fn tool_version(command: &str) -> String {
    match exec_command(command, None).await {
        Ok(result) if result.code == 0 => {
            let line = result.stdout.lines().next().unwrap_or_default();
            let version = normalize(line);
            if version.is_empty() {
                UNKNOWN.to_string()
            } else {
                version.to_string()
            }
        }
        _ => UNKNOWN.to_string(),
    }
}

/// Newest entry in the dist index whose `lts` field is truthy (a codename
/// string or `true`); entries are published newest-first.
async fn node_latest_lts(registry: &Arc<RegistryCache>, index_url: &str) -> Option<String> {
    let index = registry.fetch_json(index_url, RELEASE_INDEX_TTL).await?;
    let releases = index.as_array()?;

    releases
        .iter()
        .find(|release| {
            release
                .get("lts")
                .is_some_and(|lts| lts.is_string() || lts.as_bool() == Some(true))
        })
        .and_then(|release| release.get("version")?.as_str())
        .map(|version| normalize(version).to_string())
}

async fn npm_lts_version(registry: &Arc<RegistryCache>) -> Option<String> {
    match registry.dist_tag("npm", "lts").await {
        Some(version) => Some(version),
        None => registry.dist_tag("npm", "latest").await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use reqwest::Client;

    const DIST_INDEX_BODY: &str = r#"[
        { "version": "v23.1.0", "lts": false },
        { "version": "v22.11.0", "lts": "Jod" },
        { "version": "v20.18.0", "lts": "Iron" }
    ]"#;

    #[tokio::test]
    async fn picks_first_lts_release_from_the_index() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/index.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(DIST_INDEX_BODY)
            .create_async()
            .await;

        let registry = Arc::new(RegistryCache::new(Client::new(), server.url()));
        let url = format!("{}/index.json", server.url());
        assert_eq!(
            node_latest_lts(&registry, &url).await,
            Some("22.11.0".to_string())
        );
    }

    #[tokio::test]
    async fn unreachable_index_yields_none() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/index.json")
            .with_status(500)
            .create_async()
            .await;

        let registry = Arc::new(RegistryCache::new(Client::new(), server.url()));
        let url = format!("{}/index.json", server.url());
        assert_eq!(node_latest_lts(&registry, &url).await, None);
    }

    #[tokio::test]
    async fn npm_lts_falls_back_to_latest_tag() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/npm")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{ "dist-tags": { "latest": "10.9.0" } }"#)
            .create_async()
            .await;

        let registry = Arc::new(RegistryCache::new(Client::new(), server.url()));
        assert_eq!(npm_lts_version(&registry).await, Some("10.9.0".to_string()));
    }

    #[tokio::test]
    async fn npm_lts_tag_wins_when_present() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/npm")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{ "dist-tags": { "latest": "11.0.0", "lts": "10.9.2" } }"#)
            .create_async()
            .await;

        let registry = Arc::new(RegistryCache::new(Client::new(), server.url()));
        assert_eq!(npm_lts_version(&registry).await, Some("10.9.2".to_string()));
    }

    #[tokio::test]
    async fn tool_probe_degrades_to_the_unknown_sentinel() {
        assert_eq!(tool_version("exit 1").await, "?");
        assert_eq!(tool_version("echo v20.18.0").await, "20.18.0");
    }
}
