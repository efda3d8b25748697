//! # Step Configuration
//!
//! Update instructions for one `argocd-update` step.
//!
//! # Example
//!
//! ```yaml
//! apps:
//!   - name: guestbook
//!     namespace: argocd
//!     sources:
//!       - repoURL: https://github.com/example/guestbook.git
//!         desiredRevision: 4d3b2a1
//!         updateTargetRevision: true
//!       - repoURL: oci://registry.example.com/charts
//!         chart: guestbook
//!         desiredRevision: 1.4.0
//!         updateTargetRevision: true
//!         helm:
//!           images:
//!             - key: image.tag
//!               value: v1.4.0
//! ```

use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Configuration of one `argocd-update` step
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArgoCdUpdateConfig {
    /// Applications to update, processed in order
    pub apps: Vec<AppUpdate>,
}

/// Update instructions for one Application
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppUpdate {
    /// Application name
    pub name: String,
    /// Application namespace, defaults to the Argo CD namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Source update instructions
    #[serde(default)]
    pub sources: Vec<SourceUpdate>,
}

/// Update instruction for one source of an Application
///
/// Chart sources are matched on the exact `(repoURL, chart)` pair, Git
/// sources on the normalized `repoURL`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SourceUpdate {
    /// Repository URL of the source to update
    #[serde(rename = "repoURL")]
    pub repo_url: String,
    /// Helm chart name, empty for Git sources
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub chart: String,
    /// Revision the source should end up at, usually produced by an earlier step
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub desired_revision: String,
    /// Whether to write `desiredRevision` into the source's `targetRevision`
    #[serde(default)]
    pub update_target_revision: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kustomize: Option<KustomizeUpdate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helm: Option<HelmUpdate>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KustomizeUpdate {
    pub images: Vec<KustomizeImageUpdate>,
}

/// Kustomize image override
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KustomizeImageUpdate {
    /// Image repository to override
    #[serde(rename = "repoURL")]
    pub repo_url: String,
    /// Replacement image name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    /// Image tag, mutually exclusive with `digest`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Image digest, mutually exclusive with `tag`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HelmUpdate {
    pub images: Vec<HelmImageUpdate>,
}

/// Helm parameter to upsert
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HelmImageUpdate {
    /// Parameter name, e.g. `image.tag`
    pub key: String,
    /// Parameter value
    pub value: String,
}

impl ArgoCdUpdateConfig {
    /// Parse a step configuration from an untyped value
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not describe a valid configuration.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let config: Self =
            serde_json::from_value(value).context("Failed to parse argocd-update configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a step configuration from YAML (or JSON) text
    ///
    /// # Errors
    ///
    /// Returns an error if the text does not describe a valid configuration.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(text).context("Failed to parse argocd-update configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Structural checks the schema cannot express on its own
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<()> {
        if self.apps.is_empty() {
            return Err(anyhow::anyhow!("apps must contain at least one application"));
        }
        for (i, app) in self.apps.iter().enumerate() {
            if app.name.is_empty() {
                return Err(anyhow::anyhow!("apps[{i}].name is required but is empty"));
            }
            if app.sources.is_empty() {
                return Err(anyhow::anyhow!(
                    "apps[{i}].sources must contain at least one source"
                ));
            }
            for (j, source) in app.sources.iter().enumerate() {
                if source.repo_url.is_empty() {
                    return Err(anyhow::anyhow!(
                        "apps[{i}].sources[{j}].repoURL is required but is empty"
                    ));
                }
                let images = source.kustomize.iter().flat_map(|k| k.images.iter());
                for (k, image) in images.enumerate() {
                    if image.tag.is_some() && image.digest.is_some() {
                        return Err(anyhow::anyhow!(
                            "apps[{i}].sources[{j}].kustomize.images[{k}] must not set both tag and digest"
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_yaml() {
        let config = ArgoCdUpdateConfig::from_yaml(
            r"
apps:
  - name: guestbook
    sources:
      - repoURL: https://github.com/example/guestbook.git
        desiredRevision: abc123
        updateTargetRevision: true
        kustomize:
          images:
            - repoURL: nginx
              tag: 1.25.0
",
        )
        .unwrap();

        assert_eq!(config.apps.len(), 1);
        let app = &config.apps[0];
        assert_eq!(app.name, "guestbook");
        assert_eq!(app.namespace, None);
        let source = &app.sources[0];
        assert_eq!(source.repo_url, "https://github.com/example/guestbook.git");
        assert!(source.chart.is_empty());
        assert_eq!(source.desired_revision, "abc123");
        assert!(source.update_target_revision);
        let image = &source.kustomize.as_ref().unwrap().images[0];
        assert_eq!(image.tag.as_deref(), Some("1.25.0"));
    }

    #[test]
    fn test_parse_value_rejects_garbage() {
        let result = ArgoCdUpdateConfig::from_value(json!({"apps": "nope"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_requires_apps() {
        let err = ArgoCdUpdateConfig::from_value(json!({"apps": []})).unwrap_err();
        assert!(err.to_string().contains("at least one application"));
    }

    #[test]
    fn test_validate_requires_sources() {
        let err =
            ArgoCdUpdateConfig::from_value(json!({"apps": [{"name": "a", "sources": []}]}))
                .unwrap_err();
        assert!(err.to_string().contains("apps[0].sources"));
    }

    #[test]
    fn test_validate_rejects_tag_and_digest() {
        let err = ArgoCdUpdateConfig::from_value(json!({
            "apps": [{
                "name": "a",
                "sources": [{
                    "repoURL": "https://example.com/repo.git",
                    "kustomize": {"images": [{"repoURL": "nginx", "tag": "1", "digest": "sha256:abc"}]}
                }]
            }]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("both tag and digest"));
    }
}
