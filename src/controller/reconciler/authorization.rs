//! # Authorization
//!
//! An Application opts in to being mutated by exactly one Stage through the
//! `kargo.akuity.io/authorized-stage` annotation, whose value must be
//! `<project>:<stage>`. There is no default-allow.

use super::types::UpdateError;
use crate::constants::ANNOTATION_AUTHORIZED_STAGE;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Check that the object permits mutation by the given project and Stage
///
/// # Errors
///
/// Returns [`UpdateError::Unauthorized`] when the annotation is missing or
/// names another Stage, and [`UpdateError::InvalidAuthorization`] when its
/// value is malformed or uses the retired wildcard form.
pub fn authorize(project: &str, stage: &str, meta: &ObjectMeta) -> Result<(), UpdateError> {
    let namespace = meta.namespace.clone().unwrap_or_default();
    let name = meta.name.clone().unwrap_or_default();

    let unauthorized = || UpdateError::Unauthorized {
        namespace: namespace.clone(),
        name: name.clone(),
        project: project.to_string(),
        stage: stage.to_string(),
    };
    let invalid = |value: &str, reason: &str| UpdateError::InvalidAuthorization {
        namespace: namespace.clone(),
        name: name.clone(),
        annotation: ANNOTATION_AUTHORIZED_STAGE.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let Some(value) = meta
        .annotations
        .as_ref()
        .and_then(|a| a.get(ANNOTATION_AUTHORIZED_STAGE))
    else {
        return Err(unauthorized());
    };

    let [allowed_project, allowed_stage] = value.split(':').collect::<Vec<_>>()[..] else {
        return Err(invalid(value, "expected format <project>:<stage>"));
    };
    if allowed_project.is_empty() || allowed_stage.is_empty() {
        return Err(invalid(value, "expected format <project>:<stage>"));
    }
    if [allowed_project, allowed_stage]
        .iter()
        .any(|part| part.contains(['*', '?', '[']))
    {
        return Err(invalid(
            value,
            "wildcards are deprecated and no longer supported",
        ));
    }

    if allowed_project != project || allowed_stage != stage {
        return Err(unauthorized());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn meta(annotation: Option<&str>) -> ObjectMeta {
        ObjectMeta {
            name: Some("app".to_string()),
            namespace: Some("argocd".to_string()),
            annotations: annotation.map(|v| {
                BTreeMap::from([(ANNOTATION_AUTHORIZED_STAGE.to_string(), v.to_string())])
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_authorized() {
        assert!(authorize("my-project", "test", &meta(Some("my-project:test"))).is_ok());
    }

    #[test]
    fn test_missing_annotation_denied() {
        let err = authorize("my-project", "test", &meta(None)).unwrap_err();
        assert!(matches!(err, UpdateError::Unauthorized { .. }));
    }

    #[test]
    fn test_other_stage_denied() {
        let err = authorize("my-project", "test", &meta(Some("my-project:prod"))).unwrap_err();
        assert!(matches!(err, UpdateError::Unauthorized { .. }));
        let err = authorize("my-project", "test", &meta(Some("other:test"))).unwrap_err();
        assert!(matches!(err, UpdateError::Unauthorized { .. }));
    }

    #[test]
    fn test_malformed_value_rejected() {
        for value in ["my-project", "my-project:", ":test", "", "my-project:test:extra"] {
            let err = authorize("my-project", "test", &meta(Some(value))).unwrap_err();
            assert!(
                matches!(err, UpdateError::InvalidAuthorization { .. }),
                "value {value:?} should be rejected as malformed"
            );
        }
    }

    #[test]
    fn test_wildcard_rejected() {
        for value in ["my-project:*", "*:test", "my-*:test"] {
            let err = authorize("my-project", "test", &meta(Some(value))).unwrap_err();
            assert!(matches!(
                err,
                UpdateError::InvalidAuthorization { ref reason, .. } if reason.contains("wildcards")
            ));
        }
    }
}
