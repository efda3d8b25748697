//! # Sources
//!
//! Matching update instructions against the live sources of an Application
//! and computing the sources the Application should end up with.
//!
//! - Chart sources (either side names a chart) match on exact
//!   `(repoURL, chart)` equality
//! - Git sources match on the normalized `repoURL`, see
//!   [`normalize_git_url`]

use super::types::UpdateError;
use super::utils::normalize_git_url;
use crate::crd::{Application, ApplicationSource, HelmParameter};
use crate::step::{AppUpdate, KustomizeImageUpdate, SourceUpdate};

/// Whether an update instruction targets the given live source
#[must_use]
pub fn source_matches(update: &SourceUpdate, source: &ApplicationSource) -> bool {
    if !source.chart.is_empty() || !update.chart.is_empty() {
        return source.repo_url == update.repo_url && source.chart == update.chart;
    }
    normalize_git_url(&source.repo_url) == normalize_git_url(&update.repo_url)
}

/// Apply one update instruction to a live source
///
/// Returns the (possibly) updated source and whether the instruction
/// matched it. A source that does not match is returned untouched.
#[must_use]
pub fn apply_source_update(
    update: &SourceUpdate,
    desired_revision: &str,
    mut source: ApplicationSource,
) -> (ApplicationSource, bool) {
    if !source_matches(update, &source) {
        return (source, false);
    }

    if update.update_target_revision && !desired_revision.is_empty() {
        source.target_revision = desired_revision.to_string();
    }

    if let Some(kustomize) = update.kustomize.as_ref().filter(|k| !k.images.is_empty()) {
        source.kustomize.get_or_insert_with(Default::default).images =
            kustomize.images.iter().map(kustomize_image).collect();
    }

    if let Some(helm) = update.helm.as_ref().filter(|h| !h.images.is_empty()) {
        let parameters = &mut source.helm.get_or_insert_with(Default::default).parameters;
        for image in &helm.images {
            match parameters.iter_mut().find(|p| p.name == image.key) {
                Some(parameter) => parameter.value.clone_from(&image.value),
                None => parameters.push(HelmParameter {
                    name: image.key.clone(),
                    value: image.value.clone(),
                    force_string: false,
                }),
            }
        }
    }

    (source, true)
}

/// Render a Kustomize image override: `repo[=newName]` followed by
/// `@digest` or `:tag`, digest taking precedence
fn kustomize_image(image: &KustomizeImageUpdate) -> String {
    let mut rendered = image.repo_url.clone();
    if let Some(new_name) = image.new_name.as_deref().filter(|n| !n.is_empty()) {
        rendered.push('=');
        rendered.push_str(new_name);
    }
    if let Some(digest) = image.digest.as_deref().filter(|d| !d.is_empty()) {
        rendered.push('@');
        rendered.push_str(digest);
    } else if let Some(tag) = image.tag.as_deref().filter(|t| !t.is_empty()) {
        rendered.push(':');
        rendered.push_str(tag);
    }
    rendered
}

/// Desired revision for each live source of the Application
///
/// The list is index-aligned with [`Application::sources`]. A source gets the
/// `desiredRevision` of the first instruction naming exactly its
/// `(repoURL, chart)` pair, and an empty string when no instruction does.
/// An Application without sources yields an empty list.
#[must_use]
pub fn desired_revisions(update: &AppUpdate, app: &Application) -> Vec<String> {
    app.sources()
        .iter()
        .map(|source| {
            update
                .sources
                .iter()
                .find(|u| u.repo_url == source.repo_url && u.chart == source.chart)
                .map(|u| u.desired_revision.clone())
                .unwrap_or_default()
        })
        .collect()
}

/// Compute the sources the Application should have after the update
///
/// Starts from a copy of the live sources and applies every instruction to
/// the first source it matches.
///
/// # Errors
///
/// Returns [`UpdateError::NoMatchingSource`] when an instruction matches no
/// source, and [`UpdateError::SourceMismatch`] when `desired_revisions` is
/// not aligned with the live sources.
pub fn build_desired_sources(
    update: &AppUpdate,
    desired_revisions: &[String],
    app: &Application,
) -> Result<Vec<ApplicationSource>, UpdateError> {
    let mut sources = app.sources();
    if sources.len() != desired_revisions.len() {
        return Err(UpdateError::SourceMismatch {
            namespace: app.namespace().to_string(),
            name: app.name().to_string(),
            sources: sources.len(),
            revisions: desired_revisions.len(),
        });
    }

    for source_update in &update.sources {
        let mut matched = false;
        for (source, desired_revision) in sources.iter_mut().zip(desired_revisions) {
            let (updated, did_match) =
                apply_source_update(source_update, desired_revision, std::mem::take(source));
            *source = updated;
            if did_match {
                matched = true;
                break;
            }
        }
        if !matched {
            return Err(UpdateError::NoMatchingSource {
                namespace: app.namespace().to_string(),
                name: app.name().to_string(),
                repo_url: source_update.repo_url.clone(),
                chart: Some(source_update.chart.clone()).filter(|c| !c.is_empty()),
            });
        }
    }

    Ok(sources)
}
