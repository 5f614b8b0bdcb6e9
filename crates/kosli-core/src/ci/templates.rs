//! Per-CI default templates for kosli flags.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use super::CiPlatform;

type FlagTemplates = BTreeMap<&'static str, &'static str>;

/// Flag name → template for every CI with defaults. Built once, never written.
static CI_TEMPLATES: Lazy<BTreeMap<CiPlatform, FlagTemplates>> = Lazy::new(|| {
    let table: &[(CiPlatform, &[(&str, &str)])] = &[
        (
            CiPlatform::GitHub,
            &[
                ("git-commit", "${GITHUB_SHA}"),
                ("repository", "${GITHUB_REPOSITORY}"),
                ("org", "${GITHUB_REPOSITORY_OWNER}"),
                (
                    "commit-url",
                    "${GITHUB_SERVER_URL}/${GITHUB_REPOSITORY}/commit/${GITHUB_SHA}",
                ),
                (
                    "build-url",
                    "${GITHUB_SERVER_URL}/${GITHUB_REPOSITORY}/actions/runs/${GITHUB_RUN_ID}",
                ),
            ],
        ),
        (
            CiPlatform::Bitbucket,
            &[
                ("git-commit", "${BITBUCKET_COMMIT}"),
                ("repository", "${BITBUCKET_REPO_SLUG}"),
                ("workspace", "${BITBUCKET_WORKSPACE}"),
                (
                    "commit-url",
                    "https://bitbucket.org/${BITBUCKET_WORKSPACE}/${BITBUCKET_REPO_SLUG}/commits/${BITBUCKET_COMMIT}",
                ),
                (
                    "build-url",
                    "https://bitbucket.org/${BITBUCKET_WORKSPACE}/${BITBUCKET_REPO_SLUG}/addon/pipelines/home#!/results/${BITBUCKET_BUILD_NUMBER}",
                ),
            ],
        ),
        (CiPlatform::TeamCity, &[("git-commit", "${BUILD_VCS_NUMBER}")]),
        (
            CiPlatform::GitLab,
            &[
                ("git-commit", "${CI_COMMIT_SHA}"),
                ("repository", "${CI_PROJECT_NAME}"),
                ("build-url", "${CI_JOB_URL}"),
                ("commit-url", "${CI_PROJECT_URL}/-/commit/${CI_COMMIT_SHA}"),
                ("namespace", "${CI_PROJECT_NAMESPACE}"),
            ],
        ),
        (
            CiPlatform::AzureDevOps,
            &[
                ("git-commit", "${BUILD_SOURCEVERSION}"),
                ("repository", "${BUILD_REPOSITORY_NAME}"),
                (
                    "build-url",
                    "${SYSTEM_COLLECTIONURI}${SYSTEM_TEAMPROJECT}/_build/results?buildId=${BUILD_BUILDID}",
                ),
                (
                    "commit-url",
                    "${SYSTEM_COLLECTIONURI}${SYSTEM_TEAMPROJECT}/_git/${BUILD_REPOSITORY_NAME}/commit/${BUILD_SOURCEVERSION}",
                ),
                ("org-url", "${SYSTEM_COLLECTIONURI}"),
                ("project", "${SYSTEM_TEAMPROJECT}"),
            ],
        ),
        (
            CiPlatform::CircleCI,
            &[
                ("git-commit", "${CIRCLE_SHA1}"),
                ("repository", "${CIRCLE_PROJECT_REPONAME}"),
                ("commit-url", "${CIRCLE_REPOSITORY_URL}/commit/${CIRCLE_SHA1}"),
                ("build-url", "${CIRCLE_BUILD_URL}"),
            ],
        ),
        (
            CiPlatform::CodeBuild,
            &[
                ("git-commit", "${CODEBUILD_RESOLVED_SOURCE_VERSION}"),
                (
                    "commit-url",
                    "${CODEBUILD_SOURCE_REPO_URL}/commit/${CODEBUILD_RESOLVED_SOURCE_VERSION}",
                ),
                ("build-url", "${CODEBUILD_BUILD_URL}"),
            ],
        ),
        (
            CiPlatform::Jenkins,
            &[
                ("git-commit", "${GIT_COMMIT}"),
                // GIT_URL may be an http or ssh remote
                ("commit-url", "${GIT_URL}/commit/${GIT_COMMIT}"),
                ("build-url", "${BUILD_URL}"),
            ],
        ),
    ];

    table
        .iter()
        .map(|(platform, flags)| (*platform, flags.iter().copied().collect()))
        .collect()
});

/// Raw template for `flag` on `platform`, before expansion.
pub fn template(platform: CiPlatform, flag: &str) -> Option<&'static str> {
    CI_TEMPLATES
        .get(&platform)
        .and_then(|flags| flags.get(flag))
        .copied()
}

/// Flags with a default on `platform`, in name order.
pub fn flags(platform: CiPlatform) -> Vec<&'static str> {
    CI_TEMPLATES
        .get(&platform)
        .map(|flags| flags.keys().copied().collect())
        .unwrap_or_default()
}

/// Help text listing how `flags` are defaulted in each of `platforms`.
///
/// Only flags that have a template on a platform appear under it.
pub fn ci_defaults_docs(platforms: &[CiPlatform], flags: &[&str]) -> String {
    let rule = "|---------------------------------------------------------------------------";
    let mut out = String::from("The following flags are defaulted as follows in the CI list below:\n\n   ");

    for platform in platforms {
        out.push_str(&format!("\n\t| {} \n\t{}", platform, rule));
        for flag in flags {
            if let Some(value) = template(*platform, flag) {
                out.push_str(&format!("\n\t| {} : {}", flag, value));
            }
        }
        out.push_str(&format!("\n\t{}", rule));
    }
    out
}
