//! Project locations on the CI service

use crate::domain::build::BuildId;

/// Default API root for GitHub-hosted projects
pub const GITHUB_API_ROOT: &str = "https://circleci.com/api/v1.1/project/github";

/// Default web root for GitHub-hosted projects
pub const GITHUB_WEB_ROOT: &str = "https://circleci.com/gh";

/// API and web base URLs of one project
///
/// The API base serves the recent-builds listing itself and one build per
/// `{api_base}/{id}`; the web base is what humans open in a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectUrls {
    api_base: String,
    web_base: String,
}

impl ProjectUrls {
    /// Create project URLs from explicit bases
    pub fn new(api_base: impl Into<String>, web_base: impl Into<String>) -> Self {
        let api_base = api_base.into();
        let web_base = web_base.into();
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            web_base: web_base.trim_end_matches('/').to_string(),
        }
    }

    /// URLs for a GitHub repository such as `octo-org/octo-repo`
    pub fn github(repository: &str) -> Self {
        let repository = repository.trim_matches('/');
        Self::new(
            format!("{}/{}", GITHUB_API_ROOT, repository),
            format!("{}/{}", GITHUB_WEB_ROOT, repository),
        )
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn web_base(&self) -> &str {
        &self.web_base
    }

    /// API endpoint for a single build
    pub fn api_build_url(&self, id: BuildId) -> String {
        format!("{}/{}", self.api_base, id)
    }

    /// Human-facing page for a single build
    pub fn build_url(&self, id: BuildId) -> String {
        format!("{}/{}", self.web_base, id)
    }
}
