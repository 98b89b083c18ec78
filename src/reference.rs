//! Script reference resolution
//!
//! Turns a user token of the form `[SCOPE:]SCRIPT[@REF]` into a
//! [`ScriptLocator`]:
//!
//! - `pt-summary` → default scope, `{ref}` from config
//! - `github:runscripts/scripts/pt-summary` → `github` scope, owner/repo/path
//! - `demo:tools/hello@v1` → `demo` scope, ref `v1`

use crate::config::{Config, SourcesConfig};
use crate::error::{RunError, RunResult};
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::debug;

/// A resolved script reference. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLocator {
    /// Namespace the script belongs to
    pub scope: String,
    /// Script path within the scope, e.g. `owner/repo/tool.sh`
    pub script: String,
    /// Where the script content is fetched from
    pub source_url: String,
    /// Short content-addressed identifier for the cache slot
    pub cache_id: String,
}

impl ScriptLocator {
    /// Build a locator, deriving the cache id from scope, script and URL
    pub fn new(
        scope: impl Into<String>,
        script: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        let scope = scope.into();
        let script = script.into();
        let source_url = source_url.into();
        let cache_id = cache_id(&scope, &script, &source_url);
        Self {
            scope,
            script,
            source_url,
            cache_id,
        }
    }

    /// Name of the cached file (last path segment of the script)
    pub fn file_name(&self) -> &str {
        self.script.rsplit('/').next().unwrap_or(&self.script)
    }
}

impl fmt::Display for ScriptLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scope, self.script)
    }
}

/// SHA256 over the NUL-separated fields, first 12 hex chars
fn cache_id(scope: &str, script: &str, source_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(scope.as_bytes());
    hasher.update([0]);
    hasher.update(script.as_bytes());
    hasher.update([0]);
    hasher.update(source_url.as_bytes());
    let result = hasher.finalize();

    hex::encode(&result[..6])
}

/// Resolves reference tokens against the configured sources
#[derive(Debug, Clone)]
pub struct Resolver {
    sources: SourcesConfig,
    default_scope: String,
    default_ref: String,
}

impl Resolver {
    /// Create a resolver over explicit sources
    pub fn new(
        sources: SourcesConfig,
        default_scope: impl Into<String>,
        default_ref: impl Into<String>,
    ) -> Self {
        Self {
            sources,
            default_scope: default_scope.into(),
            default_ref: default_ref.into(),
        }
    }

    /// Create a resolver from loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.sources.clone(),
            config.general.default_scope.clone(),
            config.general.default_ref.clone(),
        )
    }

    /// Resolve a raw token into a locator
    pub fn resolve(&self, token: &str) -> RunResult<ScriptLocator> {
        let token = token.trim();

        let (scope, rest) = match token.split_once(':') {
            Some((scope, rest)) => {
                validate_scope(token, scope)?;
                (scope, rest)
            }
            None => (self.default_scope.as_str(), token),
        };

        let (script, git_ref) = match rest.rsplit_once('@') {
            Some((_, "")) => {
                return Err(RunError::invalid_reference(token, "ref after '@' is empty"))
            }
            Some((script, git_ref)) => (script, git_ref),
            None => (rest, self.default_ref.as_str()),
        };

        validate_script(token, script)?;

        let template = self
            .sources
            .template(scope)
            .ok_or_else(|| RunError::UnknownScope(scope.to_string()))?;
        let source_url = expand_template(token, template, script, git_ref)?;

        let locator = ScriptLocator::new(scope, script, source_url);
        debug!(
            "Resolved {} to {} (cache id {})",
            token, locator.source_url, locator.cache_id
        );
        Ok(locator)
    }
}

fn validate_scope(token: &str, scope: &str) -> RunResult<()> {
    if scope.is_empty() {
        return Err(RunError::invalid_reference(token, "scope before ':' is empty"));
    }
    if !scope
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(RunError::invalid_reference(
            token,
            format!(
                "scope '{}' must contain only alphanumeric characters, hyphens, or underscores",
                scope
            ),
        ));
    }
    Ok(())
}

/// Reject empty names and anything that could escape the cache slot
fn validate_script(token: &str, script: &str) -> RunResult<()> {
    if script.is_empty() {
        return Err(RunError::invalid_reference(token, "script name is empty"));
    }
    if script.contains('\\') || script.contains('\0') {
        return Err(RunError::invalid_reference(
            token,
            "script name must not contain backslashes or NUL",
        ));
    }
    if script.starts_with('/') {
        return Err(RunError::invalid_reference(
            token,
            "script name must not be an absolute path",
        ));
    }
    if script
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(RunError::invalid_reference(
            token,
            "script path has an empty, '.' or '..' segment",
        ));
    }
    Ok(())
}

fn expand_template(token: &str, template: &str, script: &str, git_ref: &str) -> RunResult<String> {
    let mut url = template
        .replace("{script}", script)
        .replace("{ref}", git_ref);

    let wants_split = ["{owner}", "{repo}", "{path}"]
        .iter()
        .any(|p| url.contains(p));
    if wants_split {
        let parts: Vec<&str> = script.splitn(3, '/').collect();
        let [owner, repo, path] = parts.as_slice() else {
            return Err(RunError::invalid_reference(
                token,
                "this scope expects OWNER/REPO/PATH",
            ));
        };
        url = url
            .replace("{owner}", owner)
            .replace("{repo}", repo)
            .replace("{path}", path);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> Resolver {
        let mut sources = SourcesConfig::default();
        sources.insert("demo", "https://scripts.example/demo/{ref}/{script}");
        Resolver::new(sources, "default", "master")
    }

    #[test]
    fn resolves_default_scope() {
        let locator = resolver().resolve("pt-summary").unwrap();
        assert_eq!(locator.scope, "default");
        assert_eq!(locator.script, "pt-summary");
        assert_eq!(
            locator.source_url,
            "https://raw.githubusercontent.com/runscripts/scripts/master/pt-summary"
        );
        assert_eq!(locator.cache_id.len(), 12);
    }

    #[test]
    fn resolves_explicit_scope() {
        let locator = resolver().resolve("demo:hello").unwrap();
        assert_eq!(locator.scope, "demo");
        assert_eq!(locator.script, "hello");
        assert_eq!(
            locator.source_url,
            "https://scripts.example/demo/master/hello"
        );
        assert_eq!(locator.to_string(), "demo:hello");
    }

    #[test]
    fn resolves_github_owner_repo_path() {
        let locator = resolver()
            .resolve("github:runscripts/scripts/tools/pt-summary")
            .unwrap();
        assert_eq!(
            locator.source_url,
            "https://raw.githubusercontent.com/runscripts/scripts/master/tools/pt-summary"
        );
        assert_eq!(locator.file_name(), "pt-summary");
    }

    #[test]
    fn git_ref_changes_url_and_cache_id() {
        let r = resolver();
        let master = r.resolve("demo:hello").unwrap();
        let tagged = r.resolve("demo:hello@v1.2").unwrap();
        assert_eq!(tagged.source_url, "https://scripts.example/demo/v1.2/hello");
        assert_eq!(tagged.script, "hello");
        assert_ne!(master.cache_id, tagged.cache_id);
    }

    #[test]
    fn resolution_is_deterministic() {
        let r = resolver();
        let a = r.resolve("demo:hello").unwrap();
        let b = r.resolve("demo:hello").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_scope_different_cache_id() {
        let r = resolver();
        let a = r.resolve("demo:hello").unwrap();
        let b = r.resolve("default:hello").unwrap();
        assert_ne!(a.cache_id, b.cache_id);
    }

    #[test]
    fn empty_script_is_invalid() {
        for token in ["", "demo:", "   ", "demo:@v1"] {
            let err = resolver().resolve(token).unwrap_err();
            assert!(
                matches!(err, RunError::InvalidReference { .. }),
                "{token:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn empty_scope_or_ref_is_invalid() {
        assert!(matches!(
            resolver().resolve(":hello"),
            Err(RunError::InvalidReference { .. })
        ));
        assert!(matches!(
            resolver().resolve("demo:hello@"),
            Err(RunError::InvalidReference { .. })
        ));
    }

    #[test]
    fn traversal_is_invalid() {
        for token in [
            "demo:../etc/passwd",
            "demo:/etc/passwd",
            "demo:a//b",
            "demo:a/./b",
            "demo:a\\b",
            "demo:tools/",
        ] {
            assert!(
                matches!(
                    resolver().resolve(token),
                    Err(RunError::InvalidReference { .. })
                ),
                "{token} should be rejected"
            );
        }
    }

    #[test]
    fn bad_scope_characters_are_invalid() {
        assert!(matches!(
            resolver().resolve("de mo:hello"),
            Err(RunError::InvalidReference { .. })
        ));
    }

    #[test]
    fn unknown_scope() {
        let err = resolver().resolve("nowhere:hello").unwrap_err();
        assert!(matches!(err, RunError::UnknownScope(ref s) if s == "nowhere"));
    }

    #[test]
    fn github_scope_needs_three_segments() {
        let err = resolver().resolve("github:runscripts/pt-summary").unwrap_err();
        assert!(matches!(err, RunError::InvalidReference { .. }));
    }

    #[test]
    fn cache_id_is_stable() {
        let locator = ScriptLocator::new("demo", "hello", "file:///tmp/hello");
        assert_eq!(
            locator.cache_id,
            ScriptLocator::new("demo", "hello", "file:///tmp/hello").cache_id
        );
        assert_ne!(
            locator.cache_id,
            ScriptLocator::new("demo", "hello", "file:///tmp/other").cache_id
        );
    }
}
