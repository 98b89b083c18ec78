//! Terminal detection for choosing between fancy and plain output

use std::io::IsTerminal;

/// Environment variables whose presence marks a CI run
const CI_VARS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "TRAVIS",
    "JENKINS_URL",
    "BUILDKITE",
    "TEAMCITY_VERSION",
    "TF_BUILD",
];

/// How the current invocation may talk to the user
#[derive(Debug, Clone)]
pub struct UiContext {
    /// Spinners and prompts are allowed
    interactive: bool,
    /// Prompts are answered with "yes" without asking
    auto_yes: bool,
}

impl UiContext {
    /// Inspect the process environment
    ///
    /// Progress goes to stderr, so stderr (not stdout) must be a terminal;
    /// script output piped elsewhere then stays free of spinner frames.
    pub fn detect() -> Self {
        let terminal = std::io::stderr().is_terminal() && std::io::stdin().is_terminal();
        Self {
            interactive: terminal && !in_ci(|var| std::env::var_os(var).is_some()),
            auto_yes: false,
        }
    }

    /// Plain output, no prompts
    pub fn non_interactive() -> Self {
        Self {
            interactive: false,
            auto_yes: false,
        }
    }

    /// Answer every confirmation with "yes"
    pub fn with_auto_yes(mut self, yes: bool) -> Self {
        self.auto_yes = yes;
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn auto_yes(&self) -> bool {
        self.auto_yes
    }

    /// Whether spinners and cliclack styling should be used
    pub fn use_fancy_output(&self) -> bool {
        self.interactive
    }
}

fn in_ci(is_set: impl Fn(&str) -> bool) -> bool {
    CI_VARS.iter().any(|var| is_set(var))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_interactive_context() {
        let ctx = UiContext::non_interactive();
        assert!(!ctx.is_interactive());
        assert!(!ctx.use_fancy_output());
        assert!(!ctx.auto_yes());
    }

    #[test]
    fn with_auto_yes() {
        let ctx = UiContext::non_interactive().with_auto_yes(true);
        assert!(ctx.auto_yes());
    }

    #[test]
    fn ci_detection() {
        assert!(in_ci(|var| var == "GITHUB_ACTIONS"));
        assert!(in_ci(|var| var == "CI"));
        assert!(!in_ci(|_| false));
    }
}
