//! Terminal output helpers
//!
//! Uses `cliclack` for prompts and status lines, and `indicatif` for the
//! download spinner, with plain fallbacks in CI and when piped.
//!
//! # Example
//!
//! ```rust,ignore
//! use runscripts::ui::{self, UiContext};
//!
//! let ctx = UiContext::detect().with_auto_yes(yes);
//! if ui::confirm(&ctx, "Clear all cached scripts?", false).await? {
//!     ui::step_ok_detail(&ctx, "Cache cleared", &dir);
//! }
//! ```

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{step_info, step_ok_detail, step_warn};
pub use progress::TaskSpinner;
pub use prompts::confirm;
