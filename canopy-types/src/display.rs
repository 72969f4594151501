use serde::{Deserialize, Serialize};

/// Visibility of a surface as seen by the host.
///
/// Commits keep flowing in every mode; only delivery of mounting
/// transactions is held back while the surface is not `Visible`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Visible,
    /// Rendered off-screen, e.g. pre-rendering the next screen.
    Suspended,
    Hidden,
}

impl DisplayMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DisplayMode::Visible => "visible",
            DisplayMode::Suspended => "suspended",
            DisplayMode::Hidden => "hidden",
        }
    }

    pub fn is_visible(self) -> bool {
        self == DisplayMode::Visible
    }
}
