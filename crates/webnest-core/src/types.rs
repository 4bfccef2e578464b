//! Small value types used across the bridge.

use serde::{Deserialize, Serialize};

/// Pixel dimensions of the embedded view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(600, 600)
    }
}

/// How the host window appears when first shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visibility {
    /// Normal window at its configured size.
    #[default]
    Default,
    Maximized,
    Minimized,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Default => "default",
            Visibility::Maximized => "maximized",
            Visibility::Minimized => "minimized",
        }
    }
}

/// Constraint attached to a resize request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SizeHint {
    /// Resize now, no constraint recorded.
    #[default]
    None,
    /// The given size becomes the smallest the user may shrink to.
    Min,
    /// The given size becomes the largest the user may grow to.
    Max,
    /// The window is pinned at the given size.
    Fixed,
}

impl SizeHint {
    /// Wire value shared with the legacy module's flat C surface.
    pub fn code(self) -> i32 {
        match self {
            SizeHint::None => 0,
            SizeHint::Min => 1,
            SizeHint::Max => 2,
            SizeHint::Fixed => 3,
        }
    }
}

/// Engine family requested by the embedder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Engine {
    /// Use whatever the platform prefers.
    #[default]
    Auto,
    /// The Chromium based engine (Windows only).
    Chromium,
    /// The bundled legacy module (Windows only).
    Legacy,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Auto => "auto",
            Engine::Chromium => "chromium",
            Engine::Legacy => "legacy",
        }
    }
}

/// Which backend is actually driving an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Chromium engine behind hand built COM plumbing.
    Chromium,
    /// Companion object driven through runtime reflection.
    Reflective,
    /// Flat C surface of the bundled legacy module.
    Legacy,
    /// In process stand in with no native engine.
    Headless,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Chromium => "chromium",
            BackendKind::Reflective => "reflective",
            BackendKind::Legacy => "legacy",
            BackendKind::Headless => "headless",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_size() {
        assert_eq!(Size::default(), Size::new(600, 600));
    }

    #[test]
    fn test_engine_default_is_auto() {
        assert_eq!(Engine::default(), Engine::Auto);
    }

    #[test]
    fn test_size_hint_codes() {
        assert_eq!(SizeHint::None.code(), 0);
        assert_eq!(SizeHint::Min.code(), 1);
        assert_eq!(SizeHint::Max.code(), 2);
        assert_eq!(SizeHint::Fixed.code(), 3);
        assert_eq!(SizeHint::default(), SizeHint::None);
    }
}
