//! Declarative UI locators rendered to Playwright selector strings

use std::fmt;

/// A declarative rule locating exactly one UI element at interaction time.
///
/// Selectors are rendered to Playwright selector strings and re-evaluated
/// against the live DOM at each step, never cached. The style-switcher UI
/// renders two kinds of image-labelled buttons that look identical: one
/// applies a style directly, the other only opens the profile menu. The
/// `aria-haspopup="menu"` hint the menu trigger carries is what tells them
/// apart, so the distinction is part of the selector type rather than the
/// call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Raw CSS selector.
    Css(String),

    /// A direct-action button identified by the image label it displays.
    /// Excludes menu triggers via the `aria-haspopup` hint.
    ActionButton { image_alt: String },

    /// A menu-opening button identified by the image label it displays.
    MenuTrigger { image_alt: String },

    /// A menu entry identified by its role and the image label it contains.
    MenuItem { image_alt: String },

    /// An image identified by its alt label, clicked directly. Used where
    /// the clickable control is not a `button` element: the switcher UI
    /// renders its style toggle and profile entries as plain containers
    /// around the image.
    Image { alt: String },
}

impl Selector {
    pub fn css(css: impl Into<String>) -> Self {
        Selector::Css(css.into())
    }

    pub fn action_button(image_alt: impl Into<String>) -> Self {
        Selector::ActionButton {
            image_alt: image_alt.into(),
        }
    }

    pub fn menu_trigger(image_alt: impl Into<String>) -> Self {
        Selector::MenuTrigger {
            image_alt: image_alt.into(),
        }
    }

    pub fn menu_item(image_alt: impl Into<String>) -> Self {
        Selector::MenuItem {
            image_alt: image_alt.into(),
        }
    }

    pub fn image(alt: impl Into<String>) -> Self {
        Selector::Image { alt: alt.into() }
    }

    /// Render to a Playwright selector string.
    pub fn to_playwright(&self) -> String {
        match self {
            Selector::Css(css) => css.clone(),
            Selector::ActionButton { image_alt } => format!(
                r#"button:not([aria-haspopup="menu"]):has(img[alt="{image_alt}"])"#
            ),
            Selector::MenuTrigger { image_alt } => {
                format!(r#"button[aria-haspopup="menu"]:has(img[alt="{image_alt}"])"#)
            }
            Selector::MenuItem { image_alt } => {
                format!(r#"div[role="menuitem"]:has(img[alt="{image_alt}"])"#)
            }
            Selector::Image { alt } => format!(r#"img[alt="{alt}"]"#),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_playwright())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(
        Selector::action_button("orto"),
        r#"button:not([aria-haspopup="menu"]):has(img[alt="orto"])"#;
        "action button excludes menu triggers"
    )]
    #[test_case(
        Selector::menu_trigger("standard"),
        r#"button[aria-haspopup="menu"]:has(img[alt="standard"])"#;
        "menu trigger requires the haspopup hint"
    )]
    #[test_case(
        Selector::menu_item("speed"),
        r#"div[role="menuitem"]:has(img[alt="speed"])"#;
        "menu item is located by role and image label"
    )]
    #[test_case(
        Selector::image("Orto"),
        r#"img[alt="Orto"]"#;
        "image is located by alt label alone, no tag lock"
    )]
    #[test_case(
        Selector::css("canvas.maplibregl-canvas"),
        "canvas.maplibregl-canvas";
        "css passes through"
    )]
    fn renders_playwright_selector(selector: Selector, expected: &str) {
        assert_eq!(selector.to_playwright(), expected);
        assert_eq!(selector.to_string(), expected);
    }

    #[test]
    fn action_button_and_menu_trigger_never_collide() {
        // Same image label, mutually exclusive attribute predicates.
        let action = Selector::action_button("orto").to_playwright();
        let trigger = Selector::menu_trigger("orto").to_playwright();
        assert_ne!(action, trigger);
        assert!(action.contains(":not([aria-haspopup"));
        assert!(!trigger.contains(":not("));
    }
}
