//! Typed step descriptors and the two built-in verification scripts
//!
//! The interaction sequence is data, not code: a `Script` is an ordered list
//! of `Step`s executed by one driver. The map application has shipped two
//! structures of its style-switcher UI, so there are two step lists sharing
//! the same executor instead of two near-duplicate procedures.

use std::time::Duration;

use crate::selector::Selector;

/// Budget for the initial map canvas load, the readiness gate for the run.
pub const DEFAULT_CANVAS_TIMEOUT: Duration = Duration::from_secs(20);

/// Budget for menu/profile controls to appear after a click.
const MENU_TIMEOUT: Duration = Duration::from_secs(5);

/// Settle after the initial load, while tiles and styles finish drawing.
const LOAD_SETTLE: Duration = Duration::from_secs(2);

/// Settle after a style or profile switch, while the map transitions.
const TRANSITION_SETTLE: Duration = Duration::from_secs(1);

/// The map canvas; its visibility is the readiness signal for the whole run.
fn map_canvas() -> Selector {
    Selector::css("canvas.maplibregl-canvas")
}

/// One step of the verification script.
#[derive(Debug, Clone)]
pub enum Step {
    /// Load the target page. Fatal if it never becomes reachable.
    Navigate,

    /// Block until a matching element is present and rendered visible,
    /// or fail with a timeout once the budget elapses.
    AwaitVisible {
        selector: Selector,
        timeout: Duration,
    },

    /// Unconditional pause for animations and tile loads to finish.
    /// A heuristic wait, not a correctness wait.
    Settle { duration: Duration },

    /// Serialize the current viewport to a PNG named by order and label.
    Capture { label: &'static str },

    /// Resolve exactly one interactable element and click it.
    Click { selector: Selector },
}

impl Step {
    /// Short name used in progress reporting and logs.
    pub fn name(&self) -> String {
        match self {
            Step::Navigate => "navigate".to_string(),
            Step::AwaitVisible { selector, .. } => format!("await:{selector}"),
            Step::Settle { duration } => format!("settle:{}ms", duration.as_millis()),
            Step::Capture { label } => format!("capture:{label}"),
            Step::Click { selector } => format!("click:{selector}"),
        }
    }
}

/// Which structure of the style-switcher UI the script assumes.
///
/// The application source contains both components; `Dropdown` matches the
/// current one and is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Direct orthophoto button plus a profile menu behind an
    /// `aria-haspopup="menu"` trigger.
    Dropdown,
    /// Direct orthophoto toggle plus a chevron disclosure that expands the
    /// profile list in place.
    Switcher,
}

impl Variant {
    pub fn script(self) -> Script {
        self.script_with_timeout(DEFAULT_CANVAS_TIMEOUT)
    }

    pub fn script_with_timeout(self, canvas_timeout: Duration) -> Script {
        match self {
            Variant::Dropdown => Script::dropdown(canvas_timeout),
            Variant::Switcher => Script::switcher(canvas_timeout),
        }
    }
}

/// A named, ordered verification script.
#[derive(Debug, Clone)]
pub struct Script {
    pub name: &'static str,
    pub steps: Vec<Step>,
}

impl Script {
    /// Script for the dropdown UI: the orthophoto switch is the
    /// image-labelled button *without* the menu hint, the profile menu opens
    /// from the button *with* it, and profiles are menu items.
    pub fn dropdown(canvas_timeout: Duration) -> Self {
        Script {
            name: "map-styles-dropdown",
            steps: vec![
                Step::Navigate,
                Step::AwaitVisible {
                    selector: map_canvas(),
                    timeout: canvas_timeout,
                },
                Step::Settle {
                    duration: LOAD_SETTLE,
                },
                Step::Capture {
                    label: "initial_view",
                },
                Step::Click {
                    selector: Selector::action_button("orto"),
                },
                Step::Settle {
                    duration: TRANSITION_SETTLE,
                },
                Step::Capture {
                    label: "orthophoto_view",
                },
                // The trigger still shows the standard style image while the
                // orthophoto view is active.
                Step::Click {
                    selector: Selector::menu_trigger("standard"),
                },
                Step::AwaitVisible {
                    selector: Selector::menu_item("speed"),
                    timeout: MENU_TIMEOUT,
                },
                Step::Click {
                    selector: Selector::menu_item("speed"),
                },
                Step::Settle {
                    duration: TRANSITION_SETTLE,
                },
                Step::Capture {
                    label: "speed_profile_view",
                },
            ],
        }
    }

    /// Script for the switcher UI. Its style toggle and profile entries are
    /// image-labelled containers rather than `button` elements, and the
    /// images carry the profile display names ("Orto", "Greičiai"), so the
    /// clicks land on the images themselves; only the chevron disclosure
    /// that expands the profile list is a real button.
    pub fn switcher(canvas_timeout: Duration) -> Self {
        Script {
            name: "map-styles-switcher",
            steps: vec![
                Step::Navigate,
                Step::AwaitVisible {
                    selector: map_canvas(),
                    timeout: canvas_timeout,
                },
                Step::Settle {
                    duration: LOAD_SETTLE,
                },
                Step::Capture {
                    label: "initial_view",
                },
                // The toggle shows the image of the style it would switch
                // to, so the orthophoto image is what is visible while the
                // standard style is active.
                Step::Click {
                    selector: Selector::image("Orto"),
                },
                Step::Settle {
                    duration: TRANSITION_SETTLE,
                },
                Step::Capture {
                    label: "orthophoto_view",
                },
                Step::Click {
                    selector: Selector::css("button:has(svg.lucide-chevron-up)"),
                },
                Step::AwaitVisible {
                    selector: Selector::image("Greičiai"),
                    timeout: MENU_TIMEOUT,
                },
                Step::Click {
                    selector: Selector::image("Greičiai"),
                },
                Step::Settle {
                    duration: TRANSITION_SETTLE,
                },
                Step::Capture {
                    label: "speed_profile_view",
                },
            ],
        }
    }

    /// Screenshot file names this script produces, in capture order.
    /// Stable across reruns: artifacts are overwritten, never accumulated.
    pub fn artifact_names(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                Step::Capture { label } => Some(*label),
                _ => None,
            })
            .enumerate()
            .map(|(i, label)| artifact_file_name(i + 1, label))
            .collect()
    }
}

/// Artifact file name for the `ordinal`-th capture (1-based).
pub fn artifact_file_name(ordinal: usize, label: &str) -> String {
    format!("{ordinal:02}_{label}.png")
}
