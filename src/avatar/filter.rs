//! Toggleable display filters over the parameter set.
//!
//! Filters are pure subset predicates, so applying any combination of
//! active filters is an intersection and the order never matters.

use regex::Regex;

use super::{AvatarParam, ParamRef};

pub trait ParamFilter {
    /// Whether `param` stays in the displayed subset.
    fn keep(&self, param: &AvatarParam) -> bool;

    fn label(&self) -> &str;

    fn is_active(&self) -> bool;

    fn set_active(&mut self, active: bool);

    fn default_active(&self) -> bool {
        false
    }

    fn matches(&self, params: &[ParamRef]) -> Vec<ParamRef> {
        params
            .iter()
            .filter(|p| self.keep(&p.borrow()))
            .cloned()
            .collect()
    }
}

/// Keep only parameters the user has marked. Off by default.
pub struct SelectionFilter {
    active: bool,
}

impl SelectionFilter {
    pub fn new() -> Self {
        Self { active: false }
    }
}

impl ParamFilter for SelectionFilter {
    fn keep(&self, param: &AvatarParam) -> bool {
        param.selected
    }

    fn label(&self) -> &str {
        "Selected"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// Drop parameters whose name starts with any configured prefix. Locomotion
/// systems like GoGoLoco inject dozens of parameters under a common prefix
/// that drown out the avatar's own. Off by default.
pub struct PrefixExclusionFilter {
    active: bool,
    patterns: Vec<Regex>,
}

impl PrefixExclusionFilter {
    pub fn new(prefixes: &[String]) -> Self {
        let patterns = prefixes
            .iter()
            .filter_map(|p| Regex::new(&format!("^{}", regex::escape(p))).ok())
            .collect();
        Self {
            active: false,
            patterns,
        }
    }
}

impl ParamFilter for PrefixExclusionFilter {
    fn keep(&self, param: &AvatarParam) -> bool {
        !self.patterns.iter().any(|p| p.is_match(&param.name))
    }

    fn label(&self) -> &str {
        "Exclude prefixes"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// Keep only parameters that accept writes (non-empty input address).
/// On by default: read-only parameters are noise on a remote.
pub struct ControllableFilter {
    active: bool,
}

impl ControllableFilter {
    pub fn new() -> Self {
        Self { active: true }
    }
}

impl ParamFilter for ControllableFilter {
    fn keep(&self, param: &AvatarParam) -> bool {
        !param.input_address.is_empty()
    }

    fn label(&self) -> &str {
        "Controllable"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn default_active(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::testing::{loaded_avatar, RecordingSender};

    fn names(params: &[ParamRef]) -> Vec<String> {
        let mut names: Vec<String> = params.iter().map(|p| p.borrow().name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn defaults_match_their_contract() {
        assert!(!SelectionFilter::new().is_active());
        assert!(!SelectionFilter::new().default_active());
        assert!(!PrefixExclusionFilter::new(&["Go/".to_string()]).is_active());
        assert!(ControllableFilter::new().is_active());
        assert!(ControllableFilter::new().default_active());
    }

    #[test]
    fn selection_filter_keeps_marked_params() {
        let avatar = loaded_avatar(RecordingSender::new());
        avatar.param("Emote").unwrap().borrow_mut().selected = true;
        let subset = SelectionFilter::new().matches(&avatar.params());
        assert_eq!(names(&subset), vec!["Emote"]);
    }

    #[test]
    fn prefix_filter_drops_matching_names() {
        let avatar = loaded_avatar(RecordingSender::new());
        let filter = PrefixExclusionFilter::new(&["Go/".to_string()]);
        let subset = filter.matches(&avatar.params());
        assert_eq!(names(&subset), vec!["Emote", "GestureWeight", "VelocityX"]);
    }

    #[test]
    fn prefix_is_anchored_at_the_start() {
        let avatar = loaded_avatar(RecordingSender::new());
        // "Gesture" appears mid-name nowhere; "e" appears in most names but
        // only as an infix, so nothing is dropped.
        let filter = PrefixExclusionFilter::new(&["e".to_string()]);
        assert_eq!(filter.matches(&avatar.params()).len(), avatar.len());
    }

    #[test]
    fn controllable_filter_drops_output_only_params() {
        let avatar = loaded_avatar(RecordingSender::new());
        let subset = ControllableFilter::new().matches(&avatar.params());
        assert_eq!(
            names(&subset),
            vec!["Emote", "GestureWeight", "Go/Locomotion"]
        );
    }

    #[test]
    fn filters_commute() {
        let avatar = loaded_avatar(RecordingSender::new());
        avatar.param("Emote").unwrap().borrow_mut().selected = true;
        avatar.param("Go/Locomotion").unwrap().borrow_mut().selected = true;

        let filters: Vec<Box<dyn ParamFilter>> = vec![
            Box::new(SelectionFilter::new()),
            Box::new(PrefixExclusionFilter::new(&["Go/".to_string()])),
            Box::new(ControllableFilter::new()),
        ];
        let all = avatar.params();
        for a in &filters {
            for b in &filters {
                let ab = b.matches(&a.matches(&all));
                let ba = a.matches(&b.matches(&all));
                assert_eq!(names(&ab), names(&ba));
            }
        }
    }
}
