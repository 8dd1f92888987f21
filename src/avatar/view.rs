//! The filtered, sorted slice of an avatar's parameters that a display
//! layer currently shows.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::osc::OscValue;

use super::filter::{ControllableFilter, ParamFilter, PrefixExclusionFilter, SelectionFilter};
use super::{Avatar, ParamRef, SubscriberId};

pub struct ParamView {
    filters: Vec<Box<dyn ParamFilter>>,
    visible: Vec<ParamRef>,
    subscriptions: Vec<(ParamRef, SubscriberId)>,
    changes: Rc<RefCell<VecDeque<(String, OscValue)>>>,
}

impl ParamView {
    pub fn new(filters: Vec<Box<dyn ParamFilter>>) -> Self {
        Self {
            filters,
            visible: Vec::new(),
            subscriptions: Vec::new(),
            changes: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// The standard filter stack: selection, prefix exclusion, and the
    /// controllable-only filter (the only one active by default).
    pub fn standard(excluded_prefixes: &[String]) -> Self {
        Self::new(vec![
            Box::new(SelectionFilter::new()),
            Box::new(PrefixExclusionFilter::new(excluded_prefixes)),
            Box::new(ControllableFilter::new()),
        ])
    }

    pub fn filters(&self) -> &[Box<dyn ParamFilter>] {
        &self.filters
    }

    /// Flip the filter with the given label and rebuild. Returns false if no
    /// filter carries that label.
    pub fn toggle(&mut self, label: &str, avatar: &Avatar) -> bool {
        let Some(filter) = self.filters.iter_mut().find(|f| f.label() == label) else {
            return false;
        };
        let active = filter.is_active();
        filter.set_active(!active);
        self.recompute(avatar);
        true
    }

    /// Full rebuild: intersect all active filters, sort by name, tear down
    /// every existing subscription and re-subscribe to the visible set.
    /// There is no incremental path; filter toggles are rare.
    pub fn recompute(&mut self, avatar: &Avatar) {
        for (param, id) in self.subscriptions.drain(..) {
            param.borrow_mut().unsubscribe(id);
        }

        let mut selection = avatar.params();
        for filter in self.filters.iter().filter(|f| f.is_active()) {
            selection = filter.matches(&selection);
        }
        selection.sort_by(|a, b| a.borrow().name.cmp(&b.borrow().name));

        for param in &selection {
            let name = param.borrow().name.clone();
            let changes = Rc::clone(&self.changes);
            let id = param.borrow_mut().subscribe(Box::new(move |value| {
                changes.borrow_mut().push_back((name.clone(), *value));
                Ok(())
            }));
            self.subscriptions.push((Rc::clone(param), id));
        }
        self.visible = selection;
    }

    /// Current display sequence, sorted by name ascending.
    pub fn items(&self) -> &[ParamRef] {
        &self.visible
    }

    /// Drain queued value changes of visible parameters.
    pub fn take_changes(&mut self) -> Vec<(String, OscValue)> {
        self.changes.borrow_mut().drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::testing::{loaded_avatar, RecordingSender};

    fn visible_names(view: &ParamView) -> Vec<String> {
        view.items()
            .iter()
            .map(|p| p.borrow().name.clone())
            .collect()
    }

    #[test]
    fn default_view_is_controllable_sorted_by_name() {
        let avatar = loaded_avatar(RecordingSender::new());
        let mut view = ParamView::standard(&["Go/".to_string()]);
        view.recompute(&avatar);
        // VelocityX has no input address and is filtered out by default.
        assert_eq!(
            visible_names(&view),
            vec!["Emote", "GestureWeight", "Go/Locomotion"]
        );
    }

    #[test]
    fn disabling_controllable_reveals_output_only_params() {
        let avatar = loaded_avatar(RecordingSender::new());
        let mut view = ParamView::standard(&["Go/".to_string()]);
        view.recompute(&avatar);
        let before = view.items().len();

        assert!(view.toggle("Controllable", &avatar));
        assert_eq!(view.items().len(), before + 1);
        assert!(visible_names(&view).contains(&"VelocityX".to_string()));
    }

    #[test]
    fn active_filters_intersect() {
        let avatar = loaded_avatar(RecordingSender::new());
        avatar.param("Emote").unwrap().borrow_mut().selected = true;
        avatar.param("Go/Locomotion").unwrap().borrow_mut().selected = true;

        let mut view = ParamView::standard(&["Go/".to_string()]);
        view.toggle("Selected", &avatar);
        view.toggle("Exclude prefixes", &avatar);
        assert_eq!(visible_names(&view), vec!["Emote"]);
    }

    #[test]
    fn unknown_label_is_rejected() {
        let avatar = loaded_avatar(RecordingSender::new());
        let mut view = ParamView::standard(&[]);
        view.recompute(&avatar);
        let before = visible_names(&view);
        assert!(!view.toggle("No Such Filter", &avatar));
        assert_eq!(visible_names(&view), before);
    }

    #[test]
    fn changes_flow_only_from_visible_params() {
        let avatar = loaded_avatar(RecordingSender::new());
        let mut view = ParamView::standard(&[]);
        view.recompute(&avatar);

        avatar
            .param("Emote")
            .unwrap()
            .borrow_mut()
            .set_value(OscValue::Int(2));
        assert_eq!(
            view.take_changes(),
            vec![("Emote".to_string(), OscValue::Int(2))]
        );

        // Narrow the view to nothing; the old subscription must be gone.
        view.toggle("Selected", &avatar);
        assert!(view.items().is_empty());
        avatar
            .param("Emote")
            .unwrap()
            .borrow_mut()
            .set_value(OscValue::Int(3));
        assert!(view.take_changes().is_empty());
    }

    #[test]
    fn recompute_does_not_stack_subscriptions() {
        let avatar = loaded_avatar(RecordingSender::new());
        let mut view = ParamView::standard(&[]);
        view.recompute(&avatar);
        view.recompute(&avatar);
        view.recompute(&avatar);

        avatar
            .param("Emote")
            .unwrap()
            .borrow_mut()
            .set_value(OscValue::Int(1));
        assert_eq!(view.take_changes().len(), 1);
    }
}
