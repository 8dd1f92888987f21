//! One controllable avatar parameter.
//!
//! Addresses are named from VRChat's point of view: `input_address` is where
//! the game accepts writes, `output_address` is where it reports changes.
//! Either may be empty; physbone-derived parameters, for example, report but
//! never accept writes.

use std::rc::Rc;

use crate::osc::{OscSender, OscValue, OscValueType};
use crate::translate;

/// Handle returned by `subscribe`; holders must `unsubscribe` explicitly
/// before going away. The parameter never owns its observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberId(u64);

/// Observer callback. An `Err` is logged and skipped; the remaining
/// observers are still notified.
pub type Subscriber = Box<dyn FnMut(&OscValue) -> Result<(), String>>;

pub struct AvatarParam {
    pub name: String,
    /// OSC path VRChat accepts writes on. Empty means not remotely writable.
    pub input_address: String,
    /// OSC path VRChat reports changes on. Empty means not reported.
    pub output_address: String,
    /// Resolved value type; input's declaration wins over output's.
    pub osc_type: OscValueType,
    /// Computed display translation of `name`; absent until computed.
    pub translation: Option<String>,
    pub selected: bool,
    value: OscValue,
    sender: Rc<dyn OscSender>,
    subscribers: Vec<(SubscriberId, Subscriber)>,
    next_subscriber: u64,
}

impl AvatarParam {
    pub fn new(
        name: &str,
        input_address: &str,
        output_address: &str,
        osc_type: OscValueType,
        sender: Rc<dyn OscSender>,
    ) -> Self {
        Self {
            name: name.to_string(),
            input_address: input_address.to_string(),
            output_address: output_address.to_string(),
            osc_type,
            translation: None,
            selected: false,
            value: OscValue::zero(osc_type),
            sender,
            subscribers: Vec::new(),
            next_subscriber: 0,
        }
    }

    pub fn value(&self) -> OscValue {
        self.value
    }

    /// Local edit path: coerce, skip if unchanged, send on the input
    /// address, notify. Parameters without an input address update locally
    /// but never send.
    pub fn set_value(&mut self, new: OscValue) {
        let coerced = match self.coerce(new) {
            Some(v) => v,
            None => return,
        };
        if coerced == self.value {
            return;
        }
        self.value = coerced;
        if !self.input_address.is_empty() {
            if let Err(e) = self.sender.send(&self.input_address, &self.value) {
                log::warn!("send failed for {}: {}", self.name, e);
            }
        }
        self.notify();
    }

    /// Inbound path: same coercion and same unchanged-value gate, but never
    /// sends. The gate is what keeps an inbound update from echoing back out.
    pub fn receive_network_value(&mut self, new: OscValue) {
        let coerced = match self.coerce(new) {
            Some(v) => v,
            None => return,
        };
        if coerced == self.value {
            return;
        }
        self.value = coerced;
        self.notify();
    }

    fn coerce(&self, new: OscValue) -> Option<OscValue> {
        match new.coerce_to(self.osc_type) {
            Some(v) => Some(v),
            None => {
                log::warn!(
                    "cannot coerce {} into {:?} for parameter {}",
                    new,
                    self.osc_type,
                    self.name
                );
                None
            }
        }
    }

    pub fn subscribe(&mut self, subscriber: Subscriber) -> SubscriberId {
        let id = SubscriberId(self.next_subscriber);
        self.next_subscriber += 1;
        self.subscribers.push((id, subscriber));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) {
        self.subscribers.retain(|(sid, _)| *sid != id);
    }

    fn notify(&mut self) {
        for (_, subscriber) in &mut self.subscribers {
            if let Err(e) = subscriber(&self.value) {
                log::warn!("subscriber of {} failed: {}", self.name, e);
            }
        }
    }

    /// Store a computed translation. The same-language sentinel is a display
    /// fallback and never enters parameter state.
    pub fn set_translation(&mut self, text: &str) {
        if text == translate::SAME_LANGUAGE {
            return;
        }
        self.translation = Some(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::testing::RecordingSender;
    use std::cell::RefCell;

    fn int_param(sender: Rc<RecordingSender>) -> AvatarParam {
        AvatarParam::new(
            "Emote",
            "/avatar/parameters/Emote",
            "/avatar/parameters/Emote",
            OscValueType::Int,
            sender,
        )
    }

    #[test]
    fn set_value_sends_and_notifies_once_per_change() {
        let sender = RecordingSender::new();
        let mut param = int_param(Rc::clone(&sender));
        let notified = Rc::new(RefCell::new(0));
        let count = Rc::clone(&notified);
        param.subscribe(Box::new(move |_| {
            *count.borrow_mut() += 1;
            Ok(())
        }));

        param.set_value(OscValue::Int(3));
        param.set_value(OscValue::Int(3));
        // Same value after coercion is also a no-op.
        param.set_value(OscValue::Float(3.2));

        assert_eq!(*notified.borrow(), 1);
        assert_eq!(
            sender.sent.borrow().as_slice(),
            &[("/avatar/parameters/Emote".to_string(), OscValue::Int(3))]
        );
    }

    #[test]
    fn empty_input_address_never_sends() {
        let sender = RecordingSender::new();
        let mut param = AvatarParam::new(
            "VelocityX",
            "",
            "/avatar/parameters/VelocityX",
            OscValueType::Float,
            sender.clone(),
        );
        param.set_value(OscValue::Float(1.5));
        assert_eq!(param.value(), OscValue::Float(1.5));
        assert!(sender.sent.borrow().is_empty());
    }

    #[test]
    fn receive_never_sends_even_on_change() {
        let sender = RecordingSender::new();
        let mut param = int_param(Rc::clone(&sender));
        param.receive_network_value(OscValue::Int(9));
        param.receive_network_value(OscValue::Int(9));
        assert_eq!(param.value(), OscValue::Int(9));
        assert!(sender.sent.borrow().is_empty());
    }

    #[test]
    fn receive_gates_notification_on_equality() {
        let sender = RecordingSender::new();
        let mut param = int_param(sender);
        let notified = Rc::new(RefCell::new(0));
        let count = Rc::clone(&notified);
        param.subscribe(Box::new(move |_| {
            *count.borrow_mut() += 1;
            Ok(())
        }));
        param.receive_network_value(OscValue::Int(2));
        param.receive_network_value(OscValue::Int(2));
        assert_eq!(*notified.borrow(), 1);
    }

    #[test]
    fn coercion_failure_leaves_value_unchanged() {
        let sender = RecordingSender::new();
        let mut param = AvatarParam::new(
            "Broken",
            "/in",
            "/out",
            OscValueType::Undefined,
            sender.clone(),
        );
        let before = param.value();
        param.set_value(OscValue::Int(5));
        assert_eq!(param.value(), before);
        assert!(sender.sent.borrow().is_empty());
    }

    #[test]
    fn failing_subscriber_does_not_block_the_rest() {
        let sender = RecordingSender::new();
        let mut param = int_param(sender);
        let reached = Rc::new(RefCell::new(false));
        param.subscribe(Box::new(|_| Err("display row gone".to_string())));
        let flag = Rc::clone(&reached);
        param.subscribe(Box::new(move |_| {
            *flag.borrow_mut() = true;
            Ok(())
        }));
        param.set_value(OscValue::Int(1));
        assert!(*reached.borrow());
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let sender = RecordingSender::new();
        let mut param = int_param(sender);
        let notified = Rc::new(RefCell::new(0));
        let count = Rc::clone(&notified);
        let id = param.subscribe(Box::new(move |_| {
            *count.borrow_mut() += 1;
            Ok(())
        }));
        param.set_value(OscValue::Int(1));
        param.unsubscribe(id);
        param.set_value(OscValue::Int(2));
        assert_eq!(*notified.borrow(), 1);
    }

    #[test]
    fn same_language_sentinel_is_not_stored() {
        let sender = RecordingSender::new();
        let mut param = int_param(sender);
        param.set_translation(crate::translate::SAME_LANGUAGE);
        assert_eq!(param.translation, None);
        param.set_translation("clothes");
        assert_eq!(param.translation.as_deref(), Some("clothes"));
    }
}
