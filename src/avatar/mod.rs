pub mod filter;
pub mod param;
pub mod view;

pub use filter::{ControllableFilter, ParamFilter, PrefixExclusionFilter, SelectionFilter};
pub use param::{AvatarParam, SubscriberId};
pub use view::ParamView;

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::rc::Rc;

use serde::Deserialize;

use crate::osc::{OscMessage, OscSender, OscValueType};

/// Parameters are shared between the name map, the address map and any view
/// subscribed to them; all access stays on one thread.
pub type ParamRef = Rc<RefCell<AvatarParam>>;

/// Descriptor file layout as VRChat writes it (UTF-8, possibly with a BOM).
#[derive(Deserialize)]
struct AvatarDescriptor {
    #[serde(default)]
    name: String,
    #[serde(default)]
    id: String,
    #[serde(default)]
    parameters: Vec<ParamEntry>,
}

#[derive(Deserialize)]
struct ParamEntry {
    #[serde(default)]
    name: String,
    input: Option<AddressDecl>,
    output: Option<AddressDecl>,
}

#[derive(Deserialize)]
struct AddressDecl {
    #[serde(default)]
    address: String,
    #[serde(default, rename = "type")]
    type_name: String,
}

/// All parameters of one avatar, routable by name and by output address.
pub struct Avatar {
    pub id: String,
    pub name: String,
    param_map: HashMap<String, ParamRef>,
    osc_map: HashMap<String, ParamRef>,
    sender: Rc<dyn OscSender>,
}

impl Avatar {
    pub fn new(sender: Rc<dyn OscSender>) -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            param_map: HashMap::new(),
            osc_map: HashMap::new(),
            sender,
        }
    }

    /// Load a VRChat-generated descriptor file.
    pub fn load_file(&mut self, path: &Path) -> io::Result<()> {
        let text = std::fs::read_to_string(path)?;
        self.load_str(&text)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Load a descriptor from JSON text. Validation problems are logged and
    /// never fail the load; the file comes from an external peer we trust
    /// but cannot hold to a schema.
    pub fn load_str(&mut self, text: &str) -> Result<(), serde_json::Error> {
        let descriptor: AvatarDescriptor =
            serde_json::from_str(text.trim_start_matches('\u{feff}'))?;
        self.name = descriptor.name;
        self.id = descriptor.id;
        for entry in &descriptor.parameters {
            let param = self.build_param(entry);
            let output_address = param.output_address.clone();
            let name = param.name.clone();
            let param = Rc::new(RefCell::new(param));
            if !output_address.is_empty() {
                // Later entries overwrite earlier ones, same as for names.
                self.osc_map.insert(output_address, Rc::clone(&param));
            }
            self.param_map.insert(name, param);
        }
        Ok(())
    }

    fn build_param(&self, entry: &ParamEntry) -> AvatarParam {
        let (input_address, input_type) = match &entry.input {
            Some(decl) => (decl.address.as_str(), OscValueType::from_name(&decl.type_name)),
            None => ("", None),
        };
        let (output_address, output_type) = match &entry.output {
            Some(decl) => (decl.address.as_str(), OscValueType::from_name(&decl.type_name)),
            None => ("", None),
        };

        // Sanity checks; each is a canary for descriptor format drift, not
        // a load failure.
        if entry.name.is_empty() {
            log::warn!("descriptor entry without a name");
        }
        if output_address.is_empty() {
            // Missing input addresses are normal (system-created
            // parameters), but everything should be reported back.
            log::warn!("parameter {} has no output address", entry.name);
        }
        if let (Some(it), Some(ot)) = (input_type, output_type) {
            if it != ot {
                log::warn!(
                    "parameter {} declares input type {:?} but output type {:?}",
                    entry.name,
                    it,
                    ot
                );
            }
        }

        // Input's declared type wins; a typeless entry falls back to Float.
        let osc_type = input_type.or(output_type).unwrap_or_else(|| {
            log::warn!("parameter {} declares no type, assuming Float", entry.name);
            OscValueType::Float
        });

        AvatarParam::new(
            &entry.name,
            input_address,
            output_address,
            osc_type,
            Rc::clone(&self.sender),
        )
    }

    pub fn param(&self, name: &str) -> Option<ParamRef> {
        self.param_map.get(name).cloned()
    }

    /// All parameters, unordered. Views apply their own filter and sort.
    pub fn params(&self) -> Vec<ParamRef> {
        self.param_map.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.param_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.param_map.is_empty()
    }

    /// Route one inbound message by output address. Addresses outside the
    /// known set are normal traffic for other tools and are ignored.
    pub fn route_incoming(&self, msg: &OscMessage) {
        match self.osc_map.get(&msg.addr) {
            Some(param) => param.borrow_mut().receive_network_value(msg.value),
            None => log::debug!("ignoring message for unknown address {}", msg.addr),
        }
    }
}
