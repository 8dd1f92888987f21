pub mod codec;
pub mod service;

pub use codec::{decode, encode};
pub use service::{OscSender, OscService};

/// Value type of an avatar parameter, as declared in the VRChat descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscValueType {
    Float,
    Bool,
    Int,
    Undefined,
}

impl OscValueType {
    /// Parse a descriptor type name ("Int", "Float", "Bool").
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Float" => Some(Self::Float),
            "Bool" => Some(Self::Bool),
            "Int" => Some(Self::Int),
            _ => None,
        }
    }

    /// Single-character label used by display layers.
    pub fn display_char(self) -> char {
        match self {
            Self::Float => 'F',
            Self::Bool => 'B',
            Self::Int => 'I',
            Self::Undefined => '?',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OscValue {
    Bool(bool),
    Int(i32),
    Float(f32),
}

impl OscValue {
    pub fn value_type(&self) -> OscValueType {
        match self {
            Self::Bool(_) => OscValueType::Bool,
            Self::Int(_) => OscValueType::Int,
            Self::Float(_) => OscValueType::Float,
        }
    }

    /// Convert to the given type with the usual numeric/boolean rules.
    /// Returns None only for `Undefined`, which no loaded parameter carries.
    pub fn coerce_to(&self, ty: OscValueType) -> Option<OscValue> {
        match ty {
            OscValueType::Int => Some(OscValue::Int(match self {
                Self::Int(i) => *i,
                Self::Float(f) => *f as i32,
                Self::Bool(b) => *b as i32,
            })),
            OscValueType::Float => Some(OscValue::Float(match self {
                Self::Float(f) => *f,
                Self::Int(i) => *i as f32,
                Self::Bool(b) => *b as i32 as f32,
            })),
            OscValueType::Bool => Some(OscValue::Bool(match self {
                Self::Bool(b) => *b,
                Self::Int(i) => *i != 0,
                Self::Float(f) => *f != 0.0,
            })),
            OscValueType::Undefined => None,
        }
    }

    /// Zero value for a parameter type; what a parameter holds before any update.
    pub fn zero(ty: OscValueType) -> OscValue {
        match ty {
            OscValueType::Int => OscValue::Int(0),
            OscValueType::Bool => OscValue::Bool(false),
            _ => OscValue::Float(0.0),
        }
    }
}

impl std::fmt::Display for OscValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
        }
    }
}

/// One decoded scalar control message.
#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    pub addr: String,
    pub value: OscValue,
}
