//! Codec for the restricted OSC dialect VRChat speaks for avatar parameters.
//!
//! Only four message shapes exist on this wire: `,T` (bool true), `,F`
//! (bool false), `,i` (int32) and `,f` (float32), each addressed by a
//! NUL-terminated, 4-byte-aligned path. No bundles, no arrays, no other
//! type tags. Peers depend on `encode` and `decode` being exact inverses.

use super::{OscMessage, OscValue};

/// Encode one scalar message.
///
/// Layout: address bytes, NUL terminator, NUL padding up to the next 4-byte
/// boundary (the terminator counts toward it), then the 4-byte type block
/// starting with `,`, then a 4-byte big-endian payload for int/float.
pub fn encode(addr: &str, value: &OscValue) -> Vec<u8> {
    let mut buf = Vec::with_capacity(addr.len() + 12);
    buf.extend_from_slice(addr.as_bytes());
    buf.push(0);
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
    match value {
        OscValue::Bool(true) => buf.extend_from_slice(b",T\0\0"),
        OscValue::Bool(false) => buf.extend_from_slice(b",F\0\0"),
        OscValue::Int(i) => {
            buf.extend_from_slice(b",i\0\0");
            buf.extend_from_slice(&i.to_be_bytes());
        }
        OscValue::Float(f) => {
            buf.extend_from_slice(b",f\0\0");
            buf.extend_from_slice(&f.to_be_bytes());
        }
    }
    buf
}

/// Decode one datagram. Returns None for anything malformed: a missing
/// address terminator, a type block that isn't one of the four supported
/// tags, a truncated payload, or trailing bytes past the end of the
/// message. Callers drop such datagrams.
pub fn decode(data: &[u8]) -> Option<OscMessage> {
    let nul = data.iter().position(|&b| b == 0)?;
    let addr = std::str::from_utf8(&data[..nul]).ok()?;
    // Type block starts at the next 4-byte boundary past the terminator.
    let block = (nul + 4) & !3;
    if data.len() < block + 4 || data[block] != b',' {
        return None;
    }
    let payload = |at: usize| -> Option<[u8; 4]> { data.get(at..at + 4)?.try_into().ok() };
    // Exact lengths only: a buffer that keeps going past the message would
    // not re-encode to itself.
    let value = match data[block + 1] {
        b'T' if data.len() == block + 4 => OscValue::Bool(true),
        b'F' if data.len() == block + 4 => OscValue::Bool(false),
        b'i' if data.len() == block + 8 => OscValue::Int(i32::from_be_bytes(payload(block + 4)?)),
        b'f' if data.len() == block + 8 => {
            OscValue::Float(f32::from_be_bytes(payload(block + 4)?))
        }
        _ => return None,
    };
    Some(OscMessage {
        addr: addr.to_string(),
        value,
    })
}
