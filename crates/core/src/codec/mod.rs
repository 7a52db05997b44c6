//! Thin layer over `rosc` fixing the wire contract the agent relies on:
//! outbound messages carry an address and at most one argument, inbound
//! datagrams become a flat list of messages.

use rosc::{OscMessage, OscPacket, OscType};

use crate::{MixerGuardError, Result};

/// Encodes `address` with an optional single argument into one datagram.
///
/// A bare address is a query; the console answers with the current value.
pub fn encode(address: &str, arg: Option<OscType>) -> Result<Vec<u8>> {
    let packet = OscPacket::Message(OscMessage {
        addr: address.to_string(),
        args: arg.into_iter().collect(),
    });
    rosc::encoder::encode(&packet).map_err(|e| MixerGuardError::Encode {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Decodes one datagram. Bundles are unpacked recursively so callers only see
/// plain messages, in the order they appear in the packet.
pub fn decode(datagram: &[u8]) -> Result<Vec<OscMessage>> {
    let (_, packet) =
        rosc::decoder::decode_udp(datagram).map_err(|e| MixerGuardError::Decode(e.to_string()))?;
    let mut messages = Vec::new();
    flatten(packet, &mut messages);
    Ok(messages)
}

fn flatten(packet: OscPacket, out: &mut Vec<OscMessage>) {
    match packet {
        OscPacket::Message(msg) => out.push(msg),
        OscPacket::Bundle(bundle) => {
            for inner in bundle.content {
                flatten(inner, out);
            }
        }
    }
}

/// Lowercase hex rendering of raw wire bytes for trace output.
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
