//! Node identifiers.
//!
//! A node's id is regenerated on every start and never persisted, so a
//! restarted node is distinguishable from its previous incarnation.

use rand::RngCore;

/// Generate a fresh random node id, formatted like a v4 UUID.
pub fn generate_node_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    let h = hex::encode(bytes);
    format!(
        "{}-{}-{}-{}-{}",
        &h[0..8],
        &h[8..12],
        &h[12..16],
        &h[16..20],
        &h[20..32]
    )
}
