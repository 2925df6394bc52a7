use {
    crate::{boundary::IdentityService, primitives::Address},
    std::sync::atomic::{AtomicU64, Ordering},
};

/// Hands out identities derived from a counter, tagged with a namespace byte
/// so that they never collide with hand picked addresses of the same process.
#[derive(Debug)]
pub struct SequentialIds {
    namespace: u8,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(namespace: u8) -> Self {
        Self {
            namespace,
            next: AtomicU64::new(1),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new(0xff)
    }
}

impl IdentityService for SequentialIds {
    fn fresh(&self) -> Address {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        let mut bytes = [0u8; 20];
        bytes[0] = self.namespace;
        bytes[12..].copy_from_slice(&n.to_be_bytes());
        Address::from(bytes)
    }
}
