use std::collections::HashSet;

/// Loop protection for directory-chain traversal.
///
/// The IFD structure should be a forest, but nothing stops a malicious or
/// corrupted file from pointing a `next` field (or a sub-IFD pointer tag)
/// back at an offset that was already walked. One guard is threaded through
/// the top-level chain and every sub-directory expansion so that any offset
/// is decoded at most once and traversal always terminates.
#[derive(Default, Debug)]
pub(crate) struct ChainGuard {
    visited: HashSet<u64>,
}

impl ChainGuard {
    pub(crate) fn new() -> Self {
        ChainGuard::default()
    }

    /// Marks `offset` as visited. Returns `false` when it was seen before,
    /// which the walker treats as a terminal state.
    pub(crate) fn visit(&mut self, offset: u64) -> bool {
        self.visited.insert(offset)
    }
}

#[test]
fn reflective_cycle() {
    let mut guard = ChainGuard::new();

    assert!(guard.visit(0x20), "first visit is valid");
    assert!(!guard.visit(0x20), "self-referential cycle must be detected");
}

#[test]
fn two_cycle() {
    let mut guard = ChainGuard::new();

    assert!(guard.visit(0x20));
    assert!(guard.visit(0x800));
    assert!(!guard.visit(0x20), "A -> B -> A must terminate");
}

#[test]
fn late_cycle() {
    let mut guard = ChainGuard::new();

    assert!(guard.visit(0x20));
    assert!(guard.visit(0x40));
    assert!(guard.visit(0x60));
    assert!(guard.visit(0x80));
    assert!(!guard.visit(0x40), "longer cycles collapse onto the set");
}
