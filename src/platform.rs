//! The platform collaborator the book consults when deciding whether a
//! remote-initiated disconnect should evict a peer (spec.md §4.2, the
//! `disconnected` transition's `byRemote`/online branch).

/// Whether this node currently believes it has network connectivity.
///
/// A real implementation asks the OS or a connectivity-checking service;
/// this crate only needs the interface, the same way `zebra-network`
/// depends on sockets and DNS only at its own boundary.
pub trait OnlineStatus: Send + Sync {
    /// True if this node is online.
    fn is_online(&self) -> bool;
}

/// An [`OnlineStatus`] that always reports online, useful for tests and
/// for environments where connectivity is assumed rather than checked.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysOnline;

impl OnlineStatus for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}
