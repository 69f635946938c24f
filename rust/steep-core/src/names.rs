//! Reserved member and binding names shared by the compiler and the runtime.

/// Lifecycle hook the constructor is renamed to. Runs once at deployment.
pub const ON_DEPLOYED: &str = "__on_deployed";

/// Lifecycle hook invoked for inbound transfers. Also the registry alias key.
pub const ON_RECEIVED: &str = "__on_received";

/// Binding that holds the serialized registry in emitted code, and the
/// pseudo-member that returns the introspection pair at dispatch time.
pub const METADATA: &str = "__metadata";

/// Binding that holds the instantiated contract in emitted code.
pub const CONTRACT: &str = "__contract";

/// Prefix of private member names (`#secret`).
pub const PRIVATE_MARKER: char = '#';

/// Members that bypass the existence/private check at dispatch time.
pub const PSEUDO_MEMBERS: [&str; 4] = [METADATA, "address", "balance", "deployedBy"];

pub const LIFECYCLE_HOOKS: [&str; 2] = [ON_DEPLOYED, ON_RECEIVED];

pub fn is_lifecycle_hook(name: &str) -> bool {
    LIFECYCLE_HOOKS.contains(&name)
}

pub fn is_private(name: &str) -> bool {
    name.starts_with(PRIVATE_MARKER)
}

pub fn is_pseudo_member(name: &str) -> bool {
    PSEUDO_MEMBERS.contains(&name)
}
