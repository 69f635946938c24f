//! Steep Core
//!
//! Shared types used by both the contract compiler and the runtime dispatcher:
//! canonical type tags, policy decorators, the contract registry, and the
//! reserved member names both sides agree on.

pub mod decorators;
pub mod names;
pub mod registry;
pub mod types;

pub use decorators::{CallType, Decorator, DecoratorSet};
pub use registry::{ContractRegistry, MemberInfo, MemberKind, ParamInfo, RegistryEntry};
pub use types::{TypeSpec, TypeTag};
