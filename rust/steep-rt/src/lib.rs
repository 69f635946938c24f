//! Steep Runtime
//!
//! Guards every inbound call to a deployed contract: resolves the receive
//! alias, rejects private, internal and unknown members, authorizes the call
//! type against the member's decorators, and checks parameter, return and
//! field values against the declared types in the contract registry.

pub mod address;
pub mod config;
pub mod dispatch;
pub mod instance;
pub mod state;
pub mod typecheck;
pub mod values;

pub use address::{AddressValidator, PrefixValidator, RejectAll};
pub use config::{ConfigError, DispatchOptions};
pub use dispatch::{CallMessage, DispatchError, Dispatched, Dispatcher};
pub use instance::{ContractContext, ContractError, ContractInstance, MemberRef, NativeContract, Scope};
pub use state::{MemoryStore, StateStore};
pub use typecheck::check_value;
pub use values::{RuntimeKind, Value};
