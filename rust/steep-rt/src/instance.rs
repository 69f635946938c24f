//! Contract instances as seen by the dispatcher.
//!
//! [`ContractInstance`] is the seam between dispatch and whatever executes
//! contract code. [`NativeContract`] implements it for contracts written as
//! Rust closures: plain fields live on the instance, `@state` fields go
//! through a [`StateStore`] exactly like compiled accessors do.

use crate::state::StateStore;
use crate::values::Value;
use num_bigint::BigInt;
use num_traits::Zero;
use std::collections::BTreeMap;
use thiserror::Error;

/// Error raised by contract code itself.
#[derive(Debug, Error, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Thrown(String),
    #[error("{0} is not a function")]
    NotCallable(String),
}

impl ContractError {
    pub fn thrown(message: impl Into<String>) -> Self {
        ContractError::Thrown(message.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRef {
    Method,
    Field,
}

pub trait ContractInstance {
    /// Whether `name` exists on the instance, and how it is reached.
    fn member(&self, name: &str) -> Option<MemberRef>;
    fn invoke(&mut self, name: &str, args: &[Value]) -> Result<Value, ContractError>;
    /// Current value of a field, `None` if there is no such field.
    fn field(&self, name: &str) -> Option<Value>;
    /// Readiness hook run before every method invocation. No-op by default.
    fn on_ready(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}

/// Host-supplied pseudo-members visible on every instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractContext {
    pub address: String,
    pub balance: BigInt,
    pub deployed_by: String,
}

impl Default for ContractContext {
    fn default() -> Self {
        Self { address: String::new(), balance: BigInt::zero(), deployed_by: String::new() }
    }
}

impl ContractContext {
    pub fn value(&self, name: &str) -> Option<Value> {
        match name {
            "address" => Some(Value::String(self.address.clone())),
            "balance" => Some(Value::BigInt(self.balance.clone())),
            "deployedBy" => Some(Value::String(self.deployed_by.clone())),
            _ => None,
        }
    }
}

/// What a method body sees as `this`.
pub struct Scope<'a> {
    fields: &'a mut BTreeMap<String, Value>,
    state_defaults: &'a BTreeMap<String, Value>,
    store: &'a mut dyn StateStore,
    context: &'a ContractContext,
}

impl Scope<'_> {
    /// `this.<name>`: state through the store, then plain fields, then
    /// context pseudo-members. Unknown names read as `undefined`.
    pub fn get(&self, name: &str) -> Value {
        if let Some(default) = self.state_defaults.get(name) {
            return self.store.get_state(name, default.clone());
        }
        self.fields
            .get(name)
            .cloned()
            .or_else(|| self.context.value(name))
            .unwrap_or_default()
    }

    /// `this.<name> = value`
    pub fn set(&mut self, name: &str, value: Value) {
        if self.state_defaults.contains_key(name) {
            self.store.set_state(name, value);
        } else {
            self.fields.insert(name.to_string(), value);
        }
    }

    pub fn context(&self) -> &ContractContext {
        self.context
    }
}

type MethodFn = Box<dyn Fn(&mut Scope<'_>, &[Value]) -> Result<Value, ContractError>>;
type ReadyFn = Box<dyn Fn(&mut Scope<'_>) -> Result<(), ContractError>>;

/// A contract implemented in Rust.
pub struct NativeContract {
    name: String,
    methods: BTreeMap<String, MethodFn>,
    fields: BTreeMap<String, Value>,
    state_defaults: BTreeMap<String, Value>,
    ready: Option<ReadyFn>,
    store: Box<dyn StateStore>,
    context: ContractContext,
}

impl NativeContract {
    pub fn new(name: impl Into<String>, store: Box<dyn StateStore>) -> Self {
        Self {
            name: name.into(),
            methods: BTreeMap::new(),
            fields: BTreeMap::new(),
            state_defaults: BTreeMap::new(),
            ready: None,
            store,
            context: ContractContext::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_method<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&mut Scope<'_>, &[Value]) -> Result<Value, ContractError> + 'static,
    {
        self.methods.insert(name.to_string(), Box::new(f));
        self
    }

    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    /// A `@state` field read through the store with `default` until written.
    pub fn with_state(mut self, name: &str, default: Value) -> Self {
        self.state_defaults.insert(name.to_string(), default);
        self
    }

    pub fn with_ready<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Scope<'_>) -> Result<(), ContractError> + 'static,
    {
        self.ready = Some(Box::new(f));
        self
    }

    pub fn with_context(mut self, context: ContractContext) -> Self {
        self.context = context;
        self
    }

    pub fn store(&self) -> &dyn StateStore {
        self.store.as_ref()
    }
}

impl ContractInstance for NativeContract {
    fn member(&self, name: &str) -> Option<MemberRef> {
        if self.methods.contains_key(name) {
            Some(MemberRef::Method)
        } else if self.state_defaults.contains_key(name) || self.fields.contains_key(name) {
            Some(MemberRef::Field)
        } else {
            self.context.value(name).map(|_| MemberRef::Field)
        }
    }

    fn invoke(&mut self, name: &str, args: &[Value]) -> Result<Value, ContractError> {
        let method = self.methods.get(name).ok_or_else(|| ContractError::NotCallable(name.to_string()))?;
        let mut scope = Scope {
            fields: &mut self.fields,
            state_defaults: &self.state_defaults,
            store: self.store.as_mut(),
            context: &self.context,
        };
        method(&mut scope, args)
    }

    fn field(&self, name: &str) -> Option<Value> {
        if let Some(default) = self.state_defaults.get(name) {
            return Some(self.store.get_state(name, default.clone()));
        }
        self.fields.get(name).cloned().or_else(|| self.context.value(name))
    }

    fn on_ready(&mut self) -> Result<(), ContractError> {
        let Some(ready) = self.ready.as_ref() else { return Ok(()) };
        let mut scope = Scope {
            fields: &mut self.fields,
            state_defaults: &self.state_defaults,
            store: self.store.as_mut(),
            context: &self.context,
        };
        ready(&mut scope)
    }
}
