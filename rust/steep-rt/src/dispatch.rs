//! Per-call authorization and type checking in front of contract code.

use crate::address::{AddressValidator, PrefixValidator};
use crate::config::DispatchOptions;
use crate::instance::{ContractError, ContractInstance, MemberRef};
use crate::typecheck::check_value;
use crate::values::{RuntimeKind, Value};
use serde::Deserialize;
use std::fmt;
use steep_core::names::{self, METADATA};
use steep_core::{CallType, ContractRegistry, Decorator, MemberInfo, TypeSpec};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Method name is required.")]
    MissingMethodName,
    #[error("Method {0} is private or does not exist.")]
    MethodNotFoundOrPrivate(String),
    #[error("Method {0} is internal.")]
    MethodInternal(String),
    #[error("Method {name} is not decorated as @{call_type} and cannot be invoked in such mode")]
    CallTypeNotAuthorized { name: String, call_type: CallType },
    #[error("Error executing '{method}': wrong param '{param}' type. Expect: {expected}. Got: {actual}.")]
    ParamTypeMismatch { method: String, param: String, expected: TypeSpec, actual: RuntimeKind },
    #[error("Error executing '{method}': wrong return type. Expect: {expected}. Got: {actual}.")]
    ReturnTypeMismatch { method: String, expected: TypeSpec, actual: RuntimeKind },
    #[error("Error executing '{method}': wrong field type. Expect: {expected}. Got: {actual}.")]
    FieldTypeMismatch { method: String, expected: TypeSpec, actual: RuntimeKind },
    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// One inbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallMessage {
    pub name: String,
    pub params: Vec<Value>,
    pub call_type: CallType,
}

#[derive(Deserialize)]
struct WireMessage {
    #[serde(default)]
    name: String,
    #[serde(default)]
    params: Vec<serde_json::Value>,
    #[serde(rename = "callType")]
    call_type: CallType,
}

impl CallMessage {
    pub fn new(name: impl Into<String>, call_type: CallType) -> Self {
        Self { name: name.into(), params: Vec::new(), call_type }
    }

    pub fn with_params(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }

    /// Parse `{ "name": ..., "params": [...], "callType": ... }`.
    pub fn from_json(json: serde_json::Value) -> Result<Self, serde_json::Error> {
        let wire: WireMessage = serde_json::from_value(json)?;
        Ok(Self {
            name: wire.name,
            params: wire.params.into_iter().map(Value::from).collect(),
            call_type: wire.call_type,
        })
    }
}

/// Successful dispatch result.
pub enum Dispatched<'a> {
    Value(Value),
    /// Answer to `__metadata`: the instance itself and its registry.
    Introspection { instance: &'a dyn ContractInstance, registry: &'a ContractRegistry },
}

impl Dispatched<'_> {
    pub fn value(&self) -> Option<&Value> {
        match self {
            Dispatched::Value(v) => Some(v),
            Dispatched::Introspection { .. } => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Dispatched::Value(v) => Some(v),
            Dispatched::Introspection { .. } => None,
        }
    }
}

impl fmt::Debug for Dispatched<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dispatched::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Dispatched::Introspection { registry, .. } => {
                f.debug_struct("Introspection").field("registry", registry).finish_non_exhaustive()
            }
        }
    }
}

pub struct Dispatcher {
    addresses: Box<dyn AddressValidator>,
}

impl Dispatcher {
    pub fn new(options: &DispatchOptions) -> Result<Self, regex::Error> {
        Ok(Self { addresses: Box::new(PrefixValidator::new(options)?) })
    }

    pub fn with_validator(addresses: Box<dyn AddressValidator>) -> Self {
        Self { addresses }
    }

    /// Authorize, type-check and run one call against `instance`.
    pub fn dispatch<'a>(
        &self,
        msg: &CallMessage,
        instance: &'a mut dyn ContractInstance,
        registry: &'a ContractRegistry,
    ) -> Result<Dispatched<'a>, DispatchError> {
        if msg.name.is_empty() {
            return Err(DispatchError::MissingMethodName);
        }
        let name = registry.alias(&msg.name).unwrap_or(&msg.name).to_string();
        let member = instance.member(&name);
        tracing::debug!(requested = %msg.name, effective = %name, call_type = %msg.call_type, ?member, "dispatch");

        if names::is_lifecycle_hook(&name) && member.is_none() {
            tracing::debug!(hook = %name, "lifecycle hook not implemented, skipping");
            return Ok(Dispatched::Value(Value::Undefined));
        }
        if !names::is_pseudo_member(&name) && (member.is_none() || names::is_private(&name)) {
            return Err(DispatchError::MethodNotFoundOrPrivate(name));
        }
        let info = registry.member(&name);
        if info.is_some_and(|i| i.has(&Decorator::Internal)) {
            return Err(DispatchError::MethodInternal(msg.name.clone()));
        }
        if name == METADATA {
            return Ok(Dispatched::Introspection { instance, registry });
        }

        if member == Some(MemberRef::Method) {
            if !call_type_allowed(&name, info, msg.call_type) {
                return Err(DispatchError::CallTypeNotAuthorized { name, call_type: msg.call_type });
            }
            if let Some(info) = info {
                self.check_params(&name, info, &msg.params)?;
            }
            instance.on_ready()?;
            let result = instance.invoke(&name, &msg.params)?;
            if let Some(expected) = info.and_then(MemberInfo::return_type) {
                check_value(&result, expected, self.addresses.as_ref()).map_err(|actual| {
                    DispatchError::ReturnTypeMismatch { method: name.clone(), expected: expected.clone(), actual }
                })?;
            }
            return Ok(Dispatched::Value(result));
        }

        let value = instance.field(&name).unwrap_or_default();
        if let Some(expected) = info.and_then(MemberInfo::field_type) {
            check_value(&value, expected, self.addresses.as_ref()).map_err(|actual| {
                DispatchError::FieldTypeMismatch { method: name.clone(), expected: expected.clone(), actual }
            })?;
        }
        Ok(Dispatched::Value(value))
    }

    fn check_params(&self, method: &str, info: &MemberInfo, args: &[Value]) -> Result<(), DispatchError> {
        for (index, param) in info.params().iter().enumerate() {
            let value = args.get(index).cloned().unwrap_or_default();
            check_value(&value, &param.ty, self.addresses.as_ref()).map_err(|actual| DispatchError::ParamTypeMismatch {
                method: method.to_string(),
                param: param.name.clone(),
                expected: param.ty.clone(),
                actual,
            })?;
        }
        Ok(())
    }
}

/// Lifecycle hooks and unregistered members are always callable; a payable
/// member also accepts `transaction` calls.
fn call_type_allowed(name: &str, info: Option<&MemberInfo>, call_type: CallType) -> bool {
    if names::is_lifecycle_hook(name) {
        return true;
    }
    let Some(info) = info else {
        tracing::warn!(member = name, "member missing from registry, allowing any call type");
        return true;
    };
    if call_type == CallType::Transaction && info.has(&Decorator::Payable) {
        return true;
    }
    info.has(&Decorator::from(call_type))
}
