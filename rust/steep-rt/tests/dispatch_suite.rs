//! Dispatch against registries produced by the compiler.
//!
//! Each test compiles a contract, builds a native instance with the same
//! members, and drives calls through the dispatcher.

use num_bigint::BigInt;
use serde_json::json;
use steep_compiler::{compile_with_options, CompileOptions};
use steep_core::names::{METADATA, ON_DEPLOYED, ON_RECEIVED};
use steep_core::{CallType, ContractRegistry};
use steep_rt::{
    CallMessage, ContractContext, ContractError, DispatchError, DispatchOptions, Dispatched, Dispatcher,
    MemoryStore, NativeContract, RuntimeKind, Value,
};

const WALLET: &str = r#"
@contract
class Wallet {
  label = "main";
  @state deposits = 0;
  #pin = 1234;

  constructor(label: string) {
    this.label = label;
  }

  @transaction @payable transfer(to: address, amount: number): boolean {
    return amount > 0;
  }

  @view owner(): address {
    return this.deployedBy;
  }

  @internal @view audit() { return this.#pin; }

  @onReceived @payable receive(): number {
    this.deposits = this.deposits + 1;
    return this.deposits;
  }
}
"#;

fn good_address() -> String {
    format!("tea1{}", "q".repeat(38))
}

fn registry() -> ContractRegistry {
    let opts = CompileOptions { recognize_address_type: true, ..CompileOptions::default() };
    compile_with_options(WALLET, &opts).unwrap().registry
}

fn wallet() -> NativeContract {
    let context = ContractContext {
        address: format!("tea1{}", "z".repeat(38)),
        balance: BigInt::from(100),
        deployed_by: good_address(),
    };
    NativeContract::new("Wallet", Box::new(MemoryStore::new()))
        .with_context(context)
        .with_field("label", Value::from("main"))
        .with_field("#pin", Value::from(1234))
        .with_state("deposits", Value::from(0))
        .with_method(ON_DEPLOYED, |this, args| {
            this.set("label", args.first().cloned().unwrap_or_default());
            Ok(Value::Undefined)
        })
        .with_method("transfer", |_, args| {
            let amount = args.get(1).and_then(Value::as_f64).unwrap_or(0.0);
            Ok(Value::Bool(amount > 0.0))
        })
        .with_method("owner", |this, _| Ok(this.get("deployedBy")))
        .with_method("audit", |this, _| Ok(this.get("#pin")))
        .with_method("receive", |this, _| {
            let next = this.get("deposits").as_f64().unwrap_or(0.0) + 1.0;
            this.set("deposits", Value::from(next));
            Ok(Value::from(next))
        })
}

fn dispatcher() -> Dispatcher {
    Dispatcher::new(&DispatchOptions::default()).unwrap()
}

fn run(instance: &mut NativeContract, reg: &ContractRegistry, msg: CallMessage) -> Result<Value, DispatchError> {
    dispatcher().dispatch(&msg, instance, reg).map(|d| d.into_value().unwrap_or_default())
}

fn call(name: &str, call_type: CallType, params: Vec<Value>) -> Result<Value, DispatchError> {
    run(&mut wallet(), &registry(), CallMessage::new(name, call_type).with_params(params))
}

// ============================================================================
// Call-type authorization
// ============================================================================

#[test]
fn transfer_as_transaction_succeeds() {
    let result = call("transfer", CallType::Transaction, vec![Value::String(good_address()), Value::from(5)]);
    assert_eq!(result.unwrap(), Value::Bool(true));
}

#[test]
fn transfer_as_view_is_rejected() {
    let err = call("transfer", CallType::View, vec![Value::String(good_address()), Value::from(5)]).unwrap_err();
    assert!(matches!(err, DispatchError::CallTypeNotAuthorized { call_type: CallType::View, .. }));
    assert_eq!(
        err.to_string(),
        "Method transfer is not decorated as @view and cannot be invoked in such mode"
    );
}

#[test]
fn transfer_param_types_are_checked() {
    let err = call("transfer", CallType::Transaction, vec![Value::from("bob"), Value::from(5)]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error executing 'transfer': wrong param 'to' type. Expect: address. Got: string."
    );

    let err = call("transfer", CallType::Transaction, vec![Value::String(good_address()), Value::from("5")]).unwrap_err();
    assert!(matches!(err, DispatchError::ParamTypeMismatch { ref param, actual: RuntimeKind::String, .. } if param == "amount"));
}

#[test]
fn address_return_value_is_passed_through() {
    assert_eq!(call("owner", CallType::View, vec![]).unwrap(), Value::String(good_address()));
}

#[test]
fn lifecycle_hook_accepts_any_call_type() {
    let reg = registry();
    let mut w = wallet();
    run(&mut w, &reg, CallMessage::new(ON_DEPLOYED, CallType::View).with_params(vec![Value::from("savings")])).unwrap();
    assert_eq!(run(&mut w, &reg, CallMessage::new("label", CallType::View)).unwrap(), Value::from("savings"));
}

// ============================================================================
// Member visibility
// ============================================================================

#[test]
fn pseudo_members_bypass_existence_check() {
    assert_eq!(call("balance", CallType::View, vec![]).unwrap(), Value::BigInt(BigInt::from(100)));
    assert_eq!(call("deployedBy", CallType::Pure, vec![]).unwrap(), Value::String(good_address()));
}

#[test]
fn private_and_unknown_members_are_rejected() {
    let err = call("#pin", CallType::View, vec![]).unwrap_err();
    assert_eq!(err.to_string(), "Method #pin is private or does not exist.");
    assert!(matches!(call("withdraw", CallType::Transaction, vec![]), Err(DispatchError::MethodNotFoundOrPrivate(_))));
}

#[test]
fn internal_members_are_rejected() {
    let err = call("audit", CallType::View, vec![]).unwrap_err();
    assert_eq!(err.to_string(), "Method audit is internal.");
}

#[test]
fn empty_name_is_rejected() {
    assert!(matches!(call("", CallType::View, vec![]), Err(DispatchError::MissingMethodName)));
}

// ============================================================================
// Receive alias and state
// ============================================================================

#[test]
fn receive_alias_routes_to_handler() {
    let reg = registry();
    let mut w = wallet();
    assert_eq!(run(&mut w, &reg, CallMessage::new(ON_RECEIVED, CallType::Payable)).unwrap(), Value::from(1));
    assert_eq!(run(&mut w, &reg, CallMessage::new(ON_RECEIVED, CallType::Transaction)).unwrap(), Value::from(2));
    assert_eq!(run(&mut w, &reg, CallMessage::new("deposits", CallType::View)).unwrap(), Value::from(2));

    let err = run(&mut w, &reg, CallMessage::new(ON_RECEIVED, CallType::View)).unwrap_err();
    assert!(matches!(err, DispatchError::CallTypeNotAuthorized { ref name, .. } if name == "receive"));
}

#[test]
fn missing_receive_handler_is_noop() {
    let reg = compile_with_options("@contract class Empty {}", &CompileOptions::default()).unwrap().registry;
    let mut empty = NativeContract::new("Empty", Box::new(MemoryStore::new()));
    let result = run(&mut empty, &reg, CallMessage::new(ON_RECEIVED, CallType::Payable)).unwrap();
    assert_eq!(result, Value::Undefined);
}

// ============================================================================
// Return and field checks
// ============================================================================

#[test]
fn field_type_mismatch_is_reported() {
    let reg = registry();
    let mut w = wallet().with_field("label", Value::from(7));
    let err = run(&mut w, &reg, CallMessage::new("label", CallType::View)).unwrap_err();
    assert!(matches!(err, DispatchError::FieldTypeMismatch { actual: RuntimeKind::Number, .. }));
}

#[test]
fn return_type_mismatch_is_reported() {
    let reg = registry();
    let mut w = wallet().with_method("transfer", |_, _| Ok(Value::from("yes")));
    let msg = CallMessage::new("transfer", CallType::Payable).with_params(vec![Value::String(good_address()), Value::from(1)]);
    let err = run(&mut w, &reg, msg).unwrap_err();
    assert_eq!(err.to_string(), "Error executing 'transfer': wrong return type. Expect: boolean. Got: string.");
}

#[test]
fn contract_errors_propagate() {
    let reg = registry();
    let mut w = wallet().with_method("transfer", |_, _| Err(ContractError::thrown("insufficient funds")));
    let msg = CallMessage::new("transfer", CallType::Transaction).with_params(vec![Value::String(good_address()), Value::from(1)]);
    let err = run(&mut w, &reg, msg).unwrap_err();
    assert!(matches!(err, DispatchError::Contract(ContractError::Thrown(_))));
    assert_eq!(err.to_string(), "insufficient funds");
}

#[test]
fn readiness_hook_runs_before_methods() {
    let reg = registry();
    let mut w = wallet().with_ready(|this| {
        this.set("label", Value::from("ready"));
        Ok(())
    });
    run(&mut w, &reg, CallMessage::new("owner", CallType::View)).unwrap();
    assert_eq!(run(&mut w, &reg, CallMessage::new("label", CallType::View)).unwrap(), Value::from("ready"));
}

// ============================================================================
// Introspection and determinism
// ============================================================================

#[test]
fn metadata_returns_instance_and_registry() {
    let reg = registry();
    let mut w = wallet();
    let msg = CallMessage::new(METADATA, CallType::View);
    match dispatcher().dispatch(&msg, &mut w, &reg).unwrap() {
        Dispatched::Introspection { registry, .. } => assert_eq!(registry, &reg),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn repeated_dispatch_is_identical() {
    let reg = registry();
    let msg = CallMessage::from_json(json!({
        "name": "transfer",
        "params": [good_address(), 3],
        "callType": "transaction",
    }))
    .unwrap();
    let mut w = wallet();
    let first = run(&mut w, &reg, msg.clone());
    let second = run(&mut w, &reg, msg);
    assert_eq!(first.unwrap(), second.unwrap());

    let view = CallMessage::new("transfer", CallType::View);
    let a = run(&mut w, &reg, view.clone()).unwrap_err().to_string();
    let b = run(&mut w, &reg, view).unwrap_err().to_string();
    assert_eq!(a, b);
}
