//! Decorator classification for class members.

use crate::compiler::ast::{DecoratorRef, MemberName};
use crate::CompileError;
use steep_core::{Decorator, DecoratorSet};

/// The only decorators a property may carry.
const PROPERTY_DECORATORS: [&str; 2] = ["state", "pure"];

/// Registry decorators for a property. Function-valued properties become
/// method entries, so they default to `view` rather than `pure`.
pub fn classify_property(
    name: &MemberName,
    decorators: &[DecoratorRef],
    function_valued: bool,
) -> Result<DecoratorSet, CompileError> {
    if let Some(bad) = decorators.iter().find(|d| !PROPERTY_DECORATORS.contains(&d.name.as_str())) {
        return Err(CompileError::InvalidPropertyDecorator {
            member: name.key(), decorator: bad.name.clone(),
            line: bad.span.line, col: bad.span.col,
        });
    }
    let mut set: DecoratorSet = decorators.iter().map(|d| Decorator::from(d.name.as_str())).collect();
    if set.contains(&Decorator::State) {
        if function_valued {
            let span = decorators.iter().find(|d| d.name == "state").map(|d| d.span);
            let (line, col) = span.map(|s| (s.line, s.col)).unwrap_or((0, 0));
            return Err(CompileError::StateOnFunctionMember { member: name.key(), line, col });
        }
        set.insert(Decorator::View);
    } else if set.is_empty() {
        set.insert(if function_valued { Decorator::View } else { Decorator::Pure });
    }
    Ok(set)
}

/// Registry decorators for a method. Unknown decorators are kept as-is; a
/// method with no call-type decorator is a `view`.
pub fn classify_method(name: &MemberName, decorators: &[DecoratorRef]) -> Result<DecoratorSet, CompileError> {
    if name.is_private() {
        if let Some(payable) = decorators.iter().find(|d| d.name == "payable") {
            return Err(CompileError::PrivatePayableConflict {
                member: name.key(), line: payable.span.line, col: payable.span.col,
            });
        }
    }
    let mut set: DecoratorSet = decorators.iter().map(|d| Decorator::from(d.name.as_str())).collect();
    match set.call_types().count() {
        0 => { set.insert(Decorator::View); }
        1 => {}
        n => tracing::warn!(member = %name, count = n, "method declares more than one call-type decorator"),
    }
    Ok(set)
}

/// Drop decorators whose meaning lives only in the registry.
pub fn strip_policy(decorators: Vec<DecoratorRef>) -> Vec<DecoratorRef> {
    decorators.into_iter().filter(|d| !Decorator::from(d.name.as_str()).is_policy()).collect()
}
