use crate::abi::AbiEvent;
use crate::catalog::ResponseType;

/// Resolve a named event parameter to a concrete wire kind.
///
/// Needs a previously narrowed event signature; without one the stored value
/// stays the generic `Variant`. An unmatched signature or parameter name also
/// stays `Variant`: narrowing refines, it never fails.
pub fn resolve_parameter(
    events: &[AbiEvent],
    narrowed: Option<&str>,
    name: &str,
) -> ResponseType {
    let Some(signature) = narrowed else {
        return ResponseType::Variant;
    };
    let Some(event) = events.iter().find(|event| event.signature() == signature) else {
        tracing::debug!(signature, "no event interface matches the narrowed signature");
        return ResponseType::Variant;
    };
    let Some(param) = event.inputs.iter().find(|param| param.name == name) else {
        tracing::debug!(signature, parameter = name, "no such parameter on the matched event");
        return ResponseType::Variant;
    };
    param.response_type()
}
