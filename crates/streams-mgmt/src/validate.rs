//! Contract validation: raw flags in, typed [`ParameterSet`] out.

use std::collections::BTreeMap;
use std::fmt;

use streams_proto::JobId;

use crate::action::{Action, Field, FieldKind};
use crate::error::CliError;
use crate::params::{ParamValue, ParameterSet, RawParams, RawValue};

/// The flags given do not satisfy an action's contract.
///
/// Holds one diagnostic per missing required field and per forbidden field,
/// in flag order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractViolation {
    /// Action being validated.
    pub action: Action,
    /// Human-readable diagnostics.
    pub diagnostics: Vec<String>,
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.diagnostics.join("\n"))
    }
}

impl std::error::Error for ContractViolation {}

/// Check raw flags against an action's contract and convert them.
///
/// All contract diagnostics are collected before failing. Type conversion
/// (`-job` must be numeric) runs only once the contract holds.
///
/// # Errors
///
/// Returns [`CliError::Contract`] when required fields are missing or
/// forbidden ones are present, and [`CliError::Validation`] when a value
/// cannot be converted.
pub fn validate(action: Action, mut raw: RawParams) -> Result<ParameterSet, CliError> {
    let spec = action.spec();
    let mut diagnostics = Vec::new();

    for field in Field::ALL {
        if spec.is_required(field) && is_blank(raw.get(field)) {
            diagnostics.push(field.missing_message());
        } else if spec.is_forbidden(field) && raw.contains(field) {
            diagnostics.push(field.forbidden_message());
        }
    }
    if !diagnostics.is_empty() {
        return Err(CliError::Contract(ContractViolation { action, diagnostics }));
    }

    let mut params = ParameterSet::default();
    for &field in spec.required.iter().chain(spec.optional) {
        let value = convert(field, raw.take(field))?;
        params.insert(field, value);
    }
    Ok(params)
}

fn is_blank(value: Option<&RawValue>) -> bool {
    match value {
        None => true,
        Some(RawValue::Single(s)) => s.is_empty(),
        Some(RawValue::List(values)) => values.is_empty(),
        Some(RawValue::Map(map)) => map.is_empty(),
        Some(RawValue::Switch) => false,
    }
}

fn convert(field: Field, value: Option<RawValue>) -> Result<ParamValue, CliError> {
    let value = match value {
        Some(RawValue::Single(s)) if s.is_empty() => None,
        other => other,
    };

    Ok(match (field.kind(), value) {
        (FieldKind::Switch, value) => ParamValue::Bool(value.is_some()),
        (FieldKind::Repeated, Some(RawValue::List(values))) => ParamValue::List(values),
        (FieldKind::Repeated, _) => ParamValue::List(Vec::new()),
        (FieldKind::NameValue, Some(RawValue::Map(map))) => ParamValue::Map(map),
        (FieldKind::NameValue, _) => ParamValue::Map(BTreeMap::new()),
        (FieldKind::Single, Some(RawValue::Single(s))) if field == Field::Job => {
            let id: JobId = s
                .parse()
                .map_err(|_| CliError::Validation(format!("Invalid job id:  {s}")))?;
            ParamValue::Integer(id.get())
        }
        (FieldKind::Single, Some(RawValue::Single(s))) => ParamValue::Text(s),
        (FieldKind::Single, _) => ParamValue::Unset,
    })
}
