//! Action flag parsing and typed parameter values.
//!
//! The global options are handled by clap; everything after the action name
//! is parsed here, because the action flags use single-dash long names
//! (`-zkconnect`, `-jobParm`) and repeat freely.

use std::collections::BTreeMap;

use streams_proto::JobId;

use crate::action::{Field, FieldKind};
use crate::error::CliError;

/// A value exactly as it appeared on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// Single-valued flag; the last occurrence wins.
    Single(String),
    /// Repeatable flag, values in order.
    List(Vec<String>),
    /// Switch that was present.
    Switch,
    /// `name=value` pairs.
    Map(BTreeMap<String, String>),
}

/// Flags seen on the command line, before the action's contract is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParams {
    entries: BTreeMap<Field, RawValue>,
}

impl RawParams {
    /// Parse action flags.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Usage`] for an unknown option, a stray argument or
    /// a flag missing its value, and [`CliError::Validation`] for a
    /// `-jobParm` that is not `name=value`.
    pub fn parse<I, S>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut params = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let arg = arg.as_ref();
            let field = if arg.starts_with('-') {
                Field::from_flag(arg).ok_or_else(|| CliError::Usage(format!("Unknown option:  {arg}")))?
            } else {
                return Err(CliError::Usage(format!("Unexpected argument:  {arg}")));
            };

            if field.kind() == FieldKind::Switch {
                params.entries.insert(field, RawValue::Switch);
                continue;
            }

            let value = args
                .next()
                .map(|v| v.as_ref().to_string())
                .ok_or_else(|| CliError::Usage(format!("Missing argument for option:  {}", field.flag())))?;
            params.push(field, value)?;
        }

        Ok(params)
    }

    fn push(&mut self, field: Field, value: String) -> Result<(), CliError> {
        match field.kind() {
            FieldKind::Single => {
                self.entries.insert(field, RawValue::Single(value));
            }
            FieldKind::Repeated => {
                if let RawValue::List(values) =
                    self.entries.entry(field).or_insert_with(|| RawValue::List(Vec::new()))
                {
                    values.push(value);
                }
            }
            FieldKind::NameValue => {
                let (name, value) = split_name_value(&value)?;
                if let RawValue::Map(map) =
                    self.entries.entry(field).or_insert_with(|| RawValue::Map(BTreeMap::new()))
                {
                    map.insert(name, value);
                }
            }
            FieldKind::Switch => {
                self.entries.insert(field, RawValue::Switch);
            }
        }
        Ok(())
    }

    /// Raw value of a field, if it was given.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&RawValue> {
        self.entries.get(&field)
    }

    /// Whether the field was given.
    #[must_use]
    pub fn contains(&self, field: Field) -> bool {
        self.entries.contains_key(&field)
    }

    /// Fields that were given, in reporting order.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.entries.keys().copied()
    }

    /// Take a field's raw value out.
    pub fn take(&mut self, field: Field) -> Option<RawValue> {
        self.entries.remove(&field)
    }
}

/// Split `name=value` at the first `=`; both sides must be non-empty.
fn split_name_value(entry: &str) -> Result<(String, String), CliError> {
    match entry.split_once('=') {
        Some((name, value)) if !name.is_empty() && !value.is_empty() => {
            Ok((name.to_string(), value.to_string()))
        }
        _ => Err(CliError::Validation(format!(
            "Format of job parameter name=value not valid:  {entry}"
        ))),
    }
}

/// A validated, typed parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Free text.
    Text(String),
    /// Unsigned integer.
    Integer(u64),
    /// Boolean switch.
    Bool(bool),
    /// Ordered list of strings.
    List(Vec<String>),
    /// Name to value map.
    Map(BTreeMap<String, String>),
    /// Optional field that was not given, or given empty.
    Unset,
}

/// Validated parameters of one invocation.
///
/// Every field the action accepts has an entry; getters for required fields
/// only fail if the action's contract and the caller disagree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    values: BTreeMap<Field, ParamValue>,
}

impl ParameterSet {
    pub(crate) fn insert(&mut self, field: Field, value: ParamValue) {
        self.values.insert(field, value);
    }

    /// Raw access to a value.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&ParamValue> {
        self.values.get(&field)
    }

    /// Text of a required field.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the field holds no text.
    pub fn text(&self, field: Field) -> Result<&str, CliError> {
        self.optional_text(field).ok_or_else(|| CliError::Validation(field.missing_message()))
    }

    /// Text of an optional field, `None` when unset.
    #[must_use]
    pub fn optional_text(&self, field: Field) -> Option<&str> {
        match self.values.get(&field) {
            Some(ParamValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// The `-job` value.
    ///
    /// # Errors
    ///
    /// Returns a validation error if no job id was validated.
    pub fn job_id(&self) -> Result<JobId, CliError> {
        match self.values.get(&Field::Job) {
            Some(ParamValue::Integer(id)) => Ok(JobId::new(*id)),
            _ => Err(CliError::Validation(Field::Job.missing_message())),
        }
    }

    /// A switch; false when absent.
    #[must_use]
    pub fn flag(&self, field: Field) -> bool {
        matches!(self.values.get(&field), Some(ParamValue::Bool(true)))
    }

    /// A repeatable field; empty when absent.
    #[must_use]
    pub fn list(&self, field: Field) -> &[String] {
        match self.values.get(&field) {
            Some(ParamValue::List(values)) => values,
            _ => &[],
        }
    }

    /// A `name=value` field; `None` when the field was never accepted.
    #[must_use]
    pub fn map(&self, field: Field) -> Option<&BTreeMap<String, String>> {
        match self.values.get(&field) {
            Some(ParamValue::Map(map)) => Some(map),
            _ => None,
        }
    }
}
