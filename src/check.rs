//! Structural validation of a `Value` against a resolved `APIType`.
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{APIType, NativeType, Property};
use crate::value::{Value, ValueKind};

/// Relaxations of the default (strict) checking rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckValueOptions {
    /// An `integer` accepts an integral `number` and a `number` accepts an `integer`.
    pub allow_integer_to_be_number: bool,
    /// An array type accepts `null`; required array properties may be null.
    pub allow_array_to_be_null: bool,
    /// A required string/array/object/binary property may be present but empty.
    pub allow_required_property_to_be_empty: bool,
}

impl CheckValueOptions {
    pub fn allow_integer_to_be_number(mut self, allow: bool) -> Self {
        self.allow_integer_to_be_number = allow;
        self
    }
    pub fn allow_array_to_be_null(mut self, allow: bool) -> Self {
        self.allow_array_to_be_null = allow;
        self
    }
    pub fn allow_required_property_to_be_empty(mut self, allow: bool) -> Self {
        self.allow_required_property_to_be_empty = allow;
        self
    }
}

/// Check `value` against `api_type`. Presence is not checked here: a missing
/// value is the caller's concern (see required properties).
pub fn check_value_api_type(api_type: &APIType, value: &Value, options: &CheckValueOptions) -> Result<()> {
    if api_type.is_array {
        return check_array(api_type, value, options);
    }

    match &api_type.native_type {
        NativeType::Boolean => expect_kind(api_type, value, ValueKind::Boolean),
        NativeType::String | NativeType::DateTime => expect_kind(api_type, value, ValueKind::String),
        NativeType::Integer => match value {
            Value::Integer(_) => Ok(()),
            Value::Number(n) if options.allow_integer_to_be_number && is_integral(*n) => Ok(()),
            _ => Err(mismatch(api_type, value)),
        },
        NativeType::Number => match value {
            Value::Number(_) => Ok(()),
            Value::Integer(_) if options.allow_integer_to_be_number => Ok(()),
            _ => Err(mismatch(api_type, value)),
        },
        NativeType::File | NativeType::Any => Ok(()),
        NativeType::Nil => expect_kind(api_type, value, ValueKind::Null),
        NativeType::Array => match value {
            Value::Array(_) => Ok(()),
            Value::Null if options.allow_array_to_be_null => Ok(()),
            _ => Err(mismatch(api_type, value)),
        },
        NativeType::Object | NativeType::Custom(_) => check_object(api_type, value, options),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn check_array(api_type: &APIType, value: &Value, options: &CheckValueOptions) -> Result<()> {
    let elements = match value {
        Value::Array(elements) => elements.as_slice(),
        Value::Null if options.allow_array_to_be_null => &[],
        _ => return Err(mismatch(api_type, value)),
    };
    let mut element_type = api_type.clone();
    element_type.is_array = false;
    for (index, element) in elements.iter().enumerate() {
        match check_value_api_type(&element_type, element, options) {
            Ok(()) => {}
            Err(Error::PropertyTypeMismatch { property: None, .. }) => {
                return Err(Error::ArrayElementTypeMismatch {
                    index,
                    expected: element_type.base_type.clone(),
                    actual: element.kind(),
                });
            }
            Err(other) => return Err(other),
        }
    }
    Ok(())
}

fn check_object(api_type: &APIType, value: &Value, options: &CheckValueOptions) -> Result<()> {
    if api_type.is_inline() {
        return Ok(());
    }
    if !matches!(value, Value::Object(_) | Value::Null) {
        return Err(mismatch(api_type, value));
    }
    for property in api_type.properties().values() {
        check_property_required(property, value, options, api_type)?;
        check_property_value(property, value, options)?;
    }
    Ok(())
}

fn check_property_required(
    property: &Property,
    parent: &Value,
    options: &CheckValueOptions,
    owner: &APIType,
) -> Result<()> {
    if !property.required || (property.api_type.is_array && options.allow_array_to_be_null) {
        return Ok(());
    }
    let missing = || Error::RequiredProperty {
        property: property.name.clone(),
        owner: owner.type_name().to_string(),
    };
    let Value::Object(map) = parent else {
        return Err(missing());
    };
    let Some(value) = map.get(&property.name) else {
        return Err(missing());
    };
    let container_like = matches!(
        value.kind(),
        ValueKind::String | ValueKind::Array | ValueKind::Object | ValueKind::Binary
    );
    if !options.allow_required_property_to_be_empty && container_like && value.is_zero() {
        return Err(missing());
    }
    Ok(())
}

fn check_property_value(property: &Property, parent: &Value, options: &CheckValueOptions) -> Result<()> {
    let Value::Object(map) = parent else {
        return Ok(());
    };
    let Some(value) = map.get(&property.name) else {
        return Ok(());
    };
    if !property.required && value.is_zero() {
        return Ok(());
    }
    match check_value_api_type(&property.api_type, value, options) {
        Ok(()) => Ok(()),
        Err(Error::PropertyTypeMismatch { property: None, .. }) => Err(Error::PropertyTypeMismatch {
            property: Some(property.name.clone()),
            expected: property.api_type.type_name().to_string(),
            actual: value.kind(),
        }),
        Err(err @ Error::ArrayElementTypeMismatch { .. }) => {
            Err(Error::PropertyMismatch { property: property.name.clone(), source: Box::new(err) })
        }
        Err(other) => Err(other),
    }
}

fn expect_kind(api_type: &APIType, value: &Value, kind: ValueKind) -> Result<()> {
    if value.kind() == kind { Ok(()) } else { Err(mismatch(api_type, value)) }
}

fn mismatch(api_type: &APIType, value: &Value) -> Error {
    Error::PropertyTypeMismatch {
        property: None,
        expected: api_type.type_name().to_string(),
        actual: value.kind(),
    }
}

fn is_integral(n: f64) -> bool {
    n.is_finite() && n == (n as i64) as f64
}
