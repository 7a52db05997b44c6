use std::fmt;

use rosc::OscType;
use serde::Deserialize;

/// Declared type of a watched parameter or set command.
///
/// Anything other than `int32` or `float32` in the configuration is treated as
/// opaque: values pass through uninterpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Int32,
    Float32,
    #[serde(other)]
    Opaque,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Int32 => f.write_str("int32"),
            ParamType::Float32 => f.write_str("float32"),
            ParamType::Opaque => f.write_str("opaque"),
        }
    }
}

/// A typed parameter value as observed on the wire or declared in config.
///
/// Equality is per variant: an `Int32(0)` never equals a `Float32(0.0)`.
/// Float comparison is exact, matching what the console reports back.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int32(i32),
    Float32(f32),
    /// Any other codec argument, kept as-is.
    Opaque(OscType),
}

impl ParamValue {
    /// Interprets an inbound argument according to the declared type.
    ///
    /// Numeric types coerce between integer and float wire encodings. Returns
    /// `None` when the argument cannot be read as the declared type.
    pub fn from_wire(declared: ParamType, arg: &OscType) -> Option<Self> {
        match declared {
            ParamType::Int32 => match arg {
                OscType::Int(v) => Some(Self::Int32(*v)),
                OscType::Float(v) => Some(Self::Int32(*v as i32)),
                OscType::Double(v) => Some(Self::Int32(*v as i32)),
                _ => None,
            },
            ParamType::Float32 => match arg {
                OscType::Float(v) => Some(Self::Float32(*v)),
                OscType::Double(v) => Some(Self::Float32(*v as f32)),
                OscType::Int(v) => Some(Self::Float32(*v as f32)),
                _ => None,
            },
            ParamType::Opaque => Some(Self::Opaque(arg.clone())),
        }
    }

    /// The type tag this value belongs to.
    pub fn param_type(&self) -> ParamType {
        match self {
            ParamValue::Int32(_) => ParamType::Int32,
            ParamValue::Float32(_) => ParamType::Float32,
            ParamValue::Opaque(_) => ParamType::Opaque,
        }
    }

    /// Converts the value into the codec argument sent to the console.
    pub fn to_osc(&self) -> OscType {
        match self {
            ParamValue::Int32(v) => OscType::Int(*v),
            ParamValue::Float32(v) => OscType::Float(*v),
            ParamValue::Opaque(arg) => arg.clone(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int32(v) => write!(f, "{v}"),
            ParamValue::Float32(v) => write!(f, "{v}"),
            ParamValue::Opaque(arg) => write!(f, "{arg:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_declared_parameters_truncate_float_arguments() {
        let value = ParamValue::from_wire(ParamType::Int32, &OscType::Float(59.9));
        assert_eq!(value, Some(ParamValue::Int32(59)));
    }

    #[test]
    fn float_declared_parameters_accept_integer_arguments() {
        let value = ParamValue::from_wire(ParamType::Float32, &OscType::Int(1));
        assert_eq!(value, Some(ParamValue::Float32(1.0)));
    }

    #[test]
    fn numeric_declarations_reject_non_numeric_arguments() {
        let arg = OscType::String("on".to_string());
        assert_eq!(ParamValue::from_wire(ParamType::Int32, &arg), None);
        assert_eq!(ParamValue::from_wire(ParamType::Float32, &arg), None);
    }

    #[test]
    fn opaque_values_pass_through() {
        let arg = OscType::String("Vocals".to_string());
        let value = ParamValue::from_wire(ParamType::Opaque, &arg).unwrap();
        assert_eq!(value, ParamValue::Opaque(arg.clone()));
        assert_eq!(value.to_osc(), arg);
    }

    #[test]
    fn equality_is_per_variant() {
        assert_ne!(ParamValue::Int32(0), ParamValue::Float32(0.0));
        assert_eq!(ParamValue::Float32(0.99999), ParamValue::Float32(0.99999));
    }

    #[test]
    fn unknown_type_names_deserialize_as_opaque() {
        let parsed: ParamType = serde_yaml::from_str("string").unwrap();
        assert_eq!(parsed, ParamType::Opaque);
        let parsed: ParamType = serde_yaml::from_str("float32").unwrap();
        assert_eq!(parsed, ParamType::Float32);
    }
}
