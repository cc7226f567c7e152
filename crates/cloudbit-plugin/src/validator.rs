//! Attribute value validators

use crate::diagnostics::{AttributePath, Diagnostic, Diagnostics};
use crate::value::Value;
use std::net::IpAddr;

#[derive(Debug, Clone, PartialEq)]
pub enum Validator {
    /// String must be one of the listed values
    OneOf(Vec<String>),
    /// String must be a CIDR network such as `10.0.0.0/24`
    Cidr,
    /// String must be an IPv4 or IPv6 address
    IpAddress,
    /// Integer must lie within the inclusive range
    IntRange { min: i64, max: i64 },
    /// String must not be empty
    NonEmpty,
}

impl Validator {
    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Validator::OneOf(values.into_iter().map(Into::into).collect())
    }

    pub fn int_range(min: i64, max: i64) -> Self {
        Validator::IntRange { min, max }
    }

    /// Validate a known, non-null value
    pub fn validate(&self, value: &Value, path: &AttributePath, diags: &mut Diagnostics) {
        if let Err(detail) = self.check(value) {
            diags.push(
                Diagnostic::error("Invalid Attribute Value", format!("Attribute {} {}", path, detail))
                    .with_attribute(path.clone()),
            );
        }
    }

    fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            Validator::OneOf(allowed) => {
                let s = value.as_str().unwrap_or_default();
                if allowed.iter().any(|a| a == s) {
                    Ok(())
                } else {
                    Err(format!(
                        "value must be one of: {}, got: {:?}",
                        allowed
                            .iter()
                            .map(|a| format!("{:?}", a))
                            .collect::<Vec<_>>()
                            .join(", "),
                        s
                    ))
                }
            }
            Validator::Cidr => {
                let s = value.as_str().unwrap_or_default();
                if is_cidr(s) {
                    Ok(())
                } else {
                    Err(format!("must be a valid CIDR network, got: {:?}", s))
                }
            }
            Validator::IpAddress => {
                let s = value.as_str().unwrap_or_default();
                if s.parse::<IpAddr>().is_ok() {
                    Ok(())
                } else {
                    Err(format!("must be a valid IP address, got: {:?}", s))
                }
            }
            Validator::IntRange { min, max } => match value.as_i64() {
                Some(n) if n >= *min && n <= *max => Ok(()),
                Some(n) => Err(format!("value must be between {} and {}, got: {}", min, max, n)),
                None => Err("must be an integer".to_string()),
            },
            Validator::NonEmpty => {
                if value.as_str().is_some_and(|s| !s.is_empty()) {
                    Ok(())
                } else {
                    Err("must not be empty".to_string())
                }
            }
        }
    }
}

fn is_cidr(s: &str) -> bool {
    let Some((addr, prefix)) = s.split_once('/') else {
        return false;
    };
    let Ok(addr) = addr.parse::<IpAddr>() else {
        return false;
    };
    let Ok(prefix) = prefix.parse::<u8>() else {
        return false;
    };

    match addr {
        IpAddr::V4(_) => prefix <= 32,
        IpAddr::V6(_) => prefix <= 128,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors(validator: &Validator, value: Value) -> usize {
        let mut diags = Diagnostics::new();
        validator.validate(&value, &AttributePath::root("attr"), &mut diags);
        diags.len()
    }

    #[test]
    fn test_one_of() {
        let v = Validator::one_of(["ingress", "egress"]);
        assert_eq!(errors(&v, Value::from("ingress")), 0);
        assert_eq!(errors(&v, Value::from("sideways")), 1);
    }

    #[test]
    fn test_cidr() {
        assert_eq!(errors(&Validator::Cidr, Value::from("172.31.0.0/24")), 0);
        assert_eq!(errors(&Validator::Cidr, Value::from("fd00::/64")), 0);
        assert_eq!(errors(&Validator::Cidr, Value::from("172.31.0.0")), 1);
        assert_eq!(errors(&Validator::Cidr, Value::from("172.31.0.0/33")), 1);
        assert_eq!(errors(&Validator::Cidr, Value::from("not-a-network/8")), 1);
    }

    #[test]
    fn test_ip_address() {
        assert_eq!(errors(&Validator::IpAddress, Value::from("10.0.0.1")), 0);
        assert_eq!(errors(&Validator::IpAddress, Value::from("10.0.0")), 1);
    }

    #[test]
    fn test_int_range() {
        let v = Validator::int_range(1, 65535);
        assert_eq!(errors(&v, Value::from(443)), 0);
        assert_eq!(errors(&v, Value::from(0)), 1);
        assert_eq!(errors(&v, Value::from(70000)), 1);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(errors(&Validator::NonEmpty, Value::from("web")), 0);
        assert_eq!(errors(&Validator::NonEmpty, Value::from("")), 1);
    }
}
