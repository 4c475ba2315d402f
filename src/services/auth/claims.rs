use serde::Deserialize;
use serde_json::{Map, Value};

/// Decoded JWT payload.
///
/// Kept as a raw JSON object: providers add their own claims and only a handful are
/// interpreted here (`iss`, `aud`, `exp`, `nbf`, `sub`, `permissions`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClaimSet(Map<String, Value>);

impl ClaimSet {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn subject(&self) -> Option<&str> {
        self.get("sub").and_then(Value::as_str)
    }

    pub fn issuer(&self) -> Option<&str> {
        self.get("iss").and_then(Value::as_str)
    }

    /// `exp`/`nbf` are NumericDate: seconds, possibly fractional.
    pub fn numeric_date(&self, name: &str) -> Option<i64> {
        let value = self.get(name)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f.floor() as i64))
    }

    /// `aud` may be a single string or an array of strings.
    pub fn has_audience(&self, audience: &str) -> bool {
        match self.get("aud") {
            Some(Value::String(s)) => s == audience,
            Some(Value::Array(values)) => values.iter().any(|v| v.as_str() == Some(audience)),
            _ => false,
        }
    }

    /// - `None`: no `permissions` claim at all
    /// - `Some(Err(()))`: present but not an array of strings
    /// - `Some(Ok(..))`: the permission strings
    pub fn permissions(&self) -> Option<Result<Vec<&str>, ()>> {
        let value = self.get("permissions")?;
        let parsed = value
            .as_array()
            .ok_or(())
            .and_then(|arr| arr.iter().map(|v| v.as_str().ok_or(())).collect());
        Some(parsed)
    }
}

/// The parts of the JOSE header the authorizer looks at.
///
/// `alg` stays a plain string so that `none` and unknown names can be classified
/// instead of failing deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    #[serde(default)]
    pub kid: Option<String>,
}
