//! Serde convention for ratios that may legitimately be `+∞`.
//!
//! JSON has no infinity literal and `serde_json` would silently write `null`.
//! Infinite values are written as the strings `"Infinity"` / `"-Infinity"`
//! and read back as the matching `f64`. NaN is written as `0`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum Repr {
    Number(f64),
    Text(String),
}

pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_nan() {
        Repr::Number(0.0).serialize(serializer)
    } else if value.is_infinite() {
        let text = if *value > 0.0 { "Infinity" } else { "-Infinity" };
        Repr::Text(text.to_string()).serialize(serializer)
    } else {
        Repr::Number(*value).serialize(serializer)
    }
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Repr::deserialize(deserializer)? {
        Repr::Number(v) => Ok(v),
        Repr::Text(s) => match s.as_str() {
            "Infinity" | "inf" => Ok(f64::INFINITY),
            "-Infinity" | "-inf" => Ok(f64::NEG_INFINITY),
            other => Err(serde::de::Error::custom(format!(
                "expected a number or \"Infinity\", got \"{other}\""
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super")]
        value: f64,
    }

    #[test]
    fn infinity_is_written_as_string() {
        let json = serde_json::to_string(&Wrapper { value: f64::INFINITY }).unwrap();
        assert_eq!(json, r#"{"value":"Infinity"}"#);
        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert!(back.value.is_infinite() && back.value > 0.0);
    }

    #[test]
    fn finite_values_stay_numbers() {
        let json = serde_json::to_string(&Wrapper { value: 1.5 }).unwrap();
        assert_eq!(json, r#"{"value":1.5}"#);
    }

    #[test]
    fn garbage_text_is_rejected() {
        assert!(serde_json::from_str::<Wrapper>(r#"{"value":"lots"}"#).is_err());
    }
}
