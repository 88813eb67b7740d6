use serde::de::DeserializeOwned;

use crate::error::Error;

/// Deserialize a YAML node, reporting failures at `base` plus the nested
/// path inside the node.
pub fn from_yaml_with_path<T: DeserializeOwned>(node: &serde_yaml::Value, base: &str) -> Result<T, Error> {
    match serde_path_to_error::deserialize::<_, T>(node.clone()) {
        Ok(v) => Ok(v),
        Err(err) => {
            let inner = err.path().to_string();
            let path = match inner.as_str() {
                "." => base.to_string(),
                seq if seq.starts_with('[') => format!("{base}{seq}"),
                field => format!("{base}.{field}"),
            };
            Err(Error::Decode { path, message: err.into_inner().to_string() })
        }
    }
}

/// Deserialize JSON text with the JSON path of the failure in the error.
pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Error> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(Error::Config { path: Some(path), message: err.into_inner().to_string() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_yaml_failure_reports_full_path() {
        let node: serde_yaml::Value = serde_yaml::from_str("[a, [b]]").unwrap();
        let err = from_yaml_with_path::<Vec<String>>(&node, "protocols").unwrap_err();
        match err {
            Error::Decode { path, .. } => assert_eq!(path, "protocols[1]"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn json_failure_reports_field() {
        #[derive(serde::Deserialize, Debug)]
        #[allow(dead_code)]
        struct Probe {
            depth: i64,
        }
        let err = from_slice_with_path::<Probe>(br#"{"depth": "deep"}"#).unwrap_err();
        assert!(matches!(err, Error::Config { path: Some(ref p), .. } if p == "depth"));
    }
}
