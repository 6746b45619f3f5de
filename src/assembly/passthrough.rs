use serde_yaml::{Mapping, Value};

/// The one top-level key that is per-service rather than per-file.
pub const FILE_SCOPED_EXCLUDED_KEY: &str = "services";

/// Copy every top-level key of `document` except `services` into `output`.
///
/// Values are cloned unchanged. A document that is not a mapping has no
/// file-scoped keys.
pub fn copy_file_scoped_keys(output: &mut Mapping, document: &Value) {
    let Some(map) = document.as_mapping() else {
        return;
    };

    for (key, value) in map {
        if key.as_str() == Some(FILE_SCOPED_EXCLUDED_KEY) {
            continue;
        }
        output.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copies_everything_but_services() {
        let document: Value = serde_yaml::from_str(
            "services: {api: {image: x}}\nnetworks: {backend: {}}\nvolumes: {data: {}}\n\
             secrets: {token: {file: ./token.txt}}\ninclude: [shared.yaml]\nx-common: 1",
        )
        .unwrap();
        let mut output = Mapping::new();

        copy_file_scoped_keys(&mut output, &document);

        assert_eq!(output.len(), 5);
        assert!(output.get("services").is_none());
        for key in ["networks", "volumes", "secrets", "include", "x-common"] {
            assert_eq!(output.get(key), document.get(key), "{key} should be copied unchanged");
        }
    }

    #[test]
    fn test_preserves_document_order() {
        let document: Value = serde_yaml::from_str("b: 1\nservices: {}\na: 2").unwrap();
        let mut output = Mapping::new();

        copy_file_scoped_keys(&mut output, &document);

        let keys: Vec<_> = output.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_non_mapping_document() {
        let mut output = Mapping::new();
        copy_file_scoped_keys(&mut output, &Value::Null);
        assert!(output.is_empty());
    }
}
