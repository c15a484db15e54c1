use std::path::Path;

use crate::error::AppError;

/// Load a JSON schema file.
pub fn load_schema(path: &Path) -> Result<serde_json::Value, AppError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        AppError::Schema(format!("Failed to read schema file {}: {e}", path.display()))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        AppError::Schema(format!(
            "Invalid JSON in schema file {}: {e}",
            path.display()
        ))
    })
}

/// Validate an instance against a schema, reporting the first violation.
pub fn validate_instance(
    instance: &serde_json::Value,
    schema: &serde_json::Value,
) -> Result<(), AppError> {
    let validator = jsonschema::validator_for(schema)
        .map_err(|e| AppError::Schema(format!("Invalid schema: {e}")))?;
    validator
        .validate(instance)
        .map_err(|e| AppError::Schema(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const INPUT_SCHEMA: &str = r#"{
        "type": "object",
        "properties": {
            "keywords": {"type": "array", "items": {"type": "string"}},
            "type": {"type": "string"}
        },
        "required": ["keywords", "type"]
    }"#;

    fn write_schema(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_schema() {
        let tmp = TempDir::new().unwrap();
        let path = write_schema(&tmp, "schema_input.json", INPUT_SCHEMA);

        let schema = load_schema(&path).unwrap();
        assert_eq!(schema["type"], "object");
    }

    #[test]
    fn test_load_schema_missing_file() {
        let err = load_schema(Path::new("/nonexistent/schema.json")).unwrap_err();
        assert!(matches!(err, AppError::Schema(_)));
    }

    #[test]
    fn test_load_schema_invalid_json() {
        let tmp = TempDir::new().unwrap();
        let path = write_schema(&tmp, "broken.json", "{not json");

        let err = load_schema(&path).unwrap_err();
        assert!(matches!(err, AppError::Schema(_)));
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn test_validate_instance_accepts_conforming_input() {
        let schema: serde_json::Value = serde_json::from_str(INPUT_SCHEMA).unwrap();
        let instance = serde_json::json!({
            "keywords": ["openstack", "nova"],
            "type": "Repositories"
        });
        assert!(validate_instance(&instance, &schema).is_ok());
    }

    #[test]
    fn test_validate_instance_rejects_missing_field() {
        let schema: serde_json::Value = serde_json::from_str(INPUT_SCHEMA).unwrap();
        let instance = serde_json::json!({"keywords": ["css"]});

        let err = validate_instance(&instance, &schema).unwrap_err();
        assert!(matches!(err, AppError::Schema(_)));
    }
}
