/*!
Utility functions for OpenAPI generation: naming helpers, structural
validation and reading/writing documents.
*/

use crate::{
    endpoint::extract_path_parameters,
    error::{OpenApiError, OpenApiResult},
    specification::{
        OpenApiSpec, Operation, Parameter, ParameterLocation, RefOr, Schema,
        PARAMETER_REF_PREFIX, SCHEMA_REF_PREFIX,
    },
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Convert `snake_case` to `camelCase`.
///
/// Empty segments are dropped, so `user__id` becomes `userId`; a leading
/// underscore capitalizes the first word.
pub fn to_camel_case(name: &str) -> String {
    name.split('_')
        .enumerate()
        .filter(|(_, word)| !word.is_empty())
        .map(|(idx, word)| {
            if idx == 0 {
                word.to_string()
            } else {
                capitalize(word)
            }
        })
        .collect()
}

/// Upper-case the first letter, leaving the rest untouched
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// HTTP header name for a header property: `xRequestId` and `x_request_id`
/// both become `X-Request-Id`. Names that already contain `-` are kept.
pub fn to_header_name(property: &str) -> String {
    if property.contains('-') {
        return property.to_string();
    }

    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in property.chars() {
        if c == '_' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| capitalize(word))
        .collect::<Vec<_>>()
        .join("-")
}

/// Whether `name` is usable as a key under `components`
pub fn is_valid_component_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

/// Document serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Yaml,
}

impl OutputFormat {
    /// `.json` files are JSON, everything else is YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = OpenApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(OpenApiError::config_error(format!(
                "Unsupported output format: {}",
                other
            ))),
        }
    }
}

/// Utility functions for OpenAPI operations
pub struct OpenApiUtils;

impl OpenApiUtils {
    /// Validate an OpenAPI specification
    pub fn validate_spec(spec: &OpenApiSpec) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if spec.info.title.is_empty() {
            warnings.push(ValidationWarning::new(
                "info.title is required but empty",
                ValidationLevel::Error,
            ));
        }

        if spec.info.version.is_empty() {
            warnings.push(ValidationWarning::new(
                "info.version is required but empty",
                ValidationLevel::Error,
            ));
        }

        if !spec.openapi.starts_with("3.") {
            warnings.push(ValidationWarning::new(
                &format!("OpenAPI version {} may not be fully supported", spec.openapi),
                ValidationLevel::Warning,
            ));
        }

        if spec.paths.is_empty() {
            warnings.push(ValidationWarning::new(
                "No paths defined in specification",
                ValidationLevel::Warning,
            ));
        }

        let empty_parameters = BTreeMap::new();
        let component_parameters = spec
            .components
            .as_ref()
            .map(|c| &c.parameters)
            .unwrap_or(&empty_parameters);

        let mut operation_ids = BTreeSet::new();
        for (path, path_item) in &spec.paths {
            if !path.starts_with('/') {
                warnings.push(ValidationWarning::new(
                    &format!("Path '{}' should start with '/'", path),
                    ValidationLevel::Error,
                ));
            }

            if path_item.operations().next().is_none() {
                warnings.push(ValidationWarning::new(
                    &format!("Path '{}' has no operations defined", path),
                    ValidationLevel::Warning,
                ));
            }

            let placeholders = match extract_path_parameters(path) {
                Ok(placeholders) => placeholders,
                Err(err) => {
                    warnings.push(ValidationWarning::new(&err.to_string(), ValidationLevel::Error));
                    Vec::new()
                }
            };

            for (method, op) in path_item.operations() {
                let method = method.to_string();

                if op.responses.is_empty() {
                    warnings.push(ValidationWarning::new(
                        &format!("{} {} has no responses defined", method, path),
                        ValidationLevel::Error,
                    ));
                }

                match &op.operation_id {
                    Some(op_id) if op_id.is_empty() => warnings.push(ValidationWarning::new(
                        &format!("{} {} has empty operationId", method, path),
                        ValidationLevel::Error,
                    )),
                    Some(op_id) => {
                        if !operation_ids.insert(op_id.as_str()) {
                            warnings.push(ValidationWarning::new(
                                &format!("operationId '{}' is used more than once", op_id),
                                ValidationLevel::Error,
                            ));
                        }
                    }
                    None => warnings.push(ValidationWarning::new(
                        &format!("{} {} has no operationId", method, path),
                        ValidationLevel::Warning,
                    )),
                }

                let declared = Self::path_parameter_names(op, component_parameters);
                for placeholder in &placeholders {
                    if !declared.contains(placeholder.as_str()) {
                        warnings.push(ValidationWarning::new(
                            &format!(
                                "{} {} has no path parameter for '{{{}}}'",
                                method, path, placeholder
                            ),
                            ValidationLevel::Error,
                        ));
                    }
                }
                for name in &declared {
                    if !placeholders.iter().any(|p| p == name) {
                        warnings.push(ValidationWarning::new(
                            &format!(
                                "{} {} declares path parameter '{}' missing from the path",
                                method, path, name
                            ),
                            ValidationLevel::Error,
                        ));
                    }
                }
            }
        }

        let references = Self::collect_references(spec);
        let empty_schemas = BTreeMap::new();
        let component_schemas = spec
            .components
            .as_ref()
            .map(|c| &c.schemas)
            .unwrap_or(&empty_schemas);

        for reference in &references {
            let resolves = if let Some(name) = reference.strip_prefix(SCHEMA_REF_PREFIX) {
                component_schemas.contains_key(name)
            } else if let Some(name) = reference.strip_prefix(PARAMETER_REF_PREFIX) {
                component_parameters.contains_key(name)
            } else {
                false
            };

            if !resolves {
                warnings.push(ValidationWarning::new(
                    &format!("Reference '{}' does not resolve", reference),
                    ValidationLevel::Error,
                ));
            }
        }

        for schema_name in component_schemas.keys() {
            if !references.contains(&format!("{}{}", SCHEMA_REF_PREFIX, schema_name)) {
                warnings.push(ValidationWarning::new(
                    &format!("Schema '{}' is defined but never referenced", schema_name),
                    ValidationLevel::Info,
                ));
            }
        }

        warnings
    }

    /// Names of the path parameters an operation declares, inline or by reference
    fn path_parameter_names<'a>(
        op: &'a Operation,
        components: &'a BTreeMap<String, Parameter>,
    ) -> BTreeSet<&'a str> {
        op.parameters
            .iter()
            .filter_map(|param| match param {
                RefOr::Item(item) => Some(item),
                RefOr::Ref(reference) => reference
                    .reference
                    .strip_prefix(PARAMETER_REF_PREFIX)
                    .and_then(|name| components.get(name)),
            })
            .filter(|param| param.location == ParameterLocation::Path)
            .map(|param| param.name.as_str())
            .collect()
    }

    /// Every `$ref` string appearing anywhere in the document
    fn collect_references(spec: &OpenApiSpec) -> BTreeSet<String> {
        let mut references = BTreeSet::new();

        for path_item in spec.paths.values() {
            for (_, op) in path_item.operations() {
                for param in &op.parameters {
                    match param {
                        RefOr::Ref(reference) => {
                            references.insert(reference.reference.clone());
                        }
                        RefOr::Item(item) => {
                            if let Some(schema) = &item.schema {
                                Self::collect_schema_references(schema, &mut references);
                            }
                        }
                    }
                }

                let request_media = op
                    .request_body
                    .iter()
                    .flat_map(|body| body.content.values());
                let response_media = op.responses.values().flat_map(|r| r.content.values());
                for media in request_media.chain(response_media) {
                    if let Some(schema) = &media.schema {
                        Self::collect_schema_references(schema, &mut references);
                    }
                }
            }
        }

        if let Some(components) = &spec.components {
            for schema in components.schemas.values() {
                Self::collect_schema_references(schema, &mut references);
            }
            for schema in components.parameters.values().filter_map(|p| p.schema.as_ref()) {
                Self::collect_schema_references(schema, &mut references);
            }
        }

        references
    }

    fn collect_schema_references(schema: &Schema, references: &mut BTreeSet<String>) {
        if let Some(reference) = &schema.reference {
            references.insert(reference.clone());
        }

        let nested = schema
            .properties
            .values()
            .chain(schema.additional_properties.as_deref())
            .chain(schema.items.as_deref())
            .chain(schema.one_of.iter());

        for child in nested {
            Self::collect_schema_references(child, references);
        }
    }

    /// Serialize `spec` and write it to `path`, creating parent directories
    pub fn save_spec_to_file<P: AsRef<Path>>(
        spec: &OpenApiSpec,
        path: P,
        format: OutputFormat,
        pretty: bool,
    ) -> OpenApiResult<()> {
        let path = path.as_ref();
        let content = match format {
            OutputFormat::Json if pretty => serde_json::to_string_pretty(spec)?,
            OutputFormat::Json => serde_json::to_string(spec)?,
            OutputFormat::Yaml => serde_yaml::to_string(spec)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;

        info!(path = %path.display(), ?format, "wrote OpenAPI document");
        Ok(())
    }

    /// Load a specification from a JSON or YAML file
    pub fn load_spec_from_file<P: AsRef<Path>>(path: P) -> OpenApiResult<OpenApiSpec> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        match OutputFormat::from_path(path) {
            OutputFormat::Json => Ok(serde_json::from_str(&content)?),
            OutputFormat::Yaml => Ok(serde_yaml::from_str(&content)?),
        }
    }
}

/// Validation warning
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    pub message: String,
    pub level: ValidationLevel,
}

/// Validation level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationLevel {
    Error,
    Warning,
    Info,
}

impl ValidationWarning {
    pub fn new(message: &str, level: ValidationLevel) -> Self {
        Self {
            message: message.to_string(),
            level,
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == ValidationLevel::Error
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.level, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::HttpMethod;
    use crate::specification::{Components, MediaType, Response};

    fn spec_with_operation(path: &str, op: Operation) -> OpenApiSpec {
        let mut spec = OpenApiSpec::new("Test API", "1.0.0");
        spec.paths
            .entry(path.to_string())
            .or_default()
            .set_operation(HttpMethod::Get, op);
        spec
    }

    fn ok_responses(schema: Option<Schema>) -> BTreeMap<String, Response> {
        let mut content = BTreeMap::new();
        if let Some(schema) = schema {
            content.insert("application/json".to_string(), MediaType { schema: Some(schema) });
        }
        let mut responses = BTreeMap::new();
        responses.insert(
            "200".to_string(),
            Response {
                description: "Success".to_string(),
                content,
            },
        );
        responses
    }

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("user_id"), "userId");
        assert_eq!(to_camel_case("organization_name"), "organizationName");
        assert_eq!(to_camel_case("already"), "already");
        assert_eq!(to_camel_case("userId"), "userId");
        assert_eq!(to_camel_case("a__b"), "aB");
        assert_eq!(to_camel_case("_content_type"), "ContentType");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("user"), "User");
        assert_eq!(capitalize("MyService"), "MyService");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_to_header_name() {
        assert_eq!(to_header_name("xRequestId"), "X-Request-Id");
        assert_eq!(to_header_name("x_request_id"), "X-Request-Id");
        assert_eq!(to_header_name("authorization"), "Authorization");
        assert_eq!(to_header_name("apiKeyV2"), "Api-Key-V2");
        assert_eq!(to_header_name("X-Trace"), "X-Trace");
    }

    #[test]
    fn test_component_names() {
        assert!(is_valid_component_name("UserPathParametersuserId"));
        assert!(is_valid_component_name("X-Request-Id"));
        assert!(!is_valid_component_name("User Body"));
        assert!(!is_valid_component_name(""));
    }

    #[test]
    fn test_output_format_from_path() {
        assert_eq!(OutputFormat::from_path(Path::new("api.json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_path(Path::new("api.yaml")), OutputFormat::Yaml);
        assert_eq!(OutputFormat::from_path(Path::new("api")), OutputFormat::Yaml);
        assert_eq!("YML".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_empty_spec_only_warns() {
        let spec = OpenApiSpec::new("Test API", "1.0.0");
        let warnings = OpenApiUtils::validate_spec(&spec);
        assert!(!warnings.is_empty());
        assert!(warnings.iter().all(|w| !w.is_error()));
    }

    #[test]
    fn test_dangling_reference_is_error() {
        let op = Operation {
            operation_id: Some("getUser".to_string()),
            responses: ok_responses(Some(Schema::reference("Missing"))),
            ..Default::default()
        };
        let spec = spec_with_operation("/users", op);

        let warnings = OpenApiUtils::validate_spec(&spec);
        assert!(warnings
            .iter()
            .any(|w| w.is_error() && w.message.contains("#/components/schemas/Missing")));
    }

    #[test]
    fn test_missing_path_parameter_is_error() {
        let op = Operation {
            operation_id: Some("getUser".to_string()),
            responses: ok_responses(None),
            ..Default::default()
        };
        let spec = spec_with_operation("/users/{id}", op);

        let warnings = OpenApiUtils::validate_spec(&spec);
        assert!(warnings
            .iter()
            .any(|w| w.is_error() && w.message.contains("{id}")));
    }

    #[test]
    fn test_referenced_path_parameter_satisfies_placeholder() {
        let mut spec = spec_with_operation(
            "/users/{id}",
            Operation {
                operation_id: Some("getUser".to_string()),
                parameters: vec![RefOr::parameter_ref("UserPathParametersid")],
                responses: ok_responses(None),
                ..Default::default()
            },
        );

        let mut components = Components::default();
        components.schemas.insert("UserPathParametersid".to_string(), Schema::typed("string"));
        components.parameters.insert(
            "UserPathParametersid".to_string(),
            Parameter {
                name: "id".to_string(),
                location: ParameterLocation::Path,
                description: None,
                required: true,
                schema: Some(Schema::reference("UserPathParametersid")),
            },
        );
        spec.components = Some(components);

        let warnings = OpenApiUtils::validate_spec(&spec);
        assert!(warnings.iter().all(|w| !w.is_error()), "{:?}", warnings);
    }

    #[test]
    fn test_unused_schema_is_info() {
        let mut spec = spec_with_operation(
            "/health",
            Operation {
                operation_id: Some("health".to_string()),
                responses: ok_responses(None),
                ..Default::default()
            },
        );
        let mut components = Components::default();
        components.schemas.insert("Orphan".to_string(), Schema::typed("object"));
        spec.components = Some(components);

        let warnings = OpenApiUtils::validate_spec(&spec);
        assert!(warnings
            .iter()
            .any(|w| w.level == ValidationLevel::Info && w.message.contains("Orphan")));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let spec = spec_with_operation(
            "/health",
            Operation {
                operation_id: Some("health".to_string()),
                responses: ok_responses(Some(Schema::typed("string"))),
                ..Default::default()
            },
        );

        for file in ["nested/openapi.yaml", "openapi.json"] {
            let path = dir.path().join(file);
            let format = OutputFormat::from_path(&path);
            OpenApiUtils::save_spec_to_file(&spec, &path, format, true).unwrap();
            let loaded = OpenApiUtils::load_spec_from_file(&path).unwrap();
            assert_eq!(loaded, spec);
        }
    }
}
