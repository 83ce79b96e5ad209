use crate::endpoint::HttpMethod;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prefix of every schema reference emitted by the generator
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Prefix of every parameter reference emitted by the generator
pub const PARAMETER_REF_PREFIX: &str = "#/components/parameters/";

/// Complete OpenAPI specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiSpec {
    /// OpenAPI specification version
    pub openapi: String,

    /// API metadata
    pub info: ApiInfo,

    /// Server URLs
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub servers: Vec<Server>,

    /// Tags for grouping operations
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<Tag>,

    /// External documentation
    #[serde(rename = "externalDocs", skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocumentation>,

    /// API paths and operations
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,

    /// Reusable components
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

/// API metadata information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiInfo {
    /// API title
    pub title: String,

    /// API description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Terms of service URL
    #[serde(rename = "termsOfService", skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,

    /// Contact information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,

    /// License information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,

    /// API version
    pub version: String,
}

/// Contact information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// License information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    /// Server URL
    pub url: String,

    /// Server description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Path item containing operations for a specific path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
}

impl PathItem {
    fn slot_mut(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Trace => &mut self.trace,
        }
    }

    /// Operation registered for `method`, if any
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Trace => self.trace.as_ref(),
        }
    }

    /// Store `operation` under `method`, returning the one it replaced
    pub fn set_operation(&mut self, method: HttpMethod, operation: Operation) -> Option<Operation> {
        self.slot_mut(method).replace(operation)
    }

    /// All operations on this path, in method declaration order
    pub fn operations(&self) -> impl Iterator<Item = (HttpMethod, &Operation)> {
        HttpMethod::ALL
            .into_iter()
            .filter_map(move |method| self.operation(method).map(|op| (method, op)))
    }
}

/// HTTP operation (GET, POST, etc.)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Operation {
    /// Tags for grouping
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,

    /// Short summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Unique operation ID
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,

    /// Parameters
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub parameters: Vec<RefOr<Parameter>>,

    /// Request body
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,

    /// Possible responses keyed by status code
    #[serde(default)]
    pub responses: BTreeMap<String, Response>,

    /// Deprecated flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
}

/// Either a `$ref` to a reusable component or the component inline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    Ref(Reference),
    Item(T),
}

/// JSON reference object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "$ref")]
    pub reference: String,
}

impl<T> RefOr<T> {
    /// Reference to `#/components/parameters/{name}`
    pub fn parameter_ref(name: &str) -> Self {
        Self::Ref(Reference {
            reference: format!("{}{}", PARAMETER_REF_PREFIX, name),
        })
    }
}

/// Where a parameter is carried in the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    Cookie,
}

/// Parameter for operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,

    /// Parameter location (query, header, path, cookie)
    #[serde(rename = "in")]
    pub location: ParameterLocation,

    /// Parameter description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Required flag
    pub required: bool,

    /// Schema defining the parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// Request body specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Media type content
    pub content: BTreeMap<String, MediaType>,

    /// Required flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

/// Response specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Description
    pub description: String,

    /// Content
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub content: BTreeMap<String, MediaType>,
}

/// Media type specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// Schema for data types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Schema {
    /// Schema title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Data type
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,

    /// Format specifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Nullable flag (OpenAPI 3.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    /// Properties for object types
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,

    /// Required properties
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    /// Additional properties schema
    #[serde(rename = "additionalProperties", skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<Schema>>,

    /// Items schema for arrays
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    /// Validation: minimum array length
    #[serde(rename = "minItems", skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,

    /// Validation: maximum array length
    #[serde(rename = "maxItems", skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,

    /// Validation: all items distinct
    #[serde(rename = "uniqueItems", skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,

    /// Enum values
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<serde_json::Value>,

    /// Reference to another schema
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// OneOf composition
    #[serde(rename = "oneOf", skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,

    /// Validation: minimum value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<serde_json::Number>,
}

/// Value of the `type` keyword. OpenAPI 3.1 allows a list of types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Multiple(Vec<String>),
}

impl SchemaType {
    /// First type other than `null`
    pub fn primary(&self) -> Option<&str> {
        match self {
            Self::Single(name) => Some(name.as_str()),
            Self::Multiple(names) => names.iter().map(String::as_str).find(|n| *n != "null"),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        match self {
            Self::Single(single) => single == name,
            Self::Multiple(names) => names.iter().any(|n| n == name),
        }
    }
}

impl Schema {
    /// Schema with only `type` set
    pub fn typed(schema_type: &str) -> Self {
        Self {
            schema_type: Some(SchemaType::Single(schema_type.to_string())),
            ..Default::default()
        }
    }

    /// Schema with `type` and `format` set
    pub fn formatted(schema_type: &str, format: &str) -> Self {
        Self {
            format: Some(format.to_string()),
            ..Self::typed(schema_type)
        }
    }

    /// `$ref` to `#/components/schemas/{name}`
    pub fn reference(name: &str) -> Self {
        Self {
            reference: Some(format!("{}{}", SCHEMA_REF_PREFIX, name)),
            ..Default::default()
        }
    }

    /// Component name this schema points at, if it is a schema reference
    pub fn referenced_name(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .and_then(|r| r.strip_prefix(SCHEMA_REF_PREFIX))
    }

    /// Main `type` of this schema, ignoring a `null` alternative
    pub fn type_name(&self) -> Option<&str> {
        self.schema_type.as_ref().and_then(SchemaType::primary)
    }

    /// Whether this is an object schema
    pub fn is_object(&self) -> bool {
        self.type_name() == Some("object")
    }

    /// Allow `null` in place of this schema.
    ///
    /// With `type_arrays` (OpenAPI 3.1) `null` joins the `type` list;
    /// otherwise the 3.0 `nullable` flag is set. Untyped schemas already
    /// accept `null` and are left alone under 3.1.
    pub fn make_nullable(&mut self, type_arrays: bool) {
        if !type_arrays {
            self.nullable = Some(true);
            return;
        }

        self.schema_type = match self.schema_type.take() {
            Some(SchemaType::Single(name)) if name != "null" => {
                Some(SchemaType::Multiple(vec![name, "null".to_string()]))
            }
            Some(SchemaType::Multiple(mut names)) => {
                if !names.iter().any(|n| n == "null") {
                    names.push("null".to_string());
                }
                Some(SchemaType::Multiple(names))
            }
            other => other,
        };
        if !self.enum_values.is_empty() && !self.enum_values.contains(&serde_json::Value::Null) {
            self.enum_values.push(serde_json::Value::Null);
        }
    }
}

/// Reusable components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Components {
    /// Reusable schemas
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub schemas: BTreeMap<String, Schema>,

    /// Reusable parameters
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub parameters: BTreeMap<String, Parameter>,
}

impl Components {
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty() && self.parameters.is_empty()
    }
}

/// Tag for grouping operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// External documentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalDocumentation {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl OpenApiSpec {
    /// Create a new, empty OpenAPI 3.1 specification
    pub fn new(title: &str, version: &str) -> Self {
        Self {
            openapi: "3.1.0".to_string(),
            info: ApiInfo {
                title: title.to_string(),
                description: None,
                terms_of_service: None,
                contact: None,
                license: None,
                version: version.to_string(),
            },
            servers: Vec::new(),
            tags: Vec::new(),
            external_docs: None,
            paths: BTreeMap::new(),
            components: None,
        }
    }
}
