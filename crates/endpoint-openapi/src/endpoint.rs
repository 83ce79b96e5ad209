/*!
Endpoint declarations.

An endpoint pairs an [`EndpointInput`] type (query string, body, path and
header sections) with an [`EndpointOutput`] type and the routing metadata
needed to place it in the document. The declaration types are never
instantiated; the generator only introspects their schemas.
*/

use crate::{
    error::{OpenApiError, OpenApiResult},
    schema::TypeDeclaration,
    utils::{capitalize, is_valid_component_name},
    OpenApiSchema,
};
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// HTTP methods an OpenAPI path item can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
    ];

    /// Lower-case key used inside a path item
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
            HttpMethod::Trace => "trace",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = OpenApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| OpenApiError::config_error(format!("Unsupported HTTP method: {}", s)))
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// Request side of an endpoint.
///
/// Use `()` for sections the endpoint does not have.
pub trait EndpointInput {
    /// Prefix for generated component names; defaults to the service name
    const DOMAIN_NAME: Option<&'static str> = None;

    type QueryStringParameters: OpenApiSchema;
    type BodyInput: OpenApiSchema;
    type PathParameters: OpenApiSchema;
    type Headers: OpenApiSchema;
}

/// Response side of an endpoint
pub trait EndpointOutput {
    type BodyOutput: OpenApiSchema;

    const CONTENT_TYPE: &'static str = "application/json";
    const STATUS_CODE: u16 = 200;
}

/// Introspected form of an [`EndpointInput`]
#[derive(Debug, Clone)]
pub struct InputDeclaration {
    type_name: &'static str,
    domain_name: Option<&'static str>,
    query: TypeDeclaration,
    body: TypeDeclaration,
    path: TypeDeclaration,
    headers: TypeDeclaration,
}

impl InputDeclaration {
    pub fn of<I: EndpointInput>() -> Self {
        Self {
            type_name: std::any::type_name::<I>(),
            domain_name: I::DOMAIN_NAME,
            query: TypeDeclaration::of::<I::QueryStringParameters>(),
            body: TypeDeclaration::of::<I::BodyInput>(),
            path: TypeDeclaration::of::<I::PathParameters>(),
            headers: TypeDeclaration::of::<I::Headers>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn query(&self) -> &TypeDeclaration {
        &self.query
    }

    pub fn body(&self) -> &TypeDeclaration {
        &self.body
    }

    pub fn path(&self) -> &TypeDeclaration {
        &self.path
    }

    pub fn headers(&self) -> &TypeDeclaration {
        &self.headers
    }
}

/// Introspected form of an [`EndpointOutput`]
#[derive(Debug, Clone)]
pub struct OutputDeclaration {
    type_name: &'static str,
    body: TypeDeclaration,
    content_type: &'static str,
    status_code: u16,
}

impl OutputDeclaration {
    pub fn of<O: EndpointOutput>() -> Self {
        Self {
            type_name: std::any::type_name::<O>(),
            body: TypeDeclaration::of::<O::BodyOutput>(),
            content_type: O::CONTENT_TYPE,
            status_code: O::STATUS_CODE,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn body(&self) -> &TypeDeclaration {
        &self.body
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }
}

/// One API operation: typed input/output plus routing metadata.
///
/// Built through [`EndpointConfig::builder`] and immutable afterwards.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    service_name: String,
    description: Option<String>,
    operation_id: String,
    http_method: HttpMethod,
    http_path: String,
    tags: Vec<String>,
    deprecated: bool,
    input: InputDeclaration,
    output: OutputDeclaration,
}

impl EndpointConfig {
    /// Start declaring an endpoint with request type `I` and response type `O`
    pub fn builder<I: EndpointInput, O: EndpointOutput>() -> EndpointConfigBuilder {
        EndpointConfigBuilder {
            input: InputDeclaration::of::<I>(),
            output: OutputDeclaration::of::<O>(),
            service_name: None,
            description: None,
            operation_id: None,
            http_method: None,
            http_path: None,
            tags: Vec::new(),
            deprecated: false,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    pub fn http_method(&self) -> HttpMethod {
        self.http_method
    }

    /// Normalised path, always starting with `/`
    pub fn http_path(&self) -> &str {
        &self.http_path
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn deprecated(&self) -> bool {
        self.deprecated
    }

    pub fn input(&self) -> &InputDeclaration {
        &self.input
    }

    pub fn output(&self) -> &OutputDeclaration {
        &self.output
    }

    /// Prefix of the component names generated for this endpoint
    pub fn domain_name(&self) -> String {
        capitalize(self.input.domain_name.unwrap_or(self.service_name.as_str()))
    }

    /// Placeholder names of the path template, in order of appearance
    pub fn path_placeholders(&self) -> OpenApiResult<Vec<String>> {
        extract_path_parameters(&self.http_path)
    }
}

/// Builder for [`EndpointConfig`]
#[derive(Debug, Clone)]
pub struct EndpointConfigBuilder {
    input: InputDeclaration,
    output: OutputDeclaration,
    service_name: Option<String>,
    description: Option<String>,
    operation_id: Option<String>,
    http_method: Option<String>,
    http_path: Option<String>,
    tags: Vec<String>,
    deprecated: bool,
}

impl EndpointConfigBuilder {
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Becomes the operation summary
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    /// Method name, case-insensitive (`"GET"`, `"post"`, ...)
    pub fn http_method(mut self, method: impl Into<String>) -> Self {
        self.http_method = Some(method.into());
        self
    }

    /// Path template such as `users/{userId}`; a leading `/` is added if missing
    pub fn http_path(mut self, path: impl Into<String>) -> Self {
        self.http_path = Some(path.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }

    /// Validate the declaration and freeze it
    pub fn build(self) -> OpenApiResult<EndpointConfig> {
        let service_name = required_field(self.service_name, "service name")?;
        let operation_id = required_field(self.operation_id, "operation id")?;
        if operation_id.chars().any(char::is_whitespace) {
            return Err(OpenApiError::config_error(format!(
                "operation id '{}' must not contain whitespace",
                operation_id
            )));
        }

        let http_method = required_field(self.http_method, "HTTP method")?.parse::<HttpMethod>()?;

        let raw_path = required_field(self.http_path, "HTTP path")?;
        let http_path = if raw_path.starts_with('/') {
            raw_path
        } else {
            format!("/{}", raw_path)
        };
        extract_path_parameters(&http_path)?;

        let config = EndpointConfig {
            service_name,
            description: self.description,
            operation_id,
            http_method,
            http_path,
            tags: self.tags,
            deprecated: self.deprecated,
            input: self.input,
            output: self.output,
        };

        let domain = config.domain_name();
        if !domain.is_empty() && !is_valid_component_name(&domain) {
            return Err(OpenApiError::config_error(format!(
                "domain name '{}' of {} may only contain letters, digits, '.', '-' and '_'",
                domain,
                config.input.type_name()
            )));
        }

        Ok(config)
    }
}

fn required_field(value: Option<String>, what: &str) -> OpenApiResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(OpenApiError::config_error(format!(
            "endpoint {} is required",
            what
        ))),
    }
}

/// Extract placeholder names from a path template.
///
/// Rejects empty, duplicated, nested or unbalanced braces.
pub fn extract_path_parameters(path: &str) -> OpenApiResult<Vec<String>> {
    let path_param_regex = Regex::new(r"\{([^{}/]+)\}").map_err(|e| {
        OpenApiError::config_error(format!("Failed to compile regex: {}", e))
    })?;

    let mut parameters: Vec<String> = Vec::new();
    for caps in path_param_regex.captures_iter(path) {
        if let Some(param) = caps.get(1) {
            let name = param.as_str().to_string();
            if parameters.contains(&name) {
                return Err(OpenApiError::config_error(format!(
                    "path '{}' repeats placeholder '{{{}}}'",
                    path, name
                )));
            }
            parameters.push(name);
        }
    }

    let remainder = path_param_regex.replace_all(path, "");
    if remainder.contains('{') || remainder.contains('}') {
        return Err(OpenApiError::config_error(format!(
            "malformed path template '{}'",
            path
        )));
    }

    Ok(parameters)
}
