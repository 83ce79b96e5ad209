use crate::{
    config::OpenApiConfig,
    endpoint::EndpointConfig,
    error::{OpenApiError, OpenApiResult},
    schema::{SchemaGenerator, TypeDeclaration},
    specification::*,
    utils::{to_header_name, OpenApiUtils, OutputFormat, ValidationLevel},
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Main OpenAPI specification generator
pub struct OpenApiGenerator {
    /// Configuration
    config: OpenApiConfig,
    /// Declared endpoints, in registration order
    endpoints: Vec<EndpointConfig>,
    /// Generated specification
    spec: Option<OpenApiSpec>,
}

/// Components and routes collected while walking the endpoints
struct Assembly {
    paths: BTreeMap<String, PathItem>,
    schemas: BTreeMap<String, Schema>,
    parameters: BTreeMap<String, Parameter>,
    operation_ids: BTreeSet<String>,
}

impl OpenApiGenerator {
    /// Create a new OpenAPI generator
    pub fn new(config: OpenApiConfig) -> Self {
        Self {
            config,
            endpoints: Vec::new(),
            spec: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: EndpointConfig) -> Self {
        self.add_endpoint(endpoint);
        self
    }

    /// Register an endpoint. Any previously generated document is discarded.
    pub fn add_endpoint(&mut self, endpoint: EndpointConfig) {
        self.endpoints.push(endpoint);
        self.spec = None;
    }

    pub fn endpoints(&self) -> &[EndpointConfig] {
        &self.endpoints
    }

    pub fn config(&self) -> &OpenApiConfig {
        &self.config
    }

    /// Last generated document, if any
    pub fn specification(&self) -> Option<&OpenApiSpec> {
        self.spec.as_ref()
    }

    /// Generate OpenAPI specification from the registered endpoints
    pub fn generate(&mut self) -> OpenApiResult<&OpenApiSpec> {
        let mut schema_generator = SchemaGenerator::new(self.config.schema_config());
        let mut assembly = Assembly::new();

        for endpoint in &self.endpoints {
            info!(
                operation_id = endpoint.operation_id(),
                method = %endpoint.http_method(),
                path = endpoint.http_path(),
                "documenting endpoint"
            );
            Self::process_endpoint(&mut assembly, &mut schema_generator, endpoint)?;
        }

        for (name, schema) in schema_generator.into_schemas() {
            assembly.insert_schema(name, schema)?;
        }

        let components = Components {
            schemas: assembly.schemas,
            parameters: assembly.parameters,
        };

        let spec = OpenApiSpec {
            openapi: self.config.openapi_version.clone(),
            info: self.convert_api_info(),
            servers: self.convert_servers(),
            tags: self.convert_tags(),
            external_docs: self.config.external_docs.as_ref().map(|ed| ExternalDocumentation {
                url: ed.url.clone(),
                description: ed.description.clone(),
            }),
            paths: assembly.paths,
            components: if components.is_empty() {
                None
            } else {
                Some(components)
            },
        };

        Self::check(&spec)?;
        Ok(self.spec.insert(spec))
    }

    /// Validate the assembled document; error-level findings abort generation
    fn check(spec: &OpenApiSpec) -> OpenApiResult<()> {
        let mut errors = Vec::new();
        for warning in OpenApiUtils::validate_spec(spec) {
            match warning.level {
                ValidationLevel::Error => errors.push(warning.message),
                ValidationLevel::Warning => warn!("{}", warning.message),
                ValidationLevel::Info => debug!("{}", warning.message),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(OpenApiError::validation_error(errors.join("; ")))
        }
    }

    fn process_endpoint(
        assembly: &mut Assembly,
        generator: &mut SchemaGenerator,
        endpoint: &EndpointConfig,
    ) -> OpenApiResult<()> {
        let domain = endpoint.domain_name();
        let input = endpoint.input();

        if !assembly.operation_ids.insert(endpoint.operation_id().to_string()) {
            return Err(OpenApiError::config_error(format!(
                "operationId '{}' is declared by more than one endpoint",
                endpoint.operation_id()
            )));
        }

        let mut parameters = Vec::new();
        parameters.extend(Self::query_parameters(assembly, generator, &domain, input.query())?);
        parameters.extend(Self::path_parameters(assembly, generator, &domain, endpoint)?);
        parameters.extend(Self::header_parameters(assembly, generator, &domain, input.headers())?);

        let request_body = Self::request_body(assembly, generator, &domain, input.body())?;
        let responses = Self::responses(assembly, generator, &domain, endpoint)?;

        let operation = Operation {
            tags: endpoint.tags().to_vec(),
            summary: endpoint.description().map(str::to_string),
            operation_id: Some(endpoint.operation_id().to_string()),
            parameters,
            request_body,
            responses,
            deprecated: endpoint.deprecated().then_some(true),
        };

        let path_item = assembly
            .paths
            .entry(endpoint.http_path().to_string())
            .or_default();
        if path_item.operation(endpoint.http_method()).is_some() {
            return Err(OpenApiError::config_error(format!(
                "{} {} is declared more than once",
                endpoint.http_method(),
                endpoint.http_path()
            )));
        }
        path_item.set_operation(endpoint.http_method(), operation);

        Ok(())
    }

    /// One component parameter holding the whole query object
    fn query_parameters(
        assembly: &mut Assembly,
        generator: &mut SchemaGenerator,
        domain: &str,
        query: &TypeDeclaration,
    ) -> OpenApiResult<Option<RefOr<Parameter>>> {
        if query.is_absent() {
            return Ok(None);
        }

        let definition = generator.definition_for_declaration(query)?;
        let resolved = generator.resolve(&definition);
        let object_shaped = resolved.is_object()
            || (!resolved.one_of.is_empty()
                && resolved
                    .one_of
                    .iter()
                    .all(|variant| generator.resolve(variant).is_object()));
        if !object_shaped {
            return Err(OpenApiError::config_error(format!(
                "query string parameters of {} must be a struct or an enum of structs",
                domain
            )));
        }

        let name = format!("{}QueryStringParameters", domain);
        assembly.insert_schema(name.clone(), definition)?;
        assembly.insert_parameter(
            name.clone(),
            Parameter {
                name: name.clone(),
                location: ParameterLocation::Query,
                description: None,
                required: false,
                schema: Some(Schema::reference(&name)),
            },
        )?;

        Ok(Some(RefOr::parameter_ref(&name)))
    }

    /// One component parameter per path placeholder, in template order
    fn path_parameters(
        assembly: &mut Assembly,
        generator: &mut SchemaGenerator,
        domain: &str,
        endpoint: &EndpointConfig,
    ) -> OpenApiResult<Vec<RefOr<Parameter>>> {
        let placeholders = endpoint.path_placeholders()?;
        let path = endpoint.input().path();

        let properties = if path.is_absent() {
            BTreeMap::new()
        } else {
            Self::struct_properties(generator, path, "path parameters", domain)?.0
        };

        let declared: BTreeSet<&str> = properties.keys().map(String::as_str).collect();
        let expected: BTreeSet<&str> = placeholders.iter().map(String::as_str).collect();
        if declared != expected {
            return Err(OpenApiError::config_error(format!(
                "path parameters of {} ({}) do not match the placeholders of '{}' ({})",
                domain,
                declared.into_iter().collect::<Vec<_>>().join(", "),
                endpoint.http_path(),
                expected.into_iter().collect::<Vec<_>>().join(", ")
            )));
        }

        let mut parameters = Vec::new();
        for placeholder in &placeholders {
            let Some(schema) = properties.get(placeholder) else {
                continue;
            };
            let name = format!("{}PathParameters{}", domain, placeholder);
            assembly.insert_schema(name.clone(), schema.clone())?;
            assembly.insert_parameter(
                name.clone(),
                Parameter {
                    name: placeholder.clone(),
                    location: ParameterLocation::Path,
                    description: schema.description.clone(),
                    required: true,
                    schema: Some(Schema::reference(&name)),
                },
            )?;
            parameters.push(RefOr::parameter_ref(&name));
        }

        Ok(parameters)
    }

    /// One component parameter per header field
    fn header_parameters(
        assembly: &mut Assembly,
        generator: &mut SchemaGenerator,
        domain: &str,
        headers: &TypeDeclaration,
    ) -> OpenApiResult<Vec<RefOr<Parameter>>> {
        if headers.is_absent() {
            return Ok(Vec::new());
        }

        let (properties, required) = Self::struct_properties(generator, headers, "headers", domain)?;
        let mut parameters = Vec::new();
        for (property, schema) in properties {
            let name = format!("{}Headers{}", domain, property);
            let parameter = Parameter {
                required: required.contains(&property),
                name: to_header_name(&property),
                location: ParameterLocation::Header,
                description: schema.description.clone(),
                schema: Some(Schema::reference(&name)),
            };
            assembly.insert_schema(name.clone(), schema)?;
            assembly.insert_parameter(name.clone(), parameter)?;
            parameters.push(RefOr::parameter_ref(&name));
        }

        Ok(parameters)
    }

    /// Properties and required names of a section that must be a named-field struct
    fn struct_properties(
        generator: &mut SchemaGenerator,
        declaration: &TypeDeclaration,
        section: &str,
        domain: &str,
    ) -> OpenApiResult<(BTreeMap<String, Schema>, Vec<String>)> {
        let definition = generator.definition_for_declaration(declaration)?;
        let resolved = generator.resolve(&definition);
        if !resolved.is_object() || resolved.additional_properties.is_some() {
            return Err(OpenApiError::config_error(format!(
                "{} of {} must be a struct with named fields, found {}",
                section,
                domain,
                declaration.type_name()
            )));
        }
        Ok((resolved.properties.clone(), resolved.required.clone()))
    }

    fn request_body(
        assembly: &mut Assembly,
        generator: &mut SchemaGenerator,
        domain: &str,
        body: &TypeDeclaration,
    ) -> OpenApiResult<Option<RequestBody>> {
        if body.is_absent() {
            return Ok(None);
        }

        let name = format!("{}BodyInput", domain);
        let definition = generator.definition_for_declaration(body)?;
        assembly.insert_schema(name.clone(), definition)?;

        let mut content = BTreeMap::new();
        content.insert(
            "application/json".to_string(),
            MediaType {
                schema: Some(Schema::reference(&name)),
            },
        );

        Ok(Some(RequestBody {
            description: Some("Request body".to_string()),
            content,
            required: Some(!body.is_optional()),
        }))
    }

    fn responses(
        assembly: &mut Assembly,
        generator: &mut SchemaGenerator,
        domain: &str,
        endpoint: &EndpointConfig,
    ) -> OpenApiResult<BTreeMap<String, Response>> {
        let output = endpoint.output();
        let status = output.status_code();
        let content_type = output.content_type();

        if !(100..=599).contains(&status) {
            return Err(OpenApiError::config_error(format!(
                "{} declares invalid status code {}",
                endpoint.operation_id(),
                status
            )));
        }
        if !content_type.contains('/') || content_type.trim() != content_type {
            return Err(OpenApiError::config_error(format!(
                "{} declares invalid content type '{}'",
                endpoint.operation_id(),
                content_type
            )));
        }

        let body = output.body();
        let mut content = BTreeMap::new();
        if !body.is_absent() {
            let schema = match body.schema_name() {
                Some(body_name) => {
                    let name = format!("{}{}", domain, body_name);
                    let definition = generator.definition_for_declaration(body)?;
                    assembly.insert_schema(name.clone(), definition)?;
                    Schema::reference(&name)
                }
                None => generator.schema_for_declaration(body)?,
            };
            content.insert(
                content_type.to_string(),
                MediaType {
                    schema: Some(schema),
                },
            );
        }

        let mut responses = BTreeMap::new();
        responses.insert(
            status.to_string(),
            Response {
                description: reason_phrase(status).to_string(),
                content,
            },
        );
        Ok(responses)
    }

    /// Serialize the document as YAML, generating it first when needed
    pub fn export_yaml(&mut self) -> OpenApiResult<String> {
        Ok(serde_yaml::to_string(self.current()?)?)
    }

    /// Serialize the document as JSON, generating it first when needed
    pub fn export_json(&mut self, pretty: bool) -> OpenApiResult<String> {
        let spec = self.current()?;
        if pretty {
            Ok(serde_json::to_string_pretty(spec)?)
        } else {
            Ok(serde_json::to_string(spec)?)
        }
    }

    /// Write the document to the configured output path
    pub fn write(&mut self) -> OpenApiResult<PathBuf> {
        let path = self.config.output.path.clone();
        self.write_to(path)
    }

    /// Write the document to `path`. The configured format wins over the extension.
    pub fn write_to<P: AsRef<Path>>(&mut self, path: P) -> OpenApiResult<PathBuf> {
        let path = path.as_ref();
        let format = self
            .config
            .output
            .format
            .unwrap_or_else(|| OutputFormat::from_path(path));
        let pretty = self.config.output.pretty;

        OpenApiUtils::save_spec_to_file(self.current()?, path, format, pretty)?;
        Ok(path.to_path_buf())
    }

    fn current(&mut self) -> OpenApiResult<&OpenApiSpec> {
        if self.spec.is_none() {
            self.generate()?;
        }
        self.spec
            .as_ref()
            .ok_or_else(|| OpenApiError::validation_error("specification was not generated"))
    }

    /// Convert configuration info to specification info
    fn convert_api_info(&self) -> ApiInfo {
        ApiInfo {
            title: self.config.info.title.clone(),
            description: self.config.info.description.clone(),
            terms_of_service: self.config.info.terms_of_service.clone(),
            contact: self.config.info.contact.as_ref().map(|c| Contact {
                name: c.name.clone(),
                url: c.url.clone(),
                email: c.email.clone(),
            }),
            license: self.config.info.license.as_ref().map(|l| License {
                name: l.name.clone(),
                url: l.url.clone(),
            }),
            version: self.config.info.version.clone(),
        }
    }

    /// Convert server configurations
    fn convert_servers(&self) -> Vec<Server> {
        self.config
            .servers
            .iter()
            .map(|s| Server {
                url: s.url.clone(),
                description: s.description.clone(),
            })
            .collect()
    }

    /// Convert tags
    fn convert_tags(&self) -> Vec<Tag> {
        self.config
            .tags
            .iter()
            .map(|t| Tag {
                name: t.name.clone(),
                description: t.description.clone(),
            })
            .collect()
    }
}

impl Assembly {
    fn new() -> Self {
        Self {
            paths: BTreeMap::new(),
            schemas: BTreeMap::new(),
            parameters: BTreeMap::new(),
            operation_ids: BTreeSet::new(),
        }
    }

    /// Add a component schema; re-adding an identical definition is a no-op
    fn insert_schema(&mut self, name: String, schema: Schema) -> OpenApiResult<()> {
        match self.schemas.get(&name) {
            Some(existing) if *existing == schema => Ok(()),
            Some(_) => Err(OpenApiError::config_error(format!(
                "component schema '{}' is generated with two different definitions",
                name
            ))),
            None => {
                debug!(schema = %name, "added component schema");
                self.schemas.insert(name, schema);
                Ok(())
            }
        }
    }

    fn insert_parameter(&mut self, name: String, parameter: Parameter) -> OpenApiResult<()> {
        match self.parameters.get(&name) {
            Some(existing) if *existing == parameter => Ok(()),
            Some(_) => Err(OpenApiError::config_error(format!(
                "component parameter '{}' is generated with two different definitions",
                name
            ))),
            None => {
                self.parameters.insert(name, parameter);
                Ok(())
            }
        }
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "Success",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        _ => "Response",
    }
}
