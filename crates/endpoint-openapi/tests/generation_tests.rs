//! End-to-end generation of documents for declared endpoints.

use endpoint_openapi::{
    specification::{ParameterLocation, RefOr},
    utils::{OpenApiUtils, ValidationLevel},
    EndpointConfig, EndpointInput, EndpointOutput, OpenApiConfig, OpenApiGenerator,
    OpenApiSchema, OutputFormat,
};
use tempfile::TempDir;

#[derive(OpenApiSchema)]
struct QueryStringParametersUser {
    user: String,
}

#[derive(OpenApiSchema)]
struct QueryStringParametersOrganization {
    organization_name: String,
}

#[derive(OpenApiSchema)]
enum QueryStringParameters {
    User(QueryStringParametersUser),
    Organization(QueryStringParametersOrganization),
}

#[derive(OpenApiSchema)]
struct PathParameters {
    user_id: String,
}

#[derive(OpenApiSchema)]
struct OutputBody {
    code: i64,
    message: String,
    response: serde_json::Value,
}

struct RequestSchema;

impl EndpointInput for RequestSchema {
    type QueryStringParameters = QueryStringParameters;
    type BodyInput = ();
    type PathParameters = PathParameters;
    type Headers = ();
}

struct ResponseSchema;

impl EndpointOutput for ResponseSchema {
    type BodyOutput = OutputBody;
}

/// Account being created
#[derive(OpenApiSchema)]
struct NewAccount {
    /// Login handle
    user_name: String,
    #[openapi(rename = "e-mail")]
    email: Option<String>,
    roles: Vec<Role>,
    #[openapi(skip)]
    password_hash: String,
}

#[derive(OpenApiSchema)]
enum Role {
    Admin,
    #[openapi(rename = "read-only")]
    ReadOnly,
}

#[derive(OpenApiSchema)]
struct AccountHeaders {
    x_correlation_id: Option<String>,
}

struct CreateAccountInput;

impl EndpointInput for CreateAccountInput {
    const DOMAIN_NAME: Option<&'static str> = Some("account");

    type QueryStringParameters = ();
    type BodyInput = NewAccount;
    type PathParameters = ();
    type Headers = AccountHeaders;
}

struct CreateAccountOutput;

impl EndpointOutput for CreateAccountOutput {
    type BodyOutput = Vec<String>;

    const STATUS_CODE: u16 = 201;
}

fn sample_endpoint() -> EndpointConfig {
    EndpointConfig::builder::<RequestSchema, ResponseSchema>()
        .service_name("MyService")
        .description("My service description")
        .operation_id("myEndpoint")
        .http_method("GET")
        .http_path("world/{userId}")
        .build()
        .unwrap()
}

fn create_account_endpoint() -> EndpointConfig {
    EndpointConfig::builder::<CreateAccountInput, CreateAccountOutput>()
        .service_name("MyService")
        .operation_id("createAccount")
        .http_method("post")
        .http_path("/accounts")
        .tag("accounts")
        .build()
        .unwrap()
}

fn sample_generator() -> OpenApiGenerator {
    OpenApiGenerator::new(OpenApiConfig::new("Service", "1.0").with_description("Description"))
        .with_endpoint(sample_endpoint())
        .with_endpoint(create_account_endpoint())
}

#[test]
fn test_sample_service_document() {
    let mut generator = sample_generator();
    let spec = generator.generate().unwrap();

    assert_eq!(spec.openapi, "3.1.0");
    assert_eq!(spec.info.title, "Service");
    assert_eq!(spec.info.description.as_deref(), Some("Description"));

    let op = spec.paths["/world/{userId}"].get.as_ref().unwrap();
    assert_eq!(op.summary.as_deref(), Some("My service description"));

    let components = spec.components.as_ref().unwrap();

    let query = &components.parameters["MyServiceQueryStringParameters"];
    assert_eq!(query.location, ParameterLocation::Query);
    assert!(!query.required);

    let query_schema = &components.schemas["MyServiceQueryStringParameters"];
    let variants: Vec<_> = query_schema
        .one_of
        .iter()
        .map(|s| s.referenced_name().unwrap())
        .collect();
    assert_eq!(
        variants,
        vec!["QueryStringParametersUser", "QueryStringParametersOrganization"]
    );

    let path = &components.parameters["MyServicePathParametersuserId"];
    assert_eq!(path.name, "userId");
    assert_eq!(path.location, ParameterLocation::Path);
    assert!(path.required);
    assert_eq!(
        path.schema.as_ref().unwrap().referenced_name(),
        Some("MyServicePathParametersuserId")
    );

    let output = &components.schemas["MyServiceOutputBody"];
    assert_eq!(
        output.required,
        vec!["code".to_string(), "message".to_string(), "response".to_string()]
    );
    assert_eq!(output.properties["code"].format.as_deref(), Some("int64"));
    assert_eq!(
        output.properties["response"],
        endpoint_openapi::specification::Schema::default()
    );
}

#[test]
fn test_body_headers_and_inline_response() {
    let mut generator = sample_generator();
    let spec = generator.generate().unwrap();
    let components = spec.components.as_ref().unwrap();

    let op = spec.paths["/accounts"].post.as_ref().unwrap();
    assert_eq!(op.tags, vec!["accounts".to_string()]);
    assert!(matches!(&op.parameters[..], [RefOr::Ref(r)] if r.reference.ends_with("AccountHeadersxCorrelationId")));

    let header = &components.parameters["AccountHeadersxCorrelationId"];
    assert_eq!(header.name, "X-Correlation-Id");
    assert_eq!(header.location, ParameterLocation::Header);
    assert!(!header.required);

    let body = &components.schemas["AccountBodyInput"];
    assert_eq!(body.description.as_deref(), Some("Account being created"));
    assert_eq!(
        body.required,
        vec!["userName".to_string(), "roles".to_string()]
    );
    assert_eq!(
        body.properties["userName"].description.as_deref(),
        Some("Login handle")
    );
    assert!(body.properties.contains_key("e-mail"));
    assert!(!body.properties.contains_key("passwordHash"));

    let roles = body.properties["roles"].items.as_ref().unwrap();
    assert_eq!(
        roles.enum_values,
        vec![serde_json::json!("Admin"), serde_json::json!("read-only")]
    );

    let response = &op.responses["201"];
    assert_eq!(response.description, "Created");
    let schema = response.content["application/json"].schema.as_ref().unwrap();
    assert_eq!(schema.type_name(), Some("array"));
}

#[test]
fn test_each_field_appears_once() {
    let mut generator = sample_generator();
    let yaml = generator.export_yaml().unwrap();

    assert_eq!(yaml.matches("organizationName:").count(), 1);
    assert_eq!(yaml.matches("userName:").count(), 1);
}

#[test]
fn test_generation_is_deterministic() {
    let first = sample_generator().export_yaml().unwrap();
    let second = sample_generator().export_yaml().unwrap();
    assert_eq!(first, second);

    let json_first = sample_generator().export_json(true).unwrap();
    let json_second = sample_generator().export_json(true).unwrap();
    assert_eq!(json_first, json_second);
}

#[test]
fn test_generated_document_validates() {
    let mut generator = sample_generator();
    let spec = generator.generate().unwrap();

    let findings = OpenApiUtils::validate_spec(spec);
    assert!(findings
        .iter()
        .all(|finding| finding.level != ValidationLevel::Error));
}

#[test]
fn test_write_and_reload_yaml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("docs").join("output_openapi.yaml");

    let config = OpenApiConfig::new("Service", "1.0").with_output_path(&path);
    let mut generator = OpenApiGenerator::new(config).with_endpoint(sample_endpoint());

    let written = generator.write().unwrap();
    assert_eq!(written, path);

    let reloaded = OpenApiUtils::load_spec_from_file(&path).unwrap();
    assert_eq!(&reloaded, generator.specification().unwrap());
}

#[test]
fn test_write_json_by_extension_and_override() {
    let dir = TempDir::new().unwrap();

    let mut generator = OpenApiGenerator::new(OpenApiConfig::new("Service", "1.0"))
        .with_endpoint(sample_endpoint());
    let json_path = generator.write_to(dir.path().join("spec.json")).unwrap();
    let content = std::fs::read_to_string(&json_path).unwrap();
    assert!(serde_json::from_str::<serde_json::Value>(&content).is_ok());

    let config = OpenApiConfig::new("Service", "1.0").with_output_format(OutputFormat::Json);
    let mut generator = OpenApiGenerator::new(config).with_endpoint(sample_endpoint());
    let forced = generator.write_to(dir.path().join("spec.yaml")).unwrap();
    let content = std::fs::read_to_string(&forced).unwrap();
    assert!(content.trim_start().starts_with('{'));
}

#[test]
fn test_config_metadata_is_emitted() {
    let config = OpenApiConfig::from_toml_str(
        r#"
        [info]
        title = "Accounts"
        version = "2.0.0"

        [info.license]
        name = "MIT"

        [[servers]]
        url = "https://api.example.com"
        description = "Production"

        [[tags]]
        name = "accounts"
        "#,
    )
    .unwrap();

    let mut generator = OpenApiGenerator::new(config).with_endpoint(create_account_endpoint());
    let spec = generator.generate().unwrap();

    assert_eq!(spec.info.license.as_ref().unwrap().name, "MIT");
    assert_eq!(spec.servers[0].url, "https://api.example.com");
    assert_eq!(spec.tags[0].name, "accounts");
}

#[test]
fn test_no_endpoints_yields_empty_document() {
    let mut generator = OpenApiGenerator::new(OpenApiConfig::default());
    let spec = generator.generate().unwrap();
    assert!(spec.paths.is_empty());
    assert!(spec.components.is_none());
}

#[derive(OpenApiSchema)]
struct NewNote {
    text: String,
}

#[derive(OpenApiSchema)]
struct Quantity(u32);

#[derive(OpenApiSchema)]
struct NoteQuery {
    tag: Option<String>,
}

struct OptionalNoteInput;

impl EndpointInput for OptionalNoteInput {
    type QueryStringParameters = NoteQuery;
    type BodyInput = Option<NewNote>;
    type PathParameters = ();
    type Headers = ();
}

struct ListNotesInput;

impl EndpointInput for ListNotesInput {
    type QueryStringParameters = NoteQuery;
    type BodyInput = ();
    type PathParameters = ();
    type Headers = ();
}

struct QuantityOutput;

impl EndpointOutput for QuantityOutput {
    type BodyOutput = Quantity;
}

fn notes_generator() -> OpenApiGenerator {
    let upsert = EndpointConfig::builder::<OptionalNoteInput, QuantityOutput>()
        .service_name("Notes")
        .operation_id("upsertNote")
        .http_method("PUT")
        .http_path("/notes")
        .deprecated(true)
        .build()
        .unwrap();
    let list = EndpointConfig::builder::<ListNotesInput, QuantityOutput>()
        .service_name("Notes")
        .operation_id("countNotes")
        .http_method("GET")
        .http_path("/notes")
        .build()
        .unwrap();

    OpenApiGenerator::new(OpenApiConfig::new("Notes", "1.0"))
        .with_endpoint(upsert)
        .with_endpoint(list)
}

#[test]
fn test_optional_body_is_not_required() {
    let mut generator = notes_generator();
    let spec = generator.generate().unwrap();

    let op = spec.paths["/notes"].put.as_ref().unwrap();
    let body = op.request_body.as_ref().unwrap();
    assert_eq!(body.required, Some(false));

    let components = spec.components.as_ref().unwrap();
    assert_eq!(
        components.schemas["NotesBodyInput"].referenced_name(),
        Some("NewNote")
    );
}

#[test]
fn test_newtype_body_is_transparent() {
    let mut generator = notes_generator();
    let spec = generator.generate().unwrap();

    let op = spec.paths["/notes"].get.as_ref().unwrap();
    let schema = op.responses["200"].content["application/json"]
        .schema
        .as_ref()
        .unwrap();
    assert_eq!(schema.type_name(), Some("integer"));
    assert_eq!(schema.format.as_deref(), Some("int32"));
    assert!(!spec
        .components
        .as_ref()
        .unwrap()
        .schemas
        .contains_key("Quantity"));
}

#[test]
fn test_deprecated_flag_is_emitted() {
    let mut generator = notes_generator();
    let spec = generator.generate().unwrap();

    let item = &spec.paths["/notes"];
    assert_eq!(item.put.as_ref().unwrap().deprecated, Some(true));
    assert_eq!(item.get.as_ref().unwrap().deprecated, None);
}

#[test]
fn test_shared_domain_reuses_identical_components() {
    let mut generator = notes_generator();
    let spec = generator.generate().unwrap();

    let item = &spec.paths["/notes"];
    for op in [item.put.as_ref().unwrap(), item.get.as_ref().unwrap()] {
        assert!(op.parameters.iter().any(|p| matches!(
            p,
            RefOr::Ref(r) if r.reference == "#/components/parameters/NotesQueryStringParameters"
        )));
    }

    let components = spec.components.as_ref().unwrap();
    assert_eq!(
        components
            .schemas
            .keys()
            .filter(|name| name.starts_with("NotesQueryStringParameters"))
            .count(),
        1
    );
}
