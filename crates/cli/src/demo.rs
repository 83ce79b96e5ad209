//! Sample service: one GET endpoint looking up a user or an organization.

// Declaration-only types, never constructed
#![allow(dead_code)]

use endpoint_openapi::{
    EndpointConfig, EndpointInput, EndpointOutput, OpenApiResult, OpenApiSchema,
};

#[derive(Debug, OpenApiSchema)]
pub struct QueryStringParametersUser {
    pub user: String,
}

#[derive(Debug, OpenApiSchema)]
pub struct QueryStringParametersOrganization {
    pub organization_name: String,
}

/// Lookup by user or by organization
#[derive(Debug, OpenApiSchema)]
pub enum QueryStringParameters {
    User(QueryStringParametersUser),
    Organization(QueryStringParametersOrganization),
}

#[derive(Debug, OpenApiSchema)]
pub struct PathParameters {
    pub user_id: String,
}

#[derive(Debug, OpenApiSchema)]
pub struct OutputBody {
    pub code: i64,
    pub message: String,
    pub response: serde_json::Value,
}

pub struct RequestSchema;

impl EndpointInput for RequestSchema {
    type QueryStringParameters = QueryStringParameters;
    type BodyInput = ();
    type PathParameters = PathParameters;
    type Headers = ();
}

pub struct ResponseSchema;

impl EndpointOutput for ResponseSchema {
    type BodyOutput = OutputBody;
}

pub fn endpoint_config() -> OpenApiResult<EndpointConfig> {
    EndpointConfig::builder::<RequestSchema, ResponseSchema>()
        .service_name("MyService")
        .description("My service description")
        .operation_id("myEndpoint")
        .http_method("GET")
        .http_path("world/{userId}")
        .build()
}
