/*!
# endpoint-openapi

OpenAPI 3.1 document generation from typed endpoint declarations.

Each endpoint names its request sections (query string, path parameters,
headers, body) and its response body as Rust types. The generator turns
those types into reusable component schemas and parameters, prefixed with
the endpoint's domain name, and writes a deterministic YAML or JSON
document.

## Features

- `#[derive(OpenApiSchema)]` for structs and enums
- Component and parameter naming per endpoint domain
- Structural validation of the generated document
- TOML configuration for document metadata and output

## Usage

```rust,no_run
use endpoint_openapi::{
    EndpointConfig, EndpointInput, EndpointOutput, OpenApiConfig, OpenApiGenerator, OpenApiSchema,
};

#[derive(OpenApiSchema)]
struct UserPath {
    user_id: String,
}

#[derive(OpenApiSchema)]
struct User {
    name: String,
}

struct GetUserInput;

impl EndpointInput for GetUserInput {
    type QueryStringParameters = ();
    type BodyInput = ();
    type PathParameters = UserPath;
    type Headers = ();
}

struct GetUserOutput;

impl EndpointOutput for GetUserOutput {
    type BodyOutput = User;
}

let endpoint = EndpointConfig::builder::<GetUserInput, GetUserOutput>()
    .service_name("Users")
    .operation_id("getUser")
    .http_method("GET")
    .http_path("/users/{userId}")
    .build()
    .unwrap();

let mut generator = OpenApiGenerator::new(OpenApiConfig::new("Users", "1.0.0"))
    .with_endpoint(endpoint);
generator.write().unwrap();
```

Only named-field structs, newtypes, unit-variant enums and newtype-variant
enums can derive a schema:

```rust,compile_fail
use endpoint_openapi::OpenApiSchema;

#[derive(OpenApiSchema)]
struct Pair(String, i32);
```

```rust,compile_fail
use endpoint_openapi::OpenApiSchema;

#[derive(OpenApiSchema)]
enum Shape {
    Point,
    Circle { radius: f64 },
}
```

`#[openapi(...)]` settings that would be ignored are rejected too. Enums
are always inline, so they cannot be renamed:

```rust,compile_fail
use endpoint_openapi::OpenApiSchema;

#[derive(OpenApiSchema)]
#[openapi(rename = "Colour")]
enum Color {
    Red,
    Green,
}
```

```rust,compile_fail
use endpoint_openapi::OpenApiSchema;

#[derive(OpenApiSchema)]
struct Email {
    address: String,
}

#[derive(OpenApiSchema)]
enum Contact {
    #[openapi(bogus)]
    Email(Email),
}
```

```rust,compile_fail
use endpoint_openapi::OpenApiSchema;

#[derive(OpenApiSchema)]
struct Email {
    address: String,
}

#[derive(OpenApiSchema)]
enum Contact {
    #[openapi(rename = "mail")]
    Email(Email),
}
```
*/

extern crate self as endpoint_openapi;

// Re-export main types
pub use crate::{
    config::OpenApiConfig,
    endpoint::{EndpointConfig, EndpointInput, EndpointOutput, HttpMethod},
    error::{OpenApiError, OpenApiResult},
    generator::OpenApiGenerator,
    macros::OpenApiSchema,
    schema::{SchemaConfig, SchemaGenerator},
    specification::OpenApiSpec,
    utils::OutputFormat,
};

// Re-export the derive macro from the proc-macro crate
pub use endpoint_openapi_derive::OpenApiSchema;

// Core modules
pub mod config;
pub mod error;
pub mod generator;
pub mod specification;

// Endpoint declarations
pub mod endpoint;

// Schema generation
pub mod macros;
pub mod schema;

// Utilities
pub mod utils;
