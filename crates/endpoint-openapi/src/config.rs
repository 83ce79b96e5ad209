use crate::{
    error::OpenApiResult,
    schema::SchemaConfig,
    utils::OutputFormat,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default location of the generated document
pub const DEFAULT_OUTPUT_PATH: &str = "output_openapi.yaml";

/// Configuration for OpenAPI specification generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenApiConfig {
    /// OpenAPI specification version
    pub openapi_version: String,

    /// API information
    pub info: ApiInfo,

    /// Server configurations
    pub servers: Vec<ServerConfig>,

    /// Global tags for grouping operations
    pub tags: Vec<TagConfig>,

    /// External documentation
    pub external_docs: Option<ExternalDocs>,

    /// Whether struct fields are exposed as camelCase properties
    pub camel_case_properties: bool,

    /// Whether `Option<T>` fields accept `null`. Emitted as `nullable: true`
    /// for 3.0 documents and as a `type` list otherwise.
    pub nullable_optional: bool,

    /// Where and how the document is written
    pub output: OutputConfig,
}

/// API information section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiInfo {
    /// API title
    pub title: String,

    /// API description
    #[serde(default)]
    pub description: Option<String>,

    /// API version
    pub version: String,

    /// Terms of service URL
    #[serde(default)]
    pub terms_of_service: Option<String>,

    /// Contact information
    #[serde(default)]
    pub contact: Option<Contact>,

    /// License information
    #[serde(default)]
    pub license: Option<License>,
}

/// Contact information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contact {
    pub name: Option<String>,
    pub url: Option<String>,
    pub email: Option<String>,
}

/// License information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Tag configuration for grouping operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// External documentation reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalDocs {
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Destination file
    pub path: PathBuf,

    /// Explicit format; inferred from the file extension when unset
    pub format: Option<OutputFormat>,

    /// Pretty print JSON output
    pub pretty: bool,
}

impl Default for ApiInfo {
    fn default() -> Self {
        Self {
            title: "API Documentation".to_string(),
            description: None,
            version: "1.0.0".to_string(),
            terms_of_service: None,
            contact: None,
            license: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            format: None,
            pretty: true,
        }
    }
}

impl OutputConfig {
    /// Format to write in
    pub fn resolved_format(&self) -> OutputFormat {
        self.format
            .unwrap_or_else(|| OutputFormat::from_path(&self.path))
    }
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self {
            openapi_version: "3.1.0".to_string(),
            info: ApiInfo::default(),
            servers: Vec::new(),
            tags: Vec::new(),
            external_docs: None,
            camel_case_properties: true,
            nullable_optional: false,
            output: OutputConfig::default(),
        }
    }
}

impl OpenApiConfig {
    /// Create a new configuration with custom API info
    pub fn new(title: &str, version: &str) -> Self {
        let mut config = Self::default();
        config.info.title = title.to_string();
        config.info.version = version.to_string();
        config
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.info.description = Some(description.to_string());
        self
    }

    /// Add a server configuration
    pub fn add_server(mut self, url: &str, description: Option<&str>) -> Self {
        self.servers.push(ServerConfig {
            url: url.to_string(),
            description: description.map(|s| s.to_string()),
        });
        self
    }

    /// Add a tag
    pub fn add_tag(mut self, name: &str, description: Option<&str>) -> Self {
        self.tags.push(TagConfig {
            name: name.to_string(),
            description: description.map(|s| s.to_string()),
        });
        self
    }

    pub fn with_output_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output.path = path.into();
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output.format = Some(format);
        self
    }

    /// Schema generation options derived from this configuration
    pub fn schema_config(&self) -> SchemaConfig {
        SchemaConfig::new()
            .with_camel_case_properties(self.camel_case_properties)
            .with_nullable_optional(self.nullable_optional)
            .with_type_arrays(!self.openapi_version.starts_with("3.0"))
    }

    /// Parse configuration from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> OpenApiResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> OpenApiResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
