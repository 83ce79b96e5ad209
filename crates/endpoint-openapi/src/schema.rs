use crate::{
    error::{OpenApiError, OpenApiResult},
    macros::OpenApiSchema,
    specification::Schema,
    utils::to_camel_case,
};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Schema generator for converting Rust types to OpenAPI schemas
pub struct SchemaGenerator {
    /// Registered component schemas
    schemas: BTreeMap<String, Schema>,
    /// Rust type that owns each component name
    owners: BTreeMap<String, &'static str>,
    /// Configuration options
    config: SchemaConfig,
}

/// Configuration for schema generation
#[derive(Debug, Clone)]
pub struct SchemaConfig {
    /// Convert snake_case field names to camelCase property names
    pub camel_case_properties: bool,
    /// Let inline `Option<T>` schemas accept `null`
    pub nullable_optional: bool,
    /// Express nullability as `type: [T, "null"]` (OpenAPI 3.1) instead of `nullable: true`
    pub type_arrays: bool,
}

/// Type-erased handle on an [`OpenApiSchema`] implementor.
///
/// Lets endpoint declarations carry their section types as values.
#[derive(Clone, Copy)]
pub struct TypeDeclaration {
    type_name: &'static str,
    schema_name: fn() -> Option<String>,
    definition: fn(&mut SchemaGenerator) -> OpenApiResult<Schema>,
    optional: fn() -> bool,
    absent: fn() -> bool,
}

impl TypeDeclaration {
    pub fn of<T: OpenApiSchema>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            schema_name: T::schema_name,
            definition: T::schema_definition,
            optional: T::is_optional,
            absent: T::is_absent,
        }
    }

    /// Fully qualified Rust type name
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn schema_name(&self) -> Option<String> {
        (self.schema_name)()
    }

    pub fn is_optional(&self) -> bool {
        (self.optional)()
    }

    pub fn is_absent(&self) -> bool {
        (self.absent)()
    }
}

impl fmt::Debug for TypeDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDeclaration")
            .field("type_name", &self.type_name)
            .field("schema_name", &self.schema_name())
            .finish()
    }
}

impl SchemaGenerator {
    /// Create a new schema generator
    pub fn new(config: SchemaConfig) -> Self {
        Self {
            schemas: BTreeMap::new(),
            owners: BTreeMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    /// Schema to embed where `T` is used: a `$ref` for named types, inline otherwise
    pub fn schema_for<T: OpenApiSchema>(&mut self) -> OpenApiResult<Schema> {
        self.schema_for_declaration(&TypeDeclaration::of::<T>())
    }

    pub fn schema_for_declaration(&mut self, declaration: &TypeDeclaration) -> OpenApiResult<Schema> {
        match declaration.schema_name() {
            Some(name) => {
                self.register(declaration, &name)?;
                Ok(Schema::reference(&name))
            }
            None => (declaration.definition)(self),
        }
    }

    /// Full definition of `T` without registering `T` itself as a component
    pub fn definition_of<T: OpenApiSchema>(&mut self) -> OpenApiResult<Schema> {
        self.definition_for_declaration(&TypeDeclaration::of::<T>())
    }

    pub fn definition_for_declaration(&mut self, declaration: &TypeDeclaration) -> OpenApiResult<Schema> {
        (declaration.definition)(self)
    }

    /// Register a named type once. A placeholder goes in first so recursive
    /// types terminate on the second visit.
    fn register(&mut self, declaration: &TypeDeclaration, name: &str) -> OpenApiResult<()> {
        if let Some(owner) = self.owners.get(name) {
            if *owner == declaration.type_name() {
                return Ok(());
            }
            return Err(OpenApiError::schema_error(format!(
                "schema name '{}' is claimed by both {} and {}",
                name,
                owner,
                declaration.type_name()
            )));
        }

        self.owners.insert(name.to_string(), declaration.type_name());
        self.schemas.insert(name.to_string(), Schema::default());

        match (declaration.definition)(self) {
            Ok(definition) => {
                debug!(schema = name, rust_type = declaration.type_name(), "registered component schema");
                self.schemas.insert(name.to_string(), definition);
                Ok(())
            }
            Err(err) => {
                self.owners.remove(name);
                self.schemas.remove(name);
                Err(err)
            }
        }
    }

    /// Property name for a Rust field name under the current configuration
    pub fn property_name(&self, field: &str) -> String {
        if self.config.camel_case_properties {
            to_camel_case(field)
        } else {
            field.to_string()
        }
    }

    /// Schema registered under `name`, if any
    pub fn get_schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Follow schema references until an inline schema is reached
    pub fn resolve<'a>(&'a self, schema: &'a Schema) -> &'a Schema {
        let mut current = schema;
        for _ in 0..=self.schemas.len() {
            match current.referenced_name().and_then(|name| self.schemas.get(name)) {
                Some(target) => current = target,
                None => break,
            }
        }
        current
    }

    /// Get all generated schemas
    pub fn get_schemas(&self) -> &BTreeMap<String, Schema> {
        &self.schemas
    }

    pub fn into_schemas(self) -> BTreeMap<String, Schema> {
        self.schemas
    }

    /// Clear schema cache
    pub fn clear_cache(&mut self) {
        self.schemas.clear();
        self.owners.clear();
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            camel_case_properties: true,
            nullable_optional: false,
            type_arrays: true,
        }
    }
}

impl SchemaConfig {
    /// Create new configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_camel_case_properties(mut self, enabled: bool) -> Self {
        self.camel_case_properties = enabled;
        self
    }

    /// Set nullable option handling
    pub fn with_nullable_optional(mut self, nullable: bool) -> Self {
        self.nullable_optional = nullable;
        self
    }

    pub fn with_type_arrays(mut self, enabled: bool) -> Self {
        self.type_arrays = enabled;
        self
    }
}

/// Builds `type: object` schemas field by field. Derived impls drive it.
pub struct ObjectBuilder {
    schema: Schema,
}

impl ObjectBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema::typed("object"),
        }
    }

    pub fn with_description(mut self, description: Option<&str>) -> Self {
        self.schema.description = description.map(str::to_string);
        self
    }

    /// Add a field, naming the property per the generator's case convention
    pub fn field<T: OpenApiSchema>(
        self,
        generator: &mut SchemaGenerator,
        field_name: &str,
        description: Option<&str>,
    ) -> OpenApiResult<Self> {
        let property = generator.property_name(field_name);
        self.property::<T>(generator, property, description)
    }

    /// Add a field under an explicit property name
    pub fn renamed_field<T: OpenApiSchema>(
        self,
        generator: &mut SchemaGenerator,
        property: &str,
        description: Option<&str>,
    ) -> OpenApiResult<Self> {
        self.property::<T>(generator, property.to_string(), description)
    }

    fn property<T: OpenApiSchema>(
        mut self,
        generator: &mut SchemaGenerator,
        property: String,
        description: Option<&str>,
    ) -> OpenApiResult<Self> {
        if T::is_absent() {
            return Err(OpenApiError::schema_error(format!(
                "property '{}' has unit type, which has no schema",
                property
            )));
        }

        let mut schema = generator.schema_for::<T>()?;
        if schema.reference.is_none() {
            if let Some(description) = description {
                schema.description = Some(description.to_string());
            }
        }

        if self.schema.properties.contains_key(&property) {
            return Err(OpenApiError::schema_error(format!(
                "property '{}' is declared more than once",
                property
            )));
        }

        if !T::is_optional() {
            self.schema.required.push(property.clone());
        }
        self.schema.properties.insert(property, schema);
        Ok(self)
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl Default for ObjectBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    /// `type: string` restricted to `values`
    pub fn string_enum(values: &[&str]) -> Self {
        Self {
            enum_values: values
                .iter()
                .map(|v| serde_json::Value::String(v.to_string()))
                .collect(),
            ..Self::typed("string")
        }
    }

    /// `oneOf` over `variants`
    pub fn one_of(variants: Vec<Schema>) -> Self {
        Self {
            one_of: variants,
            ..Default::default()
        }
    }
}
