/*!
OpenAPI schema generation traits and built-in implementations.

User types implement [`OpenApiSchema`] through `#[derive(OpenApiSchema)]`;
this module covers the standard library and the identifier/date types the
derive cannot see into.
*/

use crate::{
    error::OpenApiResult,
    schema::SchemaGenerator,
    specification::Schema,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Trait for types that can describe themselves as OpenAPI schemas
pub trait OpenApiSchema {
    /// Component name for types rendered as `$ref`; `None` renders inline
    fn schema_name() -> Option<String> {
        None
    }

    /// Full schema of this type. Named dependencies are registered through
    /// `generator` and referenced.
    fn schema_definition(generator: &mut SchemaGenerator) -> OpenApiResult<Schema>;

    /// `true` for `Option<T>`: the property is not required
    fn is_optional() -> bool {
        false
    }

    /// `true` for `()`: the endpoint section does not exist
    fn is_absent() -> bool {
        false
    }
}

macro_rules! fixed_schema {
    ($($ty:ty => $schema:expr),* $(,)?) => {
        $(
            impl OpenApiSchema for $ty {
                fn schema_definition(_generator: &mut SchemaGenerator) -> OpenApiResult<Schema> {
                    Ok($schema)
                }
            }
        )*
    };
}

fn unsigned(format: &str) -> Schema {
    Schema {
        minimum: Some(0u64.into()),
        ..Schema::formatted("integer", format)
    }
}

fixed_schema! {
    String => Schema::typed("string"),
    &'static str => Schema::typed("string"),
    char => Schema::typed("string"),
    bool => Schema::typed("boolean"),
    i8 => Schema::formatted("integer", "int32"),
    i16 => Schema::formatted("integer", "int32"),
    i32 => Schema::formatted("integer", "int32"),
    i64 => Schema::formatted("integer", "int64"),
    isize => Schema::formatted("integer", "int64"),
    u8 => unsigned("int32"),
    u16 => unsigned("int32"),
    u32 => unsigned("int32"),
    u64 => unsigned("int64"),
    usize => unsigned("int64"),
    f32 => Schema::formatted("number", "float"),
    f64 => Schema::formatted("number", "double"),
    uuid::Uuid => Schema::formatted("string", "uuid"),
    chrono::NaiveDate => Schema::formatted("string", "date"),
    chrono::NaiveDateTime => Schema::formatted("string", "date-time"),
    serde_json::Value => Schema::default(),
}

impl<Tz: chrono::TimeZone> OpenApiSchema for chrono::DateTime<Tz> {
    fn schema_definition(_generator: &mut SchemaGenerator) -> OpenApiResult<Schema> {
        Ok(Schema::formatted("string", "date-time"))
    }
}

impl OpenApiSchema for () {
    fn schema_definition(_generator: &mut SchemaGenerator) -> OpenApiResult<Schema> {
        Ok(Schema::typed("null"))
    }

    fn is_absent() -> bool {
        true
    }
}

impl<T: OpenApiSchema> OpenApiSchema for Option<T> {
    fn schema_definition(generator: &mut SchemaGenerator) -> OpenApiResult<Schema> {
        let mut schema = generator.schema_for::<T>()?;
        // siblings of `$ref` are ignored by readers, so only inline schemas change
        if generator.config().nullable_optional && schema.reference.is_none() {
            schema.make_nullable(generator.config().type_arrays);
        }
        Ok(schema)
    }

    fn is_optional() -> bool {
        true
    }
}

impl<T: OpenApiSchema> OpenApiSchema for Box<T> {
    fn schema_definition(generator: &mut SchemaGenerator) -> OpenApiResult<Schema> {
        generator.schema_for::<T>()
    }

    fn is_optional() -> bool {
        T::is_optional()
    }
}

fn array_of<T: OpenApiSchema>(generator: &mut SchemaGenerator) -> OpenApiResult<Schema> {
    Ok(Schema {
        items: Some(Box::new(generator.schema_for::<T>()?)),
        ..Schema::typed("array")
    })
}

fn map_of<V: OpenApiSchema>(generator: &mut SchemaGenerator) -> OpenApiResult<Schema> {
    Ok(Schema {
        additional_properties: Some(Box::new(generator.schema_for::<V>()?)),
        ..Schema::typed("object")
    })
}

impl<T: OpenApiSchema> OpenApiSchema for Vec<T> {
    fn schema_definition(generator: &mut SchemaGenerator) -> OpenApiResult<Schema> {
        array_of::<T>(generator)
    }
}

impl<T: OpenApiSchema, const N: usize> OpenApiSchema for [T; N] {
    fn schema_definition(generator: &mut SchemaGenerator) -> OpenApiResult<Schema> {
        Ok(Schema {
            min_items: Some(N),
            max_items: Some(N),
            ..array_of::<T>(generator)?
        })
    }
}

impl<T: OpenApiSchema> OpenApiSchema for BTreeSet<T> {
    fn schema_definition(generator: &mut SchemaGenerator) -> OpenApiResult<Schema> {
        Ok(Schema {
            unique_items: Some(true),
            ..array_of::<T>(generator)?
        })
    }
}

impl<T: OpenApiSchema, S> OpenApiSchema for HashSet<T, S> {
    fn schema_definition(generator: &mut SchemaGenerator) -> OpenApiResult<Schema> {
        Ok(Schema {
            unique_items: Some(true),
            ..array_of::<T>(generator)?
        })
    }
}

impl<V: OpenApiSchema> OpenApiSchema for BTreeMap<String, V> {
    fn schema_definition(generator: &mut SchemaGenerator) -> OpenApiResult<Schema> {
        map_of::<V>(generator)
    }
}

impl<V: OpenApiSchema, S> OpenApiSchema for HashMap<String, V, S> {
    fn schema_definition(generator: &mut SchemaGenerator) -> OpenApiResult<Schema> {
        map_of::<V>(generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaConfig;

    fn generate<T: OpenApiSchema>(config: SchemaConfig) -> Schema {
        SchemaGenerator::new(config).schema_for::<T>().unwrap()
    }

    #[test]
    fn test_primitive_schemas() {
        let string_schema = generate::<String>(SchemaConfig::default());
        assert_eq!(string_schema.type_name(), Some("string"));

        let int_schema = generate::<i32>(SchemaConfig::default());
        assert_eq!(int_schema.type_name(), Some("integer"));
        assert_eq!(int_schema.format, Some("int32".to_string()));

        let unsigned_schema = generate::<u64>(SchemaConfig::default());
        assert_eq!(unsigned_schema.format, Some("int64".to_string()));
        assert_eq!(unsigned_schema.minimum, Some(serde_json::Number::from(0u64)));
        assert_eq!(
            serde_yaml::to_string(&unsigned_schema).unwrap(),
            "type: integer\nformat: int64\nminimum: 0\n"
        );

        let bool_schema = generate::<bool>(SchemaConfig::default());
        assert_eq!(bool_schema.type_name(), Some("boolean"));

        let uuid_schema = generate::<uuid::Uuid>(SchemaConfig::default());
        assert_eq!(uuid_schema.format, Some("uuid".to_string()));

        let time_schema = generate::<chrono::DateTime<chrono::Utc>>(SchemaConfig::default());
        assert_eq!(time_schema.format, Some("date-time".to_string()));
    }

    #[test]
    fn test_optional_schema() {
        assert!(<Option<String>>::is_optional());
        assert!(!String::is_optional());

        let plain = generate::<Option<String>>(SchemaConfig::default());
        assert_eq!(plain.type_name(), Some("string"));
        assert_eq!(plain.nullable, None);
        assert!(!plain.schema_type.as_ref().unwrap().contains("null"));

        let nullable =
            generate::<Option<String>>(SchemaConfig::default().with_nullable_optional(true));
        assert_eq!(nullable.nullable, None);
        assert!(nullable.schema_type.as_ref().unwrap().contains("null"));

        let legacy = generate::<Option<String>>(
            SchemaConfig::default()
                .with_nullable_optional(true)
                .with_type_arrays(false),
        );
        assert_eq!(legacy.nullable, Some(true));
        assert_eq!(legacy.type_name(), Some("string"));
    }

    #[test]
    fn test_collection_schemas() {
        let array_schema = generate::<Vec<String>>(SchemaConfig::default());
        assert_eq!(array_schema.type_name(), Some("array"));
        let items = array_schema.items.unwrap();
        assert_eq!(items.type_name(), Some("string"));

        let fixed = generate::<[f64; 3]>(SchemaConfig::default());
        assert_eq!(fixed.min_items, Some(3));
        assert_eq!(fixed.max_items, Some(3));

        let set = generate::<BTreeSet<i64>>(SchemaConfig::default());
        assert_eq!(set.unique_items, Some(true));

        let map = generate::<HashMap<String, bool>>(SchemaConfig::default());
        assert_eq!(map.type_name(), Some("object"));
        assert_eq!(
            map.additional_properties.unwrap().type_name(),
            Some("boolean")
        );
    }

    #[test]
    fn test_unit_is_absent() {
        assert!(<()>::is_absent());
        assert!(!<Vec<()>>::is_absent());
    }

    #[test]
    fn test_any_value_schema_is_empty() {
        assert_eq!(
            generate::<serde_json::Value>(SchemaConfig::default()),
            Schema::default()
        );
    }
}
