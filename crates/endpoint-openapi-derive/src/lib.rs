/*!
Procedural macros for OpenAPI schema generation.

This crate provides `#[derive(OpenApiSchema)]` for `endpoint-openapi`.

Supported attributes, all under `#[openapi(...)]`:

- `rename = "Name"` on a struct: component name
- `rename = "name"` on a field or unit variant: property / enum value, used verbatim
- `skip` on a field: leave it out of the schema

Anything else, such as `rename` on an enum or on a newtype variant, is a
compile error.
*/

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{quote, ToTokens};
use syn::{
    ext::IdentExt, parse_macro_input, parse_quote, Attribute, Data, DataEnum, DeriveInput, Expr,
    ExprLit, Fields, FieldsNamed, Generics, Lit, LitStr, Meta,
};

/// Derive macro to implement `OpenApiSchema` for structs and enums
#[proc_macro_derive(OpenApiSchema, attributes(openapi))]
pub fn derive_openapi_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    generate_openapi_schema_impl(&input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

#[derive(Default)]
struct OpenApiAttrs {
    rename: Option<String>,
    skip: bool,
}

fn parse_attrs(attrs: &[Attribute]) -> syn::Result<OpenApiAttrs> {
    let mut parsed = OpenApiAttrs::default();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("openapi")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                parsed.rename = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("skip") {
                parsed.skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported openapi attribute, expected `rename` or `skip`"))
            }
        })?;
    }
    Ok(parsed)
}

/// Reject `#[openapi(...)]` settings on an item where they would be ignored
fn reject_attrs(attrs: &OpenApiAttrs, tokens: impl ToTokens, item: &str) -> syn::Result<()> {
    if attrs.rename.is_some() {
        return Err(syn::Error::new_spanned(
            &tokens,
            format!("`rename` has no effect on {}", item),
        ));
    }
    if attrs.skip {
        return Err(syn::Error::new_spanned(
            &tokens,
            format!("`skip` has no effect on {}", item),
        ));
    }
    Ok(())
}

/// Doc comment lines joined by spaces, if any
fn doc_comment(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) => Some(s.value().trim().to_string()),
                _ => None,
            },
            _ => None,
        })
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join(" "))
    }
}

fn description_arg(description: Option<String>) -> TokenStream2 {
    match description {
        Some(text) => quote! { ::core::option::Option::Some(#text) },
        None => quote! { ::core::option::Option::None },
    }
}

fn description_field(description: Option<String>) -> TokenStream2 {
    match description {
        Some(text) => quote! { ::core::option::Option::Some(::std::string::String::from(#text)) },
        None => quote! { ::core::option::Option::None },
    }
}

/// Every type parameter must itself describe a schema
fn add_trait_bounds(mut generics: Generics) -> Generics {
    for param in generics.type_params_mut() {
        param
            .bounds
            .push(parse_quote!(::endpoint_openapi::OpenApiSchema));
    }
    generics
}

/// Generate implementation for OpenApiSchema trait
fn generate_openapi_schema_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let container = parse_attrs(&input.attrs)?;
    if container.skip {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "`skip` is only supported on fields",
        ));
    }
    let description = doc_comment(&input.attrs);

    let body = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => {
                let component = container
                    .rename
                    .unwrap_or_else(|| input.ident.unraw().to_string());
                named_struct_impl(&component, description, fields)?
            }
            Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {
                if container.rename.is_some() {
                    return Err(syn::Error::new_spanned(
                        &input.ident,
                        "`rename` has no effect on a newtype, which uses its inner schema",
                    ));
                }
                reject_attrs(
                    &parse_attrs(&fields.unnamed[0].attrs)?,
                    &fields.unnamed[0],
                    "the field of a newtype",
                )?;
                let inner = &fields.unnamed[0].ty;
                quote! {
                    fn schema_definition(
                        generator: &mut ::endpoint_openapi::schema::SchemaGenerator,
                    ) -> ::endpoint_openapi::OpenApiResult<::endpoint_openapi::specification::Schema> {
                        generator.schema_for::<#inner>()
                    }

                    fn is_optional() -> bool {
                        <#inner as ::endpoint_openapi::OpenApiSchema>::is_optional()
                    }
                }
            }
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    input,
                    "OpenApiSchema cannot be derived for tuple structs with more than one field",
                ));
            }
            Fields::Unit => {
                return Err(syn::Error::new_spanned(
                    input,
                    "OpenApiSchema cannot be derived for unit structs",
                ));
            }
        },
        Data::Enum(data) => {
            if container.rename.is_some() {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "`rename` has no effect on an enum, whose schema is always inline",
                ));
            }
            enum_impl(input, description, data)?
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "OpenApiSchema cannot be derived for union types",
            ));
        }
    };

    let name = &input.ident;
    let generics = add_trait_bounds(input.generics.clone());
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::endpoint_openapi::OpenApiSchema for #name #ty_generics #where_clause {
            #body
        }
    })
}

/// Named-field structs become components built field by field
fn named_struct_impl(
    component: &str,
    description: Option<String>,
    fields: &FieldsNamed,
) -> syn::Result<TokenStream2> {
    let mut calls = Vec::new();

    for field in &fields.named {
        let attrs = parse_attrs(&field.attrs)?;
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let field_name = ident.unraw().to_string();
        if attrs.skip || field_name.starts_with('_') {
            continue;
        }

        let ty = &field.ty;
        let field_description = description_arg(doc_comment(&field.attrs));
        calls.push(match attrs.rename {
            Some(property) => quote! {
                .renamed_field::<#ty>(generator, #property, #field_description)?
            },
            None => quote! {
                .field::<#ty>(generator, #field_name, #field_description)?
            },
        });
    }

    let description = description_arg(description);

    Ok(quote! {
        fn schema_name() -> ::core::option::Option<::std::string::String> {
            ::core::option::Option::Some(::std::string::String::from(#component))
        }

        #[allow(unused_variables)]
        fn schema_definition(
            generator: &mut ::endpoint_openapi::schema::SchemaGenerator,
        ) -> ::endpoint_openapi::OpenApiResult<::endpoint_openapi::specification::Schema> {
            ::core::result::Result::Ok(
                ::endpoint_openapi::schema::ObjectBuilder::new()
                    .with_description(#description)
                    #(#calls)*
                    .build()
            )
        }
    })
}

/// Unit-variant enums become string enums; newtype-variant enums become `oneOf`
fn enum_impl(
    input: &DeriveInput,
    description: Option<String>,
    data: &DataEnum,
) -> syn::Result<TokenStream2> {
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            input,
            "OpenApiSchema cannot be derived for enums without variants",
        ));
    }

    let description = description_field(description);

    if data.variants.iter().all(|v| matches!(v.fields, Fields::Unit)) {
        let mut values = Vec::new();
        for variant in &data.variants {
            let attrs = parse_attrs(&variant.attrs)?;
            if attrs.skip {
                return Err(syn::Error::new_spanned(
                    variant,
                    "`skip` has no effect on an enum variant",
                ));
            }
            values.push(
                attrs
                    .rename
                    .unwrap_or_else(|| variant.ident.unraw().to_string()),
            );
        }

        return Ok(quote! {
            fn schema_definition(
                _generator: &mut ::endpoint_openapi::schema::SchemaGenerator,
            ) -> ::endpoint_openapi::OpenApiResult<::endpoint_openapi::specification::Schema> {
                ::core::result::Result::Ok(::endpoint_openapi::specification::Schema {
                    description: #description,
                    ..::endpoint_openapi::specification::Schema::string_enum(&[#(#values),*])
                })
            }
        });
    }

    let mut variants = Vec::new();
    for variant in &data.variants {
        reject_attrs(&parse_attrs(&variant.attrs)?, variant, "a newtype variant")?;
        match &variant.fields {
            Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {
                reject_attrs(
                    &parse_attrs(&fields.unnamed[0].attrs)?,
                    &fields.unnamed[0],
                    "the field of a newtype variant",
                )?;
                let ty = &fields.unnamed[0].ty;
                variants.push(quote! { generator.schema_for::<#ty>()? });
            }
            _ => {
                return Err(syn::Error::new_spanned(
                    variant,
                    "OpenApiSchema enums must have only unit variants or only single-field tuple variants",
                ));
            }
        }
    }

    Ok(quote! {
        fn schema_definition(
            generator: &mut ::endpoint_openapi::schema::SchemaGenerator,
        ) -> ::endpoint_openapi::OpenApiResult<::endpoint_openapi::specification::Schema> {
            ::core::result::Result::Ok(::endpoint_openapi::specification::Schema {
                description: #description,
                ..::endpoint_openapi::specification::Schema::one_of(::std::vec![#(#variants),*])
            })
        }
    })
}
