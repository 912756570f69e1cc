/*
 * Copyright (C) 2024 The OpenCP Authors
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 * http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! `openapi_v2` messages (gnostic `openapiv2.proto`) used for the protobuf
//! encoding of the document.
//!
//! Only the parts of the schema the served document can carry are declared.
//! Field tags match the upstream definitions so clients decoding
//! `openapi_v2.Document` read the same fields.

use serde_json::{Map, Value};

#[derive(Clone, PartialEq, prost::Message)]
pub struct Document {
    #[prost(string, tag = "1")]
    pub swagger: String,
    #[prost(message, optional, tag = "2")]
    pub info: Option<Info>,
    #[prost(string, tag = "3")]
    pub host: String,
    #[prost(string, tag = "4")]
    pub base_path: String,
    #[prost(string, repeated, tag = "5")]
    pub schemes: Vec<String>,
    #[prost(string, repeated, tag = "6")]
    pub consumes: Vec<String>,
    #[prost(string, repeated, tag = "7")]
    pub produces: Vec<String>,
    #[prost(message, optional, tag = "8")]
    pub paths: Option<Paths>,
    #[prost(message, optional, tag = "9")]
    pub definitions: Option<Definitions>,
    #[prost(message, repeated, tag = "14")]
    pub tags: Vec<Tag>,
    #[prost(message, repeated, tag = "16")]
    pub vendor_extension: Vec<NamedAny>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Info {
    #[prost(string, tag = "1")]
    pub title: String,
    #[prost(string, tag = "2")]
    pub version: String,
    #[prost(string, tag = "3")]
    pub description: String,
    #[prost(string, tag = "4")]
    pub terms_of_service: String,
    #[prost(message, optional, tag = "5")]
    pub contact: Option<Contact>,
    #[prost(message, optional, tag = "6")]
    pub license: Option<License>,
    #[prost(message, repeated, tag = "7")]
    pub vendor_extension: Vec<NamedAny>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Contact {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub url: String,
    #[prost(string, tag = "3")]
    pub email: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct License {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub url: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Tag {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub description: String,
    #[prost(message, repeated, tag = "4")]
    pub vendor_extension: Vec<NamedAny>,
}

/// Arbitrary value, carried as its YAML rendering.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Any {
    #[prost(message, optional, tag = "1")]
    pub value: Option<prost_types::Any>,
    #[prost(string, tag = "2")]
    pub yaml: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NamedAny {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, optional, tag = "2")]
    pub value: Option<Any>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Paths {
    #[prost(message, repeated, tag = "1")]
    pub vendor_extension: Vec<NamedAny>,
    #[prost(message, repeated, tag = "2")]
    pub path: Vec<NamedPathItem>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NamedPathItem {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, optional, tag = "2")]
    pub value: Option<PathItem>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct PathItem {
    #[prost(string, tag = "1")]
    pub r#ref: String,
    #[prost(message, optional, tag = "2")]
    pub get: Option<Operation>,
    #[prost(message, optional, tag = "3")]
    pub put: Option<Operation>,
    #[prost(message, optional, tag = "4")]
    pub post: Option<Operation>,
    #[prost(message, optional, tag = "5")]
    pub delete: Option<Operation>,
    #[prost(message, optional, tag = "6")]
    pub options: Option<Operation>,
    #[prost(message, optional, tag = "7")]
    pub head: Option<Operation>,
    #[prost(message, optional, tag = "8")]
    pub patch: Option<Operation>,
    #[prost(message, repeated, tag = "9")]
    pub parameters: Vec<ParametersItem>,
    #[prost(message, repeated, tag = "10")]
    pub vendor_extension: Vec<NamedAny>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Operation {
    #[prost(string, repeated, tag = "1")]
    pub tags: Vec<String>,
    #[prost(string, tag = "2")]
    pub summary: String,
    #[prost(string, tag = "3")]
    pub description: String,
    #[prost(string, tag = "5")]
    pub operation_id: String,
    #[prost(string, repeated, tag = "6")]
    pub produces: Vec<String>,
    #[prost(string, repeated, tag = "7")]
    pub consumes: Vec<String>,
    #[prost(message, repeated, tag = "8")]
    pub parameters: Vec<ParametersItem>,
    #[prost(message, optional, tag = "9")]
    pub responses: Option<Responses>,
    #[prost(string, repeated, tag = "10")]
    pub schemes: Vec<String>,
    #[prost(bool, tag = "11")]
    pub deprecated: bool,
    #[prost(message, repeated, tag = "13")]
    pub vendor_extension: Vec<NamedAny>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct JsonReference {
    #[prost(string, tag = "1")]
    pub r#ref: String,
    #[prost(string, tag = "2")]
    pub description: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ParametersItem {
    #[prost(oneof = "parameters_item::Oneof", tags = "1, 2")]
    pub oneof: Option<parameters_item::Oneof>,
}

pub mod parameters_item {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Oneof {
        #[prost(message, tag = "1")]
        Parameter(super::Parameter),
        #[prost(message, tag = "2")]
        JsonReference(super::JsonReference),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Parameter {
    #[prost(oneof = "parameter::Oneof", tags = "1, 2")]
    pub oneof: Option<parameter::Oneof>,
}

pub mod parameter {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Oneof {
        #[prost(message, tag = "1")]
        BodyParameter(super::BodyParameter),
        #[prost(message, tag = "2")]
        NonBodyParameter(super::NonBodyParameter),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BodyParameter {
    #[prost(string, tag = "1")]
    pub description: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub r#in: String,
    #[prost(bool, tag = "4")]
    pub required: bool,
    #[prost(message, optional, tag = "5")]
    pub schema: Option<Schema>,
    #[prost(message, repeated, tag = "6")]
    pub vendor_extension: Vec<NamedAny>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NonBodyParameter {
    #[prost(oneof = "non_body_parameter::Oneof", tags = "3, 4")]
    pub oneof: Option<non_body_parameter::Oneof>,
}

pub mod non_body_parameter {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Oneof {
        #[prost(message, tag = "3")]
        QueryParameterSubSchema(super::QueryParameterSubSchema),
        #[prost(message, tag = "4")]
        PathParameterSubSchema(super::PathParameterSubSchema),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct QueryParameterSubSchema {
    #[prost(bool, tag = "1")]
    pub required: bool,
    #[prost(string, tag = "2")]
    pub r#in: String,
    #[prost(string, tag = "3")]
    pub description: String,
    #[prost(string, tag = "4")]
    pub name: String,
    #[prost(bool, tag = "5")]
    pub allow_empty_value: bool,
    #[prost(string, tag = "6")]
    pub r#type: String,
    #[prost(string, tag = "7")]
    pub format: String,
    #[prost(message, repeated, tag = "21")]
    pub r#enum: Vec<Any>,
    #[prost(message, repeated, tag = "23")]
    pub vendor_extension: Vec<NamedAny>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct PathParameterSubSchema {
    #[prost(bool, tag = "1")]
    pub required: bool,
    #[prost(string, tag = "2")]
    pub r#in: String,
    #[prost(string, tag = "3")]
    pub description: String,
    #[prost(string, tag = "4")]
    pub name: String,
    #[prost(string, tag = "5")]
    pub r#type: String,
    #[prost(string, tag = "6")]
    pub format: String,
    #[prost(message, repeated, tag = "20")]
    pub r#enum: Vec<Any>,
    #[prost(message, repeated, tag = "22")]
    pub vendor_extension: Vec<NamedAny>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Responses {
    #[prost(message, repeated, tag = "1")]
    pub response_code: Vec<NamedResponseValue>,
    #[prost(message, repeated, tag = "2")]
    pub vendor_extension: Vec<NamedAny>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NamedResponseValue {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, optional, tag = "2")]
    pub value: Option<ResponseValue>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ResponseValue {
    #[prost(oneof = "response_value::Oneof", tags = "1, 2")]
    pub oneof: Option<response_value::Oneof>,
}

pub mod response_value {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Oneof {
        #[prost(message, tag = "1")]
        Response(super::Response),
        #[prost(message, tag = "2")]
        JsonReference(super::JsonReference),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Response {
    #[prost(string, tag = "1")]
    pub description: String,
    #[prost(message, optional, tag = "2")]
    pub schema: Option<SchemaItem>,
    #[prost(message, repeated, tag = "5")]
    pub vendor_extension: Vec<NamedAny>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SchemaItem {
    #[prost(oneof = "schema_item::Oneof", tags = "1")]
    pub oneof: Option<schema_item::Oneof>,
}

pub mod schema_item {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Oneof {
        #[prost(message, tag = "1")]
        Schema(super::Schema),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Definitions {
    #[prost(message, repeated, tag = "1")]
    pub additional_properties: Vec<NamedSchema>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NamedSchema {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, optional, tag = "2")]
    pub value: Option<Schema>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Schema {
    #[prost(string, tag = "1")]
    pub r#ref: String,
    #[prost(string, tag = "2")]
    pub format: String,
    #[prost(string, tag = "3")]
    pub title: String,
    #[prost(string, tag = "4")]
    pub description: String,
    #[prost(message, optional, tag = "5")]
    pub default: Option<Any>,
    #[prost(string, repeated, tag = "19")]
    pub required: Vec<String>,
    #[prost(message, repeated, tag = "20")]
    pub r#enum: Vec<Any>,
    #[prost(message, optional, boxed, tag = "21")]
    pub additional_properties: Option<Box<AdditionalPropertiesItem>>,
    #[prost(message, optional, tag = "22")]
    pub r#type: Option<TypeItem>,
    #[prost(message, optional, tag = "23")]
    pub items: Option<ItemsItem>,
    #[prost(message, repeated, tag = "24")]
    pub all_of: Vec<Schema>,
    #[prost(message, optional, tag = "25")]
    pub properties: Option<Properties>,
    #[prost(bool, tag = "27")]
    pub read_only: bool,
    #[prost(message, optional, tag = "30")]
    pub example: Option<Any>,
    #[prost(message, repeated, tag = "31")]
    pub vendor_extension: Vec<NamedAny>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct TypeItem {
    #[prost(string, repeated, tag = "1")]
    pub value: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ItemsItem {
    #[prost(message, repeated, tag = "1")]
    pub schema: Vec<Schema>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Properties {
    #[prost(message, repeated, tag = "1")]
    pub additional_properties: Vec<NamedSchema>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AdditionalPropertiesItem {
    #[prost(oneof = "additional_properties_item::Oneof", tags = "1, 2")]
    pub oneof: Option<additional_properties_item::Oneof>,
}

pub mod additional_properties_item {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Oneof {
        #[prost(message, tag = "1")]
        Schema(super::Schema),
        #[prost(bool, tag = "2")]
        Boolean(bool),
    }
}

/// Reads a Swagger 2.0 JSON document into its `openapi_v2` form.
pub fn document_from_json(value: &Value) -> Result<Document, String> {
    let object = as_object(value, "document")?;
    Ok(Document {
        swagger: text(object, "swagger"),
        info: object.get("info").map(info_from_json).transpose()?,
        host: text(object, "host"),
        base_path: text(object, "basePath"),
        schemes: strings(object, "schemes"),
        consumes: strings(object, "consumes"),
        produces: strings(object, "produces"),
        paths: object.get("paths").map(paths_from_json).transpose()?,
        definitions: object
            .get("definitions")
            .map(|definitions| {
                named_schemas(definitions, "definitions")
                    .map(|additional_properties| Definitions { additional_properties })
            })
            .transpose()?,
        tags: match object.get("tags") {
            Some(tags) => as_array(tags, "tags")?
                .iter()
                .map(tag_from_json)
                .collect::<Result<_, _>>()?,
            None => Vec::new(),
        },
        vendor_extension: extensions(object),
    })
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>, String> {
    value
        .as_object()
        .ok_or_else(|| format!("{what} must be an object"))
}

fn as_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>, String> {
    value
        .as_array()
        .ok_or_else(|| format!("{what} must be an array"))
}

fn text(object: &Map<String, Value>, key: &str) -> String {
    object
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn flag(object: &Map<String, Value>, key: &str) -> bool {
    object.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// A string or a list of strings.
fn strings(object: &Map<String, Value>, key: &str) -> Vec<String> {
    match object.get(key) {
        Some(Value::String(single)) => vec![single.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn any(value: &Value) -> Any {
    Any {
        value: None,
        yaml: serde_yaml::to_string(value).unwrap_or_default(),
    }
}

fn anys(object: &Map<String, Value>, key: &str) -> Vec<Any> {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().map(any).collect())
        .unwrap_or_default()
}

/// `x-` prefixed keys.
fn extensions(object: &Map<String, Value>) -> Vec<NamedAny> {
    object
        .iter()
        .filter(|(name, _)| name.starts_with("x-"))
        .map(|(name, value)| NamedAny {
            name: name.clone(),
            value: Some(any(value)),
        })
        .collect()
}

fn info_from_json(value: &Value) -> Result<Info, String> {
    let object = as_object(value, "info")?;
    Ok(Info {
        title: text(object, "title"),
        version: text(object, "version"),
        description: text(object, "description"),
        terms_of_service: text(object, "termsOfService"),
        contact: object
            .get("contact")
            .map(|contact| {
                as_object(contact, "info.contact").map(|contact| Contact {
                    name: text(contact, "name"),
                    url: text(contact, "url"),
                    email: text(contact, "email"),
                })
            })
            .transpose()?,
        license: object
            .get("license")
            .map(|license| {
                as_object(license, "info.license").map(|license| License {
                    name: text(license, "name"),
                    url: text(license, "url"),
                })
            })
            .transpose()?,
        vendor_extension: extensions(object),
    })
}

fn tag_from_json(value: &Value) -> Result<Tag, String> {
    let object = as_object(value, "tag")?;
    Ok(Tag {
        name: text(object, "name"),
        description: text(object, "description"),
        vendor_extension: extensions(object),
    })
}

fn paths_from_json(value: &Value) -> Result<Paths, String> {
    let object = as_object(value, "paths")?;
    let path = object
        .iter()
        .filter(|(name, _)| name.starts_with('/'))
        .map(|(name, item)| {
            Ok(NamedPathItem {
                name: name.clone(),
                value: Some(path_item_from_json(name, item)?),
            })
        })
        .collect::<Result<_, String>>()?;
    Ok(Paths {
        vendor_extension: extensions(object),
        path,
    })
}

fn path_item_from_json(path: &str, value: &Value) -> Result<PathItem, String> {
    let object = as_object(value, path)?;
    let operation = |verb: &str| {
        object
            .get(verb)
            .map(|op| operation_from_json(&format!("{path} {verb}"), op))
            .transpose()
    };
    Ok(PathItem {
        r#ref: text(object, "$ref"),
        get: operation("get")?,
        put: operation("put")?,
        post: operation("post")?,
        delete: operation("delete")?,
        options: operation("options")?,
        head: operation("head")?,
        patch: operation("patch")?,
        parameters: parameters_from_json(object, path)?,
        vendor_extension: extensions(object),
    })
}

fn operation_from_json(what: &str, value: &Value) -> Result<Operation, String> {
    let object = as_object(value, what)?;
    Ok(Operation {
        tags: strings(object, "tags"),
        summary: text(object, "summary"),
        description: text(object, "description"),
        operation_id: text(object, "operationId"),
        produces: strings(object, "produces"),
        consumes: strings(object, "consumes"),
        parameters: parameters_from_json(object, what)?,
        responses: object
            .get("responses")
            .map(|responses| responses_from_json(what, responses))
            .transpose()?,
        schemes: strings(object, "schemes"),
        deprecated: flag(object, "deprecated"),
        vendor_extension: extensions(object),
    })
}

fn parameters_from_json(
    object: &Map<String, Value>,
    what: &str,
) -> Result<Vec<ParametersItem>, String> {
    let Some(parameters) = object.get("parameters") else {
        return Ok(Vec::new());
    };
    as_array(parameters, what)?
        .iter()
        .map(|parameter| parameter_from_json(what, parameter))
        .collect()
}

fn parameter_from_json(what: &str, value: &Value) -> Result<ParametersItem, String> {
    let object = as_object(value, what)?;
    if object.contains_key("$ref") {
        return Ok(ParametersItem {
            oneof: Some(parameters_item::Oneof::JsonReference(json_reference(object))),
        });
    }
    let location = text(object, "in");
    let parameter = match location.as_str() {
        "body" => parameter::Oneof::BodyParameter(BodyParameter {
            description: text(object, "description"),
            name: text(object, "name"),
            r#in: location.clone(),
            required: flag(object, "required"),
            schema: object.get("schema").map(schema_from_json).transpose()?,
            vendor_extension: extensions(object),
        }),
        "query" => non_body(non_body_parameter::Oneof::QueryParameterSubSchema(
            QueryParameterSubSchema {
                required: flag(object, "required"),
                r#in: location.clone(),
                description: text(object, "description"),
                name: text(object, "name"),
                allow_empty_value: flag(object, "allowEmptyValue"),
                r#type: text(object, "type"),
                format: text(object, "format"),
                r#enum: anys(object, "enum"),
                vendor_extension: extensions(object),
            },
        )),
        "path" => non_body(non_body_parameter::Oneof::PathParameterSubSchema(
            PathParameterSubSchema {
                required: flag(object, "required"),
                r#in: location.clone(),
                description: text(object, "description"),
                name: text(object, "name"),
                r#type: text(object, "type"),
                format: text(object, "format"),
                r#enum: anys(object, "enum"),
                vendor_extension: extensions(object),
            },
        )),
        other => return Err(format!("{what}: unsupported parameter location {other:?}")),
    };
    Ok(ParametersItem {
        oneof: Some(parameters_item::Oneof::Parameter(Parameter {
            oneof: Some(parameter),
        })),
    })
}

fn non_body(oneof: non_body_parameter::Oneof) -> parameter::Oneof {
    parameter::Oneof::NonBodyParameter(NonBodyParameter { oneof: Some(oneof) })
}

fn json_reference(object: &Map<String, Value>) -> JsonReference {
    JsonReference {
        r#ref: text(object, "$ref"),
        description: text(object, "description"),
    }
}

fn responses_from_json(what: &str, value: &Value) -> Result<Responses, String> {
    let object = as_object(value, what)?;
    let response_code = object
        .iter()
        .filter(|(code, _)| !code.starts_with("x-"))
        .map(|(code, response)| {
            let response = as_object(response, what)?;
            let oneof = if response.contains_key("$ref") {
                response_value::Oneof::JsonReference(json_reference(response))
            } else {
                response_value::Oneof::Response(Response {
                    description: text(response, "description"),
                    schema: response
                        .get("schema")
                        .map(|schema| {
                            schema_from_json(schema).map(|schema| SchemaItem {
                                oneof: Some(schema_item::Oneof::Schema(schema)),
                            })
                        })
                        .transpose()?,
                    vendor_extension: extensions(response),
                })
            };
            Ok(NamedResponseValue {
                name: code.clone(),
                value: Some(ResponseValue { oneof: Some(oneof) }),
            })
        })
        .collect::<Result<_, String>>()?;
    Ok(Responses {
        response_code,
        vendor_extension: extensions(object),
    })
}

fn named_schemas(value: &Value, what: &str) -> Result<Vec<NamedSchema>, String> {
    as_object(value, what)?
        .iter()
        .map(|(name, schema)| {
            Ok(NamedSchema {
                name: name.clone(),
                value: Some(schema_from_json(schema)?),
            })
        })
        .collect()
}

fn schema_from_json(value: &Value) -> Result<Schema, String> {
    let object = as_object(value, "schema")?;
    let additional_properties = match object.get("additionalProperties") {
        None => None,
        Some(Value::Bool(allowed)) => Some(additional_properties_item::Oneof::Boolean(*allowed)),
        Some(schema) => Some(additional_properties_item::Oneof::Schema(schema_from_json(
            schema,
        )?)),
    };
    let items = match object.get("items") {
        None => None,
        Some(Value::Array(schemas)) => Some(ItemsItem {
            schema: schemas
                .iter()
                .map(schema_from_json)
                .collect::<Result<_, _>>()?,
        }),
        Some(schema) => Some(ItemsItem {
            schema: vec![schema_from_json(schema)?],
        }),
    };
    let types = strings(object, "type");
    Ok(Schema {
        r#ref: text(object, "$ref"),
        format: text(object, "format"),
        title: text(object, "title"),
        description: text(object, "description"),
        default: object.get("default").map(any),
        required: strings(object, "required"),
        r#enum: anys(object, "enum"),
        additional_properties: additional_properties.map(|oneof| {
            Box::new(AdditionalPropertiesItem { oneof: Some(oneof) })
        }),
        r#type: (!types.is_empty()).then_some(TypeItem { value: types }),
        items,
        all_of: match object.get("allOf") {
            Some(schemas) => as_array(schemas, "allOf")?
                .iter()
                .map(schema_from_json)
                .collect::<Result<_, _>>()?,
            None => Vec::new(),
        },
        properties: object
            .get("properties")
            .map(|properties| {
                named_schemas(properties, "properties")
                    .map(|additional_properties| Properties { additional_properties })
            })
            .transpose()?,
        read_only: flag(object, "readOnly"),
        example: object.get("example").map(any),
        vendor_extension: extensions(object),
    })
}
