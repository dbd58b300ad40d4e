//! File descriptor for `pikcel/v1/api.proto`, served over reflection.

use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet,
    MethodDescriptorProto, ServiceDescriptorProto,
};

pub const PACKAGE: &str = "pikcel.v1";
pub const SERVICE: &str = "pikcel.v1.Api";

fn field(name: &str, number: i32, kind: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        json_name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(kind as i32),
        ..Default::default()
    }
}

fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: fields,
        ..Default::default()
    }
}

pub fn file_descriptor_set() -> FileDescriptorSet {
    let api = ServiceDescriptorProto {
        name: Some("Api".to_string()),
        method: vec![MethodDescriptorProto {
            name: Some("CanvasGet".to_string()),
            input_type: Some(format!(".{PACKAGE}.CanvasGetRequest")),
            output_type: Some(format!(".{PACKAGE}.CanvasGetResponse")),
            ..Default::default()
        }],
        ..Default::default()
    };

    FileDescriptorSet {
        file: vec![FileDescriptorProto {
            name: Some("pikcel/v1/api.proto".to_string()),
            package: Some(PACKAGE.to_string()),
            message_type: vec![
                message("CanvasGetRequest", Vec::new()),
                message(
                    "CanvasGetResponse",
                    vec![
                        field("id", 1, Type::String),
                        field("width", 2, Type::Int32),
                        field("height", 3, Type::Int32),
                    ],
                ),
            ],
            service: vec![api],
            syntax: Some("proto3".to_string()),
            ..Default::default()
        }],
    }
}
