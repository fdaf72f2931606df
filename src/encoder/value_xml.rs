// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Rendering of `Value` attribute payloads as `uax:` elements from the
//! OPC UA Types schema.

use std::io::Write;

use chrono::SecondsFormat;
use quick_xml::{
    events::{BytesEnd, BytesStart, BytesText, Event},
    Writer,
};

use crate::{
    encoder::EncoderError,
    types::{DiagnosticInfo, Variant},
};

fn uax(name: &str) -> String {
    format!("uax:{name}")
}

fn write_simple<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    text: &str,
) -> Result<(), EncoderError> {
    writer.write_event(Event::Start(BytesStart::new(uax(tag))))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(uax(tag))))?;
    Ok(())
}

fn write_diagnostic_info<W: Write>(
    writer: &mut Writer<W>,
    info: &DiagnosticInfo,
    with_top_element: bool,
) -> Result<(), EncoderError> {
    if with_top_element {
        writer.write_event(Event::Start(BytesStart::new(uax("DiagnosticInfo"))))?;
    }
    if let Some(symbolic_id) = info.symbolic_id {
        write_simple(writer, "SymbolicId", &symbolic_id.to_string())?;
    }
    if let Some(namespace_uri) = info.namespace_uri {
        write_simple(writer, "NamespaceUri", &namespace_uri.to_string())?;
    }
    if let Some(locale) = info.locale {
        write_simple(writer, "Locale", &locale.to_string())?;
    }
    if let Some(localized_text) = info.localized_text {
        write_simple(writer, "LocalizedText", &localized_text.to_string())?;
    }
    if let Some(ref additional_info) = info.additional_info {
        write_simple(writer, "AdditionalInfo", additional_info)?;
    }
    if let Some(inner_status_code) = info.inner_status_code {
        writer.write_event(Event::Start(BytesStart::new(uax("InnerStatusCode"))))?;
        write_simple(writer, "Code", &inner_status_code.bits().to_string())?;
        writer.write_event(Event::End(BytesEnd::new(uax("InnerStatusCode"))))?;
    }
    if let Some(ref inner) = info.inner_diagnostic_info {
        writer.write_event(Event::Start(BytesStart::new(uax("InnerDiagnosticInfo"))))?;
        write_diagnostic_info(writer, inner, false)?;
        writer.write_event(Event::End(BytesEnd::new(uax("InnerDiagnosticInfo"))))?;
    }
    if with_top_element {
        writer.write_event(Event::End(BytesEnd::new(uax("DiagnosticInfo"))))?;
    }
    Ok(())
}

fn write_scalar<W: Write>(writer: &mut Writer<W>, value: &Variant) -> Result<(), EncoderError> {
    match value {
        Variant::Empty => Ok(()),
        Variant::Boolean(v) => write_simple(writer, "Boolean", &v.to_string()),
        Variant::SByte(v) => write_simple(writer, "SByte", &v.to_string()),
        Variant::Byte(v) => write_simple(writer, "Byte", &v.to_string()),
        Variant::Int16(v) => write_simple(writer, "Int16", &v.to_string()),
        Variant::UInt16(v) => write_simple(writer, "UInt16", &v.to_string()),
        Variant::Int32(v) => write_simple(writer, "Int32", &v.to_string()),
        Variant::UInt32(v) => write_simple(writer, "UInt32", &v.to_string()),
        Variant::Int64(v) => write_simple(writer, "Int64", &v.to_string()),
        Variant::UInt64(v) => write_simple(writer, "UInt64", &v.to_string()),
        Variant::Float(v) => write_simple(writer, "Float", &v.to_string()),
        Variant::Double(v) => write_simple(writer, "Double", &v.to_string()),
        Variant::String(v) => write_simple(writer, "String", v),
        Variant::DateTime(v) => write_simple(
            writer,
            "DateTime",
            &v.to_rfc3339_opts(SecondsFormat::Millis, true),
        ),
        Variant::Guid(v) => {
            writer.write_event(Event::Start(BytesStart::new(uax("Guid"))))?;
            write_simple(writer, "String", &v.to_string())?;
            writer.write_event(Event::End(BytesEnd::new(uax("Guid"))))?;
            Ok(())
        }
        Variant::StatusCode(v) => {
            writer.write_event(Event::Start(BytesStart::new(uax("StatusCode"))))?;
            write_simple(writer, "Code", &v.bits().to_string())?;
            writer.write_event(Event::End(BytesEnd::new(uax("StatusCode"))))?;
            Ok(())
        }
        Variant::ByteString(v) => write_simple(writer, "ByteString", &v.as_base64()),
        Variant::NodeId(v) => {
            writer.write_event(Event::Start(BytesStart::new(uax("NodeId"))))?;
            if !v.is_null() {
                write_simple(writer, "Identifier", &v.to_string())?;
            }
            writer.write_event(Event::End(BytesEnd::new(uax("NodeId"))))?;
            Ok(())
        }
        Variant::ExpandedNodeId(v) => {
            writer.write_event(Event::Start(BytesStart::new(uax("ExpandedNodeId"))))?;
            if !v.is_null() {
                write_simple(writer, "Identifier", &v.to_string())?;
            }
            writer.write_event(Event::End(BytesEnd::new(uax("ExpandedNodeId"))))?;
            Ok(())
        }
        Variant::QualifiedName(v) => {
            writer.write_event(Event::Start(BytesStart::new(uax("QualifiedName"))))?;
            if v.namespace_index != 0 {
                write_simple(writer, "NamespaceIndex", &v.namespace_index.to_string())?;
            }
            if !v.name.is_empty() {
                write_simple(writer, "Name", &v.name)?;
            }
            writer.write_event(Event::End(BytesEnd::new(uax("QualifiedName"))))?;
            Ok(())
        }
        Variant::LocalizedText(v) => {
            writer.write_event(Event::Start(BytesStart::new(uax("LocalizedText"))))?;
            if !v.locale.is_empty() {
                write_simple(writer, "Locale", &v.locale)?;
            }
            if !v.text.is_empty() {
                write_simple(writer, "Text", &v.text)?;
            }
            writer.write_event(Event::End(BytesEnd::new(uax("LocalizedText"))))?;
            Ok(())
        }
        Variant::DiagnosticInfo(v) => write_diagnostic_info(writer, v, true),
        Variant::ExtensionObject(_) => Err(EncoderError::UnsupportedValue(
            "extension object values have no XML rendering".to_owned(),
        )),
        Variant::Array(_) => Err(EncoderError::UnsupportedValue(
            "nested arrays are not allowed".to_owned(),
        )),
    }
}

/// Writes the `uax:` rendering of a `Value` payload.
pub(crate) fn write_value<W: Write>(
    writer: &mut Writer<W>,
    value: &Variant,
) -> Result<(), EncoderError> {
    match value {
        Variant::Array(array) => {
            // The NodeSet2 loader has no matrix support; dimensioned
            // arrays fail the export rather than producing a document it
            // cannot read back.
            if array.dimensions.is_some() {
                return Err(EncoderError::UnsupportedValue(format!(
                    "arrays with dimensions are not supported, got {:?}",
                    array.dimensions
                )));
            }
            let list_tag = format!("ListOf{}", array.value_type.xml_name());
            writer.write_event(Event::Start(BytesStart::new(uax(&list_tag))))?;
            for element in &array.values {
                write_scalar(writer, element)?;
            }
            writer.write_event(Event::End(BytesEnd::new(uax(&list_tag))))?;
            Ok(())
        }
        scalar => write_scalar(writer, scalar),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Array, ByteString, Guid, LocalizedText, NodeId, StatusCode, VariantScalarTypeId,
    };
    use std::str::FromStr;

    fn render(value: &Variant) -> Result<String, EncoderError> {
        let mut writer = Writer::new(Vec::new());
        write_value(&mut writer, value)?;
        Ok(String::from_utf8(writer.into_inner()).unwrap())
    }

    #[test]
    fn scalars() {
        assert_eq!(render(&Variant::Int64(45)).unwrap(), "<uax:Int64>45</uax:Int64>");
        assert_eq!(
            render(&Variant::Double(49.5)).unwrap(),
            "<uax:Double>49.5</uax:Double>"
        );
        assert_eq!(
            render(&Variant::Boolean(true)).unwrap(),
            "<uax:Boolean>true</uax:Boolean>"
        );
        assert_eq!(
            render(&Variant::String("hi".into())).unwrap(),
            "<uax:String>hi</uax:String>"
        );
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(
            render(&Variant::String("a<b&c".into())).unwrap(),
            "<uax:String>a&lt;b&amp;c</uax:String>"
        );
    }

    #[test]
    fn structured_scalars() {
        let guid = Guid::from_str("72962b91-fa75-4ae6-8d28-b404dc7daf63").unwrap();
        assert_eq!(
            render(&Variant::Guid(Box::new(guid))).unwrap(),
            "<uax:Guid><uax:String>72962b91-fa75-4ae6-8d28-b404dc7daf63</uax:String></uax:Guid>"
        );
        assert_eq!(
            render(&Variant::NodeId(Box::new(NodeId::new(2, 5u32)))).unwrap(),
            "<uax:NodeId><uax:Identifier>ns=2;i=5</uax:Identifier></uax:NodeId>"
        );
        assert_eq!(
            render(&Variant::StatusCode(StatusCode::GOOD)).unwrap(),
            "<uax:StatusCode><uax:Code>0</uax:Code></uax:StatusCode>"
        );
        assert_eq!(
            render(&Variant::ByteString(ByteString::from(vec![1u8, 2, 3]))).unwrap(),
            "<uax:ByteString>AQID</uax:ByteString>"
        );
        assert_eq!(
            render(&Variant::LocalizedText(Box::new(LocalizedText::new("en", "hello")))).unwrap(),
            "<uax:LocalizedText><uax:Locale>en</uax:Locale><uax:Text>hello</uax:Text></uax:LocalizedText>"
        );
    }

    #[test]
    fn one_dimensional_list() {
        let array = Array::new_single(
            VariantScalarTypeId::Int32,
            vec![Variant::Int32(1), Variant::Int32(2), Variant::Int32(3)],
        )
        .unwrap();
        assert_eq!(
            render(&Variant::from(array)).unwrap(),
            "<uax:ListOfInt32><uax:Int32>1</uax:Int32><uax:Int32>2</uax:Int32><uax:Int32>3</uax:Int32></uax:ListOfInt32>"
        );
    }

    #[test]
    fn matrix_is_rejected() {
        let array = Array::new_multi(
            VariantScalarTypeId::Int32,
            (0..6).map(Variant::Int32).collect::<Vec<_>>(),
            vec![2, 3],
        )
        .unwrap();
        assert!(matches!(
            render(&Variant::from(array)),
            Err(EncoderError::UnsupportedValue(_))
        ));
    }

    #[test]
    fn nested_diagnostic_info() {
        let info = DiagnosticInfo {
            additional_info: Some("outer".to_owned()),
            inner_status_code: Some(StatusCode::BAD_UNEXPECTED_ERROR),
            inner_diagnostic_info: Some(Box::new(DiagnosticInfo {
                additional_info: Some("inner".to_owned()),
                ..Default::default()
            })),
            ..Default::default()
        };
        let xml = render(&Variant::DiagnosticInfo(Box::new(info))).unwrap();
        assert!(xml.starts_with("<uax:DiagnosticInfo>"));
        assert!(xml.contains("<uax:AdditionalInfo>outer</uax:AdditionalInfo>"));
        assert!(xml.contains(
            "<uax:InnerDiagnosticInfo><uax:AdditionalInfo>inner</uax:AdditionalInfo></uax:InnerDiagnosticInfo>"
        ));
        assert!(xml.contains("<uax:InnerStatusCode><uax:Code>2147549184</uax:Code></uax:InnerStatusCode>"));
    }
}
