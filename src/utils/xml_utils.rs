//! XML utility functions
//!
//! Generates the executable-module descriptor that hosts query with
//! `--xml` before running the extractor wrapper.

use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::errors::{RadiomicsError, RadiomicsResult};

/// One parameter entry of the descriptor
struct DescriptorParameter {
    element: &'static str,
    name: &'static str,
    flag: Option<&'static str>,
    index: Option<u32>,
    channel: &'static str,
    label: &'static str,
    description: &'static str,
}

const PARAMETERS: &[DescriptorParameter] = &[
    DescriptorParameter {
        element: "image",
        name: "Image",
        flag: None,
        index: Some(0),
        channel: "input",
        label: "Input Image",
        description: "Image from which features are extracted",
    },
    DescriptorParameter {
        element: "image",
        name: "Mask",
        flag: None,
        index: Some(1),
        channel: "input",
        label: "Input Mask",
        description: "Label map defining the region of interest",
    },
    DescriptorParameter {
        element: "file",
        name: "param",
        flag: Some("param"),
        index: None,
        channel: "input",
        label: "Parameter File",
        description: "JSON or YAML file customizing the extraction",
    },
    DescriptorParameter {
        element: "integer",
        name: "label",
        flag: Some("label"),
        index: None,
        channel: "input",
        label: "Label",
        description: "Label value in the mask defining the region of interest",
    },
    DescriptorParameter {
        element: "table",
        name: "out",
        flag: Some("out"),
        index: None,
        channel: "output",
        label: "Output Table",
        description: "Table receiving the computed features",
    },
];

fn write_text_element(writer: &mut Writer<Cursor<Vec<u8>>>, name: &str, text: &str) -> RadiomicsResult<()> {
    writer.write_event(Event::Start(BytesStart::new(name))).map_err(xml_error)?;
    writer.write_event(Event::Text(BytesText::new(text))).map_err(xml_error)?;
    writer.write_event(Event::End(BytesEnd::new(name))).map_err(xml_error)?;
    Ok(())
}

fn xml_error<E: std::fmt::Display>(e: E) -> RadiomicsError {
    RadiomicsError::GenericError(format!("Failed to write XML descriptor: {}", e))
}

/// Build the executable descriptor of the extractor wrapper
///
/// # Returns
/// The descriptor as an indented XML document
pub fn module_descriptor() -> RadiomicsResult<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(xml_error)?;
    writer.write_event(Event::Start(BytesStart::new("executable"))).map_err(xml_error)?;
    write_text_element(&mut writer, "category", "Informatics")?;
    write_text_element(&mut writer, "title", "RadiomicsCLI")?;
    write_text_element(&mut writer, "description", "Radiomics feature extraction for one region of interest")?;
    write_text_element(&mut writer, "version", env!("CARGO_PKG_VERSION"))?;

    writer.write_event(Event::Start(BytesStart::new("parameters"))).map_err(xml_error)?;
    for param in PARAMETERS {
        let mut start = BytesStart::new(param.element);
        if param.element == "image" {
            start.push_attribute(("type", "scalar"));
        }
        writer.write_event(Event::Start(start)).map_err(xml_error)?;
        write_text_element(&mut writer, "name", param.name)?;
        if let Some(flag) = param.flag {
            write_text_element(&mut writer, "longflag", flag)?;
        }
        if let Some(index) = param.index {
            write_text_element(&mut writer, "index", &index.to_string())?;
        }
        write_text_element(&mut writer, "channel", param.channel)?;
        write_text_element(&mut writer, "label", param.label)?;
        write_text_element(&mut writer, "description", param.description)?;
        writer.write_event(Event::End(BytesEnd::new(param.element))).map_err(xml_error)?;
    }
    writer.write_event(Event::End(BytesEnd::new("parameters"))).map_err(xml_error)?;
    writer.write_event(Event::End(BytesEnd::new("executable"))).map_err(xml_error)?;

    String::from_utf8(writer.into_inner().into_inner()).map_err(xml_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_lists_label_parameter() {
        let xml = module_descriptor().unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<title>RadiomicsCLI</title>"));
        assert!(xml.contains("<longflag>label</longflag>"));
        assert!(xml.contains("<image type=\"scalar\">"));
    }
}
