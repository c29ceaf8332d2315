//! Serializes a [`Deck`] as an Office Open XML presentation package.

use std::io::{Cursor, Seek, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::deck::{Deck, Slide, TextBox};
use crate::error::Result;
use crate::templates;
use crate::xml::{XmlWriter, NS_CONTENT_TYPES, NS_PKG_RELS, PML_NAMESPACES};

const REL_OFFICE_DOCUMENT: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_CORE_PROPERTIES: &str = "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
const REL_EXTENDED_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
const REL_SLIDE_MASTER: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const REL_SLIDE_LAYOUT: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
const REL_PRES_PROPS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps";
const REL_VIEW_PROPS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/viewProps";
const REL_TABLE_STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/tableStyles";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

const CT_PRESENTATION: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const CT_SLIDE_MASTER: &str = "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
const CT_SLIDE_LAYOUT: &str = "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const CT_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
const CT_PRES_PROPS: &str = "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml";
const CT_VIEW_PROPS: &str = "application/vnd.openxmlformats-officedocument.presentationml.viewProps+xml";
const CT_TABLE_STYLES: &str = "application/vnd.openxmlformats-officedocument.presentationml.tableStyles+xml";
const CT_CORE: &str = "application/vnd.openxmlformats-package.core-properties+xml";
const CT_APP: &str = "application/vnd.openxmlformats-officedocument.extended-properties+xml";

/// Notes page size of the default template (portrait letter-ish, in EMU).
const NOTES_SIZE: (i64, i64) = (6_858_000, 9_144_000);
const SLIDE_MASTER_ID: u32 = 2_147_483_648;
const FIRST_SLIDE_ID: u32 = 256;
/// Presentation relationships before the first slide (master, props, theme, styles).
const FIXED_PRESENTATION_RELS: usize = 5;

const APPLICATION: &str = "pagedeck";

/// Writes the deck as a `.pptx` package into `writer`.
pub fn write_deck<W: Write + Seek>(deck: &Deck, writer: W) -> Result<W> {
    let mut zip = ZipWriter::new(writer);

    part(&mut zip, "[Content_Types].xml", &content_types(deck)?)?;
    part(&mut zip, "_rels/.rels", &package_rels()?)?;
    part(&mut zip, "docProps/app.xml", &app_properties(deck)?)?;
    part(&mut zip, "docProps/core.xml", &core_properties(deck)?)?;
    part(&mut zip, "ppt/presentation.xml", &presentation(deck)?)?;
    part(&mut zip, "ppt/_rels/presentation.xml.rels", &presentation_rels(deck)?)?;
    part(&mut zip, "ppt/presProps.xml", templates::PRES_PROPS.as_bytes())?;
    part(&mut zip, "ppt/viewProps.xml", templates::VIEW_PROPS.as_bytes())?;
    part(&mut zip, "ppt/tableStyles.xml", templates::TABLE_STYLES.as_bytes())?;
    part(&mut zip, "ppt/theme/theme1.xml", templates::THEME.as_bytes())?;
    part(&mut zip, "ppt/slideMasters/slideMaster1.xml", templates::SLIDE_MASTER.as_bytes())?;
    part(
        &mut zip,
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        templates::SLIDE_MASTER_RELS.as_bytes(),
    )?;
    part(&mut zip, "ppt/slideLayouts/slideLayout1.xml", templates::SLIDE_LAYOUT.as_bytes())?;
    part(
        &mut zip,
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        templates::SLIDE_LAYOUT_RELS.as_bytes(),
    )?;

    let mut image_number = 0;
    for (i, slide) in deck.slides.iter().enumerate() {
        let number = i + 1;
        let image = match &slide.background {
            Some(picture) => {
                image_number += 1;
                // PNG data is already compressed
                let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
                zip.start_file(format!("ppt/media/image{}.png", image_number), options)?;
                zip.write_all(&picture.png)?;
                Some(image_number)
            }
            None => None,
        };

        part(&mut zip, &format!("ppt/slides/slide{}.xml", number), &slide_xml(deck, slide)?)?;
        part(
            &mut zip,
            &format!("ppt/slides/_rels/slide{}.xml.rels", number),
            &slide_rels(image)?,
        )?;
    }

    let writer = zip.finish()?;
    log::debug!(
        "[Deck] wrote {} slides, {} pictures, {} text boxes",
        deck.slides.len(),
        image_number,
        deck.text_box_count()
    );
    Ok(writer)
}

fn part<W: Write + Seek>(zip: &mut ZipWriter<W>, name: &str, data: &[u8]) -> Result<()> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(name, options)?;
    zip.write_all(data)?;
    Ok(())
}

/// Serializes the whole package into memory.
pub fn deck_to_bytes(deck: &Deck) -> Result<Vec<u8>> {
    Ok(write_deck(deck, Cursor::new(Vec::new()))?.into_inner())
}

fn relationships(rels: &[(String, &str, String)]) -> Result<Vec<u8>> {
    let mut xml = XmlWriter::new()?;
    xml.start("Relationships", &[("xmlns", NS_PKG_RELS)])?;
    for (id, kind, target) in rels {
        xml.empty(
            "Relationship",
            &[("Id", id.as_str()), ("Type", *kind), ("Target", target.as_str())],
        )?;
    }
    xml.end("Relationships")?;
    Ok(xml.finish())
}

fn package_rels() -> Result<Vec<u8>> {
    relationships(&[
        ("rId1".into(), REL_OFFICE_DOCUMENT, "ppt/presentation.xml".into()),
        ("rId2".into(), REL_CORE_PROPERTIES, "docProps/core.xml".into()),
        ("rId3".into(), REL_EXTENDED_PROPERTIES, "docProps/app.xml".into()),
    ])
}

fn slide_rel_id(index: usize) -> String {
    format!("rId{}", FIXED_PRESENTATION_RELS + index + 1)
}

fn presentation_rels(deck: &Deck) -> Result<Vec<u8>> {
    let mut rels = vec![
        ("rId1".to_string(), REL_SLIDE_MASTER, "slideMasters/slideMaster1.xml".to_string()),
        ("rId2".to_string(), REL_PRES_PROPS, "presProps.xml".to_string()),
        ("rId3".to_string(), REL_VIEW_PROPS, "viewProps.xml".to_string()),
        ("rId4".to_string(), REL_THEME, "theme/theme1.xml".to_string()),
        ("rId5".to_string(), REL_TABLE_STYLES, "tableStyles.xml".to_string()),
    ];
    for i in 0..deck.slides.len() {
        rels.push((slide_rel_id(i), REL_SLIDE, format!("slides/slide{}.xml", i + 1)));
    }
    relationships(&rels)
}

fn slide_rels(image: Option<usize>) -> Result<Vec<u8>> {
    let mut rels = vec![(
        "rId1".to_string(),
        REL_SLIDE_LAYOUT,
        "../slideLayouts/slideLayout1.xml".to_string(),
    )];
    if let Some(number) = image {
        rels.push(("rId2".to_string(), REL_IMAGE, format!("../media/image{}.png", number)));
    }
    relationships(&rels)
}

fn content_types(deck: &Deck) -> Result<Vec<u8>> {
    let mut xml = XmlWriter::new()?;
    xml.start("Types", &[("xmlns", NS_CONTENT_TYPES)])?;
    xml.empty(
        "Default",
        &[
            ("Extension", "rels"),
            ("ContentType", "application/vnd.openxmlformats-package.relationships+xml"),
        ],
    )?;
    xml.empty("Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
    xml.empty("Default", &[("Extension", "png"), ("ContentType", "image/png")])?;

    let mut overrides = vec![
        ("/ppt/presentation.xml".to_string(), CT_PRESENTATION),
        ("/ppt/slideMasters/slideMaster1.xml".to_string(), CT_SLIDE_MASTER),
        ("/ppt/slideLayouts/slideLayout1.xml".to_string(), CT_SLIDE_LAYOUT),
        ("/ppt/theme/theme1.xml".to_string(), CT_THEME),
        ("/ppt/presProps.xml".to_string(), CT_PRES_PROPS),
        ("/ppt/viewProps.xml".to_string(), CT_VIEW_PROPS),
        ("/ppt/tableStyles.xml".to_string(), CT_TABLE_STYLES),
        ("/docProps/core.xml".to_string(), CT_CORE),
        ("/docProps/app.xml".to_string(), CT_APP),
    ];
    for i in 0..deck.slides.len() {
        overrides.push((format!("/ppt/slides/slide{}.xml", i + 1), CT_SLIDE));
    }
    for (part_name, content_type) in &overrides {
        xml.empty(
            "Override",
            &[("PartName", part_name.as_str()), ("ContentType", *content_type)],
        )?;
    }

    xml.end("Types")?;
    Ok(xml.finish())
}

fn presentation(deck: &Deck) -> Result<Vec<u8>> {
    let mut xml = XmlWriter::new()?;
    let mut attrs = PML_NAMESPACES.to_vec();
    attrs.push(("saveSubsetFonts", "1"));
    xml.start("p:presentation", &attrs)?;

    xml.start("p:sldMasterIdLst", &[])?;
    xml.empty("p:sldMasterId", &[("id", &SLIDE_MASTER_ID.to_string()), ("r:id", "rId1")])?;
    xml.end("p:sldMasterIdLst")?;

    if !deck.slides.is_empty() {
        xml.start("p:sldIdLst", &[])?;
        for i in 0..deck.slides.len() {
            let id = FIRST_SLIDE_ID as usize + i;
            xml.empty("p:sldId", &[("id", &id.to_string()), ("r:id", &slide_rel_id(i))])?;
        }
        xml.end("p:sldIdLst")?;
    }

    xml.empty(
        "p:sldSz",
        &[("cx", &deck.size.cx.to_string()), ("cy", &deck.size.cy.to_string())],
    )?;
    xml.empty(
        "p:notesSz",
        &[("cx", &NOTES_SIZE.0.to_string()), ("cy", &NOTES_SIZE.1.to_string())],
    )?;

    xml.end("p:presentation")?;
    Ok(xml.finish())
}

fn app_properties(deck: &Deck) -> Result<Vec<u8>> {
    let mut xml = XmlWriter::new()?;
    xml.start(
        "Properties",
        &[
            ("xmlns", "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"),
            ("xmlns:vt", "http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes"),
        ],
    )?;
    xml.text_element("Application", &[], APPLICATION)?;
    xml.text_element("Slides", &[], &deck.slides.len().to_string())?;
    xml.end("Properties")?;
    Ok(xml.finish())
}

fn core_properties(deck: &Deck) -> Result<Vec<u8>> {
    let timestamp = deck.created.format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let mut xml = XmlWriter::new()?;
    xml.start(
        "cp:coreProperties",
        &[
            ("xmlns:cp", "http://schemas.openxmlformats.org/package/2006/metadata/core-properties"),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:dcterms", "http://purl.org/dc/terms/"),
            ("xmlns:dcmitype", "http://purl.org/dc/dcmitype/"),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ],
    )?;
    if let Some(title) = &deck.title {
        xml.text_element("dc:title", &[], title)?;
    }
    xml.text_element("dc:creator", &[], APPLICATION)?;
    xml.text_element("dcterms:created", &[("xsi:type", "dcterms:W3CDTF")], &timestamp)?;
    xml.text_element("dcterms:modified", &[("xsi:type", "dcterms:W3CDTF")], &timestamp)?;
    xml.end("cp:coreProperties")?;
    Ok(xml.finish())
}

fn xfrm(xml: &mut XmlWriter, x: i64, y: i64, cx: i64, cy: i64) -> Result<()> {
    xml.start("a:xfrm", &[])?;
    xml.empty("a:off", &[("x", &x.to_string()), ("y", &y.to_string())])?;
    xml.empty("a:ext", &[("cx", &cx.to_string()), ("cy", &cy.to_string())])?;
    xml.end("a:xfrm")
}

fn rect_geometry(xml: &mut XmlWriter) -> Result<()> {
    xml.start("a:prstGeom", &[("prst", "rect")])?;
    xml.empty("a:avLst", &[])?;
    xml.end("a:prstGeom")
}

fn background_picture(xml: &mut XmlWriter, deck: &Deck, shape_id: u32) -> Result<()> {
    let name = format!("Picture {}", shape_id - 1);
    xml.start("p:pic", &[])?;
    xml.start("p:nvPicPr", &[])?;
    xml.empty("p:cNvPr", &[("id", &shape_id.to_string()), ("name", &name)])?;
    xml.start("p:cNvPicPr", &[])?;
    xml.empty("a:picLocks", &[("noChangeAspect", "1")])?;
    xml.end("p:cNvPicPr")?;
    xml.empty("p:nvPr", &[])?;
    xml.end("p:nvPicPr")?;

    xml.start("p:blipFill", &[])?;
    xml.empty("a:blip", &[("r:embed", "rId2")])?;
    xml.start("a:stretch", &[])?;
    xml.empty("a:fillRect", &[])?;
    xml.end("a:stretch")?;
    xml.end("p:blipFill")?;

    xml.start("p:spPr", &[])?;
    xfrm(xml, 0, 0, deck.size.cx, deck.size.cy)?;
    rect_geometry(xml)?;
    xml.end("p:spPr")?;
    xml.end("p:pic")
}

fn text_box(xml: &mut XmlWriter, text_box: &TextBox, shape_id: u32) -> Result<()> {
    let name = format!("TextBox {}", shape_id - 1);
    xml.start("p:sp", &[])?;
    xml.start("p:nvSpPr", &[])?;
    xml.empty("p:cNvPr", &[("id", &shape_id.to_string()), ("name", &name)])?;
    xml.empty("p:cNvSpPr", &[("txBox", "1")])?;
    xml.empty("p:nvPr", &[])?;
    xml.end("p:nvSpPr")?;

    xml.start("p:spPr", &[])?;
    xfrm(xml, text_box.x, text_box.y, text_box.cx, text_box.cy)?;
    rect_geometry(xml)?;
    xml.empty("a:noFill", &[])?;
    xml.start("a:ln", &[])?;
    xml.empty("a:noFill", &[])?;
    xml.end("a:ln")?;
    xml.end("p:spPr")?;

    xml.start("p:txBody", &[])?;
    xml.start(
        "a:bodyPr",
        &[
            ("wrap", "none"),
            ("lIns", "0"),
            ("tIns", "0"),
            ("rIns", "0"),
            ("bIns", "0"),
            ("rtlCol", "0"),
        ],
    )?;
    xml.empty("a:noAutofit", &[])?;
    xml.end("a:bodyPr")?;
    xml.empty("a:lstStyle", &[])?;

    xml.start("a:p", &[])?;
    xml.start("a:r", &[])?;
    let size = (text_box.size_pt * 100).to_string();
    let mut run_attrs = vec![("lang", "en-US"), ("sz", size.as_str())];
    if text_box.bold {
        run_attrs.push(("b", "1"));
    }
    run_attrs.push(("dirty", "0"));
    xml.empty("a:rPr", &run_attrs)?;
    xml.text_element("a:t", &[], &text_box.text)?;
    xml.end("a:r")?;
    xml.end("a:p")?;
    xml.end("p:txBody")?;
    xml.end("p:sp")
}

fn slide_xml(deck: &Deck, slide: &Slide) -> Result<Vec<u8>> {
    let mut xml = XmlWriter::new()?;
    xml.start("p:sld", &PML_NAMESPACES)?;
    xml.start("p:cSld", &[])?;
    xml.start("p:spTree", &[])?;

    xml.start("p:nvGrpSpPr", &[])?;
    xml.empty("p:cNvPr", &[("id", "1"), ("name", "")])?;
    xml.empty("p:cNvGrpSpPr", &[])?;
    xml.empty("p:nvPr", &[])?;
    xml.end("p:nvGrpSpPr")?;
    xml.start("p:grpSpPr", &[])?;
    xml.start("a:xfrm", &[])?;
    xml.empty("a:off", &[("x", "0"), ("y", "0")])?;
    xml.empty("a:ext", &[("cx", "0"), ("cy", "0")])?;
    xml.empty("a:chOff", &[("x", "0"), ("y", "0")])?;
    xml.empty("a:chExt", &[("cx", "0"), ("cy", "0")])?;
    xml.end("a:xfrm")?;
    xml.end("p:grpSpPr")?;

    let mut shape_id = 2;
    if slide.background.is_some() {
        background_picture(&mut xml, deck, shape_id)?;
        shape_id += 1;
    }
    for tb in &slide.text_boxes {
        text_box(&mut xml, tb, shape_id)?;
        shape_id += 1;
    }

    xml.end("p:spTree")?;
    xml.end("p:cSld")?;
    xml.start("p:clrMapOvr", &[])?;
    xml.empty("a:masterClrMapping", &[])?;
    xml.end("p:clrMapOvr")?;
    xml.end("p:sld")?;
    Ok(xml.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::Picture;
    use pagedeck_core::geometry::EmuSize;
    use quick_xml::events::Event;
    use quick_xml::Reader;
    use std::io::Read;
    use zip::ZipArchive;

    fn hello_box() -> TextBox {
        TextBox {
            x: 914_400,
            y: 914_400,
            cx: 1_625_600,
            cy: 228_600,
            text: "Hello".to_string(),
            size_pt: 18,
            bold: true,
        }
    }

    fn sample_deck() -> Deck {
        let mut deck = Deck::new(EmuSize::new(7_772_400, 10_058_400)).with_title("report.pdf");
        deck.push(Slide {
            background: Some(Picture {
                png: b"\x89PNG-first".to_vec(),
            }),
            text_boxes: vec![hello_box()],
        });
        deck.push(Slide {
            background: Some(Picture {
                png: b"\x89PNG-second".to_vec(),
            }),
            text_boxes: Vec::new(),
        });
        deck.push(Slide::default());
        deck
    }

    fn read_part(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
        let mut content = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut content).unwrap();
        content
    }

    /// Attributes of every element named `name`, in document order.
    fn elements(xml: &str, name: &[u8]) -> Vec<Vec<(String, String)>> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);
        let mut found = Vec::new();
        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == name => {
                    found.push(
                        e.attributes()
                            .flatten()
                            .map(|a| {
                                (
                                    String::from_utf8_lossy(a.key.as_ref()).to_string(),
                                    String::from_utf8_lossy(&a.value).to_string(),
                                )
                            })
                            .collect(),
                    );
                }
                Ok(Event::Eof) => break,
                Err(e) => panic!("invalid XML: {}", e),
                _ => {}
            }
        }
        found
    }

    fn attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
        attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    fn open(deck: &Deck) -> ZipArchive<Cursor<Vec<u8>>> {
        ZipArchive::new(Cursor::new(deck_to_bytes(deck).unwrap())).unwrap()
    }

    #[test]
    fn test_package_parts() {
        let mut archive = open(&sample_deck());
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        for expected in [
            "[Content_Types].xml",
            "_rels/.rels",
            "ppt/presentation.xml",
            "ppt/slides/slide1.xml",
            "ppt/slides/slide3.xml",
            "ppt/media/image1.png",
            "ppt/media/image2.png",
            "ppt/theme/theme1.xml",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {}", expected);
        }
        assert!(!names.iter().any(|n| n == "ppt/media/image3.png"));

        let types = read_part(&mut archive, "[Content_Types].xml");
        assert_eq!(
            elements(&types, b"Override")
                .iter()
                .filter(|o| attr(o, "ContentType") == Some(CT_SLIDE))
                .count(),
            3
        );
    }

    #[test]
    fn test_presentation_size_and_order() {
        let mut archive = open(&sample_deck());
        let presentation = read_part(&mut archive, "ppt/presentation.xml");

        let size = &elements(&presentation, b"p:sldSz")[0];
        assert_eq!(attr(size, "cx"), Some("7772400"));
        assert_eq!(attr(size, "cy"), Some("10058400"));

        let ids: Vec<String> = elements(&presentation, b"p:sldId")
            .iter()
            .filter_map(|s| attr(s, "r:id").map(str::to_string))
            .collect();
        assert_eq!(ids, vec!["rId6", "rId7", "rId8"]);

        let rels = read_part(&mut archive, "ppt/_rels/presentation.xml.rels");
        let slide_targets: Vec<String> = elements(&rels, b"Relationship")
            .iter()
            .filter(|r| attr(r, "Type") == Some(REL_SLIDE))
            .map(|r| format!("{}={}", attr(r, "Id").unwrap(), attr(r, "Target").unwrap()))
            .collect();
        assert_eq!(
            slide_targets,
            vec!["rId6=slides/slide1.xml", "rId7=slides/slide2.xml", "rId8=slides/slide3.xml"]
        );
    }

    #[test]
    fn test_slide_shapes() {
        let mut archive = open(&sample_deck());
        let slide = read_part(&mut archive, "ppt/slides/slide1.xml");

        let offsets = elements(&slide, b"a:off");
        let extents = elements(&slide, b"a:ext");
        // group transform, picture, text box
        assert_eq!(offsets.len(), 3);
        assert_eq!(attr(&offsets[1], "x"), Some("0"));
        assert_eq!(attr(&extents[1], "cx"), Some("7772400"));
        assert_eq!(attr(&offsets[2], "x"), Some("914400"));
        assert_eq!(attr(&offsets[2], "y"), Some("914400"));
        assert_eq!(attr(&extents[2], "cx"), Some("1625600"));
        assert_eq!(attr(&extents[2], "cy"), Some("228600"));

        let run = &elements(&slide, b"a:rPr")[0];
        assert_eq!(attr(run, "sz"), Some("1800"));
        assert_eq!(attr(run, "b"), Some("1"));

        let body = &elements(&slide, b"a:bodyPr")[0];
        assert_eq!(attr(body, "wrap"), Some("none"));
        assert_eq!(attr(body, "lIns"), Some("0"));
        assert!(slide.contains("<a:t>Hello</a:t>"));
        assert!(slide.contains("<a:ln><a:noFill/></a:ln>"));

        let rels = read_part(&mut archive, "ppt/slides/_rels/slide1.xml.rels");
        assert!(rels.contains("../media/image1.png"));
    }

    #[test]
    fn test_slide_without_background() {
        let mut archive = open(&sample_deck());
        let slide = read_part(&mut archive, "ppt/slides/slide3.xml");
        assert!(elements(&slide, b"p:pic").is_empty());
        assert!(elements(&slide, b"p:sp").is_empty());

        let rels = read_part(&mut archive, "ppt/slides/_rels/slide3.xml.rels");
        assert!(!rels.contains("media"));
        assert!(rels.contains("slideLayout1.xml"));
    }

    #[test]
    fn test_media_bytes_kept() {
        let mut archive = open(&sample_deck());
        let mut png = Vec::new();
        archive
            .by_name("ppt/media/image2.png")
            .unwrap()
            .read_to_end(&mut png)
            .unwrap();
        assert_eq!(png, b"\x89PNG-second");
    }

    #[test]
    fn test_plain_run_has_no_bold_flag() {
        let mut deck = Deck::new(EmuSize::new(9_144_000, 6_858_000));
        deck.push(Slide {
            background: None,
            text_boxes: vec![TextBox {
                bold: false,
                text: "R&D".to_string(),
                ..hello_box()
            }],
        });
        let mut archive = open(&deck);
        let slide = read_part(&mut archive, "ppt/slides/slide1.xml");
        assert_eq!(attr(&elements(&slide, b"a:rPr")[0], "b"), None);
        assert!(slide.contains("<a:t>R&amp;D</a:t>"));
    }
}
