//! PPTX deck parser implementation.
//!
//! Reads the slide XML inside the `.pptx` ZIP container and produces
//! [`Deck`]s whose shapes carry their bounding rectangle (converted from
//! EMU to points) and their text runs with hyperlink URLs resolved through
//! the slide relationship files.

use std::collections::HashMap;
use std::io::{Read, Seek};

use agenda_core::{Deck, Error, Rect, Result, Shape, Slide, TextRun};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

/// English Metric Units per point; slide XML positions are EMU.
const EMU_PER_POINT: f64 = 12_700.0;

/// Parser for PPTX (Office Open XML) decks.
pub struct DeckParser;

impl DeckParser {
    /// Create a new deck parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a deck from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R, document_id: &str) -> Result<Deck> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::Zip(format!("Failed to open ZIP: {}", e)))?;

        let mut deck = Deck::new(document_id);

        let slide_order = self.slide_order(&mut archive)?;
        for (idx, slide_path) in slide_order.iter().enumerate() {
            let slide = self.parse_slide(&mut archive, slide_path, idx + 1)?;
            deck.add_slide(slide);
        }

        Ok(deck)
    }

    /// Ordered slide paths from the presentation relationships.
    fn slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_content =
            self.read_archive_file(archive, "ppt/_rels/presentation.xml.rels")?;

        let mut slides: Vec<(String, Option<usize>)> = Vec::new();
        let mut reader = Reader::from_str(&rels_content);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let mut rel_type = String::new();
                    let mut target = String::new();
                    let mut id = String::new();

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Type" => {
                                rel_type = String::from_utf8_lossy(&attr.value).to_string();
                            }
                            b"Target" => {
                                target = String::from_utf8_lossy(&attr.value).to_string();
                            }
                            b"Id" => {
                                id = String::from_utf8_lossy(&attr.value).to_string();
                            }
                            _ => {}
                        }
                    }

                    if rel_type.contains("/slide")
                        && !rel_type.contains("slideLayout")
                        && !rel_type.contains("slideMaster")
                    {
                        let order = slide_number(&id).or_else(|| slide_number(&target));
                        let full_path = if let Some(stripped) = target.strip_prefix('/') {
                            stripped.to_string()
                        } else {
                            format!("ppt/{}", target)
                        };
                        slides.push((full_path, order));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!("Error parsing relationships: {}", e)));
                }
                _ => {}
            }
        }

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Parse one slide, resolving its hyperlink relationships first.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        slide_number: usize,
    ) -> Result<Slide> {
        let hyperlinks = self.slide_hyperlinks(archive, slide_path)?;
        let content = self.read_archive_file(archive, slide_path)?;

        let mut slide = Slide::new(slide_number);
        for shape in extract_shapes(&content, &hyperlinks)? {
            slide.add_shape(shape);
        }

        Ok(slide)
    }

    /// Hyperlink relationship map (`rId` → URL) for a slide, empty when the
    /// slide has no relationship part.
    fn slide_hyperlinks<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
    ) -> Result<HashMap<String, String>> {
        let rels_path = match rels_path_for(slide_path) {
            Some(path) => path,
            None => return Ok(HashMap::new()),
        };

        let content = match self.try_read_archive_file(archive, &rels_path)? {
            Some(content) => content,
            None => return Ok(HashMap::new()),
        };

        let mut links = HashMap::new();
        let mut reader = Reader::from_str(&content);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let mut rel_type = String::new();
                    let mut target = String::new();
                    let mut id = String::new();

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Type" => {
                                rel_type = String::from_utf8_lossy(&attr.value).to_string();
                            }
                            b"Target" => {
                                target = String::from_utf8_lossy(&attr.value).to_string();
                            }
                            b"Id" => {
                                id = String::from_utf8_lossy(&attr.value).to_string();
                            }
                            _ => {}
                        }
                    }

                    if rel_type.ends_with("/hyperlink") && !id.is_empty() {
                        links.insert(id, target);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "Error parsing slide relationships: {}",
                        e
                    )));
                }
                _ => {}
            }
        }

        Ok(links)
    }

    /// Read a file from the ZIP archive.
    fn read_archive_file<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::Zip(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::Zip(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }

    /// Read a file that may legitimately be absent.
    fn try_read_archive_file<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<Option<String>> {
        let mut file = match archive.by_name(path) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(Error::Zip(format!("Failed to open '{}': {}", path, e)));
            }
        };

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::Zip(format!("Failed to read '{}': {}", path, e)))?;

        Ok(Some(content))
    }
}

impl Default for DeckParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Shape under construction while walking slide XML.
#[derive(Debug, Default)]
struct ShapeBuilder {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    has_offset: bool,
    has_extent: bool,
    runs: Vec<TextRun>,
    text: String,
}

impl ShapeBuilder {
    fn apply_offset(&mut self, e: &BytesStart) {
        // A shape's own transform comes first; ignore any nested ones.
        if self.has_offset {
            return;
        }
        self.has_offset = true;
        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"x" => {
                    if let Ok(x) = String::from_utf8_lossy(&attr.value).parse::<f64>() {
                        self.x = x / EMU_PER_POINT;
                    }
                }
                b"y" => {
                    if let Ok(y) = String::from_utf8_lossy(&attr.value).parse::<f64>() {
                        self.y = y / EMU_PER_POINT;
                    }
                }
                _ => {}
            }
        }
    }

    fn apply_extent(&mut self, e: &BytesStart) {
        if self.has_extent {
            return;
        }
        self.has_extent = true;
        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"cx" => {
                    if let Ok(cx) = String::from_utf8_lossy(&attr.value).parse::<f64>() {
                        self.width = cx / EMU_PER_POINT;
                    }
                }
                b"cy" => {
                    if let Ok(cy) = String::from_utf8_lossy(&attr.value).parse::<f64>() {
                        self.height = cy / EMU_PER_POINT;
                    }
                }
                _ => {}
            }
        }
    }

    fn finish(self) -> Shape {
        let mut shape = Shape::new(Rect::new(self.x, self.y, self.width, self.height));
        shape.runs = self.runs;
        shape.text = self.text;
        shape
    }
}

/// Extract shapes with geometry and text runs from slide XML.
fn extract_shapes(
    xml_content: &str,
    hyperlinks: &HashMap<String, String>,
) -> Result<Vec<Shape>> {
    let mut shapes = Vec::new();
    // No trim_text here: run text must come through verbatim, or a label
    // split across runs ("WEEK OF " + "9/1/2025") loses its boundary space.
    let mut reader = Reader::from_str(xml_content);

    let mut current_shape: Option<ShapeBuilder> = None;
    let mut current_run: Option<TextRun> = None;
    let mut in_text_body = false;
    let mut in_paragraph = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    current_shape = Some(ShapeBuilder::default());
                }
                b"off" => {
                    if let Some(shape) = current_shape.as_mut() {
                        shape.apply_offset(e);
                    }
                }
                b"ext" => {
                    if let Some(shape) = current_shape.as_mut() {
                        shape.apply_extent(e);
                    }
                }
                b"txBody" => {
                    in_text_body = true;
                }
                b"p" if in_text_body => {
                    in_paragraph = true;
                    if let Some(shape) = current_shape.as_mut() {
                        if !shape.text.is_empty() {
                            shape.text.push('\n');
                        }
                    }
                }
                b"r" if in_paragraph => {
                    current_run = Some(TextRun::new(""));
                }
                b"hlinkClick" => {
                    if let Some(run) = current_run.as_mut() {
                        apply_hyperlink(run, e, hyperlinks);
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"off" => {
                    if let Some(shape) = current_shape.as_mut() {
                        shape.apply_offset(e);
                    }
                }
                b"ext" => {
                    if let Some(shape) = current_shape.as_mut() {
                        shape.apply_extent(e);
                    }
                }
                b"hlinkClick" => {
                    if let Some(run) = current_run.as_mut() {
                        apply_hyperlink(run, e, hyperlinks);
                    }
                }
                b"br" if in_paragraph => {
                    if let Some(shape) = current_shape.as_mut() {
                        shape.text.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if in_paragraph {
                    let text = e.unescape().unwrap_or_default();
                    if let Some(run) = current_run.as_mut() {
                        run.text.push_str(&text);
                    }
                    if let Some(shape) = current_shape.as_mut() {
                        shape.text.push_str(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    if let Some(shape) = current_shape.take() {
                        shapes.push(shape.finish());
                    }
                    current_run = None;
                    in_text_body = false;
                    in_paragraph = false;
                }
                b"r" => {
                    if let (Some(shape), Some(run)) =
                        (current_shape.as_mut(), current_run.take())
                    {
                        shape.runs.push(run);
                    }
                }
                b"txBody" => {
                    in_text_body = false;
                }
                b"p" => {
                    in_paragraph = false;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("XML parsing error (continuing): {}", e);
                // Continue parsing despite errors
            }
            _ => {}
        }
    }

    Ok(shapes)
}

/// Attach the resolved URL for an `hlinkClick` element to a run.
fn apply_hyperlink(run: &mut TextRun, e: &BytesStart, hyperlinks: &HashMap<String, String>) {
    for attr in e.attributes().flatten() {
        if local_name(attr.key.as_ref()) == b"id" {
            let rel_id = String::from_utf8_lossy(&attr.value).to_string();
            match hyperlinks.get(&rel_id) {
                Some(url) => run.hyperlink = Some(url.clone()),
                None => {
                    log::debug!("Unresolved hyperlink relationship '{}'", rel_id);
                }
            }
        }
    }
}

/// Relationship part path for a slide part, e.g.
/// `ppt/slides/slide2.xml` → `ppt/slides/_rels/slide2.xml.rels`.
fn rels_path_for(slide_path: &str) -> Option<String> {
    let (dir, file) = slide_path.rsplit_once('/')?;
    Some(format!("{}/_rels/{}.rels", dir, file))
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
