//! Streaming iterator over the units of an aggregate document.

use std::io::{BufReader, Chain, Cursor, Read};

use quick_xml::events::Event;
use quick_xml::{Reader, Writer};

use super::RootTag;
use crate::config::ROOT_SNIFF_WINDOW;
use crate::error::{LidoError, Result};

/// One direct child of the root, wrapped in a copy of the root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawUnit {
    /// Zero-based position in the stream.
    pub index: usize,
    /// Well-formed XML: root open tag, unit, root close tag.
    pub xml: String,
}

type Source<R> = BufReader<Chain<Cursor<Vec<u8>>, R>>;

/// Lazy sequence of [`RawUnit`]s read from a byte stream.
///
/// At most one unit is held in memory. After the first error the iterator
/// yields nothing more.
pub struct UnitStream<R: Read> {
    reader: Reader<Source<R>>,
    root: RootTag,
    buf: Vec<u8>,
    depth: usize,
    index: usize,
    done: bool,
}

impl<R: Read> UnitStream<R> {
    /// Open a stream, discovering the root tag from its first bytes.
    ///
    /// # Errors
    /// `Structural` if no root tag can be found, `Io` if reading fails.
    ///
    /// # Examples
    /// ```
    /// use lido_indexer::segment::UnitStream;
    ///
    /// let xml = r#"<lidoWrap xmlns="http://www.lido-schema.org"><lido><a>1</a></lido><lido><a>2</a></lido></lidoWrap>"#;
    /// let units: Vec<_> = UnitStream::new(xml.as_bytes()).unwrap().collect::<Result<_, _>>().unwrap();
    /// assert_eq!(units.len(), 2);
    /// assert_eq!(units[1].xml, r#"<lidoWrap xmlns="http://www.lido-schema.org"><lido><a>2</a></lido></lidoWrap>"#);
    /// ```
    pub fn new(input: R) -> Result<Self> {
        Self::with_window(input, ROOT_SNIFF_WINDOW)
    }

    /// Like [`UnitStream::new`] with a custom discovery window.
    ///
    /// # Errors
    /// See [`UnitStream::new`].
    pub fn with_window(mut input: R, window: usize) -> Result<Self> {
        let mut head = Vec::with_capacity(window);
        (&mut input).take(window as u64).read_to_end(&mut head)?;
        let root = RootTag::discover(&head)?;
        tracing::debug!(root = %root.qualified_name(), "discovered root element");

        let reader = Reader::from_reader(BufReader::new(Cursor::new(head).chain(input)));
        let done = root.self_closing;

        Ok(Self {
            reader,
            root,
            buf: Vec::new(),
            depth: 0,
            index: 0,
            done,
        })
    }

    /// The discovered root element.
    pub fn root(&self) -> &RootTag {
        &self.root
    }

    fn structural(&self, message: impl std::fmt::Display) -> LidoError {
        LidoError::Structural(format!(
            "{message} (byte {})",
            self.reader.buffer_position()
        ))
    }

    fn finish_unit(&mut self, writer: Writer<Vec<u8>>) -> Result<RawUnit> {
        let body = String::from_utf8(writer.into_inner())
            .map_err(|e| self.structural(format!("unit is not valid UTF-8: {e}")))?;
        let unit = RawUnit {
            index: self.index,
            xml: self.root.wrap(&body),
        };
        self.index += 1;
        Ok(unit)
    }

    fn next_unit(&mut self) -> Result<Option<RawUnit>> {
        let mut writer: Option<Writer<Vec<u8>>> = None;

        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event.into_owned(),
                Err(e) => return Err(self.structural(format!("malformed XML: {e}"))),
            };

            match event {
                Event::Start(start) => {
                    self.depth += 1;
                    match self.depth {
                        1 => {
                            let name = start.name();
                            if name.as_ref() != self.root.qualified_name().as_bytes() {
                                return Err(self.structural(format!(
                                    "root element <{}> does not match discovered <{}>",
                                    String::from_utf8_lossy(name.as_ref()),
                                    self.root.qualified_name()
                                )));
                            }
                        }
                        2 => {
                            let mut w = Writer::new(Vec::new());
                            write(&mut w, Event::Start(start))?;
                            writer = Some(w);
                        }
                        _ => {
                            if let Some(w) = writer.as_mut() {
                                write(w, Event::Start(start))?;
                            }
                        }
                    }
                }
                Event::End(end) => {
                    if self.depth >= 2 {
                        if let Some(w) = writer.as_mut() {
                            write(w, Event::End(end))?;
                        }
                    }
                    self.depth = self.depth.saturating_sub(1);
                    match self.depth {
                        0 => return Ok(None),
                        1 => {
                            if let Some(w) = writer.take() {
                                return self.finish_unit(w).map(Some);
                            }
                        }
                        _ => {}
                    }
                }
                Event::Empty(empty) => match self.depth {
                    0 => return Ok(None),
                    1 => {
                        let mut w = Writer::new(Vec::new());
                        write(&mut w, Event::Empty(empty))?;
                        return self.finish_unit(w).map(Some);
                    }
                    _ => {
                        if let Some(w) = writer.as_mut() {
                            write(w, Event::Empty(empty))?;
                        }
                    }
                },
                Event::Eof => {
                    if self.depth > 0 {
                        return Err(self.structural(format!(
                            "stream ended inside <{}> at depth {}",
                            self.root.qualified_name(),
                            self.depth
                        )));
                    }
                    return Ok(None);
                }
                // text, CDATA, comments and PIs belong to the unit only below it
                other => {
                    if self.depth >= 2 {
                        if let Some(w) = writer.as_mut() {
                            write(w, other)?;
                        }
                    }
                }
            }
        }
    }
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| LidoError::Structural(format!("cannot copy unit markup: {e}")))
}

impl<R: Read> Iterator for UnitStream<R> {
    type Item = Result<RawUnit>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_unit() {
            Ok(Some(unit)) => Some(Ok(unit)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const WRAP: &str = r#"<lido:lidoWrap xmlns:lido="http://www.lido-schema.org" xmlns:gml="http://www.opengis.net/gml">"#;

    fn collect(xml: &str) -> Vec<Result<RawUnit>> {
        UnitStream::new(xml.as_bytes()).unwrap().collect()
    }

    #[test]
    fn test_units_are_wrapped_with_all_namespaces() {
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{WRAP}\n  <lido:lido><lido:lidoRecID>a</lido:lidoRecID></lido:lido>\n  <lido:lido><gml:pos>1 2</gml:pos></lido:lido>\n</lido:lidoWrap>\n"
        );
        let units: Vec<RawUnit> = collect(&xml).into_iter().map(|u| u.unwrap()).collect();

        assert_eq!(units.len(), 2);
        assert_eq!(units[0].index, 0);
        assert_eq!(
            units[0].xml,
            format!("{WRAP}<lido:lido><lido:lidoRecID>a</lido:lidoRecID></lido:lido></lido:lidoWrap>")
        );
        assert_eq!(units[1].index, 1);
        assert!(units[1].xml.contains("<gml:pos>1 2</gml:pos>"));
        for unit in &units {
            assert!(roxmltree::Document::parse(&unit.xml).is_ok());
        }
    }

    #[test]
    fn test_root_beyond_small_window_still_streams() {
        let xml = "<wrap><u>1</u><u>2</u><u>3</u></wrap>";
        let units: Vec<RawUnit> = UnitStream::with_window(xml.as_bytes(), 8)
            .unwrap()
            .map(|u| u.unwrap())
            .collect();
        assert_eq!(units.len(), 3);
        assert_eq!(units[2].xml, "<wrap><u>3</u></wrap>");
    }

    #[test]
    fn test_empty_root_yields_nothing() {
        assert!(collect("<wrap></wrap>").is_empty());
        assert!(collect("<wrap/>").is_empty());
    }

    #[test]
    fn test_empty_element_unit() {
        let units = collect("<wrap><lido/><lido>x</lido></wrap>");
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].as_ref().unwrap().xml, "<wrap><lido/></wrap>");
    }

    #[test]
    fn test_text_and_entities_inside_unit_are_kept() {
        let units = collect("<wrap><lido><t>A &amp; B <![CDATA[<raw>]]></t><!-- note --></lido></wrap>");
        let xml = &units[0].as_ref().unwrap().xml;
        assert!(xml.contains("A &amp; B"));
        assert!(xml.contains("<![CDATA[<raw>]]>"));
        assert!(xml.contains("<!-- note -->"));
    }

    #[test]
    fn test_truncated_stream_fails_once() {
        let mut stream = UnitStream::new("<wrap><lido>1</lido><lido>2".as_bytes()).unwrap();
        assert!(stream.next().unwrap().is_ok());
        let err = stream.next().unwrap().unwrap_err();
        assert!(matches!(err, LidoError::Structural(_)));
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_mismatched_tags_fail() {
        let results = collect("<wrap><lido><a></b></lido></wrap>");
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }

    #[test]
    fn test_missing_root_fails_on_open() {
        let err = UnitStream::new("no xml here".as_bytes()).err().unwrap();
        assert!(matches!(err, LidoError::Structural(_)));
    }

    #[test]
    fn test_trailing_content_after_root_is_ignored() {
        let units = collect("<wrap><lido>1</lido></wrap>\n<!-- end -->\n");
        assert_eq!(units.len(), 1);
    }
}
