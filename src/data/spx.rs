//! Reader for Bruker `.spx` spectrum exports.
//!
//! Parsing is split in two passes: [`tokenize`] turns the document into a
//! flat list of [`SpxEvent`]s, and [`reduce`] folds that list into a
//! [`SpectrumRecord`]. Scalars and the raw channel counts are collected
//! independently and only combined at the end, so the position of the
//! calibration tags relative to `<Channels>` does not matter.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::model::{
    Calibration, ElementEntry, QuantificationResult, ResultField, Spectrum, SpectrumRecord,
};
use crate::error::SpectrumFileError;

/// `Type` attribute value marking one element of the `Elements` block.
const ELEMENT_TYPE: &str = "TRTPSEElement";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Read and parse one spectrum file.
pub fn read_spectrum_file(path: &Path) -> Result<SpectrumRecord, SpectrumFileError> {
    let bytes = std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            SpectrumFileError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            SpectrumFileError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    // Exports declare a Windows code page; everything we consume is ASCII.
    let text = String::from_utf8_lossy(&bytes);
    let record = parse_spx(&text).map_err(|e| e.at(path))?;

    log::debug!(
        "Parsed {}: {} channels, {} results, {} elements",
        path.display(),
        record.spectrum.len(),
        record.results.len(),
        record.elements.len()
    );
    Ok(record)
}

/// Parse `.spx` content held in memory.
pub fn parse_spx(xml: &str) -> Result<SpectrumRecord, ParseError> {
    reduce(&tokenize(xml)?)
}

/// A parse failure not yet tied to a file path.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    Malformed(String),
    MissingField(&'static str),
}

impl ParseError {
    pub fn at(self, path: &Path) -> SpectrumFileError {
        let path = path.to_path_buf();
        match self {
            ParseError::Malformed(reason) => SpectrumFileError::Malformed { path, reason },
            ParseError::MissingField(field) => SpectrumFileError::MissingField { path, field },
        }
    }
}

// ---------------------------------------------------------------------------
// Pass 1: events
// ---------------------------------------------------------------------------

/// Flattened view of the XML document, in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum SpxEvent {
    Open {
        tag: String,
        /// `Name` attribute, if any.
        name: Option<String>,
        /// `Type` attribute, if any.
        kind: Option<String>,
    },
    Text(String),
    Close,
}

pub fn tokenize(xml: &str) -> Result<Vec<SpxEvent>, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut events = Vec::new();
    loop {
        let event = reader.read_event().map_err(|e| {
            ParseError::Malformed(format!("at byte {}: {e}", reader.buffer_position()))
        })?;
        match event {
            Event::Start(start) => events.push(open_event(&start)?),
            Event::Empty(start) => {
                events.push(open_event(&start)?);
                events.push(SpxEvent::Close);
            }
            Event::End(_) => events.push(SpxEvent::Close),
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| ParseError::Malformed(e.to_string()))?;
                events.push(SpxEvent::Text(text.into_owned()));
            }
            Event::CData(data) => {
                events.push(SpxEvent::Text(
                    String::from_utf8_lossy(&data.into_inner()).into_owned(),
                ));
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(events)
}

fn open_event(start: &BytesStart<'_>) -> Result<SpxEvent, ParseError> {
    let tag = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut name = None;
    let mut kind = None;
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ParseError::Malformed(format!("<{tag}>: {e}")))?;
        let slot = match attr.key.local_name().as_ref() {
            b"Name" => &mut name,
            b"Type" => &mut kind,
            _ => continue,
        };
        let value = attr
            .unescape_value()
            .map_err(|e| ParseError::Malformed(format!("<{tag}>: {e}")))?;
        *slot = Some(value.into_owned());
    }
    Ok(SpxEvent::Open { tag, name, kind })
}

// ---------------------------------------------------------------------------
// Pass 2: reducer
// ---------------------------------------------------------------------------

/// Which structured block an open element started.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Block {
    None,
    Results,
    Elements,
    /// One `TRTPSEElement` sub-tree inside an Elements block.
    Element,
}

#[derive(Debug)]
struct Frame {
    tag: String,
    /// Leading text, before the first child element.
    text: String,
    has_child: bool,
    block: Block,
    /// For `Block::Element` frames: display name from the `Name` attribute.
    element_name: Option<String>,
    /// For `Block::Element` frames: last `<Element>` value seen inside.
    atomic_number: Option<String>,
}

#[derive(Debug, Default)]
struct Accumulator {
    primary_energy: Option<String>,
    working_distance: Option<String>,
    calib_lin: Option<String>,
    calib_abs: Option<String>,
    channels: Option<String>,
    results: Vec<QuantificationResult>,
    elements: Vec<ElementEntry>,
    /// Set when `ExtResults` ends the current Results block early.
    results_closed: bool,
}

pub fn reduce(events: &[SpxEvent]) -> Result<SpectrumRecord, ParseError> {
    let mut stack: Vec<Frame> = Vec::new();
    let mut acc = Accumulator::default();

    for event in events {
        match event {
            SpxEvent::Open { tag, name, kind } => {
                if let Some(parent) = stack.last_mut() {
                    parent.has_child = true;
                }
                let in_results = stack.iter().any(|f| f.block == Block::Results);
                let in_elements = stack.iter().any(|f| f.block == Block::Elements);

                let block = match (tag.as_str(), name.as_deref()) {
                    ("ClassInstance", Some("Results")) => {
                        if !in_results {
                            acc.results_closed = false;
                        }
                        Block::Results
                    }
                    ("ClassInstance", Some("Elements")) => Block::Elements,
                    _ if in_elements && kind.as_deref() == Some(ELEMENT_TYPE) => Block::Element,
                    _ => Block::None,
                };

                if in_results && !acc.results_closed {
                    match tag.as_str() {
                        "Result" => acc.results.push(QuantificationResult::default()),
                        "ExtResults" => acc.results_closed = true,
                        _ => {}
                    }
                }

                stack.push(Frame {
                    tag: tag.clone(),
                    text: String::new(),
                    has_child: false,
                    block,
                    element_name: if block == Block::Element {
                        name.clone()
                    } else {
                        None
                    },
                    atomic_number: None,
                });
            }
            SpxEvent::Text(text) => {
                if let Some(frame) = stack.last_mut() {
                    if !frame.has_child {
                        frame.text.push_str(text);
                    }
                }
            }
            SpxEvent::Close => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| ParseError::Malformed("unbalanced closing tag".into()))?;
                close_frame(frame, &mut stack, &mut acc);
            }
        }
    }

    if let Some(frame) = stack.last() {
        return Err(ParseError::Malformed(format!("<{}> is never closed", frame.tag)));
    }

    finish(acc)
}

fn close_frame(frame: Frame, stack: &mut [Frame], acc: &mut Accumulator) {
    let text = frame.text.trim();

    match frame.tag.as_str() {
        "PrimaryEnergy" => acc.primary_energy = Some(text.to_string()),
        "WorkingDistance" => acc.working_distance = Some(text.to_string()),
        "CalibLin" => acc.calib_lin = Some(text.to_string()),
        "CalibAbs" => acc.calib_abs = Some(text.to_string()),
        "Channels" => acc.channels = Some(text.to_string()),
        "Element" => {
            if let Some(owner) = stack.iter_mut().rev().find(|f| f.block == Block::Element) {
                owner.atomic_number = Some(text.to_string());
            }
        }
        _ => {}
    }

    let in_results = stack.iter().any(|f| f.block == Block::Results);
    if in_results && !acc.results_closed {
        if let Some(field) = ResultField::from_tag(&frame.tag) {
            match acc.results.last_mut() {
                Some(result) => result.fields.push((field, field.normalize(text))),
                None => log::warn!("<{field}> appears before any <Result>, ignored"),
            }
        }
    }

    match frame.block {
        Block::Element => {
            let name = frame.element_name.unwrap_or_default();
            match frame
                .atomic_number
                .as_deref()
                .and_then(|n| n.trim().parse::<u32>().ok())
            {
                Some(atomic_number) => acc.elements.push(ElementEntry {
                    atomic_number,
                    name,
                }),
                None => log::warn!("Element {name:?} has no readable atomic number, skipped"),
            }
        }
        Block::Results if !stack.iter().any(|f| f.block == Block::Results) => {
            acc.results_closed = false;
        }
        _ => {}
    }
}

fn finish(acc: Accumulator) -> Result<SpectrumRecord, ParseError> {
    let channels = acc.channels.ok_or(ParseError::MissingField("Channels"))?;
    let calibration = Calibration {
        energy_step: parse_f64("CalibLin", acc.calib_lin)?,
        zero_energy: parse_f64("CalibAbs", acc.calib_abs)?,
    };

    let mut tokens: Vec<&str> = channels.split(',').map(str::trim).collect();
    // A trailing comma leaves one empty token at the end.
    if tokens.last().is_some_and(|tok| tok.is_empty()) {
        tokens.pop();
    }
    let counts = tokens
        .iter()
        .enumerate()
        .map(|(k, tok)| {
            if tok.is_empty() {
                return Err(ParseError::Malformed(format!("channel {k} is empty")));
            }
            tok.parse::<i64>()
                .map_err(|_| ParseError::Malformed(format!("channel {k}: '{tok}' is not a count")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Stored as a float, e.g. "20.0"; only the whole kV matters.
    let primary_energy_kv =
        optional_f64("PrimaryEnergy", acc.primary_energy).map(|v| v.trunc() as i64);
    let working_distance_mm = optional_f64("WorkingDistance", acc.working_distance);

    Ok(SpectrumRecord {
        spectrum: Spectrum::from_counts(counts, calibration),
        calibration,
        primary_energy_kv,
        working_distance_mm,
        results: acc.results,
        elements: acc.elements,
    })
}

fn parse_f64(field: &'static str, value: Option<String>) -> Result<f64, ParseError> {
    let value = value.ok_or(ParseError::MissingField(field))?;
    value
        .trim()
        .parse()
        .map_err(|_| ParseError::Malformed(format!("<{field}> value '{value}' is not a number")))
}

/// Metadata that may be absent; an unreadable value is dropped with a warning.
fn optional_f64(field: &'static str, value: Option<String>) -> Option<f64> {
    let value = value?;
    match value.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("<{field}> value '{value}' is not a number, ignored");
            None
        }
    }
}
