//! Streaming record reader over one market document
//!
//! The reader pulls `quick-xml` events and materializes one series subtree
//! at a time, so memory is bounded by the largest series rather than the
//! document.

use super::schema::DocumentSchema;
use super::stats::{DocumentHeader, ParseStats, SkipReason};
use crate::domain::time::{parse_instant, Resolution};
use crate::domain::{BiddingZone, Category, CountryCode, EtlError, PsrType, Record, Result};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::VecDeque;
use std::io::Cursor;

/// Where a document came from
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// Category the document belongs to
    pub category: Category,
    /// Country inferred from the partition addressing
    pub country: CountryCode,
    /// Human-readable origin for log lines (usually the file name)
    pub source: String,
}

/// Parses one document into a lazy stream of records
///
/// The stream is a pure function of `bytes`: calling this again with the same
/// input yields the same records. A syntax error surfaces as a single `Err`
/// item, after which the stream ends.
///
/// # Example
///
/// ```
/// use entsoe_etl::core::parse::{parse_document, ParseContext};
/// use entsoe_etl::domain::{Category, CountryCode};
///
/// let xml = br#"<GL_MarketDocument><TimeSeries>
///   <inBiddingZone_Domain.mRID>10YFR-RTE------C</inBiddingZone_Domain.mRID>
///   <MktPSRType><psrType>B16</psrType></MktPSRType>
///   <Period><timeInterval><start>2026-01-27T00:00Z</start></timeInterval>
///     <resolution>PT60M</resolution>
///     <Point><position>1</position><quantity>0</quantity></Point>
///   </Period></TimeSeries></GL_MarketDocument>"#;
///
/// let context = ParseContext {
///     category: Category::Generation,
///     country: CountryCode::new("FR").unwrap(),
///     source: "raw_FR.xml".to_string(),
/// };
/// let records: Vec<_> = parse_document(xml.to_vec(), context)
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(records.len(), 1);
/// ```
pub fn parse_document(bytes: Vec<u8>, context: ParseContext) -> RecordStream {
    RecordStream::new(bytes, context)
}

/// Iterator of records parsed from one document
pub struct RecordStream {
    reader: Reader<Cursor<Vec<u8>>>,
    buf: Vec<u8>,
    schema: &'static DocumentSchema,
    context: ParseContext,
    pending: VecDeque<Record>,
    header: DocumentHeader,
    stats: ParseStats,
    depth: usize,
    series_index: usize,
    finished: bool,
}

impl RecordStream {
    fn new(bytes: Vec<u8>, context: ParseContext) -> Self {
        let mut reader = Reader::from_reader(Cursor::new(bytes));
        reader.config_mut().trim_text(true);

        Self {
            reader,
            buf: Vec::new(),
            schema: DocumentSchema::for_category(context.category),
            context,
            pending: VecDeque::new(),
            header: DocumentHeader::default(),
            stats: ParseStats {
                documents: 1,
                ..Default::default()
            },
            depth: 0,
            series_index: 0,
            finished: false,
        }
    }

    /// Counters so far; complete once the stream is exhausted
    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Document-level fields seen so far
    pub fn header(&self) -> &DocumentHeader {
        &self.header
    }

    /// Consumes the stream, returning its counters
    pub fn into_stats(self) -> ParseStats {
        self.stats
    }

    fn next_token(&mut self) -> Result<Token> {
        self.buf.clear();
        let token = match self.reader.read_event_into(&mut self.buf) {
            Ok(Event::Start(e)) => Token::Open(local_name(&e)),
            Ok(Event::Empty(e)) => Token::Leaf(local_name(&e)),
            Ok(Event::End(_)) => Token::Close,
            Ok(Event::Text(t)) => Token::Text(
                t.unescape()
                    .map_err(|e| EtlError::Parse(format!("Invalid text content: {e}")))?
                    .into_owned(),
            ),
            Ok(Event::CData(c)) => Token::Text(String::from_utf8_lossy(&c).into_owned()),
            Ok(Event::Eof) => Token::Eof,
            Ok(_) => Token::Other,
            Err(e) => {
                return Err(EtlError::Parse(format!(
                    "{}: XML syntax error at byte {}: {}",
                    self.context.source,
                    self.reader.error_position(),
                    e
                )))
            }
        };
        Ok(token)
    }

    /// Reads until the next series has been turned into records or the
    /// document ends. Returns `false` at end of document.
    fn advance(&mut self) -> Result<bool> {
        loop {
            match self.next_token()? {
                Token::Open(name) => {
                    self.depth += 1;
                    if self.depth == 1 {
                        self.open_root(name);
                        continue;
                    }
                    if name == self.schema.series_tag {
                        let series = self.collect_element(name)?;
                        self.depth -= 1;
                        self.process_series(&series);
                        return Ok(true);
                    }
                    if self.depth == 2 {
                        let element = self.collect_element(name)?;
                        self.depth -= 1;
                        self.read_header_field(&element);
                    }
                }
                Token::Leaf(name) => {
                    if self.depth == 0 {
                        self.open_root(name);
                    } else if name == self.schema.series_tag {
                        self.process_series(&Element::new(name));
                        return Ok(true);
                    }
                }
                Token::Close => {
                    self.depth = self.depth.saturating_sub(1);
                }
                Token::Text(_) | Token::Other => {}
                Token::Eof => {
                    if self.header.root.is_empty() {
                        return Err(EtlError::Parse(format!(
                            "{}: document has no root element",
                            self.context.source
                        )));
                    }
                    if self.depth > 0 {
                        return Err(EtlError::Parse(format!(
                            "{}: unexpected end of document inside <{}>",
                            self.context.source, self.header.root
                        )));
                    }
                    self.finish_document();
                    return Ok(false);
                }
            }
        }
    }

    fn open_root(&mut self, name: String) {
        self.header.acknowledgement = name == self.schema.acknowledgement_root;
        self.header.root = name;
    }

    fn read_header_field(&mut self, element: &Element) {
        match element.name.as_str() {
            "mRID" => self.header.mrid = element.text_value().map(str::to_string),
            "type" => self.header.document_type = element.text_value().map(str::to_string),
            "process.processType" => {
                self.header.process_type = element.text_value().map(str::to_string)
            }
            "Reason" => {
                self.header.reason = element
                    .text_at(&["text"])
                    .or_else(|| element.text_at(&["code"]))
                    .map(str::to_string)
            }
            _ => {}
        }
    }

    fn finish_document(&mut self) {
        if self.header.acknowledgement {
            let reason = self
                .header
                .reason
                .clone()
                .unwrap_or_else(|| "no reason given".to_string());
            tracing::warn!(
                source = %self.context.source,
                reason = %reason,
                "Document is an acknowledgement, no data published"
            );
            self.stats
                .acknowledgements
                .push(format!("{}: {}", self.context.source, reason));
            return;
        }

        if let Some(ref document_type) = self.header.document_type {
            if !self.schema.accepts_document_type(document_type) {
                tracing::warn!(
                    source = %self.context.source,
                    document_type = %document_type,
                    expected = ?self.schema.document_types,
                    "Unexpected document type"
                );
            }
        }
    }

    /// Materializes the subtree of an element whose start tag was just read
    fn collect_element(&mut self, name: String) -> Result<Element> {
        let mut stack = vec![Element::new(name)];
        loop {
            match self.next_token()? {
                Token::Open(child) => stack.push(Element::new(child)),
                Token::Leaf(child) => {
                    if let Some(top) = stack.last_mut() {
                        top.children.push(Element::new(child));
                    }
                }
                Token::Text(text) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&text);
                    }
                }
                Token::Close => {
                    if let Some(done) = stack.pop() {
                        match stack.last_mut() {
                            Some(parent) => parent.children.push(done),
                            None => return Ok(done),
                        }
                    }
                }
                Token::Eof => {
                    let open = stack.first().map(|e| e.name.as_str()).unwrap_or("?");
                    return Err(EtlError::Parse(format!(
                        "{}: unexpected end of document inside <{}>",
                        self.context.source, open
                    )));
                }
                Token::Other => {}
            }
        }
    }

    fn skip_series(&mut self, reason: SkipReason) {
        tracing::warn!(
            source = %self.context.source,
            series = self.series_index,
            reason = %reason,
            "Skipping series"
        );
        self.stats.series_skipped += 1;
        self.stats.record_skip(reason);
    }

    fn skip_period(&mut self, period: usize, reason: SkipReason) {
        tracing::warn!(
            source = %self.context.source,
            series = self.series_index,
            period,
            reason = %reason,
            "Skipping period"
        );
        self.stats.periods_skipped += 1;
        self.stats.record_skip(reason);
    }

    fn skip_point(&mut self, period: usize, point: usize, reason: SkipReason) {
        tracing::warn!(
            source = %self.context.source,
            series = self.series_index,
            period,
            point,
            reason = %reason,
            "Skipping point"
        );
        self.stats.points_skipped += 1;
        self.stats.record_skip(reason);
    }

    fn process_series(&mut self, series: &Element) {
        self.series_index += 1;
        self.stats.series_seen += 1;
        let schema = self.schema;

        let bidding_zone = schema
            .zone_tags
            .iter()
            .find_map(|tag| series.text_at(&[*tag]))
            .and_then(|raw| match BiddingZone::new(raw) {
                Ok(zone) => Some(zone),
                Err(e) => {
                    tracing::debug!(source = %self.context.source, error = %e, "Ignoring bidding zone");
                    None
                }
            });

        if bidding_zone.is_none()
            && schema
                .excluded_zone_tags
                .iter()
                .any(|tag| series.text_at(&[*tag]).is_some())
        {
            self.skip_series(SkipReason::ConsumptionSeries);
            return;
        }

        let psr_type = series
            .text_at(schema.psr_type_path)
            .and_then(|raw| PsrType::new(raw).ok());
        if schema.psr_type_required && psr_type.is_none() {
            self.skip_series(SkipReason::MissingProductionType);
            return;
        }

        let mut usable_periods = 0;
        for (period_index, period) in series.children_named(schema.period_tag).enumerate() {
            let period_index = period_index + 1;

            let start = match series_start(period, schema.start_path) {
                Some(start) => start,
                None => {
                    self.skip_period(period_index, SkipReason::InvalidPeriodStart);
                    continue;
                }
            };
            let resolution = match period
                .text_at(&[schema.resolution_tag])
                .and_then(|raw| raw.parse::<Resolution>().ok())
            {
                Some(resolution) => resolution,
                None => {
                    self.skip_period(period_index, SkipReason::InvalidResolution);
                    continue;
                }
            };
            usable_periods += 1;

            for (point_index, point) in period.children_named(schema.point_tag).enumerate() {
                match read_point(point, schema, start, resolution) {
                    Ok((position, value)) => {
                        self.stats.records += 1;
                        self.pending.push_back(Record {
                            country: self.context.country.clone(),
                            bidding_zone: bidding_zone.clone(),
                            category: schema.category,
                            psr_type: psr_type.clone(),
                            start_time: start,
                            resolution,
                            position,
                            value,
                        });
                    }
                    Err(reason) => self.skip_point(period_index, point_index + 1, reason),
                }
            }
        }

        if usable_periods == 0 {
            self.skip_series(SkipReason::NoUsablePeriod);
        }
    }
}

impl Iterator for RecordStream {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(Ok(record));
            }
            if self.finished {
                return None;
            }
            match self.advance() {
                Ok(true) => {}
                Ok(false) => {
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

fn series_start(period: &Element, path: &[&str]) -> Option<DateTime<Utc>> {
    period.text_at(path).and_then(|raw| parse_instant(raw).ok())
}

/// Position and value of a point, or why it is unusable
fn read_point(
    point: &Element,
    schema: &DocumentSchema,
    start: DateTime<Utc>,
    resolution: Resolution,
) -> std::result::Result<(u32, f64), SkipReason> {
    let explicit_position = match point.text_at(&[schema.position_tag]) {
        Some(raw) => match raw.parse::<u32>() {
            Ok(position) if position >= 1 => Some(position),
            _ => return Err(SkipReason::InvalidPosition),
        },
        None => None,
    };

    let timestamp_position = match schema.timestamp_tag.and_then(|tag| point.text_at(&[tag])) {
        Some(raw) => {
            let instant = parse_instant(raw).map_err(|_| SkipReason::InvalidTimestamp)?;
            Some(
                resolution
                    .position_of(start, instant)
                    .ok_or(SkipReason::InvalidTimestamp)?,
            )
        }
        None => None,
    };

    let position = match (explicit_position, timestamp_position) {
        (Some(explicit), Some(derived)) if explicit != derived => {
            return Err(SkipReason::PositionMismatch)
        }
        (Some(position), _) | (None, Some(position)) => position,
        (None, None) => return Err(SkipReason::MissingPosition),
    };
    if resolution.timestamp(start, position).is_none() {
        return Err(SkipReason::InvalidPosition);
    }

    let raw_value = schema
        .value_tags
        .iter()
        .find_map(|tag| point.text_at(&[*tag]))
        .ok_or(SkipReason::MissingValue)?;
    let value = raw_value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(SkipReason::InvalidValue)?;

    Ok((position, value))
}

fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

/// Owned XML event, detached from the read buffer
enum Token {
    Open(String),
    Leaf(String),
    Close,
    Text(String),
    Eof,
    Other,
}

/// Minimal element tree for one series subtree
#[derive(Debug, Default)]
struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn new(name: String) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed, non-empty text of this element
    fn text_value(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }

    /// Trimmed, non-empty text at a path of child names
    fn text_at(&self, path: &[&str]) -> Option<&str> {
        let mut current = self;
        for name in path {
            current = current.child(name)?;
        }
        current.text_value()
    }
}
