// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Points and their InfluxDB Line Protocol encoding.
//!
//! Line Protocol format:
//! ```text
//! measurement,tag1=val1,tag2=val2 field1=val1,field2=val2 timestamp_ns
//! ```
//!
//! See: <https://docs.influxdata.com/influxdb/v1/write_protocols/line_protocol_reference/>

use std::collections::BTreeMap;

/// A numeric value stored in an InfluxDB field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    /// 64-bit floating point.
    Float(f64),
    /// 64-bit signed integer.
    Integer(i64),
}

impl FieldValue {
    /// Format this value for InfluxDB Line Protocol.
    ///
    /// - Float: shortest round-trip form (e.g., `3.14`, `2`)
    /// - Integer: suffixed with `i` (e.g., `42i`)
    pub fn to_line_protocol(&self) -> String {
        match self {
            FieldValue::Float(v) => format!("{}", v),
            FieldValue::Integer(v) => format!("{}i", v),
        }
    }

    /// NaN and infinities cannot be stored.
    pub fn is_writable(&self) -> bool {
        match self {
            FieldValue::Float(v) => v.is_finite(),
            FieldValue::Integer(_) => true,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            FieldValue::Float(v) => *v,
            FieldValue::Integer(v) => *v as f64,
        }
    }
}

/// One timestamped record destined for the time-series store.
///
/// Immutable once built. Tags and fields are kept sorted by key so the
/// encoded line is canonical.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    measurement: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
    timestamp_ns: u64,
}

impl Point {
    pub fn new(
        measurement: impl Into<String>,
        tags: BTreeMap<String, String>,
        fields: BTreeMap<String, FieldValue>,
        timestamp_ns: u64,
    ) -> Self {
        Self {
            measurement: measurement.into(),
            tags,
            fields,
            timestamp_ns,
        }
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<FieldValue> {
        self.fields.get(key).copied()
    }

    /// Nanoseconds since the Unix epoch.
    pub fn timestamp_ns(&self) -> u64 {
        self.timestamp_ns
    }

    /// Encode as a single Line Protocol line (no trailing newline).
    ///
    /// Returns `None` when no field is writable; InfluxDB requires at
    /// least one field per line. Tags with an empty key or value are
    /// left out, the store rejects them.
    pub fn to_line_protocol(&self) -> Option<String> {
        let mut fields = self.fields.iter().filter(|(_, v)| v.is_writable()).peekable();
        fields.peek()?;

        let mut line = escape_measurement(&self.measurement);

        let tags = self
            .tags
            .iter()
            .filter(|(k, v)| !k.is_empty() && !v.is_empty());
        for (key, value) in tags {
            line.push(',');
            line.push_str(&escape_key(key));
            line.push('=');
            line.push_str(&escape_key(value));
        }

        // Space separator before fields
        line.push(' ');

        for (i, (key, value)) in fields.enumerate() {
            if i > 0 {
                line.push(',');
            }
            line.push_str(&escape_key(key));
            line.push('=');
            line.push_str(&value.to_line_protocol());
        }

        // Space separator before timestamp
        line.push(' ');
        line.push_str(&self.timestamp_ns.to_string());

        Some(line)
    }
}

/// Builds a Line Protocol request body from points.
///
/// Points without writable fields are skipped.
#[derive(Debug, Default)]
pub struct LineProtocolWriter {
    body: String,
    lines: usize,
}

impl LineProtocolWriter {
    /// Create a new empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one point. Returns `false` if the point was skipped.
    pub fn write_point(&mut self, point: &Point) -> bool {
        let Some(line) = point.to_line_protocol() else {
            return false;
        };
        if self.lines > 0 {
            self.body.push('\n');
        }
        self.body.push_str(&line);
        self.lines += 1;
        true
    }

    /// Append every point of a batch. Returns how many were written.
    pub fn write_points(&mut self, points: &[Point]) -> usize {
        points.iter().filter(|p| self.write_point(p)).count()
    }

    /// Get the current number of encoded lines.
    pub fn len(&self) -> usize {
        self.lines
    }

    /// Check if nothing has been encoded.
    pub fn is_empty(&self) -> bool {
        self.lines == 0
    }

    /// Consume the writer, returning the newline-separated body.
    pub fn finish(self) -> String {
        self.body
    }
}

/// Escape measurement name for Line Protocol.
/// Spaces and commas must be escaped with backslash.
fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

/// Escape tag keys, tag values and field keys.
/// Commas, equals signs, and spaces must be escaped.
fn escape_key(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(
        measurement: &str,
        tags: &[(&str, &str)],
        fields: &[(&str, FieldValue)],
        ts: u64,
    ) -> Point {
        Point::new(
            measurement,
            tags.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            fields.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            ts,
        )
    }

    #[test]
    fn test_field_value_float() {
        assert_eq!(FieldValue::Float(3.15).to_line_protocol(), "3.15");
        assert_eq!(FieldValue::Float(2.0).to_line_protocol(), "2");
    }

    #[test]
    fn test_field_value_integer() {
        assert_eq!(FieldValue::Integer(42).to_line_protocol(), "42i");
        assert_eq!(FieldValue::Integer(-7).to_line_protocol(), "-7i");
    }

    #[test]
    fn test_field_value_writable() {
        assert!(FieldValue::Integer(0).is_writable());
        assert!(FieldValue::Float(1.5).is_writable());
        assert!(!FieldValue::Float(f64::NAN).is_writable());
        assert!(!FieldValue::Float(f64::INFINITY).is_writable());
    }

    #[test]
    fn test_line_protocol_simple_point() {
        let p = point(
            "temperature",
            &[],
            &[("value", FieldValue::Float(23.5))],
            1_000_000_000,
        );
        assert_eq!(
            p.to_line_protocol().as_deref(),
            Some("temperature value=23.5 1000000000")
        );
    }

    #[test]
    fn test_line_protocol_with_sorted_tags() {
        let p = point(
            "metrics",
            &[("host", "a"), ("bucket", "p99")],
            &[("rpc.timer", FieldValue::Float(12.5))],
            1_000_000_000,
        );
        assert_eq!(
            p.to_line_protocol().as_deref(),
            Some("metrics,bucket=p99,host=a rpc.timer=12.5 1000000000")
        );
    }

    #[test]
    fn test_line_protocol_skips_empty_tags() {
        let p = point(
            "app",
            &[("host", ""), ("", "orphan"), ("region", "eu")],
            &[("x.count", FieldValue::Integer(1))],
            1,
        );
        assert_eq!(
            p.to_line_protocol().as_deref(),
            Some("app,region=eu x.count=1i 1")
        );

        let only_empty = point(
            "app",
            &[("host", "")],
            &[("x.count", FieldValue::Integer(1))],
            1,
        );
        assert_eq!(
            only_empty.to_line_protocol().as_deref(),
            Some("app x.count=1i 1")
        );
    }

    #[test]
    fn test_line_protocol_escape_special_chars() {
        let p = point(
            "my measurement",
            &[("tag key", "tag,value")],
            &[("field=key", FieldValue::Integer(1))],
            3_000_000_000,
        );
        assert_eq!(
            p.to_line_protocol().as_deref(),
            Some("my\\ measurement,tag\\ key=tag\\,value field\\=key=1i 3000000000")
        );
    }

    #[test]
    fn test_line_protocol_drops_non_finite_fields() {
        let p = point(
            "m",
            &[],
            &[
                ("a", FieldValue::Float(f64::NAN)),
                ("b", FieldValue::Integer(3)),
            ],
            5,
        );
        assert_eq!(p.to_line_protocol().as_deref(), Some("m b=3i 5"));

        let empty = point("m", &[], &[("a", FieldValue::Float(f64::NAN))], 5);
        assert!(empty.to_line_protocol().is_none());
    }

    #[test]
    fn test_writer_joins_lines_and_skips_unwritable() {
        let mut writer = LineProtocolWriter::new();
        assert!(writer.is_empty());

        let written = writer.write_points(&[
            point("m", &[], &[("x.count", FieldValue::Integer(1))], 1),
            point("m", &[], &[("y.gauge", FieldValue::Float(f64::NAN))], 1),
            point("m", &[], &[("z.gauge", FieldValue::Float(0.5))], 1),
        ]);

        assert_eq!(written, 2);
        assert_eq!(writer.len(), 2);
        assert_eq!(writer.finish(), "m x.count=1i 1\nm z.gauge=0.5 1");
    }
}
