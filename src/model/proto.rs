//! Protobuf encoding for querier wire types.
//!
//! This module provides manual prost::Message implementations for the
//! exemplar query messages to enable gRPC communication with storage
//! replicas without proto codegen.

use prost::{DecodeError, Message};

// ============================================================================
// Label
// ============================================================================

/// One (name, value) pair of a series label set.
#[derive(Clone, Default, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label {
    pub name: String,  // field 1
    pub value: String, // field 2
}

impl Label {
    /// Create a label from name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl Message for Label {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        if !self.name.is_empty() {
            prost::encoding::string::encode(1, &self.name, buf);
        }
        if !self.value.is_empty() {
            prost::encoding::string::encode(2, &self.value, buf);
        }
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => prost::encoding::string::merge(wire_type, &mut self.name, buf, ctx),
            2 => prost::encoding::string::merge(wire_type, &mut self.value, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        let mut len = 0;
        if !self.name.is_empty() {
            len += prost::encoding::string::encoded_len(1, &self.name);
        }
        if !self.value.is_empty() {
            len += prost::encoding::string::encoded_len(2, &self.value);
        }
        len
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// Exemplar
// ============================================================================

/// A single sampled data point attached to a series.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Exemplar {
    pub labels: Vec<Label>, // field 1
    pub value: f64,         // field 2
    pub timestamp_ms: i64,  // field 3
}

impl Message for Exemplar {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        prost::encoding::message::encode_repeated(1, &self.labels, buf);
        if self.value != 0.0 {
            prost::encoding::double::encode(2, &self.value, buf);
        }
        if self.timestamp_ms != 0 {
            prost::encoding::int64::encode(3, &self.timestamp_ms, buf);
        }
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => prost::encoding::message::merge_repeated(wire_type, &mut self.labels, buf, ctx),
            2 => prost::encoding::double::merge(wire_type, &mut self.value, buf, ctx),
            3 => prost::encoding::int64::merge(wire_type, &mut self.timestamp_ms, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        let mut len = prost::encoding::message::encoded_len_repeated(1, &self.labels);
        if self.value != 0.0 {
            len += prost::encoding::double::encoded_len(2, &self.value);
        }
        if self.timestamp_ms != 0 {
            len += prost::encoding::int64::encoded_len(3, &self.timestamp_ms);
        }
        len
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// TimeSeries
// ============================================================================

/// One identified time series with its exemplars.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct TimeSeries {
    pub labels: Vec<Label>,       // field 1
    pub exemplars: Vec<Exemplar>, // field 2
}

impl Message for TimeSeries {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        prost::encoding::message::encode_repeated(1, &self.labels, buf);
        prost::encoding::message::encode_repeated(2, &self.exemplars, buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => prost::encoding::message::merge_repeated(wire_type, &mut self.labels, buf, ctx),
            2 => {
                prost::encoding::message::merge_repeated(wire_type, &mut self.exemplars, buf, ctx)
            }
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        prost::encoding::message::encoded_len_repeated(1, &self.labels)
            + prost::encoding::message::encoded_len_repeated(2, &self.exemplars)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// LabelMatcher
// ============================================================================

/// Matcher kind for a label selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum MatchType {
    Equal = 0,
    NotEqual = 1,
    Regex = 2,
    NotRegex = 3,
}

impl Default for MatchType {
    fn default() -> Self {
        Self::Equal
    }
}

impl TryFrom<i32> for MatchType {
    type Error = DecodeError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Equal),
            1 => Ok(Self::NotEqual),
            2 => Ok(Self::Regex),
            3 => Ok(Self::NotRegex),
            _ => Err(DecodeError::new("invalid MatchType value")),
        }
    }
}

/// One label selector of an exemplar query.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct LabelMatcher {
    pub match_type: i32, // field 1 (MatchType)
    pub name: String,    // field 2
    pub value: String,   // field 3
}

impl Message for LabelMatcher {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        if self.match_type != 0 {
            prost::encoding::int32::encode(1, &self.match_type, buf);
        }
        if !self.name.is_empty() {
            prost::encoding::string::encode(2, &self.name, buf);
        }
        if !self.value.is_empty() {
            prost::encoding::string::encode(3, &self.value, buf);
        }
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => prost::encoding::int32::merge(wire_type, &mut self.match_type, buf, ctx),
            2 => prost::encoding::string::merge(wire_type, &mut self.name, buf, ctx),
            3 => prost::encoding::string::merge(wire_type, &mut self.value, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        let mut len = 0;
        if self.match_type != 0 {
            len += prost::encoding::int32::encoded_len(1, &self.match_type);
        }
        if !self.name.is_empty() {
            len += prost::encoding::string::encoded_len(2, &self.name);
        }
        if !self.value.is_empty() {
            len += prost::encoding::string::encoded_len(3, &self.value);
        }
        len
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// ExemplarQueryRequest
// ============================================================================

/// Exemplar query sent identically to every replica of a shard.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct ExemplarQueryRequest {
    pub start_timestamp_ms: i64,    // field 1
    pub end_timestamp_ms: i64,      // field 2
    pub matchers: Vec<LabelMatcher>, // field 3
}

impl Message for ExemplarQueryRequest {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        if self.start_timestamp_ms != 0 {
            prost::encoding::int64::encode(1, &self.start_timestamp_ms, buf);
        }
        if self.end_timestamp_ms != 0 {
            prost::encoding::int64::encode(2, &self.end_timestamp_ms, buf);
        }
        prost::encoding::message::encode_repeated(3, &self.matchers, buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => prost::encoding::int64::merge(wire_type, &mut self.start_timestamp_ms, buf, ctx),
            2 => prost::encoding::int64::merge(wire_type, &mut self.end_timestamp_ms, buf, ctx),
            3 => prost::encoding::message::merge_repeated(wire_type, &mut self.matchers, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        let mut len = 0;
        if self.start_timestamp_ms != 0 {
            len += prost::encoding::int64::encoded_len(1, &self.start_timestamp_ms);
        }
        if self.end_timestamp_ms != 0 {
            len += prost::encoding::int64::encoded_len(2, &self.end_timestamp_ms);
        }
        len += prost::encoding::message::encoded_len_repeated(3, &self.matchers);
        len
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// ExemplarQueryResponse
// ============================================================================

/// Per-replica answer to an exemplar query; also the shape of the merged
/// result handed back to the caller.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct ExemplarQueryResponse {
    pub timeseries: Vec<TimeSeries>, // field 1
}

impl Message for ExemplarQueryResponse {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        prost::encoding::message::encode_repeated(1, &self.timeseries, buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => {
                prost::encoding::message::merge_repeated(wire_type, &mut self.timeseries, buf, ctx)
            }
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        prost::encoding::message::encoded_len_repeated(1, &self.timeseries)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}
