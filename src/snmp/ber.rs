//! SNMP message codec (BER subset used by SNMPv1/v2c)
//!
//! Covers exactly what a read-only table walk needs: the message envelope,
//! the GetNext/GetResponse PDUs and the application value types an agent
//! may return for a varbind. Lengths are definite; indefinite form is
//! rejected.

use thiserror::Error;

use super::oid::Oid;

const TAG_INTEGER: u8 = 0x02;
const TAG_OCTET_STRING: u8 = 0x04;
const TAG_NULL: u8 = 0x05;
const TAG_OBJECT_ID: u8 = 0x06;
const TAG_SEQUENCE: u8 = 0x30;
const TAG_IP_ADDRESS: u8 = 0x40;
const TAG_COUNTER32: u8 = 0x41;
const TAG_GAUGE32: u8 = 0x42;
const TAG_TIME_TICKS: u8 = 0x43;
const TAG_OPAQUE: u8 = 0x44;
const TAG_COUNTER64: u8 = 0x46;
const TAG_NO_SUCH_OBJECT: u8 = 0x80;
const TAG_NO_SUCH_INSTANCE: u8 = 0x81;
const TAG_END_OF_MIB_VIEW: u8 = 0x82;

/// SNMPv1 on the wire
pub const VERSION_1: i64 = 0;

/// v1 error-status for "no object beyond this one"
pub const ERROR_NO_SUCH_NAME: i64 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BerError {
    #[error("message truncated at byte {0}")]
    Truncated(usize),

    #[error("expected tag 0x{expected:02x}, found 0x{found:02x}")]
    UnexpectedTag { expected: u8, found: u8 },

    #[error("unsupported value tag 0x{0:02x}")]
    UnsupportedTag(u8),

    #[error("unsupported PDU tag 0x{0:02x}")]
    UnsupportedPdu(u8),

    #[error("invalid length encoding")]
    InvalidLength,

    #[error("integer does not fit in 64 bits")]
    IntegerOverflow,

    #[error("malformed object identifier")]
    InvalidOid,

    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),
}

/// A varbind value as returned by an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnmpValue {
    Integer(i64),
    OctetString(Vec<u8>),
    Null,
    ObjectIdentifier(Oid),
    IpAddress([u8; 4]),
    Counter32(u32),
    Gauge32(u32),
    TimeTicks(u32),
    Opaque(Vec<u8>),
    Counter64(u64),
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
}

impl SnmpValue {
    /// v2 exception values; any of these ends a walk.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            SnmpValue::NoSuchObject | SnmpValue::NoSuchInstance | SnmpValue::EndOfMibView
        )
    }

    /// A strictly positive table index carried in an integer-typed value.
    pub fn as_index(&self) -> Option<u32> {
        match self {
            SnmpValue::Integer(v) => u32::try_from(*v).ok().filter(|v| *v > 0),
            SnmpValue::Gauge32(v) | SnmpValue::Counter32(v) => Some(*v).filter(|v| *v > 0),
            _ => None,
        }
    }

    /// Display string for an OCTET STRING, decoded lossily.
    pub fn as_text(&self) -> Option<String> {
        match self {
            SnmpValue::OctetString(bytes) => {
                let text = String::from_utf8_lossy(bytes);
                Some(text.trim_end_matches('\0').to_string())
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBind {
    pub oid: Oid,
    pub value: SnmpValue,
}

impl VarBind {
    pub fn new(oid: Oid, value: SnmpValue) -> Self {
        Self { oid, value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PduKind {
    GetRequest,
    GetNextRequest,
    GetResponse,
}

impl PduKind {
    fn tag(self) -> u8 {
        match self {
            PduKind::GetRequest => 0xa0,
            PduKind::GetNextRequest => 0xa1,
            PduKind::GetResponse => 0xa2,
        }
    }

    fn from_tag(tag: u8) -> Result<Self, BerError> {
        match tag {
            0xa0 => Ok(PduKind::GetRequest),
            0xa1 => Ok(PduKind::GetNextRequest),
            0xa2 => Ok(PduKind::GetResponse),
            other => Err(BerError::UnsupportedPdu(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pdu {
    pub kind: PduKind,
    pub request_id: i32,
    pub error_status: i64,
    pub error_index: i64,
    pub varbinds: Vec<VarBind>,
}

/// One SNMP message: version, community and a single PDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub version: i64,
    pub community: Vec<u8>,
    pub pdu: Pdu,
}

impl Message {
    /// A v1 GetNextRequest for a single OID with a NULL value.
    pub fn get_next(community: &[u8], request_id: i32, oid: &Oid) -> Self {
        Self {
            version: VERSION_1,
            community: community.to_vec(),
            pdu: Pdu {
                kind: PduKind::GetNextRequest,
                request_id,
                error_status: 0,
                error_index: 0,
                varbinds: vec![VarBind::new(oid.clone(), SnmpValue::Null)],
            },
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, BerError> {
        let mut varbinds = Vec::new();
        for vb in &self.pdu.varbinds {
            let mut entry = Vec::new();
            put_tlv(&mut entry, TAG_OBJECT_ID, &encode_oid(&vb.oid)?);
            encode_value(&mut entry, &vb.value)?;
            put_tlv(&mut varbinds, TAG_SEQUENCE, &entry);
        }

        let mut pdu = Vec::new();
        put_tlv(&mut pdu, TAG_INTEGER, &encode_integer(i64::from(self.pdu.request_id)));
        put_tlv(&mut pdu, TAG_INTEGER, &encode_integer(self.pdu.error_status));
        put_tlv(&mut pdu, TAG_INTEGER, &encode_integer(self.pdu.error_index));
        put_tlv(&mut pdu, TAG_SEQUENCE, &varbinds);

        let mut body = Vec::new();
        put_tlv(&mut body, TAG_INTEGER, &encode_integer(self.version));
        put_tlv(&mut body, TAG_OCTET_STRING, &self.community);
        put_tlv(&mut body, self.pdu.kind.tag(), &pdu);

        let mut out = Vec::with_capacity(body.len() + 4);
        put_tlv(&mut out, TAG_SEQUENCE, &body);
        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, BerError> {
        let mut outer = Reader::new(bytes);
        let body = outer.expect(TAG_SEQUENCE)?;
        if !outer.is_empty() {
            return Err(BerError::TrailingBytes(outer.remaining()));
        }

        let mut body = Reader::new(body);
        let version = decode_integer(body.expect(TAG_INTEGER)?)?;
        let community = body.expect(TAG_OCTET_STRING)?.to_vec();
        let (pdu_tag, pdu_bytes) = body.read_tlv()?;
        let kind = PduKind::from_tag(pdu_tag)?;

        let mut pdu = Reader::new(pdu_bytes);
        let request_id = decode_integer(pdu.expect(TAG_INTEGER)?)?;
        let request_id = i32::try_from(request_id).map_err(|_| BerError::IntegerOverflow)?;
        let error_status = decode_integer(pdu.expect(TAG_INTEGER)?)?;
        let error_index = decode_integer(pdu.expect(TAG_INTEGER)?)?;

        let mut list = Reader::new(pdu.expect(TAG_SEQUENCE)?);
        let mut varbinds = Vec::new();
        while !list.is_empty() {
            let mut entry = Reader::new(list.expect(TAG_SEQUENCE)?);
            let oid = decode_oid(entry.expect(TAG_OBJECT_ID)?)?;
            let (tag, content) = entry.read_tlv()?;
            varbinds.push(VarBind::new(oid, decode_value(tag, content)?));
        }

        Ok(Self {
            version,
            community,
            pdu: Pdu {
                kind,
                request_id,
                error_status,
                error_index,
                varbinds,
            },
        })
    }
}

fn put_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    let significant = &bytes[skip..];
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(significant);
}

fn put_tlv(out: &mut Vec<u8>, tag: u8, content: &[u8]) {
    out.push(tag);
    put_length(out, content.len());
    out.extend_from_slice(content);
}

/// Minimal two's-complement big-endian form.
fn encode_integer(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xff && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

/// Unsigned application types get a leading zero when the top bit is set.
fn encode_unsigned(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count().min(7);
    let mut out = Vec::with_capacity(9);
    if bytes[skip] & 0x80 != 0 {
        out.push(0);
    }
    out.extend_from_slice(&bytes[skip..]);
    out
}

fn put_base128(out: &mut Vec<u8>, mut value: u32) {
    let mut groups = [0u8; 5];
    let mut n = 0;
    loop {
        groups[n] = (value & 0x7f) as u8;
        n += 1;
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let continuation = if i > 0 { 0x80 } else { 0 };
        out.push(groups[i] | continuation);
    }
}

fn encode_oid(oid: &Oid) -> Result<Vec<u8>, BerError> {
    let arcs = oid.arcs();
    if arcs.len() < 2 || arcs[0] > 2 || (arcs[0] < 2 && arcs[1] >= 40) {
        return Err(BerError::InvalidOid);
    }
    let first = arcs[0]
        .checked_mul(40)
        .and_then(|v| v.checked_add(arcs[1]))
        .ok_or(BerError::InvalidOid)?;

    let mut out = Vec::with_capacity(arcs.len() + 4);
    put_base128(&mut out, first);
    for arc in &arcs[2..] {
        put_base128(&mut out, *arc);
    }
    Ok(out)
}

fn encode_value(out: &mut Vec<u8>, value: &SnmpValue) -> Result<(), BerError> {
    match value {
        SnmpValue::Integer(v) => put_tlv(out, TAG_INTEGER, &encode_integer(*v)),
        SnmpValue::OctetString(bytes) => put_tlv(out, TAG_OCTET_STRING, bytes),
        SnmpValue::Null => put_tlv(out, TAG_NULL, &[]),
        SnmpValue::ObjectIdentifier(oid) => put_tlv(out, TAG_OBJECT_ID, &encode_oid(oid)?),
        SnmpValue::IpAddress(octets) => put_tlv(out, TAG_IP_ADDRESS, octets),
        SnmpValue::Counter32(v) => put_tlv(out, TAG_COUNTER32, &encode_unsigned(u64::from(*v))),
        SnmpValue::Gauge32(v) => put_tlv(out, TAG_GAUGE32, &encode_unsigned(u64::from(*v))),
        SnmpValue::TimeTicks(v) => put_tlv(out, TAG_TIME_TICKS, &encode_unsigned(u64::from(*v))),
        SnmpValue::Opaque(bytes) => put_tlv(out, TAG_OPAQUE, bytes),
        SnmpValue::Counter64(v) => put_tlv(out, TAG_COUNTER64, &encode_unsigned(*v)),
        SnmpValue::NoSuchObject => put_tlv(out, TAG_NO_SUCH_OBJECT, &[]),
        SnmpValue::NoSuchInstance => put_tlv(out, TAG_NO_SUCH_INSTANCE, &[]),
        SnmpValue::EndOfMibView => put_tlv(out, TAG_END_OF_MIB_VIEW, &[]),
    }
    Ok(())
}

fn decode_integer(content: &[u8]) -> Result<i64, BerError> {
    if content.is_empty() || content.len() > 8 {
        return Err(BerError::IntegerOverflow);
    }
    let negative = content[0] & 0x80 != 0;
    let mut value: i64 = if negative { -1 } else { 0 };
    for byte in content {
        value = (value << 8) | i64::from(*byte);
    }
    Ok(value)
}

fn decode_unsigned(content: &[u8]) -> Result<u64, BerError> {
    if content.is_empty() {
        return Err(BerError::IntegerOverflow);
    }
    let skip = content.iter().take_while(|b| **b == 0).count();
    let significant = &content[skip..];
    if significant.len() > 8 {
        return Err(BerError::IntegerOverflow);
    }
    Ok(significant
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte)))
}

fn decode_u32(content: &[u8]) -> Result<u32, BerError> {
    u32::try_from(decode_unsigned(content)?).map_err(|_| BerError::IntegerOverflow)
}

fn decode_oid(content: &[u8]) -> Result<Oid, BerError> {
    let mut subids = Vec::with_capacity(content.len() + 1);
    let mut current: u32 = 0;
    let mut pending = false;
    for byte in content {
        if current > (u32::MAX >> 7) {
            return Err(BerError::InvalidOid);
        }
        current = (current << 7) | u32::from(byte & 0x7f);
        pending = byte & 0x80 != 0;
        if !pending {
            subids.push(current);
            current = 0;
        }
    }
    if pending || subids.is_empty() {
        return Err(BerError::InvalidOid);
    }

    let first = subids[0];
    let (a, b) = match first {
        0..=39 => (0, first),
        40..=79 => (1, first - 40),
        _ => (2, first - 80),
    };
    let mut arcs = Vec::with_capacity(subids.len() + 1);
    arcs.push(a);
    arcs.push(b);
    arcs.extend_from_slice(&subids[1..]);
    Ok(Oid::new(arcs))
}

fn decode_value(tag: u8, content: &[u8]) -> Result<SnmpValue, BerError> {
    let value = match tag {
        TAG_INTEGER => SnmpValue::Integer(decode_integer(content)?),
        TAG_OCTET_STRING => SnmpValue::OctetString(content.to_vec()),
        TAG_NULL => SnmpValue::Null,
        TAG_OBJECT_ID => SnmpValue::ObjectIdentifier(decode_oid(content)?),
        TAG_IP_ADDRESS => {
            let octets: [u8; 4] = content.try_into().map_err(|_| BerError::InvalidLength)?;
            SnmpValue::IpAddress(octets)
        }
        TAG_COUNTER32 => SnmpValue::Counter32(decode_u32(content)?),
        TAG_GAUGE32 => SnmpValue::Gauge32(decode_u32(content)?),
        TAG_TIME_TICKS => SnmpValue::TimeTicks(decode_u32(content)?),
        TAG_OPAQUE => SnmpValue::Opaque(content.to_vec()),
        TAG_COUNTER64 => SnmpValue::Counter64(decode_unsigned(content)?),
        TAG_NO_SUCH_OBJECT => SnmpValue::NoSuchObject,
        TAG_NO_SUCH_INSTANCE => SnmpValue::NoSuchInstance,
        TAG_END_OF_MIB_VIEW => SnmpValue::EndOfMibView,
        other => return Err(BerError::UnsupportedTag(other)),
    };
    Ok(value)
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    fn byte(&mut self) -> Result<u8, BerError> {
        let b = *self.buf.get(self.pos).ok_or(BerError::Truncated(self.pos))?;
        self.pos += 1;
        Ok(b)
    }

    fn length(&mut self) -> Result<usize, BerError> {
        let first = self.byte()?;
        if first < 0x80 {
            return Ok(usize::from(first));
        }
        let count = usize::from(first & 0x7f);
        if count == 0 || count > std::mem::size_of::<u32>() {
            return Err(BerError::InvalidLength);
        }
        let mut len = 0usize;
        for _ in 0..count {
            len = (len << 8) | usize::from(self.byte()?);
        }
        Ok(len)
    }

    fn read_tlv(&mut self) -> Result<(u8, &'a [u8]), BerError> {
        let tag = self.byte()?;
        let len = self.length()?;
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or(BerError::Truncated(self.buf.len()))?;
        let content = &self.buf[self.pos..end];
        self.pos = end;
        Ok((tag, content))
    }

    fn expect(&mut self, expected: u8) -> Result<&'a [u8], BerError> {
        let (found, content) = self.read_tlv()?;
        if found != expected {
            return Err(BerError::UnexpectedTag { expected, found });
        }
        Ok(content)
    }
}
