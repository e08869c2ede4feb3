use crate::error::WireError;

/// Appends typed primitives to a flat payload buffer.
///
/// Field order is the only schema — callers must encode and decode in the
/// same sequence. See module docs on [`crate`] for the framing contract.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_ne_bytes());
        self
    }

    pub fn i64(&mut self, v: i64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_ne_bytes());
        self
    }

    pub fn bool(&mut self, v: bool) -> &mut Self {
        self.buf.push(v as u8);
        self
    }

    pub fn size(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_ne_bytes());
        self
    }

    pub fn string(&mut self, v: &str) -> &mut Self {
        self.bytes(v.as_bytes())
    }

    pub fn bytes(&mut self, v: &[u8]) -> &mut Self {
        self.size(v.len() as u64);
        self.buf.extend_from_slice(v);
        self
    }

    /// Encodes a homogeneous sequence: a `size` count followed by each
    /// element written by `write_elem`.
    pub fn seq<T>(&mut self, items: &[T], mut write_elem: impl FnMut(&mut Self, &T)) -> &mut Self {
        self.size(items.len() as u64);
        for item in items {
            write_elem(self, item);
        }
        self
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads typed primitives back out of a flat payload buffer, in the same
/// order they were encoded.
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        let remaining = self.buf.len() - self.pos;
        if n > remaining {
            return Err(WireError::ShortRead { expected: n, got: remaining });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn i32(&mut self) -> Result<i32, WireError> {
        let bytes: [u8; 4] = self.take(4)?.try_into().expect("length checked above");
        Ok(i32::from_ne_bytes(bytes))
    }

    pub fn i64(&mut self) -> Result<i64, WireError> {
        let bytes: [u8; 8] = self.take(8)?.try_into().expect("length checked above");
        Ok(i64::from_ne_bytes(bytes))
    }

    pub fn bool(&mut self) -> Result<bool, WireError> {
        let b = self.take(1)?[0];
        match b {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(WireError::protocol(format!("invalid bool byte {other}"))),
        }
    }

    pub fn size(&mut self) -> Result<u64, WireError> {
        let bytes: [u8; 8] = self.take(8)?.try_into().expect("length checked above");
        Ok(u64::from_ne_bytes(bytes))
    }

    pub fn string(&mut self) -> Result<String, WireError> {
        let bytes = self.bytes()?;
        String::from_utf8(bytes).map_err(|e| WireError::protocol(format!("invalid utf-8 string: {e}")))
    }

    pub fn bytes(&mut self) -> Result<Vec<u8>, WireError> {
        let len = self.size()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    /// Reads a homogeneous sequence: a `size` count followed by that many
    /// elements produced by `read_elem`.
    pub fn seq<T>(&mut self, mut read_elem: impl FnMut(&mut Self) -> Result<T, WireError>) -> Result<Vec<T>, WireError> {
        let len = self.size()? as usize;
        let mut out = Vec::with_capacity(len.min(1 << 16));
        for _ in 0..len {
            out.push(read_elem(self)?);
        }
        Ok(out)
    }

    /// True once every byte of the payload has been consumed. Callers that
    /// expect a fully-consumed frame should check this after decoding a
    /// record to catch trailing garbage as a protocol error.
    pub fn is_exhausted(&self) -> bool {
        self.pos == self.buf.len()
    }
}
