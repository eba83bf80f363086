use tracing::warn;

/// Incremental splitter for newline-delimited records.
///
/// Bytes are buffered until a `\n` arrives, so a record (or a multi-byte
/// character) split across network reads is only decoded once complete.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one network read and returns every line it completed.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = bytes;

        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            self.buffer.extend_from_slice(&rest[..pos]);
            rest = &rest[pos + 1..];

            let raw = std::mem::take(&mut self.buffer);
            if let Some(line) = decode_line(raw) {
                lines.push(line);
            }
        }

        self.buffer.extend_from_slice(rest);
        lines
    }

    /// Flushes an unterminated trailing record once the stream has ended.
    pub fn finish(&mut self) -> Option<String> {
        let raw = std::mem::take(&mut self.buffer);
        decode_line(raw)
    }

    /// Bytes held back waiting for a newline.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn decode_line(mut raw: Vec<u8>) -> Option<String> {
    if raw.last() == Some(&b'\r') {
        raw.pop();
    }

    let line = match String::from_utf8(raw) {
        Ok(line) => line,
        Err(err) => {
            warn!("Stream line is not valid UTF-8, decoding lossily: {}", err);
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    };

    if line.trim().is_empty() {
        None
    } else {
        Some(line)
    }
}
