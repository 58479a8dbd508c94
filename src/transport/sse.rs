//! Incremental `text/event-stream` decoder.
//!
//! Bytes arrive in arbitrary chunks; [`SseDecoder::push`] buffers partial lines and
//! returns every message completed by the chunk.

/// One dispatched server-sent message
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SseMessage {
    /// `event:` field, if any
    pub event: Option<String>,
    /// Concatenated `data:` lines, joined by `\n`
    pub data: String,
    /// `id:` field, if any
    pub id: Option<String>,
}

impl SseMessage {
    /// Whether this is a default `message` event (no event name, or "message")
    pub fn is_message(&self) -> bool {
        matches!(self.event.as_deref(), None | Some("message"))
    }
}

/// Line-oriented SSE parser
#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    data: String,
    data_lines: usize,
    event: Option<String>,
    id: Option<String>,
    skip_lf: bool,
}

impl SseDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect the messages it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseMessage> {
        let mut out = Vec::new();

        for &byte in chunk {
            // A CR may be followed by LF in the next chunk
            if self.skip_lf {
                self.skip_lf = false;
                if byte == b'\n' {
                    continue;
                }
            }

            match byte {
                b'\n' => self.end_line(&mut out),
                b'\r' => {
                    self.end_line(&mut out);
                    self.skip_lf = true;
                }
                _ => self.line.push(byte),
            }
        }

        out
    }

    /// Discard an unterminated trailing message at end of stream
    pub fn finish(&mut self) {
        if !self.line.is_empty() || self.data_lines > 0 {
            tracing::debug!("dropping unterminated server-sent message");
        }
        self.line.clear();
        self.reset_message();
    }

    fn end_line(&mut self, out: &mut Vec<SseMessage>) {
        let line = String::from_utf8_lossy(&self.line).into_owned();
        self.line.clear();

        if line.is_empty() {
            if let Some(message) = self.dispatch() {
                out.push(message);
            }
            return;
        }

        // Comment / keep-alive
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line.as_str(), ""),
        };

        match field {
            "data" => {
                if self.data_lines > 0 {
                    self.data.push('\n');
                }
                self.data.push_str(value);
                self.data_lines += 1;
            }
            "event" => self.event = Some(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            // retry and unknown fields are ignored
            _ => {}
        }
    }

    fn dispatch(&mut self) -> Option<SseMessage> {
        if self.data_lines == 0 {
            self.reset_message();
            return None;
        }

        let message = SseMessage {
            event: self.event.take(),
            data: std::mem::take(&mut self.data),
            id: self.id.take(),
        };
        self.reset_message();
        Some(message)
    }

    fn reset_message(&mut self) {
        self.data.clear();
        self.data_lines = 0;
        self.event = None;
        self.id = None;
    }
}
