//! Server-Sent Events (SSE) decoder.
//!
//! Buffers incoming bytes and extracts complete SSE `data:` payloads.
//! Handles events split across chunks, multiple events in one chunk, and a
//! final event without a trailing newline.

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push incoming bytes and extract complete `data:` payloads.
    ///
    /// Incomplete events remain buffered for the next `push()` or `finish()`.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        // Lossy UTF-8 conversion keeps the decoder robust against a chunk
        // boundary landing inside a multi-byte character.
        self.buffer.push_str(&String::from_utf8_lossy(bytes));

        let mut payloads = Vec::new();

        while let Some(newline_pos) = self.buffer.find('\n') {
            let line = self.buffer[..newline_pos].trim().to_string();
            self.buffer.drain(..=newline_pos);

            if line.is_empty() {
                continue;
            }

            if let Some(payload) = line.strip_prefix("data:") {
                payloads.push(payload.trim().to_string());
            }
        }

        payloads
    }

    /// Flush remaining buffered content once the stream ends, extracting a
    /// final event that lacked its trailing newline.
    pub fn finish(&mut self) -> Vec<String> {
        let mut payloads = Vec::new();

        for line in self.buffer.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(payload) = line.strip_prefix("data:") {
                payloads.push(payload.trim().to_string());
            }
        }

        self.buffer.clear();
        payloads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_event_in_one_chunk() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b"data: {\"hello\":\"world\"}\n\n");
        assert_eq!(payloads, vec!["{\"hello\":\"world\"}"]);
    }

    #[test]
    fn multiple_events_in_one_chunk() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b"data: {\"a\":1}\n\ndata: {\"b\":2}\n\n");
        assert_eq!(payloads, vec!["{\"a\":1}", "{\"b\":2}"]);
    }

    #[test]
    fn event_split_across_chunks() {
        let mut decoder = SseDecoder::new();

        assert!(decoder.push(b"data: {\"text\":\"hel").is_empty());
        assert_eq!(decoder.push(b"lo\"}\n\n"), vec!["{\"text\":\"hello\"}"]);
    }

    #[test]
    fn finish_flushes_event_without_trailing_newline() {
        let mut decoder = SseDecoder::new();

        assert!(decoder.push(b"data: [DONE]").is_empty());
        assert_eq!(decoder.finish(), vec!["[DONE]"]);
        // The buffer is cleared; a second finish yields nothing.
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn comments_and_other_fields_are_skipped() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b": keep-alive\nevent: message\ndata: {\"x\":1}\n\n");
        assert_eq!(payloads, vec!["{\"x\":1}"]);
    }
}
