use serde::Deserialize;

/// Prefix marking a protocol data line in the chat/status streams.
pub const DATA_PREFIX: &str = "data: ";

/// Literal payload signaling that no further token fragments will arrive.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Shown in place of the assistant reply when the chat request fails.
pub const CHAT_ERROR_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

/// Splits an incremental byte stream into complete protocol lines.
///
/// A logical line can be split across two reads, so any trailing partial
/// line is buffered and prepended to the next chunk. Splitting happens on
/// raw bytes before UTF-8 decoding, which also keeps multi-byte characters
/// that straddle a read boundary intact.
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Feed one chunk of bytes, returning every line completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop(); // the newline itself
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Remaining partial line once the stream has ended, if any.
    pub fn finish(self) -> Option<String> {
        if self.buf.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.buf).into_owned())
        }
    }
}

/// One decoded line from the chat completion stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamLine {
    /// A token fragment to append to the pending assistant message.
    Token(String),
    /// The termination sentinel; never appended to message content.
    Done,
    /// Blank lines, non-data lines, and unparseable payloads.
    Ignored,
}

#[derive(Deserialize)]
struct TokenPayload {
    token: Option<String>,
}

/// Interpret a single protocol line. Payloads that fail to parse as JSON
/// are skipped rather than treated as fatal.
pub fn decode_line(line: &str) -> StreamLine {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return StreamLine::Ignored;
    };
    if payload == DONE_SENTINEL {
        return StreamLine::Done;
    }
    match serde_json::from_str::<TokenPayload>(payload) {
        Ok(TokenPayload { token: Some(token) }) => StreamLine::Token(token),
        Ok(TokenPayload { token: None }) => StreamLine::Ignored,
        Err(err) => {
            tracing::debug!("skipping unparseable stream line: {err}");
            StreamLine::Ignored
        }
    }
}

/// Updates published to the UI while a chat response streams in.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    Token(String),
    Done,
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run raw chunks through the framer + decoder the way the chat client
    /// does, folding tokens into an accumulator.
    fn collect(chunks: &[&[u8]]) -> (String, bool) {
        let mut framer = LineFramer::new();
        let mut content = String::new();
        let mut done = false;
        let mut apply = |line: &str, content: &mut String, done: &mut bool| match decode_line(line) {
            StreamLine::Token(token) => content.push_str(&token),
            StreamLine::Done => *done = true,
            StreamLine::Ignored => {}
        };
        for chunk in chunks {
            for line in framer.push(chunk) {
                apply(&line, &mut content, &mut done);
            }
        }
        if let Some(line) = framer.finish() {
            apply(&line, &mut content, &mut done);
        }
        (content, done)
    }

    #[test]
    fn test_framer_buffers_partial_line() {
        let mut framer = LineFramer::new();
        assert!(framer.push(b"data: {\"tok").is_empty());
        let lines = framer.push(b"en\":\"hi\"}\n");
        assert_eq!(lines, vec!["data: {\"token\":\"hi\"}"]);
    }

    #[test]
    fn test_framer_multiple_lines_in_one_chunk() {
        let mut framer = LineFramer::new();
        let lines = framer.push(b"first\nsecond\nthird");
        assert_eq!(lines, vec!["first", "second"]);
        assert_eq!(framer.finish(), Some("third".to_string()));
    }

    #[test]
    fn test_framer_strips_carriage_returns() {
        let mut framer = LineFramer::new();
        let lines = framer.push(b"a\r\nb\r\n");
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn test_framer_empty_stream_has_no_tail() {
        assert_eq!(LineFramer::new().finish(), None);
    }

    #[test]
    fn test_framer_keeps_multibyte_chars_split_across_reads() {
        let bytes = "data: {\"token\":\"caf\u{e9}\"}\n".as_bytes();
        // Split inside the two-byte encoding of 'é'.
        let (head, tail) = bytes.split_at(bytes.len() - 4);
        let (content, _) = collect(&[head, tail]);
        assert_eq!(content, "caf\u{e9}");
    }

    #[test]
    fn test_decode_token_line() {
        assert_eq!(
            decode_line("data: {\"token\":\"hello\"}"),
            StreamLine::Token("hello".to_string())
        );
    }

    #[test]
    fn test_decode_done_sentinel() {
        assert_eq!(decode_line("data: [DONE]"), StreamLine::Done);
    }

    #[test]
    fn test_decode_ignores_non_data_lines() {
        assert_eq!(decode_line(""), StreamLine::Ignored);
        assert_eq!(decode_line("event: ping"), StreamLine::Ignored);
        assert_eq!(decode_line(": heartbeat"), StreamLine::Ignored);
    }

    #[test]
    fn test_decode_ignores_bad_json() {
        assert_eq!(decode_line("data: {\"token\":"), StreamLine::Ignored);
        assert_eq!(decode_line("data: not json"), StreamLine::Ignored);
    }

    #[test]
    fn test_decode_ignores_payload_without_token() {
        assert_eq!(decode_line("data: {\"other\":1}"), StreamLine::Ignored);
    }

    #[test]
    fn test_fragments_concatenate_in_arrival_order() {
        let (content, done) = collect(&[
            b"data: {\"token\":\"You have \"}\n",
            b"data: {\"token\":\"3 workflows.\"}\n",
            b"data: [DONE]\n",
        ]);
        assert_eq!(content, "You have 3 workflows.");
        assert!(done);
    }

    #[test]
    fn test_sentinel_is_not_appended_to_content() {
        let (content, done) = collect(&[b"data: {\"token\":\"x\"}\ndata: [DONE]\n"]);
        assert_eq!(content, "x");
        assert!(done);
    }

    #[test]
    fn test_line_split_across_reads_is_not_corrupted() {
        let (content, done) = collect(&[b"data: {\"tok", b"en\":\"hello\"}\ndata: [DONE]\n"]);
        assert_eq!(content, "hello");
        assert!(done);
    }

    #[test]
    fn test_trailing_line_without_newline_still_counts() {
        let (content, _) = collect(&[b"data: {\"token\":\"tail\"}"]);
        assert_eq!(content, "tail");
    }
}
