//! Newline-delimited JSON framing over a chunked byte stream.
//!
//! Ollama emits one JSON object per line, but network chunks do not respect
//! line boundaries:
//! ```text
//! {"model":"gemma3:1b","response":"Hi","done":false}
//! {"model":"gemma3:1b","response":" there","done":false}
//! {"model":"gemma3:1b","response":"","done":true,"eval_count":2}
//! ```
//! Splitting happens on raw bytes so a UTF-8 sequence cut in half by the
//! transport is rejoined before decoding.

use std::collections::VecDeque;
use std::pin::Pin;

use futures::stream::{self, Stream, StreamExt};

/// Buffers partial lines across byte chunks.
#[derive(Debug, Default)]
pub struct LineSplitter {
    buf: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds bytes and returns every complete, non-blank line they finish.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        self.buf.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if !is_blank(&line) {
                lines.push(line);
            }
        }
        lines
    }

    /// Returns the trailing unterminated line, if it holds anything.
    pub fn finish(self) -> Option<Vec<u8>> {
        let mut line = self.buf;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        (!is_blank(&line)).then_some(line)
    }
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

struct LineState<S> {
    bytes: Pin<Box<S>>,
    splitter: LineSplitter,
    pending: VecDeque<Vec<u8>>,
    finished: bool,
}

/// Turns a fallible byte stream into a lazy stream of lines.
///
/// The sequence is finite and cannot be restarted. The first error from the
/// byte stream is yielded and ends it; a buffered partial line is dropped in
/// that case.
pub fn ndjson_lines<S, B, E>(bytes: S) -> impl Stream<Item = Result<Vec<u8>, E>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    let state = LineState {
        bytes: Box::pin(bytes),
        splitter: LineSplitter::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(line) = st.pending.pop_front() {
                return Some((Ok(line), st));
            }
            if st.finished {
                return None;
            }

            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    let lines = st.splitter.push(chunk.as_ref());
                    st.pending.extend(lines);
                }
                Some(Err(e)) => {
                    st.finished = true;
                    return Some((Err(e), st));
                }
                None => {
                    st.finished = true;
                    let rest = std::mem::take(&mut st.splitter).finish();
                    st.pending.extend(rest);
                }
            }
        }
    })
}
