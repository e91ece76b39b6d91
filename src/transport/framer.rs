// MIT License - Copyright (c) 2026 Peter Wright
// CRLF frame reassembly across partial TCP reads

use crate::constants::CRLF;

/// Buffers socket reads and emits every complete CRLF-terminated frame.
///
/// Whatever follows the last terminator in a chunk is carried over to the
/// next call.
#[derive(Debug, Default)]
pub struct Framer {
    tail: String,
}

impl Framer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk from the socket and return the frames it completed, in
    /// order, without their terminators.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.tail.push_str(&String::from_utf8_lossy(bytes));

        let mut frames: Vec<String> = self.tail.split(CRLF).map(str::to_string).collect();
        // The last element is either "" (chunk ended on a terminator) or an
        // incomplete frame.
        self.tail = frames.pop().unwrap_or_default();
        frames.retain(|f| !f.is_empty());
        frames
    }

    /// Whether an incomplete frame is currently buffered.
    pub fn has_partial(&self) -> bool {
        !self.tail.is_empty()
    }

    /// Consume the framer at end of stream, returning any incomplete frame
    /// that was still buffered.
    pub fn finish(self) -> Option<String> {
        if self.tail.is_empty() {
            None
        } else {
            Some(self.tail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reassembles_split_frame() {
        let mut framer = Framer::new();
        assert!(framer.feed(b"005use").is_empty());
        assert!(framer.has_partial());

        let frames = framer.feed(b"r54\r\n");
        assert_eq!(frames, vec!["005user54".to_string()]);
        assert!(!framer.has_partial());
    }

    #[test]
    fn test_multiple_frames_in_one_chunk() {
        let mut framer = Framer::new();
        let frames = framer.feed(b"5053CD\r\n60900130\r\n");
        assert_eq!(frames, vec!["5053CD".to_string(), "60900130".to_string()]);
    }

    #[test]
    fn test_terminator_split_across_reads() {
        let mut framer = Framer::new();
        assert!(framer.feed(b"5053CD\r").is_empty());
        let frames = framer.feed(b"\n609");
        assert_eq!(frames, vec!["5053CD".to_string()]);
        assert!(framer.has_partial());
    }

    #[test]
    fn test_finish_returns_partial_tail() {
        let mut framer = Framer::new();
        let frames = framer.feed(b"5053CD\r\n6090");
        assert_eq!(frames.len(), 1);
        assert_eq!(framer.finish(), Some("6090".to_string()));
    }

    #[test]
    fn test_finish_clean() {
        let mut framer = Framer::new();
        framer.feed(b"5053CD\r\n");
        assert_eq!(framer.finish(), None);
    }
}
