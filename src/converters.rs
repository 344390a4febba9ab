//! Character set conversion capability
//!
//! Server text (notably error messages in call summaries) arrives in the
//! database character set. The session core does not know character sets;
//! a converter is supplied by the layer that negotiated one.

/// Decodes and encodes text in the session's negotiated character set
pub trait StringConverter: Send {
    /// Decode server bytes into a string
    fn decode(&self, input: &[u8]) -> String;

    /// Encode a string into server bytes
    fn encode(&self, input: &str) -> Vec<u8>;
}

/// Pass-through converter for single-byte ASCII-compatible character sets
#[derive(Debug, Default, Clone, Copy)]
pub struct AsciiConverter;

impl StringConverter for AsciiConverter {
    fn decode(&self, input: &[u8]) -> String {
        String::from_utf8_lossy(input).into_owned()
    }

    fn encode(&self, input: &str) -> Vec<u8> {
        input.as_bytes().to_vec()
    }
}
