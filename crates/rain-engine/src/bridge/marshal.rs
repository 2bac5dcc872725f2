use std::ops::Deref;

use crate::script::Value;

/// Inbound text, copied out of the runtime's string into native memory.
///
/// Lives only for the duration of one internal call. Invalid UTF-8 is
/// replaced rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchText {
    buf: String,
}

impl ScratchText {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let buf = String::from_utf8_lossy(bytes).into_owned();
        if buf.len() != bytes.len() {
            log::debug!("inbound text was not valid UTF-8; replaced invalid sequences");
        }
        Self { buf }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.buf
    }
}

impl Deref for ScratchText {
    type Target = str;

    fn deref(&self) -> &str {
        &self.buf
    }
}

/// Outbound text. The runtime glue turns it into one of its own strings.
pub fn text_out(text: &str) -> Value {
    Value::Text(text.as_bytes().to_vec())
}
