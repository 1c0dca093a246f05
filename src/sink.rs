use std::io::Write;

use serde_json::Value;

use crate::error::FormatError;

/// Destination for a rendered reply: a chat channel, an HTTP response, stdout.
pub trait Sink {
    fn send(&mut self, text: String) -> Result<(), FormatError>;
    fn json(&mut self, value: Value) -> Result<(), FormatError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Json(Value),
}

/// Keeps every payload in memory, in write order.
#[derive(Debug, Default)]
pub struct Reply {
    pub payloads: Vec<Payload>,
}

impl Reply {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_text(&self) -> Option<&str> {
        match self.payloads.last() {
            Some(Payload::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn last_json(&self) -> Option<&Value> {
        match self.payloads.last() {
            Some(Payload::Json(value)) => Some(value),
            _ => None,
        }
    }
}

impl Sink for Reply {
    fn send(&mut self, text: String) -> Result<(), FormatError> {
        self.payloads.push(Payload::Text(text));
        Ok(())
    }

    fn json(&mut self, value: Value) -> Result<(), FormatError> {
        self.payloads.push(Payload::Json(value));
        Ok(())
    }
}

/// Writes text as a single line and JSON pretty-printed.
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        WriterSink { writer }
    }
}

impl<W: Write> Sink for WriterSink<W> {
    fn send(&mut self, text: String) -> Result<(), FormatError> {
        writeln!(self.writer, "{text}")?;
        self.writer.flush()?;
        Ok(())
    }

    fn json(&mut self, value: Value) -> Result<(), FormatError> {
        serde_json::to_writer_pretty(&mut self.writer, &value)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reply_records_in_order() {
        let mut reply = Reply::new();
        reply.send("hello".to_string()).unwrap();
        reply.json(json!({ "error": "nope" })).unwrap();

        assert_eq!(reply.payloads.len(), 2);
        assert_eq!(reply.payloads[0], Payload::Text("hello".to_string()));
        assert_eq!(reply.last_json(), Some(&json!({ "error": "nope" })));
        assert_eq!(reply.last_text(), None);
    }

    #[test]
    fn test_writer_sink_text_line() {
        let mut buf = Vec::new();
        {
            let mut sink = WriterSink::new(&mut buf);
            sink.send("Alice is rank 1".to_string()).unwrap();
            sink.send("Bob is unranked in Ranked 1v1".to_string()).unwrap();
        }
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Alice is rank 1\nBob is unranked in Ranked 1v1\n"
        );
    }

    #[test]
    fn test_writer_sink_json() {
        let mut buf = Vec::new();
        WriterSink::new(&mut buf)
            .json(json!({ "error": "Player not found" }))
            .unwrap();
        let written = String::from_utf8(buf).unwrap();
        assert_eq!(written, "{\n  \"error\": \"Player not found\"\n}\n");
    }
}
