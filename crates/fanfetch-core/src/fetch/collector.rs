//! In-memory body collector for one transfer.

/// Buffers the response body; reset whenever a new status line arrives so a
/// redirect's body never leaks into the payload.
#[derive(Debug, Default)]
pub struct Collector {
    body: Vec<u8>,
}

impl Collector {
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn take_body(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.body)
    }
}

impl curl::easy::Handler for Collector {
    fn header(&mut self, data: &[u8]) -> bool {
        if data.starts_with(b"HTTP/") {
            self.body.clear();
        }
        true
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, curl::easy::WriteError> {
        self.body.extend_from_slice(data);
        Ok(data.len())
    }
}
