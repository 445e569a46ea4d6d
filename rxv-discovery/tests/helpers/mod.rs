//! Test helpers for fixture-based integration tests

use std::fs;
use std::path::PathBuf;

/// A captured receiver description document
#[derive(Debug, Clone)]
pub struct DeviceFixture {
    pub name: String,
    pub xml_content: String,
}

impl DeviceFixture {
    /// Load a fixture from the fixtures directory
    pub fn load(filename: &str) -> Self {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("tests/fixtures");
        path.push(filename);

        let xml_content = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", filename, e));

        Self {
            name: filename.to_string(),
            xml_content,
        }
    }

    /// Serve this fixture from a mock HTTP server, returning the location URL
    pub fn serve(&self, server: &mut mockito::ServerGuard, path: &str) -> (String, mockito::Mock) {
        let mock = server
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", "text/xml; charset=\"utf-8\"")
            .with_body(&self.xml_content)
            .create();

        (format!("{}{}", server.url(), path), mock)
    }
}
