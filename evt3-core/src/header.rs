//! ASCII header of `.raw` recordings.
//!
//! Recordings written by Prophesee tools start with lines of the form
//! `% key value`, terminated by `% end` or by the first line that is not a
//! header line. The event words follow immediately.
//!
//! A header line is `%` followed by either nothing or a space and printable
//! ASCII, ending in `\n`. Event words whose low byte is `0x25` therefore only
//! pass for a header when the bytes after them happen to form such a line.

use crate::types::SensorMetadata;
use log::{debug, warn};

/// Fields recovered from a recording header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHeader {
    /// Geometry from `% format ...;width=W;height=H` or `% geometry WxH`.
    pub geometry: Option<SensorMetadata>,
    /// Format version from `% evt X.Y`.
    pub evt_version: Option<String>,
    /// Number of header bytes, i.e. the offset of the first event word.
    pub len: usize,
}

impl RawHeader {
    /// Header geometry, or `fallback` when the header did not carry one.
    pub fn geometry_or(&self, fallback: SensorMetadata) -> SensorMetadata {
        self.geometry.unwrap_or(fallback)
    }

    fn parse_line(&mut self, line: &str) {
        let line = line.trim_end();

        if let Some(format_str) = line.strip_prefix("% format ") {
            // Format: "% format EVT3;width=1280;height=720"
            let mut geometry = self.geometry.unwrap_or_default();
            let mut seen = false;
            for part in format_str.split(';') {
                if let Some((name, value)) = part.split_once('=') {
                    match (name, value.parse::<u32>()) {
                        ("width", Ok(w)) => {
                            geometry.width = w;
                            seen = true;
                        }
                        ("height", Ok(h)) => {
                            geometry.height = h;
                            seen = true;
                        }
                        _ => {}
                    }
                }
            }
            if seen {
                debug!("header format geometry {}x{}", geometry.width, geometry.height);
                self.geometry = Some(geometry);
            }
        } else if let Some(geometry_str) = line.strip_prefix("% geometry ") {
            // Format: "% geometry 1280x720"
            if let Some((w, h)) = geometry_str.split_once('x') {
                if let (Ok(width), Ok(height)) = (w.trim().parse::<u32>(), h.trim().parse::<u32>()) {
                    debug!("header geometry {}x{}", width, height);
                    self.geometry = Some(SensorMetadata::new(width, height));
                }
            }
        } else if let Some(version) = line.strip_prefix("% evt ") {
            let version = version.trim();
            if version != "3.0" {
                warn!("recording declares evt {}, decoding as EVT 3.0", version);
            }
            self.evt_version = Some(version.to_string());
        }
    }
}

/// Splits a recording into its header and the event-word region.
///
/// Input without a header yields a default [`RawHeader`] with `len == 0` and
/// the whole buffer as event data.
pub fn split_header(bytes: &[u8]) -> (RawHeader, &[u8]) {
    let mut header = RawHeader::default();
    let mut pos = 0;

    while let Some(len) = header_line_len(&bytes[pos..]) {
        let line = String::from_utf8_lossy(&bytes[pos..pos + len]);
        pos += len;

        if line.starts_with("% end") {
            break;
        }
        header.parse_line(&line);
    }

    header.len = pos;
    (header, &bytes[pos..])
}

/// Length of the header line at the start of `bytes`, including its `\n`.
fn header_line_len(bytes: &[u8]) -> Option<usize> {
    if !(bytes.starts_with(b"% ") || bytes.starts_with(b"%\n") || bytes.starts_with(b"%\r\n")) {
        return None;
    }
    let end = bytes.iter().position(|&b| !is_header_text(b))?;
    (bytes[end] == b'\n').then_some(end + 1)
}

#[inline]
fn is_header_text(b: u8) -> bool {
    b == b'\t' || b == b'\r' || (0x20..0x7F).contains(&b)
}
