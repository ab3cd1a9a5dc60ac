//! Dangerous file signatures and embedded-script markers.
//!
//! These are cheap heuristics over a fixed-size prefix, not a format parser.
//! False positives are acceptable; the goal is fast rejection of payloads
//! that are obviously not media.

/// How many leading bytes the signature check reads.
pub const SIGNATURE_PREFIX_LEN: usize = 512;

/// Binary signatures that should never appear at the start of a media file.
const DANGEROUS_SIGNATURES: &[(&[u8], &str)] = &[
    (&[0x4D, 0x5A], "Windows executable"),
    (&[0x7F, 0x45, 0x4C, 0x46], "Linux executable"),
    (&[0x50, 0x4B, 0x03, 0x04], "ZIP archive"),
    (&[0x52, 0x61, 0x72], "RAR archive"),
    (&[0x23, 0x21, 0x2F], "Shell script"),
];

/// Script/interpreter markers scanned for in the prefix decoded as text.
const SCRIPT_MARKERS: &[&str] = &["<?php", "<%", "<script", "bash", "python", "import os"];

/// Match the leading bytes against the dangerous-signature table.
pub fn match_dangerous_signature(prefix: &[u8]) -> Option<&'static str> {
    DANGEROUS_SIGNATURES
        .iter()
        .find(|(sig, _)| prefix.starts_with(sig))
        .map(|(_, desc)| *desc)
}

/// Scan the prefix, decoded lossily as text, for embedded script markers.
pub fn find_script_marker(prefix: &[u8]) -> Option<&'static str> {
    let text = String::from_utf8_lossy(prefix);
    SCRIPT_MARKERS
        .iter()
        .find(|marker| text.contains(*marker))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_windows_executable() {
        let prefix = b"MZ\x90\x00rest of header";
        assert_eq!(match_dangerous_signature(prefix), Some("Windows executable"));
    }

    #[test]
    fn detects_elf_and_shebang() {
        assert_eq!(
            match_dangerous_signature(b"\x7fELF\x02\x01"),
            Some("Linux executable")
        );
        assert_eq!(match_dangerous_signature(b"#!/bin/sh\n"), Some("Shell script"));
    }

    #[test]
    fn media_prefixes_pass() {
        // MP4 ftyp box and WebM EBML header
        assert_eq!(
            match_dangerous_signature(b"\x00\x00\x00\x18ftypmp42"),
            None
        );
        assert_eq!(match_dangerous_signature(b"\x1a\x45\xdf\xa3"), None);
    }

    #[test]
    fn finds_script_markers_in_text() {
        assert_eq!(find_script_marker(b"<?php echo 1; ?>"), Some("<?php"));
        assert_eq!(
            find_script_marker(b"\x00\x01<script>alert(1)</script>"),
            Some("<script")
        );
        assert_eq!(find_script_marker(b"\x00\x00\x00\x18ftypmp42"), None);
    }
}
