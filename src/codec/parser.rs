// src/codec/parser.rs

//! Metadata file parser
//!
//! A simple state machine over section headers. All failures are fatal
//! to the current parse; a partial [`Patch`] is never returned.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::codec::{
    KEY_DEPENDENCIES, KEY_ONEOFF, KEY_ROLES, PATCHID_PREFIX, SECTION_CONTENT,
    SECTION_POST_COMMANDS, SECTION_PROPERTIES, VERSION_PREFIX,
};
use crate::error::{Error, Result};
use crate::patch::{Patch, PatchId, PatchMetadataBuilder, Record};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    None,
    Properties,
    Content,
    PostCommands,
    Unknown,
}

/// Parse a metadata file from disk
pub fn read_patch_file(path: &Path) -> Result<Patch> {
    let file = File::open(path)?;
    read_patch(BufReader::new(file))
}

/// Parse a metadata stream
pub fn read_patch<R: BufRead>(reader: R) -> Result<Patch> {
    let mut lines = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        lines.push((index + 1, line.trim().to_string()));
    }
    let mut iter = lines.into_iter().filter(|(_, line)| !line.is_empty());

    // The first two non-empty lines are the mandatory header
    let (_, version_line) = iter
        .next()
        .ok_or_else(|| Error::HeaderMissing("empty metadata file".to_string()))?;
    if !version_line.starts_with(VERSION_PREFIX) {
        return Err(Error::HeaderMissing(format!(
            "expected '{}' line, found: {}",
            VERSION_PREFIX, version_line
        )));
    }
    let (line_no, id_line) = iter
        .next()
        .ok_or_else(|| Error::HeaderMissing("missing patch id line".to_string()))?;
    if !id_line.starts_with(PATCHID_PREFIX) {
        return Err(Error::HeaderMissing(format!(
            "expected '{}' line, found: {}",
            PATCHID_PREFIX, id_line
        )));
    }
    let patch_id = PatchId::parse(id_line[PATCHID_PREFIX.len()..].trim())
        .map_err(|err| with_line(err, line_no))?;

    let mut builder = PatchMetadataBuilder::new(patch_id);
    let mut records = Vec::new();
    let mut section = Section::None;

    for (line_no, line) in iter {
        if line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            section = match line.as_str() {
                SECTION_PROPERTIES => Section::Properties,
                SECTION_CONTENT => Section::Content,
                SECTION_POST_COMMANDS => Section::PostCommands,
                _ => Section::Unknown,
            };
            continue;
        }
        match section {
            Section::Properties => {
                builder = parse_property(builder, &line).map_err(|err| with_line(err, line_no))?;
            }
            Section::Content => {
                let record: Record = line.parse().map_err(|err| with_line(err, line_no))?;
                records.push(record);
            }
            Section::PostCommands => {
                builder = builder.post_command(line);
            }
            // Bodies of unknown sections, and stray lines before the
            // first section header, are skipped
            Section::None | Section::Unknown => {}
        }
    }

    Patch::new(builder.build()?, records)
}

fn parse_property(builder: PatchMetadataBuilder, line: &str) -> Result<PatchMetadataBuilder> {
    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| Error::MalformedProperty(format!("expected 'Key: value': {}", line)))?;
    let key = key.trim();
    let value = value.trim();
    match key {
        KEY_ONEOFF => Ok(builder.oneoff(PatchId::parse(value)?)),
        KEY_ROLES => {
            let mut builder = builder;
            for token in value.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                builder = builder.role(token);
            }
            Ok(builder)
        }
        KEY_DEPENDENCIES => {
            let mut builder = builder;
            for token in value.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                builder = builder.dependency(PatchId::parse(token)?);
            }
            Ok(builder)
        }
        // Unknown keys are ignored for forward compatibility
        _ => Ok(builder),
    }
}

fn with_line(err: Error, line_no: usize) -> Error {
    match err {
        Error::MalformedId(msg) => Error::MalformedId(format!("line {}: {}", line_no, msg)),
        Error::MalformedRecord(msg) => Error::MalformedRecord(format!("line {}: {}", line_no, msg)),
        Error::MalformedProperty(msg) => {
            Error::MalformedProperty(format!("line {}: {}", line_no, msg))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::Action;

    fn parse(text: &str) -> Result<Patch> {
        read_patch(text.as_bytes())
    }

    #[test]
    fn test_parse_full_file() {
        let patch = parse(
            "# fusepatch: 0.1.0\n\
             # patch id: foo-1.0\n\
             \n\
             [properties]\n\
             Roles: admin, operator\n\
             Dependencies: bar-2.1, baz-1.0\n\
             \n\
             [content]\n\
             a/b.txt|ADD|3735928559\n\
             c/d.txt|UPD|17\n\
             \n\
             [post-install-commands]\n\
             echo hi\n",
        )
        .unwrap();
        assert_eq!(patch.patch_id().to_string(), "foo-1.0");
        assert_eq!(patch.metadata().roles(), &["admin", "operator"]);
        assert_eq!(patch.metadata().dependencies().len(), 2);
        assert_eq!(patch.record_count(), 2);
        assert_eq!(patch.record("a/b.txt").unwrap().crc(), 0xDEADBEEF);
        assert_eq!(patch.metadata().post_commands(), &["echo hi"]);
    }

    #[test]
    fn test_missing_version_line() {
        let result = parse("# patch id: foo-1.0\n");
        assert!(matches!(result, Err(Error::HeaderMissing(_))));
    }

    #[test]
    fn test_missing_patch_id_line() {
        let result = parse("# fusepatch: 0.1.0\n\n[content]\n");
        assert!(matches!(result, Err(Error::HeaderMissing(_))));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse(""), Err(Error::HeaderMissing(_))));
    }

    #[test]
    fn test_header_whitespace_tolerated() {
        let patch = parse("  # fusepatch:   0.1.0  \r\n  # patch id:   foo-1.0  \r\n").unwrap();
        assert_eq!(patch.patch_id().to_string(), "foo-1.0");
    }

    #[test]
    fn test_sections_in_any_order() {
        let patch = parse(
            "# fusepatch: 0.1.0\n\
             # patch id: foo-1.0\n\
             [post-install-commands]\n\
             echo hi\n\
             [content]\n\
             a.txt|ADD|1\n\
             [properties]\n\
             Roles: admin\n",
        )
        .unwrap();
        assert_eq!(patch.metadata().roles(), &["admin"]);
        assert_eq!(patch.record_count(), 1);
        assert_eq!(patch.metadata().post_commands(), &["echo hi"]);
    }

    #[test]
    fn test_repeated_sections_append() {
        let patch = parse(
            "# fusepatch: 0.1.0\n\
             # patch id: foo-1.0\n\
             [content]\n\
             a.txt|ADD|1\n\
             [properties]\n\
             Roles: admin\n\
             [content]\n\
             b.txt|ADD|2\n",
        )
        .unwrap();
        assert_eq!(patch.record_count(), 2);
    }

    #[test]
    fn test_unknown_section_skipped() {
        let patch = parse(
            "# fusepatch: 0.1.0\n\
             # patch id: foo-1.0\n\
             [future-things]\n\
             anything | at all\n\
             [content]\n\
             a.txt|ADD|1\n",
        )
        .unwrap();
        assert_eq!(patch.record_count(), 1);
    }

    #[test]
    fn test_unknown_property_key_ignored() {
        let patch = parse(
            "# fusepatch: 0.1.0\n\
             # patch id: foo-1.0\n\
             [properties]\n\
             Signed-By: nobody\n\
             Roles: admin\n",
        )
        .unwrap();
        assert_eq!(patch.metadata().roles(), &["admin"]);
    }

    #[test]
    fn test_oneoff_property() {
        let patch = parse(
            "# fusepatch: 0.1.0\n\
             # patch id: foo-1.1\n\
             [properties]\n\
             One-off: foo-1.0\n",
        )
        .unwrap();
        assert_eq!(patch.metadata().oneoff_id().unwrap().to_string(), "foo-1.0");
    }

    #[test]
    fn test_comments_and_blank_lines_anywhere() {
        let patch = parse(
            "# fusepatch: 0.1.0\n\
             # patch id: foo-1.0\n\
             # a comment\n\
             \n\
             [content]\n\
             # another comment\n\
             a.txt|ADD|1\n\
             \n",
        )
        .unwrap();
        assert_eq!(patch.record_count(), 1);
        assert_eq!(patch.record("a.txt").unwrap().action(), Action::Add);
    }

    #[test]
    fn test_malformed_property_reports_line() {
        let result = parse(
            "# fusepatch: 0.1.0\n\
             # patch id: foo-1.0\n\
             [properties]\n\
             no colon here\n",
        );
        match result {
            Err(Error::MalformedProperty(msg)) => assert!(msg.contains("line 4")),
            other => panic!("expected MalformedProperty, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_record_reports_line() {
        let result = parse(
            "# fusepatch: 0.1.0\n\
             # patch id: foo-1.0\n\
             [content]\n\
             a.txt|BOGUS|1\n",
        );
        match result {
            Err(Error::MalformedRecord(msg)) => assert!(msg.contains("line 4")),
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_commands_with_commas_preserved() {
        let patch = parse(
            "# fusepatch: 0.1.0\n\
             # patch id: foo-1.0\n\
             [post-install-commands]\n\
             echo one, two, three\n",
        )
        .unwrap();
        assert_eq!(patch.metadata().post_commands(), &["echo one, two, three"]);
    }
}
