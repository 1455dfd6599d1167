// src/codec/writer.rs

//! Canonical metadata writer
//!
//! Emits the header, then `[properties]`, `[content]` and
//! `[post-install-commands]` in that order, omitting a section when the
//! corresponding collection is empty. Records are emitted in
//! path-ascending order, property lists with a single space after each
//! comma. Output is LF-terminated UTF-8.

use std::io::Write;

use crate::codec::{
    KEY_DEPENDENCIES, KEY_ONEOFF, KEY_ROLES, PATCHID_PREFIX, SECTION_CONTENT,
    SECTION_POST_COMMANDS, SECTION_PROPERTIES, TOOL_VERSION, VERSION_PREFIX,
};
use crate::error::Result;
use crate::patch::Patch;

/// Serialize a patch to a stream
///
/// Parsing the produced bytes yields a patch equal to the input.
pub fn write_patch<W: Write>(patch: &Patch, mut writer: W) -> Result<()> {
    writeln!(writer, "{} {}", VERSION_PREFIX, TOOL_VERSION)?;
    writeln!(writer, "{} {}", PATCHID_PREFIX, patch.patch_id())?;

    let metadata = patch.metadata();
    let has_properties = metadata.oneoff_id().is_some()
        || !metadata.roles().is_empty()
        || !metadata.dependencies().is_empty();

    if has_properties {
        writeln!(writer)?;
        writeln!(writer, "{}", SECTION_PROPERTIES)?;
        if let Some(oneoff) = metadata.oneoff_id() {
            writeln!(writer, "{}: {}", KEY_ONEOFF, oneoff)?;
        }
        if !metadata.roles().is_empty() {
            writeln!(writer, "{}: {}", KEY_ROLES, metadata.roles().join(", "))?;
        }
        if !metadata.dependencies().is_empty() {
            let deps: Vec<String> = metadata
                .dependencies()
                .iter()
                .map(ToString::to_string)
                .collect();
            writeln!(writer, "{}: {}", KEY_DEPENDENCIES, deps.join(", "))?;
        }
    }

    if patch.record_count() > 0 {
        writeln!(writer)?;
        writeln!(writer, "{}", SECTION_CONTENT)?;
        for record in patch.records() {
            writeln!(writer, "{}", record)?;
        }
    }

    if !metadata.post_commands().is_empty() {
        writeln!(writer)?;
        writeln!(writer, "{}", SECTION_POST_COMMANDS)?;
        for command in metadata.post_commands() {
            writeln!(writer, "{}", command)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::read_patch;
    use crate::patch::{Action, PatchId, PatchMetadata, Record};

    fn id(s: &str) -> PatchId {
        PatchId::parse(s).unwrap()
    }

    fn to_string(patch: &Patch) -> String {
        let mut buf = Vec::new();
        write_patch(patch, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_writer_output_shape() {
        let metadata = PatchMetadata::builder(id("foo-1.0"))
            .dependency(id("bar-2.1"))
            .role("admin")
            .post_command("echo hi")
            .build()
            .unwrap();
        let patch = Patch::new(
            metadata,
            vec![Record::new(Action::Add, "a/b.txt", 0xDEADBEEF).unwrap()],
        )
        .unwrap();

        let expected = format!(
            "# fusepatch: {}\n\
             # patch id: foo-1.0\n\
             \n\
             [properties]\n\
             Roles: admin\n\
             Dependencies: bar-2.1\n\
             \n\
             [content]\n\
             a/b.txt|ADD|3735928559\n\
             \n\
             [post-install-commands]\n\
             echo hi\n",
            TOOL_VERSION
        );
        assert_eq!(to_string(&patch), expected);
    }

    #[test]
    fn test_empty_sections_omitted() {
        let metadata = PatchMetadata::builder(id("foo-1.0")).build().unwrap();
        let patch = Patch::new(metadata, Vec::new()).unwrap();
        let text = to_string(&patch);
        assert!(!text.contains("[properties]"));
        assert!(!text.contains("[content]"));
        assert!(!text.contains("[post-install-commands]"));
    }

    #[test]
    fn test_records_emitted_in_path_order() {
        let metadata = PatchMetadata::builder(id("foo-1.0")).build().unwrap();
        let patch = Patch::new(
            metadata,
            vec![
                Record::new(Action::Add, "z.txt", 3).unwrap(),
                Record::new(Action::Add, "a.txt", 1).unwrap(),
            ],
        )
        .unwrap();
        let text = to_string(&patch);
        let a = text.find("a.txt").unwrap();
        let z = text.find("z.txt").unwrap();
        assert!(a < z);
    }

    #[test]
    fn test_roundtrip_identity() {
        let metadata = PatchMetadata::builder(id("foo-1.0"))
            .dependency(id("bar-2.1"))
            .role("admin")
            .post_command("echo hi")
            .build()
            .unwrap();
        let patch = Patch::new(
            metadata,
            vec![Record::new(Action::Add, "a/b.txt", 0xDEADBEEF).unwrap()],
        )
        .unwrap();

        let first = to_string(&patch);
        let reparsed = read_patch(first.as_bytes()).unwrap();
        assert_eq!(reparsed, patch);
        // Re-serialization is byte-identical
        assert_eq!(to_string(&reparsed), first);
    }

    #[test]
    fn test_roundtrip_oneoff() {
        let metadata = PatchMetadata::builder(id("foo-1.1"))
            .oneoff(id("foo-1.0"))
            .build()
            .unwrap();
        let patch = Patch::new(metadata, Vec::new()).unwrap();
        let reparsed = read_patch(to_string(&patch).as_bytes()).unwrap();
        assert_eq!(reparsed, patch);
    }

    #[test]
    fn test_roundtrip_commands_with_commas() {
        let metadata = PatchMetadata::builder(id("foo-1.0"))
            .post_command("echo one, two, three")
            .build()
            .unwrap();
        let patch = Patch::new(metadata, Vec::new()).unwrap();
        let reparsed = read_patch(to_string(&patch).as_bytes()).unwrap();
        assert_eq!(
            reparsed.metadata().post_commands(),
            &["echo one, two, three"]
        );
    }
}
