// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use proptest::prelude::*;
use proptest::sample::Index;

use quill::tools::edit::{apply_edit, EditError, EditInstruction, EditMode};

const LINE_MODES: [EditMode; 3] = [
    EditMode::InsertAfter,
    EditMode::InsertBefore,
    EditMode::DeleteLine,
];

/// Lines whose `L<nn>:` prefix is unique, so the prefix anchors exactly one line
fn tagged_lines(bodies: &[String]) -> Vec<String> {
    bodies
        .iter()
        .enumerate()
        .map(|(i, body)| format!("L{:02}:{}", i, body))
        .collect()
}

proptest! {
    #[test]
    fn line_number_and_anchor_agree(
        bodies in prop::collection::vec("[a-z ]{0,8}", 1..12),
        target in any::<Index>(),
        mode_pick in 0usize..3,
        new_text in "[a-z]{1,6}",
        terminated in any::<bool>(),
    ) {
        let lines = tagged_lines(&bodies);
        let mut content = lines.join("\n");
        if terminated {
            content.push('\n');
        }
        let line = target.index(lines.len());
        let mode = LINE_MODES[mode_pick];

        let by_number = EditInstruction::new(mode)
            .with_new_text(new_text.clone())
            .with_line_number(line + 1);
        let by_anchor = EditInstruction::new(mode)
            .with_new_text(new_text)
            .with_old_text(format!("L{:02}:", line));

        let numbered = apply_edit(&content, &by_number).unwrap();
        let anchored = apply_edit(&content, &by_anchor).unwrap();
        prop_assert_eq!(&numbered, &anchored);
        prop_assert_eq!(numbered.ends_with('\n'), terminated && !numbered.is_empty());
    }

    #[test]
    fn line_number_wins_over_anchor(
        bodies in prop::collection::vec("[a-z]{1,5}", 2..8),
    ) {
        let lines = tagged_lines(&bodies);
        let content = lines.join("\n");

        // Anchor names the first line, number names the last
        let instruction = EditInstruction::new(EditMode::DeleteLine)
            .with_old_text("L00:")
            .with_line_number(lines.len());
        let edited = apply_edit(&content, &instruction).unwrap();

        prop_assert_eq!(edited, lines[..lines.len() - 1].join("\n"));
    }

    #[test]
    fn unique_replace_substitutes_once(
        prefix in "[a-z\n ]{0,30}",
        suffix in "[a-z\n ]{0,30}",
        replacement in "[a-z]{0,8}",
    ) {
        let content = format!("{}NEEDLE{}", prefix, suffix);
        let edited = apply_edit(&content, &EditInstruction::replace("NEEDLE", replacement.clone())).unwrap();
        prop_assert_eq!(edited, format!("{}{}{}", prefix, replacement, suffix));
    }

    #[test]
    fn repeated_anchor_is_ambiguous(
        middle in "[a-z\n ]{0,20}",
        copies in 2usize..5,
    ) {
        let content = vec!["NEEDLE"; copies].join(middle.as_str());
        let result = apply_edit(&content, &EditInstruction::replace("NEEDLE", "x"));
        prop_assert!(result.is_err());
    }

    #[test]
    fn out_of_range_line_is_rejected(
        bodies in prop::collection::vec("[a-z]{1,5}", 1..8),
        extra in 1usize..5,
    ) {
        let content = bodies.join("\n");
        let line = bodies.len() + extra;
        let instruction = EditInstruction::new(EditMode::InsertAfter)
            .with_new_text("x")
            .with_line_number(line);

        prop_assert_eq!(
            apply_edit(&content, &instruction),
            Err(EditError::LineOutOfRange { line, count: bodies.len() })
        );
    }
}

#[test]
fn test_append_and_prepend() {
    let append = EditInstruction::new(EditMode::Append).with_new_text("c");
    assert_eq!(apply_edit("a\nb", &append).unwrap(), "a\nb\nc");

    let prepend = EditInstruction::new(EditMode::Prepend).with_new_text("c");
    assert_eq!(apply_edit("a\nb", &prepend).unwrap(), "c\na\nb");
}

#[test]
fn test_delete_line_by_anchor() {
    let instruction = EditInstruction::new(EditMode::DeleteLine).with_old_text("x");
    assert_eq!(apply_edit("x\ny\nz", &instruction).unwrap(), "y\nz");
}

#[test]
fn test_ambiguous_replace_reports_count() {
    let err = apply_edit("foo\nfoo\n", &EditInstruction::replace("foo", "bar")).unwrap_err();
    assert_eq!(err, EditError::Ambiguous { count: 2 });
    assert!(err.to_string().contains("ambiguous"));
}

#[test]
fn test_missing_anchor_is_not_found() {
    let err = apply_edit("alpha\n", &EditInstruction::replace("omega", "x")).unwrap_err();
    assert_eq!(err, EditError::NotFound);
    assert!(err.to_string().contains("not found"));
}

#[test]
fn test_crlf_content_keeps_separator() {
    let instruction = EditInstruction::new(EditMode::InsertAfter)
        .with_old_text("one")
        .with_new_text("one and a half");
    assert_eq!(
        apply_edit("one\r\ntwo\r\n", &instruction).unwrap(),
        "one\r\none and a half\r\ntwo\r\n"
    );
}

#[test]
fn test_insert_requires_new_text() {
    let instruction = EditInstruction::new(EditMode::InsertBefore).with_line_number(1);
    assert_eq!(
        apply_edit("a\n", &instruction),
        Err(EditError::MissingField {
            field: "new_text",
            mode: EditMode::InsertBefore
        })
    );
}

#[test]
fn test_mode_names_parse() {
    for mode in EditMode::ALL {
        assert_eq!(mode.as_str().parse::<EditMode>().unwrap(), mode);
    }
    assert!(matches!(
        "upsert".parse::<EditMode>(),
        Err(EditError::InvalidMode(_))
    ));
}
