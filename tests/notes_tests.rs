// Tests for note request wording and assistant response handling

use smartnotes::notes::{extract_latest_assistant_text, Message, NoteFormat, NoteLength};

#[test]
fn test_length_directives() {
    assert_eq!(
        NoteLength::Short.directive(),
        "Create SHORT summarization of meeting"
    );
    assert_eq!(
        NoteLength::Medium.directive(),
        "Create MEDIUM summarization of meeting"
    );
    assert_eq!(
        NoteLength::Long.directive(),
        "Create LONG summarization of meeting"
    );
}

#[test]
fn test_length_file_names_and_option_keys() {
    assert_eq!(NoteLength::Short.file_name(), "note_short.txt");
    assert_eq!(NoteLength::Medium.option_key(), "note_medium_path");
    assert_eq!(NoteLength::Long.file_name(), "note_long.txt");
}

#[test]
fn test_lengths_ordered_short_to_long() {
    // Later notes depend on the thread context of the earlier ones.
    assert_eq!(
        NoteLength::ALL,
        [NoteLength::Short, NoteLength::Medium, NoteLength::Long]
    );
}

#[test]
fn test_format_parse() {
    assert_eq!(NoteFormat::parse("md"), Some(NoteFormat::Md));
    assert_eq!(NoteFormat::parse("HTML"), Some(NoteFormat::Html));
    assert_eq!(NoteFormat::parse("latex"), Some(NoteFormat::Latex));
    assert_eq!(NoteFormat::parse("org-mode"), None);
}

#[test]
fn test_format_directive() {
    assert_eq!(
        NoteFormat::Md.directive(),
        "Respond only with MD formatting"
    );
    assert_eq!(NoteFormat::default(), NoteFormat::Md);
}

#[test]
fn test_extract_latest_assistant_text_skips_user_messages() {
    // Newest-first order, as the messages endpoint returns with order=desc.
    let messages: Vec<Message> = serde_json::from_str(
        r#"[
            {"role": "user", "content": [
                {"type": "text", "text": {"value": "Create SHORT summarization of meeting"}}
            ]},
            {"role": "assistant", "content": [
                {"type": "text", "text": {"value": "- decided to ship on Friday"}}
            ]},
            {"role": "assistant", "content": [
                {"type": "text", "text": {"value": "older note"}}
            ]}
        ]"#,
    )
    .expect("fixture parses");

    assert_eq!(
        extract_latest_assistant_text(&messages).as_deref(),
        Some("- decided to ship on Friday"),
        "The newest assistant text wins, user messages are ignored"
    );
}

#[test]
fn test_extract_skips_non_text_content() {
    let messages: Vec<Message> = serde_json::from_str(
        r#"[
            {"role": "assistant", "content": [
                {"type": "image_file", "text": null},
                {"type": "text", "text": {"value": "the actual note"}}
            ]}
        ]"#,
    )
    .expect("fixture parses");

    assert_eq!(
        extract_latest_assistant_text(&messages).as_deref(),
        Some("the actual note")
    );
}

#[test]
fn test_extract_with_no_assistant_messages() {
    let messages: Vec<Message> = serde_json::from_str(
        r#"[{"role": "user", "content": [{"type": "text", "text": {"value": "hi"}}]}]"#,
    )
    .expect("fixture parses");

    assert!(extract_latest_assistant_text(&messages).is_none());
}
