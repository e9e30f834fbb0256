//! Document-side scenarios against in-memory and dumped collections.

use lexsync_docstore::{
    COMMENTS_COLLECTION, DocumentVerifier, JsonlDumpStore, LEXICON_COLLECTION,
    MemoryDocumentStore, verify_against_document_store,
};
use lexsync_fixture::{CanonicalNode, OracleError, parse_fixture};
use serde_json::{Value, json};

const PROJECT: &str = "test-comment-sr";
const DATABASE: &str = "sf_test-comment-sr";

const FIXTURE: &str = r#"[ { 'lexicon': [
    { 'lexeme': { 'fr' : { 'value' : 'B' } },
      'senses' : [ {
        'definition' : { 'en' : { 'value' : 'B' } },
        'gloss' : { 'en' : { 'value' : '' } }
      } ] },
    { 'lexeme': { 'fr' : { 'value' : 'A' } },
      'senses' : [ {
        /* no definition */
        'gloss' : { 'en' : { 'value' : 'A' } }
      } ] }
  ]}, { 'notes': [
    { 'class' : 'note',
      'ref' : 'B',
      'message' : { 'status': 'open', 'value': 'Comment on word B' }
    }, { 'class' : 'question',
      'ref' : 'A',
      'message' : { 'status': 'open', 'value': 'FW comment on word A' }
    }
  ]}]"#;

fn tree(text: &str) -> CanonicalNode {
    parse_fixture(text).expect("fixture should parse")
}

fn entry(id: &str, word: &str, senses: Value) -> Value {
    json!({
        "_id": {"$oid": id},
        "isDeleted": false,
        "lexeme": {"fr": {"value": word}},
        "senses": senses,
        "authorInfo": {"createdDate": {"$date": "2017-06-01T12:00:00.000Z"}}
    })
}

fn word_note(id: &str, word: &str, content: &str, status: &str, replies: Value) -> Value {
    json!({
        "_id": {"$oid": id},
        "isDeleted": false,
        "content": content,
        "status": status,
        "regarding": {"word": word, "meaning": word},
        "replies": replies
    })
}

fn lexicon() -> Vec<Value> {
    vec![
        entry(
            "e-b",
            "B",
            json!([{"definition": {"en": {"value": "B"}}, "gloss": {"en": {"value": ""}}}]),
        ),
        entry("e-a", "A", json!([{"gloss": {"en": {"value": "A"}}}])),
        json!({
            "_id": {"$oid": "e-old"},
            "isDeleted": true,
            "lexeme": {"fr": {"value": "A"}}
        }),
    ]
}

fn comments() -> Vec<Value> {
    vec![
        word_note("n-a", "A", "FW comment on word A", "open", json!([])),
        word_note("n-b", "B", "Comment on word B", "open", json!([])),
    ]
}

fn store(lexicon: Vec<Value>, comments: Vec<Value>) -> MemoryDocumentStore {
    MemoryDocumentStore::new()
        .with_collection(DATABASE, LEXICON_COLLECTION, lexicon)
        .with_collection(DATABASE, COMMENTS_COLLECTION, comments)
}

fn failure(result: Result<(), OracleError>) -> OracleError {
    result.expect_err("verification must fail")
}

#[test]
fn basic_round_trip_passes() {
    verify_against_document_store(&tree(FIXTURE), &store(lexicon(), comments()), PROJECT)
        .expect("store should match");
}

#[test]
fn verifier_uses_given_database() {
    let store = store(lexicon(), comments());
    let verifier = DocumentVerifier::new(&store, "sf_other");
    assert_eq!(verifier.database(), "sf_other");
    let err = failure(verifier.verify(&tree(FIXTURE)));
    assert_eq!(err.to_string(), "Mongo: Can't find lexEntry for 'B' (record 0)");
}

#[test]
fn absent_definition_that_is_present_fails() {
    let mut lexicon = lexicon();
    lexicon[1] = entry(
        "e-a",
        "A",
        json!([{"definition": {"en": {"value": "a definition"}}, "gloss": {"en": {"value": "A"}}}]),
    );

    let err = failure(verify_against_document_store(
        &tree(FIXTURE),
        &store(lexicon, comments()),
        PROJECT,
    ));
    assert_eq!(err.class(), "value_mismatch");
    assert_eq!(
        err.to_string(),
        "Mongo: Found field 'definition' for element 'Definition' which should not be there (record 1)"
    );
}

#[test]
fn extra_fields_and_writing_systems_are_tolerated() {
    let mut lexicon = lexicon();
    lexicon[1] = json!({
        "_id": {"$oid": "e-a"},
        "isDeleted": false,
        "lexeme": {"fr": {"value": "A"}, "fr-x-ipa": {"value": "a"}},
        "citationForm": {"fr": {"value": "A!"}},
        "senses": [{
            "gloss": {"en": {"value": "A"}, "de": {"value": "A-de"}},
            "partOfSpeech": {"value": "adv1"}
        }]
    });

    verify_against_document_store(&tree(FIXTURE), &store(lexicon, comments()), PROJECT)
        .expect("superset should match");
}

#[test]
fn missing_field_fails_with_field_name() {
    let mut lexicon = lexicon();
    lexicon[1] = entry("e-a", "A", json!([{"definition": {"en": {"value": ""}}}]));

    let err = failure(verify_against_document_store(
        &tree(FIXTURE),
        &store(lexicon, comments()),
        PROJECT,
    ));
    assert_eq!(
        err.to_string(),
        "Mongo: No field 'gloss' for element 'Gloss' (record 1)"
    );
}

#[test]
fn different_value_names_writing_system() {
    let mut lexicon = lexicon();
    lexicon[1] = entry("e-a", "A", json!([{"gloss": {"en": {"value": "A2"}}}]));

    let err = failure(verify_against_document_store(
        &tree(FIXTURE),
        &store(lexicon, comments()),
        PROJECT,
    ));
    assert_eq!(
        err.to_string(),
        "Mongo: Different values for field 'gloss' in writing system 'en' (record 1): expected 'A', found 'A2'"
    );
}

#[test]
fn sense_count_must_match() {
    let mut lexicon = lexicon();
    lexicon[1] = entry(
        "e-a",
        "A",
        json!([{"gloss": {"en": {"value": "A"}}}, {"gloss": {"en": {"value": "A2"}}}]),
    );

    let err = failure(verify_against_document_store(
        &tree(FIXTURE),
        &store(lexicon, comments()),
        PROJECT,
    ));
    assert_eq!(
        err.to_string(),
        "Mongo: Unexpected count of elements of 'senses' for record 1: expected 1, found 2"
    );
}

#[test]
fn unknown_entry_is_missing() {
    let fixture = "[ { 'lexicon': [ { 'lexeme': { 'fr': { 'value': 'Z' } } } ] } ]";
    let err = failure(verify_against_document_store(
        &tree(fixture),
        &store(lexicon(), comments()),
        PROJECT,
    ));
    assert_eq!(err.class(), "missing_artifact");
    assert_eq!(err.to_string(), "Mongo: Can't find lexEntry for 'Z' (record 0)");
}

#[test]
fn duplicate_live_headword_is_ambiguous() {
    let mut lexicon = lexicon();
    lexicon.push(entry("e-a2", "A", json!([])));

    let err = failure(verify_against_document_store(
        &tree(FIXTURE),
        &store(lexicon, comments()),
        PROJECT,
    ));
    assert_eq!(err.class(), "ambiguous_key");
    assert_eq!(err.to_string(), "Mongo: Multiple lexEntries for 'A'");
}

const THREAD_FIXTURE: &str = r#"[ { 'notes': [
    { 'class' : 'question',
      'ref' : 'E',
      'message' : { 'status': '', 'value': 'FW comment on E' },
      'replies': [
        { 'message': { 'status': 'open', 'value': 'LF reply on E' } },
        { 'message': { 'status': '', 'value': 'FW reply on E' } }
      ] }
  ]}]"#;

fn replies(contents: &[&str]) -> Value {
    Value::Array(
        contents
            .iter()
            .map(|content| json!({"content": content, "isDeleted": false}))
            .collect(),
    )
}

#[test]
fn thread_status_folds_from_last_message() {
    let notes = vec![word_note(
        "n-e",
        "E",
        "FW comment on E",
        "open",
        replies(&["LF reply on E", "FW reply on E"]),
    )];
    verify_against_document_store(&tree(THREAD_FIXTURE), &store(lexicon(), notes), PROJECT)
        .expect("thread should match");

    let resolved = vec![word_note(
        "n-e",
        "E",
        "FW comment on E",
        "resolved",
        replies(&["LF reply on E", "FW reply on E"]),
    )];
    let err = failure(verify_against_document_store(
        &tree(THREAD_FIXTURE),
        &store(lexicon(), resolved),
        PROJECT,
    ));
    assert_eq!(
        err.to_string(),
        "Mongo: Different status for note 'E' (record 0): expected 'open', found 'resolved'"
    );
}

#[test]
fn empty_stored_status_counts_as_open() {
    let notes = vec![word_note(
        "n-e",
        "E",
        "FW comment on E",
        "",
        replies(&["LF reply on E", "FW reply on E"]),
    )];
    verify_against_document_store(&tree(THREAD_FIXTURE), &store(lexicon(), notes), PROJECT)
        .expect("empty status should be open");
}

#[test]
fn replies_in_reverse_order_fail() {
    let notes = vec![word_note(
        "n-e",
        "E",
        "FW comment on E",
        "open",
        replies(&["FW reply on E", "LF reply on E"]),
    )];
    let err = failure(verify_against_document_store(
        &tree(THREAD_FIXTURE),
        &store(lexicon(), notes),
        PROJECT,
    ));
    assert_eq!(
        err.to_string(),
        "Mongo: Different reply #0 for note 'E' (record 0): expected 'LF reply on E', found 'FW reply on E'"
    );
}

#[test]
fn deleted_replies_do_not_count() {
    let notes = vec![word_note(
        "n-e",
        "E",
        "FW comment on E",
        "open",
        json!([
            {"content": "LF reply on E", "isDeleted": false},
            {"content": "withdrawn", "isDeleted": true}
        ]),
    )];
    let err = failure(verify_against_document_store(
        &tree(THREAD_FIXTURE),
        &store(lexicon(), notes),
        PROJECT,
    ));
    assert_eq!(
        err.to_string(),
        "Mongo: Different number of replies for note 'E' (record 0): expected at least 2, found 1"
    );
}

#[test]
fn note_count_must_match() {
    let mut notes = comments();
    notes.push(word_note("n-c", "C", "another", "open", json!([])));
    notes.push(json!({
        "_id": {"$oid": "n-gone"},
        "isDeleted": true,
        "content": "deleted notes are ignored",
        "regarding": {}
    }));

    let err = failure(verify_against_document_store(
        &tree(FIXTURE),
        &store(lexicon(), notes),
        PROJECT,
    ));
    assert_eq!(
        err.to_string(),
        "Mongo: Different number of notes: expected 2, found 3"
    );
}

#[test]
fn regarding_with_word_and_field_violates_schema() {
    let mut notes = comments();
    notes[0]["regarding"]["field"] = json!("gloss");

    let err = failure(verify_against_document_store(
        &tree(FIXTURE),
        &store(lexicon(), notes),
        PROJECT,
    ));
    assert_eq!(err.class(), "schema_invariant_violation");
    assert_eq!(
        err.to_string(),
        "Mongo: note 'n-a' has both 'word' and 'field' in 'regarding'"
    );
}

#[test]
fn field_note_resolves_word_through_entry_ref() {
    let notes = vec![
        json!({
            "_id": {"$oid": "n-a"},
            "isDeleted": false,
            "content": "FW comment on word A",
            "status": "open",
            "entryRef": {"$oid": "e-a"},
            "regarding": {"field": "gloss", "fieldValue": "A", "inputSystem": "en"}
        }),
        word_note("n-b", "B", "Comment on word B", "open", json!([])),
    ];
    verify_against_document_store(&tree(FIXTURE), &store(lexicon(), notes), PROJECT)
        .expect("entryRef should resolve to the headword");
}

#[test]
fn entry_ref_to_unknown_entry_is_missing() {
    let notes = vec![
        json!({
            "_id": {"$oid": "n-a"},
            "isDeleted": false,
            "content": "FW comment on word A",
            "entryRef": {"$oid": "e-nowhere"},
            "regarding": {"field": "gloss", "fieldValue": "A"}
        }),
        word_note("n-b", "B", "Comment on word B", "open", json!([])),
    ];
    let err = failure(verify_against_document_store(
        &tree(FIXTURE),
        &store(lexicon(), notes),
        PROJECT,
    ));
    assert_eq!(err.class(), "missing_artifact");
    assert_eq!(
        err.to_string(),
        "Mongo: Can't find lexEntry 'e-nowhere' referenced by a note"
    );
}

const TWO_THREADS: &str = r#"[ { 'notes': [
    { 'class': 'question', 'ref': 'A', 'message': { 'status': 'open', 'value': 'first' } },
    { 'class': 'question', 'ref': 'A', 'message': { 'status': 'resolved', 'value': 'second' } }
  ]}]"#;

#[test]
fn threads_on_same_word_match_by_content() {
    let notes = vec![
        word_note("n-2", "A", "second", "resolved", json!([])),
        word_note("n-1", "A", "first", "open", json!([])),
    ];
    verify_against_document_store(&tree(TWO_THREADS), &store(lexicon(), notes), PROJECT)
        .expect("threads should match by content");
}

#[test]
fn identical_threads_are_ambiguous() {
    let fixture = r#"[ { 'notes': [
        { 'ref': 'A', 'message': { 'status': 'open', 'value': 'same' } },
        { 'ref': 'A', 'message': { 'status': 'open', 'value': 'other' } }
      ]}]"#;
    let notes = vec![
        word_note("n-1", "A", "same", "open", json!([])),
        word_note("n-2", "A", "same", "open", json!([])),
    ];
    let err = failure(verify_against_document_store(
        &tree(fixture),
        &store(lexicon(), notes),
        PROJECT,
    ));
    assert_eq!(err.class(), "ambiguous_key");
    assert_eq!(
        err.to_string(),
        "Mongo: Multiple notes for 'A' with content 'same' (record 0)"
    );
}

#[test]
fn note_with_unknown_content_is_missing() {
    let notes = vec![
        word_note("n-a", "A", "something else", "open", json!([])),
        word_note("n-b", "B", "Comment on word B", "open", json!([])),
    ];
    let err = failure(verify_against_document_store(
        &tree(FIXTURE),
        &store(lexicon(), notes),
        PROJECT,
    ));
    assert_eq!(
        err.to_string(),
        "Mongo: Can't find note for 'A' with content 'FW comment on word A' (record 1)"
    );
}

#[test]
fn dumped_collections_verify() {
    let dir = std::env::temp_dir().join(format!(
        "lexsync-docstore-dump-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("dump dir should be created");

    let write_dump = |collection: &str, documents: Vec<Value>| {
        let text: String = documents
            .iter()
            .map(|document| format!("{document}\n"))
            .collect();
        std::fs::write(dir.join(format!("{DATABASE}.{collection}.json")), text)
            .expect("dump should be written");
    };
    write_dump(LEXICON_COLLECTION, lexicon());
    write_dump(COMMENTS_COLLECTION, comments());

    let result = verify_against_document_store(&tree(FIXTURE), &JsonlDumpStore::new(&dir), PROJECT);
    let _ = std::fs::remove_dir_all(&dir);
    result.expect("dumped collections should match");
}

fn single_note_fixture(reference: &str) -> String {
    format!(
        "[ {{ 'notes': [ {{ 'class': 'note', 'ref': '{reference}', \
         'message': {{ 'status': 'open', 'value': 'keyed comment' }} }} ] }} ]"
    )
}

#[test]
fn note_keys_match_exactly() {
    let exact = vec![word_note("n-1", "A3", "keyed comment", "open", json!([]))];
    verify_against_document_store(
        &tree(&single_note_fixture("A3")),
        &store(lexicon(), exact),
        PROJECT,
    )
    .expect("identical key should match");

    let longer = vec![word_note("n-1", "A3", "keyed comment", "open", json!([]))];
    let err = failure(verify_against_document_store(
        &tree(&single_note_fixture("A")),
        &store(lexicon(), longer),
        PROJECT,
    ));
    assert_eq!(err.class(), "missing_artifact");
    assert_eq!(err.to_string(), "Mongo: Can't find note for 'A' (record 0)");

    let shorter = vec![word_note("n-1", "A", "keyed comment", "open", json!([]))];
    let err = failure(verify_against_document_store(
        &tree(&single_note_fixture("A3")),
        &store(lexicon(), shorter),
        PROJECT,
    ));
    assert_eq!(err.class(), "missing_artifact");
    assert_eq!(err.to_string(), "Mongo: Can't find note for 'A3' (record 0)");
}

#[test]
fn word_note_without_meaning_violates_schema() {
    let mut notes = comments();
    notes[1]["regarding"] = json!({"word": "B"});

    let err = failure(verify_against_document_store(
        &tree(FIXTURE),
        &store(lexicon(), notes),
        PROJECT,
    ));
    assert_eq!(err.class(), "schema_invariant_violation");
    assert_eq!(
        err.to_string(),
        "Mongo: note 'n-b' targets a word but has no 'meaning'"
    );
}

#[test]
fn reply_without_status_keeps_earlier_status() {
    let fixture = r#"[ { 'notes': [
        { 'class': 'question', 'ref': 'E',
          'message': { 'status': 'resolved', 'value': 'closed question' },
          'replies': [ { 'value': 'late reply' } ] }
      ]}]"#;

    let resolved = vec![word_note(
        "n-e",
        "E",
        "closed question",
        "resolved",
        replies(&["late reply"]),
    )];
    verify_against_document_store(&tree(fixture), &store(lexicon(), resolved), PROJECT)
        .expect("earlier status should carry over");

    let reopened = vec![word_note(
        "n-e",
        "E",
        "closed question",
        "open",
        replies(&["late reply"]),
    )];
    let err = failure(verify_against_document_store(
        &tree(fixture),
        &store(lexicon(), reopened),
        PROJECT,
    ));
    assert_eq!(
        err.to_string(),
        "Mongo: Different status for note 'E' (record 0): expected 'resolved', found 'open'"
    );
}
