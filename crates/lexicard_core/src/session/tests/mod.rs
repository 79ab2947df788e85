//! Session transition tests.


use super::*;
use crate::models::WordEntry;

pub(super) fn lesson1() -> Vec<WordEntry> {
    vec![
        WordEntry::new("dog", "sobaka", true),
        WordEntry::new("fox", "lisa", false),
    ]
}

pub(super) fn lesson2() -> Vec<WordEntry> {
    vec![
        WordEntry::new("cat", "kot", true),
        WordEntry::new("house", "dom", true),
        WordEntry::new("tree", "derevo", false),
    ]
}

/// Session with `entries` loaded as a single lesson.
pub(super) fn loaded_single(name: &str, entries: Vec<WordEntry>) -> Session {
    let mut session = Session::default();
    let ticket = session.begin_load(LoadedScope::SingleFile(name.to_string()));
    let outcome = session.finish_load(ticket, vec![FileBatch::loaded(name, entries)]);
    assert!(matches!(outcome, LoadOutcome::Applied(_)));
    session
}

pub(super) fn loaded_multi(session: &mut Session) {
    let ticket = session.begin_load(LoadedScope::MultiFile(vec![
        "lesson1".to_string(),
        "lesson2".to_string(),
    ]));
    session.finish_load(
        ticket,
        vec![
            FileBatch::loaded("lesson1", lesson1()),
            FileBatch::loaded("lesson2", lesson2()),
        ],
    );
}

pub(super) fn id_of(session: &Session, headword: &str) -> RecordId {
    session
        .records()
        .iter()
        .find(|record| record.headword == headword)
        .map(|record| record.id)
        .unwrap_or_else(|| panic!("record {} not loaded", headword))
}

pub(super) fn visible_headwords(session: &Session) -> Vec<&str> {
    session
        .visible_records()
        .into_iter()
        .map(|record| record.headword.as_str())
        .collect()
}

/// `visible == records.filter(filter)` in order.
pub(super) fn assert_view_consistent(session: &Session) {
    let expected: Vec<RecordId> = session
        .records()
        .iter()
        .filter(|record| session.display_filter().admits(record.active))
        .map(|record| record.id)
        .collect();
    let actual: Vec<RecordId> = session
        .visible_records()
        .into_iter()
        .map(|record| record.id)
        .collect();
    assert_eq!(actual, expected);
    if session.visible_len() > 0 {
        assert!(session.cursor() < session.visible_len());
    } else {
        assert_eq!(session.cursor(), 0);
    }
}

pub(super) fn persisted(effects: &[Effect]) -> Vec<(&str, &[WordEntry])> {
    effects
        .iter()
        .map(|effect| match effect {
            Effect::Persist(batch) => (batch.file(), batch.entries()),
        })
        .collect()
}
