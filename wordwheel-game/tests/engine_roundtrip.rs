use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use chrono::NaiveDate;
use thiserror::Error;
use wordwheel_game::{
    GameConfig, GameEngine, LexiconLoader, ManualClock, PlayerSave, ProfileStorage,
    RecordingSettlement, SessionPhase, WordList,
};

#[derive(Debug, Error)]
#[error("lexicon unavailable")]
struct Unavailable;

struct TextLexicon(&'static str);

impl LexiconLoader for TextLexicon {
    type Error = Unavailable;

    fn load_lexicon(&self) -> Result<WordList, Self::Error> {
        let list = WordList::from_text(self.0);
        if list.is_empty() {
            Err(Unavailable)
        } else {
            Ok(list)
        }
    }
}

/// Storage that keeps serialized JSON, exercising the full save format.
#[derive(Clone, Default)]
struct JsonStorage {
    docs: Rc<RefCell<HashMap<String, String>>>,
}

impl ProfileStorage for JsonStorage {
    type Error = serde_json::Error;

    fn save_profile(&self, slot: &str, save: &PlayerSave) -> Result<(), Self::Error> {
        let json = save.to_json()?;
        self.docs.borrow_mut().insert(slot.to_string(), json);
        Ok(())
    }

    fn load_profile(&self, slot: &str) -> Result<Option<PlayerSave>, Self::Error> {
        self.docs
            .borrow()
            .get(slot)
            .map(|json| PlayerSave::from_json(json))
            .transpose()
    }

    fn delete_profile(&self, slot: &str) -> Result<(), Self::Error> {
        self.docs.borrow_mut().remove(slot);
        Ok(())
    }
}

const WORDS: &str = "# tiny lexicon\nstar\nrats\ntars\narts\ntar\nrat\nart\nsat\nate\ntea\neat\nseat\nrest\nstare\n";

#[test]
fn progress_ledger_and_achievements_survive_json_storage() {
    let clock = Rc::new(ManualClock::at_day(NaiveDate::from_ymd_opt(2025, 5, 5).unwrap()));
    let storage = JsonStorage::default();
    let engine = GameEngine::new(TextLexicon(WORDS), storage.clone()).with_clock(clock.clone());

    let mirror = Rc::new(RecordingSettlement::new());
    let mut play = engine.create_session(77).unwrap().with_settlement(mirror.clone());
    play.start();
    let words: Vec<String> = play
        .session()
        .solvable()
        .iter()
        .map(|w| w.text.clone())
        .collect();
    for word in &words {
        play.submit_word(word);
    }
    assert_eq!(play.phase(), SessionPhase::Complete);
    play.advance();
    play.toggle_sound();
    engine.save_session("main", &play).unwrap();
    assert!(storage.docs.borrow()["main"].contains("\"transactions\""));

    let resumed = engine.load_session("main", 77).unwrap().expect("saved");
    assert_eq!(resumed.progress(), play.progress());
    assert_eq!(resumed.progress().level, 2);
    assert_eq!(resumed.ledger().transactions(), play.ledger().transactions());
    assert_eq!(resumed.achievements(), play.achievements());
    assert!(
        resumed
            .ledger()
            .transactions()
            .iter()
            .all(|tx| tx.external_ref.is_some())
    );
    assert!(!mirror.calls().is_empty());
}

#[test]
fn tampered_balance_is_repaired_on_load() {
    let clock = Rc::new(ManualClock::at_day(NaiveDate::from_ymd_opt(2025, 5, 5).unwrap()));
    let storage = JsonStorage::default();
    let engine = GameEngine::new(TextLexicon(WORDS), storage.clone()).with_clock(clock);
    let mut play = engine.create_session(3).unwrap();
    play.start();
    let first = play.session().solvable().as_slice()[0].text.clone();
    play.submit_word(&first);
    let mut save = play.save();
    let honest = save.ledger.balance;
    save.ledger.balance = honest + 10_000;
    storage.save_profile("cheat", &save).unwrap();

    let resumed = engine.load_session("cheat", 3).unwrap().unwrap();
    assert_eq!(resumed.ledger().balance(), honest);
}

#[test]
fn loader_failure_surfaces_through_engine() {
    let engine = GameEngine::new(TextLexicon("# nothing\n"), JsonStorage::default())
        .with_config(GameConfig::default());
    let err = engine.create_session(1).unwrap_err();
    assert_eq!(err.to_string(), "lexicon unavailable");
    assert!(engine.load_session("none", 1).unwrap().is_none());
}
