use std::rc::Rc;
use std::time::Duration;

use chrono::NaiveDate;
use wordwheel_game::{
    BoardSource, GameConfig, GameEvent, LevelBoard, ManualClock, PendingAction, PlaySession,
    PuzzleSession, Rejection, SessionPhase, SubmitOutcome, WordList, compute_solvable,
};

fn clock() -> Rc<ManualClock> {
    Rc::new(ManualClock::at_day(NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()))
}

fn board(letters: &str, lexicon: &WordList, level: u32) -> LevelBoard {
    let letters: Vec<char> = letters.chars().collect();
    let solvable = compute_solvable(&letters, level, lexicon);
    LevelBoard {
        level,
        letters,
        solvable,
        source: BoardSource::Fixed,
    }
}

#[test]
fn cats_scenario_completes_then_reports_duplicate() {
    let lexicon = WordList::from_words(["CAT", "CATS", "AT"]);
    let mut session = PuzzleSession::new(GameConfig::default(), clock());
    session.load_board(board("CATS", &lexicon, 1));

    let words: Vec<&str> = session.solvable().iter().map(|w| w.text.as_str()).collect();
    assert_eq!(words, ["CAT", "CATS"]);

    for (i, word) in ["CAT", "CATS"].into_iter().enumerate() {
        for c in word.chars() {
            let id = session.find_tile(c).unwrap();
            session.select_letter(id);
        }
        let outcome = session.submit();
        let SubmitOutcome::Accepted { completion, .. } = outcome else {
            panic!("{word} should be accepted, got {outcome:?}");
        };
        assert_eq!(completion.is_some(), i == 1);
    }
    assert_eq!(session.phase(), SessionPhase::Complete);

    let again = session.submit_word("CAT");
    assert!(matches!(
        again,
        SubmitOutcome::Rejected {
            reason: Rejection::Duplicate,
            ..
        }
    ));
    assert_eq!(session.discovered().len(), 2);
}

#[test]
fn completion_requires_every_word() {
    let lexicon = WordList::from_words(["TEA", "EAT", "ATE", "TEAS", "SEAT", "EATS"]);
    let mut session = PuzzleSession::new(GameConfig::default(), clock());
    session.load_board(board("TEAS", &lexicon, 1));
    let total = session.solvable().len();
    let words: Vec<String> = session.solvable().iter().map(|w| w.text.clone()).collect();

    let mut completions = 0;
    for (i, word) in words.iter().enumerate() {
        assert!(!session.is_complete(), "completed early after {i} of {total}");
        if let SubmitOutcome::Accepted {
            completion: Some(done),
            ..
        } = session.submit_word(word)
        {
            completions += 1;
            assert_eq!(done.total_count as usize, total);
        }
    }
    assert_eq!(completions, 1);
    assert!(session.is_complete());
    assert_eq!(session.submit(), SubmitOutcome::Ignored);
}

#[test]
fn debounce_chain_only_honours_latest_token() {
    let lexicon = WordList::from_words(["STAR", "RATS", "TAR", "ARTS", "TSAR"]);
    let mut session = PuzzleSession::new(GameConfig::default(), clock());
    session.load_board(board("STAR", &lexicon, 1));

    let mut tokens = Vec::new();
    for c in ['T', 'A', 'R'] {
        let id = session.find_tile(c).unwrap();
        if let Some(scheduled) = session.select_letter(id) {
            tokens.push(scheduled);
        }
    }
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].action, PendingAction::Submit);
    assert_eq!(tokens[0].delay, Duration::from_millis(500));

    // Extending to TARS (not a word) replaces the pending submit with a clear.
    let s = session.find_tile('S').unwrap();
    let clear = session.select_letter(s).unwrap();
    assert_eq!(clear.action, PendingAction::Clear);
    assert!(session.resolve(tokens[0].token).is_none());
    assert!(session.discovered().is_empty());

    // Backing up to TAR cancels the clear and schedules a fresh submit.
    let resubmit = session.deselect_letter(s).unwrap();
    assert!(session.resolve(clear.token).is_none());
    assert_eq!(session.current_word(), "TAR");
    assert!(session.resolve(resubmit.token).is_some());
    assert!(session.is_discovered("TAR"));
}

#[test]
fn bot_clears_many_seeds_without_invariant_breaks() {
    let lexicon = Rc::new(WordList::starter());
    for seed in 0..25_u64 {
        let clock = clock();
        let mut play = PlaySession::new(GameConfig::default(), lexicon.clone(), clock.clone(), seed);
        play.start();
        for _ in 0..3 {
            let words: Vec<String> = play
                .session()
                .solvable()
                .iter()
                .map(|w| w.text.clone())
                .collect();
            let mut completions = 0;
            for word in &words {
                clock.advance_secs(5);
                for event in play.submit_word(word) {
                    if matches!(event, GameEvent::LevelComplete(_)) {
                        completions += 1;
                    }
                }
            }
            assert_eq!(completions, 1, "seed {seed}");
            assert_eq!(play.ledger().balance(), play.ledger().replay_balance());
            play.advance();
        }
        assert_eq!(play.progress().level, 4);
        assert_eq!(play.stats().games_played, 3);
    }
}
