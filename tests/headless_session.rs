use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use recall::config::GameConfig;
use recall::games::memory_match::MemoryMatch;
use recall::games::sequence_recall::{SequenceRecall, SequenceState};
use recall::games::{GameInput, GameKind, Phase};
use recall::recorder::ResultRecorder;
use recall::runtime::{FixedTicker, GameEvent, Runner, TestEventSource};
use recall::scheduler::{Clock, ManualClock};
use recall::session::GameSession;
use recall::store::{HistoryFilter, MemoryResultStore, ResultStore};

fn session_with_store(kind: GameKind, seed: u64) -> (GameSession, Arc<MemoryResultStore>) {
    let store = Arc::new(MemoryResultStore::new());
    let recorder = ResultRecorder::new(store.clone());
    let session = GameSession::new(kind, &GameConfig::default(), Box::new(StdRng::seed_from_u64(seed)))
        .with_recorder(recorder);
    (session, store)
}

// Drives a perfect memory match game through Runner/TestEventSource without a TTY.
#[test]
fn headless_memory_match_flow_records_result() {
    let clock = ManualClock::new(0);
    let (mut session, store) = session_with_store(GameKind::MemoryMatch, 7);
    session.start(clock.now_ms());

    let cards = session
        .variant_as::<MemoryMatch>()
        .expect("memory match variant")
        .cards()
        .to_vec();

    let (tx, rx) = mpsc::channel();
    let mut sent = vec![false; cards.len()];
    for i in 0..cards.len() {
        if sent[i] {
            continue;
        }
        let j = (i + 1..cards.len())
            .find(|&j| !sent[j] && cards[j] == cards[i])
            .expect("every card has a partner");
        sent[i] = true;
        sent[j] = true;
        tx.send(GameEvent::Input(GameInput::Card(i))).unwrap();
        tx.send(GameEvent::Input(GameInput::Card(j))).unwrap();
    }

    let runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_millis(5)));
    for _ in 0..200u32 {
        match runner.step() {
            GameEvent::Input(input) => {
                clock.advance(250);
                session.submit_input(input, clock.now_ms()).unwrap();
            }
            GameEvent::Tick => {
                session.advance(clock.now_ms()).unwrap();
            }
            GameEvent::Restart | GameEvent::Quit => {}
        }
        if session.is_complete() {
            break;
        }
    }

    assert!(session.is_complete(), "all pairs should be matched");
    let score = session.score().unwrap();
    assert_eq!(score.score, 84);
    assert_eq!(score.accuracy_pct, 100.0);
    assert_eq!(score.duration_ms, 4_000.0);

    let history = store.fetch_result_history(&HistoryFilter::default()).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].game_type(), GameKind::MemoryMatch);
    assert_eq!(history[0].score(), 84);
}

#[test]
fn headless_reaction_time_flow_records_average() {
    let clock = ManualClock::new(0);
    let (mut session, store) = session_with_store(GameKind::ReactionTime, 3);
    session.start(clock.now_ms());

    for _ in 0..GameConfig::default().reaction_rounds {
        session.submit_input(GameInput::Start, clock.now_ms()).unwrap();
        let due = session.next_timer_due().expect("window timer pending");
        clock.set(due);
        assert_eq!(session.advance(clock.now_ms()).unwrap(), 1);
        clock.advance(300);
        session.submit_input(GameInput::Click, clock.now_ms()).unwrap();
        clock.advance(500);
    }

    assert_eq!(session.phase(), Phase::Complete);
    let score = session.score().unwrap();
    assert_eq!(score.score, 90);
    assert_eq!(score.duration_ms, 300.0);

    let history = store.fetch_result_history(&HistoryFilter::game(GameKind::ReactionTime)).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].score(), 90);
}

#[test]
fn early_click_does_not_end_reaction_round() {
    let clock = ManualClock::new(0);
    let (mut session, store) = session_with_store(GameKind::ReactionTime, 3);
    session.start(clock.now_ms());

    session.submit_input(GameInput::Start, clock.now_ms()).unwrap();
    clock.advance(10);
    session.submit_input(GameInput::Click, clock.now_ms()).unwrap();

    assert_eq!(session.next_timer_due(), None);
    assert_eq!(session.phase(), Phase::Active);
    assert!(!session.is_complete());
    assert!(store.fetch_result_history(&HistoryFilter::default()).unwrap().is_empty());
}

fn play_back(session: &mut GameSession, clock: &ManualClock) {
    while let Some(due) = session.next_timer_due() {
        clock.set(due);
        session.advance(clock.now_ms()).unwrap();
        if matches!(
            session.variant_as::<SequenceRecall>().unwrap().state(),
            SequenceState::Input { .. }
        ) {
            break;
        }
    }
}

#[test]
fn headless_sequence_recall_full_clear() {
    let clock = ManualClock::new(0);
    let (mut session, store) = session_with_store(GameKind::SequenceRecall, 11);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    session = session.on_complete(move |score| sink.lock().unwrap().push(*score));

    session.start(clock.now_ms());
    session.submit_input(GameInput::Start, clock.now_ms()).unwrap();

    for level in 1..=5u32 {
        play_back(&mut session, &clock);
        let sequence = session.variant_as::<SequenceRecall>().unwrap().sequence().to_vec();
        assert_eq!(sequence.len(), level as usize + 2);
        for digit in sequence {
            clock.advance(100);
            session.submit_input(GameInput::Digit(digit), clock.now_ms()).unwrap();
        }
    }

    assert_eq!(session.phase(), Phase::Complete);
    assert_eq!(session.score().unwrap().score, 150);
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(seen.lock().unwrap()[0].score, 150);

    let result = session.result().unwrap();
    assert_eq!(result.score(), 100);
    assert_eq!(result.accuracy_pct(), 100.0);
    assert_eq!(result.difficulty_level(), 5);

    let history = store.fetch_result_history(&HistoryFilter::default()).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].score(), 100);
}

#[test]
fn headless_sequence_recall_wrong_digit_fails() {
    let clock = ManualClock::new(0);
    let (mut session, store) = session_with_store(GameKind::SequenceRecall, 5);
    session.start(clock.now_ms());
    session.submit_input(GameInput::Start, clock.now_ms()).unwrap();
    play_back(&mut session, &clock);

    let first = session.variant_as::<SequenceRecall>().unwrap().sequence()[0];
    let wrong = if first == 9 { 1 } else { first + 1 };
    session.submit_input(GameInput::Digit(wrong), clock.now_ms()).unwrap();

    assert_eq!(session.phase(), Phase::Failed);
    let score = session.score().unwrap();
    assert_eq!(score.score, 0);
    assert_eq!(score.accuracy_pct, 0.0);
    assert_eq!(store.fetch_result_history(&HistoryFilter::default()).unwrap().len(), 1);

    // Input after the game ended is dropped.
    let outcome = session.submit_input(GameInput::Digit(first), clock.now_ms()).unwrap();
    assert!(outcome.was_ignored());
}
