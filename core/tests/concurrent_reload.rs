// core/tests/concurrent_reload.rs
//
// Dictionary reloads racing with translation calls.
//
// Every translation must come from one complete snapshot: with two
// dictionary sets that render a two-unit sentence differently, a result
// mixing a unit of each set would show a torn reload.

use std::sync::atomic::{AtomicBool, Ordering};

use libvietphrase_core::{parse_dictionary, Config, DictionaryTables, Engine, SegmentOptions};

fn old_set() -> DictionaryTables {
    DictionaryTables {
        phrases: parse_dictionary("你好=xin chào\n世界=thế giới\n"),
        ..Default::default()
    }
}

fn new_set() -> DictionaryTables {
    DictionaryTables {
        phrases: parse_dictionary("你好=chào bạn\n世界=địa cầu\n"),
        ..Default::default()
    }
}

#[test]
fn translations_never_observe_a_partial_reload() {
    let engine = Engine::with_dictionaries(Config::default(), old_set()).unwrap();
    let done = AtomicBool::new(false);
    let (engine_ref, done_ref) = (&engine, &done);

    std::thread::scope(|scope| {
        let readers: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(move || {
                    let mut seen = 0usize;
                    while !done_ref.load(Ordering::Acquire) || seen == 0 {
                        let text = engine_ref.segment_with("你好世界", SegmentOptions::default()).text;
                        assert!(
                            text == "Xin chào thế giới" || text == "Chào bạn địa cầu",
                            "torn result: {text}"
                        );
                        seen += 1;
                    }
                    seen
                })
            })
            .collect();

        for round in 0..50 {
            let tables = if round % 2 == 0 { new_set() } else { old_set() };
            engine.load_dictionaries(tables).unwrap();
        }
        done.store(true, Ordering::Release);

        for reader in readers {
            assert!(reader.join().unwrap() > 0);
        }
    });

    assert_eq!(engine.snapshot().generation(), 51);
}

#[test]
fn snapshot_handle_outlives_reload() {
    let engine = Engine::with_dictionaries(Config::default(), old_set()).unwrap();
    let held = engine.snapshot();

    engine.load_dictionaries(new_set()).unwrap();

    assert_eq!(held.dictionaries().phrase("你好"), Some("xin chào"));
    assert_eq!(engine.snapshot().dictionaries().phrase("你好"), Some("chào bạn"));
}
