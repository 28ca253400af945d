// core/tests/segmentation_laws.rs
//
// Integration tests for the segmentation engine against small in-test
// dictionaries.
//
// Tests cover:
// - Coverage of the normalized source by the source ranges
// - Output ranges pointing at the rendered units
// - Determinism of repeated calls
// - Name priority over phrases
// - Longest match across every algorithm variant
// - Rule templates loaded from dictionary text
// - Dead-region bookkeeping not changing results
// - Fallback on characters without any entry

use libvietphrase_core::{
    parse_dictionary, Algorithm, CharRange, Config, DictionarySet, DictionaryTables, Engine,
    SegmentOptions, Segmenter, TranslationResult, WrapMode,
};

fn fixture() -> DictionaryTables {
    DictionaryTables {
        names: parse_dictionary("李白=Lý Bạch\n张三=Trương Tam\n"),
        phrases: parse_dictionary(
            "你好=xin chào/chào\n世界=thế giới\n中国=Trung Quốc\n中国人=người Trung Quốc\n李白=mận trắng\n说=nói\n",
        ),
        han_viet: parse_dictionary("山=sơn\n水=thủy\n他=tha\n好=hảo\n之=chi\n父=phụ\n"),
        rule_templates: parse_dictionary("{0}之父=cha của {0}\n第{0}章=chương {0}\n"),
        rule_lookup: Some(parse_dictionary("他=hắn/y\n我=ta\n")),
        ..Default::default()
    }
}

fn segmenter_run(tables: DictionaryTables, config: &Config, text: &str, opts: SegmentOptions) -> TranslationResult {
    let dicts = DictionarySet::compile(tables, config).unwrap();
    Segmenter::new(&dicts, config).segment(text, opts)
}

fn slice(text: &str, range: CharRange) -> String {
    text.chars().skip(range.start_index).take(range.length).collect()
}

fn assert_covers_source(result: &TranslationResult) {
    let mut next = 0;
    let mut rebuilt = String::new();
    for range in &result.source_ranges {
        assert_eq!(range.start_index, next, "gap or overlap in {:?}", result.source_ranges);
        assert!(range.length > 0);
        rebuilt.push_str(&slice(&result.source, *range));
        next = range.end();
    }
    assert_eq!(rebuilt, result.source);
    assert_eq!(result.source_ranges.len(), result.output_ranges.len());
}

fn assert_output_ranges_ordered(result: &TranslationResult) {
    let len = result.text.chars().count();
    let mut last_end = 0;
    for range in &result.output_ranges {
        assert!(range.start_index >= last_end, "overlapping output ranges");
        assert!(range.end() <= len);
        last_end = range.end();
    }
}

#[test]
fn source_ranges_cover_normalized_input() {
    let engine = Engine::with_dictionaries(Config::default(), fixture()).unwrap();
    let inputs = [
        "",
        "你好",
        "你好，世界！",
        "他说：“你好了。”\n\n李白之父",
        "第12章　　山水abc 123的了",
        "&nbsp;中国人\r\n  张三 ",
        "😀山(水)[x]…",
    ];
    for algorithm in [Algorithm::Longest, Algorithm::Greedy, Algorithm::Balanced] {
        for wrap in [WrapMode::None, WrapMode::Brackets] {
            for text in inputs {
                let result = engine.segment(text, wrap, algorithm, true);
                assert_covers_source(&result);
                assert_output_ranges_ordered(&result);
            }
        }
    }
}

#[test]
fn output_ranges_point_at_rendered_units() {
    let engine = Engine::with_dictionaries(Config::default(), fixture()).unwrap();
    let result = engine.segment("你好世界", WrapMode::None, Algorithm::Greedy, true);
    assert_eq!(result.text, "Xin chào thế giới");
    assert_eq!(slice(&result.text, result.output_ranges[0]), "Xin chào");
    assert_eq!(slice(&result.text, result.output_ranges[1]), "thế giới");
}

#[test]
fn segment_is_deterministic() {
    let config = Config {
        max_cache_size: 0,
        ..Config::default()
    };
    let engine = Engine::with_dictionaries(config, fixture()).unwrap();
    let text = "他说：你好世界。李白之父在山水中国人";
    let first = engine.segment(text, WrapMode::None, Algorithm::Balanced, true);
    for _ in 0..5 {
        assert_eq!(engine.segment(text, WrapMode::None, Algorithm::Balanced, true), first);
    }
}

#[test]
fn prioritized_name_beats_phrase() {
    let engine = Engine::with_dictionaries(Config::default(), fixture()).unwrap();
    let named = engine.segment("李白", WrapMode::None, Algorithm::Greedy, true);
    assert_eq!(named.text, "Lý Bạch");
    let plain = engine.segment("李白", WrapMode::None, Algorithm::Greedy, false);
    assert_eq!(plain.text, "Mận trắng");
}

#[test]
fn longest_phrase_wins_for_every_variant() {
    let engine = Engine::with_dictionaries(Config::default(), fixture()).unwrap();
    for code in [0, 1, 2, 9] {
        let result = engine.segment("中国人", WrapMode::None, Algorithm::from_code(code), true);
        assert_eq!(result.source_ranges, vec![CharRange::new(0, 3)]);
        assert_eq!(result.text, "Người Trung Quốc");
    }
}

#[test]
fn pure_phrase_scenario() {
    let tables = DictionaryTables {
        phrases: parse_dictionary("你好=xin chào"),
        ..Default::default()
    };
    let result = segmenter_run(tables, &Config::default(), "你好", SegmentOptions::default());
    assert_eq!(result.text, "Xin chào");
    assert_eq!(result.source_ranges, vec![CharRange::new(0, 2)]);
}

#[test]
fn unknown_character_falls_back_unchanged() {
    let result = segmenter_run(
        DictionaryTables::default(),
        &Config::default(),
        "山",
        SegmentOptions::default(),
    );
    assert_eq!(result.text, "山");
    assert_eq!(result.source_ranges, vec![CharRange::new(0, 1)]);
}

#[test]
fn rule_templates_from_dictionary_text() {
    let engine = Engine::with_dictionaries(Config::default(), fixture()).unwrap();
    let result = engine.segment("他之父", WrapMode::None, Algorithm::Greedy, true);
    assert_eq!(result.text, "Cha của hắn");

    let chapter = engine.segment("第12章", WrapMode::None, Algorithm::Greedy, true);
    assert_eq!(chapter.text, "Chương 12");
    assert_eq!(chapter.source_ranges, vec![CharRange::new(0, 4)]);
}

#[test]
fn rule_round_trip_on_exact_literal() {
    let dicts = DictionarySet::compile(fixture(), &Config::default()).unwrap();
    assert_eq!(dicts.rules().apply("他之父", dicts.rule_lookup()), "cha của hắn/cha của y");
    assert_eq!(dicts.rules().apply("我之父", dicts.rule_lookup()), "cha của ta");
}

#[test]
fn dead_region_bookkeeping_does_not_change_results() {
    let text = "山山山他之父水水水水水水";
    let eager = Config {
        rule_scan_extension: 100,
        ..Config::default()
    };
    let lazy = Config {
        rule_scan_extension: 0,
        ..Config::default()
    };
    let a = segmenter_run(fixture(), &eager, text, SegmentOptions::default());
    let b = segmenter_run(fixture(), &lazy, text, SegmentOptions::default());
    assert_eq!(a, b);
    assert!(a.text.contains("cha của hắn"));
    assert!(a.source_ranges.contains(&CharRange::new(3, 3)));
}

#[test]
fn missing_rule_lookup_disables_rules() {
    let mut tables = fixture();
    tables.rule_lookup = None;
    let result = segmenter_run(tables, &Config::default(), "他之父", SegmentOptions::default());
    assert_eq!(result.text, "Tha chi phụ");
}
