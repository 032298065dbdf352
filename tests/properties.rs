//! Property tests over random price paths

mod common;

use common::day;
use narrata_core::indicators::{compute_indicators, MacdCross};
use narrata_core::levels::extract_levels;
use narrata_core::prelude::*;
use narrata_core::symbolic::{encode_astride, encode_sax};
use proptest::prelude::*;

fn view_of(closes: &[f64]) -> SeriesView {
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::new(day(i), c, c * 1.01, c * 0.99, c, 1_000.0 + i as f64))
        .collect();
    SeriesView::new("PROP", bars).unwrap()
}

fn closes(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0f64..1_000.0, len)
}

fn caps() -> impl Strategy<Value = Capabilities> {
    any::<bool>().prop_map(|on| if on { Capabilities::all() } else { Capabilities::none() })
}

proptest! {
    #[test]
    fn rsi_is_bounded_or_undefined(cl in closes(1..80), caps in caps()) {
        let view = view_of(&cl);
        let r = compute_indicators(&view, &IndicatorConfig::default(), &caps);
        match r.rsi {
            Computed::Ready(rsi) => {
                prop_assert!(cl.len() >= 15);
                prop_assert!((0.0..=100.0).contains(&rsi.value));
            }
            Computed::InsufficientData { .. } => prop_assert!(cl.len() < 15),
        }
    }

    #[test]
    fn macd_cross_references_a_real_bar(cl in closes(2..120), caps in caps()) {
        let view = view_of(&cl);
        let r = compute_indicators(&view, &IndicatorConfig::default(), &caps);
        if let MacdCross::BullishCrossover { days_since } | MacdCross::BearishCrossover { days_since } = r.macd.cross {
            prop_assert!(days_since < cl.len());
        }
    }

    #[test]
    fn sax_word_length_and_alphabet(
        cl in closes(1..200),
        word_length in 2usize..32,
        alphabet_size in 2usize..=26,
        caps in caps(),
    ) {
        let view = view_of(&cl);
        let config = SymbolicConfig { word_length, alphabet_size, ..SymbolicConfig::default() };
        let enc = encode_sax(&view, &config, &caps).unwrap();
        prop_assert_eq!(enc.word_length, word_length.min(cl.len()));
        let last = b'a' + alphabet_size as u8 - 1;
        prop_assert!(enc.symbols.bytes().all(|b| (b'a'..=last).contains(&b)));
    }

    #[test]
    fn symbolic_encodings_are_deterministic(cl in closes(20..150), caps in caps()) {
        let view = view_of(&cl);
        let config = SymbolicConfig::default();
        prop_assert_eq!(encode_sax(&view, &config, &caps).unwrap(), encode_sax(&view, &config, &caps).unwrap());
        prop_assert_eq!(
            encode_astride(&view, &config, &caps).unwrap(),
            encode_astride(&view, &config, &caps).unwrap()
        );
    }

    #[test]
    fn increasing_series_gives_non_decreasing_binary_word(
        steps in prop::collection::vec(0.01f64..5.0, 1..120),
        caps in caps(),
    ) {
        let cl: Vec<f64> = steps
            .iter()
            .scan(10.0, |acc, s| {
                *acc += s;
                Some(*acc)
            })
            .collect();
        let view = view_of(&cl);
        let config = SymbolicConfig { alphabet_size: 2, word_length: 8, ..SymbolicConfig::default() };
        let enc = encode_sax(&view, &config, &caps).unwrap();
        prop_assert!(enc.symbols.as_bytes().windows(2).all(|w| w[0] <= w[1]), "{}", enc.symbols);
    }

    #[test]
    fn levels_always_have_two_touches(cl in closes(1..150)) {
        let view = view_of(&cl);
        let result = extract_levels(&view, &LevelConfig::default()).unwrap();
        prop_assert!(result.support.iter().chain(&result.resistance).all(|l| l.touches >= 2));
    }
}
