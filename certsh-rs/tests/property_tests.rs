use proptest::prelude::*;

use certsh::json::{Document, Mode, Overrides};
use certsh::script::expand::{expand_token, ExpandContext};
use certsh::script::{join_tokens, tokenize};

/// Resolves every source to its upper-cased argument.
#[derive(Default)]
struct Shout {
    diagnostics: usize,
}

impl ExpandContext for Shout {
    fn resolve(&mut self, source: &str, arg: &str) -> Option<String> {
        (source != "none").then(|| arg.to_uppercase())
    }

    fn diagnostic(&mut self, _msg: String) {
        self.diagnostics += 1;
    }
}

/// Compact JSON over a small alphabet, so dumping reproduces it byte for byte.
fn json_value() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        Just("null".to_owned()),
        Just("true".to_owned()),
        Just("false".to_owned()),
        (-1000i64..1000).prop_map(|n| n.to_string()),
        "[a-z ]{0,6}".prop_map(|s| format!("\"{s}\"")),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(|v| format!("[{}]", v.join(","))),
            prop::collection::vec(("[a-z]{1,4}", inner), 0..4).prop_map(|kv| {
                let members: Vec<String> =
                    kv.into_iter().map(|(k, v)| format!("\"{k}\":{v}")).collect();
                format!("{{{}}}", members.join(","))
            }),
        ]
    })
}

fn json_document() -> impl Strategy<Value = String> {
    json_value().prop_map(|v| format!("{{\"root\":{v}}}"))
}

proptest! {
    // ── Tokenizer ─────────────────────────────────────────────────────────────

    #[test]
    fn join_then_tokenize_round_trips(
        tokens in prop::collection::vec("[a-z0-9 '\";:${}.=\\\\-]{0,6}", 1..6)
    ) {
        let line = join_tokens(&tokens);
        prop_assert_eq!(tokenize(&line), tokens);
    }

    #[test]
    fn tokenize_never_panics_and_is_non_empty(s in "\\PC*") {
        prop_assert!(!tokenize(&s).is_empty());
    }

    // ── JSON ──────────────────────────────────────────────────────────────────

    #[test]
    fn strict_dump_reproduces_compact_input(src in json_document()) {
        let doc = Document::parse(&src, Mode::Strict).unwrap();
        prop_assert_eq!(doc.dump(&Overrides::new()), src);
    }

    #[test]
    fn relaxed_accepts_whatever_strict_accepts(src in json_document()) {
        let strict = Document::parse(&src, Mode::Strict).unwrap();
        let relaxed = Document::parse(&src, Mode::Relaxed).unwrap();
        prop_assert_eq!(strict.len(), relaxed.len());
    }

    #[test]
    fn parser_never_panics(s in "\\PC*") {
        let _ = Document::parse(&s, Mode::Strict);
        let _ = Document::parse(&s, Mode::Relaxed);
    }

    #[test]
    fn queries_never_panic(src in json_document(), path in "[a-z\\[\\]0-9.]{0,12}") {
        let doc = Document::parse(&src, Mode::Strict).unwrap();
        let _ = doc.get(&path);
        let _ = doc.find_key(&path, 0, usize::MAX);
        let _ = doc.to_xml(None);
    }

    // ── Expander ──────────────────────────────────────────────────────────────

    #[test]
    fn expander_never_panics(s in "\\PC*") {
        let _ = expand_token(&s, &mut Shout::default());
    }

    #[test]
    fn expander_handles_brace_soup(s in "[${}:a-z]{0,40}") {
        let _ = expand_token(&s, &mut Shout::default());
    }

    #[test]
    fn text_without_placeholders_is_unchanged(s in "[^$]*") {
        prop_assert_eq!(expand_token(&s, &mut Shout::default()), s);
    }

    #[test]
    fn single_placeholder_resolves(arg in "[a-z ]{0,10}") {
        let src = format!("<${{get:{arg}}}>");
        prop_assert_eq!(expand_token(&src, &mut Shout::default()), format!("<{}>", arg.to_uppercase()));
    }
}
