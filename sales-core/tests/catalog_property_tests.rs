//! Property-Based Tests for Statement Compilation
//!
//! **Property: Placeholder Compilation**
//!
//! For any statement built from named placeholders, quoted literals and
//! casts, compilation SHALL:
//! - assign one position per distinct name, in order of first use
//! - leave no named placeholder in the compiled text
//! - leave literals and casts byte-for-byte intact
//! - bind exactly the declared names

use proptest::prelude::*;
use sales_core::{QueryParams, SqlValue, Statement};

// ============================================================================
// PROPERTY TEST STRATEGIES
// ============================================================================

#[derive(Debug, Clone)]
enum Fragment {
    Placeholder(String),
    Literal(String),
    Cast(&'static str),
    Keyword(&'static str),
}

fn ident_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("start".to_string()),
        Just("end".to_string()),
        Just("region".to_string()),
        "[a-z_][a-z0-9_]{0,8}",
    ]
}

fn fragment_strategy() -> impl Strategy<Value = Fragment> {
    prop_oneof![
        3 => ident_strategy().prop_map(Fragment::Placeholder),
        // Literal text may itself look like a placeholder.
        1 => "[a-z: ]{0,10}".prop_map(Fragment::Literal),
        1 => prop_oneof![Just("::bigint"), Just("::date"), Just("::text")].prop_map(Fragment::Cast),
        1 => prop_oneof![Just("SELECT"), Just("AND"), Just("="), Just("OR")].prop_map(Fragment::Keyword),
    ]
}

fn render(fragments: &[Fragment]) -> String {
    fragments
        .iter()
        .map(|f| match f {
            Fragment::Placeholder(name) => format!(":{}", name),
            Fragment::Literal(text) => format!("'{}'", text.replace('\'', "''")),
            Fragment::Cast(cast) => format!("x{}", cast),
            Fragment::Keyword(kw) => kw.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn distinct_names(fragments: &[Fragment]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for f in fragments {
        if let Fragment::Placeholder(name) = f {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
    }
    names
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_positions_follow_first_use(fragments in prop::collection::vec(fragment_strategy(), 0..20)) {
        let source: &'static str = Box::leak(render(&fragments).into_boxed_str());
        let stmt = Statement::compile("prop", source).expect("generated SQL should compile");

        let expected = distinct_names(&fragments);
        prop_assert_eq!(stmt.placeholders(), expected.as_slice());

        for f in &fragments {
            match f {
                Fragment::Literal(text) => {
                    let quoted = format!("'{}'", text);
                    prop_assert!(stmt.sql().contains(&quoted));
                }
                Fragment::Cast(cast) => prop_assert!(stmt.sql().contains(cast)),
                _ => {}
            }
        }

        for (i, _) in expected.iter().enumerate() {
            let positional = format!("${}", i + 1);
            prop_assert!(stmt.sql().contains(&positional));
        }
    }

    #[test]
    fn prop_bind_accepts_exactly_declared_names(fragments in prop::collection::vec(fragment_strategy(), 1..20)) {
        let source: &'static str = Box::leak(render(&fragments).into_boxed_str());
        let stmt = Statement::compile("prop", source).expect("generated SQL should compile");

        let params: QueryParams = stmt
            .placeholders()
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), SqlValue::Int(i as i64)))
            .collect();

        let bound = stmt.bind(&params).expect("all placeholders supplied");
        prop_assert_eq!(bound.len(), stmt.placeholders().len());
        for (i, value) in bound.iter().enumerate() {
            prop_assert_eq!(*value, &SqlValue::Int(i as i64));
        }

        let mut extra = params.clone();
        extra.insert("not_a_placeholder_x".to_string(), SqlValue::Null);
        prop_assert!(stmt.bind(&extra).is_err());
    }
}
