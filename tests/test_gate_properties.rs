//! Property tests for the safety gate and fence stripping.

use finq::llm::strip_code_fences;
use finq::query::{is_safe_read, GateMode, SafetyGate};
use proptest::prelude::*;

const MUTATING: &[&str] = &[
    "insert", "update", "delete", "drop", "create", "alter", "replace", "attach", "pragma", "vacuum",
];

proptest! {
    #[test]
    fn prop_select_prefix_is_safe(
        lead in "[ \t\n]{0,4}",
        keyword in "[sS][eE][lL][eE][cC][tT]",
        sep in "[ \t\n]{1,3}",
        rest in "[a-zA-Z0-9_*,=' ]{0,40}",
    ) {
        let sql = format!("{}{}{}{}", lead, keyword, sep, rest);
        prop_assert!(is_safe_read(&sql));
    }

    #[test]
    fn prop_with_prefix_is_safe(
        keyword in "[wW][iI][tT][hH]",
        sep in "[ \t\n]{1,3}",
        rest in "[a-zA-Z0-9_()*,][a-zA-Z0-9_()*, ]{0,39}",
    ) {
        let sql = format!("{}{}{}", keyword, sep, rest);
        prop_assert!(is_safe_read(&sql));
    }

    #[test]
    fn prop_mutating_keywords_are_unsafe(
        idx in 0..MUTATING.len(),
        upper in any::<bool>(),
        rest in "[ a-zA-Z0-9_*,=']{0,40}",
    ) {
        let keyword = if upper { MUTATING[idx].to_uppercase() } else { MUTATING[idx].to_string() };
        let sql = format!("{}{}", keyword, rest);
        prop_assert!(!is_safe_read(&sql));
        prop_assert!(!SafetyGate::new(GateMode::Strict).allows(&sql));
    }

    #[test]
    fn prop_glued_select_prefix_is_unsafe(suffix in "[a-z0-9_]{1,10}") {
        let sql = format!("select{} from t", suffix);
        prop_assert!(!is_safe_read(&sql));
    }

    #[test]
    fn prop_whitespace_only_is_unsafe(ws in "[ \t\r\n]{0,10}") {
        prop_assert!(!is_safe_read(&ws));
    }

    #[test]
    fn prop_strict_implies_prefix(sql in "[a-zA-Z0-9_ ;*(),=']{0,60}") {
        if SafetyGate::new(GateMode::Strict).allows(&sql) {
            prop_assert!(is_safe_read(&sql));
        }
    }

    #[test]
    fn prop_fence_stripping_idempotent(text in "[a-zA-Z0-9_ \n`*;=']{0,80}") {
        let once = strip_code_fences(&text);
        prop_assert_eq!(strip_code_fences(&once), once.clone());
    }

    #[test]
    fn prop_fenced_equals_unfenced(
        body in "[A-Za-z0-9_ *,=']{1,60}",
        tag in prop::sample::select(vec!["", "sql", "SQL"]),
    ) {
        let fenced = format!("```{}\n{}\n```", tag, body);
        prop_assert_eq!(strip_code_fences(&fenced), strip_code_fences(&body));
    }
}
