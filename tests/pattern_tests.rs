//! Search pattern compilation tests

use pretty_assertions::assert_eq;
use sqlport::parser::Pattern;
use sqlport::Error;

fn block_texts(pattern: &Pattern) -> Vec<&str> {
    pattern.blocks().iter().map(|b| b.text()).collect()
}

mod blocks {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn literals_and_variables() {
        let pattern = Pattern::compile("select @@a from").unwrap();
        assert_eq!(block_texts(&pattern), vec!["select", "@@a", "from"]);
        let variables: Vec<bool> = pattern.blocks().iter().map(|b| b.is_variable).collect();
        assert_eq!(variables, vec![false, true, false]);
    }

    #[test]
    fn literals_are_case_folded() {
        let pattern = Pattern::compile("SELECT TOP").unwrap();
        assert_eq!(block_texts(&pattern), vec!["select", "top"]);
        assert_eq!(pattern.source(), "SELECT TOP");
    }

    #[test]
    fn bare_double_at_is_a_literal() {
        let pattern = Pattern::compile("a @@ b").unwrap();
        assert!(pattern.blocks().iter().all(|b| !b.is_variable));
        assert_eq!(pattern.len(), 3);
    }

    #[test]
    fn first_literal_skips_leading_variable() {
        let pattern = Pattern::compile("@@([a-z]+)x = 1").unwrap();
        assert_eq!(pattern.first_literal(), Some("="));
        let pattern = Pattern::compile("#@@([a-z]+)a").unwrap();
        assert_eq!(pattern.first_literal(), Some("#"));
    }
}

mod regex_variables {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn regex_variable_takes_the_name_after_the_expression() {
        let pattern = Pattern::compile("#@@([a-z_]+)a").unwrap();
        assert_eq!(block_texts(&pattern), vec!["#", "@@a"]);
        let regex = pattern.blocks()[1].regex.as_ref().unwrap();
        assert_eq!(regex.source(), "[a-z_]+");
    }

    #[test]
    fn expression_keeps_its_case() {
        let pattern = Pattern::compile("top @@([A-Z0-9]+)n x").unwrap();
        let regex = pattern.blocks()[1].regex.as_ref().unwrap();
        assert_eq!(regex.source(), "[A-Z0-9]+");
    }

    #[test]
    fn nested_groups_stay_in_the_expression() {
        let pattern = Pattern::compile("x @@((a|b)+)v y").unwrap();
        assert_eq!(block_texts(&pattern), vec!["x", "@@v", "y"]);
        assert_eq!(pattern.blocks()[1].regex.as_ref().unwrap().source(), "(a|b)+");
    }

    #[test]
    fn escaped_parenthesis_does_not_close() {
        let pattern = Pattern::compile(r"x @@(\)+)v").unwrap();
        assert_eq!(pattern.blocks()[1].regex.as_ref().unwrap().source(), r"\)+");
    }

    #[test]
    fn regex_variable_may_start_or_end_a_pattern() {
        assert!(Pattern::compile("@@([0-9]+)n rows").is_ok());
        assert!(Pattern::compile("limit @@([0-9]+)n").is_ok());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let pattern = Pattern::compile("x @@([a-z]+)v").unwrap();
        let regex = pattern.blocks()[1].regex.as_ref().unwrap();
        assert!(regex.matches_fully("ABC"));
        assert!(!regex.matches_fully("ab1"));
        assert_eq!(regex.match_prefix("abc1"), Some(3));
        assert_eq!(regex.match_prefix("1abc"), None);
    }
}

mod errors {
    use super::*;
    use pretty_assertions::assert_eq;

    fn message(pattern: &str) -> String {
        match Pattern::compile(pattern) {
            Err(Error::PatternDefinition { message, .. }) => message,
            other => panic!("expected a pattern error, got {:?}", other.map(|p| p.len())),
        }
    }

    #[test]
    fn empty_pattern() {
        assert_eq!(message(""), "pattern is empty");
        assert_eq!(message("  -- only a comment"), "pattern is empty");
    }

    #[test]
    fn plain_variable_at_either_edge() {
        let expected = "pattern cannot start or end with a non-regex variable";
        assert_eq!(message("@@a from"), expected);
        assert_eq!(message("select @@a"), expected);
        assert_eq!(message("@@a"), expected);
    }

    #[test]
    fn unterminated_expression() {
        assert_eq!(message("x @@(abc"), "unterminated regular expression variable");
    }

    #[test]
    fn invalid_expression() {
        assert!(message("x @@([a-)v").starts_with("invalid regular expression"));
    }

    #[test]
    fn error_names_the_pattern() {
        let err = Pattern::compile("select @@a").unwrap_err();
        assert!(err.to_string().ends_with(": select @@a"));
    }
}
