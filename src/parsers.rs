#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::catalog::condition::{CheckRef, Condition};

/// Folds a non-empty list of operands into a left-nested binary condition.
fn fold_conditions(
    items: Vec<Condition>,
    join: fn(Box<Condition>, Box<Condition>) -> Condition,
) -> Option<Condition> {
    items
        .into_iter()
        .reduce(|acc, next| join(Box::new(acc), Box::new(next)))
}

peg::parser! {
    /// grammar for the conditions that gate a check's contribution to a score.
    pub grammar parser() for str {
        /// matches any number of whitespace characters
        rule _() = quiet!{[' ' | '\n' | '\t' | '\r']*}

        /// matches any sequence of 1 or more numbers
        rule number() -> usize
            = n:$(['0'..='9']+) {? n.parse().or(Err("usize")) }

        /// matches a check identifier, e.g. `ResultSetEqual`
        rule identifier() -> String
            = s:$(['a'..='z' | 'A'..='Z' | '_'] ['a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' | '.']*)
            { s.to_string() }

        /// a reference to an earlier check, by 1-based position or by id
        rule check_ref() -> CheckRef
            = _ n:number() _ { CheckRef::Index(n) }
            / _ i:identifier() _ { CheckRef::Id(i) }

        rule atom() -> Condition
            = _ "always" _ { Condition::Always }
            / _ "never" _ { Condition::Never }
            / _ "passed" _ "(" r:check_ref() ")" _ { Condition::Passed(r) }
            / _ "failed" _ "(" r:check_ref() ")" _ { Condition::Failed(r) }
            / _ "(" e:or_expr() ")" _ { e }

        rule unary() -> Condition
            = _ "!" u:unary() { Condition::Not(Box::new(u)) }
            / atom()

        rule and_expr() -> Condition
            = items:(unary() ++ "&&") {? fold_conditions(items, Condition::And).ok_or("operand") }

        rule or_expr() -> Condition
            = items:(and_expr() ++ "||") {? fold_conditions(items, Condition::Or).ok_or("operand") }

        /// parses a whole condition; blank text and `N/A` mean `always`
        pub rule condition() -> Condition
            = _ ("N/A" / "n/a") _ { Condition::Always }
            / c:or_expr() { c }
            / _ { Condition::Always }

        /// matches the line that opens an answer in a submission file, e.g.
        /// `-- 2a) list employees`, and returns the question id
        pub rule answer_marker() -> String
            = "--" [' ' | '\t']*
              id:$(['0'..='9'] ['a'..='z' | 'A'..='Z' | '0'..='9']*)
              (['.' | ')' | ':'] [_]* / [' ' | '\t'] [_]* / ![_])
            { id.to_string() }
    }
}
