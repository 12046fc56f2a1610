//! Fixed keyword tables. Every entry is lower-case and single-spaced, the
//! form produced by `Token::normalized`.

use phf::{phf_map, phf_set};

use crate::clause::ClauseScope;

/// Multi-word keywords lexed as a single WORD token, longest tables first.
pub static FOUR_WORD_PHRASES: phf::Set<&'static str> = phf_set! {
    "is not distinct from",
    "natural left outer join",
    "natural right outer join",
    "natural full outer join",
};

pub static THREE_WORD_PHRASES: phf::Set<&'static str> = phf_set! {
    "left outer join",
    "right outer join",
    "full outer join",
    "natural inner join",
    "natural left join",
    "natural right join",
    "natural full join",
    "is distinct from",
    "with time zone",
    "without time zone",
};

pub static TWO_WORD_PHRASES: phf::Set<&'static str> = phf_set! {
    "group by",
    "order by",
    "union all",
    "union distinct",
    "intersect all",
    "intersect distinct",
    "except all",
    "except distinct",
    "inner join",
    "cross join",
    "left join",
    "right join",
    "full join",
    "natural join",
    "lateral join",
};

/// Keywords that open a clause scope inside a single SELECT.
pub static SCOPE_KEYWORDS: phf::Map<&'static str, ClauseScope> = phf_map! {
    "with" => ClauseScope::With,
    "select" => ClauseScope::Select,
    "from" => ClauseScope::From,
    "where" => ClauseScope::Where,
    "group by" => ClauseScope::GroupBy,
    "order by" => ClauseScope::OrderBy,
    "limit" => ClauseScope::LimitOffset,
    "offset" => ClauseScope::LimitOffset,
};

pub static SET_OPERATIONS: phf::Set<&'static str> = phf_set! {
    "union",
    "union all",
    "union distinct",
    "intersect",
    "intersect all",
    "intersect distinct",
    "except",
    "except all",
    "except distinct",
    "minus",
};

/// FROM clause delimiters: the comma and every join keyword.
pub static FROM_DELIMITERS: phf::Set<&'static str> = phf_set! {
    ",",
    "join",
    "inner join",
    "cross join",
    "left join",
    "left outer join",
    "right join",
    "right outer join",
    "full join",
    "full outer join",
    "natural join",
    "natural inner join",
    "natural left join",
    "natural left outer join",
    "natural right join",
    "natural right outer join",
    "natural full join",
    "natural full outer join",
    "lateral join",
};

pub static COMMA: phf::Set<&'static str> = phf_set! { "," };

pub static WHERE_DELIMITERS: phf::Set<&'static str> = phf_set! { "and", "or" };

pub static GROUP_BY_DELIMITERS: phf::Set<&'static str> = phf_set! { ",", "having" };

pub static LIMIT_OFFSET_KEYWORDS: phf::Set<&'static str> = phf_set! { "limit", "offset" };

/// Words after which compaction keeps the space before `(`, so that
/// `x in (1, 2)` is not mistaken for a call to a function named `in`.
pub static SPACED_BEFORE_PAREN: phf::Set<&'static str> = phf_set! {
    "in",
    "and",
    "or",
    "not",
    "exists",
    "as",
    "on",
    "using",
    "when",
    "then",
    "else",
    "between",
    "is",
    "like",
    "any",
    "all",
    "some",
    "values",
};

/// True if the lower-cased words form one of the fixed keyphrases.
pub fn is_keyphrase<S: AsRef<str>>(words: &[S]) -> bool {
    let table = match words.len() {
        4 => &FOUR_WORD_PHRASES,
        3 => &THREE_WORD_PHRASES,
        2 => &TWO_WORD_PHRASES,
        _ => return false,
    };
    let candidate = words
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ");
    table.contains(candidate.as_str())
}

/// Longest keyphrase prefix of `words`, as a word count.
pub fn longest_keyphrase<S: AsRef<str>>(words: &[S]) -> Option<usize> {
    (2..=words.len().min(4))
        .rev()
        .find(|&n| is_keyphrase(&words[..n]))
}

pub fn is_set_operation(normalized: &str) -> bool {
    SET_OPERATIONS.contains(normalized)
}

pub fn is_join_keyword(normalized: &str) -> bool {
    normalized != "," && FROM_DELIMITERS.contains(normalized)
}
