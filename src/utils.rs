use crate::error::{SearchError, SearchResult};

/// Extracts the arguments of every `name(...)` predicate in `text`.
///
/// Predicates may appear anywhere in the text, in any order, separated by
/// anything. A match must start at a word boundary, so `at(` inside `flat(`
/// is ignored. Arguments are split on commas and trimmed.
///
/// # Returns
/// * `Ok(Vec<Vec<String>>)` with one entry per predicate, in input order.
/// * `Err(SearchError::Format)` if a predicate is unterminated, contains
///   nested parentheses, has the wrong number of arguments, or an empty argument.
///
/// # Examples
/// ```
/// use tile_search::utils::predicates;
///
/// let args = predicates("state([adj(a,b), at(1, a), blank(b)]).", "at", 2).unwrap();
/// assert_eq!(args, vec![vec!["1".to_string(), "a".to_string()]]);
///
/// assert!(predicates("at(1,a", "at", 2).is_err());
/// assert!(predicates("at(1)", "at", 2).is_err());
/// ```
pub fn predicates(text: &str, name: &str, arity: usize) -> SearchResult<Vec<Vec<String>>> {
    let opener = format!("{}(", name);
    let mut found = Vec::new();

    for (start, _) in text.match_indices(&opener) {
        let at_boundary = text[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_'));
        if !at_boundary {
            continue;
        }

        let body_start = start + opener.len();
        let rest = &text[body_start..];
        let close = rest
            .find(')')
            .ok_or_else(|| SearchError::format(snippet(&text[start..]), "missing `)`"))?;
        let body = &rest[..close];
        let whole = &text[start..body_start + close + 1];

        if body.contains('(') {
            return Err(SearchError::format(whole, "nested `(`"));
        }

        let args: Vec<String> = body.split(',').map(|a| a.trim().to_string()).collect();
        if args.len() != arity {
            return Err(SearchError::format(
                whole,
                format!("expected {} arguments, found {}", arity, args.len()),
            ));
        }
        if args.iter().any(|a| a.is_empty()) {
            return Err(SearchError::format(whole, "empty argument"));
        }
        found.push(args);
    }

    Ok(found)
}

fn snippet(text: &str) -> String {
    text.chars().take(24).collect()
}

/// Builds the goal description of a `rows` x `cols` sliding-tile puzzle.
///
/// Locations are named by row letter and 1-based column (`a1`, `a2`, ...,
/// `b1`, ...). Tiles `1..rows*cols` fill the board row by row and the last
/// cell is blank. Adjacency facts are emitted in both directions.
///
/// # Examples
/// ```
/// use tile_search::utils::grid_goal_text;
///
/// let text = grid_goal_text(1, 3);
/// assert!(text.contains("adj(a1,a2)"));
/// assert!(text.contains("adj(a2,a1)"));
/// assert!(text.contains("at(1,a1)"));
/// assert!(text.contains("at(2,a2)"));
/// assert!(!text.contains("at(3,")); // a3 is the blank
/// ```
///
/// # Panics
/// Panics if `rows` exceeds 26.
pub fn grid_goal_text(rows: usize, cols: usize) -> String {
    assert!(rows <= 26, "at most 26 rows are supported");
    let name = |r: usize, c: usize| format!("{}{}", (b'a' + r as u8) as char, c + 1);

    let mut facts = Vec::new();
    for r in 0..rows {
        for c in 0..cols {
            if c + 1 < cols {
                facts.push(format!("adj({},{})", name(r, c), name(r, c + 1)));
                facts.push(format!("adj({},{})", name(r, c + 1), name(r, c)));
            }
            if r + 1 < rows {
                facts.push(format!("adj({},{})", name(r, c), name(r + 1, c)));
                facts.push(format!("adj({},{})", name(r + 1, c), name(r, c)));
            }
        }
    }

    let cells = rows * cols;
    for i in 0..cells.saturating_sub(1) {
        facts.push(format!("at({},{})", i + 1, name(i / cols, i % cols)));
    }

    format!("state([{}]).", facts.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates_anywhere_in_text() {
        let text = "noise adj(a,b) more noise\nadj(b,c),at(1,a) at(2 , b)";
        let adj = predicates(text, "adj", 2).unwrap();
        assert_eq!(adj.len(), 2);
        assert_eq!(adj[1], vec!["b", "c"]);

        let at = predicates(text, "at", 2).unwrap();
        assert_eq!(at, vec![vec!["1", "a"], vec!["2", "b"]]);
    }

    #[test]
    fn test_predicates_word_boundary() {
        let at = predicates("flat(1,2) beat(3,4) at(5,6)", "at", 2).unwrap();
        assert_eq!(at, vec![vec!["5", "6"]]);
    }

    #[test]
    fn test_predicates_unterminated() {
        let result = predicates("adj(a,b), at(1,a", "at", 2);
        match result {
            Err(SearchError::Format { detail, .. }) => assert!(detail.contains("missing")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_predicates_nested_parens() {
        assert!(matches!(
            predicates("at(1,f(a))", "at", 2),
            Err(SearchError::Format { .. })
        ));
    }

    #[test]
    fn test_predicates_bad_arity_and_empty_argument() {
        assert!(predicates("at(1,a,b)", "at", 2).is_err());
        assert!(predicates("at(1,)", "at", 2).is_err());
        assert!(predicates("at()", "at", 2).is_err());
    }

    #[test]
    fn test_predicates_none_present() {
        assert!(predicates("blank(a)", "at", 2).unwrap().is_empty());
    }

    #[test]
    fn test_grid_goal_text_counts() {
        let text = grid_goal_text(3, 3);
        // 12 undirected edges, each listed both ways.
        assert_eq!(predicates(&text, "adj", 2).unwrap().len(), 24);
        let at = predicates(&text, "at", 2).unwrap();
        assert_eq!(at.len(), 8);
        assert_eq!(at[0], vec!["1", "a1"]);
        assert_eq!(at[7], vec!["8", "c2"]);
    }
}
