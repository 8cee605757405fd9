//! The mutable token collection fixers operate on.
//!
//! A [`TokenStream`] wraps the lexed token vector and keeps every derived
//! structure consistent under mutation:
//!
//! - kind presence counts, so candidacy checks are O(1)
//! - a tombstone count, so clearing never shifts indices
//! - a memoized block-edge map, dropped on any mutation
//! - a changed flag plus a content hash for cheap "did anything happen"
//!   checks
//!
//! Clearing a token rewrites it to the `Removed` kind in place; call
//! [`TokenStream::compact`] at a pass boundary to drop tombstones for real.
//! Out-of-range indices are treated as programming errors and panic, like
//! slice indexing; use [`TokenStream::get`] when absence is expected.
//!
//! Insertions shift every index at or after the insertion point. Code that
//! inserts while scanning must walk indices in reverse so the indices still
//! to be visited stay valid; all bundled fixers follow that rule.

pub mod blocks;

pub use blocks::{BlockError, BlockKind};

use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hasher;
use std::ops::Index;

use crate::kind::TokenKind;
use crate::token::Token;

/// One element of a [`TokenStream::find_sequence`] pattern: a kind, with
/// optional content that must match too.
#[derive(Debug, Clone, Copy)]
pub struct SequenceItem<'a> {
    kind: TokenKind,
    content: Option<&'a str>,
}

impl<'a> SequenceItem<'a> {
    /// Matches any token of `kind`.
    pub fn of_kind(kind: TokenKind) -> Self {
        SequenceItem {
            kind,
            content: None,
        }
    }

    /// Matches a token of `kind` whose content equals `content`.
    pub fn with_content(kind: TokenKind, content: &'a str) -> Self {
        SequenceItem {
            kind,
            content: Some(content),
        }
    }

    fn matches(&self, token: &Token, case_sensitive: bool) -> bool {
        if token.kind() != self.kind {
            return false;
        }
        match self.content {
            None => true,
            Some(content) if case_sensitive => token.content() == content,
            Some(content) => token.content().eq_ignore_ascii_case(content),
        }
    }
}

/// Mutable, index-stable collection of [`Token`]s.
#[derive(Debug)]
pub struct TokenStream {
    tokens: Vec<Token>,
    kind_counts: HashMap<TokenKind, usize>,
    removed: usize,
    changed: bool,
    block_edges: RefCell<HashMap<usize, usize>>,
}

impl TokenStream {
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        let mut kind_counts = HashMap::new();
        let mut removed = 0;
        for token in &tokens {
            *kind_counts.entry(token.kind()).or_insert(0) += 1;
            if token.is_removed() {
                removed += 1;
            }
        }
        TokenStream {
            tokens,
            kind_counts,
            removed,
            changed: false,
            block_edges: RefCell::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Iterates all slots, tombstones included, so positions line up with
    /// indices.
    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    /// Number of tombstoned slots awaiting [`Self::compact`].
    pub fn removed_count(&self) -> usize {
        self.removed
    }

    // ----- navigation -------------------------------------------------

    /// Index of the first meaningful token strictly after `from`.
    pub fn next_meaningful(&self, from: usize) -> Option<usize> {
        (from + 1..self.tokens.len()).find(|&i| self.tokens[i].is_meaningful())
    }

    /// Index of the last meaningful token strictly before `from`.
    pub fn prev_meaningful(&self, from: usize) -> Option<usize> {
        (0..from).rev().find(|&i| self.tokens[i].is_meaningful())
    }

    pub fn first_meaningful(&self) -> Option<usize> {
        (0..self.tokens.len()).find(|&i| self.tokens[i].is_meaningful())
    }

    pub fn last_meaningful(&self) -> Option<usize> {
        (0..self.tokens.len())
            .rev()
            .find(|&i| self.tokens[i].is_meaningful())
    }

    /// First token of one of `kinds` strictly after `from`.
    pub fn next_of_kind(&self, from: usize, kinds: &[TokenKind]) -> Option<usize> {
        (from + 1..self.tokens.len()).find(|&i| kinds.contains(&self.tokens[i].kind()))
    }

    /// Last token of one of `kinds` strictly before `from`.
    pub fn prev_of_kind(&self, from: usize, kinds: &[TokenKind]) -> Option<usize> {
        (0..from).rev().find(|&i| kinds.contains(&self.tokens[i].kind()))
    }

    /// First non-tombstone slot strictly after `from`.
    pub fn next_non_removed(&self, from: usize) -> Option<usize> {
        (from + 1..self.tokens.len()).find(|&i| !self.tokens[i].is_removed())
    }

    /// Last non-tombstone slot strictly before `from`.
    pub fn prev_non_removed(&self, from: usize) -> Option<usize> {
        (0..from).rev().find(|&i| !self.tokens[i].is_removed())
    }

    // ----- kind counts ------------------------------------------------

    pub fn is_kind_found(&self, kind: TokenKind) -> bool {
        self.kind_counts.get(&kind).is_some_and(|&count| count > 0)
    }

    pub fn is_any_kind_found(&self, kinds: &[TokenKind]) -> bool {
        kinds.iter().any(|&kind| self.is_kind_found(kind))
    }

    pub fn are_all_kinds_found(&self, kinds: &[TokenKind]) -> bool {
        kinds.iter().all(|&kind| self.is_kind_found(kind))
    }

    pub fn is_any_keyword_found(&self) -> bool {
        self.kind_counts
            .iter()
            .any(|(kind, &count)| count > 0 && kind.is_keyword())
    }

    // ----- change tracking ---------------------------------------------

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn clear_changed(&mut self) {
        self.changed = false;
    }

    /// Hash of the code the stream would generate. Token boundaries do not
    /// influence the value, only the bytes.
    pub fn code_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for token in &self.tokens {
            if !token.is_removed() {
                hasher.write(token.content().as_bytes());
            }
        }
        hasher.finish()
    }

    // ----- mutation -----------------------------------------------------

    /// Replaces kind and content at `index`, keeping the slot's line. A
    /// replacement identical to the current token is a no-op and does not
    /// mark the stream changed.
    pub fn replace_at(&mut self, index: usize, kind: TokenKind, content: impl Into<String>) {
        let content = content.into();
        let token = &self.tokens[index];
        if token.kind() == kind && token.content() == content {
            return;
        }
        let old_kind = token.kind();
        let line = token.line();
        self.adjust_counts(old_kind, kind);
        self.tokens[index] = Token::new(kind, content, line);
        self.touch();
    }

    /// Retags `index` without touching content.
    pub fn set_kind_at(&mut self, index: usize, kind: TokenKind) {
        let old_kind = self.tokens[index].kind();
        if old_kind == kind {
            return;
        }
        self.adjust_counts(old_kind, kind);
        self.tokens[index].set_kind(kind);
        self.touch();
    }

    /// Rewrites content at `index`, keeping the kind.
    pub fn set_content_at(&mut self, index: usize, content: impl Into<String>) {
        let content = content.into();
        if self.tokens[index].content() == content {
            return;
        }
        self.tokens[index].set_content(content);
        self.touch();
    }

    /// Tombstones the slot at `index`. Indices of other tokens are
    /// unaffected; the slot disappears from generated code immediately and
    /// from the vector at the next [`Self::compact`].
    pub fn clear_at(&mut self, index: usize) {
        if self.tokens[index].is_removed() {
            return;
        }
        let old_kind = self.tokens[index].kind();
        let line = self.tokens[index].line();
        self.adjust_counts(old_kind, TokenKind::Removed);
        self.tokens[index] = Token::removed(line);
        self.touch();
    }

    /// Clears `index` and folds whitespace around the gap together, so a
    /// removed token does not leave two whitespace runs side by side.
    pub fn clear_and_merge_surrounding_whitespace(&mut self, index: usize) {
        let count = self.tokens.len();
        self.clear_at(index);
        if index == count - 1 {
            return;
        }

        let Some(next) = self.next_non_removed(index) else {
            return;
        };
        if !self.tokens[next].is_whitespace() {
            return;
        }

        if index > 0 {
            if let Some(prev) = self.prev_non_removed(index) {
                if self.tokens[prev].is_whitespace() {
                    let merged = format!(
                        "{}{}",
                        self.tokens[prev].content(),
                        self.tokens[next].content()
                    );
                    self.set_content_at(prev, merged);
                } else if self.tokens[prev + 1].is_removed() {
                    let content = self.tokens[next].content().to_string();
                    let line = self.tokens[prev + 1].line();
                    self.adjust_counts(TokenKind::Removed, TokenKind::Whitespace);
                    self.tokens[prev + 1] = Token::new(TokenKind::Whitespace, content, line);
                    self.touch();
                }
            }
        }

        self.clear_at(next);
    }

    /// Splices `tokens` in before `index`. Everything at or after `index`
    /// shifts right by `tokens.len()`.
    pub fn insert_at(&mut self, index: usize, tokens: Vec<Token>) {
        assert!(index <= self.tokens.len(), "insert index out of range");
        if tokens.is_empty() {
            return;
        }
        for token in &tokens {
            self.adjust_counts_insert(token.kind());
        }
        self.tokens.splice(index..index, tokens);
        self.touch();
    }

    /// Replaces the slots in `range` with `tokens`. The replacement may be
    /// shorter or longer than the range; everything after the range shifts
    /// accordingly.
    pub fn override_range(&mut self, range: std::ops::Range<usize>, tokens: Vec<Token>) {
        assert!(
            range.start <= range.end && range.end <= self.tokens.len(),
            "override range out of bounds"
        );
        if range.is_empty() && tokens.is_empty() {
            return;
        }
        for index in range.clone() {
            let kind = self.tokens[index].kind();
            if let Some(count) = self.kind_counts.get_mut(&kind) {
                *count = count.saturating_sub(1);
            }
            if kind == TokenKind::Removed {
                self.removed = self.removed.saturating_sub(1);
            }
        }
        for token in &tokens {
            self.adjust_counts_insert(token.kind());
        }
        self.tokens.splice(range, tokens);
        self.touch();
    }

    /// Drops tombstoned slots. Indices held across this call are invalid.
    pub fn compact(&mut self) {
        if self.removed == 0 {
            return;
        }
        self.tokens.retain(|token| !token.is_removed());
        self.kind_counts.remove(&TokenKind::Removed);
        self.removed = 0;
        self.block_edges.borrow_mut().clear();
    }

    /// Concatenates the contents of all live tokens.
    pub fn generate_code(&self) -> String {
        let capacity = self
            .tokens
            .iter()
            .map(|token| token.content().len())
            .sum();
        let mut code = String::with_capacity(capacity);
        for token in &self.tokens {
            if !token.is_removed() {
                code.push_str(token.content());
            }
        }
        code
    }

    // ----- sequence search ----------------------------------------------

    /// Finds the first run of meaningful tokens matching `pattern` between
    /// `start` and `end` (both inclusive; `end` defaults to the last index).
    ///
    /// Returns the matched tokens keyed by index. The scan resumes from the
    /// position after a failed candidate, not from the failure point, so
    /// overlapping near-matches are not skipped.
    ///
    /// Pattern items must be meaningful kinds; an empty or trivia-laden
    /// pattern is a programming error.
    pub fn find_sequence(
        &self,
        pattern: &[SequenceItem<'_>],
        start: usize,
        end: Option<usize>,
        case_sensitive: bool,
    ) -> Option<BTreeMap<usize, Token>> {
        assert!(!pattern.is_empty(), "sequence pattern must not be empty");
        for item in pattern {
            assert!(
                item.kind.is_meaningful(),
                "sequence pattern may only contain meaningful kinds"
            );
        }

        if self.tokens.is_empty() {
            return None;
        }
        let end = end
            .unwrap_or(self.tokens.len() - 1)
            .min(self.tokens.len() - 1);

        let mut candidate = start;
        'candidates: while candidate <= end {
            let token = &self.tokens[candidate];
            if !token.is_meaningful() || !pattern[0].matches(token, case_sensitive) {
                candidate += 1;
                continue;
            }

            let mut found = BTreeMap::new();
            found.insert(candidate, token.clone());
            let mut at = candidate;
            for item in &pattern[1..] {
                at = match self.next_meaningful(at) {
                    // Once the walk leaves the window no later candidate
                    // can fit either.
                    Some(next) if next <= end => next,
                    _ => return None,
                };
                if !item.matches(&self.tokens[at], case_sensitive) {
                    candidate += 1;
                    continue 'candidates;
                }
                found.insert(at, self.tokens[at].clone());
            }
            return Some(found);
        }

        None
    }

    // ----- internals ----------------------------------------------------

    fn touch(&mut self) {
        self.changed = true;
        self.block_edges.borrow_mut().clear();
    }

    fn adjust_counts(&mut self, old: TokenKind, new: TokenKind) {
        if old == new {
            return;
        }
        if let Some(count) = self.kind_counts.get_mut(&old) {
            *count = count.saturating_sub(1);
        }
        *self.kind_counts.entry(new).or_insert(0) += 1;
        if old == TokenKind::Removed {
            self.removed = self.removed.saturating_sub(1);
        }
        if new == TokenKind::Removed {
            self.removed += 1;
        }
    }

    fn adjust_counts_insert(&mut self, kind: TokenKind) {
        *self.kind_counts.entry(kind).or_insert(0) += 1;
        if kind == TokenKind::Removed {
            self.removed += 1;
        }
    }

    pub(crate) fn block_edge_cached(&self, index: usize) -> Option<usize> {
        self.block_edges.borrow().get(&index).copied()
    }

    pub(crate) fn cache_block_edge(&self, open: usize, close: usize) {
        let mut edges = self.block_edges.borrow_mut();
        edges.insert(open, close);
        edges.insert(close, open);
    }
}

impl Index<usize> for TokenStream {
    type Output = Token;

    fn index(&self, index: usize) -> &Token {
        &self.tokens[index]
    }
}
