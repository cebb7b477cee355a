use super::helpers::{normalize_token, strip_strength};
use super::knowledge::KnowledgeBase;
use super::types::{MatchTier, NormalizedEntry, NormalizedInput};

/// Resolve a raw medication list against the knowledge base.
///
/// Lookup order per entry: alias index, then display names, then both again
/// with a trailing strength removed. No fuzzy matching: anything else is
/// carried forward unresolved. An empty string stands in for a missing entry.
pub fn resolve<S: AsRef<str>>(kb: &KnowledgeBase, raw: &[S]) -> NormalizedInput {
    let entries = raw
        .iter()
        .enumerate()
        .map(|(position, text)| {
            let original_text = text.as_ref().to_string();
            let resolution = resolve_one(kb, &original_text);

            if resolution.is_none() {
                tracing::warn!(
                    position,
                    original = %original_text,
                    "Unresolved medication, excluded from interaction matching"
                );
            }

            NormalizedEntry {
                position,
                original_text,
                was_resolved: resolution.is_some(),
                matched_by: resolution.map(|(_, tier)| tier),
                resolved_id: resolution.map(|(id, _)| id.to_string()),
            }
        })
        .collect();

    NormalizedInput { entries }
}

/// Resolve a single entry to `(canonical_id, tier)`.
pub fn resolve_one<'kb>(kb: &'kb KnowledgeBase, raw: &str) -> Option<(&'kb str, MatchTier)> {
    let token = normalize_token(raw);
    if token.is_empty() {
        return None;
    }

    if let Some(hit) = lookup_tiers(kb, &token) {
        return Some(hit);
    }

    let stripped = strip_strength(&token)?;
    lookup_tiers(kb, stripped).map(|(id, _)| (id, MatchTier::StrengthStripped))
}

fn lookup_tiers<'kb>(kb: &'kb KnowledgeBase, token: &str) -> Option<(&'kb str, MatchTier)> {
    kb.resolve_alias(token)
        .map(|id| (id, MatchTier::Alias))
        .or_else(|| {
            kb.resolve_display_name(token)
                .map(|id| (id, MatchTier::DisplayName))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::knowledge::tests::test_kb;

    #[test]
    fn resolves_alias_display_and_id() {
        let kb = test_kb();
        let input = resolve(&kb, &["Rivotril", "Coumadin", "warfarin"]);
        let ids: Vec<Option<&str>> = input
            .entries
            .iter()
            .map(|e| e.resolved_id.as_deref())
            .collect();
        assert_eq!(ids, vec![Some("clonazepam"), Some("warfarin"), Some("warfarin")]);
        assert_eq!(input.entries[0].matched_by, Some(MatchTier::Alias));
        assert_eq!(input.entries[1].matched_by, Some(MatchTier::DisplayName));
    }

    #[test]
    fn resolution_is_case_and_whitespace_insensitive() {
        let kb = test_kb();
        let input = resolve(&kb, &["  RIVOTRIL ", "cOuMaDiN", "\tAcetaminophen\n"]);
        assert!(input.entries.iter().all(|e| e.was_resolved));
        assert_eq!(input.entries[0].original_text, "  RIVOTRIL ");
    }

    #[test]
    fn canonical_id_resolves_to_itself() {
        let kb = test_kb();
        for id in ["paracetamol", "warfarin", "tramadol", "clonazepam"] {
            assert_eq!(resolve_one(&kb, id).map(|(r, _)| r), Some(id));
        }
    }

    #[test]
    fn strength_suffix_is_stripped() {
        let kb = test_kb();
        assert_eq!(
            resolve_one(&kb, "Tramal 50mg"),
            Some(("tramadol", MatchTier::StrengthStripped))
        );
        assert_eq!(
            resolve_one(&kb, "warfarin 5 mg tabs"),
            Some(("warfarin", MatchTier::StrengthStripped))
        );
    }

    #[test]
    fn unknown_and_misspelled_stay_unresolved() {
        let kb = test_kb();
        let input = resolve(&kb, &["Unknownium 500mg", "warfrin", ""]);
        assert_eq!(input.resolved_count(), 0);
        assert_eq!(input.unresolved_count(), 3);
        assert!(input.entries.iter().all(|e| e.resolved_id.is_none() && e.matched_by.is_none()));
        assert_eq!(input.entries[2].original_text, "");
    }

    #[test]
    fn preserves_order_and_positions() {
        let kb = test_kb();
        let input = resolve(&kb, &["Advil", "nope", "Cartia"]);
        let positions: Vec<usize> = input.entries.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert_eq!(input.entries[2].resolved_id.as_deref(), Some("aspirin"));
    }

    #[test]
    fn distinct_resolved_keeps_first_spelling() {
        let kb = test_kb();
        let input = resolve(&kb, &["Coumadin", "Advil", "warfarin"]);
        let distinct = input.distinct_resolved();
        assert_eq!(distinct.len(), 2);
        assert_eq!(distinct[0].original_text, "Coumadin");
        assert_eq!(distinct[0].canonical_id, "warfarin");
        assert_eq!(distinct[1].canonical_id, "ibuprofen");
    }
}
