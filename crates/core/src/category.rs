//! Category name normalization and uniqueness rules.
//!
//! Category names are compared and stored in normalized form: surrounding
//! whitespace trimmed, then lowercased. Uniqueness is per user over the
//! normalized name, so "Food" and "food" are the same category.

use std::collections::HashSet;
use std::hash::BuildHasher;

use uuid::Uuid;

/// Name of the per-user fallback category that receives transactions
/// reassigned when their category is deleted.
pub const FALLBACK_CATEGORY_NAME: &str = "uncategorized";

/// Normalizes a category name for comparison and storage.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A (user, normalized name) pair for uniqueness checking.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CategoryNameEntry {
    /// Owning user ID.
    pub user_id: Uuid,
    /// Normalized category name.
    pub name: String,
}

impl CategoryNameEntry {
    /// Creates an entry from a raw name, normalizing it.
    #[must_use]
    pub fn new(user_id: Uuid, name: &str) -> Self {
        Self {
            user_id,
            name: normalize_name(name),
        }
    }
}

/// Checks if a name is free for a user given existing names.
///
/// This is a pure function that can be tested without database access.
/// The authoritative guard is the store's unique index; this mirrors it.
#[must_use]
pub fn is_name_available<S: BuildHasher>(
    existing: &HashSet<CategoryNameEntry, S>,
    user_id: Uuid,
    name: &str,
) -> bool {
    !existing.contains(&CategoryNameEntry::new(user_id, name))
}

/// Checks if renaming a category is allowed.
///
/// Renaming to the same normalized name is a no-op and always allowed;
/// otherwise the target name must be free for the user.
#[must_use]
pub fn is_rename_allowed<S: BuildHasher>(
    existing: &HashSet<CategoryNameEntry, S>,
    user_id: Uuid,
    current_name: &str,
    new_name: &str,
) -> bool {
    if normalize_name(current_name) == normalize_name(new_name) {
        return true;
    }
    is_name_available(existing, user_id, new_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for generating ASCII category names with stray whitespace.
    fn name_strategy() -> impl Strategy<Value = String> {
        "[a-zA-Z][a-zA-Z0-9 ]{0,15}"
    }

    fn entry_set_strategy() -> impl Strategy<Value = HashSet<CategoryNameEntry>> {
        prop::collection::hash_set(
            (any::<u128>(), name_strategy())
                .prop_map(|(bits, name)| CategoryNameEntry::new(Uuid::from_u128(bits), &name)),
            0..20,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A name already held by the same user is never available again,
        /// regardless of casing or surrounding whitespace.
        #[test]
        fn prop_duplicate_name_same_user_rejected(
            user_bits in any::<u128>(),
            name in name_strategy(),
        ) {
            let user_id = Uuid::from_u128(user_bits);

            let mut existing = HashSet::new();
            existing.insert(CategoryNameEntry::new(user_id, &name));

            prop_assert!(!is_name_available(&existing, user_id, &name));
            prop_assert!(!is_name_available(&existing, user_id, &name.to_uppercase()));
            prop_assert!(!is_name_available(&existing, user_id, &format!("  {name}  ")));
        }

        /// The same name held by a different user does not collide.
        #[test]
        fn prop_same_name_different_user_allowed(
            user1_bits in any::<u128>(),
            user2_bits in any::<u128>(),
            name in name_strategy(),
        ) {
            prop_assume!(user1_bits != user2_bits);

            let user1 = Uuid::from_u128(user1_bits);
            let user2 = Uuid::from_u128(user2_bits);

            let mut existing = HashSet::new();
            existing.insert(CategoryNameEntry::new(user1, &name));

            prop_assert!(is_name_available(&existing, user2, &name));
        }

        /// Availability agrees with set membership over normalized entries.
        #[test]
        fn prop_availability_matches_membership(
            existing in entry_set_strategy(),
            user_bits in any::<u128>(),
            name in name_strategy(),
        ) {
            let user_id = Uuid::from_u128(user_bits);
            let taken = existing.contains(&CategoryNameEntry::new(user_id, &name));

            prop_assert_eq!(is_name_available(&existing, user_id, &name), !taken);
        }

        /// Renaming to the current name (any casing) is always allowed.
        #[test]
        fn prop_rename_to_same_name_allowed(
            existing in entry_set_strategy(),
            user_bits in any::<u128>(),
            name in name_strategy(),
        ) {
            let user_id = Uuid::from_u128(user_bits);

            prop_assert!(is_rename_allowed(&existing, user_id, &name, &name));
            prop_assert!(is_rename_allowed(&existing, user_id, &name, &name.to_uppercase()));
        }

        /// Renaming onto another category's name is rejected.
        #[test]
        fn prop_rename_to_taken_name_rejected(
            user_bits in any::<u128>(),
            current in name_strategy(),
            other in name_strategy(),
        ) {
            prop_assume!(normalize_name(&current) != normalize_name(&other));

            let user_id = Uuid::from_u128(user_bits);

            let mut existing = HashSet::new();
            existing.insert(CategoryNameEntry::new(user_id, &current));
            existing.insert(CategoryNameEntry::new(user_id, &other));

            prop_assert!(!is_rename_allowed(&existing, user_id, &current, &other));
        }
    }

    #[test]
    fn test_normalize_trims_and_lowercases() {
        assert_eq!(normalize_name("  Food  "), "food");
        assert_eq!(normalize_name("GROCERIES"), "groceries");
        assert_eq!(normalize_name("Dining Out"), "dining out");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn test_fallback_name_is_already_normalized() {
        assert_eq!(
            normalize_name(FALLBACK_CATEGORY_NAME),
            FALLBACK_CATEGORY_NAME
        );
    }

    #[test]
    fn test_empty_set_allows_any_name() {
        let existing = HashSet::new();
        let user_id = Uuid::new_v4();

        assert!(is_name_available(&existing, user_id, "food"));
        assert!(is_name_available(&existing, user_id, "Salary"));
    }

    #[test]
    fn test_case_variants_collide() {
        let user_id = Uuid::new_v4();
        let mut existing = HashSet::new();
        existing.insert(CategoryNameEntry::new(user_id, "Food"));

        assert!(!is_name_available(&existing, user_id, "food"));
        assert!(!is_name_available(&existing, user_id, "FOOD"));
        assert!(!is_name_available(&existing, user_id, " food "));
    }

    #[test]
    fn test_rename_to_free_name_allowed() {
        let user_id = Uuid::new_v4();
        let mut existing = HashSet::new();
        existing.insert(CategoryNameEntry::new(user_id, "food"));

        assert!(is_rename_allowed(&existing, user_id, "food", "groceries"));
    }
}
