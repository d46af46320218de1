//! Parent assignment checks, including a full ancestor walk.

use std::collections::HashSet;

use famledger_shared::types::{CategoryId, FamilyId};

use super::CategoryType;
use super::error::CategoryRuleError;

/// The parts of a category the hierarchy rules look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryNode {
    /// Category id.
    pub id: CategoryId,
    /// Owning family.
    pub family_id: FamilyId,
    /// Income or expense.
    pub category_type: CategoryType,
    /// Current parent.
    pub parent_id: Option<CategoryId>,
    /// Soft-delete flag.
    pub is_active: bool,
}

/// Checks that `parent_id` may become the parent of a category.
///
/// `child_id` is `None` for a category not yet created. `lookup` returns
/// any category by id regardless of family; the walk stops at roots, at
/// unknown ids and at already-visited ids.
///
/// # Errors
///
/// Returns the first violated rule: self-parenting, missing/foreign/inactive
/// parent, type mismatch, or a cycle through the parent's ancestors.
pub fn validate_parent<F>(
    child_id: Option<CategoryId>,
    child_type: CategoryType,
    family_id: FamilyId,
    parent_id: CategoryId,
    lookup: F,
) -> Result<(), CategoryRuleError>
where
    F: Fn(CategoryId) -> Option<CategoryNode>,
{
    if child_id == Some(parent_id) {
        return Err(CategoryRuleError::SelfParent);
    }

    let parent = lookup(parent_id)
        .filter(|p| p.family_id == family_id && p.is_active)
        .ok_or(CategoryRuleError::ParentNotFound(parent_id))?;

    if parent.category_type != child_type {
        return Err(CategoryRuleError::TypeMismatch {
            parent: parent.category_type.to_string(),
            child: child_type.to_string(),
        });
    }

    let Some(child_id) = child_id else {
        return Ok(());
    };

    let mut visited = HashSet::from([parent.id]);
    let mut next = parent.parent_id;
    while let Some(ancestor_id) = next {
        if ancestor_id == child_id {
            return Err(CategoryRuleError::Cycle(parent_id));
        }
        if !visited.insert(ancestor_id) {
            break;
        }
        next = lookup(ancestor_id).and_then(|a| a.parent_id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Tree {
        family_id: FamilyId,
        nodes: HashMap<CategoryId, CategoryNode>,
    }

    impl Tree {
        fn new() -> Self {
            Self {
                family_id: FamilyId::new(),
                nodes: HashMap::new(),
            }
        }

        fn add(&mut self, category_type: CategoryType, parent_id: Option<CategoryId>) -> CategoryId {
            let id = CategoryId::new();
            self.nodes.insert(
                id,
                CategoryNode {
                    id,
                    family_id: self.family_id,
                    category_type,
                    parent_id,
                    is_active: true,
                },
            );
            id
        }

        fn check(
            &self,
            child: Option<CategoryId>,
            child_type: CategoryType,
            parent: CategoryId,
        ) -> Result<(), CategoryRuleError> {
            validate_parent(child, child_type, self.family_id, parent, |id| {
                self.nodes.get(&id).cloned()
            })
        }
    }

    #[test]
    fn test_new_child_under_same_type_parent() {
        let mut tree = Tree::new();
        let food = tree.add(CategoryType::Expense, None);
        assert!(tree.check(None, CategoryType::Expense, food).is_ok());
    }

    #[test]
    fn test_self_parent_rejected() {
        let mut tree = Tree::new();
        let food = tree.add(CategoryType::Expense, None);
        assert_eq!(
            tree.check(Some(food), CategoryType::Expense, food),
            Err(CategoryRuleError::SelfParent)
        );
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let mut tree = Tree::new();
        let salary = tree.add(CategoryType::Income, None);
        assert!(matches!(
            tree.check(None, CategoryType::Expense, salary),
            Err(CategoryRuleError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_inactive_or_foreign_parent_not_found() {
        let mut tree = Tree::new();
        let food = tree.add(CategoryType::Expense, None);
        if let Some(node) = tree.nodes.get_mut(&food) {
            node.is_active = false;
        }
        assert_eq!(
            tree.check(None, CategoryType::Expense, food),
            Err(CategoryRuleError::ParentNotFound(food))
        );

        let other = Tree::new();
        let result = validate_parent(None, CategoryType::Expense, other.family_id, food, |id| {
            tree.nodes.get(&id).cloned()
        });
        assert_eq!(result, Err(CategoryRuleError::ParentNotFound(food)));
    }

    #[test]
    fn test_two_level_cycle_rejected() {
        // B is a child of A; making B the parent of A closes a loop.
        let mut tree = Tree::new();
        let a = tree.add(CategoryType::Expense, None);
        let b = tree.add(CategoryType::Expense, Some(a));
        assert_eq!(
            tree.check(Some(a), CategoryType::Expense, b),
            Err(CategoryRuleError::Cycle(b))
        );
    }

    #[test]
    fn test_deep_cycle_rejected() {
        let mut tree = Tree::new();
        let a = tree.add(CategoryType::Expense, None);
        let b = tree.add(CategoryType::Expense, Some(a));
        let c = tree.add(CategoryType::Expense, Some(b));
        let d = tree.add(CategoryType::Expense, Some(c));
        assert!(matches!(
            tree.check(Some(a), CategoryType::Expense, d),
            Err(CategoryRuleError::Cycle(_))
        ));
    }

    #[test]
    fn test_reparent_to_sibling_branch_ok() {
        let mut tree = Tree::new();
        let root = tree.add(CategoryType::Expense, None);
        let left = tree.add(CategoryType::Expense, Some(root));
        let right = tree.add(CategoryType::Expense, Some(root));
        assert!(tree.check(Some(left), CategoryType::Expense, right).is_ok());
    }

    #[test]
    fn test_existing_corrupt_loop_terminates() {
        let mut tree = Tree::new();
        let a = tree.add(CategoryType::Expense, None);
        let b = tree.add(CategoryType::Expense, Some(a));
        if let Some(node) = tree.nodes.get_mut(&a) {
            node.parent_id = Some(b);
        }
        let fresh = tree.add(CategoryType::Expense, None);
        assert!(tree.check(Some(fresh), CategoryType::Expense, a).is_ok());
    }
}
