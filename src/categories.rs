//! Predefined history categories. History entries reference these by id;
//! the store does not enforce that the id exists.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

pub const PREDEFINED_CATEGORIES: &[Category] = &[
    Category { id: "work", name: "Work", icon: "💼", color: "#3b82f6" },
    Category { id: "study", name: "Study", icon: "📚", color: "#8b5cf6" },
    Category { id: "travel", name: "Travel", icon: "✈️", color: "#10b981" },
    Category { id: "personal", name: "Personal", icon: "👤", color: "#f59e0b" },
    Category { id: "food", name: "Food", icon: "🍽️", color: "#ef4444" },
    Category { id: "shopping", name: "Shopping", icon: "🛍️", color: "#ec4899" },
    Category { id: "health", name: "Health", icon: "⚕️", color: "#14b8a6" },
    Category { id: "other", name: "Other", icon: "📝", color: "#64748b" },
];

pub fn find_category(id: &str) -> Option<&'static Category> {
    PREDEFINED_CATEGORIES.iter().find(|c| c.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_id() {
        assert_eq!(find_category("travel").map(|c| c.name), Some("Travel"));
        assert!(find_category("Travel").is_none());
        assert!(find_category("unknown").is_none());
    }
}
