use std::collections::BTreeSet;

/// Distinct base relation names covered by a subtree.
pub type RelationSet = BTreeSet<String>;

/// Properties of a plan node derived from its own fields and the properties of its inputs.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct LogicalProperty {
    relations: RelationSet,
}

impl LogicalProperty {
    /// Derives the property of a node from its relation name and its inputs' properties.
    pub fn derive<'a, I>(relation_name: Option<&str>, inputs: I) -> Self
    where
        I: IntoIterator<Item = &'a LogicalProperty>,
    {
        let mut relations = RelationSet::new();
        if let Some(name) = relation_name {
            relations.insert(name.to_string());
        }
        for input in inputs {
            relations.extend(input.relations.iter().cloned());
        }

        Self { relations }
    }

    pub fn relations(&self) -> &RelationSet {
        &self.relations
    }

    /// Whether the subtree joins more than one base relation.
    pub fn is_composite(&self) -> bool {
        self.relations.len() > 1
    }
}
