use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Binary join operators.
///
/// Input 0 of a join is its outer side, input 1 its inner side. For a hash join the inner side is
/// the `Hash` node building the hash table.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, AsRefStr, Display, EnumIter, EnumString)]
pub enum JoinKind {
    #[strum(serialize = "Hash Join")]
    HashJoin,
    #[strum(serialize = "Merge Join")]
    MergeJoin,
    #[strum(serialize = "Nested Loop")]
    NestedLoop,
}
