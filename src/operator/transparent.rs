use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Single input operators which keep the relations and join shape of their input.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, AsRefStr, Display, EnumIter, EnumString)]
pub enum TransparentKind {
    Hash,
    Sort,
    Materialize,
    Memoize,
    Gather,
    #[strum(serialize = "Gather Merge")]
    GatherMerge,
    Result,
    ProjectSet,
    Unique,
    #[strum(serialize = "Incremental Sort")]
    IncrementalSort,
    Aggregate,
    Group,
    Limit,
}
