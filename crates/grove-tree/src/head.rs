use grove_types::ObjectId;

/// What HEAD resolves to, as supplied by the ref layer.
///
/// Grove never reads ref files itself; callers resolve branch names and
/// hand the result over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Head {
    /// No commit yet (freshly initialized repository).
    #[default]
    Unborn,
    /// A commit whose root tree is the snapshot.
    Commit(ObjectId),
    /// A root tree given directly.
    Tree(ObjectId),
}

impl Head {
    pub fn is_unborn(&self) -> bool {
        matches!(self, Self::Unborn)
    }
}

impl From<Option<ObjectId>> for Head {
    /// `Some(id)` is taken to be a commit ID.
    fn from(commit: Option<ObjectId>) -> Self {
        commit.map_or(Self::Unborn, Self::Commit)
    }
}
