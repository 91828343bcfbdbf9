use crate::model::NotebookInfo;

/// How a wikilink target resolved against a candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// A candidate's notebook ID equals the target exactly.
    ById(&'a NotebookInfo),
    /// No ID matched; a title matched case-insensitively.
    /// `ambiguous_with` lists the later candidates sharing that title,
    /// which lost to the first match.
    ByTitle {
        notebook: &'a NotebookInfo,
        ambiguous_with: Vec<&'a NotebookInfo>,
    },
    Dangling,
}

impl<'a> Resolution<'a> {
    pub fn notebook(&self) -> Option<&'a NotebookInfo> {
        match self {
            Resolution::ById(notebook) => Some(*notebook),
            Resolution::ByTitle { notebook, .. } => Some(*notebook),
            Resolution::Dangling => None,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Resolution::ByTitle { ambiguous_with, .. } if !ambiguous_with.is_empty())
    }
}

/// Resolve a wikilink target: exact notebook ID first, then title
/// (case-insensitive). First match in candidate order wins.
pub fn resolve_wikilink<'a, I>(target: &str, candidates: I) -> Option<&'a NotebookInfo>
where
    I: IntoIterator<Item = &'a NotebookInfo>,
    I::IntoIter: Clone,
{
    resolve_detailed(target, candidates).notebook()
}

/// Like [`resolve_wikilink`], but reports title collisions to the caller.
pub fn resolve_detailed<'a, I>(target: &str, candidates: I) -> Resolution<'a>
where
    I: IntoIterator<Item = &'a NotebookInfo>,
    I::IntoIter: Clone,
{
    let candidates = candidates.into_iter();

    if let Some(by_id) = candidates
        .clone()
        .find(|candidate| candidate.notebook_id.as_str() == target)
    {
        return Resolution::ById(by_id);
    }

    let wanted = target.to_lowercase();
    let mut title_matches = candidates.filter(|candidate| candidate.title.to_lowercase() == wanted);

    match title_matches.next() {
        Some(notebook) => Resolution::ByTitle {
            notebook,
            ambiguous_with: title_matches.collect(),
        },
        None => Resolution::Dangling,
    }
}
