use crate::{Project, ProjectChange, ProjectId};

/// Projects of the active owner, newest first.
///
/// While an initial fetch is outstanding, pushed changes are applied right
/// away and also recorded; when the fetch lands the list is replaced and the
/// recorded changes are replayed on top of it, so a push that raced the
/// fetch is neither lost nor duplicated.
#[derive(Clone, Debug, Default)]
pub struct ProjectList {
    entries: Vec<Project>,
    loading: bool,
    replay: Vec<ProjectChange>,
}

impl ProjectList {
    pub fn iter(&self) -> std::slice::Iter<'_, Project> {
        self.entries.iter()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn get(&self, project_id: &ProjectId) -> Option<&Project> {
        self.entries.iter().find(|p| &p.id == project_id)
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, project_id: &ProjectId) -> bool {
        self.get(project_id).is_some()
    }

    pub(crate) fn reset(&mut self) {
        self.entries.clear();
        self.replay.clear();
        self.loading = false;
    }

    pub(crate) fn begin_loading(&mut self) {
        self.reset();
        self.loading = true;
    }

    pub(crate) fn finish_loading(&mut self, fetched: Vec<Project>) {
        let mut entries: Vec<Project> = Vec::with_capacity(fetched.len());
        for project in fetched {
            if entries.iter().any(|p| p.id == project.id) {
                continue;
            }
            entries.push(project);
        }
        sort_newest_first(&mut entries);
        self.entries = entries;

        self.loading = false;
        for change in std::mem::take(&mut self.replay) {
            self.merge(change);
        }
    }

    /// The fetch failed: whatever pushes already delivered stays as is.
    pub(crate) fn abort_loading(&mut self) {
        self.loading = false;
        self.replay.clear();
    }

    pub(crate) fn apply(&mut self, change: ProjectChange) {
        if self.loading {
            self.replay.push(change.clone());
        }
        self.merge(change);
    }

    fn merge(&mut self, change: ProjectChange) {
        match change {
            ProjectChange::Inserted(project) => {
                self.entries.retain(|p| p.id != project.id);
                self.entries.insert(0, project);
                sort_newest_first(&mut self.entries);
            }
            ProjectChange::Deleted(project_id) => {
                self.entries.retain(|p| p.id != project_id);
            }
        }
    }
}

// `sort_by` is stable, so equal timestamps keep their current relative order.
fn sort_newest_first(entries: &mut [Project]) {
    entries.sort_by(|a, b| b.created_at_unix_ms.cmp(&a.created_at_unix_ms));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OwnerId;

    fn project(id: &str, created_at_unix_ms: u64) -> Project {
        Project {
            id: ProjectId::new(id),
            owner_id: OwnerId::new("owner"),
            title: id.to_owned(),
            prompt: format!("prompt {id}"),
            generated_code: format!("code {id}"),
            is_public: false,
            created_at_unix_ms,
        }
    }

    fn ids(list: &ProjectList) -> Vec<&str> {
        list.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn fetched_projects_are_sorted_newest_first() {
        let mut list = ProjectList::default();
        list.begin_loading();
        list.finish_loading(vec![project("a", 10), project("c", 30), project("b", 20)]);
        assert_eq!(ids(&list), vec!["c", "b", "a"]);
        assert!(!list.is_loading());
    }

    #[test]
    fn fetched_duplicates_are_dropped() {
        let mut list = ProjectList::default();
        list.begin_loading();
        list.finish_loading(vec![project("a", 10), project("a", 10), project("b", 5)]);
        assert_eq!(ids(&list), vec!["a", "b"]);
    }

    #[test]
    fn insert_keeps_descending_order_for_late_delivery() {
        let mut list = ProjectList::default();
        list.begin_loading();
        list.finish_loading(vec![project("new", 300), project("old", 100)]);

        list.apply(ProjectChange::Inserted(project("middle", 200)));
        assert_eq!(ids(&list), vec!["new", "middle", "old"]);
    }

    #[test]
    fn insert_of_known_id_replaces_entry() {
        let mut list = ProjectList::default();
        list.begin_loading();
        list.finish_loading(vec![project("a", 100)]);

        let mut updated = project("a", 100);
        updated.title = "renamed".to_owned();
        list.apply(ProjectChange::Inserted(updated));

        assert_eq!(list.len(), 1);
        assert_eq!(list.iter().next().unwrap().title, "renamed");
    }

    #[test]
    fn equal_timestamps_put_latest_arrival_first() {
        let mut list = ProjectList::default();
        list.apply(ProjectChange::Inserted(project("first", 100)));
        list.apply(ProjectChange::Inserted(project("second", 100)));
        list.apply(ProjectChange::Inserted(project("older", 50)));
        assert_eq!(ids(&list), vec!["second", "first", "older"]);
    }

    #[test]
    fn delete_of_unknown_id_is_a_no_op() {
        let mut list = ProjectList::default();
        list.apply(ProjectChange::Inserted(project("a", 1)));
        list.apply(ProjectChange::Deleted(ProjectId::new("missing")));
        assert_eq!(ids(&list), vec!["a"]);
    }

    #[test]
    fn pushes_during_fetch_survive_wholesale_replacement() {
        let mut list = ProjectList::default();
        list.begin_loading();

        // Inserted after the fetch snapshot was taken.
        list.apply(ProjectChange::Inserted(project("fresh", 400)));
        // Deleted after the snapshot: the fetch still contains it.
        list.apply(ProjectChange::Deleted(ProjectId::new("gone")));
        // Inserted before the snapshot: the fetch contains it too.
        list.apply(ProjectChange::Inserted(project("early", 300)));

        list.finish_loading(vec![
            project("early", 300),
            project("gone", 200),
            project("base", 100),
        ]);

        assert_eq!(ids(&list), vec!["fresh", "early", "base"]);
    }

    #[test]
    fn failed_fetch_keeps_pushed_entries() {
        let mut list = ProjectList::default();
        list.begin_loading();
        list.apply(ProjectChange::Inserted(project("pushed", 10)));
        list.abort_loading();

        assert_eq!(ids(&list), vec!["pushed"]);
        assert!(!list.is_loading());

        list.apply(ProjectChange::Inserted(project("later", 20)));
        assert_eq!(ids(&list), vec!["later", "pushed"]);
    }
}
