use crate::containers::HashMap;
use crate::engine::variables::VariableId;

/// The registry of externally named variables.
///
/// `sorted_names` lists every name that appears textually in the input, in lexicographic order;
/// only names whose combined coefficient survived preparation have an internal variable.
#[derive(Clone, Debug, Default)]
pub(crate) struct VariableNames {
    by_name: HashMap<String, VariableId>,
    sorted_names: Vec<String>,
}

impl VariableNames {
    /// Get the [`VariableId`] associated with the given name.
    pub(crate) fn get_variable_by_name(&self, name: &str) -> Option<VariableId> {
        self.by_name.get(name).copied()
    }

    pub(crate) fn add(&mut self, name: String, variable: VariableId) {
        let _ = self.by_name.insert(name, variable);
    }

    pub(crate) fn set_sorted_names(&mut self, names: Vec<String>) {
        self.sorted_names = names;
    }

    /// Every input name, lexicographically sorted.
    pub(crate) fn sorted_names(&self) -> &[String] {
        &self.sorted_names
    }

    pub(crate) fn clear(&mut self) {
        self.by_name.clear();
        self.sorted_names.clear();
    }
}
