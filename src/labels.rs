use crate::query::Label;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ActiveLabels {
    selected: Vec<Label>,
}

impl ActiveLabels {
    pub fn toggle(&mut self, label: &Label) {
        let existing = self
            .selected
            .iter()
            .position(|active| active.id == label.id);
        match existing {
            Some(position) => {
                self.selected.remove(position);
            }
            None => self.selected.push(label.clone()),
        }
    }

    pub fn contains(&self, id: i64) -> bool {
        self.selected.iter().any(|label| label.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn selected(&self) -> &[Label] {
        &self.selected
    }

    pub fn names(&self) -> Vec<String> {
        self.selected
            .iter()
            .map(|label| label.name.clone())
            .collect()
    }
}
