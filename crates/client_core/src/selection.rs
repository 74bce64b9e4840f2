/// Chosen catalog names. Each name appears at most once; iteration follows the order items were picked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    names: Vec<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from `names`, keeping the first occurrence of repeats.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for name in names {
            let name = name.into();
            if !set.contains(&name) {
                set.names.push(name);
            }
        }
        set
    }

    /// Adds `name` if absent, removes it if present. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, name: &str) -> bool {
        if self.remove(name) {
            false
        } else {
            self.names.push(name.to_string());
            true
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        match self.names.iter().position(|n| n == name) {
            Some(index) => {
                self.names.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.names.clone()
    }
}
