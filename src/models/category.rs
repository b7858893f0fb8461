use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub is_expense: bool,
    pub is_income: bool,
    pub is_tax_related: bool,
    pub tax_schedule: Option<String>,
    pub parent: Option<String>,
}

impl Category {
    pub fn new(id: i64, name: String) -> Self {
        let parent = Self::parent_of(&name);
        Self {
            id,
            name,
            description: String::new(),
            is_expense: false,
            is_income: false,
            is_tax_related: false,
            tax_schedule: None,
            parent,
        }
    }

    /// `Auto:Fuel` belongs to `Auto`. The hierarchy is two levels deep, so
    /// `Auto:Fuel:Diesel` also belongs to `Auto`.
    pub fn parent_of(name: &str) -> Option<String> {
        name.split_once(':')
            .map(|(parent, _)| parent.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
