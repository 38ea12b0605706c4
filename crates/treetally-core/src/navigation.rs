use crate::draft::DraftId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    TreeIdentity,
    StemMeasurements { draft: DraftId },
    PhotoAndSave { draft: DraftId },
    StudentDetails,
}

impl Route {
    pub fn title(self) -> &'static str {
        match self {
            Self::TreeIdentity => "Tree identity",
            Self::StemMeasurements { .. } => "Stem measurements",
            Self::PhotoAndSave { .. } => "Photo and save",
            Self::StudentDetails => "Student details",
        }
    }

    pub fn draft(self) -> Option<DraftId> {
        match self {
            Self::StemMeasurements { draft } | Self::PhotoAndSave { draft } => Some(draft),
            Self::TreeIdentity | Self::StudentDetails => None,
        }
    }
}

/// History stack; the last entry is the visible screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    history: Vec<Route>,
}

impl Navigator {
    pub fn new(initial: Route) -> Self {
        Self {
            history: vec![initial],
        }
    }

    pub fn current(&self) -> Route {
        self.history.last().copied().unwrap_or(Route::TreeIdentity)
    }

    pub fn depth(&self) -> usize {
        self.history.len()
    }

    pub fn push(&mut self, route: Route) {
        self.history.push(route);
    }

    /// Pops the visible route. Returns `None` and keeps the root when there is
    /// nothing to go back to.
    pub fn back(&mut self) -> Option<Route> {
        if self.history.len() <= 1 {
            return None;
        }
        self.history.pop();
        Some(self.current())
    }

    /// Replaces the entire history with a single route.
    pub fn reset_to(&mut self, route: Route) {
        self.history.clear();
        self.history.push(route);
    }
}
