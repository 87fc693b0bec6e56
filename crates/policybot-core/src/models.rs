//! Backend model choice, only surfaced to administrators.

use crate::api::ModelsResponse;

/// Who is using the client. Built once at start-up and passed down
/// read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessContext {
    pub is_admin: bool,
}

impl AccessContext {
    pub fn new(is_admin: bool) -> Self {
        Self { is_admin }
    }

    pub fn can_pick_model(&self) -> bool {
        self.is_admin
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    default_model: Option<String>,
    supported: Vec<String>,
    selected: Option<String>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the catalog with a backend response. The selection falls
    /// back to the backend default, then the first supported model.
    pub fn apply(&mut self, response: ModelsResponse) {
        self.default_model = response.model_name;
        self.supported = response.supported_models;

        let keep = self
            .selected
            .as_ref()
            .map(|name| self.supported.contains(name))
            .unwrap_or(false);
        if !keep {
            self.selected = self
                .default_model
                .clone()
                .or_else(|| self.supported.first().cloned());
        }
    }

    pub fn default_model(&self) -> Option<&str> {
        self.default_model.as_deref()
    }

    pub fn supported(&self) -> &[String] {
        &self.supported
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_index(&self) -> Option<usize> {
        let selected = self.selected.as_ref()?;
        self.supported.iter().position(|name| name == selected)
    }

    pub fn is_empty(&self) -> bool {
        self.supported.is_empty()
    }

    /// Only supported models can be selected.
    pub fn select(&mut self, name: &str) -> bool {
        if !self.supported.iter().any(|model| model == name) {
            return false;
        }
        self.selected = Some(name.to_string());
        true
    }

    /// The `model_name` to attach to a query, if any.
    pub fn override_for_query(&self, access: AccessContext) -> Option<String> {
        if !access.is_admin {
            return None;
        }
        match (&self.selected, &self.default_model) {
            (Some(selected), Some(default)) if selected == default => None,
            (Some(selected), _) => Some(selected.clone()),
            (None, _) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(default: Option<&str>, models: &[&str]) -> ModelsResponse {
        ModelsResponse {
            model_name: default.map(str::to_string),
            supported_models: models.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn test_apply_selects_backend_default() {
        let mut catalog = ModelCatalog::new();
        catalog.apply(response(Some("llama3"), &["gpt-4o", "llama3"]));
        assert_eq!(catalog.selected(), Some("llama3"));
        assert_eq!(catalog.selected_index(), Some(1));
    }

    #[test]
    fn test_apply_without_default_uses_first_model() {
        let mut catalog = ModelCatalog::new();
        catalog.apply(response(None, &["gpt-4o", "llama3"]));
        assert_eq!(catalog.selected(), Some("gpt-4o"));
    }

    #[test]
    fn test_refresh_keeps_supported_selection() {
        let mut catalog = ModelCatalog::new();
        catalog.apply(response(Some("llama3"), &["gpt-4o", "llama3"]));
        catalog.select("gpt-4o");
        catalog.apply(response(Some("llama3"), &["gpt-4o", "llama3"]));
        assert_eq!(catalog.selected(), Some("gpt-4o"));

        catalog.apply(response(Some("llama3"), &["llama3"]));
        assert_eq!(catalog.selected(), Some("llama3"));
    }

    #[test]
    fn test_select_rejects_unknown_model() {
        let mut catalog = ModelCatalog::new();
        catalog.apply(response(Some("llama3"), &["llama3"]));
        assert!(!catalog.select("gpt-5"));
        assert_eq!(catalog.selected(), Some("llama3"));
    }

    #[test]
    fn test_override_only_for_admins_with_non_default_choice() {
        let mut catalog = ModelCatalog::new();
        catalog.apply(response(Some("llama3"), &["gpt-4o", "llama3"]));

        let admin = AccessContext::new(true);
        let user = AccessContext::new(false);
        assert_eq!(catalog.override_for_query(admin), None);

        catalog.select("gpt-4o");
        assert_eq!(catalog.override_for_query(admin).as_deref(), Some("gpt-4o"));
        assert_eq!(catalog.override_for_query(user), None);
    }
}
